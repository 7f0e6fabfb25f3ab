//! `#RRGGBB` color parsing.

use image::Rgba;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ColorError {
    #[error("color must start with '#'")]
    MissingHash,
    #[error("expected 6 hex digits after '#', found {0}")]
    WrongLength(usize),
    #[error("'{0}' is not a hex digit")]
    NotHex(char),
}

/// Parse `#RRGGBB` (case-insensitive) into a fully opaque color.
pub fn parse_hex_color(s: &str) -> Result<Rgba<u8>, ColorError> {
    let digits = s.strip_prefix('#').ok_or(ColorError::MissingHash)?;
    let count = digits.chars().count();
    if count != 6 {
        return Err(ColorError::WrongLength(count));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(ColorError::NotHex(bad));
    }

    // all ASCII at this point, byte slicing is safe
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16);
    match (channel(0), channel(2), channel(4)) {
        (Ok(r), Ok(g), Ok(b)) => Ok(Rgba([r, g, b, 0xFF])),
        _ => Err(ColorError::WrongLength(count)),
    }
}
