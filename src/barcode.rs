use barcoders::sym::code128::Code128;
use image::{GrayImage, Luma};

use crate::consts::{BASE_DPI, MAX_IMAGE_BYTES};
use crate::error::{Error, Result};

/// Code128 character sets, written for `barcoders` as start/switch markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

impl CodeSet {
    fn marker(self) -> char {
        match self {
            CodeSet::A => '\u{00C0}',
            CodeSet::B => '\u{0181}',
            CodeSet::C => '\u{0106}',
        }
    }

    /// Whether a single ASCII byte is representable (set C only takes digit pairs).
    fn holds(self, b: u8) -> bool {
        match self {
            CodeSet::A => b < 0x60,
            CodeSet::B => (0x20..=0x7F).contains(&b),
            CodeSet::C => b.is_ascii_digit(),
        }
    }
}

// barcoders spells DEL in set B as U+00F7
const SET_B_DEL: char = '\u{00F7}';

fn digit_run(rest: &[u8]) -> usize {
    rest.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Greedy set choice for the byte at the head of `rest`:
/// - C for a run of 4+ digits (2+ once already in C)
/// - A for control characters, or to stay in A
/// - B otherwise
fn pick_set(rest: &[u8], current: Option<CodeSet>) -> CodeSet {
    let digits_needed = if current == Some(CodeSet::C) { 2 } else { 4 };
    if digit_run(rest) >= digits_needed {
        return CodeSet::C;
    }
    let b = rest[0];
    if !CodeSet::B.holds(b) || (current == Some(CodeSet::A) && CodeSet::A.holds(b)) {
        return CodeSet::A;
    }
    if current.is_none() {
        // start in whichever of A/B the first set-specific byte needs
        let first_specific = rest.iter().find(|&&c| CodeSet::A.holds(c) != CodeSet::B.holds(c));
        if first_specific.is_some_and(|&c| CodeSet::A.holds(c)) {
            return CodeSet::A;
        }
    }
    CodeSet::B
}

/// Rewrite `data` in `barcoders` syntax with the start set and every switch marked.
/// Only ASCII is accepted, so set markers and FNC characters can't come from the payload.
pub fn with_code_sets(data: &str) -> Result<String> {
    if let Some(bad) = data.chars().find(|c| !c.is_ascii()) {
        return Err(Error::Encode(format!("{:?}: {:?} is not ASCII", data, bad)));
    }

    let bytes = data.as_bytes();
    let mut out = String::with_capacity(bytes.len() + 2);
    let mut current = None;
    let mut i = 0;
    while i < bytes.len() {
        let set = pick_set(&bytes[i..], current);
        if current != Some(set) {
            out.push(set.marker());
            current = Some(set);
        }
        match set {
            CodeSet::C => {
                out.push_str(&data[i..i + 2]);
                i += 2;
            }
            CodeSet::B if bytes[i] == 0x7F => {
                out.push(SET_B_DEL);
                i += 1;
            }
            _ => {
                out.push(bytes[i] as char);
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Encode `data` as Code128 modules (1 = bar, 0 = space), quiet zones excluded.
pub fn encode_code128(data: &str) -> Result<Vec<u8>> {
    let symbol = Code128::new(with_code_sets(data)?)
        .map_err(|e| Error::Encode(format!("{:?}: {}", data, e)))?;
    Ok(symbol.encode())
}

/// Refuse rasters above `MAX_IMAGE_BYTES` before anything is allocated.
pub fn check_raster_size(width: u32, height: u32, bytes_per_pixel: u64) -> Result<()> {
    let bytes = (width as u64)
        .checked_mul(height as u64)
        .and_then(|px| px.checked_mul(bytes_per_pixel));
    match bytes {
        Some(n) if n <= MAX_IMAGE_BYTES => Ok(()),
        _ => Err(Error::Scale(format!(
            "a {}x{} image exceeds the {} byte limit",
            width, height, MAX_IMAGE_BYTES
        ))),
    }
}

/// Target size at the base dpi. The divisor equals `BASE_DPI`, so this is the identity.
pub fn size_at_dpi(width: u32, height: u32) -> (u32, u32) {
    (
        (width as u64 * BASE_DPI as u64 / 96) as u32,
        (height as u64 * BASE_DPI as u64 / 96) as u32,
    )
}

/// Rasterize a module row to exactly `width` × `height` pixels.
/// - every module gets `width / modules` pixels, the remainder becomes white on both sides
/// - black bars on white, so the result is opaque when blitted
pub fn scale_modules(modules: &[u8], width: u32, height: u32) -> Result<GrayImage> {
    let count = modules.len() as u32;
    let factor = if count == 0 { 0 } else { width / count };
    if factor == 0 || height == 0 {
        return Err(Error::Scale(format!(
            "can not scale a {}-module barcode to {}x{}",
            count, width, height
        )));
    }

    check_raster_size(width, height, 1)?;

    let spacer = (width - count * factor) / 2;
    let mut img = GrayImage::from_pixel(width, height, Luma([255u8]));
    for (i, _) in modules.iter().enumerate().filter(|&(_, &m)| m == 1) {
        let x0 = spacer + i as u32 * factor;
        for x in x0..x0 + factor {
            for y in 0..height {
                img.put_pixel(x, y, Luma([0]));
            }
        }
    }
    Ok(img)
}

/// Encode and scale in one step, as the compositor needs it.
pub fn render_code128(data: &str, width: u32, height: u32) -> Result<GrayImage> {
    let modules = encode_code128(data)?;
    let (w, h) = size_at_dpi(width, height);
    scale_modules(&modules, w, h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_ascii_payload() {
        let modules = encode_code128("A1").unwrap();
        assert!(!modules.is_empty());
        assert!(modules.iter().all(|&m| m == 0 || m == 1));
    }

    #[test]
    fn rejects_non_ascii_payload() {
        let err = encode_code128("ج.م").unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(matches!(err, Error::Encode(_)));
    }

    #[test]
    fn set_markers_in_data_are_rejected() {
        for data in ["A\u{0106}12", "\u{00C0}AB", "x\u{0181}y", "\u{0179}1"] {
            assert!(matches!(encode_code128(data), Err(Error::Encode(_))), "{data:?}");
        }
    }

    #[test]
    fn picks_code_sets_per_run() {
        assert_eq!(with_code_sets("A12").unwrap(), "\u{0181}A12");
        assert_eq!(with_code_sets("123456").unwrap(), "\u{0106}123456");
        assert_eq!(with_code_sets("AB123456").unwrap(), "\u{0181}AB\u{0106}123456");
        assert_eq!(with_code_sets("12345").unwrap(), "\u{0106}1234\u{0181}5");
        assert_eq!(with_code_sets("A\tB").unwrap(), "\u{00C0}A\tB");
        assert_eq!(with_code_sets("ab\x01").unwrap(), "\u{0181}ab\u{00C0}\x01");
        assert_eq!(with_code_sets("a\x7F").unwrap(), "\u{0181}a\u{00F7}");
    }

    #[test]
    fn module_counts_follow_the_chosen_sets() {
        // start + symbols + check + stop (11 each) + 2-module termination bar
        let len = |symbols: usize| 11 * (symbols + 3) + 2;
        assert_eq!(encode_code128("A12").unwrap().len(), len(3));
        assert_eq!(encode_code128("12345678901234567890").unwrap().len(), len(10));
        assert_eq!(encode_code128("12345678901234567890").unwrap().len(), 145);
        assert_eq!(encode_code128("AB123456").unwrap().len(), len(2 + 1 + 3));
        assert_eq!(encode_code128("A\tB").unwrap().len(), len(3));
    }

    #[test]
    fn long_numeric_payload_fits_a_narrow_symbol() {
        let img = render_code128("12345678901234567890", 150, 80).unwrap();
        assert_eq!(img.dimensions(), (150, 80));
    }

    #[test]
    fn oversized_rasters_are_refused() {
        assert!(check_raster_size(200, 80, 4).is_ok());
        assert!(matches!(check_raster_size(u32::MAX, u32::MAX, 4), Err(Error::Scale(_))));
        assert!(matches!(check_raster_size(100_000, 100_000, 1), Err(Error::Scale(_))));
        let err = scale_modules(&[1, 0, 1], u32::MAX, 80).unwrap_err();
        assert!(matches!(err, Error::Scale(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn dpi_scaling_is_identity() {
        assert_eq!(size_at_dpi(200, 80), (200, 80));
        assert_eq!(size_at_dpi(0, 0), (0, 0));
    }

    #[test]
    fn scales_with_centered_remainder() {
        // 3 modules into 10 px: factor 3, spacer 0.5 → 0
        let img = scale_modules(&[1, 0, 1], 10, 2).unwrap();
        assert_eq!(img.dimensions(), (10, 2));
        let row: Vec<u8> = (0..10).map(|x| img.get_pixel(x, 1).0[0]).collect();
        assert_eq!(row, vec![0, 0, 0, 255, 255, 255, 0, 0, 0, 255]);

        // 3 modules into 11 px: factor 3, spacer 1
        let img = scale_modules(&[1, 1, 0], 11, 1).unwrap();
        let row: Vec<u8> = (0..11).map(|x| img.get_pixel(x, 0).0[0]).collect();
        assert_eq!(row, vec![255, 0, 0, 0, 0, 0, 0, 255, 255, 255, 255]);
    }

    #[test]
    fn too_narrow_or_flat_is_a_scale_error() {
        assert!(matches!(scale_modules(&[1, 0, 1], 2, 10), Err(Error::Scale(_))));
        assert!(matches!(scale_modules(&[1, 0, 1], 30, 0), Err(Error::Scale(_))));
        assert!(matches!(scale_modules(&[], 30, 10), Err(Error::Scale(_))));
    }

    #[test]
    fn rendered_symbol_has_requested_size() {
        let img = render_code128("A1", 200, 80).unwrap();
        assert_eq!(img.dimensions(), (200, 80));
        assert!(img.pixels().any(|p| p.0[0] == 0));
    }
}
