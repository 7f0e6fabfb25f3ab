//! Error types for the barcode sheet service

use std::fmt;

use thiserror::Error;

use crate::color::ColorError;

/// Result type alias for sheet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Which color field of a barcode failed to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorRole {
    Padding,
    Text,
}

impl fmt::Display for ColorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorRole::Padding => f.write_str("padding"),
            ColorRole::Text => f.write_str("text"),
        }
    }
}

/// Errors that can occur while building or serving a barcode sheet
#[derive(Error, Debug)]
pub enum Error {
    /// Every `data{i}` slot was empty
    #[error("No barcode data provided")]
    NoBarcodeData,

    /// The urlencoded body is larger than `MAX_FORM_BYTES`
    #[error("Form body exceeds {0} bytes")]
    FormTooLarge(u64),

    #[error("Invalid {role} color {value:?}: {source}")]
    InvalidColor {
        role: ColorRole,
        value: String,
        #[source]
        source: ColorError,
    },

    /// The symbology rejected the payload
    #[error("Failed to generate barcode: {0}")]
    Encode(String),

    #[error("Failed to scale barcode: {0}")]
    Scale(String),

    /// Writing the PNG failed
    #[error("Failed to save barcode: {0}")]
    Save(String),

    #[error("Error parsing template: {0}")]
    Template(String),

    /// A font file could not be read or parsed
    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The HTTP listener could not be started
    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    /// HTTP status code used when this error ends a request
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NoBarcodeData | Error::FormTooLarge(_) | Error::InvalidColor { .. } => 400,
            _ => 500,
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Save(err.to_string())
    }
}
