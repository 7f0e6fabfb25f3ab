//! Labelled Code128 barcode sheets over HTTP.
//! - Up to four barcodes per request, laid out side by side on one PNG
//! - Each cell is padded by its label size (2× sideways, 3× vertically) in its own color
//! - Labels are centered under the symbol using a per-family regular/bold font
//! - Output files get per-request names with a retention limit (or one fixed file)

pub mod barcode;
pub mod builder;
pub mod color;
pub mod config;
pub mod consts;
pub mod error;
pub mod form;
pub mod graphics;
pub mod output;
pub mod page;
pub mod server;

pub use builder::{canvas_size, compose_sheet, layout, CanvasSize, Placement};
pub use color::parse_hex_color;
pub use config::Config;
pub use error::{Error, Result};
pub use form::{collect_specs, BarcodeSpec, Form};
pub use graphics::{FontBook, FontSource};
pub use output::{OutputNaming, OutputStore};
pub use server::{App, BarcodeServer};
