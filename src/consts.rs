// Layout and server tuning constants

pub const MAX_SLOTS: usize = 4;     // data1..data4

pub const H_PAD_FACTOR: u32 = 2;    // side padding = 2 × text size
pub const V_PAD_FACTOR: u32 = 3;    // top + label band = 3 × text size

pub const BASE_DPI: u32 = 96;       // identity scale against the 96 dpi divisor
pub const LABEL_HEIGHT_RATIO: f32 = 72.0 / 96.0; // nominal line height per px of font size

pub const MAX_IMAGE_BYTES: u64 = 256 << 20; // largest canvas or symbol raster we allocate
pub const MAX_FORM_BYTES: u64 = 10 << 20;   // urlencoded request body cap

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const STATIC_PREFIX: &str = "static";
pub const RESULT_TEMPLATE: &str = "generated_barcode.html";

pub const FIXED_OUTPUT_NAME: &str = "generated_barcode.png";
pub const OUTPUT_PREFIX: &str = "barcode-";
pub const DEFAULT_KEEP_OUTPUTS: usize = 16;

pub const DEFAULT_FAMILY: &str = "arial";
pub const DEFAULT_REGULAR_FONT: &str = "arial.ttf";
pub const DEFAULT_BOLD_FONT: &str = "arial_black.ttf";
