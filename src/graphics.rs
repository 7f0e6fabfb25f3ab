use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use log::{info, warn};
use rusttype::{point, Font, Scale};

use crate::consts::LABEL_HEIGHT_RATIO;
use crate::error::{Error, Result};

/// Where to load one font family from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontSource {
    pub name: String,
    pub regular: PathBuf,
    pub bold: Option<PathBuf>,
}

#[derive(Default)]
struct FontFamily {
    regular: Option<Font<'static>>,
    bold: Option<Font<'static>>,
}

/// Named font families, looked up by a barcode's `font_choice`.
/// Unknown or empty choices fall back to the default (first registered) family.
#[derive(Default)]
pub struct FontBook {
    families: HashMap<String, FontFamily>,
    default: Option<String>,
}

pub fn load_font(path: &Path) -> Result<Font<'static>> {
    let bytes = std::fs::read(path).map_err(|e| Error::Font(format!("{}: {}", path.display(), e)))?;
    Font::try_from_vec(bytes).ok_or_else(|| Error::Font(format!("{}: not a TrueType font", path.display())))
}

impl FontBook {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load every source. Unreadable faces are logged and left out, so labels
    /// using them are skipped instead of failing the request.
    pub fn load(sources: &[FontSource]) -> Self {
        let mut book = Self::empty();
        for src in sources {
            let regular = Self::load_face(&src.regular);
            let bold = src.bold.as_deref().and_then(Self::load_face);
            if regular.is_some() || bold.is_some() {
                info!("loaded font family {:?}", src.name);
            }
            book.insert(&src.name, regular, bold);
        }
        book
    }

    fn load_face(path: &Path) -> Option<Font<'static>> {
        match load_font(path) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("{}; labels using this face will not be drawn", e);
                None
            }
        }
    }

    pub fn insert(&mut self, name: &str, regular: Option<Font<'static>>, bold: Option<Font<'static>>) {
        let key = name.trim().to_ascii_lowercase();
        if self.default.is_none() {
            self.default = Some(key.clone());
        }
        self.families.insert(key, FontFamily { regular, bold });
    }

    /// Family name a choice resolves to, if any family is registered.
    pub fn resolve_family(&self, choice: &str) -> Option<&str> {
        let key = choice.trim().to_ascii_lowercase();
        match self.families.get_key_value(&key) {
            Some((name, _)) => Some(name.as_str()),
            None => self.default.as_deref(),
        }
    }

    /// Bold falls back to regular when the family has no bold face.
    pub fn face(&self, choice: &str, bold: bool) -> Option<&Font<'static>> {
        let family = self.families.get(self.resolve_family(choice)?)?;
        if bold {
            family.bold.as_ref().or(family.regular.as_ref())
        } else {
            family.regular.as_ref()
        }
    }
}

/// Horizontal advance of `text`, kerning included.
pub fn measure_advance(font: &Font, scale: Scale, text: &str) -> f32 {
    font.layout(text, scale, point(0.0, 0.0))
        .last()
        .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
        .unwrap_or(0.0)
}

/// Scale at which one em is `font_px` pixels (`Scale::uniform` alone sizes
/// ascent minus descent).
pub fn em_scale(font: &Font, font_px: f32) -> Scale {
    let v = font.v_metrics_unscaled();
    let em = font.units_per_em() as f32;
    if em <= 0.0 || v.ascent <= v.descent {
        return Scale::uniform(font_px);
    }
    Scale::uniform(font_px * (v.ascent - v.descent) / em)
}

/// Draw `text` so that the point `(x, y)` sits at fraction `(ax, ay)` of its box.
/// Width is the advance width; height is the nominal line height `px × 72/96`.
pub fn draw_text_anchored(
    canvas: &mut RgbaImage,
    font: &Font,
    font_px: f32,
    text: &str,
    (x, y): (f32, f32),
    (ax, ay): (f32, f32),
    color: Rgba<u8>,
) {
    if font_px <= 0.0 || text.is_empty() {
        return;
    }
    let scale = em_scale(font, font_px);
    let w = measure_advance(font, scale, text);
    let h = font_px * LABEL_HEIGHT_RATIO;
    let origin = point(x - ax * w, y + ay * h);

    let (cw, ch) = canvas.dimensions();
    for g in font.layout(text, scale, origin) {
        if let Some(bb) = g.pixel_bounding_box() {
            g.draw(|gx, gy, v| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px >= 0 && py >= 0 && (px as u32) < cw && (py as u32) < ch {
                    blend(canvas.get_pixel_mut(px as u32, py as u32), color, v);
                }
            });
        }
    }
}

/// Source-over blend of `src` scaled by glyph coverage.
pub fn blend(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: f32) {
    let a = coverage.clamp(0.0, 1.0) * (src.0[3] as f32 / 255.0);
    for c in 0..3 {
        dst.0[c] = (src.0[c] as f32 * a + dst.0[c] as f32 * (1.0 - a)).round() as u8;
    }
    dst.0[3] = (255.0 * a + dst.0[3] as f32 * (1.0 - a)).round() as u8;
}
