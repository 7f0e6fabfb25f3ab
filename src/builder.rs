use image::{imageops, DynamicImage, Rgba, RgbaImage};
use log::{debug, warn};

use crate::barcode::{check_raster_size, render_code128};
use crate::color::parse_hex_color;
use crate::consts::{H_PAD_FACTOR, V_PAD_FACTOR};
use crate::error::{ColorRole, Error, Result};
use crate::form::BarcodeSpec;
use crate::graphics::{draw_text_anchored, FontBook};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

/// Where one barcode's cell, symbol and label go on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub cell_x: u32,
    pub cell_width: u32,
    pub symbol_origin: (u32, u32),
    pub label_anchor: (f32, f32),
}

/// Symbol width plus `H_PAD_FACTOR` text sizes of side padding.
pub fn cell_width(spec: &BarcodeSpec) -> u32 {
    spec.width.saturating_add(spec.text_size.saturating_mul(H_PAD_FACTOR))
}

/// Symbol height plus `V_PAD_FACTOR` text sizes (top margin + label band).
pub fn cell_height(spec: &BarcodeSpec) -> u32 {
    spec.height.saturating_add(spec.text_size.saturating_mul(V_PAD_FACTOR))
}

/// Cells sit side by side; the tallest one sets the height.
pub fn canvas_size(specs: &[BarcodeSpec]) -> CanvasSize {
    CanvasSize {
        width: specs.iter().fold(0u32, |acc, s| acc.saturating_add(cell_width(s))),
        height: specs.iter().map(cell_height).max().unwrap_or(0),
    }
}

pub fn layout(specs: &[BarcodeSpec]) -> (CanvasSize, Vec<Placement>) {
    let size = canvas_size(specs);
    let mut x_offset = 0u32;
    let placements = specs
        .iter()
        .map(|s| {
            let ts = s.text_size;
            let place = Placement {
                cell_x: x_offset,
                cell_width: cell_width(s),
                symbol_origin: (x_offset.saturating_add(ts), ts),
                // label centre: over the symbol, one text size below its bottom edge
                label_anchor: (
                    x_offset.saturating_add(ts).saturating_add(s.width / 2) as f32,
                    ts.saturating_add(s.height).saturating_add(ts) as f32,
                ),
            };
            x_offset = x_offset.saturating_add(place.cell_width);
            place
        })
        .collect();
    (size, placements)
}

fn parse_color(role: ColorRole, value: &str) -> Result<Rgba<u8>> {
    parse_hex_color(value).map_err(|source| Error::InvalidColor {
        role,
        value: value.to_string(),
        source,
    })
}

fn fill_rect(canvas: &mut RgbaImage, x: u32, y: u32, w: u32, h: u32, color: Rgba<u8>) {
    let (cw, ch) = canvas.dimensions();
    for py in y..y.saturating_add(h).min(ch) {
        for px in x..x.saturating_add(w).min(cw) {
            canvas.put_pixel(px, py, color);
        }
    }
}

/// Render every barcode onto one canvas. Any bad color, encoding or scaling
/// failure aborts the whole sheet; nothing is written here.
pub fn compose_sheet(specs: &[BarcodeSpec], fonts: &FontBook) -> Result<RgbaImage> {
    let (size, placements) = layout(specs);
    check_raster_size(size.width, size.height, 4)?;
    let mut canvas = RgbaImage::new(size.width, size.height);

    for (spec, place) in specs.iter().zip(placements.iter()) {
        let padding = parse_color(ColorRole::Padding, &spec.padding_color)?;
        let symbol = render_code128(&spec.data, spec.width, spec.height)?;

        fill_rect(&mut canvas, place.cell_x, 0, place.cell_width, size.height, padding);
        let (sx, sy) = place.symbol_origin;
        let symbol = DynamicImage::ImageLuma8(symbol).to_rgba8();
        imageops::replace(&mut canvas, &symbol, sx as i64, sy as i64);

        let text_color = parse_color(ColorRole::Text, &spec.text_color)?;
        match fonts.face(&spec.font_choice, spec.bold) {
            Some(font) => draw_text_anchored(
                &mut canvas,
                font,
                spec.text_size as f32,
                &spec.data,
                place.label_anchor,
                (0.5, 0.5),
                text_color,
            ),
            None => warn!("no font face for {:?} (bold={}), label {:?} not drawn", spec.font_choice, spec.bold, spec.data),
        }
        debug!("placed {:?} at x={} ({}px cell)", spec.data, place.cell_x, place.cell_width);
    }

    Ok(canvas)
}
