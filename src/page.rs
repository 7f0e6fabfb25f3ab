//! Result page rendering: `{{.BarcodePath}}` placeholders filled with the image path.

use std::path::Path;

use crate::error::{Error, Result};

const BARCODE_PATH_FIELD: &str = ".BarcodePath";

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Substitute every placeholder in `template`. Unknown fields and
/// unterminated `{{` are template errors.
pub fn render(template: &str, barcode_path: &str) -> Result<String> {
    let value = escape_html(barcode_path);
    let mut out = String::with_capacity(template.len() + value.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| Error::Template("unclosed action".into()))?;
        match after[..end].trim() {
            BARCODE_PATH_FIELD => out.push_str(&value),
            other => return Err(Error::Template(format!("unknown field {:?}", other))),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Read the template from disk (on every call, so edits show up without a restart) and render it.
pub fn render_file(path: &Path, barcode_path: &str) -> Result<String> {
    let template = std::fs::read_to_string(path)
        .map_err(|e| Error::Template(format!("{}: {}", path.display(), e)))?;
    render(&template, barcode_path)
}
