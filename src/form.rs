//! Request fields → ordered barcode specs.

use std::collections::HashMap;

use log::debug;
use url::form_urlencoded;

use crate::consts::MAX_SLOTS;
use crate::error::{Error, Result};

/// One requested barcode, taken from the `*{i}` fields of a slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BarcodeSpec {
    pub data: String,
    pub width: u32,
    pub height: u32,
    pub padding_color: String,
    pub font_choice: String,
    pub text_color: String,
    pub text_size: u32,
    pub bold: bool,
}

/// Decoded form values. The first value stored for a key wins.
#[derive(Debug, Clone, Default)]
pub struct Form {
    values: HashMap<String, Vec<String>>,
}

impl Form {
    /// Body fields are stored before query fields, so they take precedence.
    pub fn from_parts(query: Option<&str>, body: Option<&[u8]>) -> Self {
        let mut form = Form::default();
        if let Some(body) = body {
            form.extend(form_urlencoded::parse(body));
        }
        if let Some(query) = query {
            form.extend(form_urlencoded::parse(query.as_bytes()));
        }
        form
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut form = Form::default();
        form.extend(pairs.into_iter());
        form
    }

    fn extend<K: AsRef<str>, V: AsRef<str>>(&mut self, pairs: impl Iterator<Item = (K, V)>) {
        for (k, v) in pairs {
            self.values
                .entry(k.as_ref().to_string())
                .or_default()
                .push(v.as_ref().to_string());
        }
    }

    /// First value for `key`, or `""` when absent.
    pub fn value(&self, key: &str) -> &str {
        self.values
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// Unparseable (or negative) numbers become zero rather than rejecting the request.
fn coerce_u32(form: &Form, key: &str) -> u32 {
    let raw = form.value(key);
    match raw.trim().parse::<u32>() {
        Ok(n) => n,
        Err(_) => {
            if !raw.is_empty() {
                debug!("field {} = {:?} is not a size, using 0", key, raw);
            }
            0
        }
    }
}

/// Read slots `1..=MAX_SLOTS` in order, skipping slots without data.
pub fn collect_specs(form: &Form) -> Result<Vec<BarcodeSpec>> {
    let specs: Vec<BarcodeSpec> = (1..=MAX_SLOTS)
        .filter_map(|i| {
            let data = form.value(&format!("data{i}"));
            if data.is_empty() {
                return None;
            }
            Some(BarcodeSpec {
                data: data.to_string(),
                width: coerce_u32(form, &format!("width{i}")),
                height: coerce_u32(form, &format!("height{i}")),
                padding_color: form.value(&format!("padding_color{i}")).to_string(),
                font_choice: form.value(&format!("font_choice{i}")).to_string(),
                text_color: form.value(&format!("text_color{i}")).to_string(),
                text_size: coerce_u32(form, &format!("text_size{i}")),
                bold: form.value(&format!("bold{i}")) == "on",
            })
        })
        .collect();

    if specs.is_empty() {
        return Err(Error::NoBarcodeData);
    }
    Ok(specs)
}
