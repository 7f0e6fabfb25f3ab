//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::consts::{
    DEFAULT_ADDR, DEFAULT_BOLD_FONT, DEFAULT_FAMILY, DEFAULT_KEEP_OUTPUTS, DEFAULT_REGULAR_FONT,
    RESULT_TEMPLATE, STATIC_PREFIX,
};
use crate::graphics::FontSource;
use crate::output::{OutputNaming, OutputStore};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Serve a form that renders labelled Code128 barcodes into one PNG")]
pub struct Config {
    /// Address to listen on
    #[arg(long, default_value = DEFAULT_ADDR)]
    pub addr: String,

    /// Directory served under /static/ (fonts and generated images live here)
    #[arg(long, default_value = "static")]
    pub static_dir: PathBuf,

    /// Directory holding generated_barcode.html
    #[arg(long, default_value = "templates")]
    pub templates_dir: PathBuf,

    /// Form page served at /
    #[arg(long, default_value = "index.html")]
    pub index: PathBuf,

    /// Overwrite one shared generated_barcode.png instead of writing a file per request
    #[arg(long)]
    pub fixed_output: bool,

    /// How many per-request images to keep on disk
    #[arg(long, default_value_t = DEFAULT_KEEP_OUTPUTS)]
    pub keep_outputs: usize,

    /// Font family as NAME=REGULAR.ttf[,BOLD.ttf]; repeatable, the first is the default
    #[arg(long = "font", value_parser = parse_font_source)]
    pub fonts: Vec<FontSource>,
}

pub fn parse_font_source(s: &str) -> Result<FontSource, String> {
    let (name, files) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=REGULAR[,BOLD], got {:?}", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("font family name is empty".into());
    }
    let (regular, bold) = match files.split_once(',') {
        Some((r, b)) => (r.trim(), Some(PathBuf::from(b.trim()))),
        None => (files.trim(), None),
    };
    if regular.is_empty() {
        return Err(format!("font family {:?} has no regular face", name));
    }
    Ok(FontSource {
        name: name.to_string(),
        regular: PathBuf::from(regular),
        bold,
    })
}

impl Default for Config {
    fn default() -> Self {
        Config {
            addr: DEFAULT_ADDR.to_string(),
            static_dir: PathBuf::from("static"),
            templates_dir: PathBuf::from("templates"),
            index: PathBuf::from("index.html"),
            fixed_output: false,
            keep_outputs: DEFAULT_KEEP_OUTPUTS,
            fonts: Vec::new(),
        }
    }
}

impl Config {
    /// Configured families, or the built-in regular/black pair from the static dir.
    pub fn font_sources(&self) -> Vec<FontSource> {
        if !self.fonts.is_empty() {
            return self.fonts.clone();
        }
        vec![FontSource {
            name: DEFAULT_FAMILY.to_string(),
            regular: self.static_dir.join(DEFAULT_REGULAR_FONT),
            bold: Some(self.static_dir.join(DEFAULT_BOLD_FONT)),
        }]
    }

    pub fn output_naming(&self) -> OutputNaming {
        if self.fixed_output {
            OutputNaming::Fixed
        } else {
            OutputNaming::Unique { keep: self.keep_outputs }
        }
    }

    pub fn output_store(&self) -> OutputStore {
        OutputStore::new(&self.static_dir, STATIC_PREFIX, self.output_naming())
    }

    pub fn result_template(&self) -> PathBuf {
        self.templates_dir.join(RESULT_TEMPLATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_cli() {
        let cfg = Config::parse_from(["code128-sheet"]);
        let def = Config::default();
        assert_eq!(cfg.addr, def.addr);
        assert_eq!(cfg.static_dir, def.static_dir);
        assert_eq!(cfg.keep_outputs, def.keep_outputs);
        assert!(!cfg.fixed_output);
        assert_eq!(cfg.output_naming(), OutputNaming::Unique { keep: 16 });
        assert_eq!(cfg.result_template(), PathBuf::from("templates/generated_barcode.html"));
    }

    #[test]
    fn default_font_family_is_arial_from_static() {
        let sources = Config::default().font_sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "arial");
        assert_eq!(sources[0].regular, PathBuf::from("static/arial.ttf"));
        assert_eq!(sources[0].bold, Some(PathBuf::from("static/arial_black.ttf")));
    }

    #[test]
    fn parses_font_flags() {
        let cfg = Config::parse_from([
            "code128-sheet",
            "--font",
            "mono=fonts/mono.ttf,fonts/mono-bold.ttf",
            "--font",
            "serif = fonts/serif.ttf",
            "--fixed-output",
        ]);
        assert_eq!(cfg.output_naming(), OutputNaming::Fixed);
        let fonts = cfg.font_sources();
        assert_eq!(fonts[0].bold, Some(PathBuf::from("fonts/mono-bold.ttf")));
        assert_eq!(fonts[1].name, "serif");
        assert_eq!(fonts[1].bold, None);

        assert!(parse_font_source("no-equals").is_err());
        assert!(parse_font_source("=a.ttf").is_err());
        assert!(parse_font_source("x=").is_err());
    }
}
