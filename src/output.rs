//! PNG output with per-request file names and a retention limit.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use image::codecs::png::PngEncoder;
use image::{ImageEncoder, RgbaImage};
use log::{debug, warn};
use uuid::Uuid;

use crate::consts::{FIXED_OUTPUT_NAME, OUTPUT_PREFIX};
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputNaming {
    /// `barcode-<uuid>.png`, pruned down to `keep` files
    Unique { keep: usize },
    /// one shared file, overwritten by every request
    Fixed,
}

/// A written sheet: where it lives on disk and how the page links to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedImage {
    pub path: PathBuf,
    pub public_path: String,
}

#[derive(Debug, Clone)]
pub struct OutputStore {
    dir: PathBuf,
    url_prefix: String,
    naming: OutputNaming,
}

impl OutputStore {
    pub fn new(dir: impl Into<PathBuf>, url_prefix: &str, naming: OutputNaming) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            naming,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn next_name(&self) -> String {
        match self.naming {
            OutputNaming::Unique { .. } => format!("{}{}.png", OUTPUT_PREFIX, Uuid::new_v4().simple()),
            OutputNaming::Fixed => FIXED_OUTPUT_NAME.to_string(),
        }
    }

    /// Encode `canvas` as PNG under a fresh name, then apply the retention limit.
    pub fn save(&self, canvas: &RgbaImage) -> Result<SavedImage> {
        let name = self.next_name();
        let path = self.dir.join(&name);
        write_png(&path, canvas)?;

        if let OutputNaming::Unique { keep } = self.naming {
            self.prune(keep, &path);
        }
        let public_path = if self.url_prefix.is_empty() {
            name
        } else {
            format!("{}/{}", self.url_prefix, name)
        };
        Ok(SavedImage { path, public_path })
    }

    /// Generated files in the output directory, newest first.
    pub fn generated(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut files: Vec<(SystemTime, PathBuf)> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                name.starts_with(OUTPUT_PREFIX) && name.ends_with(".png")
            })
            .map(|e| {
                let modified = e.metadata().and_then(|m| m.modified()).unwrap_or(SystemTime::UNIX_EPOCH);
                (modified, e.path())
            })
            .collect();
        files.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| b.1.cmp(&a.1)));
        files.into_iter().map(|(_, p)| p).collect()
    }

    // the file just written is never removed, even when timestamps tie
    fn prune(&self, keep: usize, current: &Path) {
        let keep = keep.max(1);
        let stale = self.generated().into_iter().filter(|p| p != current).skip(keep - 1);
        for path in stale {
            match fs::remove_file(&path) {
                Ok(()) => debug!("removed old output {}", path.display()),
                Err(e) => warn!("could not remove old output {}: {}", path.display(), e),
            }
        }
    }
}

/// The writer is dropped (and the file closed) on every return path.
pub fn write_png(path: &Path, canvas: &RgbaImage) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::Save(format!("{}: {}", path.display(), e)))?;
    let mut w = BufWriter::new(file);
    PngEncoder::new(&mut w).write_image(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    w.flush().map_err(|e| Error::Save(format!("{}: {}", path.display(), e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn scratch_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("code128-sheet-{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn canvas(color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(8, 4, Rgba(color))
    }

    #[test]
    fn unique_names_do_not_collide() {
        let dir = scratch_dir();
        let store = OutputStore::new(&dir, "static", OutputNaming::Unique { keep: 8 });
        let a = store.save(&canvas([1, 2, 3, 255])).unwrap();
        let b = store.save(&canvas([1, 2, 3, 255])).unwrap();
        assert_ne!(a.path, b.path);
        assert!(a.public_path.starts_with("static/barcode-"));
        assert!(a.path.exists() && b.path.exists());

        let back = image::open(&a.path).unwrap().to_rgba8();
        assert_eq!(back, canvas([1, 2, 3, 255]));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn retention_keeps_newest_files() {
        let dir = scratch_dir();
        fs::write(dir.join("unrelated.png"), b"keep me").unwrap();
        let store = OutputStore::new(&dir, "static", OutputNaming::Unique { keep: 2 });
        let mut last = None;
        for _ in 0..5 {
            last = Some(store.save(&canvas([0, 0, 0, 255])).unwrap());
        }
        let left = store.generated();
        assert_eq!(left.len(), 2);
        assert!(left.contains(&last.unwrap().path));
        assert!(dir.join("unrelated.png").exists());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn fixed_mode_overwrites_one_file() {
        let dir = scratch_dir();
        let store = OutputStore::new(&dir, "static/", OutputNaming::Fixed);
        let first = store.save(&canvas([255, 0, 0, 255])).unwrap();
        let before = fs::read(&first.path).unwrap();
        let second = store.save(&canvas([0, 255, 0, 255])).unwrap();
        assert_eq!(first.path, second.path);
        assert_eq!(second.public_path, "static/generated_barcode.png");
        assert_ne!(before, fs::read(&second.path).unwrap());
        assert_eq!(image::open(&second.path).unwrap().to_rgba8(), canvas([0, 255, 0, 255]));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn missing_directory_is_a_save_error() {
        let store = OutputStore::new("/nonexistent/code128-sheet", "static", OutputNaming::Fixed);
        let err = store.save(&canvas([0, 0, 0, 255])).unwrap_err();
        assert!(matches!(err, Error::Save(_)));
        assert_eq!(err.status_code(), 500);
    }
}
