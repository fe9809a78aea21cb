//! Portrait frame assets for the dialogue phases.
//!
//! Assets live as PNG files under `<assets>/portraits/`. A phase that
//! needs a sequence which is missing or unreadable is a fatal startup
//! error; there is no degraded rendering path.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::frame::Frame;

pub const PORTRAITS_DIR: &str = "portraits";

/// Load the portrait sequence whose file names start with `prefix`,
/// ordered by file name. At least one frame is required.
pub fn load_portrait_sequence(assets_root: &Path, prefix: &str) -> Result<Vec<Frame>> {
    let dir = assets_root.join(PORTRAITS_DIR);
    let entries = fs::read_dir(&dir)
        .with_context(|| format!("missing portrait directory '{}'", dir.display()))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed reading portrait directory '{}'", dir.display()))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(prefix) && name.to_ascii_lowercase().ends_with(".png") {
            paths.push(entry.path());
        }
    }
    paths.sort();

    if paths.is_empty() {
        bail!(
            "no portrait frames matching '{}*.png' in '{}'",
            prefix,
            dir.display()
        );
    }

    paths.iter().map(|path| load_frame(path)).collect()
}

/// Load one image file into a frame.
pub fn load_frame(path: &Path) -> Result<Frame> {
    let image = image::open(path)
        .with_context(|| format!("failed to read portrait '{}'", path.display()))?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        bail!("portrait '{}' has zero extent", path.display());
    }
    Ok(Frame::from_rgba(width, height, rgba.into_raw()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(path: &Path, width: u32, height: u32) {
        let mut img = RgbaImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgba([128, 64, 32, 255]);
        }
        img.save(path).expect("test png should save");
    }

    #[test]
    fn sequences_load_sorted_by_name() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let portraits = dir.path().join(PORTRAITS_DIR);
        fs::create_dir(&portraits).expect("portraits dir should create");
        write_png(&portraits.join("intro_0002.png"), 4, 4);
        write_png(&portraits.join("intro_0001.png"), 2, 2);
        write_png(&portraits.join("other_0001.png"), 8, 8);

        let frames = load_portrait_sequence(dir.path(), "intro_").expect("sequence should load");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].width(), 2);
        assert_eq!(frames[1].width(), 4);
    }

    #[test]
    fn missing_directory_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        assert!(load_portrait_sequence(dir.path(), "intro_").is_err());
    }

    #[test]
    fn empty_sequence_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        fs::create_dir(dir.path().join(PORTRAITS_DIR)).expect("portraits dir should create");
        assert!(load_portrait_sequence(dir.path(), "intro_").is_err());
    }

    #[test]
    fn corrupt_file_is_fatal() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let portraits = dir.path().join(PORTRAITS_DIR);
        fs::create_dir(&portraits).expect("portraits dir should create");
        fs::write(portraits.join("intro_0001.png"), b"not a png").expect("file should write");
        assert!(load_portrait_sequence(dir.path(), "intro_").is_err());
    }
}
