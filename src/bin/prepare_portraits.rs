//! Offline asset tool: converts raw portrait images into the pre-styled
//! ASCII portraits the dialogue phases display at runtime.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use image::RgbaImage;

use corewake::ascii::{ColorMode, GlyphRemapper};
use corewake::assets::load_frame;

#[derive(Debug, Parser)]
#[command(name = "prepare-portraits")]
#[command(about = "Convert raw portrait images into ASCII portrait assets")]
struct Cli {
    /// Directory holding the raw source images.
    #[arg(long, value_name = "DIR", default_value = "assets/raw")]
    raw: PathBuf,

    /// Output directory for the converted portraits.
    #[arg(long, value_name = "DIR", default_value = "assets/portraits")]
    out: PathBuf,

    /// Output file name prefix, e.g. `intro` -> intro_0001.png.
    #[arg(long, default_value = "intro")]
    prefix: String,

    /// Glyph cell size used for the conversion.
    #[arg(long, default_value_t = 4)]
    cell_size: u32,

    /// Keep per-cell mean colors instead of white-on-black glyphs.
    #[arg(long)]
    keep_colors: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut sources: Vec<PathBuf> = fs::read_dir(&cli.raw)
        .with_context(|| format!("missing raw image directory '{}'", cli.raw.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                .unwrap_or(false)
        })
        .collect();
    sources.sort();

    if sources.is_empty() {
        bail!("no raw images found in '{}'", cli.raw.display());
    }

    fs::create_dir_all(&cli.out)
        .with_context(|| format!("failed to create output directory '{}'", cli.out.display()))?;

    let mode = if cli.keep_colors {
        ColorMode::KeepColors
    } else {
        ColorMode::Monochrome
    };
    let mut remapper = GlyphRemapper::new();

    for (index, source) in sources.iter().enumerate() {
        let frame = load_frame(source)?;
        let converted = remapper.convert(&frame, cli.cell_size, mode);

        let out_path = cli
            .out
            .join(format!("{}_{:04}.png", cli.prefix, index + 1));
        let (width, height) = (converted.width(), converted.height());
        let image = RgbaImage::from_raw(width, height, converted.into_rgba())
            .context("converted frame has a malformed buffer")?;
        image
            .save(&out_path)
            .with_context(|| format!("failed to write '{}'", out_path.display()))?;

        eprintln!(
            "[prepare-portraits] {} -> {}",
            source.display(),
            out_path.display()
        );
    }

    Ok(())
}
