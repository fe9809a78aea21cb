//! Luminance-to-glyph ASCII conversion.
//!
//! The frame is partitioned into `cell_size` squares (trailing cells are
//! truncated at the frame edge). Each cell contributes one glyph from a
//! fixed darkest-to-brightest ramp, chosen by the cell's mean luminance
//! and stamped centered over an opaque black background.

use crate::frame::Frame;
use crate::glyph_atlas::GlyphAtlas;

/// Darkest-to-brightest glyph ramp. Fixed for the process lifetime.
pub const GLYPH_RAMP: [u8; 15] = [
    b' ', b'.', b',', b'-', b':', b';', b'*', b'+', b'g', b'&', b'$', b'#', b'%', b'A', b'@',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Monochrome,
    KeepColors,
}

/// Fixed-point BT.709 luma, integer arithmetic, no gamma correction.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 54 + u32::from(g) * 183 + u32::from(b) * 19) >> 8) as u8
}

/// Linear luminance bucket split, clamped at the extremes.
#[inline]
pub fn ramp_index(luminance: u8) -> usize {
    match luminance {
        0 => 0,
        255 => GLYPH_RAMP.len() - 1,
        l => (usize::from(l) * (GLYPH_RAMP.len() - 1)) / 255,
    }
}

/// Per-cell-size stamping metrics, recomputed only when the cell size
/// changes.
#[derive(Debug, Clone)]
struct CellMetrics {
    cell_size: u32,
    x_offset_by_glyph: [i32; GLYPH_RAMP.len()],
    baseline_offset: i32,
}

#[derive(Debug, Clone)]
pub struct GlyphRemapper {
    atlas: GlyphAtlas,
    metrics: Option<CellMetrics>,
}

impl Default for GlyphRemapper {
    fn default() -> Self {
        Self::new()
    }
}

impl GlyphRemapper {
    pub fn new() -> Self {
        Self {
            atlas: GlyphAtlas::new(),
            metrics: None,
        }
    }

    /// Convert `frame` into its ASCII rendition. Output dimensions equal
    /// the input dimensions; a frame smaller than one cell still yields a
    /// single partial-cell glyph.
    pub fn convert(&mut self, frame: &Frame, cell_size: u32, mode: ColorMode) -> Frame {
        assert!(cell_size > 0, "cell size must be non-zero");

        let width = frame.width();
        let height = frame.height();
        let mut output = Frame::new(width, height);

        let metrics = self.metrics_for(cell_size);

        let cells_x = (width + cell_size - 1) / cell_size;
        let cells_y = (height + cell_size - 1) / cell_size;

        for cell_y in 0..cells_y {
            let y0 = cell_y * cell_size;
            let y1 = (y0 + cell_size).min(height);

            for cell_x in 0..cells_x {
                let x0 = cell_x * cell_size;
                let x1 = (x0 + cell_size).min(width);

                let mut sum_luma: u64 = 0;
                let mut sum_r: u64 = 0;
                let mut sum_g: u64 = 0;
                let mut sum_b: u64 = 0;
                let mut count: u64 = 0;

                for y in y0..y1 {
                    for x in x0..x1 {
                        let [r, g, b, _] = frame.pixel(x, y);
                        sum_luma += u64::from(luma(r, g, b));
                        if mode == ColorMode::KeepColors {
                            sum_r += u64::from(r);
                            sum_g += u64::from(g);
                            sum_b += u64::from(b);
                        }
                        count += 1;
                    }
                }

                if count == 0 {
                    continue;
                }

                // Output alpha for the whole cell comes from the cell's
                // representative pixel, so transparency cutouts survive
                // the conversion.
                let cell_alpha = frame.pixel(x0, y0)[3];
                for y in y0..y1 {
                    for x in x0..x1 {
                        output.put_pixel(x, y, [0, 0, 0, cell_alpha]);
                    }
                }

                let mean_luma = (sum_luma / count) as u8;
                let glyph_index = ramp_index(mean_luma);
                let glyph = GLYPH_RAMP[glyph_index];
                if glyph == b' ' {
                    continue;
                }

                let color = match mode {
                    ColorMode::Monochrome => [255, 255, 255],
                    ColorMode::KeepColors => [
                        (sum_r / count) as u8,
                        (sum_g / count) as u8,
                        (sum_b / count) as u8,
                    ],
                };

                let left = x0 as i32 + metrics.x_offset_by_glyph[glyph_index];
                let top = y0 as i32 + metrics.baseline_offset - self.atlas.ascent() as i32;
                stamp_glyph(&mut output, &self.atlas, glyph, left, top, color);
            }
        }

        output
    }

    fn metrics_for(&mut self, cell_size: u32) -> CellMetrics {
        if let Some(metrics) = &self.metrics {
            if metrics.cell_size == cell_size {
                return metrics.clone();
            }
        }

        let font_height = self.atlas.glyph_height() as i32;
        let ascent = self.atlas.ascent() as i32;
        let cell = cell_size as i32;

        let mut x_offset_by_glyph = [0i32; GLYPH_RAMP.len()];
        for (index, glyph) in GLYPH_RAMP.iter().enumerate() {
            let ink = self.atlas.ink_width(*glyph) as i32;
            x_offset_by_glyph[index] = (cell - ink) / 2;
        }
        let baseline_offset = (cell - font_height) / 2 + ascent;

        let metrics = CellMetrics {
            cell_size,
            x_offset_by_glyph,
            baseline_offset,
        };
        self.metrics = Some(metrics.clone());
        metrics
    }

    #[cfg(test)]
    fn cached_cell_size(&self) -> Option<u32> {
        self.metrics.as_ref().map(|m| m.cell_size)
    }
}

/// Stamp a glyph's RGB over the frame, leaving the alpha plane as laid
/// down by the cell pass. Off-frame rows and columns are clipped.
fn stamp_glyph(frame: &mut Frame, atlas: &GlyphAtlas, glyph: u8, left: i32, top: i32, rgb: [u8; 3]) {
    for gy in 0..atlas.glyph_height() {
        let y = top + gy as i32;
        if y < 0 || y >= frame.height() as i32 {
            continue;
        }
        for gx in 0..atlas.glyph_width() {
            let x = left + gx as i32;
            if x < 0 || x >= frame.width() as i32 {
                continue;
            }
            if atlas.sample(glyph, gx, gy) {
                let alpha = frame.pixel(x as u32, y as u32)[3];
                frame.put_pixel(x as u32, y as u32, [rgb[0], rgb[1], rgb[2], alpha]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_is_deterministic_for_identical_input() {
        let frame = {
            let mut f = Frame::new(20, 14);
            for y in 0..14 {
                for x in 0..20 {
                    f.put_pixel(x, y, [(x * 12) as u8, (y * 17) as u8, 90, 255]);
                }
            }
            f
        };
        let mut remapper = GlyphRemapper::new();
        let first = remapper.convert(&frame, 6, ColorMode::Monochrome);
        let second = remapper.convert(&frame, 6, ColorMode::Monochrome);
        assert_eq!(first, second);
    }

    #[test]
    fn ramp_index_is_monotonic_in_luminance() {
        let mut last = 0;
        for l in 0..=255u8 {
            let index = ramp_index(l);
            assert!(index >= last, "index dropped at luma {l}");
            last = index;
        }
    }

    #[test]
    fn boundary_lumas_map_to_ramp_ends() {
        assert_eq!(ramp_index(0), 0);
        assert_eq!(ramp_index(255), GLYPH_RAMP.len() - 1);
        assert_eq!(ramp_index(1), 0);
        assert!(ramp_index(254) < GLYPH_RAMP.len() - 1);
    }

    #[test]
    fn black_frame_renders_no_ink() {
        let mut remapper = GlyphRemapper::new();
        let output = remapper.convert(&Frame::solid(12, 12, [0, 0, 0]), 6, ColorMode::Monochrome);
        assert!(output
            .data()
            .chunks_exact(4)
            .all(|px| px[0] == 0 && px[1] == 0 && px[2] == 0));
    }

    #[test]
    fn white_frame_renders_white_ink() {
        let mut remapper = GlyphRemapper::new();
        let output = remapper.convert(
            &Frame::solid(16, 16, [255, 255, 255]),
            8,
            ColorMode::Monochrome,
        );
        assert!(output
            .data()
            .chunks_exact(4)
            .any(|px| px[0] == 255 && px[1] == 255 && px[2] == 255));
    }

    #[test]
    fn keep_colors_uses_cell_mean_rgb() {
        let mut remapper = GlyphRemapper::new();
        let output = remapper.convert(
            &Frame::solid(16, 16, [200, 40, 40]),
            8,
            ColorMode::KeepColors,
        );
        assert!(output
            .data()
            .chunks_exact(4)
            .any(|px| px[0] == 200 && px[1] == 40 && px[2] == 40));
    }

    #[test]
    fn frame_smaller_than_cell_still_converts() {
        let mut remapper = GlyphRemapper::new();
        let output = remapper.convert(&Frame::solid(3, 2, [255, 255, 255]), 6, ColorMode::Monochrome);
        assert_eq!(output.width(), 3);
        assert_eq!(output.height(), 2);
    }

    #[test]
    fn transparent_cells_stay_transparent() {
        let mut frame = Frame::solid(12, 6, [255, 255, 255]);
        for y in 0..6 {
            for x in 0..6 {
                frame.put_pixel(x, y, [255, 255, 255, 0]);
            }
        }
        let mut remapper = GlyphRemapper::new();
        let output = remapper.convert(&frame, 6, ColorMode::Monochrome);
        assert_eq!(output.pixel(2, 2)[3], 0);
        assert_eq!(output.pixel(8, 2)[3], 255);
    }

    #[test]
    fn metrics_cache_follows_cell_size() {
        let frame = Frame::solid(12, 12, [128, 128, 128]);
        let mut remapper = GlyphRemapper::new();
        remapper.convert(&frame, 6, ColorMode::Monochrome);
        assert_eq!(remapper.cached_cell_size(), Some(6));
        remapper.convert(&frame, 4, ColorMode::Monochrome);
        assert_eq!(remapper.cached_cell_size(), Some(4));
    }
}
