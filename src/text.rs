//! Text stamping onto frames using the embedded pixel font.
//! Monospace metrics: every glyph advances `8 * scale` pixels.

use crate::frame::Frame;
use crate::glyph_atlas::GlyphAtlas;

pub const GLYPH_ADVANCE: u32 = 8;

/// Pixel width of a rendered line.
pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_ADVANCE * scale
}

/// Stamp `text` with its top-left corner at `(x, y)`. Non-ASCII
/// characters render as `?`; pixels outside the frame are clipped.
pub fn draw_text(frame: &mut Frame, atlas: &GlyphAtlas, x: i32, y: i32, scale: u32, rgba: [u8; 4], text: &str) {
    let scale = scale.max(1);
    let mut pen_x = x;
    for ch in text.chars() {
        let glyph = if ch.is_ascii() { ch as u8 } else { b'?' };
        draw_glyph(frame, atlas, pen_x, y, scale, rgba, glyph);
        pen_x += (GLYPH_ADVANCE * scale) as i32;
    }
}

fn draw_glyph(frame: &mut Frame, atlas: &GlyphAtlas, x: i32, y: i32, scale: u32, rgba: [u8; 4], glyph: u8) {
    for gy in 0..atlas.glyph_height() {
        for gx in 0..atlas.glyph_width() {
            if !atlas.sample(glyph, gx, gy) {
                continue;
            }
            for sy in 0..scale {
                for sx in 0..scale {
                    let px = x + (gx * scale + sx) as i32;
                    let py = y + (gy * scale + sy) as i32;
                    if px >= 0 && py >= 0 {
                        frame.blend_pixel(px as u32, py as u32, rgba);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scales_with_text_and_scale() {
        assert_eq!(text_width("", 2), 0);
        assert_eq!(text_width("abc", 1), 24);
        assert_eq!(text_width("abc", 2), 48);
    }

    #[test]
    fn drawing_text_leaves_ink() {
        let mut frame = Frame::solid(64, 16, [0, 0, 0]);
        let atlas = GlyphAtlas::new();
        draw_text(&mut frame, &atlas, 2, 2, 1, [255, 255, 255, 255], "Hi");
        let lit = frame
            .data()
            .chunks_exact(4)
            .filter(|px| px[0] == 255)
            .count();
        assert!(lit > 0);
    }

    #[test]
    fn off_frame_text_is_clipped_without_panic() {
        let mut frame = Frame::solid(8, 8, [0, 0, 0]);
        let atlas = GlyphAtlas::new();
        draw_text(&mut frame, &atlas, -20, -20, 2, [255, 255, 255, 255], "clip");
        draw_text(&mut frame, &atlas, 100, 100, 2, [255, 255, 255, 255], "clip");
    }
}
