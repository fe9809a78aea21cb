//! Output sinks for finished frames.
//!
//! The sink is chosen once at startup: a window (see `window.rs`, behind
//! the `windowed` feature) or the headless PNG stream below. The stream
//! writes encoded PNG images back to back with no extra framing; PNG is
//! self-delimiting, so a consumer splits on the signature/IEND structure.

use std::io::Write;

use anyhow::{Context, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::frame::Frame;

/// Destination abstraction the loop hands finished frames to.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame) -> Result<()>;

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Headless sink: one encoded PNG per rendered tick onto a byte stream.
pub struct PngStreamSink<W: Write> {
    writer: W,
}

impl<W: Write> PngStreamSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for PngStreamSink<W> {
    fn present(&mut self, frame: &Frame) -> Result<()> {
        let encoder = PngEncoder::new(&mut self.writer);
        encoder
            .write_image(
                frame.data(),
                frame.width(),
                frame.height(),
                ExtendedColorType::Rgba8,
            )
            .context("failed to encode frame as PNG")?;
        self.writer.flush().context("failed to flush frame stream")
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().context("failed to flush frame stream")
    }
}

/// Test/diagnostic sink that only counts frames.
#[derive(Debug, Default)]
pub struct NullSink {
    pub frames_presented: usize,
}

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Frame) -> Result<()> {
        self.frames_presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];

    fn signature_offsets(bytes: &[u8]) -> Vec<usize> {
        (0..bytes.len().saturating_sub(7))
            .filter(|&i| bytes[i..i + 8] == PNG_SIGNATURE)
            .collect()
    }

    #[test]
    fn stream_holds_one_png_per_presented_frame() {
        let mut sink = PngStreamSink::new(Vec::new());
        let frame = Frame::solid(12, 8, [40, 80, 120]);
        sink.present(&frame).expect("first frame should encode");
        sink.present(&frame).expect("second frame should encode");

        let bytes = sink.into_inner();
        assert_eq!(signature_offsets(&bytes).len(), 2);
    }

    #[test]
    fn streamed_frames_decode_back_to_their_dimensions() {
        let mut sink = PngStreamSink::new(Vec::new());
        let frame = Frame::solid(21, 9, [255, 0, 0]);
        sink.present(&frame).expect("frame should encode");
        sink.present(&frame).expect("frame should encode");

        let bytes = sink.into_inner();
        let offsets = signature_offsets(&bytes);
        assert_eq!(offsets.len(), 2);

        let first = &bytes[offsets[0]..offsets[1]];
        let decoded = image::load_from_memory(first).expect("first image should decode");
        assert_eq!(decoded.width(), 21);
        assert_eq!(decoded.height(), 9);

        let pixel = decoded.to_rgba8().get_pixel(0, 0).0;
        assert_eq!(pixel, [255, 0, 0, 255]);
    }

    #[test]
    fn null_sink_counts_frames() {
        let mut sink = NullSink::default();
        let frame = Frame::solid(2, 2, [0, 0, 0]);
        sink.present(&frame).expect("null sink never fails");
        sink.present(&frame).expect("null sink never fails");
        assert_eq!(sink.frames_presented, 2);
    }
}
