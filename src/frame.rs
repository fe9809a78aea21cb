//! Flat RGBA frame buffer, the unit every pipeline stage consumes and
//! produces. Straight (non-premultiplied) alpha, 8 bits per channel,
//! row-major with `index = y * width + x`.

use tiny_skia::Pixmap;

/// One raster image representing a single rendered tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Frame {
    /// Allocate a fully transparent frame. Dimensions must be non-zero.
    pub fn new(width: u32, height: u32) -> Self {
        assert!(width > 0 && height > 0, "frame dimensions must be non-zero");
        let len = (width as usize) * (height as usize) * 4;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Allocate a frame filled with an opaque solid color.
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut frame = Self::new(width, height);
        frame.fill([rgb[0], rgb[1], rgb[2], 255]);
        frame
    }

    /// Wrap an existing RGBA byte buffer. The buffer length must be
    /// exactly `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert!(width > 0 && height > 0, "frame dimensions must be non-zero");
        assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * 4,
            "RGBA buffer length mismatch"
        );
        Self {
            width,
            height,
            data,
        }
    }

    /// Convert a tiny-skia pixmap (premultiplied alpha) into a straight
    /// alpha frame.
    pub fn from_pixmap(pixmap: &Pixmap) -> Self {
        let width = pixmap.width();
        let height = pixmap.height();
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 4);
        for pixel in pixmap.pixels() {
            let demul = pixel.demultiply();
            data.extend_from_slice(&[demul.red(), demul.green(), demul.blue(), demul.alpha()]);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_rgba(self) -> Vec<u8> {
        self.data
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + (x as usize)) * 4
    }

    #[inline]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    pub fn fill(&mut self, rgba: [u8; 4]) {
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&rgba);
        }
    }

    /// Source-over blend of a straight-alpha pixel. Off-frame coordinates
    /// are ignored.
    pub fn blend_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let src_a = rgba[3] as u32;
        if src_a == 0 {
            return;
        }
        if src_a == 255 {
            self.put_pixel(x, y, rgba);
            return;
        }

        let dst = self.pixel(x, y);
        let dst_a = dst[3] as u32;
        let inv = 255 - src_a;
        let out_a = src_a + (dst_a * inv + 127) / 255;
        let mut out = [0u8; 4];
        for channel in 0..3 {
            let src_c = rgba[channel] as u32;
            let dst_c = dst[channel] as u32;
            // straight-alpha source-over, renormalized by the result alpha
            let num = src_c * src_a * 255 + dst_c * dst_a * inv;
            let den = out_a * 255;
            out[channel] = if den == 0 {
                0
            } else {
                ((num + den / 2) / den) as u8
            };
        }
        out[3] = out_a as u8;
        self.put_pixel(x, y, out);
    }

    /// Opaque axis-aligned rectangle fill, clipped to the frame.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, rgba: [u8; 4]) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x.saturating_add(w as i32)).clamp(0, self.width as i32) as u32;
        let y1 = (y.saturating_add(h as i32)).clamp(0, self.height as i32) as u32;
        for py in y0..y1 {
            for px in x0..x1 {
                self.put_pixel(px, py, rgba);
            }
        }
    }

    /// Nearest-neighbour scaled blit with source-over blending. The
    /// destination rectangle may extend past the frame edge; out-of-frame
    /// pixels are clipped.
    pub fn blit_scaled(&mut self, src: &Frame, dst_x: i32, dst_y: i32, dst_w: u32, dst_h: u32) {
        if dst_w == 0 || dst_h == 0 {
            return;
        }
        for oy in 0..dst_h {
            let ty = dst_y + oy as i32;
            if ty < 0 || ty >= self.height as i32 {
                continue;
            }
            let sy = ((u64::from(oy) * u64::from(src.height)) / u64::from(dst_h)) as u32;
            for ox in 0..dst_w {
                let tx = dst_x + ox as i32;
                if tx < 0 || tx >= self.width as i32 {
                    continue;
                }
                let sx = ((u64::from(ox) * u64::from(src.width)) / u64::from(dst_w)) as u32;
                self.blend_pixel(tx as u32, ty as u32, src.pixel(sx, sy));
            }
        }
    }
}
