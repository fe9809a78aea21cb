//! Composes a phase frame onto the fixed-size screen raster before
//! post-processing.

use crate::frame::Frame;

/// Fixed logical screen raster every phase frame is composed onto.
pub const SCREEN_WIDTH: u32 = 1920;
pub const SCREEN_HEIGHT: u32 = 1080;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Scale preserving aspect, centered, black bars on the short axis.
    Letterbox,
    /// Fill the whole screen with independent X/Y scale factors.
    Stretch,
    /// Paste unscaled at the origin.
    TopLeft,
}

#[derive(Debug)]
pub struct ScreenCompositor {
    screen_width: u32,
    screen_height: u32,
    fit_mode: FitMode,
}

impl ScreenCompositor {
    pub fn new(screen_width: u32, screen_height: u32, fit_mode: FitMode) -> Self {
        assert!(screen_width > 0 && screen_height > 0);
        Self {
            screen_width,
            screen_height,
            fit_mode,
        }
    }

    /// A fresh screen-sized frame per call, so the loop can publish the
    /// result without retaining mutable access.
    pub fn compose(&self, phase_frame: &Frame) -> Frame {
        let mut screen = Frame::solid(self.screen_width, self.screen_height, [0, 0, 0]);

        match self.fit_mode {
            FitMode::TopLeft => {
                screen.blit_scaled(phase_frame, 0, 0, phase_frame.width(), phase_frame.height());
            }
            FitMode::Stretch => {
                screen.blit_scaled(phase_frame, 0, 0, self.screen_width, self.screen_height);
            }
            FitMode::Letterbox => {
                let scale_x = f64::from(self.screen_width) / f64::from(phase_frame.width());
                let scale_y = f64::from(self.screen_height) / f64::from(phase_frame.height());
                let scale = scale_x.min(scale_y);

                let dst_w = ((f64::from(phase_frame.width()) * scale).round() as u32).max(1);
                let dst_h = ((f64::from(phase_frame.height()) * scale).round() as u32).max(1);
                let dst_x = (self.screen_width as i32 - dst_w as i32) / 2;
                let dst_y = (self.screen_height as i32 - dst_h as i32) / 2;
                screen.blit_scaled(phase_frame, dst_x, dst_y, dst_w, dst_h);
            }
        }

        screen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn letterbox_centers_and_preserves_aspect() {
        let compositor = ScreenCompositor::new(100, 50, FitMode::Letterbox);
        let source = Frame::solid(10, 10, [255, 255, 255]);
        let screen = compositor.compose(&source);

        // square source on a 2:1 screen: 50x50 centered with side bars
        assert_eq!(screen.pixel(50, 25), [255, 255, 255, 255]);
        assert_eq!(screen.pixel(10, 25), [0, 0, 0, 255]);
        assert_eq!(screen.pixel(90, 25), [0, 0, 0, 255]);
    }

    #[test]
    fn stretch_fills_the_screen() {
        let compositor = ScreenCompositor::new(64, 32, FitMode::Stretch);
        let source = Frame::solid(4, 4, [10, 200, 30]);
        let screen = compositor.compose(&source);
        assert_eq!(screen.pixel(0, 0), [10, 200, 30, 255]);
        assert_eq!(screen.pixel(63, 31), [10, 200, 30, 255]);
    }

    #[test]
    fn top_left_pastes_unscaled() {
        let compositor = ScreenCompositor::new(16, 16, FitMode::TopLeft);
        let source = Frame::solid(4, 4, [255, 0, 0]);
        let screen = compositor.compose(&source);
        assert_eq!(screen.pixel(3, 3), [255, 0, 0, 255]);
        assert_eq!(screen.pixel(8, 8), [0, 0, 0, 255]);
    }
}
