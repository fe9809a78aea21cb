//! Loading phase: a clamped elapsed-time accumulator and a procedural
//! rotating-segment spinner drawn with tiny-skia.
//!
//! The spinner frame is produced raw; the shared pipeline's glyph remap
//! stage converts it, so the loading screen rides the same pixel
//! pipeline as gameplay.

use std::f64::consts::TAU;

use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

use crate::frame::Frame;
use crate::input::GameAction;

const CANVAS_WIDTH: u32 = 960;
const CANVAS_HEIGHT: u32 = 540;

const SEGMENTS: usize = 16;
const VISIBLE_SEGMENTS: usize = 4;
const ALPHA_BY_TRAIL: [f32; VISIBLE_SEGMENTS] = [1.0, 0.70, 0.42, 0.18];

const ROTATIONS_PER_SECOND: f64 = 0.35;

/// Monotonic elapsed-time accumulator clamped to `[0, duration]`.
#[derive(Debug, Clone, Copy)]
pub struct LoadingState {
    duration_seconds: f64,
    elapsed_seconds: f64,
}

impl LoadingState {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds: duration_seconds.max(0.0),
            elapsed_seconds: 0.0,
        }
    }

    pub fn update(&mut self, delta_seconds: f64) {
        if self.elapsed_seconds >= self.duration_seconds {
            return;
        }
        self.elapsed_seconds += delta_seconds.max(0.0);
        if self.elapsed_seconds > self.duration_seconds {
            self.elapsed_seconds = self.duration_seconds;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed_seconds >= self.duration_seconds
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }
}

/// Draws the rotating-segment spinner: `VISIBLE_SEGMENTS` trailing
/// radially oriented ovals around a circle of `SEGMENTS` positions,
/// fading out along the trail, composited over black.
#[derive(Debug, Default)]
pub struct SpinnerRenderer;

impl SpinnerRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, state: &LoadingState) -> Frame {
        let mut pixmap =
            Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT).expect("spinner canvas dimensions are static");
        pixmap.fill(Color::BLACK);

        let center_x = (CANVAS_WIDTH / 2) as f32;
        let center_y = (CANVAS_HEIGHT / 2) as f32;
        let min_side = CANVAS_WIDTH.min(CANVAS_HEIGHT) as f32;

        let radius = min_side / 6.0;
        let oval_length = min_side / 8.0;
        let oval_thickness = min_side / 16.0;

        let base_angle = state.elapsed_seconds() * TAU * ROTATIONS_PER_SECOND;
        let head = head_index(base_angle);
        let step = TAU / SEGMENTS as f64;

        for trail in 0..VISIBLE_SEGMENTS {
            let segment = (head + SEGMENTS - trail) % SEGMENTS;
            let theta = segment as f64 * step + base_angle;

            let mut paint = Paint::default();
            paint.set_color(
                Color::from_rgba(1.0, 1.0, 1.0, ALPHA_BY_TRAIL[trail])
                    .expect("trail alphas are within [0, 1]"),
            );
            paint.anti_alias = true;

            let rect = Rect::from_xywh(
                -oval_thickness / 2.0,
                -radius - oval_length / 2.0,
                oval_thickness,
                oval_length,
            )
            .expect("oval extents are static");
            let path = PathBuilder::from_oval(rect).expect("oval rect is valid");

            let transform = Transform::from_rotate(theta.to_degrees() as f32)
                .post_translate(center_x, center_y);
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        }

        Frame::from_pixmap(&pixmap)
    }
}

/// Segment the spinner head occupies for a rotation angle in radians.
fn head_index(angle_radians: f64) -> usize {
    let normalized = (angle_radians / TAU) * SEGMENTS as f64;
    (normalized.floor() as i64).rem_euclid(SEGMENTS as i64) as usize
}

/// The first phase of the sequence: waits out its timer while the
/// spinner turns. The frame rendered by the last `advance` is cached
/// until the next one.
#[derive(Debug)]
pub struct LoadingPhase {
    state: LoadingState,
    renderer: SpinnerRenderer,
    last_frame: Option<Frame>,
}

impl LoadingPhase {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            state: LoadingState::new(duration_seconds),
            renderer: SpinnerRenderer::new(),
            last_frame: None,
        }
    }

    pub fn advance(&mut self, _action: Option<GameAction>, delta_seconds: f64) -> bool {
        self.state.update(delta_seconds);
        self.last_frame = Some(self.renderer.render(&self.state));
        self.state.is_finished()
    }

    pub fn content(&mut self) -> &Frame {
        if self.last_frame.is_none() {
            self.last_frame = Some(self.renderer.render(&self.state));
        }
        self.last_frame.as_ref().expect("frame rendered above")
    }
}
