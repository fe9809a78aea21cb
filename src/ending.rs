//! Ending phase: a typewriter story reveal over a procedural emblem
//! backdrop, held on screen for a moment after the last character.

use std::f32::consts::TAU;

use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::frame::Frame;
use crate::glyph_atlas::GlyphAtlas;
use crate::input::GameAction;
use crate::text::{draw_text, text_width};

const CANVAS_WIDTH: u32 = 960;
const CANVAS_HEIGHT: u32 = 540;

const CHARACTERS_PER_SECOND: f64 = 28.0;
const LINE_PAUSE_SECONDS: f64 = 0.5;

const STORY_LINES: [&str; 9] = [
    "RECOVERY COMPLETE.",
    "Corruption contained. Core signal steady.",
    "",
    "The watchdog releases its grip on the host thread.",
    "Somewhere a scheduler stops counting failures.",
    "",
    "WARDEN: \"All fragments reassembled.\"",
    "WARDEN: \"Detaching from host. Goodbye.\"",
    "One clean heartbeat, then another.",
];

/// Character-by-character reveal with a short pause between lines.
#[derive(Debug)]
pub struct StoryText {
    lines: Vec<String>,
    current_line: usize,
    revealed_in_line: usize,
    type_accumulator: f64,
    pause_remaining: f64,
    fully_revealed: bool,
    seconds_since_revealed: f64,
}

impl Default for StoryText {
    fn default() -> Self {
        Self::new()
    }
}

impl StoryText {
    pub fn new() -> Self {
        Self::with_lines(STORY_LINES.iter().map(|s| s.to_string()).collect())
    }

    pub fn with_lines(lines: Vec<String>) -> Self {
        let fully_revealed = lines.is_empty();
        Self {
            lines,
            current_line: 0,
            revealed_in_line: 0,
            type_accumulator: 0.0,
            pause_remaining: 0.0,
            fully_revealed,
            seconds_since_revealed: 0.0,
        }
    }

    pub fn update(&mut self, delta_seconds: f64) {
        let delta = delta_seconds.max(0.0);

        if self.fully_revealed {
            self.seconds_since_revealed += delta;
            return;
        }

        if self.pause_remaining > 0.0 {
            self.pause_remaining = (self.pause_remaining - delta).max(0.0);
            return;
        }

        self.type_accumulator += delta * CHARACTERS_PER_SECOND;
        while self.type_accumulator >= 1.0 && !self.fully_revealed {
            self.type_accumulator -= 1.0;
            self.reveal_next_character();
        }
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.fully_revealed
    }

    pub fn seconds_since_fully_revealed(&self) -> f64 {
        self.seconds_since_revealed
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Visible prefix of a line: whole lines above the reveal point,
    /// nothing below it.
    pub fn visible_line(&self, index: usize) -> &str {
        let Some(line) = self.lines.get(index) else {
            return "";
        };
        if self.fully_revealed || index < self.current_line {
            return line;
        }
        if index > self.current_line {
            return "";
        }
        &line[..self.revealed_in_line.min(line.len())]
    }

    fn reveal_next_character(&mut self) {
        if self.current_line >= self.lines.len() {
            self.mark_revealed();
            return;
        }

        if self.revealed_in_line < self.lines[self.current_line].len() {
            self.revealed_in_line += 1;
            return;
        }

        self.current_line += 1;
        self.revealed_in_line = 0;
        self.pause_remaining = LINE_PAUSE_SECONDS;

        if self.current_line >= self.lines.len() {
            self.mark_revealed();
        }
    }

    fn mark_revealed(&mut self) {
        self.fully_revealed = true;
        self.seconds_since_revealed = 0.0;
    }
}

/// Story plus the post-reveal hold timer.
#[derive(Debug)]
pub struct EndingState {
    story: StoryText,
    hold_seconds: f64,
    elapsed_seconds: f64,
}

impl EndingState {
    pub fn new(hold_seconds: f64) -> Self {
        Self {
            story: StoryText::new(),
            hold_seconds: hold_seconds.max(0.0),
            elapsed_seconds: 0.0,
        }
    }

    pub fn update(&mut self, delta_seconds: f64) {
        let delta = delta_seconds.max(0.0);
        self.elapsed_seconds += delta;
        self.story.update(delta);
    }

    pub fn is_finished(&self) -> bool {
        self.story.is_fully_revealed()
            && self.story.seconds_since_fully_revealed() >= self.hold_seconds
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed_seconds
    }

    pub fn story(&self) -> &StoryText {
        &self.story
    }
}

#[derive(Debug, Default)]
struct EndingRenderer {
    atlas: GlyphAtlas,
}

impl EndingRenderer {
    fn render(&self, state: &EndingState) -> Frame {
        let mut frame = self.backdrop(state.elapsed_seconds());

        let title = "RECOVERY COMPLETE";
        let title_x = (CANVAS_WIDTH as i32 - text_width(title, 4) as i32) / 2;
        draw_text(&mut frame, &self.atlas, title_x, 110, 4, [255, 255, 255, 255], title);

        let subtitle = "Integrity restored. The machine remembers you.";
        let sub_x = (CANVAS_WIDTH as i32 - text_width(subtitle, 2) as i32) / 2;
        draw_text(&mut frame, &self.atlas, sub_x, 160, 2, [255, 255, 255, 190], subtitle);

        let story = state.story();
        let left = 140;
        let top = 240;
        let line_height = 24;
        for index in 0..story.line_count() {
            let line = story.visible_line(index);
            if line.is_empty() {
                continue;
            }
            draw_text(
                &mut frame,
                &self.atlas,
                left,
                top + index as i32 * line_height,
                2,
                [255, 255, 255, 235],
                line,
            );
        }

        frame
    }

    /// Pulsing emblem ring with rotating tick marks, drawn with
    /// tiny-skia strokes over black.
    fn backdrop(&self, elapsed_seconds: f64) -> Frame {
        let mut pixmap =
            Pixmap::new(CANVAS_WIDTH, CANVAS_HEIGHT).expect("backdrop dimensions are static");
        pixmap.fill(Color::BLACK);

        let center_x = CANVAS_WIDTH as f32 / 2.0;
        let center_y = CANVAS_HEIGHT as f32 / 2.0 - 90.0;
        let ring_radius = 68.0f32;
        let rotation = (elapsed_seconds * 0.9) as f32;

        let stroke = Stroke {
            width: 2.0,
            ..Stroke::default()
        };

        let mut ring_paint = Paint::default();
        ring_paint.set_color(Color::from_rgba(1.0, 1.0, 1.0, 0.25).expect("static color"));
        ring_paint.anti_alias = true;

        if let Some(circle) = PathBuilder::from_circle(center_x, center_y, ring_radius) {
            pixmap.stroke_path(&circle, &ring_paint, &stroke, Transform::identity(), None);
        }

        let mut core_paint = Paint::default();
        core_paint.set_color(Color::from_rgba(1.0, 1.0, 1.0, 0.8).expect("static color"));
        core_paint.anti_alias = true;
        if let Some(core) = PathBuilder::from_circle(center_x, center_y, 8.0) {
            pixmap.fill_path(
                &core,
                &core_paint,
                tiny_skia::FillRule::Winding,
                Transform::identity(),
                None,
            );
        }

        let tick_count = 24;
        for tick in 0..tick_count {
            let angle = TAU * (tick as f32 / tick_count as f32) + rotation;
            let emphasis =
                0.35 + 0.65 * (angle * 2.0 + elapsed_seconds as f32).sin().max(0.0);
            let alpha = (0.15 + 0.30 * emphasis).clamp(0.0, 1.0);

            let mut tick_paint = Paint::default();
            tick_paint.set_color(Color::from_rgba(1.0, 1.0, 1.0, alpha).expect("alpha clamped"));
            tick_paint.anti_alias = true;

            let (sin, cos) = angle.sin_cos();
            let mut path = PathBuilder::new();
            path.move_to(center_x + cos * (ring_radius + 6.0), center_y + sin * (ring_radius + 6.0));
            path.line_to(
                center_x + cos * (ring_radius + 18.0),
                center_y + sin * (ring_radius + 18.0),
            );
            if let Some(path) = path.finish() {
                pixmap.stroke_path(&path, &tick_paint, &stroke, Transform::identity(), None);
            }
        }

        Frame::from_pixmap(&pixmap)
    }
}

/// Final phase of the sequence: completes once the story has been fully
/// revealed and held, letting the loop run past the end of the phase
/// list and exit gracefully.
#[derive(Debug)]
pub struct EndingPhase {
    state: EndingState,
    renderer: EndingRenderer,
    last_frame: Option<Frame>,
}

impl EndingPhase {
    pub fn new(hold_seconds: f64) -> Self {
        Self {
            state: EndingState::new(hold_seconds),
            renderer: EndingRenderer::default(),
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
