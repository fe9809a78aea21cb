//! Timer-driven text reveal and the still-frame dialogue phase.
//!
//! A dialogue phase shows a slideshow of pre-styled portrait frames while
//! a reveal sequence types out, one entry per cadence step. The phase is
//! complete only when both the slideshow and the reveal have finished.

use crate::compositor::{SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::frame::Frame;
use crate::glyph_atlas::GlyphAtlas;
use crate::input::GameAction;
use crate::text::draw_text;

const PORTRAIT_X: i32 = 600;
const PORTRAIT_Y: i32 = 400;
const PORTRAIT_SIZE: u32 = 500;

const TEXTBOX_X: i32 = 1120;
const TEXTBOX_Y: i32 = 750;
const TEXTBOX_WIDTH: u32 = 680;
const TEXTBOX_HEIGHT: u32 = 180;
const TEXT_PADDING_X: i32 = 40;
const TEXT_PADDING_Y: i32 = 40;
const LINE_HEIGHT: i32 = 30;
const OUTSIDE_OFFSET_Y: i32 = 200;
const TEXT_SCALE: u32 = 2;

const MAIN_LINES_VISIBLE: usize = 3;
const OUTSIDE_LINES_VISIBLE: usize = 2;

/// One reveal step. `outside` entries render above the text box instead
/// of inside it.
#[derive(Debug, Clone)]
pub struct DialogueEntry {
    pub text: String,
    pub outside: bool,
}

impl DialogueEntry {
    pub fn inside(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            outside: false,
        }
    }

    pub fn outside(text: &str) -> Self {
        Self {
            text: text.to_owned(),
            outside: true,
        }
    }
}

/// Reveal sequence: the cursor advances one entry each time the
/// accumulator crosses the cadence step.
#[derive(Debug, Clone)]
pub struct Dialogue {
    entries: Vec<DialogueEntry>,
    seconds_per_step: f64,
    cursor: usize,
    accumulator_seconds: f64,
}

impl Dialogue {
    pub fn new(entries: Vec<DialogueEntry>, seconds_per_step: f64) -> Self {
        Self {
            entries,
            seconds_per_step,
            cursor: 0,
            accumulator_seconds: 0.0,
        }
    }

    pub fn update(&mut self, delta_seconds: f64) {
        if self.is_finished() {
            return;
        }
        self.accumulator_seconds += delta_seconds.max(0.0);
        if self.accumulator_seconds >= self.seconds_per_step {
            self.accumulator_seconds = 0.0;
            self.cursor = (self.cursor + 1).min(self.entries.len());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.entries.len()
    }

    /// Trailing window of revealed in-box entries, oldest first.
    pub fn visible_main_lines(&self, max_lines: usize) -> Vec<&str> {
        self.visible_lines(max_lines, false)
    }

    /// Trailing window of revealed outside entries, oldest first.
    pub fn visible_outside_lines(&self, max_lines: usize) -> Vec<&str> {
        self.visible_lines(max_lines, true)
    }

    fn visible_lines(&self, max_lines: usize, outside: bool) -> Vec<&str> {
        let max_lines = max_lines.max(1);
        let mut result = Vec::with_capacity(max_lines);
        for entry in self.entries[..self.cursor.min(self.entries.len())]
            .iter()
            .rev()
        {
            if entry.outside != outside {
                continue;
            }
            result.push(entry.text.as_str());
            if result.len() == max_lines {
                break;
            }
        }
        result.reverse();
        result
    }
}

/// A phase made purely of stills and text: portrait slideshow plus
/// reveal sequence, both gates required for completion.
#[derive(Debug)]
pub struct DialoguePhase {
    frames: Vec<Frame>,
    seconds_per_frame: f64,
    dialogue: Dialogue,
    elapsed_seconds: f64,
    canvas: Frame,
    atlas: GlyphAtlas,
}

impl DialoguePhase {
    pub fn new(frames: Vec<Frame>, seconds_per_frame: f64, dialogue: Dialogue) -> Self {
        Self {
            frames,
            seconds_per_frame,
            dialogue,
            elapsed_seconds: 0.0,
            canvas: Frame::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            atlas: GlyphAtlas::new(),
        }
    }

    pub fn advance(&mut self, _action: Option<GameAction>, delta_seconds: f64) -> bool {
        self.elapsed_seconds += delta_seconds.max(0.0);
        self.dialogue.update(delta_seconds);
        self.animation_finished() && self.dialogue.is_finished()
    }

    fn animation_finished(&self) -> bool {
        // an empty slideshow counts as already finished
        let total = self.frames.len() as f64 * self.seconds_per_frame;
        self.elapsed_seconds >= total
    }

    fn current_frame_index(&self) -> Option<usize> {
        if self.frames.is_empty() {
            return None;
        }
        let index = (self.elapsed_seconds / self.seconds_per_frame).floor() as usize;
        Some(index.min(self.frames.len() - 1))
    }

    pub fn content(&mut self) -> &Frame {
        self.canvas.fill([0, 0, 0, 255]);

        if let Some(index) = self.current_frame_index() {
            let portrait = &self.frames[index];
            self.canvas
                .blit_scaled(portrait, PORTRAIT_X, PORTRAIT_Y, PORTRAIT_SIZE, PORTRAIT_SIZE);
        }

        draw_text_box(&mut self.canvas, &self.atlas, &self.dialogue);
        &self.canvas
    }
}

fn draw_text_box(canvas: &mut Frame, atlas: &GlyphAtlas, dialogue: &Dialogue) {
    // box body and single-pixel border
    canvas.fill_rect(
        TEXTBOX_X,
        TEXTBOX_Y,
        TEXTBOX_WIDTH,
        TEXTBOX_HEIGHT,
        [12, 12, 12, 255],
    );
    canvas.fill_rect(TEXTBOX_X, TEXTBOX_Y, TEXTBOX_WIDTH, 2, [255, 255, 255, 255]);
    canvas.fill_rect(
        TEXTBOX_X,
        TEXTBOX_Y + TEXTBOX_HEIGHT as i32 - 2,
        TEXTBOX_WIDTH,
        2,
        [255, 255, 255, 255],
    );
    canvas.fill_rect(TEXTBOX_X, TEXTBOX_Y, 2, TEXTBOX_HEIGHT, [255, 255, 255, 255]);
    canvas.fill_rect(
        TEXTBOX_X + TEXTBOX_WIDTH as i32 - 2,
        TEXTBOX_Y,
        2,
        TEXTBOX_HEIGHT,
        [255, 255, 255, 255],
    );

    for (index, line) in dialogue
        .visible_main_lines(MAIN_LINES_VISIBLE)
        .iter()
        .enumerate()
    {
        draw_text(
            canvas,
            atlas,
            TEXTBOX_X + TEXT_PADDING_X,
            TEXTBOX_Y + TEXT_PADDING_Y + index as i32 * LINE_HEIGHT,
            TEXT_SCALE,
            [255, 255, 255, 255],
            line,
        );
    }

    let outside = dialogue.visible_outside_lines(OUTSIDE_LINES_VISIBLE);
    for (index, line) in outside.iter().enumerate() {
        let y = TEXTBOX_Y
            - OUTSIDE_OFFSET_Y
            - (outside.len() as i32 - 1 - index as i32) * LINE_HEIGHT;
        draw_text(
            canvas,
            atlas,
            TEXTBOX_X + TEXT_PADDING_X,
            y,
            TEXT_SCALE,
            [200, 200, 200, 255],
            line,
        );
    }
}
