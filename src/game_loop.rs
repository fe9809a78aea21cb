//! The phase-driven game loop.
//!
//! Owns the ordered phase sequence and a forward-only cursor, ticks the
//! simulation on a fixed timestep, and pushes every rendered frame
//! through the pixel pipeline into the active sink:
//!
//! content -> compositor -> aberration (optional) -> glyph remap (unless
//! the phase is prestyled) -> sink.

use std::time::Duration;

use anyhow::Result;

use crate::aberration::ChromaticAberration;
use crate::ascii::{ColorMode, GlyphRemapper};
use crate::compositor::{FitMode, ScreenCompositor, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::input::{ActionQueue, GameAction};
use crate::pacer::FramePacer;
use crate::phase::Phase;
use crate::sink::FrameSink;

pub const MAXIMUM_DELTA_SECONDS: f64 = 0.25;

/// Pipeline stages applied to every presented frame.
#[derive(Debug)]
pub struct PipelineConfig {
    pub fps: u32,
    pub cell_size: u32,
    pub color_mode: ColorMode,
    pub aberration: Option<ChromaticAberration>,
}

#[derive(Debug)]
pub struct GameLoop {
    phases: Vec<Phase>,
    failure_phase: Option<Phase>,
    cursor: usize,
    in_failure: bool,
    running: bool,

    input: ActionQueue,
    accumulator_seconds: f64,
    fixed_delta_seconds: f64,

    compositor: ScreenCompositor,
    remapper: GlyphRemapper,
    config: PipelineConfig,
}

impl GameLoop {
    pub fn new(
        phases: Vec<Phase>,
        failure_phase: Option<Phase>,
        input: ActionQueue,
        config: PipelineConfig,
    ) -> Self {
        let running = !phases.is_empty();
        let fixed_delta_seconds = 1.0 / f64::from(config.fps.max(1));
        Self {
            phases,
            failure_phase,
            cursor: 0,
            in_failure: false,
            running,
            input,
            accumulator_seconds: 0.0,
            fixed_delta_seconds,
            compositor: ScreenCompositor::new(SCREEN_WIDTH, SCREEN_HEIGHT, FitMode::Letterbox),
            remapper: GlyphRemapper::new(),
            config,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn current_phase_name(&self) -> &'static str {
        if self.in_failure {
            return self
                .failure_phase
                .as_ref()
                .map(Phase::name)
                .unwrap_or("failed");
        }
        self.phases
            .get(self.cursor)
            .map(Phase::name)
            .unwrap_or("done")
    }

    /// Drive the loop against a sink until the last phase completes or
    /// quit is requested.
    pub fn run(&mut self, sink: &mut dyn FrameSink) -> Result<()> {
        let frame_duration =
            Duration::from_nanos(1_000_000_000 / u64::from(self.config.fps.max(1)));
        let mut pacer = FramePacer::new(frame_duration, MAXIMUM_DELTA_SECONDS);

        eprintln!(
            "[corewake] running {} phase(s) at {} fps, starting with '{}'",
            self.phases.len(),
            self.config.fps,
            self.current_phase_name()
        );

        while self.running {
            let delta = pacer.consume_delta_seconds();
            self.advance_tick(delta);

            if self.running && pacer.is_frame_due() {
                self.render_to(sink)?;
                pacer.mark_frame_presented();
            }
            if self.running {
                pacer.sleep_until_next_frame();
            }
        }

        sink.finish()
    }

    /// One loop iteration worth of input handling and fixed-step
    /// simulation. Separated from `run` so tests can drive synthetic
    /// time.
    pub fn advance_tick(&mut self, delta_seconds: f64) {
        self.accumulator_seconds += delta_seconds.max(0.0);
        self.handle_actions();
        self.step_simulation();
    }

    fn handle_actions(&mut self) {
        while let Some(action) = self.input.poll() {
            if !self.running {
                return;
            }
            if action == GameAction::Quit {
                eprintln!("[corewake] quit requested");
                self.running = false;
                return;
            }
            let done = self.current_phase().advance(Some(action), 0.0);
            self.transition_if_done(done);
        }
    }

    fn step_simulation(&mut self) {
        while self.accumulator_seconds >= self.fixed_delta_seconds && self.running {
            let delta = self.fixed_delta_seconds;
            let done = self.current_phase().advance(None, delta);
            self.transition_if_done(done);
            self.accumulator_seconds -= delta;
        }
    }

    /// Render the current phase through the pipeline into the sink.
    pub fn render_to(&mut self, sink: &mut dyn FrameSink) -> Result<()> {
        let prestyled = self.current_phase().prestyled();

        let composed = {
            let phase = if self.in_failure {
                self.failure_phase
                    .as_mut()
                    .expect("failure mode requires a failure phase")
            } else {
                &mut self.phases[self.cursor]
            };
            self.compositor.compose(phase.content())
        };

        let post_processed = match &self.config.aberration {
            Some(filter) => filter.apply(&composed),
            None => composed,
        };

        let final_frame = if prestyled {
            post_processed
        } else {
            self.remapper
                .convert(&post_processed, self.config.cell_size, self.config.color_mode)
        };

        sink.present(&final_frame)
    }

    fn current_phase(&mut self) -> &mut Phase {
        if self.in_failure {
            self.failure_phase
                .as_mut()
                .expect("failure mode requires a failure phase")
        } else {
            &mut self.phases[self.cursor]
        }
    }

    fn transition_if_done(&mut self, done: bool) {
        if !done || !self.running {
            return;
        }

        if self.in_failure {
            // the failure ending is terminal
            eprintln!("[corewake] failure ending complete");
            self.running = false;
            return;
        }

        if self.current_phase().is_failed() && self.failure_phase.is_some() {
            eprintln!(
                "[corewake] phase '{}' failed, redirecting",
                self.current_phase_name()
            );
            self.in_failure = true;
            return;
        }

        self.cursor += 1;
        if self.cursor >= self.phases.len() {
            eprintln!("[corewake] all phases complete");
            self.running = false;
        } else {
            eprintln!("[corewake] entering phase '{}'", self.current_phase_name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::ChecksumPhase;
    use crate::dialogue::{Dialogue, DialogueEntry, DialoguePhase};
    use crate::frame::Frame;
    use crate::loading::LoadingPhase;
    use crate::maze::MazePhase;
    use crate::sink::NullSink;

    fn config() -> PipelineConfig {
        PipelineConfig {
            fps: 60,
            cell_size: 6,
            color_mode: ColorMode::Monochrome,
            aberration: None,
        }
    }

    fn tick(game_loop: &mut GameLoop) {
        game_loop.advance_tick(1.0 / 60.0);
    }

    struct CaptureSink {
        last: Option<Frame>,
    }

    impl FrameSink for CaptureSink {
        fn present(&mut self, frame: &Frame) -> Result<()> {
            self.last = Some(frame.clone());
            Ok(())
        }
    }

    #[test]
    fn sequence_sticks_on_an_unfinished_phase() {
        // A and B complete on their first tick, C never does.
        let phases = vec![
            Phase::Loading(LoadingPhase::new(0.0)),
            Phase::Loading(LoadingPhase::new(0.0)),
            Phase::Checksum(ChecksumPhase::new()),
        ];
        let mut game_loop = GameLoop::new(phases, None, ActionQueue::new(), config());

        tick(&mut game_loop);
        tick(&mut game_loop);
        assert_eq!(game_loop.current_phase_name(), "checksum");
        for _ in 0..20 {
            tick(&mut game_loop);
        }
        assert_eq!(game_loop.current_phase_name(), "checksum");
        assert!(game_loop.is_running());
    }

    #[test]
    fn finishing_the_last_phase_stops_the_loop() {
        let phases = vec![Phase::Loading(LoadingPhase::new(0.0))];
        let mut game_loop = GameLoop::new(phases, None, ActionQueue::new(), config());
        tick(&mut game_loop);
        assert!(!game_loop.is_running());
    }

    #[test]
    fn quit_action_stops_the_loop_immediately() {
        let phases = vec![Phase::Checksum(ChecksumPhase::new())];
        let queue = ActionQueue::new();
        let mut game_loop = GameLoop::new(phases, None, queue.clone(), config());

        tick(&mut game_loop);
        assert!(game_loop.is_running());
        queue.publish(GameAction::Quit);
        tick(&mut game_loop);
        assert!(!game_loop.is_running());
    }

    #[test]
    fn failed_maze_redirects_to_the_failure_phase() {
        let maze = MazePhase::with_tuning(1, 7, 0.05, 0.01);
        let failure = Phase::Failed(DialoguePhase::new(
            Vec::new(),
            1.0,
            Dialogue::new(vec![DialogueEntry::inside("the end")], 0.05),
        ));
        let mut game_loop = GameLoop::new(
            vec![Phase::Maze(maze)],
            Some(failure),
            ActionQueue::new(),
            config(),
        );

        let mut redirected = false;
        for _ in 0..4000 {
            game_loop.advance_tick(0.05);
            if game_loop.current_phase_name() == "failed" {
                redirected = true;
                break;
            }
            if !game_loop.is_running() {
                break;
            }
        }
        assert!(redirected, "maze failure should redirect to 'failed'");

        for _ in 0..100 {
            game_loop.advance_tick(0.05);
            if !game_loop.is_running() {
                break;
            }
        }
        assert!(!game_loop.is_running(), "failure ending is terminal");
    }

    #[test]
    fn rendered_frames_are_screen_sized() {
        let phases = vec![Phase::Loading(LoadingPhase::new(10.0))];
        let mut game_loop = GameLoop::new(phases, None, ActionQueue::new(), config());
        tick(&mut game_loop);

        let mut sink = CaptureSink { last: None };
        game_loop.render_to(&mut sink).expect("render should succeed");
        let frame = sink.last.expect("one frame presented");
        assert_eq!(frame.width(), SCREEN_WIDTH);
        assert_eq!(frame.height(), SCREEN_HEIGHT);
    }

    #[test]
    fn raw_phases_get_remapped_with_aberration_in_front() {
        let phases = vec![Phase::Loading(LoadingPhase::new(10.0))];
        let mut with_filter = config();
        with_filter.aberration =
            Some(ChromaticAberration::new(1, 2).expect("valid shifts"));
        let mut game_loop = GameLoop::new(phases, None, ActionQueue::new(), with_filter);
        game_loop.advance_tick(0.5);

        let mut sink = NullSink::default();
        game_loop.render_to(&mut sink).expect("render should succeed");
        assert_eq!(sink.frames_presented, 1);
    }

    #[test]
    fn empty_phase_list_never_runs() {
        let game_loop = GameLoop::new(Vec::new(), None, ActionQueue::new(), config());
        assert!(!game_loop.is_running());
        assert_eq!(game_loop.current_phase_name(), "done");
    }
}
