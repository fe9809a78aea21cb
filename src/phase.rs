//! The tagged-variant phase state machine.
//!
//! Phases are plain structs dispatched by match, each owning its private
//! timers and puzzle state. The capability set is `advance`, `content`,
//! `is_failed` and `prestyled`: a phase whose content already went
//! through the glyph remap is not converted again by the pipeline.

use crate::checksum::ChecksumPhase;
use crate::dialogue::DialoguePhase;
use crate::ending::EndingPhase;
use crate::frame::Frame;
use crate::input::GameAction;
use crate::loading::LoadingPhase;
use crate::maze::MazePhase;

#[derive(Debug)]
pub enum Phase {
    Loading(LoadingPhase),
    Intro(DialoguePhase),
    Checksum(ChecksumPhase),
    Maze(MazePhase),
    Ending(EndingPhase),
    Failed(DialoguePhase),
}

impl Phase {
    /// Advance the phase by one step; true when the phase completed.
    pub fn advance(&mut self, action: Option<GameAction>, delta_seconds: f64) -> bool {
        match self {
            Self::Loading(phase) => phase.advance(action, delta_seconds),
            Self::Intro(phase) | Self::Failed(phase) => phase.advance(action, delta_seconds),
            Self::Checksum(phase) => phase.advance(action, delta_seconds),
            Self::Maze(phase) => phase.advance(action, delta_seconds),
            Self::Ending(phase) => phase.advance(action, delta_seconds),
        }
    }

    pub fn content(&mut self) -> &Frame {
        match self {
            Self::Loading(phase) => phase.content(),
            Self::Intro(phase) | Self::Failed(phase) => phase.content(),
            Self::Checksum(phase) => phase.content(),
            Self::Maze(phase) => phase.content(),
            Self::Ending(phase) => phase.content(),
        }
    }

    /// Only the maze can end in failure; everything else completes
    /// normally.
    pub fn is_failed(&self) -> bool {
        match self {
            Self::Maze(phase) => phase.is_failed(),
            _ => false,
        }
    }

    /// Whether the phase already applied the ASCII conversion itself.
    pub fn prestyled(&self) -> bool {
        match self {
            Self::Loading(_) | Self::Ending(_) => false,
            Self::Intro(_) | Self::Failed(_) | Self::Checksum(_) | Self::Maze(_) => true,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading(_) => "loading",
            Self::Intro(_) => "intro",
            Self::Checksum(_) => "checksum",
            Self::Maze(_) => "maze",
            Self::Ending(_) => "ending",
            Self::Failed(_) => "failed",
        }
    }
}
