//! Input actions and the shared queue facade phases poll.
//!
//! Adapters (keyboard bindings in windowed mode, a line-based stdio
//! reader in headless mode) publish actions; the game loop drains them
//! once per tick.

use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use anyhow::{Context, Result};

/// Closed set of player actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    Confirm,
    Quit,
}

/// Thread-safe FIFO of pending actions. Cloning shares the queue.
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    inner: Arc<Mutex<VecDeque<GameAction>>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, action: GameAction) {
        self.inner
            .lock()
            .expect("action queue lock poisoned")
            .push_back(action);
    }

    pub fn poll(&self) -> Option<GameAction> {
        self.inner
            .lock()
            .expect("action queue lock poisoned")
            .pop_front()
    }
}

/// Parse one stdio control token. Case-insensitive; `None` for unknown
/// input.
pub fn parse_action(token: &str) -> Option<GameAction> {
    match token.trim().to_ascii_uppercase().as_str() {
        "UP" => Some(GameAction::MoveUp),
        "DOWN" => Some(GameAction::MoveDown),
        "LEFT" => Some(GameAction::MoveLeft),
        "RIGHT" => Some(GameAction::MoveRight),
        "CONFIRM" => Some(GameAction::Confirm),
        "QUIT" => Some(GameAction::Quit),
        _ => None,
    }
}

/// Spawn the headless input reader: one action token per line. Unknown
/// tokens are reported on stderr and skipped. The thread ends at EOF.
pub fn spawn_line_reader<R>(reader: R, queue: ActionQueue) -> Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    eprintln!("[corewake] controls: UP, DOWN, LEFT, RIGHT, CONFIRM, QUIT");
    thread::Builder::new()
        .name("stdio-input".to_owned())
        .spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else {
                    return;
                };
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                match parse_action(trimmed) {
                    Some(action) => queue.publish(action),
                    None => eprintln!("[corewake] unknown input: {trimmed}"),
                }
            }
        })
        .context("failed to spawn stdio input thread")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn tokens_parse_case_insensitively() {
        assert_eq!(parse_action("up"), Some(GameAction::MoveUp));
        assert_eq!(parse_action("Down"), Some(GameAction::MoveDown));
        assert_eq!(parse_action(" LEFT "), Some(GameAction::MoveLeft));
        assert_eq!(parse_action("right"), Some(GameAction::MoveRight));
        assert_eq!(parse_action("confirm"), Some(GameAction::Confirm));
        assert_eq!(parse_action("QUIT"), Some(GameAction::Quit));
        assert_eq!(parse_action("sideways"), None);
    }

    #[test]
    fn queue_preserves_publish_order() {
        let queue = ActionQueue::new();
        queue.publish(GameAction::MoveUp);
        queue.publish(GameAction::Confirm);
        assert_eq!(queue.poll(), Some(GameAction::MoveUp));
        assert_eq!(queue.poll(), Some(GameAction::Confirm));
        assert_eq!(queue.poll(), None);
    }

    #[test]
    fn line_reader_publishes_known_tokens_until_eof() {
        let queue = ActionQueue::new();
        let reader = Cursor::new("up\n\nnot-a-token\nquit\n");
        spawn_line_reader(reader, queue.clone())
            .expect("reader thread should spawn")
            .join()
            .expect("reader thread should finish at EOF");

        assert_eq!(queue.poll(), Some(GameAction::MoveUp));
        assert_eq!(queue.poll(), Some(GameAction::Quit));
        assert_eq!(queue.poll(), None);
    }
}
