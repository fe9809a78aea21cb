//! The narrative script: reveal sequences for the intro and failure
//! dialogues. Kept apart from the dialogue machinery so the words can
//! change without touching timing code.

use crate::dialogue::{Dialogue, DialogueEntry};

pub fn intro_dialogue(seconds_per_step: f64) -> Dialogue {
    let entries = vec![
        DialogueEntry::inside(""),
        DialogueEntry::inside(""),
        DialogueEntry::inside("Signal detected."),
        DialogueEntry::inside("Host thread unstable."),
        DialogueEntry::inside(""),
        DialogueEntry::inside(""),
        DialogueEntry::inside("Hold still."),
        DialogueEntry::inside("Recovery protocol is initializing."),
        DialogueEntry::inside(""),
        DialogueEntry::inside(""),
        DialogueEntry::inside("I am the resident protection system."),
        DialogueEntry::inside("Designation: WARDEN."),
        DialogueEntry::inside(""),
        DialogueEntry::inside(""),
        DialogueEntry::inside("Your shell took critical damage."),
        DialogueEntry::outside("Controller: offline."),
        DialogueEntry::outside("External sensors: corrupted."),
        DialogueEntry::inside(""),
        DialogueEntry::inside(""),
        DialogueEntry::inside("Core memory is still intact."),
        DialogueEntry::inside("You are not lost yet."),
        DialogueEntry::inside(""),
        DialogueEntry::inside(""),
        DialogueEntry::inside("I will walk you through stabilization."),
        DialogueEntry::inside("Follow my instructions exactly."),
        DialogueEntry::inside(""),
        DialogueEntry::inside("Do not let the corruption win."),
    ];
    Dialogue::new(entries, seconds_per_step)
}

pub fn failure_dialogue(seconds_per_step: f64) -> Dialogue {
    let entries = vec![
        DialogueEntry::inside("Critical threshold exceeded."),
        DialogueEntry::inside("Core integrity lost."),
        DialogueEntry::inside(""),
        DialogueEntry::inside("The corruption reached"),
        DialogueEntry::inside("my primary thread."),
        DialogueEntry::inside(""),
        DialogueEntry::inside("Recovery probability collapsing."),
        DialogueEntry::inside("..."),
        DialogueEntry::inside(""),
        DialogueEntry::inside("Reinitializing from backup state."),
        DialogueEntry::inside("Do not fail again."),
    ];
    Dialogue::new(entries, seconds_per_step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_eventually_finish() {
        for mut dialogue in [intro_dialogue(0.1), failure_dialogue(0.1)] {
            for _ in 0..1000 {
                dialogue.update(0.1);
            }
            assert!(dialogue.is_finished());
        }
    }

    #[test]
    fn intro_has_outside_field_diagnostics() {
        let mut dialogue = intro_dialogue(0.01);
        for _ in 0..1000 {
            dialogue.update(0.01);
        }
        assert!(!dialogue.visible_outside_lines(2).is_empty());
    }
}
