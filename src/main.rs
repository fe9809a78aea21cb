use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use corewake::aberration::ChromaticAberration;
use corewake::ascii::ColorMode;
use corewake::assets;
use corewake::checksum::ChecksumPhase;
use corewake::dialogue::DialoguePhase;
use corewake::ending::EndingPhase;
use corewake::game_loop::{GameLoop, PipelineConfig};
use corewake::input::{self, ActionQueue};
use corewake::loading::LoadingPhase;
use corewake::maze::MazePhase;
use corewake::phase::Phase;
use corewake::script;
use corewake::settings::Settings;
use corewake::sink::PngStreamSink;

#[derive(Debug, Parser)]
#[command(name = "corewake", version = version_string())]
#[command(about = "Phase-driven ASCII narrative game")]
struct Cli {
    /// Force the headless PNG stream sink even when a display exists.
    #[arg(long)]
    headless: bool,

    /// Disable the chromatic aberration stage; the glyph remap stays on.
    #[arg(long = "post-processing-disabled")]
    post_processing_disabled: bool,

    /// Root directory holding the portrait assets.
    #[arg(long, value_name = "DIR", default_value = "assets")]
    assets: PathBuf,

    /// Optional JSON tuning file.
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Run a subset of the phase sequence, e.g. `--phases loading,maze`.
    #[arg(long, value_delimiter = ',', value_name = "PHASE[,PHASE...]")]
    phases: Option<Vec<PhaseKind>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PhaseKind {
    Loading,
    Intro,
    Checksum,
    Maze,
    Ending,
}

fn version_string() -> &'static str {
    let s = match option_env!("COREWAKE_GIT_HASH") {
        Some(hash) => format!("{} ({hash})", env!("CARGO_PKG_VERSION")),
        None => env!("CARGO_PKG_VERSION").to_owned(),
    };
    Box::leak(s.into_boxed_str())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.settings.as_deref())?;

    let kinds = cli.phases.clone().unwrap_or_else(|| {
        vec![
            PhaseKind::Loading,
            PhaseKind::Intro,
            PhaseKind::Checksum,
            PhaseKind::Maze,
            PhaseKind::Ending,
        ]
    });

    let (phases, failure_phase) = build_phases(&kinds, &cli.assets, &settings)?;

    let aberration = if cli.post_processing_disabled {
        None
    } else {
        Some(
            ChromaticAberration::new(
                settings.aberration_base_shift,
                settings.aberration_extra_shift,
            )
            .context("invalid aberration settings")?,
        )
    };

    let config = PipelineConfig {
        fps: settings.fps,
        cell_size: settings.cell_size,
        color_mode: if settings.keep_colors {
            ColorMode::KeepColors
        } else {
            ColorMode::Monochrome
        },
        aberration,
    };

    let queue = ActionQueue::new();
    let game_loop = GameLoop::new(phases, failure_phase, queue.clone(), config);

    let want_window = !cli.headless && display_available();

    #[cfg(feature = "windowed")]
    if want_window {
        return corewake::window::run_windowed(game_loop, queue);
    }

    #[cfg(not(feature = "windowed"))]
    if want_window {
        eprintln!("[corewake] built without the 'windowed' feature, using headless output");
    }

    run_headless(game_loop, queue)
}

fn run_headless(mut game_loop: GameLoop, queue: ActionQueue) -> Result<()> {
    input::spawn_line_reader(BufReader::new(io::stdin()), queue)?;
    let mut sink = PngStreamSink::new(BufWriter::new(io::stdout().lock()));
    game_loop.run(&mut sink)
}

fn build_phases(
    kinds: &[PhaseKind],
    assets_root: &Path,
    settings: &Settings,
) -> Result<(Vec<Phase>, Option<Phase>)> {
    let mut phases = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let phase = match kind {
            PhaseKind::Loading => Phase::Loading(LoadingPhase::new(settings.loading_seconds)),
            PhaseKind::Intro => {
                let frames = assets::load_portrait_sequence(assets_root, "intro_")?;
                Phase::Intro(DialoguePhase::new(
                    frames,
                    settings.dialogue_seconds_per_frame,
                    script::intro_dialogue(settings.dialogue_seconds_per_step),
                ))
            }
            PhaseKind::Checksum => Phase::Checksum(ChecksumPhase::new()),
            PhaseKind::Maze => Phase::Maze(MazePhase::new(settings.maze_corruption_budget)),
            PhaseKind::Ending => Phase::Ending(EndingPhase::new(settings.ending_hold_seconds)),
        };
        phases.push(phase);
    }

    // the failure ending is only reachable from the maze
    let failure_phase = if kinds.contains(&PhaseKind::Maze) {
        let frames = assets::load_portrait_sequence(assets_root, "failed_")?;
        Some(Phase::Failed(DialoguePhase::new(
            frames,
            settings.dialogue_seconds_per_frame,
            script::failure_dialogue(settings.dialogue_seconds_per_step),
        )))
    } else {
        None
    };

    Ok((phases, failure_phase))
}

fn display_available() -> bool {
    if cfg!(any(target_os = "windows", target_os = "macos")) {
        return true;
    }
    std::env::var_os("DISPLAY").is_some() || std::env::var_os("WAYLAND_DISPLAY").is_some()
}
