//! Optional JSON tuning file layered under the CLI flags. Every field
//! has a default, so a partial file only overrides what it names.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::maze::DEFAULT_CORRUPTION_BUDGET;

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Fixed simulation and presentation rate.
    pub fps: u32,
    /// Glyph cell size for the pipeline's final ASCII remap.
    pub cell_size: u32,
    /// Keep per-cell mean colors instead of white-on-black glyphs.
    pub keep_colors: bool,
    /// Aberration shift applied everywhere.
    pub aberration_base_shift: i32,
    /// Additional aberration shift reached at the frame edges.
    pub aberration_extra_shift: i32,
    /// How long the loading spinner runs.
    pub loading_seconds: f64,
    /// Reveal cadence of dialogue text.
    pub dialogue_seconds_per_step: f64,
    /// Slideshow cadence of dialogue portraits.
    pub dialogue_seconds_per_frame: f64,
    /// Hold on the ending screen after the story finishes.
    pub ending_hold_seconds: f64,
    /// Snake mutations tolerated before the maze fails.
    pub maze_corruption_budget: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps: 60,
            cell_size: 6,
            keep_colors: false,
            aberration_base_shift: 1,
            aberration_extra_shift: 2,
            loading_seconds: 5.0,
            dialogue_seconds_per_step: 1.75,
            dialogue_seconds_per_frame: 2.0,
            ending_hold_seconds: 5.0,
            maze_corruption_budget: DEFAULT_CORRUPTION_BUDGET,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let settings: Settings = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            bail!("fps must be at least 1");
        }
        if self.cell_size == 0 {
            bail!("cell_size must be at least 1");
        }
        if self.loading_seconds < 0.0
            || self.dialogue_seconds_per_step <= 0.0
            || self.dialogue_seconds_per_frame <= 0.0
            || self.ending_hold_seconds < 0.0
        {
            bail!("timing settings must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_validate() {
        Settings::default().validate().expect("defaults are valid");
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("settings.json");
        let mut file = fs::File::create(&path).expect("settings file should create");
        write!(file, "{{ \"fps\": 30, \"cell_size\": 4 }}").expect("settings should write");

        let settings = Settings::load(&path).expect("settings should load");
        assert_eq!(settings.fps, 30);
        assert_eq!(settings.cell_size, 4);
        assert_eq!(settings.loading_seconds, Settings::default().loading_seconds);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ \"frames_per_second\": 30 }").expect("settings should write");
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn zero_fps_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir should create");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ \"fps\": 0 }").expect("settings should write");
        assert!(Settings::load(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Settings::load(Path::new("/nonexistent/settings.json")).is_err());
    }

    #[test]
    fn no_file_falls_back_to_defaults() {
        let settings = Settings::load_or_default(None).expect("defaults should load");
        assert_eq!(settings.fps, 60);
    }
}
