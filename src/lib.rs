//! corewake: a phase-driven narrative/puzzle game whose entire
//! presentation flows through one pixel pipeline (raster frame, optional
//! chromatic aberration, luminance-to-glyph ASCII remap) into a
//! pluggable sink: a window, or a headless PNG stream.

pub mod aberration;
pub mod ascii;
pub mod assets;
pub mod checksum;
pub mod compositor;
pub mod dialogue;
pub mod ending;
pub mod frame;
pub mod game_loop;
pub mod glyph_atlas;
pub mod glyph_atlas_data;
pub mod input;
pub mod loading;
pub mod maze;
pub mod pacer;
pub mod phase;
pub mod rng;
pub mod script;
pub mod settings;
pub mod sink;
pub mod text;
#[cfg(feature = "windowed")]
pub mod window;
