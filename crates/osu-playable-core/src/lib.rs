//! # osu-playable-core
//!
//! Core library for turning `.osu` beatmap files into playable,
//! ruleset-specific beatmaps and serving them from a concurrent cache.
//!
//! This crate provides the foundational functionality for:
//! - Parsing `.osu` beatmap files with per-line error recovery
//! - Computing per-object gameplay defaults (pre-empt, fade-in, samples)
//! - Converting beatmaps between the standard and touch rulesets
//! - Composing gameplay mods with incompatibility validation and
//!   multiplicative score effects
//! - Caching parsed beatmaps per ruleset behind a thread-safe LRU
//!
//! ## Modules
//!
//! - [`beatmap`] - Beatmap data structures (sections, difficulty, hit objects)
//! - [`cache`] - Thread-safe dual-region beatmap cache
//! - [`cancel`] - Cooperative cancellation token
//! - [`convert`] - Ruleset conversion and the playable-map pipeline
//! - [`error`] - Error types and Result alias
//! - [`mods`] - Gameplay modifiers and mod-set composition
//! - [`parser`] - `.osu` file parsing
//!
//! ## Example
//!
//! ```no_run
//! use osu_playable_core::{BeatmapCache, GameMode};
//! use std::path::Path;
//!
//! let cache = BeatmapCache::new();
//! let beatmap = cache
//!     .get_from_file(Path::new("map.osu"), true, GameMode::Standard, None)
//!     .expect("Failed to load beatmap");
//! println!("{} - {}", beatmap.metadata.artist, beatmap.metadata.title);
//! ```

// Module declarations
pub mod beatmap;
pub mod cache;
pub mod cancel;
pub mod convert;
pub mod error;
pub mod mods;
pub mod parser;
pub mod utils;

// Re-export key types for convenience

// Error types
pub use error::{Error, ParseLineError, Result};

// Cancellation
pub use cancel::CancellationToken;

// Beatmap types
pub use beatmap::{
    Beatmap, BeatmapColors, BeatmapControlPoints, BeatmapDifficulty, BeatmapEvents,
    BeatmapGeneral, BeatmapMetadata, GameMode, HitObject, HitObjectKind, Position, SampleBank,
    Slider,
};

// Parsing
pub use parser::BeatmapParser;

// Conversion pipeline
pub use convert::{BeatmapConverter, BeatmapProcessor};

// Mods
pub use mods::{Mod, ModDifficultyAdjust, ModKind, ModSet};

// Cache
pub use cache::{BeatmapCache, BeatmapRecord, BeatmapSetRecord};
