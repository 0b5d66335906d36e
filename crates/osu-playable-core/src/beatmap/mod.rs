//! Beatmap data structures and types

pub mod control_points;
pub mod hit_object;
mod sections;

pub use control_points::{
    BeatmapControlPoints, DifficultyControlPoint, SampleBank, SampleControlPoint,
    TimingControlPoint,
};
pub use hit_object::{HitObject, HitObjectKind, Position, Slider};
pub use sections::*;

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// A gameplay ruleset.
///
/// Beatmap files only ever declare [`GameMode::Standard`]; the touchscreen
/// ruleset is derived from it by conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// The baseline mouse/keyboard ruleset (`Mode: 0` in beatmap files)
    #[default]
    Standard,
    /// The touchscreen ruleset, derived from standard maps
    Touch,
}

impl GameMode {
    /// The other ruleset
    pub fn other(self) -> Self {
        match self {
            Self::Standard => Self::Touch,
            Self::Touch => Self::Standard,
        }
    }
}

/// A parsed beatmap.
///
/// Produced by the parser, transformed by the ruleset conversion and mod
/// pipeline. Instances handed out by the cache are shared; treat them as
/// read-only.
#[derive(Debug, Serialize, Deserialize)]
pub struct Beatmap {
    /// The ruleset this beatmap was parsed or converted for
    pub mode: GameMode,
    /// Version from the `osu file format v<n>` header
    pub format_version: i32,
    pub general: BeatmapGeneral,
    pub metadata: BeatmapMetadata,
    pub difficulty: BeatmapDifficulty,
    pub events: BeatmapEvents,
    pub colors: BeatmapColors,
    pub control_points: BeatmapControlPoints,
    /// Hit objects ordered by start time; empty when the map was parsed
    /// without hit objects
    pub hit_objects: Vec<HitObject>,
    /// Path of the source file
    pub file_path: PathBuf,
    /// MD5 hex digest of the source file's bytes; the map's identity
    pub md5: String,

    #[serde(skip)]
    max_combo: OnceLock<usize>,
}

impl Beatmap {
    /// Create an empty beatmap tagged with the given ruleset
    pub fn new(mode: GameMode) -> Self {
        Self {
            mode,
            format_version: 14,
            general: BeatmapGeneral::default(),
            metadata: BeatmapMetadata::default(),
            difficulty: BeatmapDifficulty::default(),
            events: BeatmapEvents::default(),
            colors: BeatmapColors::default(),
            control_points: BeatmapControlPoints::default(),
            hit_objects: Vec::new(),
            file_path: PathBuf::new(),
            md5: String::new(),
            max_combo: OnceLock::new(),
        }
    }

    /// Maximum achievable combo. Sliders award one combo per nested
    /// object, everything else awards one.
    ///
    /// Computed on first access and memoized; valid because the hit object
    /// list never changes once the owning pipeline has completed.
    pub fn max_combo(&self) -> usize {
        *self
            .max_combo
            .get_or_init(|| self.hit_objects.iter().map(HitObject::combo_length).sum())
    }
}

impl Clone for Beatmap {
    fn clone(&self) -> Self {
        Self {
            mode: self.mode,
            format_version: self.format_version,
            general: self.general.clone(),
            metadata: self.metadata.clone(),
            difficulty: self.difficulty.clone(),
            events: self.events.clone(),
            colors: self.colors.clone(),
            control_points: self.control_points.clone(),
            hit_objects: self.hit_objects.clone(),
            file_path: self.file_path.clone(),
            md5: self.md5.clone(),
            // The clone is cloned to be mutated; never carry the memo over.
            max_combo: OnceLock::new(),
        }
    }
}
