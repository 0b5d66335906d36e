//! Per-section data carried by a parsed beatmap

use serde::{Deserialize, Serialize};

use crate::beatmap::control_points::SampleBank;

/// Settings from the `[General]` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapGeneral {
    /// Audio filename relative to the beatmap folder
    pub audio_filename: String,
    /// Milliseconds of silence before the audio starts
    pub audio_lead_in: i32,
    /// Time in milliseconds when the audio preview should start
    pub preview_time: i32,
    /// Default sample bank for hit sounds
    pub sample_bank: SampleBank,
    /// How leniently overlapping objects are stacked (0.0 - 1.0)
    pub stack_leniency: f32,
    /// Raw ruleset integer as declared by the file. Only 0 (osu!standard)
    /// is accepted; other values abort the parse.
    pub mode: i32,
}

impl Default for BeatmapGeneral {
    fn default() -> Self {
        Self {
            audio_filename: String::new(),
            audio_lead_in: 0,
            preview_time: -1,
            sample_bank: SampleBank::Normal,
            stack_leniency: 0.7,
            mode: 0,
        }
    }
}

/// Settings from the `[Metadata]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatmapMetadata {
    pub title: String,
    pub title_unicode: String,
    pub artist: String,
    pub artist_unicode: String,
    pub creator: String,
    /// Difficulty name
    pub version: String,
    pub source: String,
    pub tags: Vec<String>,
    pub beatmap_id: Option<i32>,
    pub beatmap_set_id: Option<i32>,
}

/// Settings from the `[Difficulty]` section.
///
/// Circle size is tracked twice: `difficulty_cs` feeds difficulty
/// calculation while `gameplay_cs` drives the size objects are actually
/// played at. They start out equal and diverge only through mods and
/// ruleset conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatmapDifficulty {
    /// Health drain rate
    pub hp: f32,
    /// Circle size as seen by difficulty calculation
    pub difficulty_cs: f32,
    /// Circle size as played
    pub gameplay_cs: f32,
    /// Overall difficulty
    pub od: f32,
    ar: Option<f32>,
    pub slider_multiplier: f64,
    pub slider_tick_rate: f64,
}

impl Default for BeatmapDifficulty {
    fn default() -> Self {
        Self {
            hp: 5.0,
            difficulty_cs: 5.0,
            gameplay_cs: 5.0,
            od: 5.0,
            ar: None,
            slider_multiplier: 1.0,
            slider_tick_rate: 1.0,
        }
    }
}

impl BeatmapDifficulty {
    /// Approach rate. Old format versions omit `ApproachRate`, in which
    /// case it mirrors the overall difficulty.
    pub fn ar(&self) -> f32 {
        self.ar.unwrap_or(self.od)
    }

    /// Set the approach rate
    pub fn set_ar(&mut self, value: f32) {
        self.ar = Some(value);
    }

    /// Set the circle size, keeping the difficulty and gameplay variants
    /// in sync. Used by the parser; mods adjust the variants separately.
    pub fn set_cs(&mut self, value: f32) {
        self.difficulty_cs = value;
        self.gameplay_cs = value;
    }

    /// Map a difficulty value in `0..=10` onto a concrete gameplay range.
    ///
    /// `min` is the result at difficulty 0, `mid` at 5 and `max` at 10,
    /// with linear interpolation on either side of the midpoint.
    pub fn difficulty_range(difficulty: f64, min: f64, mid: f64, max: f64) -> f64 {
        if difficulty > 5.0 {
            mid + (max - mid) * (difficulty - 5.0) / 5.0
        } else if difficulty < 5.0 {
            mid - (mid - min) * (5.0 - difficulty) / 5.0
        } else {
            mid
        }
    }

    /// Inverse of [`Self::difficulty_range`]: recover the difficulty value
    /// that produces `value` over the same range.
    pub fn inverse_difficulty_range(value: f64, min: f64, mid: f64, max: f64) -> f64 {
        if (value >= mid) == (max >= mid) {
            (value - mid) / (max - mid) * 5.0 + 5.0
        } else {
            5.0 - (mid - value) / (mid - min) * 5.0
        }
    }
}

/// Data from the `[Events]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatmapEvents {
    /// Background image filename
    pub background: Option<String>,
    /// Break periods as (start, end) times in milliseconds
    pub breaks: Vec<(f64, f64)>,
}

/// Combo colors from the `[Colours]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatmapColors {
    /// RGB combo colors in declaration order
    pub combo_colors: Vec<(u8, u8, u8)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ar_falls_back_to_od() {
        let mut difficulty = BeatmapDifficulty {
            od: 7.0,
            ..Default::default()
        };
        assert_eq!(difficulty.ar(), 7.0);

        difficulty.set_ar(9.0);
        assert_eq!(difficulty.ar(), 9.0);
    }

    #[test]
    fn test_difficulty_range_endpoints() {
        let range = |d| BeatmapDifficulty::difficulty_range(d, 1800.0, 1200.0, 450.0);
        assert_eq!(range(0.0), 1800.0);
        assert_eq!(range(5.0), 1200.0);
        assert_eq!(range(10.0), 450.0);
        // AR 9 preempt, the classic value
        assert!((range(9.0) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_inverse_difficulty_range_round_trips() {
        for d in [0.0, 2.5, 5.0, 7.0, 9.0, 10.0, 11.0] {
            let v = BeatmapDifficulty::difficulty_range(d, 1800.0, 1200.0, 450.0);
            let back = BeatmapDifficulty::inverse_difficulty_range(v, 1800.0, 1200.0, 450.0);
            assert!((back - d).abs() < 1e-9, "failed for {d}: {back}");
        }
    }
}
