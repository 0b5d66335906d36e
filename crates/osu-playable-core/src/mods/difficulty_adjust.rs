//! The Difficulty Adjust mod: forced difficulty statistics

use crate::beatmap::hit_object::{PREEMPT_MAX, PREEMPT_MID, PREEMPT_MIN};
use crate::beatmap::{BeatmapDifficulty, GameMode, HitObject, HitObjectKind};
use crate::mods::{ApplicableToDifficultyWithMods, ApplicableToHitObjectWithMods, ModSet};

/// Container for explicitly forced difficulty values.
///
/// Every axis left `None` is untouched here and remains available to
/// relative adjustments; a set axis is pinned and wins over any relative
/// adjustment targeting it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ModDifficultyAdjust {
    /// The circle size to enforce
    pub cs: Option<f32>,
    /// The approach rate to enforce
    pub ar: Option<f32>,
    /// The overall difficulty to enforce
    pub od: Option<f32>,
    /// The health drain rate to enforce
    pub hp: Option<f32>,
}

impl ModDifficultyAdjust {
    /// Whether any axis is actually forced
    pub fn is_relevant(&self) -> bool {
        self.cs.is_some() || self.ar.is_some() || self.od.is_some() || self.hp.is_some()
    }

    /// Score multiplier for the forced deltas.
    ///
    /// Raising a value above the map's is rewarded along a shallow power
    /// curve; lowering it is penalized along a bounded exponential decay.
    /// The asymmetry prevents farming the aggregate multiplier by pairing
    /// small negative and positive deltas across axes.
    pub(crate) fn score_multiplier(&self, difficulty: &BeatmapDifficulty) -> f32 {
        let mut multiplier = 1.0f32;

        if let Some(cs) = self.cs {
            let diff = cs - difficulty.difficulty_cs;
            multiplier *= if diff >= 0.0 {
                1.0 + 0.0075 * diff.powf(1.5)
            } else {
                2.0 / (1.0 + (-0.5 * diff).exp())
            };
        }

        if let Some(od) = self.od {
            let diff = od - difficulty.od;
            multiplier *= if diff >= 0.0 {
                1.0 + 0.005 * diff.powf(1.3)
            } else {
                2.0 / (1.0 + (-0.25 * diff).exp())
            };
        }

        multiplier
    }

    fn apply_fade_adjustment(object: &mut HitObject, mods: &ModSet) {
        let initial_rate = mods.track_rate();
        let current_rate = mods.track_rate_at(object.start_time);

        // Cancel the uniform rate baked into the pre-empt during the
        // difficulty phase and re-apply the rate in effect at this
        // object's timestamp.
        object.time_preempt *= current_rate / initial_rate;
        object.time_fade_in *= current_rate;
    }
}

impl ApplicableToDifficultyWithMods for ModDifficultyAdjust {
    fn apply_to_difficulty(&self, _mode: GameMode, difficulty: &mut BeatmapDifficulty, mods: &ModSet) {
        if let Some(cs) = self.cs {
            difficulty.difficulty_cs = cs;
            difficulty.gameplay_cs = cs;
        }
        if let Some(od) = self.od {
            difficulty.od = od;
        }
        if let Some(hp) = self.hp {
            difficulty.hp = hp;
        }

        // Forced AR is kept constant with respect to game time: the
        // written-back value compensates for the active playback rate so
        // the player perceives the requested AR at any speed.
        if let Some(ar) = self.ar {
            let preempt =
                BeatmapDifficulty::difficulty_range(ar as f64, PREEMPT_MAX, PREEMPT_MID, PREEMPT_MIN);
            let track_rate = mods.track_rate();

            difficulty.set_ar(BeatmapDifficulty::inverse_difficulty_range(
                preempt * track_rate,
                PREEMPT_MAX,
                PREEMPT_MID,
                PREEMPT_MIN,
            ) as f32);
        }
    }
}

impl ApplicableToHitObjectWithMods for ModDifficultyAdjust {
    fn apply_to_hit_object(&self, _mode: GameMode, object: &mut HitObject, mods: &ModSet) {
        // Only forced AR needs per-object correction: a time-varying rate
        // cannot be cancelled by the single uniform adjustment made in
        // the difficulty phase.
        if self.ar.is_none() {
            return;
        }

        Self::apply_fade_adjustment(object, mods);

        if let HitObjectKind::Slider(slider) = &mut object.kind {
            for nested in &mut slider.nested {
                Self::apply_fade_adjustment(nested, mods);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_values_override_difficulty() {
        let adjust = ModDifficultyAdjust {
            cs: Some(2.0),
            od: Some(9.5),
            ..Default::default()
        };
        let mut difficulty = BeatmapDifficulty::default();
        adjust.apply_to_difficulty(GameMode::Standard, &mut difficulty, &ModSet::default());

        assert_eq!(difficulty.difficulty_cs, 2.0);
        assert_eq!(difficulty.gameplay_cs, 2.0);
        assert_eq!(difficulty.od, 9.5);
        // Unset axes untouched
        assert_eq!(difficulty.hp, 5.0);
    }

    #[test]
    fn test_forced_ar_round_trips_without_rate_mods() {
        let adjust = ModDifficultyAdjust {
            ar: Some(9.0),
            ..Default::default()
        };
        let mut difficulty = BeatmapDifficulty::default();
        adjust.apply_to_difficulty(GameMode::Standard, &mut difficulty, &ModSet::default());
        assert!((difficulty.ar() - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_multiplier_asymmetry() {
        let difficulty = BeatmapDifficulty::default();

        let raise = ModDifficultyAdjust {
            cs: Some(7.0),
            ..Default::default()
        };
        let lower = ModDifficultyAdjust {
            cs: Some(3.0),
            ..Default::default()
        };

        let up = raise.score_multiplier(&difficulty);
        let down = lower.score_multiplier(&difficulty);
        assert!(up > 1.0);
        assert!(down < 1.0);
        assert!((1.0 - down) > (up - 1.0));
    }

    #[test]
    fn test_no_axes_is_irrelevant() {
        let adjust = ModDifficultyAdjust::default();
        assert!(!adjust.is_relevant());
        assert_eq!(adjust.score_multiplier(&BeatmapDifficulty::default()), 1.0);
    }
}
