//! Ruleset conversion and the playable-map pipeline

mod processor;

pub use processor::BeatmapProcessor;

use std::sync::Arc;

use crate::beatmap::{Beatmap, GameMode};
use crate::cancel::{self, CancellationToken};
use crate::error::Result;
use crate::mods::ModSet;
use crate::utils;

/// Converts a beatmap's structure from its native ruleset to another.
///
/// Conversion is purely structural: no mods are involved, and derived
/// hit object state is reset so the pipeline recomputes it against the
/// target ruleset.
pub struct BeatmapConverter<'a> {
    token: Option<&'a CancellationToken>,
}

impl<'a> BeatmapConverter<'a> {
    pub fn new(token: Option<&'a CancellationToken>) -> Self {
        Self { token }
    }

    /// Produce a copy of `beatmap` in the target ruleset's native shape
    pub fn convert(&self, beatmap: &Beatmap, target: GameMode) -> Result<Beatmap> {
        cancel::checkpoint(self.token)?;

        let mut converted = beatmap.clone();

        if beatmap.mode != target {
            converted.mode = target;
            converted.difficulty.difficulty_cs =
                convert_cs(beatmap.difficulty.difficulty_cs, beatmap.mode, target);
            converted.difficulty.gameplay_cs =
                convert_cs(beatmap.difficulty.gameplay_cs, beatmap.mode, target);
        }

        for object in &mut converted.hit_objects {
            cancel::checkpoint(self.token)?;
            object.stack_height = 0;
        }

        Ok(converted)
    }
}

/// Translate a circle size between rulesets, preserving the perceived
/// object scale across their display conventions.
fn convert_cs(cs: f32, from: GameMode, to: GameMode) -> f32 {
    let scale = match from {
        GameMode::Standard => utils::standard_cs_to_scale(cs),
        GameMode::Touch => utils::touch_cs_to_scale(cs),
    };
    match to {
        GameMode::Standard => utils::standard_scale_to_cs(scale),
        GameMode::Touch => utils::touch_scale_to_cs(scale),
    }
}

impl Beatmap {
    /// Construct a playable beatmap for the target ruleset under the
    /// given mods.
    ///
    /// When the target matches this map's ruleset and no mods are
    /// requested, this is a zero-copy identity: the returned handle is
    /// the input handle. Every returned map must be treated as
    /// read-only.
    ///
    /// Phases run in fixed order, each checked against cancellation:
    /// structural conversion, difficulty mods (plain then mod-aware),
    /// pre-processing, per-object defaulting against the post-mod
    /// difficulty, hit object mods (plain then mod-aware),
    /// post-processing, and finally whole-map mods.
    pub fn create_playable(
        self: Arc<Self>,
        mode: GameMode,
        mods: &ModSet,
        token: Option<&CancellationToken>,
    ) -> Result<Arc<Beatmap>> {
        if self.mode == mode && mods.is_empty() {
            // Already playable as is.
            return Ok(self);
        }

        tracing::debug!(
            "Building playable map {} for {:?} with {} mod(s)",
            self.md5,
            mode,
            mods.len()
        );

        let converter = BeatmapConverter::new(token);
        let mut converted = converter.convert(&self, mode)?;

        for m in mods.iter() {
            if let Some(difficulty_mod) = m.as_applicable_to_difficulty() {
                cancel::checkpoint(token)?;
                difficulty_mod.apply_to_difficulty(mode, &mut converted.difficulty);
            }
        }

        for m in mods.iter() {
            if let Some(difficulty_mod) = m.as_applicable_to_difficulty_with_mods() {
                cancel::checkpoint(token)?;
                difficulty_mod.apply_to_difficulty(mode, &mut converted.difficulty, mods);
            }
        }

        let processor = BeatmapProcessor::new(token);
        processor.pre_process(&mut converted)?;

        // Defaults must see the post-mod difficulty: mods above may have
        // redefined the values (approach rate in particular) that drive
        // pre-empt and fade-in.
        {
            let control_points = &converted.control_points;
            let difficulty = &converted.difficulty;

            for object in converted.hit_objects.iter_mut() {
                cancel::checkpoint(token)?;
                object.apply_defaults(control_points, difficulty, mode, token)?;
            }
        }

        for m in mods.iter() {
            if let Some(object_mod) = m.as_applicable_to_hit_object() {
                for object in &mut converted.hit_objects {
                    cancel::checkpoint(token)?;
                    object_mod.apply_to_hit_object(mode, object);
                }
            }
        }

        for m in mods.iter() {
            if let Some(object_mod) = m.as_applicable_to_hit_object_with_mods() {
                for object in &mut converted.hit_objects {
                    cancel::checkpoint(token)?;
                    object_mod.apply_to_hit_object(mode, object, mods);
                }
            }
        }

        processor.post_process(&mut converted)?;

        for m in mods.iter() {
            if let Some(beatmap_mod) = m.as_applicable_to_beatmap() {
                cancel::checkpoint(token)?;
                beatmap_mod.apply_to_beatmap(&mut converted);
            }
        }

        Ok(Arc::new(converted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beatmap::{HitObject, HitObjectKind, Position, TimingControlPoint};
    use crate::error::Error;
    use crate::mods::{Mod, ModEasy, ModHardRock, ModHidden};

    fn test_beatmap() -> Arc<Beatmap> {
        let mut beatmap = Beatmap::new(GameMode::Standard);
        beatmap.md5 = "test".to_string();
        beatmap.difficulty.set_ar(9.0);
        beatmap.difficulty.set_cs(4.0);
        beatmap
            .control_points
            .timing_points
            .push(TimingControlPoint {
                time: 0.0,
                beat_length: 500.0,
            });
        beatmap.hit_objects.push(HitObject::new(
            Position::new(100.0, 100.0),
            1000.0,
            true,
            0,
            HitObjectKind::Circle,
        ));
        Arc::new(beatmap)
    }

    #[test]
    fn test_identity_fast_path_aliases_input() {
        let beatmap = test_beatmap();
        let playable = Arc::clone(&beatmap)
            .create_playable(GameMode::Standard, &ModSet::default(), None)
            .unwrap();
        assert!(Arc::ptr_eq(&beatmap, &playable));
    }

    #[test]
    fn test_ruleset_change_produces_new_instance() {
        let beatmap = test_beatmap();
        let playable = Arc::clone(&beatmap)
            .create_playable(GameMode::Touch, &ModSet::default(), None)
            .unwrap();
        assert!(!Arc::ptr_eq(&beatmap, &playable));
        assert_eq!(playable.mode, GameMode::Touch);
        // Same perceived scale, different numeric circle size
        assert_ne!(playable.difficulty.gameplay_cs, beatmap.difficulty.gameplay_cs);
    }

    #[test]
    fn test_difficulty_mods_run_before_defaulting() {
        let beatmap = test_beatmap();
        let mods = ModSet::new([Mod::Easy(ModEasy)]).unwrap();
        let playable = Arc::clone(&beatmap)
            .create_playable(GameMode::Standard, &mods, None)
            .unwrap();

        // Easy halves AR 9 to 4.5; defaulting must compute the pre-empt
        // from the halved value, not the original.
        assert_eq!(playable.difficulty.ar(), 4.5);
        let expected = crate::beatmap::BeatmapDifficulty::difficulty_range(
            4.5,
            crate::beatmap::hit_object::PREEMPT_MAX,
            crate::beatmap::hit_object::PREEMPT_MID,
            crate::beatmap::hit_object::PREEMPT_MIN,
        );
        assert!((playable.hit_objects[0].time_preempt - expected).abs() < 1e-9);
    }

    #[test]
    fn test_hit_object_mods_run_after_defaulting() {
        let beatmap = test_beatmap();
        let mods = ModSet::new([Mod::Hidden(ModHidden)]).unwrap();
        let playable = Arc::clone(&beatmap)
            .create_playable(GameMode::Standard, &mods, None)
            .unwrap();

        let object = &playable.hit_objects[0];
        assert!((object.time_fade_in - object.time_preempt * 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_whole_map_mods_run_last() {
        let beatmap = test_beatmap();
        let mods = ModSet::new([Mod::HardRock(ModHardRock)]).unwrap();
        let playable = Arc::clone(&beatmap)
            .create_playable(GameMode::Standard, &mods, None)
            .unwrap();
        assert_eq!(playable.hit_objects[0].position.y, 284.0);
    }

    #[test]
    fn test_source_is_not_mutated() {
        let beatmap = test_beatmap();
        let mods = ModSet::new([Mod::Easy(ModEasy)]).unwrap();
        let _playable = Arc::clone(&beatmap)
            .create_playable(GameMode::Standard, &mods, None)
            .unwrap();
        assert_eq!(beatmap.difficulty.ar(), 9.0);
        assert_eq!(beatmap.hit_objects[0].position.y, 100.0);
    }

    #[test]
    fn test_cancellation_aborts_pipeline() {
        let token = CancellationToken::new();
        token.cancel();

        let beatmap = test_beatmap();
        let result = Arc::clone(&beatmap).create_playable(GameMode::Touch, &ModSet::default(), Some(&token));
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[test]
    fn test_cs_conversion_round_trips() {
        let cs = 4.0;
        let touch = convert_cs(cs, GameMode::Standard, GameMode::Touch);
        let back = convert_cs(touch, GameMode::Touch, GameMode::Standard);
        assert!((back - cs).abs() < 1e-4);
    }
}
