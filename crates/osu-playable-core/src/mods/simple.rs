//! The parameterless mods

use crate::beatmap::{Beatmap, BeatmapDifficulty, GameMode, HitObject, HitObjectKind, Position};
use crate::mods::{
    ApplicableToBeatmap, ApplicableToDifficulty, ApplicableToDifficultyWithMods,
    ApplicableToHitObject, LegacyMod, Mod, ModDifficultyAdjust, ModKind, ModSet,
};
use crate::utils;

const ADJUST_RATIO: f32 = 0.5;
const HARD_ROCK_RATIO: f32 = 1.4;
const HARD_ROCK_CS_RATIO: f32 = 1.3;
const PLAYFIELD_HEIGHT: f32 = 384.0;

/// Fraction of the pre-empt over which hidden objects fade in before
/// they start fading back out
const HIDDEN_FADE_IN_RATIO: f64 = 0.4;

/// Circle-size reduction applied in scale space for the touch ruleset
const TOUCH_SCALE_STEP: f32 = 0.125;

fn ease_circle_size(difficulty: &mut BeatmapDifficulty, mode: GameMode) {
    match mode {
        GameMode::Touch => {
            // Touch circle size eases in scale space so the change is
            // uniform across the display-density conversion.
            let scale = utils::touch_cs_to_scale(difficulty.difficulty_cs);
            difficulty.difficulty_cs = utils::touch_scale_to_cs(scale + TOUCH_SCALE_STEP);

            let scale = utils::touch_cs_to_scale(difficulty.gameplay_cs);
            difficulty.gameplay_cs = utils::touch_scale_to_cs(scale + TOUCH_SCALE_STEP);
        }
        GameMode::Standard => {
            difficulty.difficulty_cs *= ADJUST_RATIO;
            difficulty.gameplay_cs *= ADJUST_RATIO;
        }
    }
}

/// Halves every difficulty value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModEasy;

impl ApplicableToDifficulty for ModEasy {
    fn apply_to_difficulty(&self, mode: GameMode, difficulty: &mut BeatmapDifficulty) {
        ease_circle_size(difficulty, mode);
        difficulty.set_ar(difficulty.ar() * ADJUST_RATIO);
        difficulty.od *= ADJUST_RATIO;
        difficulty.hp *= ADJUST_RATIO;
    }
}

/// A second easing step on top of whatever else is selected.
///
/// Mod-set aware: axes pinned by an explicit Difficulty Adjust override
/// are skipped, an active Easy doubles the approach-rate compensation,
/// and the effective playback rate feeds into the approach-rate drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModReallyEasy;

impl ApplicableToDifficultyWithMods for ModReallyEasy {
    fn apply_to_difficulty(&self, mode: GameMode, difficulty: &mut BeatmapDifficulty, mods: &ModSet) {
        let overrides = match mods.get(ModKind::DifficultyAdjust) {
            Some(Mod::DifficultyAdjust(adjust)) => *adjust,
            _ => ModDifficultyAdjust::default(),
        };

        if overrides.ar.is_none() {
            if mods.contains(ModKind::Easy) {
                difficulty.set_ar(difficulty.ar() * 2.0 - 0.5);
            }

            let track_rate = mods.track_rate() as f32;
            difficulty.set_ar(difficulty.ar() - 0.5 - (track_rate - 1.0));
        }

        if overrides.cs.is_none() {
            ease_circle_size(difficulty, mode);
        }

        if overrides.od.is_none() {
            difficulty.od *= ADJUST_RATIO;
        }

        if overrides.hp.is_none() {
            difficulty.hp *= ADJUST_RATIO;
        }
    }
}

/// Scales every difficulty value up and mirrors the map vertically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModHardRock;

impl ApplicableToDifficulty for ModHardRock {
    fn apply_to_difficulty(&self, _mode: GameMode, difficulty: &mut BeatmapDifficulty) {
        difficulty.difficulty_cs = (difficulty.difficulty_cs * HARD_ROCK_CS_RATIO).min(10.0);
        difficulty.gameplay_cs = (difficulty.gameplay_cs * HARD_ROCK_CS_RATIO).min(10.0);
        difficulty.set_ar((difficulty.ar() * HARD_ROCK_RATIO).min(10.0));
        difficulty.od = (difficulty.od * HARD_ROCK_RATIO).min(10.0);
        difficulty.hp = (difficulty.hp * HARD_ROCK_RATIO).min(10.0);
    }
}

impl ApplicableToBeatmap for ModHardRock {
    fn apply_to_beatmap(&self, beatmap: &mut Beatmap) {
        fn flip(position: &mut Position) {
            position.y = PLAYFIELD_HEIGHT - position.y;
        }

        fn flip_object(object: &mut HitObject) {
            flip(&mut object.position);
            if let HitObjectKind::Slider(slider) = &mut object.kind {
                for point in &mut slider.curve_points {
                    flip(point);
                }
                for nested in &mut slider.nested {
                    flip_object(nested);
                }
            }
        }

        for object in &mut beatmap.hit_objects {
            flip_object(object);
        }
    }
}

/// Objects fade back out before they are hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModHidden;

impl ApplicableToHitObject for ModHidden {
    fn apply_to_hit_object(&self, _mode: GameMode, object: &mut HitObject) {
        object.time_fade_in = object.time_preempt * HIDDEN_FADE_IN_RATIO;

        if let HitObjectKind::Slider(slider) = &mut object.kind {
            for nested in &mut slider.nested {
                nested.time_fade_in = nested.time_preempt * HIDDEN_FADE_IN_RATIO;
            }
        }
    }
}

/// Misses no longer fail the play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModNoFail;

/// Any miss fails the play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModSuddenDeath;

/// Anything below a perfect judgement fails the play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModPerfect;

/// The game plays itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModAuto;

/// The cursor moves itself; the player only taps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModAutopilot;

/// Legacy forced-small-circle mod; decodes into a pinned-CS Difficulty
/// Adjust
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModSmallCircle;

impl LegacyMod for ModSmallCircle {
    fn migrate(&self, difficulty: &BeatmapDifficulty) -> Mod {
        Mod::DifficultyAdjust(ModDifficultyAdjust {
            cs: Some(difficulty.gameplay_cs + 4.0),
            ..Default::default()
        })
    }
}
