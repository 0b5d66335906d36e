//! Gameplay modifiers and their composition rules.
//!
//! A mod is a value identified by its kind; equality is by value, never by
//! identity. Each mod implements some subset of the capability traits
//! below, and the pipeline queries for a capability instead of matching on
//! concrete kinds. Validation and aggregate effects live in [`ModSet`].

mod difficulty_adjust;
mod rate_adjust;
mod set;
mod simple;

pub use difficulty_adjust::ModDifficultyAdjust;
pub use rate_adjust::{ModCustomSpeed, ModDoubleTime, ModHalfTime, ModNightCore, RateAdjust};
pub use set::ModSet;
pub use simple::{
    ModAuto, ModAutopilot, ModEasy, ModHardRock, ModHidden, ModNoFail, ModPerfect,
    ModReallyEasy, ModSmallCircle, ModSuddenDeath,
};

use std::fmt;

use crate::beatmap::{Beatmap, BeatmapDifficulty, GameMode, HitObject};

/// Applied during the difficulty phase, before hit object defaulting
pub trait ApplicableToDifficulty {
    fn apply_to_difficulty(&self, mode: GameMode, difficulty: &mut BeatmapDifficulty);
}

/// Difficulty-phase application that needs to inspect sibling mods
pub trait ApplicableToDifficultyWithMods {
    fn apply_to_difficulty(&self, mode: GameMode, difficulty: &mut BeatmapDifficulty, mods: &ModSet);
}

/// Applied to every hit object after defaulting
pub trait ApplicableToHitObject {
    fn apply_to_hit_object(&self, mode: GameMode, object: &mut HitObject);
}

/// Hit-object application that needs to inspect sibling mods
pub trait ApplicableToHitObjectWithMods {
    fn apply_to_hit_object(&self, mode: GameMode, object: &mut HitObject, mods: &ModSet);
}

/// Applied once to the fully assembled map, after every other phase
pub trait ApplicableToBeatmap {
    fn apply_to_beatmap(&self, beatmap: &mut Beatmap);
}

/// A legacy mod that decodes into a modern equivalent
pub trait LegacyMod {
    /// One-shot translation, given the difficulty of the map the legacy
    /// mod was selected for.
    fn migrate(&self, difficulty: &BeatmapDifficulty) -> Mod;
}

/// The kind tag of a [`Mod`]; two mods of the same kind never coexist in
/// a [`ModSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModKind {
    Easy,
    ReallyEasy,
    HardRock,
    Hidden,
    NoFail,
    SuddenDeath,
    Perfect,
    Auto,
    Autopilot,
    CustomSpeed,
    DoubleTime,
    NightCore,
    HalfTime,
    DifficultyAdjust,
    SmallCircle,
}

impl fmt::Display for ModKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Easy => "Easy",
            Self::ReallyEasy => "Really Easy",
            Self::HardRock => "Hard Rock",
            Self::Hidden => "Hidden",
            Self::NoFail => "No Fail",
            Self::SuddenDeath => "Sudden Death",
            Self::Perfect => "Perfect",
            Self::Auto => "Auto",
            Self::Autopilot => "Autopilot",
            Self::CustomSpeed => "Custom Speed",
            Self::DoubleTime => "Double Time",
            Self::NightCore => "Night Core",
            Self::HalfTime => "Half Time",
            Self::DifficultyAdjust => "Difficulty Adjust",
            Self::SmallCircle => "Small Circle",
        })
    }
}

/// A single gameplay modifier
#[derive(Debug, Clone, PartialEq)]
pub enum Mod {
    Easy(ModEasy),
    ReallyEasy(ModReallyEasy),
    HardRock(ModHardRock),
    Hidden(ModHidden),
    NoFail(ModNoFail),
    SuddenDeath(ModSuddenDeath),
    Perfect(ModPerfect),
    Auto(ModAuto),
    Autopilot(ModAutopilot),
    CustomSpeed(ModCustomSpeed),
    DoubleTime(ModDoubleTime),
    NightCore(ModNightCore),
    HalfTime(ModHalfTime),
    DifficultyAdjust(ModDifficultyAdjust),
    SmallCircle(ModSmallCircle),
}

impl Mod {
    /// The kind tag of this mod
    pub fn kind(&self) -> ModKind {
        match self {
            Self::Easy(_) => ModKind::Easy,
            Self::ReallyEasy(_) => ModKind::ReallyEasy,
            Self::HardRock(_) => ModKind::HardRock,
            Self::Hidden(_) => ModKind::Hidden,
            Self::NoFail(_) => ModKind::NoFail,
            Self::SuddenDeath(_) => ModKind::SuddenDeath,
            Self::Perfect(_) => ModKind::Perfect,
            Self::Auto(_) => ModKind::Auto,
            Self::Autopilot(_) => ModKind::Autopilot,
            Self::CustomSpeed(_) => ModKind::CustomSpeed,
            Self::DoubleTime(_) => ModKind::DoubleTime,
            Self::NightCore(_) => ModKind::NightCore,
            Self::HalfTime(_) => ModKind::HalfTime,
            Self::DifficultyAdjust(_) => ModKind::DifficultyAdjust,
            Self::SmallCircle(_) => ModKind::SmallCircle,
        }
    }

    /// Short display acronym
    pub fn acronym(&self) -> &'static str {
        match self.kind() {
            ModKind::Easy => "EZ",
            ModKind::ReallyEasy => "RE",
            ModKind::HardRock => "HR",
            ModKind::Hidden => "HD",
            ModKind::NoFail => "NF",
            ModKind::SuddenDeath => "SD",
            ModKind::Perfect => "PF",
            ModKind::Auto => "AT",
            ModKind::Autopilot => "AP",
            ModKind::CustomSpeed => "CS",
            ModKind::DoubleTime => "DT",
            ModKind::NightCore => "NC",
            ModKind::HalfTime => "HT",
            ModKind::DifficultyAdjust => "DA",
            ModKind::SmallCircle => "SC",
        }
    }

    /// Single character used by the compact legacy mod-set encoding.
    /// Modern-only mods have none and are dropped by that encoding.
    pub fn encode_char(&self) -> Option<char> {
        match self.kind() {
            ModKind::Easy => Some('e'),
            ModKind::ReallyEasy => Some('l'),
            ModKind::HardRock => Some('r'),
            ModKind::Hidden => Some('h'),
            ModKind::NoFail => Some('n'),
            ModKind::SuddenDeath => Some('u'),
            ModKind::Perfect => Some('f'),
            ModKind::Auto => Some('a'),
            ModKind::Autopilot => Some('p'),
            ModKind::DoubleTime => Some('d'),
            ModKind::NightCore => Some('c'),
            ModKind::HalfTime => Some('t'),
            ModKind::SmallCircle => Some('m'),
            ModKind::CustomSpeed | ModKind::DifficultyAdjust => None,
        }
    }

    /// Kinds this mod cannot be combined with. Incompatibility is
    /// symmetric; [`ModSet`] rejects a pair if either side declares it.
    pub fn incompatible_kinds(&self) -> &'static [ModKind] {
        match self.kind() {
            ModKind::Easy => &[ModKind::HardRock],
            ModKind::HardRock => &[ModKind::Easy],
            ModKind::NoFail => &[ModKind::SuddenDeath, ModKind::Perfect, ModKind::Autopilot],
            ModKind::SuddenDeath => &[ModKind::NoFail, ModKind::Perfect, ModKind::Auto],
            ModKind::Perfect => &[ModKind::NoFail, ModKind::SuddenDeath, ModKind::Auto],
            ModKind::Auto => &[ModKind::Autopilot, ModKind::Perfect, ModKind::SuddenDeath],
            ModKind::Autopilot => &[ModKind::Auto, ModKind::NoFail],
            ModKind::DoubleTime => &[ModKind::NightCore],
            ModKind::NightCore => &[ModKind::DoubleTime],
            _ => &[],
        }
    }

    /// This mod's individual score multiplier against the given
    /// difficulty. The aggregate multiplier of a set is the product of
    /// these.
    pub fn score_multiplier(&self, difficulty: &BeatmapDifficulty) -> f32 {
        match self {
            Self::Easy(_) | Self::ReallyEasy(_) | Self::NoFail(_) => 0.5,
            Self::HardRock(_) | Self::Hidden(_) => 1.06,
            Self::SuddenDeath(_) | Self::Perfect(_) | Self::Auto(_) | Self::SmallCircle(_) => 1.0,
            Self::Autopilot(_) => 1e-3,
            Self::CustomSpeed(m) => rate_adjust::rate_score_multiplier(m.track_rate()),
            Self::DoubleTime(m) => rate_adjust::rate_score_multiplier(m.track_rate()),
            Self::NightCore(m) => rate_adjust::rate_score_multiplier(m.track_rate()),
            Self::HalfTime(m) => rate_adjust::rate_score_multiplier(m.track_rate()),
            Self::DifficultyAdjust(m) => m.score_multiplier(difficulty),
        }
    }

    /// Difficulty-phase capability
    pub fn as_applicable_to_difficulty(&self) -> Option<&dyn ApplicableToDifficulty> {
        match self {
            Self::Easy(m) => Some(m),
            Self::HardRock(m) => Some(m),
            _ => None,
        }
    }

    /// Mod-aware difficulty-phase capability
    pub fn as_applicable_to_difficulty_with_mods(&self) -> Option<&dyn ApplicableToDifficultyWithMods> {
        match self {
            Self::ReallyEasy(m) => Some(m),
            Self::DifficultyAdjust(m) => Some(m),
            _ => None,
        }
    }

    /// Hit-object-phase capability
    pub fn as_applicable_to_hit_object(&self) -> Option<&dyn ApplicableToHitObject> {
        match self {
            Self::Hidden(m) => Some(m),
            _ => None,
        }
    }

    /// Mod-aware hit-object-phase capability
    pub fn as_applicable_to_hit_object_with_mods(&self) -> Option<&dyn ApplicableToHitObjectWithMods> {
        match self {
            Self::DifficultyAdjust(m) => Some(m),
            _ => None,
        }
    }

    /// Whole-map capability, applied last
    pub fn as_applicable_to_beatmap(&self) -> Option<&dyn ApplicableToBeatmap> {
        match self {
            Self::HardRock(m) => Some(m),
            _ => None,
        }
    }

    /// Playback-rate capability
    pub fn as_rate_adjust(&self) -> Option<&dyn RateAdjust> {
        match self {
            Self::CustomSpeed(m) => Some(m),
            Self::DoubleTime(m) => Some(m),
            Self::NightCore(m) => Some(m),
            Self::HalfTime(m) => Some(m),
            _ => None,
        }
    }

    /// Legacy-migration capability
    pub fn as_legacy(&self) -> Option<&dyn LegacyMod> {
        match self {
            Self::SmallCircle(m) => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_equality() {
        assert_eq!(
            Mod::CustomSpeed(ModCustomSpeed::new(1.5)),
            Mod::CustomSpeed(ModCustomSpeed::new(1.5))
        );
        assert_ne!(
            Mod::CustomSpeed(ModCustomSpeed::new(1.5)),
            Mod::CustomSpeed(ModCustomSpeed::new(1.25))
        );
        assert_eq!(Mod::Easy(ModEasy), Mod::Easy(ModEasy));
    }

    #[test]
    fn test_incompatibility_is_declared_at_least_one_sided() {
        // Every declared exclusion is honored symmetrically by ModSet;
        // here we just sanity-check a few declarations exist.
        assert!(Mod::Easy(ModEasy).incompatible_kinds().contains(&ModKind::HardRock));
        assert!(Mod::Auto(ModAuto).incompatible_kinds().contains(&ModKind::Autopilot));
    }

    #[test]
    fn test_capability_queries() {
        let easy = Mod::Easy(ModEasy);
        assert!(easy.as_applicable_to_difficulty().is_some());
        assert!(easy.as_applicable_to_hit_object().is_none());
        assert!(easy.as_rate_adjust().is_none());

        let speed = Mod::CustomSpeed(ModCustomSpeed::new(1.3));
        assert!(speed.as_rate_adjust().is_some());
        assert!(speed.as_applicable_to_difficulty().is_none());

        let small = Mod::SmallCircle(ModSmallCircle);
        assert!(small.as_legacy().is_some());
    }
}
