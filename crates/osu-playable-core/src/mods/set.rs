//! A validated, ordered collection of mods

use crate::beatmap::BeatmapDifficulty;
use crate::error::{Error, Result};
use crate::mods::{
    Mod, ModAuto, ModAutopilot, ModDoubleTime, ModEasy, ModHalfTime, ModHardRock, ModHidden,
    ModKind, ModNightCore, ModNoFail, ModPerfect, ModReallyEasy, ModSmallCircle, ModSuddenDeath,
};

/// An ordered mod collection with global consistency guarantees.
///
/// Construction and insertion enforce:
/// - at most one mod per kind (inserting a kind again replaces the
///   earlier instance and moves it to the end of the order);
/// - no mutually incompatible pair, regardless of which side declares
///   the exclusion or in which order the pair arrives.
///
/// Iteration order is insertion order, which is also the order the
/// pipeline applies mods in.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModSet {
    mods: Vec<Mod>,
}

impl ModSet {
    /// Build a set from mods in order, validating as it goes
    pub fn new(mods: impl IntoIterator<Item = Mod>) -> Result<Self> {
        let mut set = Self::default();
        for m in mods {
            set.insert(m)?;
        }
        Ok(set)
    }

    /// Insert a mod, replacing any earlier mod of the same kind.
    ///
    /// Returns [`Error::IncompatibleMods`] naming the conflicting pair if
    /// the mod excludes (or is excluded by) a member of a different kind.
    pub fn insert(&mut self, new: Mod) -> Result<()> {
        for existing in &self.mods {
            if existing.kind() == new.kind() {
                continue;
            }

            let conflicts = new.incompatible_kinds().contains(&existing.kind())
                || existing.incompatible_kinds().contains(&new.kind());
            if conflicts {
                return Err(Error::IncompatibleMods {
                    first: existing.kind(),
                    second: new.kind(),
                });
            }
        }

        self.mods.retain(|m| m.kind() != new.kind());
        self.mods.push(new);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    /// Iterate in application order
    pub fn iter(&self) -> impl Iterator<Item = &Mod> {
        self.mods.iter()
    }

    /// Whether a mod of the given kind is present
    pub fn contains(&self, kind: ModKind) -> bool {
        self.mods.iter().any(|m| m.kind() == kind)
    }

    /// The mod of the given kind, if present
    pub fn get(&self, kind: ModKind) -> Option<&Mod> {
        self.mods.iter().find(|m| m.kind() == kind)
    }

    /// Aggregate score multiplier: the product of every member's
    /// individual multiplier. Order-independent by construction.
    pub fn score_multiplier(&self, difficulty: &BeatmapDifficulty) -> f32 {
        self.mods
            .iter()
            .map(|m| m.score_multiplier(difficulty))
            .product()
    }

    /// The single effective playback rate.
    ///
    /// When several rate-adjust mods are present, the most recently
    /// applied one is authoritative; contributions are never combined.
    pub fn track_rate(&self) -> f64 {
        self.mods
            .iter()
            .rev()
            .find_map(Mod::as_rate_adjust)
            .map_or(1.0, |rate| rate.track_rate())
    }

    /// The effective playback rate at a specific track timestamp
    pub fn track_rate_at(&self, time: f64) -> f64 {
        self.mods
            .iter()
            .rev()
            .find_map(Mod::as_rate_adjust)
            .map_or(1.0, |rate| rate.track_rate_at(time))
    }

    /// Compact legacy encoding: one character per legacy-compatible mod.
    /// Modern-only mods are not representable and are omitted.
    pub fn encode_legacy(&self) -> String {
        self.mods.iter().filter_map(Mod::encode_char).collect()
    }

    /// Decode a legacy mod string. Unknown characters are logged and
    /// skipped; conflicting pairs fail like any other construction.
    pub fn decode_legacy(encoded: &str) -> Result<Self> {
        let mut set = Self::default();

        for c in encoded.chars() {
            let decoded = match c {
                'e' => Mod::Easy(ModEasy),
                'l' => Mod::ReallyEasy(ModReallyEasy),
                'r' => Mod::HardRock(ModHardRock),
                'h' => Mod::Hidden(ModHidden),
                'n' => Mod::NoFail(ModNoFail),
                'u' => Mod::SuddenDeath(ModSuddenDeath),
                'f' => Mod::Perfect(ModPerfect),
                'a' => Mod::Auto(ModAuto),
                'p' => Mod::Autopilot(ModAutopilot),
                'd' => Mod::DoubleTime(ModDoubleTime),
                'c' => Mod::NightCore(ModNightCore),
                't' => Mod::HalfTime(ModHalfTime),
                'm' => Mod::SmallCircle(ModSmallCircle),
                other => {
                    tracing::warn!("Unknown legacy mod character '{}', skipping", other);
                    continue;
                }
            };
            set.insert(decoded)?;
        }

        Ok(set)
    }

    /// Replace every legacy-migratable mod with its modern equivalent,
    /// using the given difficulty as migration context.
    pub fn migrate_legacy(&mut self, difficulty: &BeatmapDifficulty) -> Result<()> {
        let migrated: Vec<Mod> = self
            .mods
            .iter()
            .filter_map(|m| m.as_legacy().map(|legacy| legacy.migrate(difficulty)))
            .collect();

        if migrated.is_empty() {
            return Ok(());
        }

        self.mods.retain(|m| m.as_legacy().is_none());
        for m in migrated {
            self.insert(m)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ModSet {
    type Item = &'a Mod;
    type IntoIter = std::slice::Iter<'a, Mod>;

    fn into_iter(self) -> Self::IntoIter {
        self.mods.iter()
    }
}
