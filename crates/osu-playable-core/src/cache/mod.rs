//! A thread-safe cache for parsed beatmaps.
//!
//! Supports beatmaps parsed with or without hit objects, and reparses a
//! beatmap automatically when it is requested with hit objects but only
//! cached without them. One bounded LRU region exists per ruleset; a
//! beatmap cached for one ruleset satisfies requests for the other via
//! conversion.

mod lru;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use md5::{Digest, Md5};

use crate::beatmap::{Beatmap, GameMode};
use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::mods::ModSet;
use crate::parser::BeatmapParser;
use lru::LruRegion;

/// Entries kept per ruleset region
const MAX_SIZE: usize = 20;

/// A stored descriptor for a beatmap: its content hash plus the path of
/// the backing file, letting cache misses skip rehashing.
#[derive(Debug, Clone)]
pub struct BeatmapRecord {
    /// MD5 hex digest of the beatmap file
    pub md5: String,
    /// Path to the `.osu` file
    pub path: PathBuf,
}

/// A set of beatmap descriptors sharing a mapset, for batch invalidation
#[derive(Debug, Clone, Default)]
pub struct BeatmapSetRecord {
    pub beatmaps: Vec<BeatmapRecord>,
}

#[derive(Debug)]
struct CachedBeatmap {
    beatmap: Arc<Beatmap>,
    with_hit_objects: bool,
}

#[derive(Debug)]
struct Regions {
    standard: LruRegion<CachedBeatmap>,
    touch: LruRegion<CachedBeatmap>,
}

impl Regions {
    fn region_for(&mut self, mode: GameMode) -> &mut LruRegion<CachedBeatmap> {
        match mode {
            GameMode::Standard => &mut self.standard,
            GameMode::Touch => &mut self.touch,
        }
    }
}

/// Outcome of a lookup under the lock; conversion and parsing both
/// happen outside of it.
enum CacheLookup {
    Hit(Arc<Beatmap>),
    NeedsConversion(Arc<Beatmap>),
    Miss,
}

/// A cache of parsed beatmaps, keyed by content hash, with one bounded
/// LRU region per ruleset.
///
/// All region access is serialized by a single mutex so that lookup,
/// cross-ruleset fallback and insertion form one atomic decision.
/// CPU-bound work (reading and parsing a file, converting a ruleset)
/// always happens outside that critical section; two concurrent misses
/// for the same key may therefore both do the work, and the insertion
/// rule (a richer entry is never displaced by a poorer one) restores
/// consistency afterwards.
///
/// Beatmaps returned from the cache are shared. Do not mutate them.
#[derive(Debug)]
pub struct BeatmapCache {
    regions: Mutex<Regions>,
}

impl Default for BeatmapCache {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatmapCache {
    /// Create an empty cache with the standard per-ruleset capacity
    pub fn new() -> Self {
        Self {
            regions: Mutex::new(Regions {
                standard: LruRegion::new(MAX_SIZE),
                touch: LruRegion::new(MAX_SIZE),
            }),
        }
    }

    /// Obtain a beatmap from the cache, parsing the file if needed.
    ///
    /// The file's MD5 is computed eagerly since it is the cache key.
    pub fn get_from_file(
        &self,
        path: &Path,
        with_hit_objects: bool,
        mode: GameMode,
        token: Option<&CancellationToken>,
    ) -> Result<Arc<Beatmap>> {
        let bytes = fs::read(path)?;
        let md5 = format!("{:x}", Md5::digest(&bytes));

        if let Some(beatmap) = self.lookup(&md5, with_hit_objects, mode, token)? {
            return Ok(beatmap);
        }

        self.parse_and_store(path, &md5, with_hit_objects, mode, token)
    }

    /// Obtain a beatmap from the cache by its stored descriptor, parsing
    /// the backing file if needed.
    pub fn get(
        &self,
        record: &BeatmapRecord,
        with_hit_objects: bool,
        mode: GameMode,
        token: Option<&CancellationToken>,
    ) -> Result<Arc<Beatmap>> {
        if let Some(beatmap) = self.lookup(&record.md5, with_hit_objects, mode, token)? {
            return Ok(beatmap);
        }

        if !record.path.exists() {
            return Err(Error::BeatmapNotFound(record.path.clone()));
        }

        self.parse_and_store(&record.path, &record.md5, with_hit_objects, mode, token)
    }

    /// Remove the entry for a content hash from both ruleset regions
    pub fn invalidate(&self, md5: &str) {
        let mut regions = self.regions.lock().unwrap();
        regions.standard.remove(md5);
        regions.touch.remove(md5);
    }

    /// Remove the entries of every beatmap in a set from both regions
    pub fn invalidate_set(&self, set: &BeatmapSetRecord) {
        let mut regions = self.regions.lock().unwrap();
        for record in &set.beatmaps {
            regions.standard.remove(&record.md5);
            regions.touch.remove(&record.md5);
        }
    }

    /// Clear all entries from both regions
    pub fn clear(&self) {
        let mut regions = self.regions.lock().unwrap();
        regions.standard.clear();
        regions.touch.clear();
    }

    /// Resolve a key against the cache without touching the filesystem.
    ///
    /// Returns the cached beatmap on an exact hit, the converted (and
    /// re-cached) beatmap when only the other ruleset's region has a
    /// satisfying entry, and `None` when the caller must parse.
    fn lookup(
        &self,
        md5: &str,
        with_hit_objects: bool,
        mode: GameMode,
        token: Option<&CancellationToken>,
    ) -> Result<Option<Arc<Beatmap>>> {
        let lookup = {
            let mut regions = self.regions.lock().unwrap();

            let exact = regions
                .region_for(mode)
                .get(md5)
                .map(|entry| (Arc::clone(&entry.beatmap), entry.with_hit_objects));

            match exact {
                Some((beatmap, has_objects)) if has_objects || !with_hit_objects => {
                    CacheLookup::Hit(beatmap)
                }
                // An entry without hit objects cannot satisfy a request
                // for them; reparse rather than falling back.
                Some(_) => CacheLookup::Miss,
                None => {
                    let fallback = regions
                        .region_for(mode.other())
                        .get(md5)
                        .map(|entry| (Arc::clone(&entry.beatmap), entry.with_hit_objects));

                    match fallback {
                        Some((beatmap, has_objects)) if has_objects || !with_hit_objects => {
                            CacheLookup::NeedsConversion(beatmap)
                        }
                        _ => CacheLookup::Miss,
                    }
                }
            }
        };

        match lookup {
            CacheLookup::Hit(beatmap) => Ok(Some(beatmap)),
            // Conversion runs outside the lock and re-enters through the
            // same insertion path a fresh parse uses.
            CacheLookup::NeedsConversion(beatmap) => {
                self.store(beatmap, with_hit_objects, mode, token).map(Some)
            }
            CacheLookup::Miss => Ok(None),
        }
    }

    fn parse_and_store(
        &self,
        path: &Path,
        md5: &str,
        with_hit_objects: bool,
        mode: GameMode,
        token: Option<&CancellationToken>,
    ) -> Result<Arc<Beatmap>> {
        let mut parser = BeatmapParser::new(path).with_md5(md5);
        if let Some(token) = token {
            parser = parser.with_cancellation(token);
        }
        let beatmap = Arc::new(parser.parse(with_hit_objects, mode)?);

        self.store(beatmap, with_hit_objects, mode, token)
    }

    /// Convert a beatmap to the target ruleset (outside the lock) and
    /// insert it, resolving insertion races in favor of the richer entry.
    fn store(
        &self,
        beatmap: Arc<Beatmap>,
        with_hit_objects: bool,
        mode: GameMode,
        token: Option<&CancellationToken>,
    ) -> Result<Arc<Beatmap>> {
        let converted = beatmap.create_playable(mode, &ModSet::default(), token)?;
        let md5 = converted.md5.clone();

        let mut regions = self.regions.lock().unwrap();
        let region = regions.region_for(mode);

        if let Some(existing) = region.get(&md5) {
            if existing.with_hit_objects && !with_hit_objects {
                // A more complete beatmap was cached by another caller
                // while we were parsing; keep it and discard ours.
                return Ok(Arc::clone(&existing.beatmap));
            }
        }

        region.insert(
            md5,
            CachedBeatmap {
                beatmap: Arc::clone(&converted),
                with_hit_objects,
            },
        );

        Ok(converted)
    }
}
