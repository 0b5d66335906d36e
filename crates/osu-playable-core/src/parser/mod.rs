//! Line-oriented parser for `.osu` beatmap files

mod sections;

use std::fs;
use std::path::{Path, PathBuf};

use md5::{Digest, Md5};

use crate::beatmap::{Beatmap, GameMode};
use crate::cancel::{self, CancellationToken};
use crate::convert::BeatmapProcessor;
use crate::error::{Error, Result};
use sections::Section;

const FORMAT_VERSION_PREFIX: &str = "osu file format v";

/// A parser for `.osu` beatmap files.
///
/// ```no_run
/// use osu_playable_core::{BeatmapParser, GameMode};
///
/// let beatmap = BeatmapParser::new("/path/to/map.osu")
///     .parse(true, GameMode::Standard)
///     .expect("Failed to parse");
/// println!("{} objects", beatmap.hit_objects.len());
/// ```
pub struct BeatmapParser<'a> {
    path: PathBuf,
    token: Option<&'a CancellationToken>,
    /// Precomputed MD5 of the file's bytes. The hash doubles as the cache
    /// key, so callers that already know it skip the digest here.
    precomputed_md5: Option<String>,
}

impl<'a> BeatmapParser<'a> {
    /// Create a parser for the given `.osu` file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            token: None,
            precomputed_md5: None,
        }
    }

    /// Poll the given token for cancellation while parsing
    pub fn with_cancellation(mut self, token: &'a CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Provide a precomputed content hash, skipping the MD5 digest
    pub fn with_md5(mut self, md5: impl Into<String>) -> Self {
        self.precomputed_md5 = Some(md5.into());
        self
    }

    /// Parse the file.
    ///
    /// With `with_hit_objects` false, scanning stops as soon as the
    /// `[HitObjects]` section begins, which speeds up header-only loads
    /// considerably. `mode` tags the result and drives defaulting; the
    /// file itself must always declare the standard ruleset.
    pub fn parse(&self, with_hit_objects: bool, mode: GameMode) -> Result<Beatmap> {
        cancel::checkpoint(self.token)?;

        let bytes = fs::read(&self.path)?;
        let content = String::from_utf8_lossy(&bytes);
        let mut lines = content.lines();

        let format_version = read_format_version(&mut lines)?;

        let mut beatmap = Beatmap::new(mode);
        beatmap.format_version = format_version;
        beatmap.file_path = self.path.clone();
        beatmap.md5 = match &self.precomputed_md5 {
            Some(md5) => md5.clone(),
            None => format!("{:x}", Md5::digest(&bytes)),
        };

        let mut current_section: Option<Section> = None;

        for raw_line in lines {
            cancel::checkpoint(self.token)?;

            // A non-standard mode is a hard failure, not a skippable line.
            if beatmap.general.mode != 0 {
                return Err(Error::UnsupportedRuleset {
                    mode: beatmap.general.mode,
                });
            }

            // Legacy comment lines, recognized before trimming
            if raw_line.starts_with(' ') || raw_line.starts_with('_') {
                continue;
            }

            let line = raw_line.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                current_section = Section::parse(name);

                // Hit objects are always declared last; once their section
                // starts there is nothing else to scan for.
                if current_section == Some(Section::HitObjects) && !with_hit_objects {
                    break;
                }

                continue;
            }

            let Some(section) = current_section else {
                continue;
            };

            let parsed = match section {
                Section::General => sections::parse_general_line(&mut beatmap, line),
                Section::Metadata => sections::parse_metadata_line(&mut beatmap, line),
                Section::Difficulty => sections::parse_difficulty_line(&mut beatmap, line),
                Section::Events => sections::parse_events_line(&mut beatmap, line),
                Section::TimingPoints => sections::parse_timing_line(&mut beatmap, line),
                Section::Colors => sections::parse_colors_line(&mut beatmap, line),
                Section::HitObjects => sections::parse_hit_object_line(&mut beatmap, line),
            };

            if let Err(e) = parsed {
                tracing::warn!("Unable to parse line '{}': {}", line, e);
            }
        }

        if beatmap.general.mode != 0 {
            return Err(Error::UnsupportedRuleset {
                mode: beatmap.general.mode,
            });
        }

        let processor = BeatmapProcessor::new(self.token);
        processor.pre_process(&mut beatmap)?;

        let default_bank = beatmap.general.sample_bank;
        let control_points = &beatmap.control_points;
        let difficulty = &beatmap.difficulty;

        for object in beatmap.hit_objects.iter_mut() {
            cancel::checkpoint(self.token)?;
            object.apply_defaults(control_points, difficulty, mode, self.token)?;
            object.apply_samples(control_points, default_bank);
        }

        processor.post_process(&mut beatmap)?;

        Ok(beatmap)
    }
}

/// Read the `osu file format v<n>` header, skipping leading blank lines
/// and a UTF-8 BOM.
fn read_format_version<'s>(lines: &mut impl Iterator<Item = &'s str>) -> Result<i32> {
    let head = lines
        .map(|l| l.trim_start_matches('\u{feff}'))
        .find(|l| !l.trim().is_empty())
        .ok_or(Error::InvalidFormatVersion)?;

    let index = head
        .find(FORMAT_VERSION_PREFIX)
        .ok_or(Error::InvalidFormatVersion)?;

    head[index + FORMAT_VERSION_PREFIX.len()..]
        .trim()
        .parse()
        .map_err(|_| Error::InvalidFormatVersion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL_MAP: &str = "osu file format v14

[General]
AudioFilename: audio.mp3
Mode: 0

[Metadata]
Title:Test Song
Artist:Test Artist
Creator:Test Creator
Version:Insane

[Difficulty]
HPDrainRate:5
CircleSize:4
OverallDifficulty:8
ApproachRate:9
SliderMultiplier:1.6
SliderTickRate:1

[TimingPoints]
0,500,4,2,0,60,1,0

[HitObjects]
256,192,1000,5,0
";

    fn write_map(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes()).expect("Failed to write");
        file
    }

    #[test]
    fn test_parse_minimal_map() {
        let file = write_map(MINIMAL_MAP);
        let beatmap = BeatmapParser::new(file.path())
            .parse(true, GameMode::Standard)
            .unwrap();

        assert_eq!(beatmap.format_version, 14);
        assert_eq!(beatmap.metadata.title, "Test Song");
        assert_eq!(beatmap.difficulty.difficulty_cs, 4.0);
        assert_eq!(beatmap.difficulty.ar(), 9.0);
        assert_eq!(beatmap.difficulty.od, 8.0);
        assert_eq!(beatmap.difficulty.hp, 5.0);
        assert_eq!(beatmap.hit_objects.len(), 1);
        assert_eq!(beatmap.max_combo(), 1);
        assert!(!beatmap.md5.is_empty());

        // Defaults ran: AR 9 means a 600ms pre-empt
        assert!((beatmap.hit_objects[0].time_preempt - 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_standard_mode_aborts() {
        let file = write_map(&MINIMAL_MAP.replace("Mode: 0", "Mode: 1"));
        let result = BeatmapParser::new(file.path()).parse(true, GameMode::Standard);
        assert!(matches!(result, Err(Error::UnsupportedRuleset { mode: 1 })));
    }

    #[test]
    fn test_without_hit_objects_stops_early() {
        let file = write_map(MINIMAL_MAP);
        let beatmap = BeatmapParser::new(file.path())
            .parse(false, GameMode::Standard)
            .unwrap();
        assert!(beatmap.hit_objects.is_empty());
        assert_eq!(beatmap.metadata.title, "Test Song");
    }

    #[test]
    fn test_missing_header_is_format_error() {
        let file = write_map("[General]\nMode: 0\n");
        let result = BeatmapParser::new(file.path()).parse(true, GameMode::Standard);
        assert!(matches!(result, Err(Error::InvalidFormatVersion)));
    }

    #[test]
    fn test_unparseable_version_is_format_error() {
        let file = write_map("osu file format vX\n");
        let result = BeatmapParser::new(file.path()).parse(true, GameMode::Standard);
        assert!(matches!(result, Err(Error::InvalidFormatVersion)));
    }

    #[test]
    fn test_empty_file_is_format_error() {
        let file = write_map("");
        let result = BeatmapParser::new(file.path()).parse(true, GameMode::Standard);
        assert!(matches!(result, Err(Error::InvalidFormatVersion)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result =
            BeatmapParser::new("/nonexistent/map.osu").parse(true, GameMode::Standard);
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_bom_and_blank_lines_before_header() {
        let file = write_map("\u{feff}\n\nosu file format v12\n[General]\nMode: 0\n");
        let beatmap = BeatmapParser::new(file.path())
            .parse(true, GameMode::Standard)
            .unwrap();
        assert_eq!(beatmap.format_version, 12);
    }

    #[test]
    fn test_comment_and_legacy_lines_skipped() {
        let map = MINIMAL_MAP.replace(
            "[Metadata]\n",
            "[Metadata]\n// a comment\n_ legacy storyboard line\n underscore-less legacy line\n",
        );
        let file = write_map(&map);
        let beatmap = BeatmapParser::new(file.path())
            .parse(true, GameMode::Standard)
            .unwrap();
        assert_eq!(beatmap.metadata.title, "Test Song");
    }

    #[test]
    fn test_bad_line_is_skipped_and_parse_continues() {
        let map = MINIMAL_MAP.replace(
            "CircleSize:4\n",
            "CircleSize:not-a-number\nCircleSize:6\n",
        );
        let file = write_map(&map);
        let beatmap = BeatmapParser::new(file.path())
            .parse(true, GameMode::Standard)
            .unwrap();
        assert_eq!(beatmap.difficulty.difficulty_cs, 6.0);
    }

    #[test]
    fn test_unknown_section_contents_ignored() {
        let map = MINIMAL_MAP.replace("[Metadata]\n", "[Editor]\nDistanceSpacing: 0.8\n[Metadata]\n");
        let file = write_map(&map);
        let beatmap = BeatmapParser::new(file.path())
            .parse(true, GameMode::Standard)
            .unwrap();
        assert_eq!(beatmap.metadata.title, "Test Song");
    }

    #[test]
    fn test_precomputed_md5_is_used() {
        let file = write_map(MINIMAL_MAP);
        let beatmap = BeatmapParser::new(file.path())
            .with_md5("abc123")
            .parse(false, GameMode::Standard)
            .unwrap();
        assert_eq!(beatmap.md5, "abc123");
    }

    #[test]
    fn test_cancellation_aborts_parse() {
        let token = CancellationToken::new();
        token.cancel();

        let file = write_map(MINIMAL_MAP);
        let result = BeatmapParser::new(file.path())
            .with_cancellation(&token)
            .parse(true, GameMode::Standard);
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
