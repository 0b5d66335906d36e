//! Section tags and per-section line parsers.
//!
//! Every parser here returns a [`ParseLineError`] on malformed input; the
//! caller logs the failure and drops the line. None of them can fail in a
//! way that aborts the whole parse.

use crate::beatmap::{
    Beatmap, DifficultyControlPoint, HitObject, HitObjectKind, Position, SampleBank,
    SampleControlPoint, Slider, TimingControlPoint,
};
use crate::error::ParseLineError;

/// A recognized `[Section]` of a beatmap file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Section {
    General,
    Metadata,
    Difficulty,
    Events,
    TimingPoints,
    Colors,
    HitObjects,
}

impl Section {
    /// Parse a section name; unrecognized names yield `None` and their
    /// contents are ignored.
    pub(crate) fn parse(name: &str) -> Option<Self> {
        match name {
            "General" => Some(Self::General),
            "Metadata" => Some(Self::Metadata),
            "Difficulty" => Some(Self::Difficulty),
            "Events" => Some(Self::Events),
            "TimingPoints" => Some(Self::TimingPoints),
            "Colours" => Some(Self::Colors),
            "HitObjects" => Some(Self::HitObjects),
            _ => None,
        }
    }
}

type LineResult = Result<(), ParseLineError>;

fn key_value(line: &str) -> Result<(&str, &str), ParseLineError> {
    let (key, value) = line.split_once(':').ok_or(ParseLineError::MissingSeparator)?;
    Ok((key.trim(), value.trim()))
}

fn parse_number<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ParseLineError> {
    value.parse().map_err(|_| ParseLineError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

pub(crate) fn parse_general_line(beatmap: &mut Beatmap, line: &str) -> LineResult {
    let (key, value) = key_value(line)?;
    let general = &mut beatmap.general;

    match key {
        "AudioFilename" => general.audio_filename = value.to_string(),
        "AudioLeadIn" => general.audio_lead_in = parse_number("AudioLeadIn", value)?,
        "PreviewTime" => general.preview_time = parse_number("PreviewTime", value)?,
        "SampleSet" => {
            general.sample_bank = match value {
                "Soft" => SampleBank::Soft,
                "Drum" => SampleBank::Drum,
                _ => SampleBank::Normal,
            }
        }
        "StackLeniency" => general.stack_leniency = parse_number("StackLeniency", value)?,
        "Mode" => general.mode = parse_number("Mode", value)?,
        _ => {}
    }

    Ok(())
}

pub(crate) fn parse_metadata_line(beatmap: &mut Beatmap, line: &str) -> LineResult {
    let (key, value) = key_value(line)?;
    let metadata = &mut beatmap.metadata;

    match key {
        "Title" => metadata.title = value.to_string(),
        "TitleUnicode" => metadata.title_unicode = value.to_string(),
        "Artist" => metadata.artist = value.to_string(),
        "ArtistUnicode" => metadata.artist_unicode = value.to_string(),
        "Creator" => metadata.creator = value.to_string(),
        "Version" => metadata.version = value.to_string(),
        "Source" => metadata.source = value.to_string(),
        "Tags" => metadata.tags = value.split_whitespace().map(String::from).collect(),
        "BeatmapID" => metadata.beatmap_id = Some(parse_number("BeatmapID", value)?),
        "BeatmapSetID" => metadata.beatmap_set_id = Some(parse_number("BeatmapSetID", value)?),
        _ => {}
    }

    Ok(())
}

pub(crate) fn parse_difficulty_line(beatmap: &mut Beatmap, line: &str) -> LineResult {
    let (key, value) = key_value(line)?;
    let difficulty = &mut beatmap.difficulty;

    match key {
        "HPDrainRate" => difficulty.hp = parse_number("HPDrainRate", value)?,
        "CircleSize" => difficulty.set_cs(parse_number("CircleSize", value)?),
        "OverallDifficulty" => difficulty.od = parse_number("OverallDifficulty", value)?,
        "ApproachRate" => difficulty.set_ar(parse_number("ApproachRate", value)?),
        "SliderMultiplier" => {
            difficulty.slider_multiplier = parse_number("SliderMultiplier", value)?
        }
        "SliderTickRate" => difficulty.slider_tick_rate = parse_number("SliderTickRate", value)?,
        _ => {}
    }

    Ok(())
}

pub(crate) fn parse_events_line(beatmap: &mut Beatmap, line: &str) -> LineResult {
    let fields: Vec<&str> = line.split(',').collect();

    match fields[0] {
        // 0,0,"background.png",...
        "0" => {
            if fields.len() < 3 {
                return Err(ParseLineError::TooFewFields {
                    expected: 3,
                    actual: fields.len(),
                });
            }
            beatmap.events.background = Some(fields[2].trim_matches('"').to_string());
        }
        // 2,start,end (also written as "Break")
        "2" | "Break" => {
            if fields.len() < 3 {
                return Err(ParseLineError::TooFewFields {
                    expected: 3,
                    actual: fields.len(),
                });
            }
            let start: f64 = parse_number("break start", fields[1].trim())?;
            let end: f64 = parse_number("break end", fields[2].trim())?;
            beatmap.events.breaks.push((start, end));
        }
        _ => {}
    }

    Ok(())
}

pub(crate) fn parse_timing_line(beatmap: &mut Beatmap, line: &str) -> LineResult {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if fields.len() < 2 {
        return Err(ParseLineError::TooFewFields {
            expected: 2,
            actual: fields.len(),
        });
    }

    let time: f64 = parse_number("time", fields[0])?;
    let beat_length: f64 = parse_number("beatLength", fields[1])?;

    // Negative beat length marks an inherited point: a slider velocity
    // multiplier relative to the last uninherited point.
    if beat_length < 0.0 {
        beatmap
            .control_points
            .difficulty_points
            .push(DifficultyControlPoint {
                time,
                speed_multiplier: (-100.0 / beat_length).clamp(0.1, 10.0),
            });
    } else {
        beatmap
            .control_points
            .timing_points
            .push(TimingControlPoint { time, beat_length });
    }

    // Fields 3 (sample set) and 5 (volume) carry the sample assignment.
    if fields.len() > 5 {
        let bank_id: i32 = parse_number("sampleSet", fields[3])?;
        let volume: i32 = parse_number("volume", fields[5])?;
        beatmap.control_points.sample_points.push(SampleControlPoint {
            time,
            bank: SampleBank::from_id(bank_id),
            volume,
        });
    }

    Ok(())
}

pub(crate) fn parse_colors_line(beatmap: &mut Beatmap, line: &str) -> LineResult {
    let (key, value) = key_value(line)?;
    if !key.starts_with("Combo") {
        return Ok(());
    }

    let fields: Vec<&str> = value.split(',').map(str::trim).collect();
    if fields.len() < 3 {
        return Err(ParseLineError::TooFewFields {
            expected: 3,
            actual: fields.len(),
        });
    }

    let r: u8 = parse_number("red", fields[0])?;
    let g: u8 = parse_number("green", fields[1])?;
    let b: u8 = parse_number("blue", fields[2])?;
    beatmap.colors.combo_colors.push((r, g, b));

    Ok(())
}

const TYPE_CIRCLE: u32 = 1;
const TYPE_SLIDER: u32 = 1 << 1;
const TYPE_NEW_COMBO: u32 = 1 << 2;
const TYPE_SPINNER: u32 = 1 << 3;

pub(crate) fn parse_hit_object_line(beatmap: &mut Beatmap, line: &str) -> LineResult {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 5 {
        return Err(ParseLineError::TooFewFields {
            expected: 5,
            actual: fields.len(),
        });
    }

    let x: f32 = parse_number("x", fields[0])?;
    let y: f32 = parse_number("y", fields[1])?;
    let time: f64 = parse_number("time", fields[2])?;
    let object_type: u32 = parse_number("type", fields[3])?;
    let sound: u32 = parse_number("hitSound", fields[4])?;

    let new_combo = object_type & TYPE_NEW_COMBO != 0;
    let position = Position::new(x, y);

    let kind = if object_type & TYPE_CIRCLE != 0 {
        HitObjectKind::Circle
    } else if object_type & TYPE_SLIDER != 0 {
        if fields.len() < 8 {
            return Err(ParseLineError::TooFewFields {
                expected: 8,
                actual: fields.len(),
            });
        }

        // Curve: <type char>|x1:y1|x2:y2|...
        let curve_points = fields[5]
            .split('|')
            .skip(1)
            .filter_map(|pair| {
                let (x, y) = pair.split_once(':')?;
                Some(Position::new(x.trim().parse().ok()?, y.trim().parse().ok()?))
            })
            .collect();

        HitObjectKind::Slider(Slider {
            span_count: parse_number("slides", fields[6])?,
            pixel_length: parse_number("length", fields[7])?,
            curve_points,
            ..Default::default()
        })
    } else if object_type & TYPE_SPINNER != 0 {
        if fields.len() < 6 {
            return Err(ParseLineError::TooFewFields {
                expected: 6,
                actual: fields.len(),
            });
        }
        HitObjectKind::Spinner {
            end_time: parse_number("endTime", fields[5])?,
        }
    } else {
        return Err(ParseLineError::UnknownObjectType(object_type));
    };

    beatmap
        .hit_objects
        .push(HitObject::new(position, time, new_combo, sound, kind));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beatmap::GameMode;

    fn beatmap() -> Beatmap {
        Beatmap::new(GameMode::Standard)
    }

    #[test]
    fn test_section_parse() {
        assert_eq!(Section::parse("General"), Some(Section::General));
        assert_eq!(Section::parse("Colours"), Some(Section::Colors));
        assert_eq!(Section::parse("Editor"), None);
    }

    #[test]
    fn test_general_line() {
        let mut map = beatmap();
        parse_general_line(&mut map, "AudioFilename: audio.mp3").unwrap();
        parse_general_line(&mut map, "Mode: 1").unwrap();
        assert_eq!(map.general.audio_filename, "audio.mp3");
        assert_eq!(map.general.mode, 1);
    }

    #[test]
    fn test_difficulty_line_sets_both_cs_variants() {
        let mut map = beatmap();
        parse_difficulty_line(&mut map, "CircleSize:4.2").unwrap();
        assert_eq!(map.difficulty.difficulty_cs, 4.2);
        assert_eq!(map.difficulty.gameplay_cs, 4.2);
    }

    #[test]
    fn test_timing_line_inherited_and_uninherited() {
        let mut map = beatmap();
        parse_timing_line(&mut map, "0,500,4,2,0,60,1,0").unwrap();
        parse_timing_line(&mut map, "1000,-50,4,2,0,60,0,0").unwrap();

        assert_eq!(map.control_points.timing_points.len(), 1);
        assert_eq!(map.control_points.difficulty_points.len(), 1);
        assert_eq!(map.control_points.difficulty_points[0].speed_multiplier, 2.0);
        assert_eq!(map.control_points.sample_points.len(), 2);
        assert_eq!(map.control_points.sample_points[0].bank, SampleBank::Soft);
        assert_eq!(map.control_points.sample_points[0].volume, 60);
    }

    #[test]
    fn test_hit_object_circle() {
        let mut map = beatmap();
        parse_hit_object_line(&mut map, "256,192,1000,5,0").unwrap();
        assert_eq!(map.hit_objects.len(), 1);
        let object = &map.hit_objects[0];
        assert!(object.new_combo);
        assert!(matches!(object.kind, HitObjectKind::Circle));
        assert_eq!(object.start_time, 1000.0);
    }

    #[test]
    fn test_hit_object_slider() {
        let mut map = beatmap();
        parse_hit_object_line(&mut map, "100,100,2000,2,0,B|200:100|300:200,2,180").unwrap();
        let HitObjectKind::Slider(slider) = &map.hit_objects[0].kind else {
            panic!("expected slider");
        };
        assert_eq!(slider.span_count, 2);
        assert_eq!(slider.pixel_length, 180.0);
        assert_eq!(slider.curve_points.len(), 2);
    }

    #[test]
    fn test_malformed_lines_are_recoverable_errors() {
        let mut map = beatmap();
        assert!(parse_general_line(&mut map, "no separator here").is_err());
        assert!(parse_difficulty_line(&mut map, "CircleSize:abc").is_err());
        assert!(parse_hit_object_line(&mut map, "1,2,3").is_err());
        assert!(parse_hit_object_line(&mut map, "1,2,3,64,0").is_err());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let mut map = beatmap();
        parse_general_line(&mut map, "LetterboxInBreaks: 1").unwrap();
        parse_metadata_line(&mut map, "SomeFutureKey: value").unwrap();
    }
}
