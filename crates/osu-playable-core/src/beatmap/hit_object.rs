//! Hit objects and their derived gameplay values

use serde::{Deserialize, Serialize};

use crate::beatmap::control_points::{BeatmapControlPoints, SampleBank};
use crate::beatmap::sections::BeatmapDifficulty;
use crate::beatmap::GameMode;
use crate::cancel::{self, CancellationToken};
use crate::error::Result;
use crate::utils;

/// Pre-empt duration at approach rate 0, in milliseconds
pub const PREEMPT_MAX: f64 = 1800.0;
/// Pre-empt duration at approach rate 5
pub const PREEMPT_MID: f64 = 1200.0;
/// Pre-empt duration at approach rate 10
pub const PREEMPT_MIN: f64 = 450.0;

/// Base fade-in duration, scaled down for high approach rates
const TIME_FADE_IN: f64 = 400.0;

/// Distance in osu!pixels covered by one beat at slider multiplier 1.0
const BASE_SCORING_DISTANCE: f64 = 100.0;

/// Slider ticks are not generated closer than this to a span's end
const TICK_CUTOFF: f64 = 10.0;

/// Stacked objects lean back by this many osu!pixels per level, scaled
/// by object size
const STACK_OFFSET: f32 = -6.4;

/// A position on the 512x384 playfield
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Slider-specific data, including the nested objects built during
/// defaulting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slider {
    /// Number of times the ball travels the path (1 = no repeats)
    pub span_count: i32,
    /// Path length in osu!pixels
    pub pixel_length: f64,
    /// Control points of the path, excluding the head position
    pub curve_points: Vec<Position>,
    /// End time in milliseconds; derived during defaulting
    pub end_time: f64,
    /// Head, ticks, repeats and tail; derived during defaulting
    pub nested: Vec<HitObject>,
}

/// The gameplay shape of a hit object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HitObjectKind {
    Circle,
    Slider(Slider),
    Spinner { end_time: f64 },
}

/// A single time-ordered gameplay event.
///
/// Raw placement fields come from the parser; `time_preempt`,
/// `time_fade_in`, `scale` and the sample assignment are derived and stay
/// zero until [`HitObject::apply_defaults`] runs. Once the owning pipeline
/// completes they are never written again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitObject {
    pub position: Position,
    /// Start time in milliseconds
    pub start_time: f64,
    /// Whether this object starts a new combo
    pub new_combo: bool,
    /// Raw hit sound bitmask
    pub sound: u32,
    pub kind: HitObjectKind,

    /// Milliseconds the object is visible before its start time
    pub time_preempt: f64,
    /// Milliseconds over which the object fades in, within the pre-empt
    pub time_fade_in: f64,
    /// Radius scale derived from the gameplay circle size
    pub scale: f32,
    /// Stack level assigned by post-processing
    pub stack_height: i32,
    /// Sample bank assigned from control points
    pub sample_bank: SampleBank,
    /// Sample volume assigned from control points
    pub sample_volume: i32,
}

impl HitObject {
    /// Create a raw object with derived fields unset
    pub fn new(position: Position, start_time: f64, new_combo: bool, sound: u32, kind: HitObjectKind) -> Self {
        Self {
            position,
            start_time,
            new_combo,
            sound,
            kind,
            time_preempt: 0.0,
            time_fade_in: 0.0,
            scale: 0.0,
            stack_height: 0,
            sample_bank: SampleBank::Normal,
            sample_volume: 100,
        }
    }

    /// End time of the object; equals the start time for circles
    pub fn end_time(&self) -> f64 {
        match &self.kind {
            HitObjectKind::Circle => self.start_time,
            HitObjectKind::Slider(slider) => slider.end_time.max(self.start_time),
            HitObjectKind::Spinner { end_time } => *end_time,
        }
    }

    /// Position after applying the stack offset
    pub fn stacked_position(&self) -> Position {
        let offset = self.stack_height as f32 * self.scale * STACK_OFFSET;
        Position::new(self.position.x + offset, self.position.y + offset)
    }

    /// How many combo this object awards
    pub fn combo_length(&self) -> usize {
        match &self.kind {
            HitObjectKind::Slider(slider) => slider.nested.len(),
            _ => 1,
        }
    }

    /// Compute the derived fields from difficulty and control points.
    ///
    /// Pure in its inputs and idempotent: sliders rebuild their nested
    /// objects from scratch on every call. Fails only on cancellation.
    pub fn apply_defaults(
        &mut self,
        control_points: &BeatmapControlPoints,
        difficulty: &BeatmapDifficulty,
        mode: GameMode,
        token: Option<&CancellationToken>,
    ) -> Result<()> {
        cancel::checkpoint(token)?;

        self.time_preempt = BeatmapDifficulty::difficulty_range(
            difficulty.ar() as f64,
            PREEMPT_MAX,
            PREEMPT_MID,
            PREEMPT_MIN,
        );
        self.time_fade_in = TIME_FADE_IN * (self.time_preempt / PREEMPT_MIN).min(1.0);
        self.scale = match mode {
            GameMode::Standard => utils::standard_cs_to_scale(difficulty.gameplay_cs),
            GameMode::Touch => utils::touch_cs_to_scale(difficulty.gameplay_cs),
        };

        let (position, start_time, sound) = (self.position, self.start_time, self.sound);

        if let HitObjectKind::Slider(slider) = &mut self.kind {
            build_nested(slider, position, start_time, sound, control_points, difficulty);

            for nested in &mut slider.nested {
                nested.apply_defaults(control_points, difficulty, mode, token)?;
            }
        }

        Ok(())
    }

    /// Assign the sample bank and volume in effect at this object's start
    /// time, falling back to the given map-wide default bank.
    pub fn apply_samples(&mut self, control_points: &BeatmapControlPoints, default_bank: SampleBank) {
        match control_points.sample_point_at(self.start_time) {
            Some(point) => {
                self.sample_bank = point.bank;
                self.sample_volume = point.volume;
            }
            None => self.sample_bank = default_bank,
        }

        if let HitObjectKind::Slider(slider) = &mut self.kind {
            for nested in &mut slider.nested {
                nested.apply_samples(control_points, default_bank);
            }
        }
    }
}

/// Build a slider's nested objects (head, ticks, repeats, tail) from the
/// timing in effect at its start time.
fn build_nested(
    slider: &mut Slider,
    head_position: Position,
    start_time: f64,
    sound: u32,
    control_points: &BeatmapControlPoints,
    difficulty: &BeatmapDifficulty,
) {
    slider.nested.clear();

    let timing = control_points.timing_point_at(start_time);
    let speed_multiplier = control_points.speed_multiplier_at(start_time);

    // osu!pixels per millisecond
    let velocity =
        BASE_SCORING_DISTANCE * difficulty.slider_multiplier * speed_multiplier / timing.beat_length;
    let span_duration = if velocity > 0.0 {
        slider.pixel_length / velocity
    } else {
        0.0
    };
    let span_count = slider.span_count.max(1) as usize;

    slider.end_time = start_time + span_duration * span_count as f64;

    let path = SliderPath::new(head_position, &slider.curve_points);
    let mut nested = Vec::new();

    // Head
    nested.push(nested_circle(head_position, start_time, sound));

    // Ticks within each span
    let tick_interval = timing.beat_length / difficulty.slider_tick_rate.max(0.1);
    for span in 0..span_count {
        let span_start = start_time + span_duration * span as f64;
        let mut t = tick_interval;
        while t < span_duration - TICK_CUTOFF {
            let distance = if span % 2 == 0 {
                velocity * t
            } else {
                slider.pixel_length - velocity * t
            };
            nested.push(nested_circle(path.position_at(distance), span_start + t, sound));
            t += tick_interval;
        }

        // Repeat arrow at the end of every span except the last
        if span + 1 < span_count {
            let position = if span % 2 == 0 {
                path.position_at(slider.pixel_length)
            } else {
                head_position
            };
            nested.push(nested_circle(position, span_start + span_duration, sound));
        }
    }

    // Tail
    let tail_position = if span_count % 2 == 1 {
        path.position_at(slider.pixel_length)
    } else {
        head_position
    };
    nested.push(nested_circle(tail_position, slider.end_time, sound));

    nested.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
    slider.nested = nested;
}

fn nested_circle(position: Position, time: f64, sound: u32) -> HitObject {
    HitObject::new(position, time, false, sound, HitObjectKind::Circle)
}

/// A slider path approximated as a polyline through its control points.
struct SliderPath {
    vertices: Vec<Position>,
    /// Cumulative distance at each vertex
    lengths: Vec<f64>,
}

impl SliderPath {
    fn new(head: Position, curve_points: &[Position]) -> Self {
        let mut vertices = Vec::with_capacity(curve_points.len() + 1);
        vertices.push(head);
        vertices.extend_from_slice(curve_points);

        let mut lengths = Vec::with_capacity(vertices.len());
        let mut total = 0.0;
        lengths.push(0.0);
        for i in 1..vertices.len() {
            total += vertices[i - 1].distance(vertices[i]) as f64;
            lengths.push(total);
        }

        Self { vertices, lengths }
    }

    /// Position at `distance` osu!pixels along the path, clamped to its
    /// endpoints.
    fn position_at(&self, distance: f64) -> Position {
        let total = *self.lengths.last().unwrap_or(&0.0);
        if total <= 0.0 || distance <= 0.0 {
            return self.vertices[0];
        }
        let distance = distance.min(total);

        let i = self.lengths.partition_point(|&l| l < distance);
        if i == 0 {
            return self.vertices[0];
        }
        if i >= self.vertices.len() {
            return *self.vertices.last().unwrap_or(&self.vertices[0]);
        }

        let segment = self.lengths[i] - self.lengths[i - 1];
        let fraction = if segment > 0.0 {
            ((distance - self.lengths[i - 1]) / segment) as f32
        } else {
            0.0
        };
        let a = self.vertices[i - 1];
        let b = self.vertices[i];
        Position::new(a.x + (b.x - a.x) * fraction, a.y + (b.y - a.y) * fraction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beatmap::control_points::TimingControlPoint;

    fn control_points() -> BeatmapControlPoints {
        BeatmapControlPoints {
            timing_points: vec![TimingControlPoint {
                time: 0.0,
                beat_length: 500.0,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_circle_defaults() {
        let mut difficulty = BeatmapDifficulty::default();
        difficulty.set_ar(9.0);

        let mut object = HitObject::new(
            Position::new(100.0, 100.0),
            1000.0,
            true,
            0,
            HitObjectKind::Circle,
        );
        object
            .apply_defaults(&control_points(), &difficulty, GameMode::Standard, None)
            .unwrap();

        assert!((object.time_preempt - 600.0).abs() < 1e-9);
        assert!(object.time_fade_in > 0.0);
        assert!(object.scale > 0.0);
    }

    #[test]
    fn test_slider_nested_has_head_and_tail() {
        let difficulty = BeatmapDifficulty::default();
        let mut object = HitObject::new(
            Position::new(0.0, 0.0),
            0.0,
            true,
            0,
            HitObjectKind::Slider(Slider {
                span_count: 2,
                pixel_length: 200.0,
                curve_points: vec![Position::new(200.0, 0.0)],
                ..Default::default()
            }),
        );
        object
            .apply_defaults(&control_points(), &difficulty, GameMode::Standard, None)
            .unwrap();

        let HitObjectKind::Slider(slider) = &object.kind else {
            panic!("not a slider");
        };
        assert!(slider.nested.len() >= 3, "head, repeat and tail at minimum");
        assert_eq!(slider.nested.first().unwrap().start_time, 0.0);
        assert_eq!(slider.nested.last().unwrap().start_time, slider.end_time);
        // Even span count returns the ball to the head
        assert_eq!(slider.nested.last().unwrap().position, object.position);
        assert!(slider.end_time > 0.0);
    }

    #[test]
    fn test_defaults_are_idempotent() {
        let difficulty = BeatmapDifficulty::default();
        let mut object = HitObject::new(
            Position::new(0.0, 0.0),
            0.0,
            false,
            0,
            HitObjectKind::Slider(Slider {
                span_count: 1,
                pixel_length: 300.0,
                curve_points: vec![Position::new(300.0, 0.0)],
                ..Default::default()
            }),
        );
        let points = control_points();
        object
            .apply_defaults(&points, &difficulty, GameMode::Standard, None)
            .unwrap();
        let first = object.combo_length();
        object
            .apply_defaults(&points, &difficulty, GameMode::Standard, None)
            .unwrap();
        assert_eq!(object.combo_length(), first);
    }

    #[test]
    fn test_cancelled_defaults_abort() {
        let token = CancellationToken::new();
        token.cancel();

        let difficulty = BeatmapDifficulty::default();
        let mut object = HitObject::new(Position::default(), 0.0, false, 0, HitObjectKind::Circle);
        let result =
            object.apply_defaults(&control_points(), &difficulty, GameMode::Standard, Some(&token));
        assert!(result.is_err());
    }
}
