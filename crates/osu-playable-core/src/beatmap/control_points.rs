//! Timing, velocity and sample control points

use serde::{Deserialize, Serialize};

/// Sample bank used for hit sounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleBank {
    #[default]
    Normal,
    Soft,
    Drum,
}

impl SampleBank {
    /// Map the file format's integer bank id. Unknown ids fall back to
    /// the normal bank, like `0` ("auto") does.
    pub fn from_id(id: i32) -> Self {
        match id {
            2 => Self::Soft,
            3 => Self::Drum,
            _ => Self::Normal,
        }
    }
}

/// An uninherited timing point establishing the beat length
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingControlPoint {
    /// Time in milliseconds this point takes effect
    pub time: f64,
    /// Milliseconds per beat
    pub beat_length: f64,
}

impl TimingControlPoint {
    /// Beats per minute at this point
    pub fn bpm(&self) -> f64 {
        60_000.0 / self.beat_length
    }
}

/// An inherited point scaling slider velocity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DifficultyControlPoint {
    pub time: f64,
    /// Multiplier applied to the base slider velocity
    pub speed_multiplier: f64,
}

/// A point switching the active sample bank and volume
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleControlPoint {
    pub time: f64,
    pub bank: SampleBank,
    /// Sample volume percentage (0 - 100)
    pub volume: i32,
}

/// All control points of a beatmap, each list ordered by time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeatmapControlPoints {
    pub timing_points: Vec<TimingControlPoint>,
    pub difficulty_points: Vec<DifficultyControlPoint>,
    pub sample_points: Vec<SampleControlPoint>,
}

/// Index of the last point at or before `time`, if any.
fn active_index<T>(points: &[T], time: f64, point_time: impl Fn(&T) -> f64) -> Option<usize> {
    match points.partition_point(|p| point_time(p) <= time) {
        0 => None,
        n => Some(n - 1),
    }
}

impl BeatmapControlPoints {
    /// The timing point in effect at `time`. Falls back to the first
    /// timing point (or a 120 BPM default) when `time` precedes them all.
    pub fn timing_point_at(&self, time: f64) -> TimingControlPoint {
        active_index(&self.timing_points, time, |p| p.time)
            .map(|i| self.timing_points[i].clone())
            .or_else(|| self.timing_points.first().cloned())
            .unwrap_or(TimingControlPoint {
                time: 0.0,
                beat_length: 500.0,
            })
    }

    /// The slider velocity multiplier in effect at `time` (1.0 when no
    /// inherited point applies).
    pub fn speed_multiplier_at(&self, time: f64) -> f64 {
        active_index(&self.difficulty_points, time, |p| p.time)
            .map(|i| self.difficulty_points[i].speed_multiplier)
            .unwrap_or(1.0)
    }

    /// The sample point in effect at `time`, if any point precedes it.
    pub fn sample_point_at(&self, time: f64) -> Option<&SampleControlPoint> {
        active_index(&self.sample_points, time, |p| p.time).map(|i| &self.sample_points[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> BeatmapControlPoints {
        BeatmapControlPoints {
            timing_points: vec![
                TimingControlPoint {
                    time: 1000.0,
                    beat_length: 500.0,
                },
                TimingControlPoint {
                    time: 5000.0,
                    beat_length: 300.0,
                },
            ],
            difficulty_points: vec![DifficultyControlPoint {
                time: 2000.0,
                speed_multiplier: 2.0,
            }],
            sample_points: vec![SampleControlPoint {
                time: 1000.0,
                bank: SampleBank::Soft,
                volume: 80,
            }],
        }
    }

    #[test]
    fn test_timing_point_lookup() {
        let points = points();
        assert_eq!(points.timing_point_at(1000.0).beat_length, 500.0);
        assert_eq!(points.timing_point_at(4999.0).beat_length, 500.0);
        assert_eq!(points.timing_point_at(5000.0).beat_length, 300.0);
        assert_eq!(points.timing_point_at(60_000.0).beat_length, 300.0);
        // Before the first point, the first point still applies
        assert_eq!(points.timing_point_at(0.0).beat_length, 500.0);
    }

    #[test]
    fn test_speed_multiplier_lookup() {
        let points = points();
        assert_eq!(points.speed_multiplier_at(0.0), 1.0);
        assert_eq!(points.speed_multiplier_at(2000.0), 2.0);
    }

    #[test]
    fn test_empty_control_points_fall_back() {
        let points = BeatmapControlPoints::default();
        assert_eq!(points.timing_point_at(0.0).beat_length, 500.0);
        assert_eq!(points.speed_multiplier_at(0.0), 1.0);
        assert!(points.sample_point_at(0.0).is_none());
    }
}
