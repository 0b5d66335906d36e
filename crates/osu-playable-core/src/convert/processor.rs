//! Map-level pre/post processing hooks

use crate::beatmap::{Beatmap, HitObjectKind};
use crate::cancel::{self, CancellationToken};
use crate::error::Result;

/// Objects whose centers are within this many osu!pixels form a stack
const STACK_DISTANCE: f32 = 3.0;

/// Runs the map-level hooks around hit object defaulting.
///
/// Pre-processing normalizes combo state; post-processing assigns stack
/// levels, which depends on the pre-empt values defaulting just computed.
pub struct BeatmapProcessor<'a> {
    token: Option<&'a CancellationToken>,
}

impl<'a> BeatmapProcessor<'a> {
    pub fn new(token: Option<&'a CancellationToken>) -> Self {
        Self { token }
    }

    /// Hook run before hit object defaulting
    pub fn pre_process(&self, beatmap: &mut Beatmap) -> Result<()> {
        cancel::checkpoint(self.token)?;

        // The first object always opens a combo, whatever the file says.
        if let Some(first) = beatmap.hit_objects.first_mut() {
            first.new_combo = true;
        }

        Ok(())
    }

    /// Hook run after hit object defaulting.
    ///
    /// Assigns stack levels: an object sitting on top of a later object
    /// within its approach window leans one level further back, so
    /// overlapping notes fan out instead of hiding each other.
    pub fn post_process(&self, beatmap: &mut Beatmap) -> Result<()> {
        cancel::checkpoint(self.token)?;

        let stack_leniency = beatmap.general.stack_leniency as f64;
        let objects = &mut beatmap.hit_objects;

        for object in objects.iter_mut() {
            object.stack_height = 0;
        }

        for i in (0..objects.len().saturating_sub(1)).rev() {
            cancel::checkpoint(self.token)?;

            let (head, tail) = objects.split_at_mut(i + 1);
            let current = &mut head[i];
            let next = &tail[0];

            if matches!(current.kind, HitObjectKind::Spinner { .. })
                || matches!(next.kind, HitObjectKind::Spinner { .. })
            {
                continue;
            }

            let window = next.time_preempt * stack_leniency;
            if next.start_time - current.end_time() <= window
                && current.position.distance(next.position) < STACK_DISTANCE
            {
                current.stack_height = next.stack_height + 1;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::beatmap::{GameMode, HitObject, Position};

    fn circle(x: f32, time: f64) -> HitObject {
        let mut object = HitObject::new(
            Position::new(x, 100.0),
            time,
            false,
            0,
            HitObjectKind::Circle,
        );
        object.time_preempt = 600.0;
        object.scale = 0.5;
        object
    }

    #[test]
    fn test_pre_process_forces_first_new_combo() {
        let mut beatmap = Beatmap::new(GameMode::Standard);
        beatmap.hit_objects.push(circle(100.0, 0.0));
        assert!(!beatmap.hit_objects[0].new_combo);

        BeatmapProcessor::new(None).pre_process(&mut beatmap).unwrap();
        assert!(beatmap.hit_objects[0].new_combo);
    }

    #[test]
    fn test_post_process_stacks_overlapping_objects() {
        let mut beatmap = Beatmap::new(GameMode::Standard);
        beatmap.hit_objects.push(circle(100.0, 0.0));
        beatmap.hit_objects.push(circle(100.0, 100.0));
        beatmap.hit_objects.push(circle(100.0, 200.0));
        // Far away in position: not part of the stack
        beatmap.hit_objects.push(circle(300.0, 300.0));

        BeatmapProcessor::new(None).post_process(&mut beatmap).unwrap();

        assert_eq!(beatmap.hit_objects[0].stack_height, 2);
        assert_eq!(beatmap.hit_objects[1].stack_height, 1);
        assert_eq!(beatmap.hit_objects[2].stack_height, 0);
        assert_eq!(beatmap.hit_objects[3].stack_height, 0);

        // The stack offset actually moves the rendered position
        let base = beatmap.hit_objects[2].stacked_position();
        let stacked = beatmap.hit_objects[0].stacked_position();
        assert_ne!(base, stacked);
    }

    #[test]
    fn test_post_process_ignores_distant_times() {
        let mut beatmap = Beatmap::new(GameMode::Standard);
        beatmap.hit_objects.push(circle(100.0, 0.0));
        // Same position, but far outside the approach window
        beatmap.hit_objects.push(circle(100.0, 10_000.0));

        BeatmapProcessor::new(None).post_process(&mut beatmap).unwrap();
        assert_eq!(beatmap.hit_objects[0].stack_height, 0);
    }
}
