//! Circle size conversions shared by the ruleset converter and mods.
//!
//! Circle size is a 0-10 knob, but rulesets agree on object *scale*:
//! converting a map between rulesets preserves the perceived radius while
//! the numeric CS changes. Touch circles render at a larger base scale to
//! stay tappable on handheld displays.

/// Extra base scale applied to touchscreen circles
const TOUCH_SCALE_RATIO: f32 = 1.25;

/// Smallest usable object scale
const MIN_SCALE: f32 = 0.05;

/// Radius scale of a standard-ruleset circle at the given circle size
pub fn standard_cs_to_scale(cs: f32) -> f32 {
    ((1.0 - 0.7 * (cs - 5.0) / 5.0) / 2.0).max(MIN_SCALE)
}

/// Circle size whose standard-ruleset scale is `scale`
pub fn standard_scale_to_cs(scale: f32) -> f32 {
    5.0 + 5.0 * (1.0 - 2.0 * scale) / 0.7
}

/// Radius scale of a touch-ruleset circle at the given circle size
pub fn touch_cs_to_scale(cs: f32) -> f32 {
    standard_cs_to_scale(cs) * TOUCH_SCALE_RATIO
}

/// Circle size whose touch-ruleset scale is `scale`
pub fn touch_scale_to_cs(scale: f32) -> f32 {
    standard_scale_to_cs(scale / TOUCH_SCALE_RATIO)
}
