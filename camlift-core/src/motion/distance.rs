//! Physical distance to step count conversion

/// Convert a travel distance in inches to whole motor steps
///
/// Rounds to the nearest step. Truncating would lose up to a step on every
/// move and the lift would drift after repeated level changes.
/// Non-positive or non-finite inputs give zero.
pub fn inches_to_steps(inches: f32, steps_per_inch: f32) -> u32 {
    let steps = inches * steps_per_inch;
    if !steps.is_finite() || steps <= 0.0 {
        return 0;
    }
    if steps >= u32::MAX as f32 {
        return u32::MAX;
    }
    libm::roundf(steps) as u32
}

/// Convert a step count back to inches
pub fn steps_to_inches(steps: i32, steps_per_inch: f32) -> f32 {
    if steps_per_inch <= 0.0 {
        return 0.0;
    }
    steps as f32 / steps_per_inch
}
