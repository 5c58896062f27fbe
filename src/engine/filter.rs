//! Magnitude computation and noise filtering.
//!
//! Two stages: a high-pass that removes the gravity baseline so the signal
//! rests near zero, then an exponential low-pass across a short window that
//! suppresses jitter while keeping the shape of footfall impulses. Both are
//! pure given their inputs.

use std::collections::VecDeque;

/// Smoothing factor for the exponential low-pass.
pub const SMOOTHING_ALPHA: f64 = 0.85;

/// Capacity of the smoothing window.
pub const SMOOTHING_WINDOW: usize = 5;

/// Euclidean norm of a 3-axis acceleration vector.
pub fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Remove the gravity baseline, leaving deviation magnitude.
pub fn high_pass(magnitude: f64, baseline: f64) -> f64 {
    (magnitude - baseline).abs()
}

/// Exponential low-pass folded across the window, seeded with its first value.
///
/// `filtered[i] = alpha * raw[i] + (1 - alpha) * filtered[i-1]`
pub fn low_pass(window: &VecDeque<f64>, alpha: f64) -> f64 {
    let mut values = window.iter();
    let first = match values.next() {
        Some(v) => *v,
        None => return 0.0,
    };
    values.fold(first, |acc, &v| alpha * v + (1.0 - alpha) * acc)
}
