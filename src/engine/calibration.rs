//! Adaptive detection-threshold calibration.
//!
//! A fixed threshold fails across users, devices, and carry positions. The
//! calibrator periodically re-derives the threshold from recent magnitude
//! statistics, trading a short warm-up for long-run robustness. During
//! warm-up the gravity baseline also tracks the magnitude mean; once enough
//! samples have been seen it is considered converged and freezes.

use statrs::statistics::Statistics;

/// Recalibrate once per this many accepted samples.
pub const CALIBRATION_INTERVAL: usize = 10;

/// Skip recalibration below this many buffered magnitudes.
pub const MIN_CALIBRATION_SAMPLES: usize = 20;

/// Accepted samples after which the baseline stops auto-updating.
pub const BASELINE_CONVERGENCE_SAMPLES: u32 = 100;

/// Sigma multiplier in the threshold formula.
const THRESHOLD_SIGMA: f64 = 1.2;

/// Sane bounds for the threshold, preventing runaway sensitivity.
const THRESHOLD_FLOOR: f64 = 0.8;
const THRESHOLD_CEILING: f64 = 2.5;

const INITIAL_THRESHOLD: f64 = 1.2;
const INITIAL_BASELINE: f64 = 9.8;

#[derive(Debug, Clone)]
pub struct ThresholdCalibrator {
    threshold: f64,
    baseline: f64,
    calibration_samples: u32,
}

impl Default for ThresholdCalibrator {
    fn default() -> Self {
        Self::new()
    }
}

impl ThresholdCalibrator {
    pub fn new() -> Self {
        Self {
            threshold: INITIAL_THRESHOLD,
            baseline: INITIAL_BASELINE,
            calibration_samples: 0,
        }
    }

    /// Current detection threshold, always within the clamped range.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Current gravity-baseline estimate.
    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    /// Whether the baseline has converged and no longer auto-updates.
    pub fn is_converged(&self) -> bool {
        self.calibration_samples >= BASELINE_CONVERGENCE_SAMPLES
    }

    /// Count one accepted sample toward baseline convergence.
    pub fn observe_sample(&mut self) {
        if !self.is_converged() {
            self.calibration_samples += 1;
        }
    }

    /// Recompute threshold (and baseline, while warming up) from the buffered
    /// raw magnitudes. Fewer than [`MIN_CALIBRATION_SAMPLES`] values carry too
    /// little statistics and leave everything untouched.
    pub fn recalibrate(&mut self, magnitudes: &[f64]) {
        if magnitudes.len() < MIN_CALIBRATION_SAMPLES {
            return;
        }

        if !self.is_converged() {
            self.baseline = magnitudes.iter().mean();
        }

        // Threshold statistics run over the gravity-removed signal; on the
        // raw magnitudes the gravity mean alone would pin the threshold at
        // the ceiling.
        let highpass: Vec<f64> = magnitudes
            .iter()
            .map(|m| (m - self.baseline).abs())
            .collect();
        let mean = highpass.iter().mean();
        let std_dev = highpass.iter().population_std_dev();

        self.threshold =
            (mean + THRESHOLD_SIGMA * std_dev).clamp(THRESHOLD_FLOOR, THRESHOLD_CEILING);

        tracing::debug!(
            threshold = self.threshold,
            baseline = self.baseline,
            converged = self.is_converged(),
            "recalibrated detection threshold"
        );
    }

    /// Back to the initial, uncalibrated state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_initial_state() {
        let calibrator = ThresholdCalibrator::new();
        assert_relative_eq!(calibrator.threshold(), 1.2);
        assert_relative_eq!(calibrator.baseline(), 9.8);
        assert!(!calibrator.is_converged());
    }

    #[test]
    fn test_skips_below_minimum_samples() {
        let mut calibrator = ThresholdCalibrator::new();
        calibrator.recalibrate(&vec![12.0; MIN_CALIBRATION_SAMPLES - 1]);
        assert_relative_eq!(calibrator.threshold(), 1.2);
        assert_relative_eq!(calibrator.baseline(), 9.8);
    }

    #[test]
    fn test_quiet_signal_hits_threshold_floor() {
        let mut calibrator = ThresholdCalibrator::new();
        calibrator.recalibrate(&vec![9.8; 50]);
        assert_relative_eq!(calibrator.threshold(), 0.8);
        assert_relative_eq!(calibrator.baseline(), 9.8);
    }

    #[test]
    fn test_wild_signal_hits_threshold_ceiling() {
        let mut calibrator = ThresholdCalibrator::new();
        let mags: Vec<f64> = (0..50)
            .map(|i| if i % 2 == 0 { 2.0 } else { 22.0 })
            .collect();
        calibrator.recalibrate(&mags);
        assert_relative_eq!(calibrator.threshold(), 2.5);
    }

    #[test]
    fn test_baseline_tracks_mean_during_warmup() {
        let mut calibrator = ThresholdCalibrator::new();
        calibrator.recalibrate(&vec![10.5; 30]);
        assert_relative_eq!(calibrator.baseline(), 10.5);
    }

    #[test]
    fn test_baseline_freezes_after_convergence() {
        let mut calibrator = ThresholdCalibrator::new();
        calibrator.recalibrate(&vec![9.9; 30]);
        assert_relative_eq!(calibrator.baseline(), 9.9);

        for _ in 0..BASELINE_CONVERGENCE_SAMPLES {
            calibrator.observe_sample();
        }
        assert!(calibrator.is_converged());

        calibrator.recalibrate(&vec![11.4; 30]);
        assert_relative_eq!(calibrator.baseline(), 9.9);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut calibrator = ThresholdCalibrator::new();
        for _ in 0..BASELINE_CONVERGENCE_SAMPLES {
            calibrator.observe_sample();
        }
        calibrator.recalibrate(&vec![11.0; 40]);
        calibrator.reset();

        assert_relative_eq!(calibrator.threshold(), 1.2);
        assert_relative_eq!(calibrator.baseline(), 9.8);
        assert!(!calibrator.is_converged());
    }
}
