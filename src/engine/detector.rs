//! Step detection over a filtered accelerometer stream.
//!
//! Each accepted sample passes through one of three phases: *reset-pending*
//! when the gap since the last confirmed step says the walker stopped,
//! *cooldown* when a step was confirmed too recently for another to be
//! plausible, and *candidate* where the smoothed magnitude is tested against
//! the adaptive threshold, a strict local-maximum window, and a fraction of
//! the previous peak.

use crate::engine::calibration::{ThresholdCalibrator, CALIBRATION_INTERVAL};
use crate::engine::filter::{self, SMOOTHING_ALPHA, SMOOTHING_WINDOW};
use crate::source::types::{AccelSample, InvalidSampleError};
use std::collections::VecDeque;

/// Tunables for the peak-detection state machine.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum time between steps; caps plausible cadence at 240 steps/min.
    pub min_step_interval_ms: u64,
    /// Gap after which smoothing and peak memory are discarded.
    pub max_step_interval_ms: u64,
    /// Raw samples retained for calibration statistics.
    pub history_capacity: usize,
    /// Prior high-pass magnitudes a candidate must strictly exceed.
    pub local_max_window: usize,
    /// A candidate must reach this fraction of the previous confirmed peak.
    pub peak_retention_ratio: f64,
    /// Step timestamps retained for cadence.
    pub step_log_capacity: usize,
    /// Most recent step timestamps considered by the pace computation.
    pub pace_window: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_step_interval_ms: 250,
            max_step_interval_ms: 2000,
            history_capacity: 100,
            local_max_window: 2,
            peak_retention_ratio: 0.7,
            step_log_capacity: 20,
            pace_window: 10,
        }
    }
}

/// A confirmed footfall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepEvent {
    pub timestamp_ms: u64,
    /// Smoothed high-pass magnitude at confirmation.
    pub peak_magnitude: f64,
}

pub struct StepDetector {
    config: DetectorConfig,
    calibrator: ThresholdCalibrator,

    history: VecDeque<AccelSample>,
    smoothing: VecDeque<f64>,
    recent_highpass: VecDeque<f64>,
    step_log: VecDeque<u64>,

    last_timestamp_ms: Option<u64>,
    last_step_ms: u64,
    last_peak: f64,
    samples_accepted: usize,
}

impl StepDetector {
    pub fn new(config: DetectorConfig) -> Self {
        let history_capacity = config.history_capacity;
        let step_log_capacity = config.step_log_capacity;
        Self {
            config,
            calibrator: ThresholdCalibrator::new(),
            history: VecDeque::with_capacity(history_capacity),
            smoothing: VecDeque::with_capacity(SMOOTHING_WINDOW),
            recent_highpass: VecDeque::with_capacity(4),
            step_log: VecDeque::with_capacity(step_log_capacity),
            last_timestamp_ms: None,
            last_step_ms: 0,
            last_peak: 0.0,
            samples_accepted: 0,
        }
    }

    /// Feed one sample. Returns a [`StepEvent`] when a footfall is confirmed.
    ///
    /// Malformed samples (non-finite axes, timestamp going backwards) are
    /// rejected without touching any state.
    pub fn process(&mut self, sample: AccelSample) -> Result<Option<StepEvent>, InvalidSampleError> {
        if !sample.is_finite() {
            return Err(InvalidSampleError::NonFinite);
        }
        if let Some(last_ms) = self.last_timestamp_ms {
            if sample.timestamp_ms < last_ms {
                return Err(InvalidSampleError::OutOfOrder {
                    last_ms,
                    timestamp_ms: sample.timestamp_ms,
                });
            }
        }
        self.last_timestamp_ms = Some(sample.timestamp_ms);

        self.history.push_back(sample);
        if self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }

        self.calibrator.observe_sample();
        self.samples_accepted += 1;
        if self.samples_accepted % CALIBRATION_INTERVAL == 0 {
            let magnitudes: Vec<f64> = self.history.iter().map(AccelSample::magnitude).collect();
            self.calibrator.recalibrate(&magnitudes);
        }

        Ok(self.detect(sample.magnitude(), sample.timestamp_ms))
    }

    fn detect(&mut self, magnitude: f64, timestamp_ms: u64) -> Option<StepEvent> {
        // Reset-pending: the walker stopped; a fresh gait gets fresh memory.
        if self.last_step_ms != 0
            && timestamp_ms.saturating_sub(self.last_step_ms) > self.config.max_step_interval_ms
        {
            self.smoothing.clear();
            self.recent_highpass.clear();
            self.last_peak = 0.0;
            self.last_step_ms = 0;
        }

        let highpass = filter::high_pass(magnitude, self.calibrator.baseline());

        // Cooldown: too soon after the last step. The smoothing window does
        // not advance, so the rejected impulse cannot drag later estimates.
        if self.last_step_ms != 0
            && timestamp_ms.saturating_sub(self.last_step_ms) < self.config.min_step_interval_ms
        {
            self.push_highpass(highpass);
            return None;
        }

        self.smoothing.push_back(highpass);
        if self.smoothing.len() > SMOOTHING_WINDOW {
            self.smoothing.pop_front();
        }
        let smoothed = filter::low_pass(&self.smoothing, SMOOTHING_ALPHA);

        let confirmed = self.is_peak(smoothed);
        self.push_highpass(highpass);

        if !confirmed {
            return None;
        }

        self.last_peak = smoothed;
        self.last_step_ms = timestamp_ms;
        self.step_log.push_back(timestamp_ms);
        if self.step_log.len() > self.config.step_log_capacity {
            self.step_log.pop_front();
        }

        Some(StepEvent {
            timestamp_ms,
            peak_magnitude: smoothed,
        })
    }

    fn is_peak(&self, smoothed: f64) -> bool {
        if smoothed <= self.calibrator.threshold() {
            return false;
        }

        // Strict local maximum against the prior raw high-pass values; with
        // too little context nothing can be called a peak.
        if self.recent_highpass.len() < self.config.local_max_window {
            return false;
        }
        let local_max = self
            .recent_highpass
            .iter()
            .rev()
            .take(self.config.local_max_window)
            .all(|&prior| smoothed > prior);
        if !local_max {
            return false;
        }

        // Residual vibration after a real step produces shrinking echoes; a
        // genuine next step lands near the previous peak's height.
        self.last_peak == 0.0 || smoothed >= self.config.peak_retention_ratio * self.last_peak
    }

    fn push_highpass(&mut self, highpass: f64) {
        self.recent_highpass.push_back(highpass);
        if self.recent_highpass.len() > 4 {
            self.recent_highpass.pop_front();
        }
    }

    /// Cadence in steps per minute over the most recent logged steps.
    ///
    /// Zero with fewer than two logged steps or a zero span.
    pub fn pace_steps_per_minute(&self) -> f64 {
        if self.step_log.len() < 2 {
            return 0.0;
        }
        let skip = self.step_log.len().saturating_sub(self.config.pace_window);
        let recent: Vec<u64> = self.step_log.iter().skip(skip).copied().collect();

        let oldest = recent[0];
        let newest = recent[recent.len() - 1];
        let span_minutes = (newest - oldest) as f64 / 1000.0 / 60.0;
        if span_minutes > 0.0 {
            recent.len() as f64 / span_minutes
        } else {
            0.0
        }
    }

    pub fn threshold(&self) -> f64 {
        self.calibrator.threshold()
    }

    pub fn baseline(&self) -> f64 {
        self.calibrator.baseline()
    }

    /// Full reinitialization: buffers, calibration, and peak memory.
    pub fn reset(&mut self) {
        self.history.clear();
        self.smoothing.clear();
        self.recent_highpass.clear();
        self.step_log.clear();
        self.calibrator.reset();
        self.last_timestamp_ms = None;
        self.last_step_ms = 0;
        self.last_peak = 0.0;
        self.samples_accepted = 0;
    }
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}
