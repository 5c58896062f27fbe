//! Synthetic accelerometer source.
//!
//! Substitutes for real hardware when the sensor is absent or permission was
//! denied. Produces walking-like noise: a gravity baseline with a footfall
//! impulse every stride interval plus small jitter, on the y axis like a
//! phone riding upright in a pocket.

use crate::source::types::AccelSample;
use crate::source::{SampleSource, SourceError};
use crossbeam_channel::{bounded, Receiver, Sender};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Shape of the generated signal.
#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    /// Tick interval between emitted samples.
    pub sample_period: Duration,
    /// Time between simulated footfalls.
    pub step_interval_ms: u64,
    /// Resting magnitude (gravity).
    pub baseline: f64,
    /// Impulse height above baseline at each footfall.
    pub impulse: f64,
    /// Uniform jitter applied to every axis reading.
    pub jitter: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            sample_period: Duration::from_millis(100),
            step_interval_ms: 550,
            baseline: 9.8,
            impulse: 3.5,
            jitter: 0.25,
        }
    }
}

/// A timer-thread source that never touches hardware.
pub struct SyntheticSource {
    config: SyntheticConfig,
    sender: Sender<AccelSample>,
    receiver: Receiver<AccelSample>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl SyntheticSource {
    pub fn new(config: SyntheticConfig) -> Self {
        let (sender, receiver) = bounded(10_000);
        Self {
            config,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        }
    }
}

impl SampleSource for SyntheticSource {
    fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let config = self.config.clone();

        let handle = thread::spawn(move || {
            let origin = Instant::now();
            let mut rng = rand::thread_rng();
            let jitter = config.jitter.abs();
            let noise = move |rng: &mut rand::rngs::ThreadRng| {
                if jitter > 0.0 {
                    rng.gen_range(-jitter..jitter)
                } else {
                    0.0
                }
            };

            while running.load(Ordering::SeqCst) {
                let elapsed_ms = origin.elapsed().as_millis() as u64;
                let period_ms = config.sample_period.as_millis() as u64;

                // One impulse sample per stride interval, quiet otherwise.
                let in_footfall = elapsed_ms % config.step_interval_ms.max(1) < period_ms;
                let mut y = config.baseline + noise(&mut rng);
                if in_footfall {
                    y += config.impulse + noise(&mut rng);
                }
                let x = noise(&mut rng);
                let z = noise(&mut rng);

                // Dropping on a full channel is fine: the consumer is gone or
                // stalled and stale samples have no value.
                let _ = sender.try_send(AccelSample::new(x, y, z, elapsed_ms));

                thread::sleep(config.sample_period);
            }
        });

        self.thread_handle = Some(handle);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn receiver(&self) -> &Receiver<AccelSample> {
        &self.receiver
    }
}

impl Drop for SyntheticSource {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_produces_monotonic_finite_samples() {
        let mut source = SyntheticSource::new(SyntheticConfig {
            sample_period: Duration::from_millis(10),
            ..SyntheticConfig::default()
        });
        source.start().unwrap();

        let mut samples = Vec::new();
        for _ in 0..5 {
            let sample = source
                .receiver()
                .recv_timeout(Duration::from_secs(2))
                .expect("synthetic source should emit samples");
            samples.push(sample);
        }
        source.stop();
        assert!(!source.is_running());

        for pair in samples.windows(2) {
            assert!(pair[1].timestamp_ms >= pair[0].timestamp_ms);
        }
        for sample in &samples {
            assert!(sample.is_finite());
            assert!(sample.magnitude() > 0.0);
        }
    }

    #[test]
    fn test_start_twice_errors() {
        let mut source = SyntheticSource::new(SyntheticConfig::default());
        source.start().unwrap();
        assert!(matches!(source.start(), Err(SourceError::AlreadyRunning)));
        source.stop();
    }
}
