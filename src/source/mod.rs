//! Accelerometer sample sources.
//!
//! Two implementations of one [`SampleSource`] interface: a Linux IIO sysfs
//! reader for real hardware and a synthetic walking-noise generator used when
//! no sensor is available or permission was denied. The choice is made once,
//! at construction time, by [`select_source`].

pub mod synthetic;
pub mod types;

#[cfg(target_os = "linux")]
pub mod iio;

pub use synthetic::{SyntheticConfig, SyntheticSource};
pub use types::{AccelSample, InvalidSampleError};

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};

/// Outcome of the motion-sensor permission probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    /// Sensor present and readable.
    Granted,
    /// Sensor present but access was refused.
    Denied,
    /// No sensor on this machine or platform.
    Unavailable,
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionStatus::Granted => write!(f, "granted"),
            PermissionStatus::Denied => write!(f, "denied"),
            PermissionStatus::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// Errors that can occur while starting or running a sample source.
#[derive(Debug)]
pub enum SourceError {
    AlreadyRunning,
    PermissionDenied,
    DeviceUnavailable(String),
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::AlreadyRunning => write!(f, "source is already running"),
            SourceError::PermissionDenied => write!(f, "motion sensor access denied"),
            SourceError::DeviceUnavailable(detail) => {
                write!(f, "motion sensor unavailable: {detail}")
            }
        }
    }
}

impl std::error::Error for SourceError {}

/// A stream of accelerometer samples delivered over a channel.
///
/// Implementations produce on their own thread; `stop` must make the thread
/// exit and is safe to call at any time, including when never started.
pub trait SampleSource: Send {
    fn start(&mut self) -> Result<(), SourceError>;
    fn stop(&mut self);
    fn is_running(&self) -> bool;
    fn receiver(&self) -> &Receiver<AccelSample>;
}

/// Probe whether a real accelerometer can be read.
pub fn check_permission() -> PermissionStatus {
    #[cfg(target_os = "linux")]
    {
        iio::probe_permission()
    }
    #[cfg(not(target_os = "linux"))]
    {
        PermissionStatus::Unavailable
    }
}

/// Pick a source for a tracking session.
///
/// The real sensor is used only when it is readable and the caller did not
/// force simulation; every other case falls back to the synthetic generator
/// so tracking keeps producing state updates.
pub fn select_source(
    prefer_synthetic: bool,
    synthetic: SyntheticConfig,
) -> (Box<dyn SampleSource>, PermissionStatus) {
    let permission = check_permission();

    if !prefer_synthetic && permission == PermissionStatus::Granted {
        #[cfg(target_os = "linux")]
        match iio::IioSource::new() {
            Ok(source) => return (Box::new(source), permission),
            Err(e) => {
                tracing::warn!("real sensor rejected at open, falling back to synthetic: {e}");
            }
        }
    }

    (Box::new(SyntheticSource::new(synthetic)), permission)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_status_display() {
        assert_eq!(PermissionStatus::Granted.to_string(), "granted");
        assert_eq!(PermissionStatus::Denied.to_string(), "denied");
        assert_eq!(PermissionStatus::Unavailable.to_string(), "unavailable");
    }

    #[test]
    fn test_select_source_forced_synthetic() {
        let (mut source, _permission) = select_source(true, SyntheticConfig::default());
        assert!(!source.is_running());
        source.stop();
    }
}
