//! Stride Sensor Agent - real-time step detection and activity tracking.
//!
//! This library turns a live stream of 3-axis accelerometer samples into
//! step counts, distance, calories, cadence, and an activity classification
//! (idle/walking/jogging/running), with noise filtering and adaptive
//! thresholding.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Stride Sensor Agent                      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │   Source    │──▶│   Engine    │──▶│  Snapshot   │       │
//! │  │ (IIO/synth) │   │ (detector)  │   │ (aggregate) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │         │                                    │              │
//! │         ▼                                    ▼              │
//! │  ┌─────────────┐                     ┌─────────────┐       │
//! │  │ Permission  │                     │ Daily sync  │       │
//! │  │   probe     │                     │  (upsert)   │       │
//! │  └─────────────┘                     └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Samples are processed one at a time in arrival order; the aggregate state
//! is replaced as a whole on every confirmed step and exposed to consumers by
//! value. When no accelerometer is readable the agent degrades to a synthetic
//! walking-noise source so the rest of the system keeps functioning.
//!
//! # Example
//!
//! ```no_run
//! use stride_sensor_agent::session::{SessionConfig, TrackingSession};
//!
//! let mut session = TrackingSession::start(SessionConfig::default())
//!     .expect("failed to start tracking");
//!
//! let updates = session.subscribe();
//! for snapshot in updates.iter().take(10) {
//!     println!("{} steps, {:.1} m", snapshot.steps, snapshot.distance_m);
//! }
//! session.stop();
//! ```

pub mod config;
pub mod engine;
pub mod session;
pub mod source;
pub mod sync;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError, SyncSettings, UserProfile};
pub use engine::{ActivityType, DetectorConfig, StepDetector, StepSnapshot, StepTracker};
pub use session::{SessionConfig, SessionError, TrackingSession};
pub use source::{
    check_permission, AccelSample, InvalidSampleError, PermissionStatus, SampleSource,
    SyntheticConfig, SyntheticSource,
};
pub use sync::{DailySummary, SyncConfig, SyncError};

#[cfg(feature = "sync")]
pub use sync::{BlockingSummaryClient, SummaryClient};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
