//! Tracking session lifecycle.
//!
//! A session wires a sample source to a [`StepTracker`] behind a single
//! worker thread: samples are processed to completion in arrival order, so
//! detector state is never mutated concurrently. The periodic daily-summary
//! upsert runs inside the same loop and never affects tracking when it fails.

use crate::config::{Config, SyncSettings, UserProfile};
use crate::engine::{StepSnapshot, StepTracker};
use crate::source::{
    select_source, AccelSample, PermissionStatus, SampleSource, SourceError, SyntheticConfig,
};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

#[cfg(feature = "sync")]
use crate::sync::{local_date, BlockingSummaryClient, DailySummary, SyncConfig};

/// Everything a session needs at construction.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub profile: UserProfile,
    /// Skip the permission probe outcome and always simulate.
    pub prefer_synthetic: bool,
    /// Interval between daily-summary upserts.
    pub persist_interval: Duration,
    /// IANA timezone for the summary date.
    pub timezone: String,
    /// Backend sync settings; summaries stay local when absent.
    pub sync: Option<SyncSettings>,
    /// Shape of the synthetic fallback signal.
    pub synthetic: SyntheticConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profile: UserProfile::default(),
            prefer_synthetic: false,
            persist_interval: Duration::from_secs(30),
            timezone: "UTC".to_string(),
            sync: None,
            synthetic: SyntheticConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Derive a session config from the persisted agent configuration.
    pub fn from_config(config: &Config, prefer_synthetic: bool) -> Self {
        Self {
            profile: config.profile,
            prefer_synthetic,
            persist_interval: config.persist_interval,
            timezone: config.timezone.clone(),
            sync: config.sync.clone(),
            synthetic: SyntheticConfig::default(),
        }
    }
}

/// Errors that prevent a session from starting.
#[derive(Debug)]
pub enum SessionError {
    Source(SourceError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Source(e) => write!(f, "failed to start sample source: {e}"),
        }
    }
}

impl std::error::Error for SessionError {}

#[cfg(feature = "sync")]
struct SyncTask {
    client: BlockingSummaryClient,
    user_id: String,
    timezone: String,
    interval: Duration,
}

/// A running tracking session.
pub struct TrackingSession {
    tracker: Arc<Mutex<StepTracker>>,
    source: Box<dyn SampleSource>,
    receiver: Receiver<AccelSample>,
    permission: PermissionStatus,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl TrackingSession {
    /// Probe permission, select a source, and begin processing samples.
    ///
    /// Permission denial is not an error: the session reports the status and
    /// tracks against synthetic samples instead.
    pub fn start(config: SessionConfig) -> Result<Self, SessionError> {
        let (mut source, permission) =
            select_source(config.prefer_synthetic, config.synthetic.clone());
        if permission == PermissionStatus::Denied {
            tracing::warn!("motion sensor permission denied, tracking with synthetic samples");
        }
        source.start().map_err(SessionError::Source)?;

        let tracker = Arc::new(Mutex::new(StepTracker::new(config.profile)));
        let running = Arc::new(AtomicBool::new(true));
        let receiver = source.receiver().clone();

        #[cfg(feature = "sync")]
        let sync_task = match &config.sync {
            Some(settings) => {
                match BlockingSummaryClient::new(SyncConfig::new(
                    settings.base_url.clone(),
                    settings.api_key.clone(),
                )) {
                    Ok(client) => Some(SyncTask {
                        client,
                        user_id: settings.user_id.clone(),
                        timezone: config.timezone.clone(),
                        interval: config.persist_interval,
                    }),
                    Err(e) => {
                        tracing::warn!("summary sync disabled: {e}");
                        None
                    }
                }
            }
            None => None,
        };

        let worker = {
            let receiver = receiver.clone();
            let tracker = tracker.clone();
            let running = running.clone();

            thread::spawn(move || {
                #[cfg(feature = "sync")]
                let mut last_persist = std::time::Instant::now();

                while running.load(Ordering::SeqCst) {
                    match receiver.recv_timeout(Duration::from_millis(100)) {
                        Ok(sample) => {
                            let mut guard = lock_tracker(&tracker);
                            if let Err(e) = guard.process(sample) {
                                tracing::warn!("dropping invalid sample: {e}");
                            }
                        }
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => break,
                    }

                    #[cfg(feature = "sync")]
                    if let Some(task) = sync_task.as_ref() {
                        if last_persist.elapsed() >= task.interval {
                            let snapshot = lock_tracker(&tracker).snapshot();
                            // Nothing to record before the first step.
                            if snapshot.steps > 0 {
                                let summary = DailySummary::from_snapshot(
                                    &task.user_id,
                                    &local_date(&task.timezone),
                                    &snapshot,
                                );
                                match task.client.upsert_summary(&summary) {
                                    Ok(()) => tracing::debug!(
                                        steps = summary.total_steps,
                                        "synced daily summary"
                                    ),
                                    Err(e) => tracing::warn!(
                                        "daily summary sync failed, retrying next tick: {e}"
                                    ),
                                }
                            }
                            last_persist = std::time::Instant::now();
                        }
                    }
                }
            })
        };

        Ok(Self {
            tracker,
            source,
            receiver,
            permission,
            running,
            worker: Some(worker),
        })
    }

    /// Current aggregate state, by value.
    pub fn state(&self) -> StepSnapshot {
        lock_tracker(&self.tracker).snapshot()
    }

    /// Register an observer fired on every aggregate update.
    pub fn subscribe(&self) -> Receiver<StepSnapshot> {
        lock_tracker(&self.tracker).subscribe()
    }

    /// Zero the aggregate and detector state; tracking keeps running.
    pub fn reset(&self) {
        lock_tracker(&self.tracker).reset();
    }

    /// Permission status resolved when the session started.
    pub fn permission(&self) -> PermissionStatus {
        self.permission
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Halt ingestion. Safe to call at any time and more than once; queued
    /// samples are discarded and none are processed afterwards. The aggregate
    /// state is retained.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.source.stop();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.stop();
    }
}

fn lock_tracker(tracker: &Arc<Mutex<StepTracker>>) -> std::sync::MutexGuard<'_, StepTracker> {
    tracker.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
