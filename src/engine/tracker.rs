//! The aggregate owner: detector plus externally visible step state.

use crate::config::UserProfile;
use crate::engine::activity::{self, ActivityType};
use crate::engine::detector::{DetectorConfig, StepDetector};
use crate::source::types::{AccelSample, InvalidSampleError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Externally visible step state.
///
/// Replaced as a whole on every confirmed step; consumers only ever hold
/// clones and cannot mutate the tracker through them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSnapshot {
    pub steps: u64,
    pub distance_m: f64,
    pub calories: f64,
    pub pace_steps_per_minute: f64,
    pub activity: ActivityType,
}

/// Owns the detector, all buffers, and the current [`StepSnapshot`].
pub struct StepTracker {
    profile: UserProfile,
    detector: StepDetector,
    snapshot: StepSnapshot,
    subscribers: Vec<Sender<StepSnapshot>>,
}

impl StepTracker {
    pub fn new(profile: UserProfile) -> Self {
        Self::with_detector_config(profile, DetectorConfig::default())
    }

    pub fn with_detector_config(profile: UserProfile, config: DetectorConfig) -> Self {
        Self {
            profile,
            detector: StepDetector::new(config),
            snapshot: StepSnapshot::default(),
            subscribers: Vec::new(),
        }
    }

    /// Feed one sample; on a confirmed step the aggregate is recomputed in
    /// full and the new snapshot is returned and pushed to subscribers.
    pub fn process(
        &mut self,
        sample: AccelSample,
    ) -> Result<Option<StepSnapshot>, InvalidSampleError> {
        let Some(_step) = self.detector.process(sample)? else {
            return Ok(None);
        };

        let steps = self.snapshot.steps + 1;
        let pace = self.detector.pace_steps_per_minute();
        let activity = ActivityType::from_pace(pace);

        // Full recomputation keeps the aggregate internally consistent at
        // every step.
        self.snapshot = StepSnapshot {
            steps,
            distance_m: steps as f64 * activity::stride_length_m(self.profile.height_cm),
            calories: activity::calories_burned(steps, activity, self.profile.weight_kg),
            pace_steps_per_minute: pace,
            activity,
        };

        self.notify();
        Ok(Some(self.snapshot.clone()))
    }

    /// Current aggregate state, by value.
    pub fn snapshot(&self) -> StepSnapshot {
        self.snapshot.clone()
    }

    /// Register an observer fired on every aggregate update.
    pub fn subscribe(&mut self) -> Receiver<StepSnapshot> {
        let (sender, receiver) = unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Zero the aggregate and clear all detector state. Tracking on/off is
    /// not this type's concern and is unaffected.
    pub fn reset(&mut self) {
        self.detector.reset();
        self.snapshot = StepSnapshot::default();
        self.notify();
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }

    fn notify(&mut self) {
        let snapshot = self.snapshot.clone();
        self.subscribers
            .retain(|sender| sender.send(snapshot.clone()).is_ok());
    }
}
