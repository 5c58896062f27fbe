//! Activity classification and energy estimation.
//!
//! Activity type is classified purely from cadence. Calories use the MET
//! model with a duration estimated from total steps at a fixed assumed
//! cadence per activity, not the live-measured pace; that approximation is
//! intentionally preserved from the production formula.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    #[default]
    Idle,
    Walking,
    Jogging,
    Running,
}

impl ActivityType {
    /// Classify from cadence in steps per minute.
    pub fn from_pace(pace_steps_per_minute: f64) -> Self {
        if pace_steps_per_minute < 20.0 {
            ActivityType::Idle
        } else if pace_steps_per_minute < 80.0 {
            ActivityType::Walking
        } else if pace_steps_per_minute < 120.0 {
            ActivityType::Jogging
        } else {
            ActivityType::Running
        }
    }

    /// Metabolic equivalent of task.
    pub fn met(self) -> f64 {
        match self {
            ActivityType::Idle => 1.0,
            ActivityType::Walking => 3.5,
            ActivityType::Jogging => 7.0,
            ActivityType::Running => 10.0,
        }
    }

    /// Assumed cadence used for duration estimation, steps per minute.
    fn assumed_cadence(self) -> f64 {
        match self {
            ActivityType::Idle => 0.0,
            ActivityType::Walking => 100.0,
            ActivityType::Jogging => 140.0,
            ActivityType::Running => 180.0,
        }
    }
}

impl std::fmt::Display for ActivityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityType::Idle => write!(f, "idle"),
            ActivityType::Walking => write!(f, "walking"),
            ActivityType::Jogging => write!(f, "jogging"),
            ActivityType::Running => write!(f, "running"),
        }
    }
}

/// Anthropometric stride estimate in meters: 41.5% of height.
pub fn stride_length_m(height_cm: f64) -> f64 {
    height_cm * 0.415 / 100.0
}

/// Calories from the MET model.
///
/// Duration is steps at the activity's assumed cadence; idle falls back to
/// the walking cadence of 100, matching the original formula exactly.
pub fn calories_burned(steps: u64, activity: ActivityType, weight_kg: f64) -> f64 {
    let cadence = match activity.assumed_cadence() {
        c if c > 0.0 => c,
        _ => 100.0,
    };
    let duration_minutes = steps as f64 / cadence;
    let duration_hours = duration_minutes / 60.0;
    activity.met() * weight_kg * duration_hours
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pace_classification_boundaries() {
        assert_eq!(ActivityType::from_pace(0.0), ActivityType::Idle);
        assert_eq!(ActivityType::from_pace(19.9), ActivityType::Idle);
        assert_eq!(ActivityType::from_pace(20.0), ActivityType::Walking);
        assert_eq!(ActivityType::from_pace(79.9), ActivityType::Walking);
        assert_eq!(ActivityType::from_pace(80.0), ActivityType::Jogging);
        assert_eq!(ActivityType::from_pace(119.9), ActivityType::Jogging);
        assert_eq!(ActivityType::from_pace(120.0), ActivityType::Running);
        assert_eq!(ActivityType::from_pace(240.0), ActivityType::Running);
    }

    #[test]
    fn test_stride_length() {
        assert_relative_eq!(stride_length_m(170.0), 0.7055);
        assert_relative_eq!(stride_length_m(200.0), 0.83);
    }

    #[test]
    fn test_calories_walking() {
        // 1000 steps walking: 10 minutes at cadence 100, MET 3.5, 70kg.
        let kcal = calories_burned(1000, ActivityType::Walking, 70.0);
        assert_relative_eq!(kcal, 3.5 * 70.0 * (10.0 / 60.0));
    }

    #[test]
    fn test_calories_idle_uses_walking_cadence_fallback() {
        let kcal = calories_burned(600, ActivityType::Idle, 70.0);
        assert_relative_eq!(kcal, 1.0 * 70.0 * (6.0 / 60.0));
    }

    #[test]
    fn test_calories_scale_with_weight() {
        let light = calories_burned(1000, ActivityType::Running, 50.0);
        let heavy = calories_burned(1000, ActivityType::Running, 100.0);
        assert_relative_eq!(heavy, light * 2.0);
    }

    #[test]
    fn test_activity_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&ActivityType::Jogging).unwrap(),
            "\"jogging\""
        );
    }
}
