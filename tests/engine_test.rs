//! End-to-end behavior of the step tracker over crafted sample streams.

use approx::assert_relative_eq;
use stride_sensor_agent::{AccelSample, ActivityType, StepSnapshot, StepTracker, UserProfile};

fn quiet(ts: u64) -> AccelSample {
    AccelSample::new(0.0, 9.9, 0.0, ts)
}

fn spike(magnitude: f64, ts: u64) -> AccelSample {
    AccelSample::new(0.0, magnitude, 0.0, ts)
}

/// Quiet baseline with a footfall impulse every `every`-th sample.
fn impulse_stream(count: u64, period_ms: u64, every: u64, impulse_magnitude: f64) -> Vec<AccelSample> {
    (1..=count)
        .map(|i| {
            let ts = i * period_ms;
            if i >= every && i % every == 0 {
                spike(impulse_magnitude, ts)
            } else {
                quiet(ts)
            }
        })
        .collect()
}

fn feed(tracker: &mut StepTracker, samples: &[AccelSample]) -> Vec<StepSnapshot> {
    samples
        .iter()
        .filter_map(|s| tracker.process(*s).unwrap())
        .collect()
}

#[test]
fn steps_are_monotonic_and_increment_by_one() {
    let mut tracker = StepTracker::new(UserProfile::default());
    let updates = feed(&mut tracker, &impulse_stream(60, 300, 4, 14.3));

    assert!(updates.len() >= 10, "expected steps, got {}", updates.len());
    for (i, snapshot) in updates.iter().enumerate() {
        assert_eq!(snapshot.steps, i as u64 + 1);
    }
}

#[test]
fn distance_is_exactly_steps_times_stride() {
    for height_cm in [150.0, 170.0, 195.5] {
        let profile = UserProfile {
            weight_kg: 70.0,
            height_cm,
        };
        let mut tracker = StepTracker::new(profile);
        let updates = feed(&mut tracker, &impulse_stream(40, 300, 4, 14.3));

        let stride = height_cm * 0.415 / 100.0;
        for snapshot in &updates {
            assert_eq!(snapshot.distance_m, snapshot.steps as f64 * stride);
        }
        assert!(!updates.is_empty());
    }
}

#[test]
fn second_sample_inside_min_interval_never_counts() {
    let mut tracker = StepTracker::new(UserProfile::default());

    // Confirmed step at 900ms, then strong peaks 100ms and 200ms later.
    let samples = [
        quiet(300),
        quiet(600),
        spike(13.8, 900),
        spike(14.8, 1000),
        spike(15.8, 1100),
    ];
    let updates = feed(&mut tracker, &samples);

    assert_eq!(updates.len(), 1);
    assert_eq!(tracker.snapshot().steps, 1);
}

#[test]
fn gap_clears_peak_memory_so_smaller_peak_registers() {
    let mut tracker = StepTracker::new(UserProfile::default());

    // Large confirmed peak, then a smaller one rejected by the
    // 70%-of-last-peak rule.
    let pre_gap = [
        quiet(300),
        quiet(600),
        spike(14.8, 900),
        quiet(1200),
        quiet(1500),
        spike(12.0, 1800),
    ];
    assert_eq!(feed(&mut tracker, &pre_gap).len(), 1);

    // More than 2000ms after the confirmed step the smoothing window and
    // peak memory are discarded, so the same smaller peak now counts.
    let post_gap = [quiet(3000), quiet(3300), spike(12.0, 3600)];
    let updates = feed(&mut tracker, &post_gap);

    assert_eq!(updates.len(), 1);
    assert_eq!(tracker.snapshot().steps, 2);
}

#[test]
fn reset_zeroes_aggregate_and_clears_detector_state() {
    let mut tracker = StepTracker::new(UserProfile::default());
    feed(&mut tracker, &impulse_stream(40, 300, 4, 14.3));
    assert!(tracker.snapshot().steps > 0);

    tracker.reset();

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.steps, 0);
    assert_eq!(snapshot.distance_m, 0.0);
    assert_eq!(snapshot.calories, 0.0);
    assert_eq!(snapshot.pace_steps_per_minute, 0.0);
    assert_eq!(snapshot.activity, ActivityType::Idle);

    // Without the reset these samples would sit inside the 250ms cooldown of
    // the last confirmed step; with cleared state they register normally.
    let last_ts = 40 * 300;
    let fresh = [
        quiet(last_ts + 50),
        quiet(last_ts + 100),
        spike(12.0, last_ts + 150),
    ];
    let updates = feed(&mut tracker, &fresh);
    assert_eq!(updates.len(), 1);
    assert_eq!(tracker.snapshot().steps, 1);
}

#[test]
fn walking_cadence_classifies_as_walking() {
    let mut tracker = StepTracker::new(UserProfile::default());

    // 300ms sample spacing, magnitudes inside 8-12 around the 9.8 baseline,
    // a footfall every 1.2s: cadence settles near 50-60 steps/min.
    let samples: Vec<AccelSample> = (1..=20u64)
        .map(|i| {
            let ts = i * 300;
            match i % 4 {
                0 => spike(11.9, ts),
                2 => AccelSample::new(0.0, 9.4, 0.0, ts),
                _ => quiet(ts),
            }
        })
        .collect();

    let updates = feed(&mut tracker, &samples);
    let last = updates.last().expect("walking stream should confirm steps");

    assert!(
        (20.0..80.0).contains(&last.pace_steps_per_minute),
        "pace should stabilize in the walking band, got {}",
        last.pace_steps_per_minute
    );
    assert_eq!(last.activity, ActivityType::Walking);
}

#[test]
fn fast_cadence_classifies_as_running_with_min_interval_enforced() {
    let mut tracker = StepTracker::new(UserProfile::default());

    // 150ms sample spacing with strong swings. A quiet warm-up lets the
    // threshold settle before the impulses begin.
    let mut samples: Vec<AccelSample> = (1..=20u64).map(|i| quiet(i * 150)).collect();
    for i in 21..=60u64 {
        let ts = i * 150;
        if i % 3 == 0 {
            samples.push(spike(14.8, ts));
        } else {
            samples.push(quiet(ts));
        }
    }

    let mut confirmed_at = Vec::new();
    for sample in &samples {
        if tracker.process(*sample).unwrap().is_some() {
            confirmed_at.push(sample.timestamp_ms);
        }
    }
    assert!(!confirmed_at.is_empty(), "running stream should confirm steps");

    let last = tracker.snapshot();
    assert!(
        last.pace_steps_per_minute > 120.0,
        "pace should exceed the running bound, got {}",
        last.pace_steps_per_minute
    );
    assert_eq!(last.activity, ActivityType::Running);

    // No two confirmed steps closer than the minimum inter-step interval.
    for pair in confirmed_at.windows(2) {
        assert!(
            pair[1] - pair[0] >= 250,
            "steps {}ms apart violate the minimum interval",
            pair[1] - pair[0]
        );
    }
}

#[test]
fn constant_magnitude_registers_zero_steps() {
    let mut tracker = StepTracker::new(UserProfile::default());
    for i in 1..=200u64 {
        let update = tracker
            .process(AccelSample::new(0.0, 10.2, 0.0, i * 100))
            .unwrap();
        assert!(update.is_none());
    }
    assert_eq!(tracker.snapshot(), StepSnapshot::default());
}

#[test]
fn calories_follow_the_met_model() {
    let profile = UserProfile {
        weight_kg: 80.0,
        height_cm: 170.0,
    };
    let mut tracker = StepTracker::new(profile);
    let updates = feed(&mut tracker, &impulse_stream(40, 300, 4, 14.3));
    let last = updates.last().expect("stream should confirm steps");

    // Cadence of one step per 1.2s lands in the walking band: MET 3.5 at an
    // assumed 100 steps/min.
    assert_eq!(last.activity, ActivityType::Walking);
    let expected = 3.5 * 80.0 * (last.steps as f64 / 100.0 / 60.0);
    assert_relative_eq!(last.calories, expected);
}

#[test]
fn invalid_samples_are_rejected_without_corrupting_state() {
    let mut tracker = StepTracker::new(UserProfile::default());
    feed(&mut tracker, &impulse_stream(24, 300, 4, 14.3));
    let before = tracker.snapshot();

    assert!(tracker
        .process(AccelSample::new(f64::NAN, 9.8, 0.0, 10_000))
        .is_err());
    assert!(tracker.process(quiet(100)).is_err()); // out of order
    assert_eq!(tracker.snapshot(), before);

    // The stream continues normally afterwards.
    let resumed = feed(
        &mut tracker,
        &[quiet(7500), quiet(7800), spike(14.3, 8100)],
    );
    assert_eq!(resumed.len(), 1);
}
