//! Walk simulation demo.
//!
//! Feeds the synthetic source straight into a [`StepTracker`] and prints
//! every aggregate update. No sensor or permission needed.
//!
//! Run with: cargo run --example walk_demo

use std::time::{Duration, Instant};
use stride_sensor_agent::{
    SampleSource, StepTracker, SyntheticConfig, SyntheticSource, UserProfile,
};

fn main() {
    println!("Stride walk demo - simulating 15 seconds of walking");
    println!();

    let mut source = SyntheticSource::new(SyntheticConfig::default());
    let mut tracker = StepTracker::new(UserProfile::default());

    source.start().expect("synthetic source should start");
    let receiver = source.receiver().clone();

    let deadline = Instant::now() + Duration::from_secs(15);
    while Instant::now() < deadline {
        match receiver.recv_timeout(Duration::from_millis(200)) {
            Ok(sample) => match tracker.process(sample) {
                Ok(Some(snapshot)) => {
                    println!(
                        "step {:>3} | {:>6.1} m | {:>5.2} kcal | {:>5.1} steps/min | {}",
                        snapshot.steps,
                        snapshot.distance_m,
                        snapshot.calories,
                        snapshot.pace_steps_per_minute,
                        snapshot.activity
                    );
                }
                Ok(None) => {}
                Err(e) => eprintln!("dropped sample: {e}"),
            },
            Err(_) => {}
        }
    }

    source.stop();

    let final_state = tracker.snapshot();
    println!();
    println!(
        "Done: {} steps, {:.1} m, {:.2} kcal, classified {}",
        final_state.steps, final_state.distance_m, final_state.calories, final_state.activity
    );
}
