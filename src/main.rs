//! Stride Sensor Agent CLI
//!
//! Real-time step detection and activity tracking.

use clap::{Parser, Subcommand};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use stride_sensor_agent::{
    check_permission,
    config::{Config, SyncSettings},
    session::{SessionConfig, TrackingSession},
    PermissionStatus, StepSnapshot, VERSION,
};

#[derive(Parser)]
#[command(name = "stride-sensor")]
#[command(version = VERSION)]
#[command(about = "Real-time step detection and activity tracking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking steps
    Start {
        /// Always use the synthetic sample source, even with a sensor present
        #[arg(long)]
        simulate: bool,

        /// Body weight in kilograms (overrides config)
        #[arg(long)]
        weight: Option<f64>,

        /// Body height in centimeters (overrides config)
        #[arg(long)]
        height: Option<f64>,

        /// User ID for daily-summary sync (overrides config)
        #[arg(long)]
        user_id: Option<String>,

        /// Sync interval in seconds (how often summaries are upserted)
        #[arg(long, default_value = "30")]
        sync_interval: u64,
    },

    /// Show sensor permission and configuration status
    Status,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Start {
            simulate,
            weight,
            height,
            user_id,
            sync_interval,
        } => {
            cmd_start(simulate, weight, height, user_id, sync_interval);
        }
        Commands::Status => {
            cmd_status();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

fn cmd_start(
    simulate: bool,
    weight: Option<f64>,
    height: Option<f64>,
    user_id: Option<String>,
    sync_interval: u64,
) {
    println!("Stride Sensor Agent v{VERSION}");
    println!();

    let mut config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    if let Some(weight_kg) = weight {
        config.profile.weight_kg = weight_kg;
    }
    if let Some(height_cm) = height {
        config.profile.height_cm = height_cm;
    }
    if let Some(user_id) = user_id {
        match config.sync.as_mut() {
            Some(settings) => settings.user_id = user_id,
            None => {
                eprintln!("Warning: --user-id given but no sync backend configured; ignoring");
            }
        }
    }
    config.persist_interval = Duration::from_secs(sync_interval);

    let session_config = SessionConfig::from_config(&config, simulate);

    println!("Starting tracking...");
    println!(
        "  Profile: {:.0} kg, {:.0} cm",
        config.profile.weight_kg, config.profile.height_cm
    );
    println!("  Daily goal: {} steps", config.daily_step_goal);
    match &config.sync {
        Some(SyncSettings { user_id, .. }) => {
            println!("  Summary sync: enabled (interval: {sync_interval}s, user: {user_id})");
        }
        None => {
            println!("  Summary sync: disabled");
        }
    }

    let mut session = match TrackingSession::start(session_config) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error starting tracking: {e}");
            std::process::exit(1);
        }
    };

    match session.permission() {
        PermissionStatus::Granted => println!("  Sensor: motion sensor ready"),
        PermissionStatus::Denied => {
            println!("  Sensor: permission denied, using simulated data");
            println!();
            println!("To use the real sensor, grant read access to the IIO");
            println!("accelerometer under /sys/bus/iio/devices and restart.");
        }
        PermissionStatus::Unavailable => {
            println!("  Sensor: none available, using simulated data");
        }
    }

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let updates = session.subscribe();

    while running.load(Ordering::SeqCst) {
        match updates.recv_timeout(Duration::from_millis(200)) {
            Ok(snapshot) => print_update(&snapshot, config.daily_step_goal),
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    println!();
    println!("Stopping tracking...");
    session.stop();

    let summary = session.state();
    println!();
    println!("Session Summary:");
    println!("  Steps: {}", summary.steps);
    println!("  Distance: {:.1} m", summary.distance_m);
    println!("  Calories: {:.1} kcal", summary.calories);
    println!("  Activity: {}", summary.activity);
    println!(
        "  Goal progress: {:.0}%",
        100.0 * summary.steps as f64 / config.daily_step_goal as f64
    );
}

fn print_update(snapshot: &StepSnapshot, daily_goal: u64) {
    let progress = 100.0 * snapshot.steps as f64 / daily_goal as f64;
    println!(
        "[{}] {} steps | {:.1} m | {:.1} kcal | {:.0} steps/min {} | {:.1}% of goal",
        chrono::Local::now().format("%H:%M:%S"),
        snapshot.steps,
        snapshot.distance_m,
        snapshot.calories,
        snapshot.pace_steps_per_minute,
        snapshot.activity,
        progress
    );
}

fn cmd_status() {
    let config = Config::load().unwrap_or_default();

    println!("Stride Sensor Agent Status");
    println!("==========================");
    println!();

    let permission = check_permission();
    println!("Motion sensor: {permission}");
    match permission {
        PermissionStatus::Granted => {}
        PermissionStatus::Denied => {
            println!("  (tracking will fall back to simulated data)");
        }
        PermissionStatus::Unavailable => {
            println!("  (no accelerometer found; tracking uses simulated data)");
        }
    }
    println!();

    println!("Configuration:");
    println!(
        "  Profile: {:.0} kg, {:.0} cm",
        config.profile.weight_kg, config.profile.height_cm
    );
    println!("  Daily goal: {} steps", config.daily_step_goal);
    println!("  Sync interval: {}s", config.persist_interval.as_secs());
    println!("  Timezone: {}", config.timezone);
    println!(
        "  Summary sync: {}",
        if config.sync.is_some() {
            "configured"
        } else {
            "not configured"
        }
    );
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");
}
