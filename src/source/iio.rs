//! Linux accelerometer source backed by the industrial I/O sysfs interface.
//!
//! Laptops and tablets with an accelerometer expose it under
//! `/sys/bus/iio/devices/iio:deviceN` as `in_accel_{x,y,z}_raw` attributes
//! plus an `in_accel_scale` multiplier that converts counts to m/s². Reading
//! them requires no special API, only filesystem access, which is also what
//! the permission probe checks.

use crate::source::types::AccelSample;
use crate::source::{PermissionStatus, SampleSource, SourceError};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const IIO_SYSFS_ROOT: &str = "/sys/bus/iio/devices";

/// 50 Hz, a common accelerometer rate and plenty for gait analysis.
const SAMPLE_PERIOD: Duration = Duration::from_millis(20);

/// Locate the first IIO device exposing accelerometer channels.
fn find_accelerometer() -> io::Result<Option<PathBuf>> {
    let root = Path::new(IIO_SYSFS_ROOT);
    if !root.exists() {
        return Ok(None);
    }
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.join("in_accel_x_raw").exists() {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Probe sensor presence and readability without keeping anything open.
pub fn probe_permission() -> PermissionStatus {
    match find_accelerometer() {
        Ok(Some(device)) => match fs::read_to_string(device.join("in_accel_x_raw")) {
            Ok(_) => PermissionStatus::Granted,
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => PermissionStatus::Denied,
            Err(_) => PermissionStatus::Unavailable,
        },
        _ => PermissionStatus::Unavailable,
    }
}

fn read_axis(device: &Path, attr: &str) -> io::Result<f64> {
    let text = fs::read_to_string(device.join(attr))?;
    text.trim()
        .parse::<f64>()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Polls the sysfs accelerometer on a background thread.
pub struct IioSource {
    device: PathBuf,
    scale: f64,
    sender: Sender<AccelSample>,
    receiver: Receiver<AccelSample>,
    running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
}

impl IioSource {
    /// Open the first available accelerometer device.
    pub fn new() -> Result<Self, SourceError> {
        let device = match find_accelerometer() {
            Ok(Some(device)) => device,
            Ok(None) => {
                return Err(SourceError::DeviceUnavailable(
                    "no IIO accelerometer found".to_string(),
                ))
            }
            Err(e) => return Err(SourceError::DeviceUnavailable(e.to_string())),
        };

        match read_axis(&device, "in_accel_x_raw") {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                return Err(SourceError::PermissionDenied)
            }
            Err(e) => return Err(SourceError::DeviceUnavailable(e.to_string())),
        }

        // Scale is optional in sysfs; raw counts pass through unscaled without it.
        let scale = read_axis(&device, "in_accel_scale").unwrap_or(1.0);

        let (sender, receiver) = bounded(10_000);
        Ok(Self {
            device,
            scale,
            sender,
            receiver,
            running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
        })
    }
}

impl SampleSource for IioSource {
    fn start(&mut self) -> Result<(), SourceError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SourceError::AlreadyRunning);
        }
        self.running.store(true, Ordering::SeqCst);

        let sender = self.sender.clone();
        let running = self.running.clone();
        let device = self.device.clone();
        let scale = self.scale;

        let handle = thread::spawn(move || {
            let origin = Instant::now();

            while running.load(Ordering::SeqCst) {
                let axes = read_axis(&device, "in_accel_x_raw").and_then(|x| {
                    read_axis(&device, "in_accel_y_raw")
                        .and_then(|y| read_axis(&device, "in_accel_z_raw").map(|z| (x, y, z)))
                });

                match axes {
                    Ok((x, y, z)) => {
                        let elapsed_ms = origin.elapsed().as_millis() as u64;
                        let _ = sender.try_send(AccelSample::new(
                            x * scale,
                            y * scale,
                            z * scale,
                            elapsed_ms,
                        ));
                    }
                    Err(e) => {
                        tracing::warn!("accelerometer read failed, skipping tick: {e}");
                    }
                }

                thread::sleep(SAMPLE_PERIOD);
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

impl Drop for IioSource {
    fn drop(&mut self) {
        self.stop();
    }
}
