//! IMU producer: polls the inertial sensor's orientation solution.
//!
//! Linux exposes most consumer inertial sensors through the IIO subsystem as
//! plain sysfs files; reading them is the thin OS-boundary call this producer
//! wraps. `IMU_DEVICE_PATH` points at the device directory and can be
//! overridden for bench testing against a fixture.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use visor_types::ImuSample;

use crate::producer::{run_loop, ShutdownSignal, StepOutcome};
use crate::state::SharedState;

const CADENCE: Duration = Duration::from_millis(20); // 50 Hz

fn device_path() -> PathBuf {
    std::env::var("IMU_DEVICE_PATH")
        .unwrap_or_else(|_| "/sys/bus/iio/devices/iio:device0".to_string())
        .into()
}

fn read_axis(base: &std::path::Path, file: &str) -> anyhow::Result<f64> {
    let raw = std::fs::read_to_string(base.join(file))?;
    Ok(raw.trim().parse::<f64>()?)
}

/// Reads the three fused orientation angles off the IIO sysfs attributes.
/// A missing device directory is the terminal condition: the bus is gone.
fn read_orientation(base: &std::path::Path) -> anyhow::Result<ImuSample> {
    if !base.exists() {
        anyhow::bail!("IMU device path {} does not exist", base.display());
    }
    let heading_deg = read_axis(base, "in_rot_yaw_raw")?.rem_euclid(360.0);
    let pitch_deg = read_axis(base, "in_rot_pitch_raw")?.clamp(-90.0, 90.0);
    let roll_deg = read_axis(base, "in_rot_roll_raw")?;
    Ok(ImuSample { heading_deg, pitch_deg, roll_deg })
}

pub fn run(state: Arc<SharedState>, shutdown: ShutdownSignal) {
    let base = device_path();
    let mut bus_confirmed_present = base.exists();

    run_loop("imu", CADENCE, shutdown, move || {
        if !bus_confirmed_present {
            if !base.exists() {
                return StepOutcome::Terminal(anyhow::anyhow!(
                    "IMU bus at {} never appeared",
                    base.display()
                ));
            }
            bus_confirmed_present = true;
        }
        match read_orientation(&base) {
            Ok(sample) => match state.set_imu(sample) {
                Ok(()) => StepOutcome::Ok,
                Err(e) => StepOutcome::Transient(anyhow::anyhow!(e)),
            },
            Err(e) => StepOutcome::Transient(e),
        }
    });
}
