use std::sync::Mutex;

use visor_types::{AudioFrame, GpsSample, ImuSample, RfDevice, RfDirection, Snapshot, SystemMetrics};

use crate::error::{CoreError, CoreResult};

// ─── Shared State Store ──────────────────────────────────────────────────────

/// Central store every producer writes into and the renderer reads from.
///
/// A single exclusive lock guards a plain record: write rates here are low
/// enough (at most tens of updates per second, aggregate) that a read-write
/// lock buys nothing but complexity. Every setter and the snapshot accessor
/// hold the lock only long enough to copy data in or out.
pub struct SharedState {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    gps: Option<GpsSample>,
    imu: Option<ImuSample>,
    metrics: SystemMetrics,
    devices: Vec<RfDevice>,
    directions: Vec<RfDirection>,
    audio: Option<AudioFrame>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_gps(&self, sample: GpsSample) -> CoreResult<()> {
        if let Some(h) = sample.heading_deg {
            validate_heading("gps.heading_deg", h)?;
        }
        self.inner.lock().unwrap().gps = Some(sample);
        Ok(())
    }

    pub fn set_imu(&self, sample: ImuSample) -> CoreResult<()> {
        validate_heading("imu.heading_deg", sample.heading_deg)?;
        if !(-90.0..=90.0).contains(&sample.pitch_deg) {
            return Err(CoreError::InvalidRange {
                field: "imu.pitch_deg",
                value: sample.pitch_deg.to_string(),
            });
        }
        if !(-180.0..=180.0).contains(&sample.roll_deg) {
            return Err(CoreError::InvalidRange {
                field: "imu.roll_deg",
                value: sample.roll_deg.to_string(),
            });
        }
        self.inner.lock().unwrap().imu = Some(sample);
        Ok(())
    }

    pub fn set_metrics(&self, metrics: SystemMetrics) -> CoreResult<()> {
        if !(0.0..=100.0).contains(&metrics.cpu_percent) {
            return Err(CoreError::InvalidRange {
                field: "metrics.cpu_percent",
                value: metrics.cpu_percent.to_string(),
            });
        }
        if !(0.0..=100.0).contains(&metrics.ram_percent) {
            return Err(CoreError::InvalidRange {
                field: "metrics.ram_percent",
                value: metrics.ram_percent.to_string(),
            });
        }
        self.inner.lock().unwrap().metrics = metrics;
        Ok(())
    }

    /// Overwrite the device list wholesale — a scan replaces what came before,
    /// it does not merge into it. Stale entries age out naturally this way.
    pub fn set_devices(&self, devices: Vec<RfDevice>) -> CoreResult<()> {
        self.inner.lock().unwrap().devices = devices;
        Ok(())
    }

    pub fn set_directions(&self, directions: Vec<RfDirection>) -> CoreResult<()> {
        for d in &directions {
            validate_heading("direction.bearing_deg", d.bearing_deg)?;
        }
        self.inner.lock().unwrap().directions = directions;
        Ok(())
    }

    pub fn set_audio(&self, frame: AudioFrame) -> CoreResult<()> {
        self.inner.lock().unwrap().audio = Some(frame);
        Ok(())
    }

    /// A deep-copied, internally consistent view across every data family.
    /// The caller may hold this for as long as it likes without blocking writers.
    pub fn snapshot(&self) -> Snapshot {
        let guard = self.inner.lock().unwrap();
        Snapshot {
            gps: guard.gps,
            imu: guard.imu,
            metrics: guard.metrics.clone(),
            devices: guard.devices.clone(),
            directions: guard.directions.clone(),
            audio: guard.audio.clone(),
        }
    }
}

fn validate_heading(field: &'static str, value: f64) -> CoreResult<()> {
    if !(0.0..360.0).contains(&value) {
        return Err(CoreError::InvalidRange {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use visor_types::{Band, DeviceClass, Rgb, Security};

    #[test]
    fn rejects_out_of_range_heading() {
        let state = SharedState::new();
        let bad = ImuSample {
            heading_deg: 400.0,
            pitch_deg: 0.0,
            roll_deg: 0.0,
        };
        assert!(matches!(state.set_imu(bad), Err(CoreError::InvalidRange { .. })));
    }

    #[test]
    fn rejected_update_leaves_store_unchanged() {
        let state = SharedState::new();
        let good = ImuSample {
            heading_deg: 10.0,
            pitch_deg: 0.0,
            roll_deg: 0.0,
        };
        state.set_imu(good).unwrap();
        let bad = ImuSample {
            heading_deg: 400.0,
            pitch_deg: 0.0,
            roll_deg: 0.0,
        };
        let _ = state.set_imu(bad);
        assert_eq!(state.snapshot().imu, Some(good));
    }

    #[test]
    fn imu_supersedes_gps_heading_in_snapshot() {
        let state = SharedState::new();
        state
            .set_gps(GpsSample {
                lat: None,
                lon: None,
                speed_mps: None,
                heading_deg: Some(90.0),
            })
            .unwrap();
        state
            .set_imu(ImuSample {
                heading_deg: 45.0,
                pitch_deg: 0.0,
                roll_deg: 0.0,
            })
            .unwrap();
        assert_eq!(state.snapshot().effective_heading_deg(), Some(45.0));
    }

    #[test]
    fn snapshot_is_atomic_across_families() {
        let state = SharedState::new();
        state
            .set_metrics(SystemMetrics {
                cpu_percent: 45.0,
                ram_percent: 62.0,
                temperature_celsius: None,
                net_tx_kib: 0,
                net_rx_kib: 0,
            })
            .unwrap();
        state
            .set_gps(GpsSample {
                lat: Some(37.7749),
                lon: Some(-122.4194),
                speed_mps: None,
                heading_deg: None,
            })
            .unwrap();
        let snap = state.snapshot();
        assert_eq!(snap.metrics.cpu_percent, 45.0);
        assert_eq!(snap.gps.unwrap().lat, Some(37.7749));
    }

    #[test]
    fn devices_overwrite_rather_than_merge() {
        let state = SharedState::new();
        let device = RfDevice {
            ssid: "HomeNet".into(),
            signal_dbm: -50,
            channel: 6,
            security: Security::Secured,
            band: Band::Band24,
            device_class: DeviceClass::Router,
            distance_m: 10.0,
            colour: Rgb(0, 0, 0),
        };
        state.set_devices(vec![device.clone()]).unwrap();
        state.set_devices(vec![]).unwrap();
        assert!(state.snapshot().devices.is_empty());
    }
}
