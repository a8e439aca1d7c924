//! # visor-types
//!
//! Shared data model for the visor HUD engine.
//!
//! These types are used by:
//! - `visor-engine`: the fusion spine, RF analytics and render composition
//! - `visor-sim`: the synthetic sensor generator used in place of physical hardware
//!
//! ## Conventions
//!
//! - Headings and bearings are degrees, `[0, 360)`, 0 = north, clockwise positive.
//! - RSSI is dBm, negative, less negative is stronger.
//! - Distances are metres.

use serde::{Deserialize, Serialize};

// ── GPS ───────────────────────────────────────────────────────────────────────

/// One fix from the GPS daemon. Any field may be absent independently of the
/// others (a fix with no course reports `heading_deg: None` only).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpsSample {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub speed_mps: Option<f64>,
    pub heading_deg: Option<f64>,
}

// ── IMU ───────────────────────────────────────────────────────────────────────

/// One reading from the inertial sensor. Fields are all-or-nothing: a sample
/// only exists once the device has a full orientation solution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    pub heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

// ── System metrics ────────────────────────────────────────────────────────────

/// Host resource usage, sampled once a second.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_percent: f32,
    pub ram_percent: f32,
    /// `None` when no temperature source could be read on this host.
    pub temperature_celsius: Option<f32>,
    /// Cumulative, monotonically nondecreasing while the producer is alive.
    pub net_tx_kib: u64,
    pub net_rx_kib: u64,
}

impl Default for SystemMetrics {
    fn default() -> Self {
        Self {
            cpu_percent: 0.0,
            ram_percent: 0.0,
            temperature_celsius: None,
            net_tx_kib: 0,
            net_rx_kib: 0,
        }
    }
}

// ── RF devices ────────────────────────────────────────────────────────────────

/// Coarse classification assigned to a scanned access point or drone beacon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Router,
    Drone,
    Unknown,
}

/// Observed security posture of a scanned network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Security {
    Open,
    Secured,
}

/// Radio band a device was observed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Band {
    #[serde(rename = "2.4GHz")]
    Band24,
    #[serde(rename = "5.8GHz")]
    Band58,
}

/// Plain RGB colour, one slot in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// One scanned RF device, classified and range-estimated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfDevice {
    pub ssid: String,
    pub signal_dbm: i32,
    pub channel: u32,
    pub security: Security,
    pub band: Band,
    pub device_class: DeviceClass,
    pub distance_m: f64,
    pub colour: Rgb,
}

/// Fused bearing estimate for a device seen by both receivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RfDirection {
    pub ssid: String,
    pub bearing_deg: f64,
    pub confidence: f64,
}

// ── Audio ─────────────────────────────────────────────────────────────────────

/// Latest fixed-size window of mono PCM samples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioFrame {
    pub samples: Vec<i16>,
}

// ── Snapshot ──────────────────────────────────────────────────────────────────

/// A deep, self-consistent view of every data family at one instant.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub gps: Option<GpsSample>,
    pub imu: Option<ImuSample>,
    pub metrics: SystemMetrics,
    pub devices: Vec<RfDevice>,
    pub directions: Vec<RfDirection>,
    pub audio: Option<AudioFrame>,
}

impl Snapshot {
    /// The heading consumers should render: IMU supersedes GPS when both are present.
    pub fn effective_heading_deg(&self) -> Option<f64> {
        self.imu
            .map(|i| i.heading_deg)
            .or_else(|| self.gps.and_then(|g| g.heading_deg))
    }
}

// ── Calibration ───────────────────────────────────────────────────────────────

/// Persisted binding of logical left/right receivers to OS interface names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub left_interface: String,
    pub right_interface: String,
    pub scan_interface: String,
    pub separation_m: f64,
}

// ── Service configuration ─────────────────────────────────────────────────────

/// Which producers run this session, and the interface bindings they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub enable_system_metrics: bool,
    pub enable_gps: bool,
    pub enable_imu: bool,
    pub enable_wifi_scanner: bool,
    pub enable_wifi_locator: bool,
    pub enable_audio: bool,
    pub wifi_scan_interface: String,
    pub wifi_left_interface: String,
    pub wifi_right_interface: String,
    pub adapter_separation_m: f64,
    pub gpsd_addr: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            enable_system_metrics: true,
            enable_gps: true,
            enable_imu: true,
            enable_wifi_scanner: true,
            enable_wifi_locator: false,
            enable_audio: false,
            wifi_scan_interface: "wlan0".to_string(),
            wifi_left_interface: String::new(),
            wifi_right_interface: String::new(),
            adapter_separation_m: 0.15,
            gpsd_addr: "127.0.0.1:2947".to_string(),
        }
    }
}
