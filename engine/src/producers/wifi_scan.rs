//! Wi-Fi scan producer: shells out to `iw` to enumerate nearby access points
//! and classifies/ranges each one.

use std::collections::HashMap;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use visor_types::{Band, RfDevice, Security};

use crate::palette;
use crate::producer::{run_loop, ShutdownSignal, StepOutcome};
use crate::rf_model;
use crate::state::SharedState;

const CADENCE: Duration = Duration::from_secs(15);

#[derive(Clone, Copy)]
struct RawObservation {
    signal_dbm: i32,
    channel: u32,
    band: Band,
    security: Security,
}

/// Parse `iw dev <iface> scan` text output into raw per-SSID observations.
/// Blocks with no usable SSID are skipped; the last occurrence of a repeated
/// SSID wins (rare, but `iw` can list the same network from multiple BSSes).
fn parse_scan_output(text: &str) -> HashMap<String, RawObservation> {
    let mut out = HashMap::new();
    let mut ssid: Option<String> = None;
    let mut signal_dbm: Option<i32> = None;
    let mut freq_mhz: Option<u32> = None;
    let mut secured = false;

    let flush = |out: &mut HashMap<String, RawObservation>,
                 ssid: &Option<String>,
                 signal_dbm: Option<i32>,
                 freq_mhz: Option<u32>,
                 secured: bool| {
        if let (Some(ssid), Some(signal_dbm), Some(freq_mhz)) = (ssid, signal_dbm, freq_mhz) {
            if ssid.is_empty() {
                return;
            }
            let band = if freq_mhz >= 4900 { Band::Band58 } else { Band::Band24 };
            let channel = channel_from_freq(freq_mhz, band);
            out.insert(
                ssid.clone(),
                RawObservation {
                    signal_dbm,
                    channel,
                    band,
                    security: if secured { Security::Secured } else { Security::Open },
                },
            );
        }
    };

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("BSS ") {
            flush(&mut out, &ssid, signal_dbm, freq_mhz, secured);
            ssid = None;
            signal_dbm = None;
            freq_mhz = None;
            secured = false;
        } else if let Some(rest) = line.strip_prefix("SSID: ") {
            ssid = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("freq: ") {
            freq_mhz = rest.trim().parse().ok();
        } else if let Some(rest) = line.strip_prefix("signal: ") {
            signal_dbm = rest
                .split_whitespace()
                .next()
                .and_then(|s| s.parse::<f64>().ok())
                .map(|f| f.round() as i32);
        } else if line.starts_with("RSN:") || line.contains("Privacy") {
            secured = true;
        }
    }
    flush(&mut out, &ssid, signal_dbm, freq_mhz, secured);
    out
}

fn channel_from_freq(freq_mhz: u32, band: Band) -> u32 {
    match band {
        Band::Band24 => {
            if freq_mhz == 2484 {
                14
            } else {
                (freq_mhz.saturating_sub(2407)) / 5
            }
        }
        Band::Band58 => (freq_mhz.saturating_sub(5000)) / 5,
    }
}

fn run_iw_scan(interface: &str) -> anyhow::Result<String> {
    let output = Command::new("iw").args(["dev", interface, "scan"]).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "iw scan on {interface} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn run(state: Arc<SharedState>, shutdown: ShutdownSignal, interface: String) {
    let mut previous: HashMap<String, RawObservation> = HashMap::new();

    run_loop("wifi_scan", CADENCE, shutdown, move || {
        let text = match run_iw_scan(&interface) {
            Ok(t) => t,
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("No such file or directory") || msg.contains("command not found") {
                    return StepOutcome::Terminal(e);
                }
                return StepOutcome::Transient(e);
            }
        };

        let observed = parse_scan_output(&text);
        let devices: Vec<RfDevice> = observed
            .iter()
            .map(|(ssid, obs)| {
                let channel_stable = previous
                    .get(ssid)
                    .is_some_and(|prev| prev.channel == obs.channel && (prev.signal_dbm - obs.signal_dbm).abs() <= 10);
                let device_class = rf_model::classify(ssid, obs.band, obs.channel, channel_stable);
                RfDevice {
                    ssid: ssid.clone(),
                    signal_dbm: obs.signal_dbm,
                    channel: obs.channel,
                    security: obs.security,
                    band: obs.band,
                    device_class,
                    distance_m: rf_model::distance_m(obs.signal_dbm, obs.band),
                    colour: palette::colour_for(ssid),
                }
            })
            .collect();

        previous = observed;

        match state.set_devices(devices) {
            Ok(()) => StepOutcome::Ok,
            Err(e) => StepOutcome::Transient(anyhow::anyhow!(e)),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_network_block() {
        let text = "\
BSS aa:bb:cc:dd:ee:ff(on wlan0)
\tfreq: 2437
\tsignal: -50.00 dBm
\tSSID: HomeNet
\tRSN:\t * Version: 1
";
        let observed = parse_scan_output(text);
        let obs = observed.get("HomeNet").unwrap();
        assert_eq!(obs.signal_dbm, -50);
        assert_eq!(obs.channel, 6);
        assert_eq!(obs.band, Band::Band24);
        assert_eq!(obs.security, Security::Secured);
    }

    #[test]
    fn parses_multiple_blocks() {
        let text = "\
BSS 11:11:11:11:11:11(on wlan0)
\tfreq: 2412
\tsignal: -40.00 dBm
\tSSID: Open1
BSS 22:22:22:22:22:22(on wlan0)
\tfreq: 5180
\tsignal: -70.00 dBm
\tSSID: DJI-Mavic-Air
";
        let observed = parse_scan_output(text);
        assert_eq!(observed.len(), 2);
        assert_eq!(observed.get("Open1").unwrap().security, Security::Open);
        assert_eq!(observed.get("DJI-Mavic-Air").unwrap().band, Band::Band58);
    }

    #[test]
    fn skips_blocks_without_ssid() {
        let text = "\
BSS 33:33:33:33:33:33(on wlan0)
\tfreq: 2412
\tsignal: -80.00 dBm
";
        let observed = parse_scan_output(text);
        assert!(observed.is_empty());
    }
}
