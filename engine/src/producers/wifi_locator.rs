//! Wi-Fi locator producer: scans both receivers and triangulates bearings
//! for every SSID seen on both sides.

use std::collections::HashMap;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use visor_types::RfDirection;

use crate::producer::{run_loop, ShutdownSignal, StepOutcome};
use crate::rf_model;
use crate::state::SharedState;

const CADENCE: Duration = Duration::from_secs(5);

fn scan_signals(interface: &str) -> anyhow::Result<HashMap<String, i32>> {
    let output = Command::new("iw").args(["dev", interface, "scan"]).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "iw scan on {interface} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let mut signals = HashMap::new();
    let mut ssid: Option<String> = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("SSID: ") {
            ssid = Some(rest.to_string());
        } else if let Some(rest) = line.strip_prefix("signal: ") {
            if let (Some(s), Some(dbm)) = (
                &ssid,
                rest.split_whitespace().next().and_then(|f| f.parse::<f64>().ok()),
            ) {
                if !s.is_empty() {
                    signals.insert(s.clone(), dbm.round() as i32);
                }
            }
        }
    }
    Ok(signals)
}

/// A scan failure is terminal only when the receiver interface itself is
/// gone (unplugged, driver unbound); a busy radio or a dropped scan is
/// retried on the next cadence.
fn receiver_scan_outcome(e: anyhow::Error) -> StepOutcome {
    if e.to_string().contains("No such device") {
        StepOutcome::Terminal(e)
    } else {
        StepOutcome::Transient(e)
    }
}

pub fn run(state: Arc<SharedState>, shutdown: ShutdownSignal, left_interface: String, right_interface: String) {
    run_loop("wifi_locator", CADENCE, shutdown, move || {
        let left = match scan_signals(&left_interface) {
            Ok(m) => m,
            Err(e) => return receiver_scan_outcome(e),
        };
        let right = match scan_signals(&right_interface) {
            Ok(m) => m,
            Err(e) => return receiver_scan_outcome(e),
        };

        let heading_deg = state.snapshot().effective_heading_deg().unwrap_or(0.0);

        // a direction needs both receivers to have seen the SSID; the model
        // still supports single-receiver distance, but bearing requires both
        let directions: Vec<RfDirection> = left
            .iter()
            .filter_map(|(ssid, left_dbm)| {
                let right_dbm = right.get(ssid)?;
                let d_left = rf_model::distance_m(*left_dbm, visor_types::Band::Band24);
                let d_right = rf_model::distance_m(*right_dbm, visor_types::Band::Band24);
                let fused = rf_model::triangulate(*left_dbm, *right_dbm, d_left, d_right);
                Some(RfDirection {
                    ssid: ssid.clone(),
                    bearing_deg: (heading_deg + fused.bearing_bias_deg).rem_euclid(360.0),
                    confidence: fused.confidence,
                })
            })
            .collect();

        match state.set_directions(directions) {
            Ok(()) => StepOutcome::Ok,
            Err(e) => StepOutcome::Transient(anyhow::anyhow!(e)),
        }
    });
}
