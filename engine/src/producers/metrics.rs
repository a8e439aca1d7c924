//! System metrics: CPU, RAM, temperature, cumulative network counters.
//! A metrics query failure is never terminal — it just leaves a field at
//! "unavailable" and the producer keeps going.

use std::sync::Arc;
use std::time::Duration;

use sysinfo::{Components, Networks, System};
use visor_types::SystemMetrics;

use crate::producer::{run_loop, ShutdownSignal, StepOutcome};
use crate::state::SharedState;

const CADENCE: Duration = Duration::from_secs(1);

pub fn run(state: Arc<SharedState>, shutdown: ShutdownSignal) {
    let mut system = System::new_all();
    let mut networks = Networks::new_with_refreshed_list();
    let mut components = Components::new_with_refreshed_list();
    let mut tx_total_kib: u64 = 0;
    let mut rx_total_kib: u64 = 0;

    run_loop("system_metrics", CADENCE, shutdown, move || {
        system.refresh_cpu_usage();
        system.refresh_memory();
        networks.refresh(true);
        components.refresh(true);

        let cpu_percent = system.global_cpu_usage();
        let ram_percent = if system.total_memory() > 0 {
            (system.used_memory() as f32 / system.total_memory() as f32) * 100.0
        } else {
            0.0
        };

        for (_name, data) in &networks {
            tx_total_kib += data.transmitted() / 1024;
            rx_total_kib += data.received() / 1024;
        }

        let temperature_celsius = components
            .iter()
            .next()
            .and_then(|c| c.temperature())
            .filter(|t| !t.is_nan());

        let metrics = SystemMetrics {
            cpu_percent,
            ram_percent,
            temperature_celsius,
            net_tx_kib: tx_total_kib,
            net_rx_kib: rx_total_kib,
        };

        match state.set_metrics(metrics) {
            Ok(()) => StepOutcome::Ok,
            Err(e) => StepOutcome::Transient(anyhow::anyhow!(e)),
        }
    });
}
