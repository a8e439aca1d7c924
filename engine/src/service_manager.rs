//! Starts and stops the producer threads according to a `ServiceConfig`,
//! tolerating individual producer startup failures and bounding shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use visor_types::ServiceConfig;

use crate::producer::{ProducerHandle, ShutdownSignal, SHUTDOWN_GRACE};
use crate::producers;
use crate::state::SharedState;

pub struct ServiceManager {
    handles: Vec<ProducerHandle>,
}

impl ServiceManager {
    pub fn new() -> Self {
        Self { handles: Vec::new() }
    }

    /// Launch every enabled producer. A producer that fails to start (e.g. no
    /// calibration for the locator) is logged and skipped; the rest still start.
    pub fn start_all(&mut self, config: &ServiceConfig, state: Arc<SharedState>) {
        if config.enable_system_metrics {
            let state = state.clone();
            self.spawn("system_metrics", move |shutdown| {
                producers::metrics::run(state.clone(), shutdown)
            });
        }
        if config.enable_gps {
            let addr = config.gpsd_addr.clone();
            let state = state.clone();
            self.spawn("gps", move |shutdown| producers::gps::run(state.clone(), shutdown, addr));
        }
        if config.enable_imu {
            let state = state.clone();
            self.spawn("imu", move |shutdown| producers::imu::run(state.clone(), shutdown));
        }
        if config.enable_wifi_scanner {
            let iface = config.wifi_scan_interface.clone();
            let state = state.clone();
            self.spawn("wifi_scan", move |shutdown| {
                producers::wifi_scan::run(state.clone(), shutdown, iface)
            });
        }
        if config.enable_wifi_locator {
            if config.wifi_left_interface.is_empty() || config.wifi_right_interface.is_empty() {
                warn!("wifi_locator enabled but no calibration bound, skipping");
            } else {
                let left = config.wifi_left_interface.clone();
                let right = config.wifi_right_interface.clone();
                let state = state.clone();
                self.spawn("wifi_locator", move |shutdown| {
                    producers::wifi_locator::run(state.clone(), shutdown, left, right)
                });
            }
        }
        if config.enable_audio {
            let state = state.clone();
            self.spawn("audio", move |shutdown| producers::audio::run(state.clone(), shutdown));
        }
    }

    fn spawn<F>(&mut self, name: &'static str, body: F)
    where
        F: FnOnce(ShutdownSignal) + Send + 'static,
    {
        let shutdown = ShutdownSignal::new();
        let shutdown_for_thread = shutdown.clone();
        info!(producer = name, "launching");
        let join = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(shutdown_for_thread))
            .expect("failed to spawn producer thread");
        self.handles.push(ProducerHandle { name, shutdown, join });
    }

    /// Fire every shutdown signal, then wait up to five seconds total for all
    /// producers to join. Anything still running past the budget is abandoned
    /// (its thread keeps running detached; the process is exiting anyway).
    pub fn stop_all(self) {
        const POLL_INTERVAL: Duration = Duration::from_millis(100);

        for handle in &self.handles {
            handle.shutdown.fire();
        }
        let deadline = Instant::now() + SHUTDOWN_GRACE;
        for handle in self.handles {
            while !handle.join.is_finished() && Instant::now() < deadline {
                let remaining = deadline.saturating_duration_since(Instant::now());
                std::thread::sleep(remaining.min(POLL_INTERVAL));
            }
            if !handle.join.is_finished() {
                warn!(producer = handle.name, "shutdown budget exhausted, abandoning");
                continue;
            }
            if handle.join.join().is_err() {
                warn!(producer = handle.name, "producer thread panicked during shutdown");
            } else {
                info!(producer = handle.name, "stopped");
            }
        }
    }
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}
