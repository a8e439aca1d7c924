//! Producer lifecycle: spawn a thread that polls one external collaborator on
//! its own cadence, isolates it from the rest of the system, and stops
//! cooperatively when asked.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::error::CoreError;

/// Fired by the service manager; producers poll it between work units.
#[derive(Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn fire(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bound on how long a producer gets to notice shutdown and exit.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Longest single sleep between shutdown checks while waiting out a cadence.
const SLEEP_SLICE: Duration = Duration::from_millis(250);

/// One iteration's outcome. `Transient` errors are logged and retried;
/// `Terminal` ends the loop cleanly.
pub enum StepOutcome {
    Ok,
    Transient(anyhow::Error),
    Terminal(anyhow::Error),
}

/// Run `step` on a fixed cadence until `shutdown` is fired or `step` reports
/// a terminal error, catching panics so one producer can never take the
/// process down with it.
pub fn run_loop<F>(name: &'static str, cadence: Duration, shutdown: ShutdownSignal, mut step: F)
where
    F: FnMut() -> StepOutcome,
{
    info!(producer = name, "starting");
    loop {
        if shutdown.is_set() {
            break;
        }
        let started = Instant::now();
        let outcome = panic::catch_unwind(AssertUnwindSafe(&mut step));
        match outcome {
            Ok(StepOutcome::Ok) => {}
            Ok(StepOutcome::Transient(e)) => {
                let err = CoreError::ProducerTransient { producer: name, source: e };
                warn!(producer = name, error = %err, "transient failure, retrying");
            }
            Ok(StepOutcome::Terminal(e)) => {
                let err = CoreError::ProducerTerminal { producer: name, source: e };
                error!(producer = name, error = %err, "permanent failure, stopping producer");
                break;
            }
            Err(panic) => {
                let msg = panic_message(&panic);
                error!(producer = name, panic = %msg, "iteration panicked, retrying");
            }
        }
        let elapsed = started.elapsed();
        if elapsed < cadence {
            let mut remaining = cadence - elapsed;
            while remaining > Duration::ZERO {
                if shutdown.is_set() {
                    break;
                }
                let slice = remaining.min(SLEEP_SLICE);
                std::thread::sleep(slice);
                remaining -= slice;
            }
        }
        if shutdown.is_set() {
            break;
        }
    }
    debug!(producer = name, "stopped");
}

fn panic_message(payload: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// A producer's spawned thread handle plus the signal that stops it.
pub struct ProducerHandle {
    pub name: &'static str,
    pub shutdown: ShutdownSignal,
    pub join: JoinHandle<()>,
}
