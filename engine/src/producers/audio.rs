//! Audio producer: polls the capture device for the latest PCM window.
//!
//! Capture itself is an external collaborator (ALSA/CoreAudio/etc depending
//! on platform); this producer owns the polling cadence, the fixed-size
//! windowing, and the error-isolation contract around whatever collaborator
//! is plugged in via `AudioSource`.

use std::sync::Arc;
use std::time::Duration;

use visor_types::AudioFrame;

use crate::producer::{run_loop, ShutdownSignal, StepOutcome};
use crate::state::SharedState;

const CADENCE: Duration = Duration::from_millis(100);
const WINDOW_SAMPLES: usize = 1024;

/// Boundary to the platform capture device. A real implementation opens the
/// default input device once and reads fixed-size windows from it.
pub trait AudioSource: Send {
    fn read_window(&mut self, len: usize) -> anyhow::Result<Vec<i16>>;
}

/// No physical microphone bound: yields silence forever, never errors.
/// Used when `enable_audio` is on but no capture backend has been wired up.
struct SilentSource;

impl AudioSource for SilentSource {
    fn read_window(&mut self, len: usize) -> anyhow::Result<Vec<i16>> {
        Ok(vec![0; len])
    }
}

pub fn run(state: Arc<SharedState>, shutdown: ShutdownSignal) {
    run_with_source(state, shutdown, Box::new(SilentSource));
}

fn run_with_source(state: Arc<SharedState>, shutdown: ShutdownSignal, mut source: Box<dyn AudioSource>) {
    run_loop("audio", CADENCE, shutdown, move || {
        match source.read_window(WINDOW_SAMPLES) {
            Ok(samples) => match state.set_audio(AudioFrame { samples }) {
                Ok(()) => StepOutcome::Ok,
                Err(e) => StepOutcome::Transient(anyhow::anyhow!(e)),
            },
            Err(e) => StepOutcome::Terminal(e),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc as StdArc;

    struct CountingSource {
        calls: StdArc<AtomicUsize>,
    }

    impl AudioSource for CountingSource {
        fn read_window(&mut self, len: usize) -> anyhow::Result<Vec<i16>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0; len])
        }
    }

    #[test]
    fn silent_source_yields_requested_length() {
        let mut source = SilentSource;
        let window = source.read_window(WINDOW_SAMPLES).unwrap();
        assert_eq!(window.len(), WINDOW_SAMPLES);
    }

    #[test]
    fn counting_source_tracks_polls() {
        let calls = StdArc::new(AtomicUsize::new(0));
        let mut source = CountingSource { calls: calls.clone() };
        source.read_window(4).unwrap();
        source.read_window(4).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
