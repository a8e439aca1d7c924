//! GPS producer: speaks the gpsd JSON-over-TCP wire protocol and writes
//! TPV (time-position-velocity) reports into the shared store.
//!
//! IMU heading takes precedence downstream (see `Snapshot::effective_heading_deg`),
//! so this producer writes heading unconditionally — it is simply ignored by
//! readers once an IMU sample exists.

use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use gpsd_json::client::blocking::GpsdClient;
use gpsd_json::client::StreamOptions;
use gpsd_json::protocol::v3::response::Message;
use visor_types::GpsSample;

use crate::producer::{run_loop, ShutdownSignal, StepOutcome};
use crate::state::SharedState;

const CADENCE: Duration = Duration::from_millis(200);
const MAX_CONNECT_ATTEMPTS: u32 = 5;

pub fn run(state: Arc<SharedState>, shutdown: ShutdownSignal, addr: String) {
    let mut attempt = 0u32;
    let mut stream: Option<gpsd_json::client::blocking::GpsdDataStream<TcpStream, gpsd_json::protocol::v3::V3, gpsd_json::client::Json>> = None;

    run_loop("gps", CADENCE, shutdown, move || {
        if stream.is_none() {
            match GpsdClient::<TcpStream>::connect(&addr) {
                // `stream()` enables watch mode itself via its own Watch
                // request, so no separate watch_mode(true) call is needed.
                Ok(client) => match client.stream(StreamOptions::json()) {
                    Ok(s) => {
                        attempt = 0;
                        stream = Some(s);
                    }
                    Err(e) => return StepOutcome::Transient(anyhow::anyhow!(e)),
                },
                Err(e) => {
                    attempt += 1;
                    if attempt >= MAX_CONNECT_ATTEMPTS {
                        return StepOutcome::Terminal(anyhow::anyhow!(
                            "gpsd unreachable at {addr} after {attempt} attempts: {e}"
                        ));
                    }
                    let backoff = CADENCE * 2u32.pow(attempt.min(5));
                    std::thread::sleep(backoff.min(Duration::from_secs(1)));
                    return StepOutcome::Transient(anyhow::anyhow!(e));
                }
            }
        }

        let s = stream.as_mut().unwrap();
        match s.next() {
            Some(Ok(Message::Tpv(tpv))) => {
                let sample = GpsSample {
                    lat: tpv.lat,
                    lon: tpv.lon,
                    speed_mps: tpv.speed,
                    heading_deg: tpv.track,
                };
                match state.set_gps(sample) {
                    Ok(()) => StepOutcome::Ok,
                    Err(e) => StepOutcome::Transient(anyhow::anyhow!(e)),
                }
            }
            Some(Ok(_other)) => StepOutcome::Ok,
            Some(Err(e)) => StepOutcome::Transient(anyhow::anyhow!(e)),
            None => {
                stream = None;
                StepOutcome::Transient(anyhow::anyhow!("gpsd connection closed"))
            }
        }
    });
}
