//! main.rs — synthetic sensor generator entry point
//!
//! Stands in for the camera, GPS daemon, inertial bus and Wi-Fi radios during
//! development: prints one JSON snapshot per tick to stdout so the engine's
//! producer and service-manager layers are exercisable without physical
//! hardware attached.

mod motion;

use std::time::Duration;

use clap::Parser;
use serde::Serialize;
use tracing::info;

use motion::WearerSim;

#[derive(Parser, Debug)]
#[command(name = "visor-sim", about = "Synthetic sensor generator for visor-engine development")]
struct Args {
    /// Simulation speed multiplier (1.0 = real-time)
    #[arg(long, default_value = "1.0")]
    speed: f64,
    /// Ticks per second
    #[arg(long, default_value = "2")]
    rate_hz: u32,
    /// Stop after this many ticks; 0 runs forever
    #[arg(long, default_value = "0")]
    ticks: u64,
}

#[derive(Serialize)]
struct SimSnapshot {
    tick: u64,
    lat: f64,
    lon: f64,
    heading_deg: f64,
    speed_mps: f64,
    devices: Vec<SimDevice>,
}

#[derive(Serialize)]
struct SimDevice {
    ssid: String,
    signal_dbm: i32,
    channel: u32,
    band: &'static str,
}

// Roughly centred on an arbitrary test origin; not a real GPS fix.
const ORIGIN_LAT: f64 = 37.7749;
const ORIGIN_LON: f64 = -122.4194;
const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "visor_sim=info".into()),
        )
        .init();

    let args = Args::parse();
    info!("visor-sim starting at {}x speed, {} Hz", args.speed, args.rate_hz);

    let mut sim = WearerSim::new(WearerSim::default_emitters());
    let dt_s = (1.0 / args.rate_hz as f64) * args.speed;
    let period = Duration::from_secs_f64(1.0 / args.rate_hz as f64);

    let mut tick = 0u64;
    loop {
        sim.tick(dt_s);
        let readings = sim.observe();

        let lon_scale = (ORIGIN_LAT.to_radians()).cos().max(0.1);
        let snapshot = SimSnapshot {
            tick,
            lat: ORIGIN_LAT + sim.pos.y / METERS_PER_DEGREE_LAT,
            lon: ORIGIN_LON + sim.pos.x / (METERS_PER_DEGREE_LAT * lon_scale),
            heading_deg: sim.heading_deg,
            speed_mps: sim.speed_mps,
            devices: readings
                .into_iter()
                .map(|(ssid, signal_dbm, channel, band_5_8ghz)| SimDevice {
                    ssid,
                    signal_dbm,
                    channel,
                    band: if band_5_8ghz { "5.8GHz" } else { "2.4GHz" },
                })
                .collect(),
        };

        println!("{}", serde_json::to_string(&snapshot)?);

        tick += 1;
        if args.ticks != 0 && tick >= args.ticks {
            break;
        }
        std::thread::sleep(period);
    }

    Ok(())
}
