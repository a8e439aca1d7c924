mod calibration;
mod error;
mod palette;
mod producer;
mod producers;
mod render;
mod rf_model;
mod service_manager;
mod state;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::info;
use visor_types::ServiceConfig;

use calibration::InterfaceEnumerator;
use error::CoreError;
use service_manager::ServiceManager;
use state::SharedState;

/// Wearable HUD fusion engine.
#[derive(Debug, Parser)]
#[command(name = "visor-engine", version, about)]
struct Args {
    /// Use the persisted calibration unchanged, skipping the interactive protocol.
    #[arg(long)]
    skip_calibration: bool,

    /// Path to a ServiceConfig TOML file. Defaults are used if absent.
    #[arg(long, default_value = "visor.toml")]
    config: String,
}

struct NlSystemInterfaces;

impl InterfaceEnumerator for NlSystemInterfaces {
    fn enumerate(&self) -> anyhow::Result<std::collections::HashSet<String>> {
        let entries = std::fs::read_dir("/sys/class/net")?;
        let mut names = std::collections::HashSet::new();
        for entry in entries.flatten() {
            if let Some(name) = entry.file_name().to_str() {
                names.insert(name.to_string());
            }
        }
        Ok(names)
    }
}

fn load_config(path: &str) -> ServiceConfig {
    match std::fs::read_to_string(path) {
        Ok(text) => toml::from_str(&text).unwrap_or_else(|e| {
            tracing::warn!("failed to parse {path}: {e}, using defaults");
            ServiceConfig::default()
        }),
        Err(_) => {
            info!("no {path} found, using default service config");
            ServiceConfig::default()
        }
    }
}

fn resolve_calibration(args: &Args, config: &mut ServiceConfig) {
    if !config.enable_wifi_locator {
        return;
    }
    let enumerator = NlSystemInterfaces;
    let outcome = if args.skip_calibration {
        calibration::load()
    } else {
        calibration::run(
            &enumerator,
            |msg| info!("calibration: {msg}"),
            || {
                use std::io::Write;
                print!("adapter separation, cm: ");
                std::io::stdout().flush().ok();
                let mut line = String::new();
                std::io::stdin().read_line(&mut line).ok();
                line.trim().parse().unwrap_or(15.0)
            },
        )
    };

    match outcome {
        Ok(calibration) => {
            config.wifi_left_interface = calibration.left_interface;
            config.wifi_right_interface = calibration.right_interface;
            config.wifi_scan_interface = calibration.scan_interface;
            config.adapter_separation_m = calibration.separation_m;
        }
        Err(CoreError::NoCalibration) => {
            tracing::warn!("no calibration available, disabling wifi_locator");
            config.enable_wifi_locator = false;
        }
        Err(e) => {
            tracing::warn!("calibration failed ({e}), disabling wifi_locator");
            config.enable_wifi_locator = false;
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "visor_engine=info".into()),
        )
        .init();

    let args = Args::parse();
    info!("visor-engine v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = load_config(&args.config);
    resolve_calibration(&args, &mut config);

    let shared_state = Arc::new(SharedState::new());

    let mut services = ServiceManager::new();
    services.start_all(&config, shared_state.clone());

    // The renderer lives outside this crate; this loop stands in for it
    // during headless operation and keeps the process alive until signalled.
    let running = Arc::new(std::sync::atomic::AtomicBool::new(true));
    {
        let running = running.clone();
        ctrlc::set_handler(move || running.store(false, std::sync::atomic::Ordering::SeqCst))?;
    }
    while running.load(std::sync::atomic::Ordering::SeqCst) {
        std::thread::sleep(Duration::from_millis(200));
    }

    info!("shutting down");
    services.stop_all();
    Ok(())
}
