//! Startup protocol for binding the logical left/right receivers to the OS
//! interface names USB enumeration happens to have assigned this boot.

use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};

use tracing::{info, warn};
use visor_types::Calibration;

use crate::error::{CoreError, CoreResult};

const CALIBRATION_FILE: &str = "calibration.toml";
const POLL_INTERVAL: Duration = Duration::from_millis(200);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);
const ONBOARD_PATTERNS: [&str; 2] = ["wlan0", "eth0"];

/// Load the persisted calibration. A missing or corrupt file is a meaningful,
/// observable condition rather than a default — callers disable the locator
/// producer on `NoCalibration` rather than silently proceeding with zeros.
pub fn load() -> CoreResult<Calibration> {
    if !Path::new(CALIBRATION_FILE).exists() {
        info!("no calibration.toml found");
        return Err(CoreError::NoCalibration);
    }
    let text = std::fs::read_to_string(CALIBRATION_FILE).map_err(|e| {
        warn!("failed to read calibration.toml: {e}");
        CoreError::NoCalibration
    })?;
    toml::from_str(&text).map_err(|e| {
        warn!("failed to parse calibration.toml: {e}");
        CoreError::NoCalibration
    })
}

pub fn save(calibration: &Calibration) -> anyhow::Result<()> {
    let text = toml::to_string_pretty(calibration)?;
    std::fs::write(CALIBRATION_FILE, text)?;
    info!("saved calibration.toml");
    Ok(())
}

/// Enumerate wireless interfaces via the supplied collaborator, with onboard
/// interfaces filtered out.
pub trait InterfaceEnumerator {
    fn enumerate(&self) -> anyhow::Result<HashSet<String>>;
}

fn filter_onboard(set: HashSet<String>) -> HashSet<String> {
    set.into_iter()
        .filter(|iface| !ONBOARD_PATTERNS.iter().any(|p| iface == p))
        .collect()
}

/// Poll `enumerator` every 200ms, up to five seconds, until exactly one new
/// interface appears relative to `baseline`. Returns it, or `CalibrationAmbiguous`
/// once the budget elapses with zero or more than one candidate.
pub fn wait_for_new_interface(
    enumerator: &dyn InterfaceEnumerator,
    baseline: &HashSet<String>,
) -> CoreResult<String> {
    let deadline = Instant::now() + SETTLE_TIMEOUT;
    let mut last_delta: HashSet<String> = HashSet::new();
    loop {
        let current = filter_onboard(enumerator.enumerate().unwrap_or_default());
        let delta: HashSet<String> = current.difference(baseline).cloned().collect();
        if delta.len() == 1 {
            return Ok(delta.into_iter().next().unwrap());
        }
        last_delta = delta;
        if Instant::now() >= deadline {
            return Err(CoreError::CalibrationAmbiguous { count: last_delta.len() });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Run the full interactive protocol. `prompt` and `read_separation_cm` are
/// the operator's terminal I/O, abstracted so the protocol itself is testable
/// without a TTY.
pub fn run(
    enumerator: &dyn InterfaceEnumerator,
    prompt: impl Fn(&str),
    read_separation_cm: impl FnOnce() -> f64,
) -> CoreResult<Calibration> {
    let baseline = filter_onboard(enumerator.enumerate().unwrap_or_default());

    prompt("power the RIGHT receiver only, then wait");
    let right = wait_for_new_interface(enumerator, &baseline)?;
    info!(interface = %right, "identified right receiver");

    let mut after_right = baseline.clone();
    after_right.insert(right.clone());

    prompt("now power the LEFT receiver, then wait");
    let left = wait_for_new_interface(enumerator, &after_right)?;
    info!(interface = %left, "identified left receiver");

    let separation_cm = read_separation_cm();
    if !(5.0..=50.0).contains(&separation_cm) {
        warn!(separation_cm, "adapter separation outside the expected 5-50cm range");
    }

    let calibration = Calibration {
        left_interface: left.clone(),
        right_interface: right,
        scan_interface: left,
        separation_m: separation_cm / 100.0,
    };
    save(&calibration).map_err(|e| CoreError::Fatal(e.to_string()))?;
    Ok(calibration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedEnumerator {
        steps: RefCell<Vec<HashSet<String>>>,
    }

    impl InterfaceEnumerator for ScriptedEnumerator {
        fn enumerate(&self) -> anyhow::Result<HashSet<String>> {
            let mut steps = self.steps.borrow_mut();
            if steps.len() > 1 {
                Ok(steps.remove(0))
            } else {
                Ok(steps[0].clone())
            }
        }
    }

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_new_interface_is_identified() {
        let enumerator = ScriptedEnumerator {
            steps: RefCell::new(vec![set(&["wlan0", "wlan1"])]),
        };
        let baseline = set(&["wlan0"]);
        let found = wait_for_new_interface(&enumerator, &baseline).unwrap();
        assert_eq!(found, "wlan1");
    }

    #[test]
    fn no_new_interface_is_ambiguous() {
        let enumerator = ScriptedEnumerator {
            steps: RefCell::new(vec![set(&["wlan0"])]),
        };
        let baseline = set(&["wlan0"]);
        let err = wait_for_new_interface(&enumerator, &baseline).unwrap_err();
        assert!(matches!(err, CoreError::CalibrationAmbiguous { count: 0 }));
    }

    #[test]
    fn two_new_interfaces_is_ambiguous() {
        let enumerator = ScriptedEnumerator {
            steps: RefCell::new(vec![set(&["wlan0", "wlan1", "wlan2"])]),
        };
        let baseline = set(&["wlan0"]);
        let err = wait_for_new_interface(&enumerator, &baseline).unwrap_err();
        assert!(matches!(err, CoreError::CalibrationAmbiguous { count: 2 }));
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = std::env::temp_dir().join(format!("visor-calib-test-{:?}", std::thread::current().id()));
        std::fs::create_dir_all(&dir).unwrap();
        let guard_cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(&dir).unwrap();

        let calibration = Calibration {
            left_interface: "wlan1".into(),
            right_interface: "wlan2".into(),
            scan_interface: "wlan1".into(),
            separation_m: 0.15,
        };
        save(&calibration).unwrap();
        let loaded = load().unwrap();
        assert_eq!(loaded, calibration);

        std::env::set_current_dir(guard_cwd).unwrap();
    }
}
