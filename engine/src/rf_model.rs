//! Classification, path-loss distance and dual-receiver triangulation for
//! scanned RF devices.

use visor_types::{Band, DeviceClass};

const DRONE_TOKENS: [&str; 5] = ["dji", "mavic", "phantom", "parrot", "autel"];
const STANDARD_2GHZ_CHANNELS: [u32; 3] = [1, 6, 11];
/// UNII channels a real access point would sit on at 5.8 GHz. A 5.8 GHz
/// beacon outside this set is a telltale sign of an FPV video link rather
/// than an AP, which is the positive drone indicator rule 2 needs.
const STANDARD_5_8GHZ_CHANNELS: [u32; 13] = [36, 40, 44, 48, 52, 56, 60, 64, 149, 153, 157, 161, 165];

/// Free-space path-loss reference transmit power, dBm.
pub const TX_REFERENCE_DBM: f64 = 27.55;
/// Additional loss assumed for 5.8 GHz relative to 2.4 GHz, dB.
pub const BAND_OFFSET_5_8GHZ_DB: f64 = 7.6;

fn band_offset_db(band: Band) -> f64 {
    match band {
        Band::Band24 => 0.0,
        Band::Band58 => BAND_OFFSET_5_8GHZ_DB,
    }
}

/// Classify a scanned device. Rules are evaluated in order; the first match wins.
///
/// `channel_stable` reports whether the same channel and a similar signal were
/// observed on the previous scan of this SSID (used by the router heuristic).
pub fn classify(ssid: &str, band: Band, channel: u32, channel_stable: bool) -> DeviceClass {
    let lower = ssid.to_lowercase();
    if DRONE_TOKENS.iter().any(|t| lower.contains(t)) {
        return DeviceClass::Drone;
    }
    if band == Band::Band58 && !looks_like_router_ssid(&lower) && !STANDARD_5_8GHZ_CHANNELS.contains(&channel) {
        return DeviceClass::Drone;
    }
    if STANDARD_2GHZ_CHANNELS.contains(&channel) && channel_stable {
        return DeviceClass::Router;
    }
    DeviceClass::Unknown
}

/// Crude heuristic: router SSIDs tend to carry ISP or vendor naming rather
/// than being short generated device names.
fn looks_like_router_ssid(lower: &str) -> bool {
    const ROUTER_HINTS: [&str; 6] = ["net", "wifi", "home", "router", "fiber", "att"];
    ROUTER_HINTS.iter().any(|h| lower.contains(h))
}

/// Invert free-space path loss to estimate distance from RSSI.
pub fn distance_m(rssi_dbm: i32, band: Band) -> f64 {
    let exponent = (TX_REFERENCE_DBM - rssi_dbm as f64 - band_offset_db(band)) / 20.0;
    10f64.powf(exponent)
}

/// Result of fusing two receivers' observations of the same SSID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fused {
    pub distance_m: f64,
    /// Signed bearing offset from current heading, degrees, clamped to ±60°.
    pub bearing_bias_deg: f64,
    pub confidence: f64,
}

/// Fuse left/right receiver RSSI and per-receiver distances into a single
/// distance-and-bearing estimate. Positive bias is to the right.
pub fn triangulate(left_dbm: i32, right_dbm: i32, d_left: f64, d_right: f64) -> Fused {
    let l = left_dbm as f64;
    let r = right_dbm as f64;
    // triangulate() takes dBm directly; weights are magnitudes so stronger
    // (less negative) signals pull the fused distance toward their side.
    let l_mag = -l;
    let r_mag = -r;
    let fused_distance = if l_mag + r_mag > 0.0 {
        (d_left * r_mag + d_right * l_mag) / (l_mag + r_mag)
    } else {
        (d_left + d_right) / 2.0
    };

    let diff = l - r;
    let bearing_bias_deg = if diff.abs() < 1.0 {
        0.0
    } else {
        (-diff * 3.0).clamp(-60.0, 60.0)
    };

    let confidence = (diff.abs() / 20.0).min(1.0);

    Fused {
        distance_m: fused_distance,
        bearing_bias_deg,
        confidence,
    }
}

/// Render a distance the way the overlay wants it: metres below 1 km, one
/// decimal of kilometres at or above.
pub fn format_distance(distance_m: f64) -> String {
    if distance_m < 1000.0 {
        format!("~{}m", distance_m.trunc() as i64)
    } else {
        format!("~{:.1}km", distance_m / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drone_token_wins_regardless_of_band() {
        assert_eq!(classify("DJI-Mavic-Air", Band::Band24, 6, false), DeviceClass::Drone);
    }

    #[test]
    fn stable_2_4ghz_channel_is_router() {
        assert_eq!(classify("HomeNet", Band::Band24, 6, true), DeviceClass::Router);
    }

    #[test]
    fn unnamed_5_8ghz_on_standard_channel_is_unknown() {
        // Channel 44 is a real UNII access-point channel, so the absence of a
        // router hint alone isn't a drone indicator; it falls through to unknown.
        assert_eq!(classify("Unnamed", Band::Band58, 44, false), DeviceClass::Unknown);
    }

    #[test]
    fn unnamed_5_8ghz_on_nonstandard_channel_is_drone() {
        // Channel 20 isn't a real 5.8GHz Wi-Fi channel, which is the positive
        // indicator rule 2 needs.
        assert_eq!(classify("Unnamed", Band::Band58, 20, false), DeviceClass::Drone);
    }

    #[test]
    fn distance_is_positive_over_normal_rssi_range() {
        for rssi in -100..=-20 {
            assert!(distance_m(rssi, Band::Band24) > 0.0);
        }
    }

    #[test]
    fn distance_round_trips_through_rssi() {
        let d = distance_m(-50, Band::Band24);
        let recovered_rssi = TX_REFERENCE_DBM - 20.0 * d.log10();
        assert!((recovered_rssi - (-50.0)).abs() < 1e-6);
    }

    #[test]
    fn scenario_a_router_distance() {
        let d = distance_m(-50, Band::Band24);
        assert!((d - 7542.0).abs() / 7542.0 < 0.01);
    }

    #[test]
    fn scenario_b_drone_distance() {
        let d = distance_m(-60, Band::Band58);
        assert!((d - 9943.0).abs() / 9943.0 < 0.01);
    }

    #[test]
    fn scenario_c_fusion() {
        let d_left = distance_m(-50, Band::Band24);
        let d_right = distance_m(-53, Band::Band24);
        let fused = triangulate(-50, -53, d_left, d_right);
        // stronger (left) signal pulls the fused distance toward d_left
        assert!(fused.distance_m > d_left && fused.distance_m < d_right);
        assert_eq!(fused.confidence, 0.15);
        assert!(fused.bearing_bias_deg < 0.0);
    }

    #[test]
    fn equal_signals_point_straight_ahead() {
        let fused = triangulate(-50, -50, 10.0, 10.0);
        assert_eq!(fused.bearing_bias_deg, 0.0);
    }

    #[test]
    fn distance_formatting_boundaries() {
        assert_eq!(format_distance(5.2), "~5m");
        assert_eq!(format_distance(999.9), "~999m");
        assert_eq!(format_distance(1000.0), "~1.0km");
        assert_eq!(format_distance(1500.0), "~1.5km");
    }
}
