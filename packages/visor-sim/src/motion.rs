//! motion.rs — synthetic wearer + emitter motion model
//!
//! Simulates the wearer walking a slow random-walk course while a handful of
//! RF emitters (routers, a drone) sit at fixed or drifting positions nearby.
//! Distances are converted back to RSSI through the inverse of the engine's
//! own path-loss model, so a simulated session exercises the same formulas
//! the real producers feed.

use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn dist(&self, other: &Vec2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn bearing_to(&self, other: &Vec2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dy.atan2(dx).to_degrees().rem_euclid(360.0)
    }
}

#[derive(Debug, Clone)]
pub struct Emitter {
    pub ssid: String,
    pub pos: Vec2,
    pub is_drone: bool,
    pub channel: u32,
    pub band_5_8ghz: bool,
}

pub struct WearerSim {
    pub pos: Vec2,
    pub heading_deg: f64,
    pub speed_mps: f64,
    emitters: Vec<Emitter>,
    rng: rand::rngs::ThreadRng,
}

impl WearerSim {
    pub fn new(emitters: Vec<Emitter>) -> Self {
        Self {
            pos: Vec2 { x: 0.0, y: 0.0 },
            heading_deg: 0.0,
            speed_mps: 1.2,
            emitters,
            rng: rand::thread_rng(),
        }
    }

    /// Advance the wearer by `dt_s` seconds of a gentle random walk.
    pub fn tick(&mut self, dt_s: f64) {
        let turn = Normal::new(0.0, 6.0).unwrap().sample(&mut self.rng);
        self.heading_deg = (self.heading_deg + turn).rem_euclid(360.0);
        let heading_rad = self.heading_deg.to_radians();
        self.pos.x += heading_rad.cos() * self.speed_mps * dt_s;
        self.pos.y += heading_rad.sin() * self.speed_mps * dt_s;
    }

    /// Observed (ssid, rssi_dbm, channel, is_5_8ghz) tuples for every emitter,
    /// RSSI derived by inverting the free-space path-loss formula the engine
    /// uses, with a little Gaussian jitter layered on top.
    pub fn observe(&mut self) -> Vec<(String, i32, u32, bool)> {
        const TX_REFERENCE_DBM: f64 = 27.55;
        let jitter = Normal::new(0.0, 2.0).unwrap();
        self.emitters
            .iter()
            .map(|e| {
                let band_offset = if e.band_5_8ghz { 7.6 } else { 0.0 };
                let d = self.pos.dist(&e.pos).max(0.5);
                let rssi = TX_REFERENCE_DBM - band_offset - 20.0 * d.log10();
                let noisy = rssi + jitter.sample(&mut self.rng);
                (e.ssid.clone(), noisy.round() as i32, e.channel, e.band_5_8ghz)
            })
            .collect()
    }

    pub fn default_emitters() -> Vec<Emitter> {
        vec![
            Emitter {
                ssid: "HomeNet".into(),
                pos: Vec2 { x: 30.0, y: 10.0 },
                is_drone: false,
                channel: 6,
                band_5_8ghz: false,
            },
            Emitter {
                ssid: "CafeWifi".into(),
                pos: Vec2 { x: -40.0, y: 25.0 },
                is_drone: false,
                channel: 1,
                band_5_8ghz: false,
            },
            Emitter {
                ssid: "DJI-Mavic-Air".into(),
                pos: Vec2 { x: 5.0, y: -60.0 },
                is_drone: true,
                channel: 44,
                band_5_8ghz: true,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observed_rssi_is_negative_and_bounded() {
        let mut sim = WearerSim::new(WearerSim::default_emitters());
        for reading in sim.observe() {
            assert!(reading.1 < 0);
        }
    }

    #[test]
    fn closer_emitter_reads_stronger_signal() {
        let mut sim = WearerSim::new(vec![Emitter {
            ssid: "Near".into(),
            pos: Vec2 { x: 1.0, y: 0.0 },
            is_drone: false,
            channel: 6,
            band_5_8ghz: false,
        }]);
        let near = sim.observe()[0].1;

        let mut far = WearerSim::new(vec![Emitter {
            ssid: "Far".into(),
            pos: Vec2 { x: 500.0, y: 0.0 },
            is_drone: false,
            channel: 6,
            band_5_8ghz: false,
        }]);
        let far_rssi = far.observe()[0].1;

        assert!(near > far_rssi);
    }
}
