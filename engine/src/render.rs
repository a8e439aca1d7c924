//! Layout primitives consumed by the external drawing layer: where each RF
//! direction sits on the heading bar / compass ring, and what to show when a
//! data family is absent.

use std::time::{Duration, Instant};

use visor_types::RfDirection;

pub const GPS_PLACEHOLDER: &str = "GPS: N/A";
pub const WIFI_PLACEHOLDER: &str = "Wi-Fi: N/A";
pub const TEMPERATURE_PLACEHOLDER: &str = "N/A";

const HEADING_BAR_GROUP_DEG: f64 = 5.0;
const COMPASS_GROUP_DEG: f64 = 15.0;
const OFF_BAR_CUTOFF_DEG: f64 = 60.0;
const ROTATE_AFTER: usize = 8;
const ROTATE_INTERVAL: Duration = Duration::from_secs(3);

/// Relative angular offset of a bearing from the current heading, in (-180, 180].
pub fn relative_offset_deg(bearing_deg: f64, heading_deg: f64) -> f64 {
    ((bearing_deg - heading_deg + 540.0).rem_euclid(360.0)) - 180.0
}

/// One device placed on the bar/ring, with its stack position resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedDirection {
    pub ssid: String,
    pub offset_deg: f64,
    /// 0 = sits on the bar itself; increasing values stack outward.
    pub stack_depth: usize,
    /// Mean δ of this device's whole group — where the topmost slot sits on
    /// the bar. Leader lines run from each member's own `offset_deg` to here.
    pub group_anchor_deg: f64,
}

fn group_and_stack(mut entries: Vec<(RfDirection, f64)>, group_threshold_deg: f64) -> Vec<PlacedDirection> {
    entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut placed = Vec::with_capacity(entries.len());
    let mut group_start = 0usize;
    while group_start < entries.len() {
        let mut group_end = group_start + 1;
        while group_end < entries.len() && entries[group_end].1 - entries[group_start].1 <= group_threshold_deg {
            group_end += 1;
        }
        let mut group: Vec<_> = entries[group_start..group_end].to_vec();
        let mean_offset = group.iter().map(|(_, offset)| offset).sum::<f64>() / group.len() as f64;
        // strongest confidence first within a stack
        group.sort_by(|a, b| b.0.confidence.partial_cmp(&a.0.confidence).unwrap_or(std::cmp::Ordering::Equal));
        for (depth, (direction, offset)) in group.into_iter().enumerate() {
            placed.push(PlacedDirection {
                ssid: direction.ssid,
                offset_deg: offset,
                stack_depth: depth,
                group_anchor_deg: mean_offset,
            });
        }
        group_start = group_end;
    }
    placed
}

/// Heading-bar layout: devices within 60° of straight ahead, grouped at 5°.
pub fn heading_bar_layout(directions: &[RfDirection], heading_deg: f64) -> Vec<PlacedDirection> {
    let on_bar: Vec<(RfDirection, f64)> = directions
        .iter()
        .filter_map(|d| {
            let offset = relative_offset_deg(d.bearing_deg, heading_deg);
            (offset.abs() <= OFF_BAR_CUTOFF_DEG).then(|| (d.clone(), offset))
        })
        .collect();
    group_and_stack(on_bar, HEADING_BAR_GROUP_DEG)
}

/// Compass-ring layout: every device, grouped at 15°, no off-bar cutoff.
pub fn compass_layout(directions: &[RfDirection], heading_deg: f64) -> Vec<PlacedDirection> {
    let all: Vec<(RfDirection, f64)> = directions
        .iter()
        .map(|d| (d.clone(), relative_offset_deg(d.bearing_deg, heading_deg)))
        .collect();
    group_and_stack(all, COMPASS_GROUP_DEG)
}

/// Tracks which window of entries is visible when the list exceeds the
/// single-frame capacity, rotating one entry forward every three seconds.
pub struct RotationWindow {
    index: usize,
    last_rotated: Instant,
}

impl RotationWindow {
    pub fn new() -> Self {
        Self {
            index: 0,
            last_rotated: Instant::now(),
        }
    }

    /// Advance the window if due, then return the visible slice of `items`.
    pub fn visible<'a, T>(&mut self, items: &'a [T]) -> &'a [T] {
        if items.len() <= ROTATE_AFTER {
            self.index = 0;
            return items;
        }
        if self.last_rotated.elapsed() >= ROTATE_INTERVAL {
            self.index = (self.index + 1) % items.len();
            self.last_rotated = Instant::now();
        }
        let start = self.index;
        let end = (start + ROTATE_AFTER).min(items.len());
        if end - start < ROTATE_AFTER {
            &items[start..]
        } else {
            &items[start..end]
        }
    }
}

impl Default for RotationWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direction(ssid: &str, bearing: f64, confidence: f64) -> RfDirection {
        RfDirection {
            ssid: ssid.to_string(),
            bearing_deg: bearing,
            confidence,
        }
    }

    #[test]
    fn heading_bar_groups_within_five_degrees() {
        let directions = vec![
            direction("a", 356.0, 0.5), // -4 relative to heading 0
            direction("b", 358.0, 0.5), // -2
            direction("c", 0.0, 0.5),   // 0
            direction("d", 15.0, 0.5),  // +15, separate
        ];
        let placed = heading_bar_layout(&directions, 0.0);
        assert_eq!(placed.len(), 4);
        let stacked: Vec<_> = placed.iter().filter(|p| p.ssid != "d").collect();
        assert!(stacked.iter().any(|p| p.stack_depth == 1));
        let lone = placed.iter().find(|p| p.ssid == "d").unwrap();
        assert_eq!(lone.stack_depth, 0);
    }

    #[test]
    fn group_anchor_is_group_mean_offset() {
        let directions = vec![
            direction("a", 356.0, 0.5), // -4
            direction("b", 358.0, 0.5), // -2
            direction("c", 0.0, 0.5),   // 0
        ];
        let placed = heading_bar_layout(&directions, 0.0);
        let mean = (-4.0 + -2.0 + 0.0) / 3.0;
        for p in &placed {
            assert!((p.group_anchor_deg - mean).abs() < 1e-9);
        }
    }

    #[test]
    fn off_bar_cutoff_excludes_beyond_sixty_degrees() {
        let directions = vec![direction("far", 130.0, 0.9)];
        let placed = heading_bar_layout(&directions, 0.0);
        assert!(placed.is_empty());
    }

    #[test]
    fn compass_groups_within_fifteen_degrees() {
        let directions = vec![
            direction("a", 0.0, 0.5),
            direction("b", 10.0, 0.5),
            direction("c", 14.0, 0.5),
            direction("d", 30.0, 0.5),
        ];
        let placed = compass_layout(&directions, 0.0);
        let lone = placed.iter().find(|p| p.ssid == "d").unwrap();
        assert_eq!(lone.stack_depth, 0);
        let grouped_depths: usize = placed.iter().filter(|p| p.ssid != "d").map(|p| p.stack_depth).max().unwrap();
        assert!(grouped_depths >= 1);
    }

    #[test]
    fn rotation_window_passes_through_short_lists() {
        let items: Vec<i32> = (0..5).collect();
        let mut window = RotationWindow::new();
        assert_eq!(window.visible(&items), &items[..]);
    }

    #[test]
    fn rotation_window_caps_long_lists_at_eight() {
        let items: Vec<i32> = (0..20).collect();
        let mut window = RotationWindow::new();
        assert_eq!(window.visible(&items).len(), 8);
    }
}
