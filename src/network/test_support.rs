//! Shared fixtures for the network unit tests.

use super::NetworkModel;
use crate::config::ModelConfig;
use crate::topology::{BasicSection, Core, Location};

pub const DISC_PITCH: f64 = 0.02;
pub const DISC_HEIGHT: f64 = 0.015;
pub const TURNS: f64 = 10.0;

pub fn core() -> Core {
    Core::new(0.4, 1.0, 1.2, 1.0).unwrap()
}

pub fn model() -> NetworkModel {
    let config = ModelConfig::new().with_fourier_iterations(30);
    NetworkModel::new(core(), 0.15, config).unwrap()
}

/// `count` consecutive discs of coil `radial` starting at `axial`.
///
/// Coil `c` spans r = 0.25 + 0.1·c .. +0.05; disc `a` starts at
/// z = 0.1 + a·DISC_PITCH.
pub fn disc_sections(radial: i32, axial: i32, count: i32) -> Vec<BasicSection> {
    let r1 = 0.25 + 0.1 * radial as f64;
    (axial..axial + count)
        .map(|a| {
            let z1 = 0.1 + a as f64 * DISC_PITCH;
            BasicSection::new(Location::new(radial, a), TURNS, 100.0, r1, r1 + 0.05, z1, z1 + DISC_HEIGHT)
        })
        .collect()
}
