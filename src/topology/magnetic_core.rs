//! Magnetic core description.

use serde::{Deserialize, Serialize};

use crate::error::{CoilnetError, Result};

/// The core leg and window the windings sit in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Core {
    /// Leg diameter (m)
    pub diameter: f64,
    /// Physical window height between the yokes (m)
    pub real_window_height: f64,
    /// Multiplier applied to the window height to model fringing/leakage margin
    pub window_height_factor: f64,
    /// Distance between the centres of adjacent legs (m)
    pub leg_center: f64,
}

impl Core {
    /// Create a validated core.
    pub fn new(
        diameter: f64,
        real_window_height: f64,
        window_height_factor: f64,
        leg_center: f64,
    ) -> Result<Self> {
        let core = Self {
            diameter,
            real_window_height,
            window_height_factor,
            leg_center,
        };
        core.validate()?;
        Ok(core)
    }

    /// Check the invariants; used after deserialization as well.
    pub fn validate(&self) -> Result<()> {
        if !(self.diameter > 0.0) {
            return Err(CoilnetError::invalid_parameter("diameter", "must be positive"));
        }
        if !(self.real_window_height > 0.0) {
            return Err(CoilnetError::invalid_parameter(
                "real_window_height",
                "must be positive",
            ));
        }
        if !(self.window_height_factor >= 1.0) {
            return Err(CoilnetError::invalid_parameter(
                "window_height_factor",
                "must be at least 1",
            ));
        }
        if !(self.leg_center > self.diameter) {
            return Err(CoilnetError::invalid_parameter(
                "leg_center",
                "must exceed the leg diameter",
            ));
        }
        Ok(())
    }

    pub fn radius(&self) -> f64 {
        0.5 * self.diameter
    }

    /// Window height used by the in-window field model.
    pub fn window_height(&self) -> f64 {
        self.real_window_height * self.window_height_factor
    }

    /// Clear width between two adjacent legs.
    pub fn window_width(&self) -> f64 {
        self.leg_center - self.diameter
    }

    /// Axial shift from physical z to the enlarged window frame.
    pub fn window_offset(&self) -> f64 {
        0.5 * (self.window_height() - self.real_window_height)
    }
}
