//! Model configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CoilnetError, Result};

/// Default Fourier truncation per axis (m, n = 1..=K).
pub const DEFAULT_FOURIER_ITERATIONS: usize = 200;

/// Default absolute tolerance for the outside-window quadrature.
pub const DEFAULT_QUAD_ABS_TOLERANCE: f64 = 1e-10;

/// Default relative tolerance for the outside-window quadrature.
pub const DEFAULT_QUAD_REL_TOLERANCE: f64 = 1e-9;

/// Configuration for a [`NetworkModel`](crate::network::NetworkModel).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Fourier terms per axis for the in-window field model.
    pub fourier_iterations: usize,
    /// Absolute tolerance of the adaptive quadrature.
    pub quad_abs_tol: f64,
    /// Relative tolerance of the adaptive quadrature.
    pub quad_rel_tol: f64,
    /// Relative permittivity of the insulating oil.
    pub eps_oil: f64,
    /// Relative permittivity of the solid barriers in the hi-lo gaps.
    pub eps_solid: f64,
    /// Relative permittivity of the turn-to-turn paper.
    pub eps_paper: f64,
    /// Radial turn insulation thickness (m).
    pub turn_insulation: f64,
    /// Share of each hi-lo gap filled with solid insulation (0..1).
    pub hilo_solid_fraction: f64,
    /// Share of the winding circumference facing the core window.
    ///
    /// Weights the in-window against the outside-window inductance, and the
    /// adjacent leg against the tank for the outermost coil's shunt.
    pub in_window_fraction: f64,
    /// Relative tolerance attached to assembled matrices.
    pub matrix_tolerance: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            fourier_iterations: DEFAULT_FOURIER_ITERATIONS,
            quad_abs_tol: DEFAULT_QUAD_ABS_TOLERANCE,
            quad_rel_tol: DEFAULT_QUAD_REL_TOLERANCE,
            eps_oil: 2.2,
            eps_solid: 4.4,
            eps_paper: 3.5,
            turn_insulation: 0.5e-3,
            hilo_solid_fraction: 0.3,
            in_window_fraction: 0.5,
            matrix_tolerance: crate::matrix::DEFAULT_RELATIVE_TOLERANCE,
        }
    }
}

impl ModelConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the Fourier truncation.
    ///
    /// Cost grows with the square of the value; 200 resolves disc-sized
    /// sections in a typical window.
    pub fn with_fourier_iterations(mut self, iterations: usize) -> Self {
        self.fourier_iterations = iterations;
        self
    }

    /// Set the quadrature tolerances.
    pub fn with_quadrature_tolerance(mut self, abs_tol: f64, rel_tol: f64) -> Self {
        self.quad_abs_tol = abs_tol;
        self.quad_rel_tol = rel_tol;
        self
    }

    /// Set the relative permittivities of oil, solid barriers and paper.
    pub fn with_permittivities(mut self, oil: f64, solid: f64, paper: f64) -> Self {
        self.eps_oil = oil;
        self.eps_solid = solid;
        self.eps_paper = paper;
        self
    }

    /// Set the turn insulation thickness (m).
    pub fn with_turn_insulation(mut self, thickness: f64) -> Self {
        self.turn_insulation = thickness;
        self
    }

    /// Set the solid share of the hi-lo gaps.
    pub fn with_hilo_solid_fraction(mut self, fraction: f64) -> Self {
        self.hilo_solid_fraction = fraction;
        self
    }

    /// Set the in-window share of the circumference.
    pub fn with_in_window_fraction(mut self, fraction: f64) -> Self {
        self.in_window_fraction = fraction;
        self
    }

    /// Set the relative tolerance for matrix comparisons.
    pub fn with_matrix_tolerance(mut self, tolerance: f64) -> Self {
        self.matrix_tolerance = tolerance;
        self
    }

    /// Reject values the physics cannot use.
    pub fn validate(&self) -> Result<()> {
        if self.fourier_iterations == 0 {
            return Err(CoilnetError::ArgumentIsZeroCount {
                argument: "fourier_iterations",
            });
        }
        for (name, value) in [
            ("quad_abs_tol", self.quad_abs_tol),
            ("quad_rel_tol", self.quad_rel_tol),
            ("eps_oil", self.eps_oil),
            ("eps_solid", self.eps_solid),
            ("eps_paper", self.eps_paper),
            ("turn_insulation", self.turn_insulation),
            ("matrix_tolerance", self.matrix_tolerance),
        ] {
            if !(value > 0.0) {
                return Err(CoilnetError::invalid_parameter(name, "must be positive"));
            }
        }
        for (name, value) in [
            ("hilo_solid_fraction", self.hilo_solid_fraction),
            ("in_window_fraction", self.in_window_fraction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(CoilnetError::invalid_parameter(name, "must lie in [0, 1]"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = ModelConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fourier_iterations, 200);
    }

    #[test]
    fn test_builder() {
        let config = ModelConfig::new()
            .with_fourier_iterations(40)
            .with_permittivities(2.0, 4.0, 3.0)
            .with_in_window_fraction(0.25);
        assert_eq!(config.fourier_iterations, 40);
        assert_eq!(config.eps_solid, 4.0);
        assert_eq!(config.in_window_fraction, 0.25);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ModelConfig::new().with_fourier_iterations(0).validate().is_err());
        assert!(ModelConfig::new().with_turn_insulation(0.0).validate().is_err());
        assert!(ModelConfig::new().with_hilo_solid_fraction(1.5).validate().is_err());
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: ModelConfig = serde_json::from_str(r#"{"eps_oil": 2.0}"#).unwrap();
        assert_eq!(config.eps_oil, 2.0);
        assert_eq!(config.eps_paper, 3.5);
    }
}
