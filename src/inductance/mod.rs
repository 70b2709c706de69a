//! Mutual inductance integrator.
//!
//! Two regimes combine into the inductance of a segment pair:
//!
//! - [`fourier`]: the part of each turn inside the core window, where the
//!   iron boundary is handled by a 2-D Fourier expansion.
//! - [`kernel`]: the part outside the window, a closed-form areal log kernel
//!   with a mirror image across the leg axis, integrated by adaptive
//!   [`quadrature`].
//!
//! Per-unit-length values are scaled to a full turn with the geometric mean
//! of the two mean turn lengths:
//!
//! ```text
//! M = 2π·sqrt(r̄1·r̄2) · (f·M'_in + (1 − f)·M'_out)
//! ```
//!
//! where `f` is the share of the circumference facing the window.

pub mod fourier;
pub mod kernel;
pub mod quadrature;

use std::f64::consts::PI;

pub use fourier::{FourierCoefficients, WindowGeometry};
pub use kernel::Conductor;
pub use quadrature::{Estimate, Quadrature};

use crate::config::ModelConfig;
use crate::error::Result;
use crate::topology::{Core, Segment};

/// A segment prepared for pairwise evaluation.
#[derive(Debug, Clone)]
pub struct PreparedSegment {
    pub mean_radius: f64,
    pub conductor: Conductor,
    pub coefficients: FourierCoefficients,
}

/// Evaluates segment-pair inductances for one core and configuration.
#[derive(Debug, Clone)]
pub struct InductanceIntegrator {
    window: WindowGeometry,
    quadrature: Quadrature,
    in_window_fraction: f64,
}

impl InductanceIntegrator {
    pub fn new(core: &Core, config: &ModelConfig) -> Self {
        Self {
            window: WindowGeometry::new(core, config.fourier_iterations),
            quadrature: Quadrature::new(config.quad_abs_tol, config.quad_rel_tol),
            in_window_fraction: config.in_window_fraction,
        }
    }

    pub fn window(&self) -> &WindowGeometry {
        &self.window
    }

    /// Precompute the Fourier coefficients and outside-window conductor.
    pub fn prepare(&self, segment: &Segment) -> Result<PreparedSegment> {
        Ok(PreparedSegment {
            mean_radius: segment.mean_radius(),
            conductor: Conductor {
                rect: *segment.rect(),
                turns: segment.turns(),
            },
            coefficients: FourierCoefficients::new(segment, &self.window)?,
        })
    }

    /// Per-unit-length inductance inside the window (H/m).
    pub fn in_window(&self, a: &PreparedSegment, b: &PreparedSegment) -> f64 {
        a.coefficients.mutual(&b.coefficients, &self.window)
    }

    /// Per-unit-length inductance outside the window (H/m).
    pub fn outside_window(&self, a: &PreparedSegment, b: &PreparedSegment) -> Result<f64> {
        kernel::outside_mutual(&a.conductor, &b.conductor, &self.quadrature)
    }

    /// Mutual (or, for `a == b`, self) inductance in henries.
    pub fn mutual(&self, a: &PreparedSegment, b: &PreparedSegment) -> Result<f64> {
        let f = self.in_window_fraction;
        let inside = if f > 0.0 { self.in_window(a, b) } else { 0.0 };
        let outside = if f < 1.0 { self.outside_window(a, b)? } else { 0.0 };
        let turn_length = 2.0 * PI * (a.mean_radius * b.mean_radius).sqrt();
        Ok(turn_length * (f * inside + (1.0 - f) * outside))
    }
}
