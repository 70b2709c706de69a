//! Fourier-series field model inside the core window.
//!
//! The window is a rectangle of width `L` (between the legs) and height `H`
//! bounded by iron. Current density and vector potential are expanded in
//! `sin(mπx/L)·sin(nπy/H)`:
//!
//! ```text
//! J_mn = 4·J / (m·n·π²) · [cos(mπx1/L) − cos(mπx2/L)] · [cos(nπy1/H) − cos(nπy2/H)]
//! A_mn = µ0·J_mn / ((mπ/L)² + (nπ/H)²)
//! M'   = L·H / (4·I1·I2) · Σ J1_mn·A2_mn
//! ```
//!
//! Coefficients are computed per ampere (`J = N/A`), so the currents cancel.

use std::f64::consts::PI;

use crate::error::{CoilnetError, Result};
use crate::topology::{BasicSection, Core, Rect, Segment};
use crate::MU_0;

/// Geometric tolerance when checking that a section lies in the window (m).
const WINDOW_SLACK: f64 = 1e-9;

/// Window frame and the per-term `1/k²` weights shared by all segments.
#[derive(Debug, Clone)]
pub struct WindowGeometry {
    core_radius: f64,
    width: f64,
    height: f64,
    iterations: usize,
    /// `1 / ((mπ/L)² + (nπ/H)²)`, row-major in (m, n)
    inverse_k2: Vec<f64>,
}

impl WindowGeometry {
    pub fn new(core: &Core, iterations: usize) -> Self {
        let (width, height) = (core.window_width(), core.window_height());
        let mut inverse_k2 = Vec::with_capacity(iterations * iterations);
        for m in 1..=iterations {
            let km = m as f64 * PI / width;
            for n in 1..=iterations {
                let kn = n as f64 * PI / height;
                inverse_k2.push(1.0 / (km * km + kn * kn));
            }
        }
        Self {
            core_radius: core.radius(),
            width,
            height,
            iterations,
            inverse_k2,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Map a section rectangle into window coordinates `(x1, x2, y1, y2)`.
    ///
    /// `offset` is the axial shift `(H_used − H_real)/2` of the owning segment.
    fn to_window(&self, section: &BasicSection, offset: f64) -> Result<(f64, f64, f64, f64)> {
        let rect: &Rect = &section.rect;
        let x1 = rect.r1() - self.core_radius;
        let x2 = rect.r2() - self.core_radius;
        let y1 = rect.z1() + offset;
        let y2 = rect.z2() + offset;
        if x1 < -WINDOW_SLACK || x2 > self.width + WINDOW_SLACK {
            return Err(CoilnetError::illegal_location(
                section.location,
                format!(
                    "radial extent [{:.4}, {:.4}] m lies outside the window width {:.4} m",
                    x1, x2, self.width
                ),
            ));
        }
        if y1 < -WINDOW_SLACK || y2 > self.height + WINDOW_SLACK {
            return Err(CoilnetError::illegal_location(
                section.location,
                format!(
                    "axial extent [{:.4}, {:.4}] m lies outside the window height {:.4} m",
                    y1, y2, self.height
                ),
            ));
        }
        Ok((x1, x2, y1, y2))
    }
}

/// Precomputed `J_mn` and `A_mn` of one segment, per ampere.
#[derive(Debug, Clone)]
pub struct FourierCoefficients {
    iterations: usize,
    current_density: Vec<f64>,
    vector_potential: Vec<f64>,
}

impl FourierCoefficients {
    /// Expand every basic section of `segment` and sum the series.
    pub fn new(segment: &Segment, window: &WindowGeometry) -> Result<Self> {
        let k = window.iterations;
        let offset = 0.5 * (segment.used_window_height() - segment.real_window_height());
        let mut current_density = vec![0.0; k * k];

        let mut cx = vec![0.0; k];
        let mut cy = vec![0.0; k];
        for section in segment.sections() {
            let area = section.rect.area();
            if area <= 0.0 {
                continue;
            }
            let (x1, x2, y1, y2) = window.to_window(section, offset)?;
            let amplitude = 4.0 * (section.turns / area) / (PI * PI);
            for i in 0..k {
                let m = (i + 1) as f64;
                cx[i] = ((m * PI * x1 / window.width).cos() - (m * PI * x2 / window.width).cos()) / m;
                cy[i] = ((m * PI * y1 / window.height).cos() - (m * PI * y2 / window.height).cos()) / m;
            }
            for (i, &x) in cx.iter().enumerate() {
                let row = &mut current_density[i * k..(i + 1) * k];
                for (value, &y) in row.iter_mut().zip(&cy) {
                    *value += amplitude * x * y;
                }
            }
        }

        let vector_potential = current_density
            .iter()
            .zip(&window.inverse_k2)
            .map(|(j, w)| MU_0 * j * w)
            .collect();

        Ok(Self {
            iterations: k,
            current_density,
            vector_potential,
        })
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// `J_mn` for 1-based `m`, `n`.
    pub fn current_density(&self, m: usize, n: usize) -> f64 {
        self.current_density[(m - 1) * self.iterations + (n - 1)]
    }

    /// `A_mn` for 1-based `m`, `n`.
    pub fn vector_potential(&self, m: usize, n: usize) -> f64 {
        self.vector_potential[(m - 1) * self.iterations + (n - 1)]
    }

    /// Per-unit-length mutual inductance with `other` (H/m); self-inductance
    /// when `other` is the same segment.
    pub fn mutual(&self, other: &FourierCoefficients, window: &WindowGeometry) -> f64 {
        let sum: f64 = self
            .current_density
            .iter()
            .zip(&other.vector_potential)
            .map(|(j, a)| j * a)
            .sum();
        window.width * window.height / 4.0 * sum
    }
}
