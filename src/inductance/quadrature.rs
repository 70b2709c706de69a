//! Adaptive Gauss–Kronrod (7/15) quadrature.
//!
//! Global adaptive scheme: the interval with the largest error estimate is
//! bisected until the summed estimate meets `max(abs_tol, rel_tol·|I|)`.
//! Integrands are fallible so nested integrals can propagate failures.

use crate::error::{CoilnetError, Result};

/// Kronrod abscissae on [0, 1]; the last one is the centre.
const XGK: [f64; 8] = [
    0.991_455_371_120_812_6,
    0.949_107_912_342_758_5,
    0.864_864_423_359_769_1,
    0.741_531_185_599_394_4,
    0.586_087_235_467_691_1,
    0.405_845_151_377_397_2,
    0.207_784_955_007_898_5,
    0.0,
];

/// Kronrod weights matching `XGK`.
const WGK: [f64; 8] = [
    0.022_935_322_010_529_22,
    0.063_092_092_629_978_55,
    0.104_790_010_322_250_2,
    0.140_653_259_715_525_9,
    0.169_004_726_639_267_9,
    0.190_350_578_064_785_4,
    0.204_432_940_075_298_9,
    0.209_482_141_084_727_8,
];

/// Gauss weights for the odd Kronrod abscissae and the centre.
const WG: [f64; 4] = [
    0.129_484_966_168_869_7,
    0.279_705_391_489_276_7,
    0.381_830_050_505_118_9,
    0.417_959_183_673_469_4,
];

/// Default cap on the number of subintervals.
pub const DEFAULT_MAX_SUBDIVISIONS: usize = 400;

/// Result of one successful integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Estimate {
    pub value: f64,
    pub error: f64,
    pub evaluations: usize,
}

#[derive(Debug, Clone, Copy)]
struct Panel {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// Adaptive quadrature settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadrature {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub max_subdivisions: usize,
}

impl Quadrature {
    pub fn new(abs_tol: f64, rel_tol: f64) -> Self {
        Self {
            abs_tol,
            rel_tol,
            max_subdivisions: DEFAULT_MAX_SUBDIVISIONS,
        }
    }

    pub fn with_max_subdivisions(mut self, max_subdivisions: usize) -> Self {
        self.max_subdivisions = max_subdivisions;
        self
    }

    /// Integrate `f` over `[a, b]`.
    pub fn integrate<F>(&self, mut f: F, a: f64, b: f64) -> Result<Estimate>
    where
        F: FnMut(f64) -> Result<f64>,
    {
        if !(a.is_finite() && b.is_finite()) {
            return Err(CoilnetError::integration(a, b, "infinite bounds"));
        }
        if a == b {
            return Ok(Estimate {
                value: 0.0,
                error: 0.0,
                evaluations: 0,
            });
        }

        let mut evaluations = 0;
        let mut panels = vec![kronrod_panel(&mut f, a, b, &mut evaluations)?];

        loop {
            let value: f64 = panels.iter().map(|p| p.value).sum();
            let error: f64 = panels.iter().map(|p| p.error).sum();
            if !value.is_finite() {
                return Err(CoilnetError::integration(a, b, "integral is not finite"));
            }
            if error <= self.abs_tol.max(self.rel_tol * value.abs()) {
                return Ok(Estimate {
                    value,
                    error,
                    evaluations,
                });
            }
            if panels.len() >= self.max_subdivisions {
                return Err(CoilnetError::integration(
                    a,
                    b,
                    format!(
                        "no convergence after {} subintervals (error estimate {:.3e})",
                        panels.len(),
                        error
                    ),
                ));
            }

            let worst = panels
                .iter()
                .enumerate()
                .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let panel = panels.swap_remove(worst);
            let mid = 0.5 * (panel.a + panel.b);
            if mid == panel.a || mid == panel.b {
                return Err(CoilnetError::integration(a, b, "interval too small to bisect"));
            }
            panels.push(kronrod_panel(&mut f, panel.a, mid, &mut evaluations)?);
            panels.push(kronrod_panel(&mut f, mid, panel.b, &mut evaluations)?);
        }
    }
}

fn kronrod_panel<F>(f: &mut F, a: f64, b: f64, evaluations: &mut usize) -> Result<Panel>
where
    F: FnMut(f64) -> Result<f64>,
{
    let centre = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = f(centre)?;
    let mut kronrod = WGK[7] * fc;
    let mut gauss = WG[3] * fc;
    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = f(centre - dx)? + f(centre + dx)?;
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }
    *evaluations += 15;

    let value = kronrod * half;
    let error = ((kronrod - gauss) * half).abs();
    if !(value.is_finite() && error.is_finite()) {
        return Err(CoilnetError::integration(a, b, "integrand is not finite"));
    }
    Ok(Panel { a, b, value, error })
}
