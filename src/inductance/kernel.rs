//! Closed-form areal kernel for the field outside the core window.
//!
//! Outside the window a segment sees free space plus the core leg, which is
//! modelled by an image conductor mirrored across the leg axis (`r → −r`)
//! carrying the opposite current. Per unit length, two uniform rectangular
//! conductors then couple through
//!
//! ```text
//! M' = N1·N2·µ0 / (4π·A1·A2) · ∫_{R1} [Φ_img(x, y) − Φ_dir(x, y)] dA
//! Φ_dir(x, y) = ∫_{R2} ln((x − x')² + (y − y')²) dA'
//! Φ_img(x, y) = ∫_{R2} ln((x + x')² + (y − y')²) dA'
//! ```
//!
//! The inner integrals are closed form; the outer one is adaptive quadrature.

use std::f64::consts::PI;

use super::quadrature::Quadrature;
use crate::error::Result;
use crate::topology::Rect;
use crate::MU_0;

/// Mixed antiderivative of `ln(u² + v²)`: `∂²F/∂u∂v = ln(u² + v²)`.
pub fn log_antiderivative(u: f64, v: f64) -> f64 {
    let r2 = u * u + v * v;
    if r2 == 0.0 {
        return 0.0;
    }
    let log_term = if u == 0.0 || v == 0.0 { 0.0 } else { u * v * r2.ln() };
    let u_term = if u == 0.0 { 0.0 } else { u * u * (v / u).atan() };
    let v_term = if v == 0.0 { 0.0 } else { v * v * (u / v).atan() };
    log_term - 3.0 * u * v + u_term + v_term
}

/// `∫_{R} ln((x − x')² + (y − y')²) dA'` over the source rectangle.
pub fn phi_direct(rect: &Rect, x: f64, y: f64) -> f64 {
    let (ub, ua) = (x - rect.r1(), x - rect.r2());
    let (vb, va) = (y - rect.z1(), y - rect.z2());
    log_antiderivative(ub, vb) - log_antiderivative(ua, vb) - log_antiderivative(ub, va)
        + log_antiderivative(ua, va)
}

/// Same integral for the source mirrored across the leg axis.
pub fn phi_image(rect: &Rect, x: f64, y: f64) -> f64 {
    let (u2, u1) = (x + rect.r2(), x + rect.r1());
    let (vb, va) = (y - rect.z1(), y - rect.z2());
    log_antiderivative(u2, vb) - log_antiderivative(u1, vb) - log_antiderivative(u2, va)
        + log_antiderivative(u1, va)
}

/// A uniformly current-dense conductor cross-section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conductor {
    pub rect: Rect,
    pub turns: f64,
}

/// Per-unit-length mutual inductance outside the window (H/m).
///
/// The outer integral runs over the unit square mapped onto `a`, with the
/// kernel divided by `b`'s area, so the quadrature sees the mean log ratio
/// (order one) and the tolerances stay meaningful for any conductor size.
pub fn outside_mutual(a: &Conductor, b: &Conductor, quad: &Quadrature) -> Result<f64> {
    let (area_a, area_b) = (a.rect.area(), b.rect.area());
    if area_a <= 0.0 || area_b <= 0.0 {
        return Ok(0.0);
    }
    let source = b.rect;
    let (r1, width) = (a.rect.r1(), a.rect.width());
    let (z1, height) = (a.rect.z1(), a.rect.height());
    let mean_log = quad.integrate(
        |s| {
            let x = r1 + s * width;
            quad.integrate(
                |t| {
                    let y = z1 + t * height;
                    Ok((phi_image(&source, x, y) - phi_direct(&source, x, y)) / area_b)
                },
                0.0,
                1.0,
            )
            .map(|e| e.value)
        },
        0.0,
        1.0,
    )?;
    Ok(a.turns * b.turns * MU_0 / (4.0 * PI) * mean_log.value)
}
