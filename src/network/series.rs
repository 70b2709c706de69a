//! Series capacitance along a coil.
//!
//! The engine works out the axial context of every winding segment (gaps to
//! the neighbours directly below and above, static rings, coil ends) and
//! hands it to a [`SeriesCapacitanceModel`].

use std::f64::consts::PI;
use std::fmt;

use super::NetworkModel;
use crate::config::ModelConfig;
use crate::error::{CoilnetError, Result};
use crate::topology::Segment;
use crate::EPSILON_0;

/// Axial surroundings of a segment.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeriesContext {
    /// Clearance to the segment or static ring directly below (m)
    pub gap_below: Option<f64>,
    /// Clearance to the segment or static ring directly above (m)
    pub gap_above: Option<f64>,
    pub static_ring_below: bool,
    pub static_ring_above: bool,
    /// Nothing below the segment in its coil
    pub end_of_coil_below: bool,
    /// Nothing above the segment in its coil
    pub end_of_coil_above: bool,
}

/// Computes the series capacitance of one winding segment.
pub trait SeriesCapacitanceModel: fmt::Debug {
    fn series_capacitance(
        &self,
        segment: &Segment,
        context: &SeriesContext,
        config: &ModelConfig,
    ) -> Result<f64>;
}

/// Disc-winding series capacitance.
///
/// Each basic section contributes the turn-to-turn capacitance of its `n`
/// turns, `Cs = Ct·(n−1)/n²` with `Ct = ε0·εpaper·2π·r̄·h / t`, or
/// `Ct·(n−1)/4` when interleaved. Sections add in series. Every axial gap
/// adds the disc-to-disc term `ε0·εoil·π(r2² − r1²) / (3g)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscSeriesModel;

impl DiscSeriesModel {
    /// Turn-to-turn series capacitance of one disc with `turns` turns.
    pub fn section_capacitance(
        mean_radius: f64,
        height: f64,
        turns: f64,
        interleaved: bool,
        config: &ModelConfig,
    ) -> Option<f64> {
        if turns < 2.0 {
            return None;
        }
        let ct = EPSILON_0 * config.eps_paper * 2.0 * PI * mean_radius * height / config.turn_insulation;
        Some(if interleaved {
            ct * (turns - 1.0) / 4.0
        } else {
            ct * (turns - 1.0) / (turns * turns)
        })
    }

    /// Capacitance across an oil gap of width `gap` over the disc face.
    pub fn gap_capacitance(r1: f64, r2: f64, gap: f64, config: &ModelConfig) -> f64 {
        EPSILON_0 * config.eps_oil * PI * (r2 * r2 - r1 * r1) / (3.0 * gap)
    }
}

impl SeriesCapacitanceModel for DiscSeriesModel {
    fn series_capacitance(
        &self,
        segment: &Segment,
        context: &SeriesContext,
        config: &ModelConfig,
    ) -> Result<f64> {
        let inverse: f64 = segment
            .sections()
            .iter()
            .filter_map(|s| {
                Self::section_capacitance(
                    s.rect.mean_radius(),
                    s.rect.height(),
                    s.turns,
                    segment.interleaved,
                    config,
                )
            })
            .map(|c| 1.0 / c)
            .sum();
        let mut total = if inverse > 0.0 { 1.0 / inverse } else { 0.0 };

        let rect = segment.rect();
        for gap in [context.gap_below, context.gap_above].into_iter().flatten() {
            if !(gap > 0.0) {
                return Err(CoilnetError::illegal_gap(
                    segment.location(),
                    format!("gap of {:.3e} m", gap),
                ));
            }
            total += Self::gap_capacitance(rect.r1(), rect.r2(), gap, config);
        }
        Ok(total)
    }
}

impl NetworkModel {
    /// Axial context of a winding segment. Looks exactly one neighbour
    /// below and one above; a static ring takes precedence over a segment.
    pub fn series_context(&self, segment: &Segment) -> Result<SeriesContext> {
        let coil = segment.coil();
        let mut context = SeriesContext::default();

        let coil_segments = self.coil_segments(coil);
        let rank = coil_segments
            .iter()
            .position(|s| s.id() == segment.id())
            .ok_or(CoilnetError::SegmentNotInModel { id: segment.id() })?;
        let below = rank.checked_sub(1).and_then(|i| coil_segments.get(i));
        let above = coil_segments.get(rank + 1);

        if let Some(ring) = self.static_ring(coil, segment.location().axial) {
            context.static_ring_below = true;
            context.gap_below = Some(segment.rect().z1() - ring.rect().z2());
        } else if let Some(lower) = below {
            context.gap_below = Some(segment.rect().z1() - lower.rect().z2());
        }
        context.end_of_coil_below = below.is_none();

        if let Some(ring) = self.static_ring(coil, segment.last_axial() + 1) {
            context.static_ring_above = true;
            context.gap_above = Some(ring.rect().z1() - segment.rect().z2());
        } else if let Some(upper) = above {
            context.gap_above = Some(upper.rect().z1() - segment.rect().z2());
        }
        context.end_of_coil_above = above.is_none();

        for gap in [context.gap_below, context.gap_above].into_iter().flatten() {
            if !(gap > 0.0) {
                return Err(CoilnetError::illegal_gap(
                    segment.location(),
                    format!("neighbour overlaps or touches (gap {:.3e} m)", gap),
                ));
            }
        }
        Ok(context)
    }

    /// Compute and store the series capacitance of every winding segment.
    pub fn compute_series_capacitances(&mut self) -> Result<()> {
        if self.winding_count() == 0 {
            return Err(CoilnetError::EmptyModel);
        }
        let mut values = Vec::new();
        for segment in self.winding_segments() {
            let context = self.series_context(segment)?;
            let value = self
                .series_model
                .series_capacitance(segment, &context, &self.config)?;
            log::debug!(
                "series capacitance of {} at {}: {:.4e} F",
                segment.id(),
                segment.location(),
                value
            );
            values.push((segment.id(), value));
        }
        for (id, value) in values {
            let index = self.position(id)?;
            self.segments[index].series_capacitance = Some(value);
        }
        self.capacitance = None;
        Ok(())
    }

    /// Series capacitance of a segment, if computed.
    pub fn series_capacitance(&self, id: crate::topology::SegmentId) -> Result<f64> {
        self.segment(id)?
            .series_capacitance
            .ok_or(CoilnetError::CapacitanceNotCalculated {
                what: "series capacitance",
            })
    }
}
