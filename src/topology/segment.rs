//! Basic sections and the segments built from them.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::connector::{Connection, ConnectorLocation};
use super::magnetic_core::Core;
use super::types::{Location, Rect, SegmentId};
use crate::error::{CoilnetError, Result};

/// The smallest physical unit of a winding: one disc or one layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BasicSection {
    pub location: Location,
    /// Number of turns
    pub turns: f64,
    /// Series (terminal) current in amperes
    pub current: f64,
    pub rect: Rect,
}

impl BasicSection {
    /// Create a basic section from its bounds.
    pub fn new(location: Location, turns: f64, current: f64, r1: f64, r2: f64, z1: f64, z2: f64) -> Self {
        Self {
            location,
            turns,
            current,
            rect: Rect::from_bounds(r1, r2, z1, z2),
        }
    }
}

/// What a segment represents in the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Winding,
    StaticRing,
    RadialShield,
}

/// An axially contiguous run of basic sections within one coil; the unit the
/// network model simulates. Shielding elements are segments without sections.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    id: SegmentId,
    location: Location,
    kind: SegmentKind,
    pub interleaved: bool,
    current: f64,
    real_window_height: f64,
    used_window_height: f64,
    rect: Rect,
    sections: Vec<BasicSection>,
    pub connections: Vec<Connection>,
    /// Filled in by the series capacitance pass
    pub series_capacitance: Option<f64>,
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Segment {}

impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Segment {
    /// Build a winding segment from consecutive basic sections.
    ///
    /// All sections must share one radial index and their axial indices must
    /// rise by exactly one.
    pub fn new(id: SegmentId, sections: Vec<BasicSection>, core: &Core) -> Result<Self> {
        let first = sections
            .first()
            .ok_or(CoilnetError::ArgumentIsZeroCount { argument: "sections" })?;

        if first.location.is_shielding() {
            return Err(CoilnetError::illegal_location(
                first.location,
                "basic sections cannot use shielding sentinels",
            ));
        }

        let mut rect = first.rect;
        for pair in sections.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.location.radial != lower.location.radial {
                return Err(CoilnetError::illegal_location(
                    upper.location,
                    format!("radial index differs from {}", lower.location),
                ));
            }
            if upper.location.axial != lower.location.axial + 1 {
                return Err(CoilnetError::illegal_gap(
                    upper.location,
                    format!("axial index does not follow {}", lower.location),
                ));
            }
            rect = rect.union(&upper.rect);
        }

        Ok(Self {
            id,
            location: first.location,
            kind: SegmentKind::Winding,
            interleaved: false,
            current: first.current,
            real_window_height: core.real_window_height,
            used_window_height: core.window_height(),
            rect,
            sections,
            connections: Vec::new(),
            series_capacitance: None,
        })
    }

    /// Build a shielding element (static ring or radial shield).
    pub fn shield(id: SegmentId, location: Location, rect: Rect, core: &Core) -> Result<Self> {
        let kind = if location.is_static_ring() {
            SegmentKind::StaticRing
        } else if location.is_radial_shield() {
            SegmentKind::RadialShield
        } else {
            return Err(CoilnetError::NotAShieldingElement { location });
        };
        Ok(Self {
            id,
            location,
            kind,
            interleaved: false,
            current: 0.0,
            real_window_height: core.real_window_height,
            used_window_height: core.window_height(),
            rect,
            sections: Vec::new(),
            connections: Vec::new(),
            series_capacitance: None,
        })
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    pub fn is_shielding(&self) -> bool {
        self.kind != SegmentKind::Winding
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    pub fn rect(&self) -> &Rect {
        &self.rect
    }

    pub fn sections(&self) -> &[BasicSection] {
        &self.sections
    }

    pub fn real_window_height(&self) -> f64 {
        self.real_window_height
    }

    pub fn used_window_height(&self) -> f64 {
        self.used_window_height
    }

    /// Coil (radial index) the segment belongs to.
    pub fn coil(&self) -> usize {
        self.location.coil()
    }

    /// Axial index of the topmost section.
    pub fn last_axial(&self) -> i32 {
        self.location.axial + self.sections.len().saturating_sub(1) as i32
    }

    /// Whether `axial` is one of this segment's section indices.
    pub fn covers_axial(&self, axial: i32) -> bool {
        !self.is_shielding() && axial >= self.location.axial && axial <= self.last_axial()
    }

    /// Copper cross-section: the sum of the section areas.
    pub fn area(&self) -> f64 {
        self.sections.iter().map(|s| s.rect.area()).sum()
    }

    /// Total number of turns.
    pub fn turns(&self) -> f64 {
        self.sections.iter().map(|s| s.turns).sum()
    }

    /// Current density N·I/A averaged over the segment.
    pub fn current_density(&self) -> f64 {
        let area = self.area();
        if area > 0.0 {
            self.turns() * self.current / area
        } else {
            0.0
        }
    }

    pub fn mean_radius(&self) -> f64 {
        self.rect.mean_radius()
    }

    /// Length of one mean turn.
    pub fn mean_turn_length(&self) -> f64 {
        2.0 * std::f64::consts::PI * self.mean_radius()
    }

    /// DC resistance of the segment conductor for a given resistivity (Ω·m),
    /// assuming each turn uses an equal share of the section area.
    pub fn dc_resistance(&self, resistivity: f64) -> f64 {
        self.sections
            .iter()
            .filter(|s| s.rect.area() > 0.0)
            .map(|s| {
                let length = s.turns * 2.0 * std::f64::consts::PI * s.rect.mean_radius();
                let conductor_area = s.rect.area() / s.turns.max(1.0);
                resistivity * length / conductor_area
            })
            .sum()
    }

    /// Connection attached at a given position of this segment.
    pub fn connection_at(&self, from: ConnectorLocation) -> Option<&Connection> {
        self.connections.iter().find(|c| c.from == from)
    }

    /// Connection that leads to `target`, if any.
    pub fn connection_to(&self, target: SegmentId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.segment == Some(target))
    }

    /// Position where current enters (the lower-family connection), if known.
    pub fn entry_location(&self) -> Option<ConnectorLocation> {
        self.connections.iter().map(|c| c.from).find(|from| from.is_lower())
    }

    /// Re-anchor the window heights, e.g. after the core changed.
    pub fn set_window_heights(&mut self, core: &Core) {
        self.real_window_height = core.real_window_height;
        self.used_window_height = core.window_height();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> Core {
        Core::new(0.4, 1.0, 1.0, 1.2).unwrap()
    }

    fn disc(radial: i32, axial: i32) -> BasicSection {
        let z1 = 0.1 + axial as f64 * 0.02;
        BasicSection::new(Location::new(radial, axial), 10.0, 100.0, 0.25, 0.30, z1, z1 + 0.015)
    }

    #[test]
    fn test_contiguous_sections_build() {
        let seg = Segment::new(SegmentId(0), vec![disc(0, 2), disc(0, 3), disc(0, 4)], &core()).unwrap();
        assert_eq!(seg.location(), Location::new(0, 2));
        assert_eq!(seg.last_axial(), 4);
        assert!((seg.turns() - 30.0).abs() < 1e-12);
        assert!((seg.rect().z1() - 0.14).abs() < 1e-12);
        assert!((seg.rect().z2() - 0.195).abs() < 1e-12);
        assert!(seg.covers_axial(3));
        assert!(!seg.covers_axial(5));
    }

    #[test]
    fn test_axial_gap_rejected() {
        let err = Segment::new(SegmentId(0), vec![disc(0, 0), disc(0, 2)], &core()).unwrap_err();
        assert!(matches!(err, CoilnetError::IllegalAxialGap { .. }));
    }

    #[test]
    fn test_descending_axial_rejected() {
        let err = Segment::new(SegmentId(0), vec![disc(0, 1), disc(0, 0)], &core()).unwrap_err();
        assert!(matches!(err, CoilnetError::IllegalAxialGap { .. }));
    }

    #[test]
    fn test_radial_change_rejected() {
        let err = Segment::new(SegmentId(0), vec![disc(0, 0), disc(1, 1)], &core()).unwrap_err();
        assert!(matches!(err, CoilnetError::IllegalLocation { .. }));
    }

    #[test]
    fn test_empty_sections_rejected() {
        let err = Segment::new(SegmentId(0), Vec::new(), &core()).unwrap_err();
        assert!(matches!(err, CoilnetError::ArgumentIsZeroCount { .. }));
    }

    #[test]
    fn test_identity_is_by_id() {
        let a = Segment::new(SegmentId(1), vec![disc(0, 0)], &core()).unwrap();
        let b = Segment::new(SegmentId(1), vec![disc(0, 5)], &core()).unwrap();
        let c = Segment::new(SegmentId(2), vec![disc(0, 0)], &core()).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_current_density() {
        let seg = Segment::new(SegmentId(0), vec![disc(0, 0)], &core()).unwrap();
        let area = 0.05 * 0.015;
        assert!((seg.current_density() - 10.0 * 100.0 / area).abs() / (1000.0 / area) < 1e-12);
    }

    #[test]
    fn test_shield_requires_sentinel() {
        let rect = Rect::from_bounds(0.2, 0.21, 0.0, 1.0);
        assert!(Segment::shield(SegmentId(0), Location::new(0, 0), rect, &core()).is_err());
        let ring = Segment::shield(SegmentId(0), Location::static_ring(0, 0), rect, &core()).unwrap();
        assert_eq!(ring.kind(), SegmentKind::StaticRing);
        assert!(ring.is_shielding());
    }
}
