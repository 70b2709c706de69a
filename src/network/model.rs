//! The segment store and its indexing.

use std::collections::BTreeMap;

use super::series::{DiscSeriesModel, SeriesCapacitanceModel};
use crate::config::ModelConfig;
use crate::error::{CoilnetError, Result};
use crate::matrix::Matrix;
use crate::topology::{BasicSection, Core, Location, Node, Segment, SegmentId, SegmentIdAllocator};

/// Network model of a winding assembly.
///
/// Owns the sorted segment store, the generated nodes and the computed
/// matrices. Any structural change drops every computed artifact.
#[derive(Debug)]
pub struct NetworkModel {
    pub(super) core: Core,
    pub(super) tank_depth: f64,
    pub(super) config: ModelConfig,
    pub(super) allocator: SegmentIdAllocator,
    /// Sorted by location; shielding elements included
    pub(super) segments: Vec<Segment>,
    pub(super) series_model: Box<dyn SeriesCapacitanceModel>,
    pub(super) nodes: Option<Vec<Node>>,
    /// (bottom, top) node of each winding segment
    pub(super) segment_nodes: BTreeMap<SegmentId, (usize, usize)>,
    pub(super) capacitance: Option<Matrix>,
    pub(super) inductance: Option<Matrix>,
}

impl NetworkModel {
    /// Create an empty model around a core and tank.
    pub fn new(core: Core, tank_depth: f64, config: ModelConfig) -> Result<Self> {
        core.validate()?;
        config.validate()?;
        if !(tank_depth > 0.0) {
            return Err(CoilnetError::invalid_parameter("tank_depth", "must be positive"));
        }
        Ok(Self {
            core,
            tank_depth,
            config,
            allocator: SegmentIdAllocator::new(),
            segments: Vec::new(),
            series_model: Box::new(DiscSeriesModel),
            nodes: None,
            segment_nodes: BTreeMap::new(),
            capacitance: None,
            inductance: None,
        })
    }

    /// Replace the series capacitance model.
    pub fn with_series_model(mut self, model: Box<dyn SeriesCapacitanceModel>) -> Self {
        self.series_model = model;
        self.invalidate();
        self
    }

    pub fn core(&self) -> &Core {
        &self.core
    }

    pub fn tank_depth(&self) -> f64 {
        self.tank_depth
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Build a winding segment with a fresh id. The segment is not inserted.
    pub fn new_segment(&mut self, sections: Vec<BasicSection>) -> Result<Segment> {
        let id = self.allocator.allocate();
        Segment::new(id, sections, &self.core)
    }

    pub(super) fn allocate_id(&mut self) -> SegmentId {
        self.allocator.allocate()
    }

    /// All segments, shielding elements included, in location order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Winding (non-shielding) segments in matrix order.
    pub fn winding_segments(&self) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(|s| !s.is_shielding())
    }

    /// Number of winding segments, i.e. the inductance matrix size.
    pub fn winding_count(&self) -> usize {
        self.winding_segments().count()
    }

    pub(super) fn position(&self, id: SegmentId) -> Result<usize> {
        self.segments
            .iter()
            .position(|s| s.id() == id)
            .ok_or(CoilnetError::SegmentNotInModel { id })
    }

    /// Look up a segment by id.
    pub fn segment(&self, id: SegmentId) -> Result<&Segment> {
        self.position(id).map(|i| &self.segments[i])
    }

    /// Segment stored at an exact location.
    pub fn segment_at(&self, location: Location) -> Option<&Segment> {
        self.segments
            .binary_search_by(|s| s.location().cmp(&location))
            .ok()
            .map(|i| &self.segments[i])
    }

    /// Number of coils (distinct radial indices of winding segments).
    pub fn coil_count(&self) -> usize {
        self.winding_segments()
            .map(|s| s.coil() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Winding segments of one coil, bottom to top.
    pub fn coil_segments(&self, coil: usize) -> Vec<&Segment> {
        self.winding_segments().filter(|s| s.coil() == coil).collect()
    }

    /// Winding segments grouped per coil. Coils must be numbered from 0
    /// without holes.
    pub(super) fn coils(&self) -> Result<Vec<Vec<&Segment>>> {
        let count = self.coil_count();
        if count == 0 {
            return Err(CoilnetError::EmptyModel);
        }
        let mut coils: Vec<Vec<&Segment>> = vec![Vec::new(); count];
        for segment in self.winding_segments() {
            coils[segment.coil()].push(segment);
        }
        if let Some(coil) = coils.iter().position(|c| c.is_empty()) {
            return Err(CoilnetError::illegal_location(
                Location::new(coil as i32, 0),
                "coil has no winding segments",
            ));
        }
        Ok(coils)
    }

    pub(super) fn require_coil(&self, coil: usize) -> Result<()> {
        let count = self.coil_count();
        if coil >= count {
            return Err(CoilnetError::CoilDoesNotExist { coil, count });
        }
        Ok(())
    }

    /// Matrix row of a winding segment: the segments of all lower coils plus
    /// its rank within its own coil.
    pub fn segment_index(&self, id: SegmentId) -> Result<usize> {
        let segment = self.segment(id)?;
        if segment.is_shielding() {
            return Err(CoilnetError::SegmentIsShieldingElement {
                location: segment.location(),
            });
        }
        let lower_coils = self
            .winding_segments()
            .filter(|s| s.coil() < segment.coil())
            .count();
        let rank = self
            .winding_segments()
            .filter(|s| s.coil() == segment.coil() && s.location() < segment.location())
            .count();
        Ok(lower_coils + rank)
    }

    /// Static ring of `coil` sitting directly below axial index `axial`.
    pub fn static_ring(&self, coil: usize, axial: i32) -> Option<&Segment> {
        self.segment_at(Location::static_ring(coil, axial))
    }

    /// Radial shield placed just inside `coil`.
    pub fn radial_shield(&self, coil: usize) -> Option<&Segment> {
        self.segment_at(Location::radial_shield(coil))
    }

    /// Inner and outer radius of a coil's winding envelope.
    pub fn coil_radii(&self, coil: usize) -> Result<(f64, f64)> {
        self.require_coil(coil)?;
        let segments = self.coil_segments(coil);
        let r1 = segments.iter().map(|s| s.rect().r1()).fold(f64::INFINITY, f64::min);
        let r2 = segments.iter().map(|s| s.rect().r2()).fold(f64::NEG_INFINITY, f64::max);
        Ok((r1, r2))
    }

    /// Bottom and top of a coil's electrical height.
    pub fn coil_span(&self, coil: usize) -> Result<(f64, f64)> {
        self.require_coil(coil)?;
        let segments = self.coil_segments(coil);
        let z1 = segments.iter().map(|s| s.rect().z1()).fold(f64::INFINITY, f64::min);
        let z2 = segments.iter().map(|s| s.rect().z2()).fold(f64::NEG_INFINITY, f64::max);
        Ok((z1, z2))
    }

    /// Generated nodes, if current.
    pub fn nodes(&self) -> Option<&[Node]> {
        self.nodes.as_deref()
    }

    /// (bottom, top) node ids of a winding segment, if nodes are current.
    pub fn segment_nodes(&self, id: SegmentId) -> Option<(usize, usize)> {
        self.nodes.as_ref()?;
        self.segment_nodes.get(&id).copied()
    }

    /// Drop every computed artifact.
    pub fn invalidate(&mut self) {
        for segment in &mut self.segments {
            segment.series_capacitance = None;
        }
        self.nodes = None;
        self.segment_nodes.clear();
        self.capacitance = None;
        self.inductance = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_support::{disc_sections, model};

    #[test]
    fn test_new_rejects_bad_tank() {
        let core = Core::new(0.4, 1.0, 1.2, 1.0).unwrap();
        assert!(NetworkModel::new(core, 0.0, ModelConfig::default()).is_err());
    }

    #[test]
    fn test_segment_index_spans_coils() {
        let mut m = model();
        let mut ids = Vec::new();
        for (radial, axial) in [(0, 1), (1, 0), (0, 0), (1, 2), (1, 1)] {
            let seg = m.new_segment(disc_sections(radial, axial, 1)).unwrap();
            ids.push((radial, axial, m.insert_segment(seg).unwrap()));
        }
        for (radial, axial, id) in ids {
            let expected = if radial == 0 { axial as usize } else { 2 + axial as usize };
            assert_eq!(m.segment_index(id).unwrap(), expected);
        }
        assert_eq!(m.coil_count(), 2);
    }

    #[test]
    fn test_segment_index_rejects_shields() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 2)).unwrap();
        m.insert_segment(seg).unwrap();
        let ring = m
            .add_static_ring(0, crate::network::CoilEnd::Bottom, 0.01, 0.005)
            .unwrap();
        assert!(matches!(
            m.segment_index(ring),
            Err(CoilnetError::SegmentIsShieldingElement { .. })
        ));
        assert!(matches!(
            m.segment_index(SegmentId(999)),
            Err(CoilnetError::SegmentNotInModel { .. })
        ));
    }

    #[test]
    fn test_store_stays_sorted() {
        let mut m = model();
        for axial in [3, 0, 2, 1] {
            let seg = m.new_segment(disc_sections(0, axial, 1)).unwrap();
            m.insert_segment(seg).unwrap();
        }
        let locations: Vec<i32> = m.segments().iter().map(|s| s.location().axial).collect();
        assert_eq!(locations, vec![0, 1, 2, 3]);
    }
}
