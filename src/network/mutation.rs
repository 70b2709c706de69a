//! Structural mutation of the segment store.
//!
//! Every successful mutation drops all computed artifacts. Multi-segment
//! operations restore the previous store when any step fails.

use serde::{Deserialize, Serialize};

use super::NetworkModel;
use crate::error::{CoilnetError, Result};
use crate::topology::{
    BasicSection, Connection, ConnectorLocation, Location, Rect, Segment, SegmentId, SegmentKind,
};

/// Entry position assumed for a run of segments with no recorded entry.
pub const DEFAULT_ENTRY: ConnectorLocation = ConnectorLocation::InsideLower;

/// Axial end of a coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoilEnd {
    Bottom,
    Top,
}

impl NetworkModel {
    /// Insert a segment keeping the store sorted.
    ///
    /// Fails with `SegmentExists` when the location (or any of the segment's
    /// axial indices) is already taken in its coil. A winding segment may
    /// open a new coil only directly outside the current outermost one.
    pub fn insert_segment(&mut self, segment: Segment) -> Result<SegmentId> {
        let location = segment.location();
        if self.segments.iter().any(|s| s.id() == segment.id()) {
            return Err(CoilnetError::SegmentExists { location });
        }
        if !segment.is_shielding() {
            if location.radial < 0 || location.axial < 0 {
                return Err(CoilnetError::illegal_location(location, "negative winding location"));
            }
            let count = self.coil_count();
            if segment.coil() > count {
                return Err(CoilnetError::CoilDoesNotExist {
                    coil: segment.coil(),
                    count,
                });
            }
        }

        let position = match self.segments.binary_search_by(|s| s.location().cmp(&location)) {
            Ok(_) => return Err(CoilnetError::SegmentExists { location }),
            Err(position) => position,
        };
        if !segment.is_shielding() {
            let overlaps = |other: &Segment| {
                !other.is_shielding()
                    && other.coil() == segment.coil()
                    && other.location().axial <= segment.last_axial()
                    && location.axial <= other.last_axial()
            };
            let below = position.checked_sub(1).map(|i| &self.segments[i]);
            let above = self.segments.get(position);
            if below.into_iter().chain(above).any(overlaps) {
                return Err(CoilnetError::SegmentExists { location });
            }
        }

        let id = segment.id();
        log::debug!("inserting {} at {}", id, location);
        self.segments.insert(position, segment);
        self.invalidate();
        Ok(id)
    }

    /// Remove a winding segment. Connections that pointed at it become
    /// floating.
    pub fn remove_segment(&mut self, id: SegmentId) -> Result<Segment> {
        let position = self.position(id)?;
        if self.segments[position].is_shielding() {
            return Err(CoilnetError::SegmentIsShieldingElement {
                location: self.segments[position].location(),
            });
        }
        let removed = self.segments.remove(position);
        for segment in &mut self.segments {
            for connection in &mut segment.connections {
                if connection.segment == Some(id) {
                    *connection = Connection::terminal(connection.from, ConnectorLocation::Floating);
                }
            }
        }
        log::debug!("removed {} from {}", id, removed.location());
        self.invalidate();
        Ok(removed)
    }

    /// Replace `old` segments by new segments built from `new_sets`.
    ///
    /// The new run is wired from the old run's entry: each segment exits at
    /// `entry.exit_after(sections)` and the next one is entered at the
    /// position facing that exit. The connection below the old run moves to
    /// the first new segment, the one above to the last, and neighbours that
    /// pointed at an old segment are redirected. On failure the store is
    /// left exactly as it was.
    pub fn replace_segments(
        &mut self,
        old: &[SegmentId],
        new_sets: Vec<Vec<BasicSection>>,
    ) -> Result<Vec<SegmentId>> {
        if old.is_empty() {
            return Err(CoilnetError::ArgumentIsZeroCount {
                argument: "old segments",
            });
        }
        if new_sets.is_empty() {
            return Err(CoilnetError::ArgumentIsZeroCount {
                argument: "new segments",
            });
        }

        let snapshot = self.segments.clone();
        match self.replace_unchecked(old, new_sets) {
            Ok(ids) => {
                self.invalidate();
                Ok(ids)
            }
            Err(e) => {
                log::warn!("replace of {} segments rolled back: {}", old.len(), e);
                self.segments = snapshot;
                self.invalidate();
                Err(e)
            }
        }
    }

    fn replace_unchecked(
        &mut self,
        old: &[SegmentId],
        new_sets: Vec<Vec<BasicSection>>,
    ) -> Result<Vec<SegmentId>> {
        let mut old_segments = Vec::with_capacity(old.len());
        for &id in old {
            let segment = self.segment(id)?;
            if segment.is_shielding() {
                return Err(CoilnetError::SegmentIsShieldingElement {
                    location: segment.location(),
                });
            }
            old_segments.push(segment.clone());
        }
        old_segments.sort_by_key(|s| s.location());
        let (first_old, last_old) = match (old_segments.first(), old_segments.last()) {
            (Some(first), Some(last)) => (first.clone(), last.clone()),
            _ => return Err(CoilnetError::ArgumentIsZeroCount { argument: "old segments" }),
        };
        if let Some(other) = old_segments.iter().find(|s| s.coil() != first_old.coil()) {
            return Err(CoilnetError::illegal_location(
                other.location(),
                format!("replaced segments span coils {} and {}", first_old.coil(), other.coil()),
            ));
        }

        let interleaved = old_segments.iter().any(|s| s.interleaved);
        if new_sets.iter().any(Vec::is_empty) {
            return Err(CoilnetError::ArgumentIsZeroCount {
                argument: "basic sections",
            });
        }
        if interleaved {
            let first = new_sets[0].len();
            if let Some(other) = new_sets.iter().map(Vec::len).find(|&len| len != first) {
                return Err(CoilnetError::UnequalBasicSectionsPerSet { first, other });
            }
        }

        // Connections leaving the old run at its ends
        let entry = first_old.entry_location().unwrap_or(DEFAULT_ENTRY);
        let below = first_old
            .connection_at(entry)
            .filter(|c| c.segment.map_or(true, |t| !old.contains(&t)))
            .copied();
        let old_exit = last_old
            .connections
            .iter()
            .find(|c| !c.from.is_lower() && c.segment.map_or(true, |t| !old.contains(&t)))
            .copied();

        for &id in old {
            let position = self.position(id)?;
            self.segments.remove(position);
        }

        // Build and insert the new run
        let mut ids = Vec::with_capacity(new_sets.len());
        let mut entries = Vec::with_capacity(new_sets.len());
        let mut exits = Vec::with_capacity(new_sets.len());
        let mut next_entry = entry;
        for set in new_sets {
            let sections = set.len();
            let id = self.allocate_id();
            let mut segment = Segment::new(id, set, &self.core)?;
            segment.interleaved = interleaved;
            let exit = next_entry.exit_after(sections);
            entries.push(next_entry);
            exits.push(exit);
            next_entry = exit.standard_to();
            ids.push(self.insert_segment(segment)?);
        }

        let mut wiring: Vec<(SegmentId, Connection)> = Vec::new();
        for k in 0..ids.len().saturating_sub(1) {
            wiring.push((ids[k], Connection::to_segment(exits[k], entries[k + 1], ids[k + 1])));
            wiring.push((ids[k + 1], Connection::to_segment(entries[k + 1], exits[k], ids[k])));
        }
        let (first_new, last_new) = (ids[0], ids[ids.len() - 1]);
        let (first_entry, last_exit) = (entries[0], exits[exits.len() - 1]);
        if let Some(c) = below {
            wiring.push((first_new, Connection { from: first_entry, ..c }));
        }
        if let Some(c) = old_exit {
            wiring.push((last_new, Connection { from: last_exit, ..c }));
        }
        for (id, connection) in wiring {
            let position = self.position(id)?;
            self.segments[position].connections.push(connection);
        }

        // Redirect neighbours that referenced an old segment
        let new_ranges: Vec<(SegmentId, i32, i32)> = ids
            .iter()
            .map(|&id| self.segment(id).map(|s| (id, s.location().axial, s.last_axial())))
            .collect::<Result<_>>()?;
        let covering = |axial: i32| {
            new_ranges
                .iter()
                .find(|&&(_, lo, hi)| lo <= axial && axial <= hi)
                .map(|&(id, _, _)| id)
        };
        for segment in &mut self.segments {
            if ids.contains(&segment.id()) {
                continue;
            }
            for connection in &mut segment.connections {
                let Some(target) = connection.segment else {
                    continue;
                };
                let Some(old_target) = old_segments.iter().find(|s| s.id() == target) else {
                    continue;
                };
                let (new_target, to) = if connection.to.is_lower() {
                    let id = covering(old_target.location().axial).unwrap_or(first_new);
                    (id, if id == first_new { first_entry } else { connection.to })
                } else {
                    let id = covering(old_target.last_axial()).unwrap_or(last_new);
                    (id, if id == last_new { last_exit } else { connection.to })
                };
                connection.segment = Some(new_target);
                connection.to = to;
            }
        }

        log::debug!("replaced {} segments by {}", old.len(), ids.len());
        Ok(ids)
    }

    /// Split one segment into `parts` segments of equal section count.
    pub fn split_segments(&mut self, old: &[SegmentId], parts: usize) -> Result<Vec<SegmentId>> {
        if old.len() != 1 {
            return Err(CoilnetError::OldSegmentCountIsNotOne { count: old.len() });
        }
        if parts == 0 {
            return Err(CoilnetError::ArgumentIsZeroCount { argument: "parts" });
        }
        let sections = self.segment(old[0])?.sections().to_vec();
        if sections.len() % parts != 0 {
            return Err(CoilnetError::ArgAIsNotAMultipleOfArgB {
                a: sections.len(),
                b: parts,
            });
        }
        let per_part = sections.len() / parts;
        let sets = sections.chunks(per_part).map(<[BasicSection]>::to_vec).collect();
        self.replace_segments(old, sets)
    }

    /// Merge consecutive segments of one coil into a single segment.
    pub fn merge_segments(&mut self, old: &[SegmentId]) -> Result<SegmentId> {
        if old.is_empty() {
            return Err(CoilnetError::ArgumentIsZeroCount { argument: "segments" });
        }
        let mut sections = Vec::new();
        for &id in old {
            sections.extend_from_slice(self.segment(id)?.sections());
        }
        sections.sort_by_key(|s| s.location);
        let ids = self.replace_segments(old, vec![sections])?;
        Ok(ids[0])
    }

    /// Record a connection on `from_id` (and the matching one on the target).
    ///
    /// `to_id == None` connects to a termination; `to` must then be
    /// floating, ground or impulse.
    pub fn add_connection(
        &mut self,
        from_id: SegmentId,
        from: ConnectorLocation,
        to_id: Option<SegmentId>,
        to: ConnectorLocation,
    ) -> Result<()> {
        let from_position = self.position(from_id)?;
        if from.is_termination() {
            return Err(CoilnetError::invalid_parameter(
                "from",
                format!("{} is not a position on a segment", from),
            ));
        }
        if self.segments[from_position].connection_at(from).is_some() {
            return Err(CoilnetError::TooManyConnectors {
                id: from_id,
                location: from.to_string(),
            });
        }

        match to_id {
            Some(target) => {
                let to_position = self.position(target)?;
                if target == from_id || to.is_termination() {
                    return Err(CoilnetError::invalid_parameter(
                        "to",
                        format!("cannot connect {} to {} on {}", from_id, to, target),
                    ));
                }
                if self.segments[to_position].connection_at(to).is_some() {
                    return Err(CoilnetError::TooManyConnectors {
                        id: target,
                        location: to.to_string(),
                    });
                }
                self.segments[from_position]
                    .connections
                    .push(Connection::to_segment(from, to, target));
                self.segments[to_position]
                    .connections
                    .push(Connection::to_segment(to, from, from_id));
            }
            None => {
                if !to.is_termination() {
                    return Err(CoilnetError::invalid_parameter(
                        "to",
                        format!("{} is not a termination", to),
                    ));
                }
                self.segments[from_position]
                    .connections
                    .push(Connection::terminal(from, to));
            }
        }
        self.invalidate();
        Ok(())
    }

    /// Place a static ring `gap` away from one end of `coil`.
    pub fn add_static_ring(&mut self, coil: usize, end: CoilEnd, height: f64, gap: f64) -> Result<SegmentId> {
        self.require_coil(coil)?;
        if !(height > 0.0) {
            return Err(CoilnetError::invalid_parameter("height", "must be positive"));
        }
        if !(gap > 0.0) {
            return Err(CoilnetError::invalid_parameter("gap", "must be positive"));
        }
        let (r1, r2) = self.coil_radii(coil)?;
        let segments = self.coil_segments(coil);
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return Err(CoilnetError::CoilDoesNotExist {
                coil,
                count: self.coil_count(),
            });
        };
        let (location, z1, z2) = match end {
            CoilEnd::Bottom => {
                let z2 = first.rect().z1() - gap;
                (Location::static_ring(coil, first.location().axial), z2 - height, z2)
            }
            CoilEnd::Top => {
                let z1 = last.rect().z2() + gap;
                (Location::static_ring(coil, last.last_axial() + 1), z1, z1 + height)
            }
        };
        if self.segment_at(location).is_some() {
            return Err(CoilnetError::OnlyOneStaticRingAllowed { coil });
        }
        if z1 < 0.0 || z2 > self.core.real_window_height {
            return Err(CoilnetError::NoRoomForShieldingElement {
                location,
                message: format!("ring [{:.4}, {:.4}] m leaves the window", z1, z2),
            });
        }

        let id = self.allocate_id();
        let ring = Segment::shield(id, location, Rect::from_bounds(r1, r2, z1, z2), &self.core)?;
        self.insert_segment(ring)
    }

    /// Place a grounded radial shield of `thickness` centred in the gap just
    /// inside `coil`.
    pub fn add_radial_shield(&mut self, coil: usize, thickness: f64) -> Result<SegmentId> {
        self.require_coil(coil)?;
        let location = Location::radial_shield(coil);
        if self.segment_at(location).is_some() {
            return Err(CoilnetError::ShieldingElementExists { location });
        }
        if !(thickness > 0.0) {
            return Err(CoilnetError::invalid_parameter("thickness", "must be positive"));
        }
        let ri = if coil == 0 {
            self.core.radius()
        } else {
            self.coil_radii(coil - 1)?.1
        };
        let ro = self.coil_radii(coil)?.0;
        if thickness >= ro - ri {
            return Err(CoilnetError::NoRoomForShieldingElement {
                location,
                message: format!("gap of {:.4} m cannot hold {:.4} m", ro - ri, thickness),
            });
        }

        let centre = 0.5 * (ri + ro);
        let rect = Rect::from_bounds(
            centre - 0.5 * thickness,
            centre + 0.5 * thickness,
            0.0,
            self.core.real_window_height,
        );
        let id = self.allocate_id();
        let shield = Segment::shield(id, location, rect, &self.core)?;
        self.insert_segment(shield)
    }

    /// Remove a static ring.
    pub fn remove_static_ring(&mut self, id: SegmentId) -> Result<Segment> {
        self.remove_shield(id, SegmentKind::StaticRing)
    }

    /// Remove a radial shield.
    pub fn remove_radial_shield(&mut self, id: SegmentId) -> Result<Segment> {
        self.remove_shield(id, SegmentKind::RadialShield)
    }

    fn remove_shield(&mut self, id: SegmentId, kind: SegmentKind) -> Result<Segment> {
        let position = self.position(id)?;
        if self.segments[position].kind() != kind {
            return Err(CoilnetError::NotAShieldingElement {
                location: self.segments[position].location(),
            });
        }
        let removed = self.segments.remove(position);
        self.invalidate();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_support::{disc_sections, model};

    #[test]
    fn test_insert_occupied_location_fails() {
        let mut m = model();
        let a = m.new_segment(disc_sections(0, 0, 3)).unwrap();
        m.insert_segment(a).unwrap();

        let same = m.new_segment(disc_sections(0, 0, 1)).unwrap();
        assert!(matches!(m.insert_segment(same), Err(CoilnetError::SegmentExists { .. })));
        let overlapping = m.new_segment(disc_sections(0, 2, 2)).unwrap();
        assert!(matches!(
            m.insert_segment(overlapping),
            Err(CoilnetError::SegmentExists { .. })
        ));
        assert_eq!(m.segments().len(), 1);
    }

    #[test]
    fn test_new_coil_must_be_adjacent() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(2, 0, 1)).unwrap();
        assert!(matches!(
            m.insert_segment(seg),
            Err(CoilnetError::CoilDoesNotExist { coil: 2, count: 0 })
        ));
    }

    #[test]
    fn test_remove_floats_neighbour_connections() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 2)).unwrap();
        let id = m.insert_segment(seg).unwrap();
        let ids = m.split_segments(&[id], 2).unwrap();

        m.remove_segment(ids[1]).unwrap();
        let remaining = m.segment(ids[0]).unwrap();
        assert!(remaining.connections.iter().all(|c| c.segment.is_none()));
        assert!(remaining
            .connections
            .iter()
            .any(|c| c.to == ConnectorLocation::Floating));
        assert!(matches!(
            m.remove_segment(ids[1]),
            Err(CoilnetError::SegmentNotInModel { .. })
        ));
    }

    #[test]
    fn test_split_wires_alternating_connections() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 4)).unwrap();
        let id = m.insert_segment(seg).unwrap();
        m.add_connection(id, ConnectorLocation::InsideLower, None, ConnectorLocation::Impulse)
            .unwrap();
        let ids = m.split_segments(&[id], 2).unwrap();
        assert_eq!(ids.len(), 2);

        let first = m.segment(ids[0]).unwrap();
        let second = m.segment(ids[1]).unwrap();
        let entry = first.connection_at(ConnectorLocation::InsideLower).unwrap();
        assert_eq!(entry.to, ConnectorLocation::Impulse);

        let exit = DEFAULT_ENTRY.exit_after(2);
        let link = first.connection_at(exit).unwrap();
        assert_eq!(link.segment, Some(ids[1]));
        assert_eq!(link.to, exit.standard_to());
        assert_eq!(second.connection_to(ids[0]).unwrap().from, exit.standard_to());
    }

    #[test]
    fn test_split_argument_checks() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 3)).unwrap();
        let id = m.insert_segment(seg).unwrap();
        assert!(matches!(
            m.split_segments(&[id], 2),
            Err(CoilnetError::ArgAIsNotAMultipleOfArgB { a: 3, b: 2 })
        ));
        assert!(matches!(
            m.split_segments(&[id], 0),
            Err(CoilnetError::ArgumentIsZeroCount { .. })
        ));
        assert!(matches!(
            m.split_segments(&[], 1),
            Err(CoilnetError::OldSegmentCountIsNotOne { count: 0 })
        ));
    }

    #[test]
    fn test_failed_replace_rolls_back() {
        let mut m = model();
        let a = m.new_segment(disc_sections(0, 0, 2)).unwrap();
        let a = m.insert_segment(a).unwrap();
        let b = m.new_segment(disc_sections(0, 2, 2)).unwrap();
        let b = m.insert_segment(b).unwrap();
        let before: Vec<SegmentId> = m.segments().iter().map(|s| s.id()).collect();

        // Second set collides with segment b
        let sets = vec![disc_sections(0, 0, 1), disc_sections(0, 2, 1)];
        assert!(matches!(
            m.replace_segments(&[a], sets),
            Err(CoilnetError::SegmentExists { .. })
        ));
        let after: Vec<SegmentId> = m.segments().iter().map(|s| s.id()).collect();
        assert_eq!(before, after);
        assert!(m.segment(b).is_ok());
    }

    #[test]
    fn test_interleaved_replace_needs_equal_sets() {
        let mut m = model();
        let mut seg = m.new_segment(disc_sections(0, 0, 3)).unwrap();
        seg.interleaved = true;
        let id = m.insert_segment(seg).unwrap();
        let sets = vec![disc_sections(0, 0, 2), disc_sections(0, 2, 1)];
        assert!(matches!(
            m.replace_segments(&[id], sets),
            Err(CoilnetError::UnequalBasicSectionsPerSet { first: 2, other: 1 })
        ));
        assert!(m.segment(id).is_ok());
    }

    #[test]
    fn test_merge_then_split_restores_shape() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 4)).unwrap();
        let id = m.insert_segment(seg).unwrap();
        let parts = m.split_segments(&[id], 4).unwrap();
        let merged = m.merge_segments(&parts).unwrap();
        let merged = m.segment(merged).unwrap();
        assert_eq!(merged.sections().len(), 4);
        assert_eq!(m.winding_count(), 1);
    }

    #[test]
    fn test_neighbour_redirected_on_replace() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 4)).unwrap();
        let id = m.insert_segment(seg).unwrap();
        let halves = m.split_segments(&[id], 2).unwrap();
        let quarters = m.split_segments(&[halves[1]], 2).unwrap();

        let lower = m.segment(halves[0]).unwrap();
        let link = lower.connections.iter().find(|c| c.segment.is_some()).unwrap();
        assert_eq!(link.segment, Some(quarters[0]));
    }

    #[test]
    fn test_too_many_connectors() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 1)).unwrap();
        let id = m.insert_segment(seg).unwrap();
        m.add_connection(id, ConnectorLocation::OutsideUpper, None, ConnectorLocation::Ground)
            .unwrap();
        assert!(matches!(
            m.add_connection(id, ConnectorLocation::OutsideUpper, None, ConnectorLocation::Floating),
            Err(CoilnetError::TooManyConnectors { .. })
        ));
    }

    #[test]
    fn test_static_ring_rules() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 2)).unwrap();
        m.insert_segment(seg).unwrap();

        assert!(matches!(
            m.add_static_ring(1, CoilEnd::Top, 0.01, 0.005),
            Err(CoilnetError::CoilDoesNotExist { .. })
        ));
        let ring = m.add_static_ring(0, CoilEnd::Top, 0.01, 0.005).unwrap();
        assert_eq!(m.segment(ring).unwrap().location(), Location::static_ring(0, 2));
        assert!(matches!(
            m.add_static_ring(0, CoilEnd::Top, 0.01, 0.005),
            Err(CoilnetError::OnlyOneStaticRingAllowed { coil: 0 })
        ));
        // Coil starts 0.1 m above the yoke
        assert!(matches!(
            m.add_static_ring(0, CoilEnd::Bottom, 0.2, 0.005),
            Err(CoilnetError::NoRoomForShieldingElement { .. })
        ));

        assert!(matches!(
            m.remove_radial_shield(ring),
            Err(CoilnetError::NotAShieldingElement { .. })
        ));
        m.remove_static_ring(ring).unwrap();
        assert_eq!(m.segments().len(), 1);
    }

    #[test]
    fn test_radial_shield_rules() {
        let mut m = model();
        for radial in 0..2 {
            let seg = m.new_segment(disc_sections(radial, 0, 1)).unwrap();
            m.insert_segment(seg).unwrap();
        }
        assert!(matches!(
            m.add_radial_shield(1, 0.06),
            Err(CoilnetError::NoRoomForShieldingElement { .. })
        ));
        let shield = m.add_radial_shield(1, 0.01).unwrap();
        let rect = *m.segment(shield).unwrap().rect();
        assert!((rect.mean_radius() - 0.325).abs() < 1e-12);
        assert!(matches!(
            m.add_radial_shield(1, 0.01),
            Err(CoilnetError::ShieldingElementExists { .. })
        ));

        let winding = m.coil_segments(0)[0].id();
        assert!(matches!(
            m.remove_radial_shield(winding),
            Err(CoilnetError::NotAShieldingElement { .. })
        ));
        assert!(matches!(
            m.remove_segment(shield),
            Err(CoilnetError::SegmentIsShieldingElement { .. })
        ));
    }
}
