//! Core identifier and geometry types for the winding topology.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A winding position: radial index (0 = closest to the core) and axial
/// index (0 = closest to the bottom yoke).
///
/// Negative values are sentinels for shielding elements and follow a
/// `-x-1` convention so that index 0 has a distinct sentinel:
/// - a radial shield just inside coil `c` sits at `radial = -c-1`
/// - a static ring of coil `c` just below axial index `p` sits at
///   `radial = c, axial = -p-1`
///
/// Ordering is lexicographic (radial, then axial).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub radial: i32,
    pub axial: i32,
}

impl Location {
    /// Create a new location.
    pub const fn new(radial: i32, axial: i32) -> Self {
        Self { radial, axial }
    }

    /// Location of the radial shield placed just inside `coil`.
    pub fn radial_shield(coil: usize) -> Self {
        Self::new(-(coil as i32) - 1, 0)
    }

    /// Location of a static ring of `coil` sitting just below axial index `axial`.
    pub fn static_ring(coil: usize, axial: i32) -> Self {
        Self::new(coil as i32, -axial - 1)
    }

    /// Check if this is a radial shield sentinel.
    pub fn is_radial_shield(&self) -> bool {
        self.radial < 0
    }

    /// Check if this is a static ring sentinel.
    pub fn is_static_ring(&self) -> bool {
        self.radial >= 0 && self.axial < 0
    }

    /// Check if this location is any kind of shielding element.
    pub fn is_shielding(&self) -> bool {
        self.is_radial_shield() || self.is_static_ring()
    }

    /// Coil the element belongs to (for a radial shield: the coil it sits inside of).
    pub fn coil(&self) -> usize {
        if self.radial < 0 {
            (-self.radial - 1) as usize
        } else {
            self.radial as usize
        }
    }

    /// For a static ring: axial index of the section directly above it.
    pub fn ring_position(&self) -> i32 {
        -self.axial - 1
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.radial, self.axial)
    }
}

/// An axis-aligned rectangle in the (r, z) half plane, stored as origin + size.
///
/// Edges are derived accessors; setters only ever touch the size (or move
/// the origin while preserving the opposite edge) so the two never drift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Lower-left corner (r, z)
    origin: (f64, f64),
    /// Radial build and axial height
    size: (f64, f64),
}

impl Rect {
    /// Create a rectangle from its radial and axial bounds.
    pub fn from_bounds(r1: f64, r2: f64, z1: f64, z2: f64) -> Self {
        Self {
            origin: (r1, z1),
            size: (r2 - r1, z2 - z1),
        }
    }

    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn r1(&self) -> f64 {
        self.origin.0
    }

    pub fn r2(&self) -> f64 {
        self.origin.0 + self.size.0
    }

    pub fn z1(&self) -> f64 {
        self.origin.1
    }

    pub fn z2(&self) -> f64 {
        self.origin.1 + self.size.1
    }

    pub fn width(&self) -> f64 {
        self.size.0
    }

    pub fn height(&self) -> f64 {
        self.size.1
    }

    /// Cross-sectional area.
    pub fn area(&self) -> f64 {
        self.size.0 * self.size.1
    }

    /// Mean radius of the rectangle.
    pub fn mean_radius(&self) -> f64 {
        self.origin.0 + 0.5 * self.size.0
    }

    /// Move the inner edge, keeping the outer edge fixed.
    pub fn set_r1(&mut self, r1: f64) {
        let r2 = self.r2();
        self.origin.0 = r1;
        self.size.0 = r2 - r1;
    }

    /// Move the outer edge.
    pub fn set_r2(&mut self, r2: f64) {
        self.size.0 = r2 - self.origin.0;
    }

    /// Move the bottom edge, keeping the top edge fixed.
    pub fn set_z1(&mut self, z1: f64) {
        let z2 = self.z2();
        self.origin.1 = z1;
        self.size.1 = z2 - z1;
    }

    /// Move the top edge.
    pub fn set_z2(&mut self, z2: f64) {
        self.size.1 = z2 - self.origin.1;
    }

    /// Smallest rectangle covering both.
    pub fn union(&self, other: &Rect) -> Rect {
        Rect::from_bounds(
            self.r1().min(other.r1()),
            self.r2().max(other.r2()),
            self.z1().min(other.z1()),
            self.z2().max(other.z2()),
        )
    }
}

/// Stable handle identifying a segment. Equality of segments is equality of ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Hands out monotonically increasing segment ids.
///
/// One allocator belongs to one model; dropping the model drops the
/// allocator together with every id it issued.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SegmentIdAllocator {
    next: u64,
}

impl SegmentIdAllocator {
    /// Create an allocator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id.
    pub fn allocate(&mut self) -> SegmentId {
        let id = SegmentId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids issued so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}
