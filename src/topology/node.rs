//! Electrical nodes of the network model.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::SegmentId;

/// Other end of a shunt capacitance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShuntTarget {
    Ground,
    Node(usize),
}

impl ShuntTarget {
    /// Matrix index with ground encoded as -1.
    pub fn index(&self) -> i64 {
        match self {
            ShuntTarget::Ground => -1,
            ShuntTarget::Node(id) => *id as i64,
        }
    }
}

impl fmt::Display for ShuntTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShuntTarget::Ground => write!(f, "GND"),
            ShuntTarget::Node(id) => write!(f, "N{}", id),
        }
    }
}

/// A shunt capacitance from the owning node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShuntCapacitance {
    pub target: ShuntTarget,
    /// Farads
    pub capacitance: f64,
}

/// An electrical junction; `id` doubles as its row in the capacitance matrix.
///
/// Segment references are plain ids resolved through the owning model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: usize,
    /// Segment directly below the node
    pub below: Option<SegmentId>,
    /// Segment directly above the node
    pub above: Option<SegmentId>,
    /// Axial position (m)
    pub z: f64,
    pub shunts: Vec<ShuntCapacitance>,
}

impl Node {
    /// Create a node without shunt capacitances.
    pub fn new(id: usize, below: Option<SegmentId>, above: Option<SegmentId>, z: f64) -> Self {
        Self {
            id,
            below,
            above,
            z,
            shunts: Vec::new(),
        }
    }

    /// Append a shunt capacitance.
    pub fn add_shunt(&mut self, target: ShuntTarget, capacitance: f64) {
        self.shunts.push(ShuntCapacitance { target, capacitance });
    }

    /// Sum of all shunt capacitances, to nodes and to ground.
    pub fn total_shunt(&self) -> f64 {
        self.shunts.iter().map(|s| s.capacitance).sum()
    }

    /// Sum of the shunt capacitances that go to ground.
    pub fn ground_shunt(&self) -> f64 {
        self.shunts
            .iter()
            .filter(|s| s.target == ShuntTarget::Ground)
            .map(|s| s.capacitance)
            .sum()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{} @ z={:.4}", self.id, self.z)
    }
}
