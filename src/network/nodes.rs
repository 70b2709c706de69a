//! Node generation.

use super::NetworkModel;
use crate::error::Result;
use crate::topology::{Node, Segment};

fn joined(lower: &Segment, upper: &Segment) -> bool {
    lower.connection_to(upper.id()).is_some() || upper.connection_to(lower.id()).is_some()
}

impl NetworkModel {
    /// Regenerate every node and its shunt capacitances.
    ///
    /// Each coil is walked bottom to top: one node below the first segment,
    /// one shared node between two connected segments (two separate nodes
    /// when they are not connected) and one node above the last segment.
    /// Returns the topmost node id of each coil.
    pub fn set_nodes(&mut self) -> Result<Vec<usize>> {
        let mut nodes: Vec<Node> = Vec::new();
        let mut segment_nodes = Vec::new();
        let mut top_nodes = Vec::new();

        for coil in self.coils()? {
            let mut previous: Option<&Segment> = None;
            for &segment in &coil {
                let bottom = match previous {
                    Some(lower) if joined(lower, segment) => {
                        let shared = nodes.len() - 1;
                        nodes[shared].above = Some(segment.id());
                        nodes[shared].z = 0.5 * (lower.rect().z2() + segment.rect().z1());
                        shared
                    }
                    _ => {
                        let id = nodes.len();
                        nodes.push(Node::new(id, None, Some(segment.id()), segment.rect().z1()));
                        id
                    }
                };
                let top = nodes.len();
                nodes.push(Node::new(top, Some(segment.id()), None, segment.rect().z2()));
                segment_nodes.push((segment.id(), (bottom, top)));
                previous = Some(segment);
            }
            top_nodes.push(nodes.len() - 1);
        }

        log::debug!(
            "generated {} nodes for {} winding segments",
            nodes.len(),
            segment_nodes.len()
        );

        self.segment_nodes = segment_nodes.into_iter().collect();
        self.capacitance = None;
        self.synthesize_shunts(&mut nodes)?;
        self.nodes = Some(nodes);
        Ok(top_nodes)
    }

    /// Node ids of one coil, bottom to top.
    pub(super) fn coil_node_range(&self, coil: usize) -> Option<std::ops::Range<usize>> {
        let segments = self.coil_segments(coil);
        let first = self.segment_nodes.get(&segments.first()?.id())?.0;
        let last = self.segment_nodes.get(&segments.last()?.id())?.1;
        Some(first..last + 1)
    }
}
