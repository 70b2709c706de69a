//! Capacitance matrix assembly.

use super::NetworkModel;
use crate::error::{CoilnetError, Result};
use crate::matrix::{Layout, Matrix, NumberType};
use crate::topology::{ConnectorLocation, SegmentId, ShuntTarget};

/// Capacitance matrix with explicitly connected nodes merged.
#[derive(Debug, Clone)]
pub struct FixedCapacitance {
    pub matrix: Matrix,
    /// Row of the reduced matrix for every original node
    pub node_rows: Vec<usize>,
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let (ra, rb) = (find(parent, a), find(parent, b));
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

impl NetworkModel {
    fn series_of(&self, id: Option<SegmentId>) -> Result<f64> {
        match id {
            Some(id) => self.series_capacitance(id),
            None => Ok(0.0),
        }
    }

    /// Assemble the nodal capacitance matrix.
    ///
    /// Series capacitances must already be computed; nodes are regenerated
    /// when stale. Each segment's series capacitance sits between its bottom
    /// and top node, each shunt between its node and target (ground shunts
    /// only on the diagonal).
    pub fn capacitance_matrix(&mut self) -> Result<&Matrix> {
        if self.capacitance.is_none() {
            let matrix = self.assemble_capacitance()?;
            self.capacitance = Some(matrix);
        }
        self.capacitance
            .as_ref()
            .ok_or(CoilnetError::CapacitanceNotCalculated {
                what: "capacitance matrix",
            })
    }

    /// The last assembled capacitance matrix.
    pub fn capacitance(&self) -> Result<&Matrix> {
        self.capacitance
            .as_ref()
            .ok_or(CoilnetError::CapacitanceNotCalculated {
                what: "capacitance matrix",
            })
    }

    fn assemble_capacitance(&mut self) -> Result<Matrix> {
        if self.winding_count() == 0 {
            return Err(CoilnetError::EmptyModel);
        }
        if self.winding_segments().any(|s| s.series_capacitance.is_none()) {
            return Err(CoilnetError::CapacitanceNotCalculated {
                what: "series capacitance",
            });
        }
        if self.nodes.is_none() {
            self.set_nodes()?;
        }
        let nodes = self.nodes.as_ref().ok_or(CoilnetError::CapacitanceNotCalculated {
            what: "nodes",
        })?;

        let n = nodes.len();
        let mut c = Matrix::new(n, n, Layout::Symmetric, NumberType::Real)?
            .with_tolerance(self.config.matrix_tolerance);

        for node in nodes {
            if node.below.is_none() && node.above.is_none() {
                return Err(CoilnetError::NodeHasNoSegments { node: node.id });
            }
            let diagonal = self.series_of(node.below)? + self.series_of(node.above)? + node.total_shunt();
            c.set(node.id, node.id, diagonal)?;
            for shunt in &node.shunts {
                if let ShuntTarget::Node(target) = shunt.target {
                    if target > node.id {
                        c.add(node.id, target, -shunt.capacitance)?;
                    }
                }
            }
        }
        for segment in self.winding_segments() {
            if let Some(&(bottom, top)) = self.segment_nodes.get(&segment.id()) {
                c.add(bottom, top, -self.series_of(Some(segment.id()))?)?;
            }
        }

        log::info!("assembled {}x{} capacitance matrix", n, n);
        Ok(c)
    }

    /// Capacitance matrix with nodes merged where segments are tied by
    /// explicit connections that do not already share a node.
    pub fn fixed_capacitance_matrix(&mut self) -> Result<FixedCapacitance> {
        let full = self.capacitance_matrix()?.clone();
        let n = full.rows();

        let node_of = |id: SegmentId, at: ConnectorLocation| {
            self.segment_nodes
                .get(&id)
                .map(|&(bottom, top)| if at.is_lower() { bottom } else { top })
        };
        let mut parent: Vec<usize> = (0..n).collect();
        for segment in self.winding_segments() {
            for connection in &segment.connections {
                let Some(target) = connection.segment else {
                    continue;
                };
                if let (Some(a), Some(b)) = (node_of(segment.id(), connection.from), node_of(target, connection.to)) {
                    union(&mut parent, a, b);
                }
            }
        }

        let mut node_rows = vec![0; n];
        let mut roots = Vec::new();
        for node in 0..n {
            let root = find(&mut parent, node);
            node_rows[node] = match roots.iter().position(|&r| r == root) {
                Some(row) => row,
                None => {
                    roots.push(root);
                    roots.len() - 1
                }
            };
        }

        let m = roots.len();
        let mut dense = vec![0.0; m * m];
        for i in 0..n {
            for j in 0..n {
                dense[node_rows[i] * m + node_rows[j]] += full.get(i, j)?;
            }
        }
        let mut matrix = Matrix::new(m, m, Layout::Symmetric, NumberType::Real)?
            .with_tolerance(self.config.matrix_tolerance);
        for i in 0..m {
            for j in i..m {
                matrix.set(i, j, dense[i * m + j])?;
            }
        }
        log::debug!("fixed capacitance matrix merges {} nodes into {}", n, m);
        Ok(FixedCapacitance { matrix, node_rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::test_support::{disc_sections, model};
    use crate::network::CoilEnd;
    use approx::assert_relative_eq;

    fn two_coil_model() -> NetworkModel {
        let mut m = model();
        for radial in 0..2 {
            let seg = m.new_segment(disc_sections(radial, 0, 4)).unwrap();
            let id = m.insert_segment(seg).unwrap();
            m.split_segments(&[id], 2).unwrap();
        }
        m.add_static_ring(1, CoilEnd::Top, 0.01, 0.005).unwrap();
        m.compute_series_capacitances().unwrap();
        m
    }

    #[test]
    fn test_requires_series_capacitance() {
        let mut m = model();
        let seg = m.new_segment(disc_sections(0, 0, 2)).unwrap();
        m.insert_segment(seg).unwrap();
        assert!(matches!(
            m.capacitance_matrix(),
            Err(CoilnetError::CapacitanceNotCalculated { .. })
        ));
        assert!(m.capacitance().is_err());
    }

    #[test]
    fn test_laplacian_invariant() {
        let mut m = two_coil_model();
        let c = m.capacitance_matrix().unwrap().clone();
        assert!(c.is_symmetric());
        let nodes = m.nodes().unwrap();
        for i in 0..c.rows() {
            let off: f64 = (0..c.columns())
                .filter(|&j| j != i)
                .map(|j| c.get(i, j).unwrap().abs())
                .sum();
            let expected = off + nodes[i].ground_shunt();
            assert_relative_eq!(c.get(i, i).unwrap(), expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_off_diagonals_are_non_positive() {
        let mut m = two_coil_model();
        let c = m.capacitance_matrix().unwrap();
        for i in 0..c.rows() {
            for j in 0..c.columns() {
                if i != j {
                    assert!(c.get(i, j).unwrap() <= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_fixed_matrix_merges_cross_connection() {
        let mut m = two_coil_model();
        let inner_top = m.coil_segments(0)[1].id();
        let outer_bottom = m.coil_segments(1)[0].id();
        m.add_connection(
            inner_top,
            ConnectorLocation::OutsideUpper,
            Some(outer_bottom),
            ConnectorLocation::InsideLower,
        )
        .unwrap();
        m.compute_series_capacitances().unwrap();

        let full = m.capacitance_matrix().unwrap().clone();
        let fixed = m.fixed_capacitance_matrix().unwrap();
        assert_eq!(full.rows(), 6);
        assert_eq!(fixed.matrix.rows(), 5);
        // Node 2 (top of coil 0) and node 3 (bottom of coil 1) share a row
        assert_eq!(fixed.node_rows[2], fixed.node_rows[3]);

        // Merging preserves the total of all entries
        let sum = |c: &Matrix| -> f64 {
            (0..c.rows())
                .flat_map(|i| (0..c.columns()).map(move |j| (i, j)))
                .map(|(i, j)| c.get(i, j).unwrap())
                .sum()
        };
        assert_relative_eq!(sum(&fixed.matrix), sum(&full), max_relative = 1e-9, epsilon = 1e-18);
    }
}
