//! Shunt (inter-coil and coil-to-ground) capacitance synthesis.
//!
//! Every radially adjacent pair of sides gets one lumped coaxial
//! capacitance, which is then spread over the nodes of both sides by a
//! two-pointer merge of their height profiles.

use std::f64::consts::PI;

use super::NetworkModel;
use crate::config::ModelConfig;
use crate::error::{CoilnetError, Result};
use crate::topology::{Location, Node, ShuntTarget};
use crate::EPSILON_0;

/// Boundaries closer than this are treated as equal by the merge.
const MERGE_TIE: f64 = 1e-12;

/// Composite oil/solid coaxial capacitance between radii `ri < ro` over an
/// axial height `h`. The solid barrier fills the inner `fs` share of the gap.
pub fn coaxial_capacitance(ri: f64, ro: f64, h: f64, config: &ModelConfig) -> f64 {
    let rs = ri + config.hilo_solid_fraction * (ro - ri);
    let resistance = (rs / ri).ln() / config.eps_solid + (ro / rs).ln() / config.eps_oil;
    2.0 * PI * EPSILON_0 * h / resistance
}

/// One side of a shunt: its nodes and the share of the side's height each
/// node owns, as cumulative boundaries ending at 1.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightProfile {
    pub targets: Vec<ShuntTarget>,
    pub boundaries: Vec<f64>,
}

impl HeightProfile {
    /// Profile of nodes at fractional heights `fractions` (ascending, 0..1).
    /// Each node owns the height up to the midpoint towards the next node.
    pub fn new(targets: Vec<ShuntTarget>, fractions: &[f64]) -> Self {
        let mut boundaries: Vec<f64> = fractions
            .windows(2)
            .map(|pair| 0.5 * (pair[0] + pair[1]))
            .collect();
        boundaries.push(1.0);
        Self { targets, boundaries }
    }

    /// Bottom and top points of a ground plane.
    pub fn ground() -> Self {
        Self::new(vec![ShuntTarget::Ground, ShuntTarget::Ground], &[0.0, 1.0])
    }

    fn len(&self) -> usize {
        self.targets.len()
    }

    /// Share of the node after `index`; unbounded past the top node.
    fn next_share(&self, index: usize) -> f64 {
        match self.boundaries.get(index + 1) {
            Some(next) => next - self.boundaries[index],
            None => f64::INFINITY,
        }
    }
}

/// A shunt link between two targets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShuntLink {
    pub inner: ShuntTarget,
    pub outer: ShuntTarget,
    pub capacitance: f64,
}

/// Distribute `total` over two profiles.
///
/// Each side keeps a cumulative counter (the upper boundary of its current
/// node). While the two counters differ by more than the smaller next-node
/// share, the side with the smaller next share advances (the lagging side on
/// a tie). Once they are within one share of each other, the current pair is
/// linked with the increment since the last link and both sides advance. The
/// remainder up to 1 goes to the closing link between the two top nodes, so
/// shares always sum to `total`.
pub fn merge_profiles(inner: &HeightProfile, outer: &HeightProfile, total: f64) -> Vec<ShuntLink> {
    let mut links = Vec::new();
    if inner.len() == 0 || outer.len() == 0 {
        return links;
    }
    let (mut i, mut o) = (0, 0);
    let mut emitted = 0.0;
    loop {
        let (last_i, last_o) = (i + 1 == inner.len(), o + 1 == outer.len());
        if last_i && last_o {
            break;
        }
        let (at_i, at_o) = (inner.boundaries[i], outer.boundaries[o]);
        let (share_i, share_o) = (inner.next_share(i), outer.next_share(o));
        let step = share_i.min(share_o);

        if (at_i - at_o).abs() <= step + MERGE_TIE {
            let level = at_i.min(at_o);
            if level > emitted {
                links.push(ShuntLink {
                    inner: inner.targets[i],
                    outer: outer.targets[o],
                    capacitance: total * (level - emitted),
                });
                emitted = level;
            }
            if !last_i {
                i += 1;
            }
            if !last_o {
                o += 1;
            }
        } else if (share_i - share_o).abs() <= MERGE_TIE {
            if at_i <= at_o {
                i += 1;
            } else {
                o += 1;
            }
        } else if share_i < share_o {
            i += 1;
        } else {
            o += 1;
        }
    }

    let rest = 1.0 - emitted;
    if rest > MERGE_TIE {
        links.push(ShuntLink {
            inner: inner.targets[i],
            outer: outer.targets[o],
            capacitance: total * rest,
        });
    }
    links
}

fn apply_links(nodes: &mut [Node], links: &[ShuntLink]) {
    for link in links {
        match (link.inner, link.outer) {
            (ShuntTarget::Ground, ShuntTarget::Ground) => {}
            (ShuntTarget::Node(a), ShuntTarget::Node(b)) => {
                nodes[a].add_shunt(ShuntTarget::Node(b), link.capacitance);
                nodes[b].add_shunt(ShuntTarget::Node(a), link.capacitance);
            }
            (ShuntTarget::Node(a), ShuntTarget::Ground) | (ShuntTarget::Ground, ShuntTarget::Node(a)) => {
                nodes[a].add_shunt(ShuntTarget::Ground, link.capacitance);
            }
        }
    }
}

/// What sits radially inside a coil.
#[derive(Debug, Clone, Copy, PartialEq)]
enum InnerSide {
    Core { radius: f64 },
    Shield { radius: f64 },
    Coil { coil: usize, radius: f64 },
}

impl NetworkModel {
    /// Height profile of a coil's nodes, referenced to the coil's bottom.
    fn coil_profile(&self, coil: usize, nodes: &[Node]) -> Result<(HeightProfile, f64)> {
        let (z1, z2) = self.coil_span(coil)?;
        let height = z2 - z1;
        if !(height > 0.0) {
            return Err(CoilnetError::illegal_location(
                Location::new(coil as i32, 0),
                format!("coil spans zero axial height at z = {:.4} m", z1),
            ));
        }
        let range = self.coil_node_range(coil).ok_or(CoilnetError::CapacitanceNotCalculated {
            what: "nodes",
        })?;
        let targets = range.clone().map(ShuntTarget::Node).collect();
        let fractions: Vec<f64> = nodes[range]
            .iter()
            .map(|n| ((n.z - z1) / height).clamp(0.0, 1.0))
            .collect();
        Ok((HeightProfile::new(targets, &fractions), height))
    }

    fn inner_side(&self, coil: usize) -> Result<InnerSide> {
        if let Some(shield) = self.radial_shield(coil) {
            return Ok(InnerSide::Shield {
                radius: shield.rect().r2(),
            });
        }
        if coil == 0 {
            return Ok(InnerSide::Core {
                radius: self.core.radius(),
            });
        }
        let (_, r2) = self.coil_radii(coil - 1)?;
        Ok(InnerSide::Coil {
            coil: coil - 1,
            radius: r2,
        })
    }

    fn checked_coaxial(&self, coil: usize, ri: f64, ro: f64, h: f64) -> Result<f64> {
        if !(ri > 0.0 && ro > ri) {
            return Err(CoilnetError::illegal_location(
                Location::new(coil as i32, 0),
                format!("radial clearance [{:.4}, {:.4}] m is empty", ri, ro),
            ));
        }
        Ok(coaxial_capacitance(ri, ro, h, &self.config))
    }

    /// Lumped shunt capacitance between coil `outer` and whatever sits
    /// directly inside it (core, radial shield or coil `outer - 1`).
    pub fn inner_shunt_capacitance(&self, outer: usize) -> Result<f64> {
        let (ro, _) = self.coil_radii(outer)?;
        let (z1, z2) = self.coil_span(outer)?;
        let outer_height = z2 - z1;
        match self.inner_side(outer)? {
            InnerSide::Core { radius } | InnerSide::Shield { radius } => {
                self.checked_coaxial(outer, radius, ro, outer_height)
            }
            InnerSide::Coil { coil, radius } => {
                let (y1, y2) = self.coil_span(coil)?;
                let h = 0.5 * (outer_height + (y2 - y1));
                self.checked_coaxial(outer, radius, ro, h)
            }
        }
    }

    /// Lumped shunt capacitance between two radially adjacent coils.
    pub fn coil_pair_capacitance(&self, inner: usize, outer: usize) -> Result<f64> {
        if inner == outer {
            return Err(CoilnetError::SameCoilTwice { coil: inner });
        }
        self.require_coil(inner)?;
        self.require_coil(outer)?;
        let (inner, outer) = (inner.min(outer), inner.max(outer));
        if outer != inner + 1 || self.radial_shield(outer).is_some() {
            return Err(CoilnetError::illegal_location(
                Location::new(outer as i32, 0),
                format!("coil {} is not directly inside coil {}", inner, outer),
            ));
        }
        self.inner_shunt_capacitance(outer)
    }

    /// Tank and adjacent-leg capacitances of the outermost coil.
    pub fn ground_shunt_capacitances(&self) -> Result<(f64, f64)> {
        let coil = self
            .coil_count()
            .checked_sub(1)
            .ok_or(CoilnetError::EmptyModel)?;
        let (_, r2) = self.coil_radii(coil)?;
        let (z1, z2) = self.coil_span(coil)?;
        let h = z2 - z1;
        let f = self.config.in_window_fraction;
        let tank = self.checked_coaxial(coil, r2, r2 + self.tank_depth, h)?;
        let leg = self.checked_coaxial(coil, r2, self.core.leg_center - self.core.radius(), h)?;
        Ok(((1.0 - f) * tank, f * leg))
    }

    /// Fill the shunt lists of freshly generated nodes.
    pub(super) fn synthesize_shunts(&self, nodes: &mut [Node]) -> Result<()> {
        let count = self.coil_count();
        for coil in 0..count {
            let (outer_profile, _) = self.coil_profile(coil, nodes)?;
            let total = self.inner_shunt_capacitance(coil)?;
            let links = match self.inner_side(coil)? {
                InnerSide::Core { .. } | InnerSide::Shield { .. } => {
                    let bottom = outer_profile.targets[0];
                    let top = outer_profile.targets[outer_profile.len() - 1];
                    vec![
                        ShuntLink {
                            inner: ShuntTarget::Ground,
                            outer: bottom,
                            capacitance: 0.5 * total,
                        },
                        ShuntLink {
                            inner: ShuntTarget::Ground,
                            outer: top,
                            capacitance: 0.5 * total,
                        },
                    ]
                }
                InnerSide::Coil { coil: inner, .. } => {
                    let (inner_profile, _) = self.coil_profile(inner, nodes)?;
                    merge_profiles(&inner_profile, &outer_profile, total)
                }
            };
            log::debug!("coil {}: inner shunt {:.4e} F over {} links", coil, total, links.len());
            apply_links(nodes, &links);

            // A radial shield just outside this coil is its ground plane
            if let Some(shield) = self.radial_shield(coil + 1) {
                let (_, r2) = self.coil_radii(coil)?;
                let (z1, z2) = self.coil_span(coil)?;
                let c = self.checked_coaxial(coil, r2, shield.rect().r1(), z2 - z1)?;
                apply_links(nodes, &merge_profiles(&outer_profile, &HeightProfile::ground(), c));
            }
        }

        if let Some(outermost) = count.checked_sub(1) {
            let (profile, _) = self.coil_profile(outermost, nodes)?;
            let (tank, leg) = self.ground_shunt_capacitances()?;
            for c in [tank, leg] {
                apply_links(nodes, &merge_profiles(&profile, &HeightProfile::ground(), c));
            }
        }
        Ok(())
    }
}
