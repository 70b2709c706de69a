//! End-to-end checks of a complete model against hand-computed values.

use std::f64::consts::PI;

use approx::assert_relative_eq;

use super::{CoilEnd, NetworkModel};
use crate::config::ModelConfig;
use crate::design::{CoilLayout, Design, RingDesign, WindingKind};
use crate::matrix::Layout;
use crate::topology::{BasicSection, ConnectorLocation, Core, Location, Node, Segment};
use crate::EPSILON_0;

const H: f64 = 0.015;
const TURNS: f64 = 10.0;

/// Two identical discs of a helical coil with a static ring below,
/// floating at the bottom and grounded at the top.
fn helical_design() -> Design {
    let sections = (0..2)
        .map(|a| {
            let z1 = 0.1 + a as f64 * 0.02;
            BasicSection::new(Location::new(0, a), TURNS, 100.0, 0.25, 0.30, z1, z1 + H)
        })
        .collect();
    let mut layout = CoilLayout::new(0);
    layout.winding = WindingKind::Helical;
    layout.bottom = Some(ConnectorLocation::Floating);
    layout.top = Some(ConnectorLocation::Ground);
    layout.bottom_ring = Some(RingDesign {
        height: 0.01,
        gap: 0.005,
    });
    Design {
        core: Core::new(0.4, 1.0, 1.2, 1.0).unwrap(),
        tank_depth: 0.15,
        config: ModelConfig::new().with_fourier_iterations(40),
        sections,
        coils: vec![layout],
        radial_shields: vec![],
        links: vec![],
    }
}

fn coaxial(ri: f64, ro: f64, h: f64, c: &ModelConfig) -> f64 {
    let rs = ri + c.hilo_solid_fraction * (ro - ri);
    2.0 * PI * EPSILON_0 * h / ((rs / ri).ln() / c.eps_solid + (ro / rs).ln() / c.eps_oil)
}

#[test]
fn test_helical_coil_matches_hand_calculation() {
    let mut model = NetworkModel::from_design(helical_design()).unwrap();
    let c = *model.config();
    model.compute_series_capacitances().unwrap();
    let cm = model.capacitance_matrix().unwrap().clone();
    assert_eq!(cm.rows(), 3);
    assert_eq!(model.nodes().unwrap().len(), 3);

    // Series: one disc each, plus the oil gaps next to it
    let ct = EPSILON_0 * c.eps_paper * 2.0 * PI * 0.275 * H / c.turn_insulation;
    let disc = ct * (TURNS - 1.0) / (TURNS * TURNS);
    let gap = EPSILON_0 * c.eps_oil * PI * (0.30 * 0.30 - 0.25 * 0.25) / (3.0 * 0.005);
    let lower = disc + 2.0 * gap; // ring below, disc above
    let upper = disc + gap;

    // Shunts over the coil height 0.1..0.135. Nodes sit at fractions
    // 0, 0.5, 1 (the shared node halfway between 0.115 and 0.12), so they
    // own 0.25, 0.5, 0.25 of the height. Against the two-point ground plane
    // (0.5 each) the counters first meet at 0.25, then at 0.75, leaving the
    // closing 0.25 to the top node. The core shunt goes half to each end.
    let h = 0.035;
    let core = coaxial(0.2, 0.25, h, &c);
    let f = c.in_window_fraction;
    let ground = (1.0 - f) * coaxial(0.30, 0.45, h, &c) + f * coaxial(0.30, 0.80, h, &c);

    let expected = [
        [lower + 0.5 * core + 0.25 * ground, -lower, 0.0],
        [-lower, lower + upper + 0.5 * ground, -upper],
        [0.0, -upper, upper + 0.5 * core + 0.25 * ground],
    ];
    for (i, row) in expected.iter().enumerate() {
        for (j, &value) in row.iter().enumerate() {
            assert_relative_eq!(cm.get(i, j).unwrap(), value, max_relative = 1e-6, epsilon = 1e-24);
        }
    }

    let l = model.inductance_matrix().unwrap();
    assert_eq!(l.rows(), 2);
    assert!(l.is_symmetric());
    assert_eq!(l.layout(), Layout::PositiveDefinite);
    let (l00, l01, l11) = (l.get(0, 0).unwrap(), l.get(0, 1).unwrap(), l.get(1, 1).unwrap());
    assert!(l00 > 0.0 && l11 > 0.0);
    assert!(l00 * l11 - l01 * l01 > 0.0);
    // Identical discs, only the yoke distance differs
    assert_relative_eq!(l00, l11, max_relative = 0.1);
}

/// Coil 0 is one two-disc segment (nodes 0, 1); coil 1 has two connected
/// one-disc segments (nodes 2, 3, 4) over the same height.
fn two_coil_design() -> Design {
    let section = |radial: i32, axial: i32| {
        let r1 = 0.25 + 0.1 * radial as f64;
        let z1 = 0.1 + axial as f64 * 0.02;
        BasicSection::new(Location::new(radial, axial), TURNS, 100.0, r1, r1 + 0.05, z1, z1 + H)
    };
    let mut inner = CoilLayout::new(0);
    inner.sections_per_segment = 2;
    Design {
        core: Core::new(0.4, 1.0, 1.2, 1.0).unwrap(),
        tank_depth: 0.15,
        config: ModelConfig::new().with_fourier_iterations(20),
        sections: (0..2).flat_map(|a| [section(0, a), section(1, a)]).collect(),
        coils: vec![inner, CoilLayout::new(1)],
        radial_shields: vec![],
        links: vec![],
    }
}

#[test]
fn test_two_coil_shunt_pairs_match_hand_merge() {
    let mut model = NetworkModel::from_design(two_coil_design()).unwrap();
    let c = *model.config();
    model.compute_series_capacitances().unwrap();
    assert_eq!(model.set_nodes().unwrap(), vec![1, 4]);
    let cm = model.capacitance_matrix().unwrap().clone();
    assert_eq!(cm.rows(), 5);

    // Inner node shares 0.5, 0.5; outer 0.25, 0.5, 0.25.
    // Start: counters 0.5 and 0.25 differ by 0.25, within the smaller next
    // share (0.5), so link (0, 2) takes 0.25 and both advance.
    // Then 1.0 and 0.75 differ by 0.25, within the outer share 0.25, so
    // link (1, 3) takes 0.75 - 0.25 = 0.5. The closing link (1, 4) takes 0.25.
    // Node 0 never pairs with node 3.
    let pair = coaxial(0.30, 0.35, 0.035, &c);
    let expected = [
        ((0, 2), -0.25 * pair),
        ((0, 3), 0.0),
        ((0, 4), 0.0),
        ((1, 2), 0.0),
        ((1, 3), -0.5 * pair),
        ((1, 4), -0.25 * pair),
    ];
    for ((i, j), value) in expected {
        assert_relative_eq!(cm.get(i, j).unwrap(), value, max_relative = 1e-9, epsilon = 1e-24);
        assert_relative_eq!(cm.get(j, i).unwrap(), value, max_relative = 1e-9, epsilon = 1e-24);
    }
}

#[test]
fn test_mutation_invalidates_everything() {
    let mut model = NetworkModel::from_design(helical_design()).unwrap();
    model.compute_series_capacitances().unwrap();
    model.capacitance_matrix().unwrap();
    model.inductance_matrix().unwrap();

    let top = model.coil_segments(0)[1].id();
    model.split_segments(&[top], 1).unwrap();
    assert!(model.nodes().is_none());
    assert!(model.capacitance().is_err());
    assert!(model.inductance().is_none());
    assert!(model.winding_segments().all(|s| s.series_capacitance.is_none()));
}

#[test]
fn test_removing_ring_changes_lower_series_capacitance() {
    let mut model = NetworkModel::from_design(helical_design()).unwrap();
    model.compute_series_capacitances().unwrap();
    let bottom = model.coil_segments(0)[0].id();
    let with_ring = model.series_capacitance(bottom).unwrap();

    let ring = model.static_ring(0, 0).unwrap().id();
    model.remove_static_ring(ring).unwrap();
    model.compute_series_capacitances().unwrap();
    let without = model.series_capacitance(bottom).unwrap();
    assert!(without < with_ring);

    model.add_static_ring(0, CoilEnd::Bottom, 0.01, 0.005).unwrap();
    model.compute_series_capacitances().unwrap();
    assert_relative_eq!(model.series_capacitance(bottom).unwrap(), with_ring, max_relative = 1e-12);
}

#[test]
fn test_serde_round_trip() {
    let design = helical_design();
    let json = serde_json::to_string(&design).unwrap();
    let back: Design = serde_json::from_str(&json).unwrap();
    assert_eq!(back.coils, design.coils);
    assert_eq!(back.sections.len(), design.sections.len());
    for (a, b) in back.sections.iter().zip(&design.sections) {
        assert_eq!(a.location, b.location);
        assert_relative_eq!(a.rect.z2(), b.rect.z2(), max_relative = 1e-15);
    }

    let mut model = NetworkModel::from_design(design).unwrap();
    model.compute_series_capacitances().unwrap();
    model.set_nodes().unwrap();
    for segment in model.segments() {
        let json = serde_json::to_string(segment).unwrap();
        let back: Segment = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id(), segment.id());
        assert_eq!(back.kind(), segment.kind());
        assert_eq!(back.location(), segment.location());
        assert_eq!(back.connections, segment.connections);
        assert_eq!(back.series_capacitance.is_some(), segment.series_capacitance.is_some());
    }
    for node in model.nodes().unwrap() {
        let json = serde_json::to_string(node).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!((back.id, back.below, back.above), (node.id, node.below, node.above));
        assert_eq!(back.shunts.len(), node.shunts.len());
        assert_relative_eq!(back.total_shunt(), node.total_shunt(), max_relative = 1e-12);
    }
}
