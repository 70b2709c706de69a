//! Connector positions and the connections that join segments.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::SegmentId;

/// Where a segment is joined to something else: one of eight physical
/// positions on the segment, or one of three terminations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorLocation {
    OutsideUpper,
    InsideLower,
    CenterLower,
    CenterUpper,
    InsideUpper,
    OutsideLower,
    OutsideCenter,
    InsideCenter,
    /// Unconnected end
    Floating,
    /// System ground
    Ground,
    /// Injected impulse ("shot") terminal
    Impulse,
}

impl ConnectorLocation {
    /// All eight physical positions.
    pub const PHYSICAL: [ConnectorLocation; 8] = [
        Self::OutsideUpper,
        Self::InsideLower,
        Self::CenterLower,
        Self::CenterUpper,
        Self::InsideUpper,
        Self::OutsideLower,
        Self::OutsideCenter,
        Self::InsideCenter,
    ];

    /// The three termination values.
    pub const TERMINATIONS: [ConnectorLocation; 3] = [Self::Floating, Self::Ground, Self::Impulse];

    /// Exit position of a disc entered at `self` (the winding crosses both
    /// radially and axially).
    pub fn alternating(self) -> Self {
        match self {
            Self::OutsideUpper => Self::InsideLower,
            Self::InsideLower => Self::OutsideUpper,
            Self::CenterLower => Self::CenterUpper,
            Self::CenterUpper => Self::CenterLower,
            Self::InsideUpper => Self::OutsideLower,
            Self::OutsideLower => Self::InsideUpper,
            Self::OutsideCenter => Self::InsideCenter,
            Self::InsideCenter => Self::OutsideCenter,
            Self::Floating | Self::Ground | Self::Impulse => self,
        }
    }

    /// Position on the neighbouring segment that faces `self` across an
    /// axial joint.
    pub fn standard_to(self) -> Self {
        match self {
            Self::OutsideUpper => Self::OutsideLower,
            Self::InsideLower => Self::InsideUpper,
            Self::CenterLower => Self::CenterUpper,
            Self::CenterUpper => Self::CenterLower,
            Self::InsideUpper => Self::InsideLower,
            Self::OutsideLower => Self::OutsideUpper,
            // radial-type connectors have no axial partner
            Self::OutsideCenter => Self::OutsideCenter,
            Self::InsideCenter => Self::InsideCenter,
            Self::Floating | Self::Ground | Self::Impulse => self,
        }
    }

    /// Exit position after winding through `sections` consecutive discs
    /// entered at `self`.
    pub fn exit_after(self, sections: usize) -> Self {
        let mut entry = self;
        let mut exit = self;
        for i in 0..sections {
            exit = entry.alternating();
            if i + 1 < sections {
                entry = exit.standard_to();
            }
        }
        exit
    }

    pub fn is_termination(self) -> bool {
        matches!(self, Self::Floating | Self::Ground | Self::Impulse)
    }

    /// Lower-family positions attach to a segment's bottom node; every other
    /// physical position attaches to its top node.
    pub fn is_lower(self) -> bool {
        matches!(self, Self::InsideLower | Self::CenterLower | Self::OutsideLower)
    }
}

impl fmt::Display for ConnectorLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OutsideUpper => "outside-upper",
            Self::InsideLower => "inside-lower",
            Self::CenterLower => "center-lower",
            Self::CenterUpper => "center-upper",
            Self::InsideUpper => "inside-upper",
            Self::OutsideLower => "outside-lower",
            Self::OutsideCenter => "outside-center",
            Self::InsideCenter => "inside-center",
            Self::Floating => "floating",
            Self::Ground => "ground",
            Self::Impulse => "impulse",
        };
        f.write_str(name)
    }
}

/// A join recorded on the owning segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Position on the owning segment
    pub from: ConnectorLocation,
    /// Position on the target segment, or a termination
    pub to: ConnectorLocation,
    /// Target segment; `None` for terminations
    pub segment: Option<SegmentId>,
}

impl Connection {
    /// Connection to another segment.
    pub fn to_segment(from: ConnectorLocation, to: ConnectorLocation, segment: SegmentId) -> Self {
        Self {
            from,
            to,
            segment: Some(segment),
        }
    }

    /// Connection to a termination (ground, impulse or floating).
    pub fn terminal(from: ConnectorLocation, termination: ConnectorLocation) -> Self {
        Self {
            from,
            to: termination,
            segment: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.segment.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mappings_are_involutions() {
        for loc in ConnectorLocation::PHYSICAL {
            assert_eq!(loc.alternating().alternating(), loc);
            assert_eq!(loc.standard_to().standard_to(), loc);
        }
    }

    #[test]
    fn test_terminations_are_fixed_points() {
        for loc in ConnectorLocation::TERMINATIONS {
            assert_eq!(loc.alternating(), loc);
            assert_eq!(loc.standard_to(), loc);
            assert!(loc.is_termination());
        }
    }

    #[test]
    fn test_mapping_table() {
        use ConnectorLocation::*;
        assert_eq!(OutsideUpper.alternating(), InsideLower);
        assert_eq!(InsideUpper.alternating(), OutsideLower);
        assert_eq!(CenterLower.alternating(), CenterUpper);
        assert_eq!(OutsideCenter.alternating(), InsideCenter);
        assert_eq!(OutsideUpper.standard_to(), OutsideLower);
        assert_eq!(InsideLower.standard_to(), InsideUpper);
        assert_eq!(OutsideCenter.standard_to(), OutsideCenter);
    }

    #[test]
    fn test_disc_exit_alternates_sides() {
        use ConnectorLocation::*;
        // One disc entered outside-bottom leaves inside-top
        assert_eq!(OutsideLower.exit_after(1), InsideUpper);
        // Two discs bring the conductor back outside
        assert_eq!(OutsideLower.exit_after(2), OutsideUpper);
        // Helical turns stay centred
        assert_eq!(CenterLower.exit_after(5), CenterUpper);
    }
}
