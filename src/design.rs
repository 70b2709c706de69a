//! Design description and model builder.
//!
//! A [`Design`] is the plain data a loader hands over: the core, the basic
//! sections of every coil and how they are grouped, wired and shielded.
//! [`NetworkModel::from_design`] turns it into a populated model.
//!
//! # Example
//!
//! ```json
//! {
//!   "core": { "diameter": 0.4, "real_window_height": 1.0,
//!             "window_height_factor": 1.2, "leg_center": 1.0 },
//!   "tank_depth": 0.15,
//!   "sections": [ ... ],
//!   "coils": [
//!     { "radial": 0, "sections_per_segment": 2, "winding": "disc",
//!       "bottom": "Impulse", "top": "Ground",
//!       "bottom_ring": { "height": 0.01, "gap": 0.005 } }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::error::{CoilnetError, Result};
use crate::network::{CoilEnd, NetworkModel, DEFAULT_ENTRY};
use crate::topology::{BasicSection, ConnectorLocation, Core, SegmentId};

/// Winding construction of a coil.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindingKind {
    /// Consecutive discs alternate between inside and outside crossovers
    #[default]
    Disc,
    /// Disc winding with interleaved turns
    InterleavedDisc,
    /// Turns run straight up one side of the coil
    Helical,
}

impl WindingKind {
    /// Exit position of a segment of `sections` basic sections entered at `entry`.
    pub fn exit(self, entry: ConnectorLocation, sections: usize) -> ConnectorLocation {
        match self {
            Self::Disc | Self::InterleavedDisc => entry.exit_after(sections),
            Self::Helical => entry.standard_to(),
        }
    }
}

/// Static ring placement at one coil end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RingDesign {
    pub height: f64,
    /// Clearance between the ring and the nearest winding segment
    pub gap: f64,
}

/// Grouping, wiring and shielding of one coil.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoilLayout {
    pub radial: usize,
    #[serde(default = "default_sections_per_segment")]
    pub sections_per_segment: usize,
    #[serde(default)]
    pub winding: WindingKind,
    /// Termination at the coil entry
    #[serde(default)]
    pub bottom: Option<ConnectorLocation>,
    /// Termination at the coil exit
    #[serde(default)]
    pub top: Option<ConnectorLocation>,
    #[serde(default)]
    pub bottom_ring: Option<RingDesign>,
    #[serde(default)]
    pub top_ring: Option<RingDesign>,
}

fn default_sections_per_segment() -> usize {
    1
}

impl CoilLayout {
    /// Disc coil with one segment per basic section and open ends.
    pub fn new(radial: usize) -> Self {
        Self {
            radial,
            sections_per_segment: default_sections_per_segment(),
            winding: WindingKind::Disc,
            bottom: None,
            top: None,
            bottom_ring: None,
            top_ring: None,
        }
    }
}

/// Grounded radial shield just inside a coil.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShieldDesign {
    pub coil: usize,
    pub thickness: f64,
}

/// Explicit wire between two coil ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkDesign {
    pub from_coil: usize,
    pub from_end: CoilEnd,
    pub to_coil: usize,
    pub to_end: CoilEnd,
}

/// Complete design description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Design {
    pub core: Core,
    pub tank_depth: f64,
    #[serde(default)]
    pub config: ModelConfig,
    pub sections: Vec<BasicSection>,
    #[serde(default)]
    pub coils: Vec<CoilLayout>,
    #[serde(default)]
    pub radial_shields: Vec<ShieldDesign>,
    #[serde(default)]
    pub links: Vec<LinkDesign>,
}

impl Design {
    /// Decode a JSON design.
    #[cfg(feature = "cli")]
    pub fn from_json(input: &str) -> Result<Self> {
        serde_json::from_str(input).map_err(|e| CoilnetError::DesignParseError {
            message: e.to_string(),
        })
    }

    /// Read and decode a JSON design file.
    #[cfg(feature = "cli")]
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoilnetError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_json(&content)
    }
}

/// Entry and exit connector of one coil, as wired by the builder.
#[derive(Debug, Clone, Copy)]
struct CoilEnds {
    bottom: (SegmentId, ConnectorLocation),
    top: (SegmentId, ConnectorLocation),
}

impl CoilEnds {
    fn at(&self, end: CoilEnd) -> (SegmentId, ConnectorLocation) {
        match end {
            CoilEnd::Bottom => self.bottom,
            CoilEnd::Top => self.top,
        }
    }
}

impl NetworkModel {
    /// Build a model from a design description.
    ///
    /// Coils are built inside out. Each coil's sections are grouped bottom to
    /// top into segments of `sections_per_segment`, wired from
    /// [`DEFAULT_ENTRY`] according to the winding kind, terminated, and
    /// fitted with static rings. Radial shields and inter-coil links follow.
    pub fn from_design(design: Design) -> Result<Self> {
        let mut model = NetworkModel::new(design.core, design.tank_depth, design.config)?;

        let mut coils: BTreeMap<i32, Vec<BasicSection>> = BTreeMap::new();
        for section in design.sections {
            coils.entry(section.location.radial).or_default().push(section);
        }
        if coils.is_empty() {
            return Err(CoilnetError::EmptyModel);
        }

        let mut layouts: BTreeMap<usize, CoilLayout> = BTreeMap::new();
        for layout in design.coils {
            let radial = layout.radial;
            if layouts.insert(radial, layout).is_some() {
                return Err(CoilnetError::invalid_parameter(
                    "coils",
                    format!("coil {} has more than one layout", radial),
                ));
            }
        }
        if let Some(&coil) = layouts.keys().find(|&&c| !coils.contains_key(&(c as i32))) {
            return Err(CoilnetError::CoilDoesNotExist {
                coil,
                count: coils.len(),
            });
        }

        let mut ends = Vec::with_capacity(coils.len());
        for (radial, mut sections) in coils {
            sections.sort_by_key(|s| s.location.axial);
            let layout = match usize::try_from(radial).ok().and_then(|c| layouts.remove(&c)) {
                Some(layout) => layout,
                None => CoilLayout::new(radial.max(0) as usize),
            };
            ends.push(model.build_coil(sections, &layout)?);
        }

        for shield in &design.radial_shields {
            model.add_radial_shield(shield.coil, shield.thickness)?;
        }
        for link in &design.links {
            let lookup = |coil: usize| {
                ends.get(coil).ok_or(CoilnetError::CoilDoesNotExist {
                    coil,
                    count: ends.len(),
                })
            };
            let (from_id, from) = lookup(link.from_coil)?.at(link.from_end);
            let (to_id, to) = lookup(link.to_coil)?.at(link.to_end);
            model.add_connection(from_id, from, Some(to_id), to)?;
        }

        log::info!(
            "built model with {} coils and {} winding segments",
            model.coil_count(),
            model.winding_count()
        );
        Ok(model)
    }

    fn build_coil(&mut self, sections: Vec<BasicSection>, layout: &CoilLayout) -> Result<CoilEnds> {
        let per_segment = layout.sections_per_segment;
        if per_segment == 0 {
            return Err(CoilnetError::ArgumentIsZeroCount {
                argument: "sections per segment",
            });
        }
        if sections.len() % per_segment != 0 {
            return Err(CoilnetError::ArgAIsNotAMultipleOfArgB {
                a: sections.len(),
                b: per_segment,
            });
        }

        let mut wired = Vec::with_capacity(sections.len() / per_segment);
        let mut entry = DEFAULT_ENTRY;
        for chunk in sections.chunks(per_segment) {
            let mut segment = self.new_segment(chunk.to_vec())?;
            segment.interleaved = layout.winding == WindingKind::InterleavedDisc;
            let id = self.insert_segment(segment)?;
            let exit = layout.winding.exit(entry, chunk.len());
            wired.push((id, entry, exit));
            entry = exit.standard_to();
        }
        for pair in wired.windows(2) {
            let ((lower, _, exit), (upper, entry, _)) = (pair[0], pair[1]);
            self.add_connection(lower, exit, Some(upper), entry)?;
        }

        let (Some(&(first, first_entry, _)), Some(&(last, _, last_exit))) = (wired.first(), wired.last()) else {
            return Err(CoilnetError::ArgumentIsZeroCount { argument: "sections" });
        };
        if let Some(termination) = layout.bottom {
            self.add_connection(first, first_entry, None, termination)?;
        }
        if let Some(termination) = layout.top {
            self.add_connection(last, last_exit, None, termination)?;
        }

        let coil = layout.radial;
        if let Some(ring) = layout.bottom_ring {
            self.add_static_ring(coil, CoilEnd::Bottom, ring.height, ring.gap)?;
        }
        if let Some(ring) = layout.top_ring {
            self.add_static_ring(coil, CoilEnd::Top, ring.height, ring.gap)?;
        }

        log::debug!("coil {}: {} segments, {:?} winding", coil, wired.len(), layout.winding);
        Ok(CoilEnds {
            bottom: (first, first_entry),
            top: (last, last_exit),
        })
    }
}
