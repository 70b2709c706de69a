//! The winding network model.
//!
//! [`NetworkModel`] owns the segment store, keeps it sorted by location and
//! derives everything else from it on demand:
//!
//! 1. Series capacitance per winding segment ([`SeriesCapacitanceModel`])
//! 2. Nodes and their shunt capacitances
//! 3. The nodal capacitance matrix
//! 4. The segment inductance matrix
//!
//! Any structural mutation drops every derived artifact, so callers re-run
//! the steps they need afterwards.

mod capacitance;
mod inductance;
mod model;
mod mutation;
mod nodes;
mod series;
mod shunt;

#[cfg(test)]
mod scenarios;
#[cfg(test)]
mod test_support;

pub use capacitance::FixedCapacitance;
pub use model::NetworkModel;
pub use mutation::{CoilEnd, DEFAULT_ENTRY};
pub use series::{DiscSeriesModel, SeriesCapacitanceModel, SeriesContext};
pub use shunt::{coaxial_capacitance, merge_profiles, HeightProfile, ShuntLink};
