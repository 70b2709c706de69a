//! Winding topology data model.
//!
//! This module holds the geometric and electrical descriptors the network
//! model is assembled from: the [`Core`], [`BasicSection`]s, the
//! [`Segment`]s built from them, the [`Connection`]s joining segments and
//! the [`Node`]s generated by the assembly engine.

mod connector;
mod magnetic_core;
mod node;
mod segment;
mod types;

pub use connector::{Connection, ConnectorLocation};
pub use magnetic_core::Core;
pub use node::{Node, ShuntCapacitance, ShuntTarget};
pub use segment::{BasicSection, Segment, SegmentKind};
pub use types::{Location, Rect, SegmentId, SegmentIdAllocator};
