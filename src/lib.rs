//! # Coilnet
//!
//! Lumped-parameter network model of transformer windings for impulse
//! studies.
//!
//! This library provides:
//! - A topology model of cores, basic sections, segments and their connections
//! - A tagged real/complex matrix engine with LU, Cholesky and sparse QR solves
//! - Mutual inductance between winding segments (Fourier in-window series plus
//!   a closed-form image kernel outside the window)
//! - Node generation and assembly of the nodal capacitance and segment
//!   inductance matrices
//!
//! ## Architecture
//!
//! - [`topology`] - Core, locations, basic sections, segments, connectors, nodes
//! - [`matrix`] - Matrix container, arithmetic and factorizations
//! - [`inductance`] - Self and mutual inductance integrator
//! - [`network`] - Segment store, structural mutation and matrix assembly
//! - [`design`] - Serde design description and the model builder
//! - [`config`] - Model parameters
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! RUST_LOG=info coilnet design.json
//! ```
//!
//! ### Library
//!
//! ```ignore
//! let mut model = NetworkModel::from_design(design)?;
//! model.compute_series_capacitances()?;
//! let c = model.capacitance_matrix()?.clone();
//! let l = model.inductance_matrix()?;
//! ```
//!
//! ## Assembly Method
//!
//! Each coil is walked bottom to top. Connected segments share a node, so a
//! coil of k connected segments has k+1 nodes.
//!
//! 1. Series capacitance of every segment (turn-to-turn plus axial gaps)
//! 2. Nodes, then shunt capacitances distributed along the coil height
//! 3. Nodal capacitance matrix (symmetric, rows sum to the ground shunt)
//! 4. Inductance matrix (symmetric, verified positive definite by Cholesky)

pub mod config;
pub mod design;
pub mod error;
pub mod inductance;
pub mod matrix;
pub mod network;
pub mod topology;

// Re-export main types for convenience
pub use config::ModelConfig;
pub use design::Design;
pub use error::{CoilnetError, Result};
pub use matrix::Matrix;
pub use network::NetworkModel;

/// Vacuum permittivity in F/m
pub const EPSILON_0: f64 = 8.8541878128e-12;

/// Vacuum permeability in H/m
pub const MU_0: f64 = 1.25663706212e-6;
