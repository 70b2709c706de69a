//! Error types for the coilnet network model.
//!
//! This module provides a unified error type [`CoilnetError`] that covers
//! topology problems, structural mutations, shielding placement, capacitance
//! state, numeric integration and the matrix engine. Matrix failures are kept
//! in their own [`MatrixError`] so the engine can be used on its own.

use thiserror::Error;

use crate::topology::{Location, SegmentId};

/// Result type alias using [`CoilnetError`].
pub type Result<T> = std::result::Result<T, CoilnetError>;

/// Failures reported by the matrix engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MatrixError {
    /// A factorization or solve routine rejected its input
    #[error("Illegal argument: {message}")]
    IllegalArgument { message: String },

    /// Zero pivot / leading minor during LU or Cholesky (or a rank-deficient QR)
    #[error("Singular pivot - matrix is numerically singular")]
    SingularPivot,

    /// Operand shapes do not fit the operation
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },

    /// Combination the engine does not implement (e.g. complex sparse solve)
    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },

    /// Requested view does not match the stored number type
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },

    /// Element access outside the matrix
    #[error("Index ({row}, {column}) out of bounds for {rows}x{columns} matrix")]
    IndexOutOfBounds {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },
}

impl MatrixError {
    /// Create an illegal-argument error
    pub fn illegal(message: impl Into<String>) -> Self {
        Self::IllegalArgument {
            message: message.into(),
        }
    }

    /// Create a dimension-mismatch error from two shapes
    pub fn shapes(expected: (usize, usize), actual: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }

    /// Create an unsupported-combination error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create a type-mismatch error
    pub fn type_mismatch(message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            message: message.into(),
        }
    }
}

/// Unified error type for all coilnet operations.
#[derive(Error, Debug)]
pub enum CoilnetError {
    // ============ Topology Errors ============
    /// Operation needs at least one winding segment
    #[error("Model contains no winding segments")]
    EmptyModel,

    /// Coil index past the outermost coil
    #[error("Coil {coil} does not exist (model has {count} coils)")]
    CoilDoesNotExist { coil: usize, count: usize },

    /// A segment already occupies the location
    #[error("A segment already exists at {location}")]
    SegmentExists { location: Location },

    /// Segment id is not (or no longer) owned by the model
    #[error("Segment {id} is not part of the model")]
    SegmentNotInModel { id: SegmentId },

    /// Location is not valid for the requested operation
    #[error("Illegal location {location}: {message}")]
    IllegalLocation { location: Location, message: String },

    /// Basic sections or neighbouring segments overlap or are not contiguous
    #[error("Illegal axial gap at {location}: {message}")]
    IllegalAxialGap { location: Location, message: String },

    /// Shielding elements have no matrix row
    #[error("Segment at {location} is a shielding element")]
    SegmentIsShieldingElement { location: Location },

    /// A coil pair operation was given the same coil twice
    #[error("Coil {coil} given twice")]
    SameCoilTwice { coil: usize },

    // ============ Structural Mutation Errors ============
    /// `a` must divide evenly by `b`
    #[error("{a} is not a multiple of {b}")]
    ArgAIsNotAMultipleOfArgB { a: usize, b: usize },

    /// Operation replaces exactly one segment
    #[error("Expected exactly one old segment, got {count}")]
    OldSegmentCountIsNotOne { count: usize },

    /// Interleaved replacement needs sets of equal size
    #[error("Basic section sets have unequal sizes ({first} vs {other})")]
    UnequalBasicSectionsPerSet { first: usize, other: usize },

    /// An argument that counts things was zero
    #[error("Argument '{argument}' must not be zero")]
    ArgumentIsZeroCount { argument: &'static str },

    /// Connector position already in use on the segment
    #[error("Segment {id} already has a connection at {location}")]
    TooManyConnectors { id: SegmentId, location: String },

    // ============ Shielding Errors ============
    /// Shield already present at the requested position
    #[error("Shielding element already exists at {location}")]
    ShieldingElementExists { location: Location },

    /// Not enough clearance to place the shield
    #[error("No room for shielding element at {location}: {message}")]
    NoRoomForShieldingElement { location: Location, message: String },

    /// Segment was expected to be a static ring or radial shield
    #[error("Segment at {location} is not a shielding element")]
    NotAShieldingElement { location: Location },

    /// Coil end already carries a static ring
    #[error("Only one static ring allowed at this end of coil {coil}")]
    OnlyOneStaticRingAllowed { coil: usize },

    // ============ Capacitance / State Errors ============
    /// Series capacitances or the capacitance matrix are missing
    #[error("Capacitance not calculated: {what}")]
    CapacitanceNotCalculated { what: &'static str },

    /// Node is not attached to any segment
    #[error("Node {node} has no segments above or below it")]
    NodeHasNoSegments { node: usize },

    /// Inductance matrix failed the Cholesky test
    #[error("Inductance matrix is not positive definite - check winding geometry")]
    InductanceNotPositiveDefinite,

    // ============ Numeric Errors ============
    /// Matrix engine failure
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// Adaptive quadrature did not meet its tolerance
    #[error("Integration failed on [{lower:.4e}, {upper:.4e}]: {message}")]
    IntegrationFailed {
        lower: f64,
        upper: f64,
        message: String,
    },

    /// Invalid physical or configuration parameter
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // ============ I/O Errors ============
    /// Error reading a design file
    #[error("Failed to read design file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Design file could not be decoded
    #[error("Failed to decode design: {message}")]
    DesignParseError { message: String },
}

impl CoilnetError {
    /// Create an illegal-location error
    pub fn illegal_location(location: Location, message: impl Into<String>) -> Self {
        Self::IllegalLocation {
            location,
            message: message.into(),
        }
    }

    /// Create an illegal-axial-gap error
    pub fn illegal_gap(location: Location, message: impl Into<String>) -> Self {
        Self::IllegalAxialGap {
            location,
            message: message.into(),
        }
    }

    /// Create an invalid-parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an integration failure
    pub fn integration(lower: f64, upper: f64, message: impl Into<String>) -> Self {
        Self::IntegrationFailed {
            lower,
            upper,
            message: message.into(),
        }
    }

    /// Whether the error came from a numeric library call rather than a
    /// violated precondition.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Matrix(MatrixError::SingularPivot)
                | Self::Matrix(MatrixError::IllegalArgument { .. })
                | Self::IntegrationFailed { .. }
        )
    }
}
