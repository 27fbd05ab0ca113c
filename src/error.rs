//! Error model for the vector subsystem.
//!
//! Every public operation returns [`VectorResult`]. The variants mirror the
//! seven error kinds the host's SQL surface distinguishes: user mistakes are
//! reported back to the caller as text, shape mismatches are caught before
//! the algebra ever runs, `NotFound` covers an unknown index name, storage
//! failures are propagated with context, and `Internal` marks invariants
//! that a correct SQL surface can never trigger.

use std::fmt;

/// Describes the shape of a vector for a mismatch diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeDesc {
    pub type_name: &'static str,
    pub dim: usize,
}

impl fmt::Display for ShapeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.type_name, self.dim)
    }
}

/// The single error type this crate returns.
///
/// `Constraint` (duplicate parameter row on create) is deliberately absent:
/// that condition is caught at the call site and turned into
/// [`crate::index::CreateOutcome::SkipRefill`], never surfaced as an error.
#[derive(Debug, thiserror::Error)]
pub enum VectorError {
    /// Malformed text/blob vector, malformed index parameter, wrong SQL
    /// argument type, dimension overflow, or an unrecognized index name
    /// passed to a parsing routine.
    #[error("{0}")]
    UserInput(String),

    /// Type or dimension mismatch between two vectors in a binary operation,
    /// or across steps of the `vector_sum` aggregate.
    #[error("vector shape mismatch: expected {expected}, got {actual}")]
    Shape {
        expected: ShapeDesc,
        actual: ShapeDesc,
    },

    /// Index name unknown at search/insert/delete time.
    #[error("no such vector index: {index_name}")]
    NotFound { index_name: String },

    /// The underlying SQL execution (against the meta shadow table or the
    /// graph engine's own shadow tables) failed. `context` is a short
    /// caller-supplied prefix; `source` is the host's own error, preserved
    /// verbatim.
    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },

    /// An allocation failed. Carries no message so that reporting the error
    /// itself never allocates.
    #[error("out of memory")]
    Resource,

    /// An invariant was violated below the SQL surface (shape mismatch that
    /// should have been caught at the boundary, an unknown element type
    /// tag). Not reachable through a correct SQL surface.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VectorError {
    pub fn user_input(msg: impl Into<String>) -> Self {
        VectorError::UserInput(msg.into())
    }

    pub fn storage(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        VectorError::Storage {
            context: context.into(),
            source: Box::new(source),
        }
    }

    pub fn not_found(index_name: impl Into<String>) -> Self {
        VectorError::NotFound {
            index_name: index_name.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        VectorError::Internal(msg.into())
    }
}

pub type VectorResult<T> = Result<T, VectorError>;
