//! The five-kind error taxonomy from the spec, carried on `error-stack`.
//!
//! `NotFound` is deliberately *not* constructed through [`GraphError`] —
//! per the propagation policy, lookups by unknown id/name return a sentinel
//! (`None`/empty slice) and never travel as a `Report`. `Malformed` likewise
//! never surfaces as an error: a dropped edge is counted in
//! [`crate::graph::ReferenceGraph::malformed_edge_count`], not reported.
//! Only `Finalized`, `Cancelled`, and `Fatal` are represented here.

use std::fmt;

use error_stack::Report;

/// One of the three kinds of failure that actually surface to a caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A build-phase call (`add_object`, `add_edge`, `add_root`, ...) was
    /// made after `finalize()`.
    Finalized,
    /// A cancellation handle tripped mid-computation; the produced state is
    /// partial and must not be consumed.
    Cancelled,
    /// Allocation failure or an integrity violation (e.g. a cycle detected
    /// where the dominator computation proves one cannot exist). Aborts the
    /// analysis run; no graceful recovery is attempted.
    Fatal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finalized => f.write_str("graph is finalized; no further mutation is allowed"),
            Self::Cancelled => f.write_str("computation was cancelled; output is not ready"),
            Self::Fatal => f.write_str("fatal error: allocation failure or integrity violation"),
        }
    }
}

impl std::error::Error for ErrorKind {}

/// A reported [`ErrorKind`] with whatever context call sites chose to
/// attach via `error_stack::Report::attach_printable`.
pub type GraphError = Report<ErrorKind>;

/// Result alias used throughout build-phase and computation-phase APIs.
pub type GraphResult<T> = error_stack::Result<T, ErrorKind>;
