//! Error types.
//!
//! Host failures and scheduler invariant violations are reported separately,
//! so a caller can tell a host that rejected an element apart from a render
//! cycle whose bookkeeping went wrong. Neither kind is retried: both end the
//! current render cycle.

use std::io;

use thiserror::Error;

// =============================================================================
// Host Errors
// =============================================================================

/// Failure reported by a [`HostAdapter`](crate::host::HostAdapter).
#[derive(Debug, Error)]
pub enum HostError {
    /// The host cannot create nodes of this element type.
    #[error("unsupported element type `{0}`")]
    UnsupportedElement(String),

    /// The host refused to assign a property.
    #[error("unsupported property `{name}` on `{element_type}`")]
    UnsupportedProperty { element_type: String, name: String },

    /// A node handle does not refer to a live host node.
    #[error("unknown host node {0}")]
    UnknownNode(String),

    /// A node was asked to detach from a parent it is not attached to.
    #[error("host node {child} is not a child of {parent}")]
    NotAChild { parent: String, child: String },

    /// Writer or terminal failure.
    #[error("host I/O error: {0}")]
    Io(#[from] io::Error),
}

// =============================================================================
// Crate Errors
// =============================================================================

/// Error returned by the work loop and the commit phase.
#[derive(Debug, Error)]
pub enum Error {
    /// The host adapter failed while creating or mutating a node.
    #[error("host adapter failed: {0}")]
    Host(#[from] HostError),

    /// Scheduler bookkeeping is inconsistent (for example a unit of work
    /// that is no longer in the fiber arena).
    #[error("scheduler invariant violated: {0}")]
    Invariant(String),
}

impl Error {
    pub(crate) fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// True if the failure came from the host rather than the scheduler.
    pub fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_error_converts() {
        let err: Error = HostError::UnsupportedElement("blink".to_string()).into();
        assert!(err.is_host());
        assert_eq!(
            err.to_string(),
            "host adapter failed: unsupported element type `blink`"
        );
    }

    #[test]
    fn test_invariant_is_not_host() {
        let err = Error::invariant("dangling unit of work");
        assert!(!err.is_host());
        assert_eq!(
            err.to_string(),
            "scheduler invariant violated: dangling unit of work"
        );
    }
}
