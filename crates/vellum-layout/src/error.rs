//! Layout errors.

use thiserror::Error;

/// Errors reported by a [`crate::LayoutConstraint`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Another constraint already claimed management of the node.
    #[error("node '{node}' is already managed by another layout constraint")]
    AlreadyManaged {
        /// Name of the node.
        node: String,
    },
    /// The node is already tracked by this constraint.
    #[error("node '{node}' is already tracked by this layout constraint")]
    AlreadyListened {
        /// Name of the node.
        node: String,
    },
    /// The node is not tracked by this constraint.
    #[error("node '{node}' is not tracked by this layout constraint")]
    NotListened {
        /// Name of the node.
        node: String,
    },
    /// Layout kept being re-triggered from within itself.
    #[error("layout did not settle after {attempts} passes")]
    RunawayLayout {
        /// Passes run before giving up.
        attempts: usize,
    },
}
