//! Host tree interface - the abstract seam to the concrete tree.
//!
//! The runtime never touches a real tree directly: creating, attaching,
//! removing and replacing nodes, and writing attributes or fields, all
//! go through [`Host`]. The renderer decides *what* to write and which
//! addressing style applies; the host decides what those operations
//! mean.
//!
//! Write operations are fallible: a host may reject an individual
//! property write, and the reconciler tolerates that per-operation.
//! Creation is infallible by contract - there is no recovery policy for
//! structural creation failures, so a host that cannot create a node
//! must handle that on its own terms.

use thiserror::Error;

use crate::state::ReactionError;
use crate::value::Scalar;

pub mod memory;

/// Error for individual host-tree operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The node kind does not support this operation.
    #[error("operation `{0}` is not supported by this node")]
    Unsupported(&'static str),

    /// The host rejected a property write.
    #[error("property `{name}` rejected: {reason}")]
    Rejected { name: String, reason: String },

    /// The node has no parent to operate against.
    #[error("node is detached from the tree")]
    Detached,
}

impl From<HostError> for ReactionError {
    fn from(error: HostError) -> Self {
        ReactionError::new(error.to_string())
    }
}

/// Abstract host tree.
///
/// `Node` handles are cheap clones referring to the same underlying
/// node, so reaction closures can keep live references across
/// replacements.
pub trait Host: 'static {
    type Node: Clone + 'static;

    /// Create an element with the given tag, in `namespace` if given.
    fn create_element(&self, tag: &str, namespace: Option<&str>) -> Self::Node;

    /// Create a text node.
    fn create_text(&self, content: &str) -> Self::Node;

    /// Append `children` to `parent`, in order.
    fn append(&self, parent: &Self::Node, children: &[Self::Node]);

    /// Detach a node from its parent. Detached nodes are a no-op.
    fn remove(&self, node: &Self::Node) -> Result<(), HostError>;

    /// Replace `old` with `new` in `old`'s parent.
    fn replace(&self, old: &Self::Node, new: &Self::Node) -> Result<(), HostError>;

    /// The nested object behind a structured property (for example a
    /// style table). `None` if the node has no such target.
    fn property_target(&self, node: &Self::Node, key: &str) -> Option<Self::Node>;

    /// Attribute-style write.
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &Scalar)
    -> Result<(), HostError>;

    /// Attribute-style removal.
    fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), HostError>;

    /// Field-style write.
    fn set_field(&self, node: &Self::Node, name: &str, value: &Scalar) -> Result<(), HostError>;

    /// Field-style removal.
    fn clear_field(&self, node: &Self::Node, name: &str) -> Result<(), HostError>;
}
