//! # spark-dom
//!
//! Minimal reactive rendering runtime for Rust.
//!
//! Given a declarative description of a tree - nodes with tag identity,
//! properties, and children, any of which may be a live [`State`]
//! container instead of a constant - spark-dom materializes a live tree
//! on an abstract [`Host`] and keeps shape and properties synchronized
//! as the containers change, without rebuilding anything that did not
//! change.
//!
//! ## Architecture
//!
//! The pipeline is two small cores and their data types:
//!
//! ```text
//! State<T> ──▶ flatten / derive / merge_fields        (value layer)
//! Desc ──▶ Renderer ──▶ property reconciler ──▶ Host  (tree layer)
//! ```
//!
//! Reactivity is two-tier by design: coarse containers (whole
//! description, tag identity, whole child list, text content) always
//! replace their subtree; individual property leaves patch in place.
//!
//! ## Modules
//!
//! - [`state`] - `State<T>`, the observable value container
//! - [`value`] - plain and possibly-reactive structure types
//! - [`flatten`] - recursive resolution of nested containers
//! - [`desc`] - declarative node descriptions
//! - [`render`] - materialization and reconciliation
//! - [`host`] - the abstract host-tree interface and `MemoryHost`
//! - [`ns`] - namespace tag tables
//!
//! ## Example
//!
//! ```
//! use spark_dom::{state, Desc, ElementDesc, MemoryHost, Renderer};
//!
//! let count = state(Desc::from("0"));
//! let renderer = Renderer::new(MemoryHost::new());
//!
//! let app: Desc = ElementDesc::new("div")
//!     .prop("className", "counter")
//!     .child(Desc::State(count.clone()))
//!     .into();
//! let node = renderer.render(&app);
//!
//! count.set(Desc::from("1"));
//! assert_eq!(node.markup(), "<div className=counter>1</div>");
//! ```

pub mod desc;
pub mod flatten;
pub mod host;
pub mod ns;
pub mod render;
pub mod state;
pub mod value;

// Re-export commonly used items
pub use desc::{ChildrenValue, Desc, ElementDesc, TagValue, CHILDREN_KEY, TAG_KEY};
pub use flatten::flatten;
pub use host::memory::{MemoryHost, MemoryNode};
pub use host::{Host, HostError};
pub use ns::{NamespaceResolver, TagTables, MATHML_NAMESPACE, SVG_NAMESPACE};
pub use render::Renderer;
pub use state::{state, ReactionError, State, SubscriptionId};
pub use value::{Scalar, Source, Value};
