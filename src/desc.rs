//! Node descriptions - the declarative input to materialization.
//!
//! A [`Desc`] describes one tree node: an element (tag identity,
//! properties, ordered children), a plain leaf rendered as text, or a
//! container holding either - in which case the whole description can
//! change over time and the materialized node is wholesale-replaced on
//! every change.
//!
//! Descriptions are immutable data: the renderer only ever reads
//! through them (dereferencing the containers they hold), never
//! mutates them.
//!
//! # Example
//!
//! ```
//! use spark_dom::{state, Desc, ElementDesc};
//!
//! let title = state("hello".to_string());
//! let desc: Desc = ElementDesc::new("div")
//!     .prop("className", "greeting")
//!     .prop("title", "hover text")
//!     .child(ElementDesc::new("span").child("hi"))
//!     .into();
//! let _ = (title, desc);
//! ```

use std::rc::Rc;

use indexmap::IndexMap;

use crate::state::State;
use crate::value::{Scalar, Source};

/// Reserved property key carrying the element's tag identity.
pub const TAG_KEY: &str = "tagName";

/// Reserved property key carrying the ordered child list.
pub const CHILDREN_KEY: &str = "children";

// =============================================================================
// Desc
// =============================================================================

/// A declarative, possibly partly-observable description of one node.
#[derive(Debug, Clone)]
pub enum Desc {
    /// A structured description, materialized as an element.
    Element(Rc<ElementDesc>),
    /// A plain leaf, materialized as a text node.
    Leaf(Scalar),
    /// A container holding a whole description; each new value replaces
    /// the previously materialized node entirely.
    State(State<Desc>),
}

impl Desc {
    /// Dereference container wrappers down to the current plain
    /// description.
    pub fn resolved(&self) -> Desc {
        let mut current = self.clone();
        loop {
            match current {
                Desc::State(st) => current = st.get(),
                plain => return plain,
            }
        }
    }

    /// Whether the current description is structured (an element).
    pub fn is_element(&self) -> bool {
        matches!(self.resolved(), Desc::Element(_))
    }

    /// Text content of the current description, for the text path.
    pub fn text_content(&self) -> String {
        match self.resolved() {
            Desc::Leaf(scalar) => scalar.to_string(),
            Desc::Element(_) | Desc::State(_) => String::new(),
        }
    }
}

impl From<ElementDesc> for Desc {
    fn from(desc: ElementDesc) -> Self {
        Desc::Element(Rc::new(desc))
    }
}

impl From<State<Desc>> for Desc {
    fn from(state: State<Desc>) -> Self {
        Desc::State(state)
    }
}

impl From<Scalar> for Desc {
    fn from(scalar: Scalar) -> Self {
        Desc::Leaf(scalar)
    }
}

impl From<&str> for Desc {
    fn from(text: &str) -> Self {
        Desc::Leaf(text.into())
    }
}

impl From<String> for Desc {
    fn from(text: String) -> Self {
        Desc::Leaf(text.into())
    }
}

// =============================================================================
// ElementDesc
// =============================================================================

/// Description of one element: tag identity, ordered children, and an
/// ordered record of remaining properties.
#[derive(Debug, Clone)]
pub struct ElementDesc {
    /// Tag identity; observable identity re-creates the element in
    /// place on every change.
    pub tag: TagValue,
    /// Ordered child descriptions; an observable list is replaced as a
    /// whole, never diffed.
    pub children: Option<ChildrenValue>,
    /// Every remaining property, in application order.
    pub props: IndexMap<String, Source>,
}

impl ElementDesc {
    /// Start a description with the given tag.
    pub fn new(tag: impl Into<TagValue>) -> Self {
        Self {
            tag: tag.into(),
            children: None,
            props: IndexMap::new(),
        }
    }

    /// Add a property. Later additions reconcile later.
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Source>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Append one child description.
    pub fn child(mut self, child: impl Into<Desc>) -> Self {
        let child = child.into();
        match &mut self.children {
            Some(ChildrenValue::List(items)) => items.push(child),
            _ => self.children = Some(ChildrenValue::List(vec![child])),
        }
        self
    }

    /// Set the whole child list (replacing any accumulated children).
    pub fn children(mut self, children: impl Into<ChildrenValue>) -> Self {
        self.children = Some(children.into());
        self
    }
}

// =============================================================================
// TagValue / ChildrenValue
// =============================================================================

/// Tag identity: fixed, or a container of tag names.
#[derive(Debug, Clone)]
pub enum TagValue {
    Tag(String),
    State(State<String>),
}

impl TagValue {
    /// Current tag name.
    pub fn resolved(&self) -> String {
        match self {
            TagValue::Tag(tag) => tag.clone(),
            TagValue::State(st) => st.get(),
        }
    }
}

impl From<&str> for TagValue {
    fn from(tag: &str) -> Self {
        TagValue::Tag(tag.to_string())
    }
}

impl From<String> for TagValue {
    fn from(tag: String) -> Self {
        TagValue::Tag(tag)
    }
}

impl From<State<String>> for TagValue {
    fn from(state: State<String>) -> Self {
        TagValue::State(state)
    }
}

/// Ordered child list: fixed, or a container of whole lists.
#[derive(Debug, Clone)]
pub enum ChildrenValue {
    List(Vec<Desc>),
    State(State<Vec<Desc>>),
}

impl ChildrenValue {
    /// Current child list.
    pub fn resolved(&self) -> Vec<Desc> {
        match self {
            ChildrenValue::List(items) => items.clone(),
            ChildrenValue::State(st) => st.get(),
        }
    }
}

impl From<Vec<Desc>> for ChildrenValue {
    fn from(items: Vec<Desc>) -> Self {
        ChildrenValue::List(items)
    }
}

impl From<State<Vec<Desc>>> for ChildrenValue {
    fn from(state: State<Vec<Desc>>) -> Self {
        ChildrenValue::State(state)
    }
}

// =============================================================================
// Tests
// =============================================================================
