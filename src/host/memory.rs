//! MemoryHost - an in-memory host tree.
//!
//! A plain tree of reference-counted nodes with parent links, ordered
//! children, attribute and field tables, and auto-created nested
//! property targets. It backs every renderer test in this crate and
//! doubles as a reference implementation for writing a real host.
//!
//! Test hooks: [`MemoryHost::fail_field`] marks a property name as
//! rejected so failure-tolerance paths can be exercised, and
//! [`MemoryNode::markup`] dumps a subtree as a compact string for
//! assertions.

use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::host::{Host, HostError};
use crate::value::Scalar;

// =============================================================================
// Nodes
// =============================================================================

/// Handle to one node in the in-memory tree. Clones share the node.
#[derive(Clone)]
pub struct MemoryNode {
    inner: Rc<RefCell<NodeData>>,
}

struct NodeData {
    parent: Weak<RefCell<NodeData>>,
    kind: NodeKind,
}

enum NodeKind {
    Element {
        tag: String,
        namespace: Option<String>,
        attributes: IndexMap<String, String>,
        fields: IndexMap<String, Scalar>,
        targets: IndexMap<String, MemoryNode>,
        children: Vec<MemoryNode>,
    },
    /// Nested property target (a plain object, not part of the child tree).
    Object {
        fields: IndexMap<String, Scalar>,
        targets: IndexMap<String, MemoryNode>,
    },
    Text(String),
}

impl MemoryNode {
    fn element(tag: &str, namespace: Option<&str>) -> Self {
        Self::from_kind(NodeKind::Element {
            tag: tag.to_string(),
            namespace: namespace.map(str::to_string),
            attributes: IndexMap::new(),
            fields: IndexMap::new(),
            targets: IndexMap::new(),
            children: Vec::new(),
        })
    }

    fn object() -> Self {
        Self::from_kind(NodeKind::Object {
            fields: IndexMap::new(),
            targets: IndexMap::new(),
        })
    }

    fn text(content: &str) -> Self {
        Self::from_kind(NodeKind::Text(content.to_string()))
    }

    fn from_kind(kind: NodeKind) -> Self {
        Self {
            inner: Rc::new(RefCell::new(NodeData {
                parent: Weak::new(),
                kind,
            })),
        }
    }

    /// Whether two handles refer to the same node.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn is_text(&self) -> bool {
        matches!(self.inner.borrow().kind, NodeKind::Text(_))
    }

    /// Text content, for text nodes.
    pub fn text_content(&self) -> Option<String> {
        match &self.inner.borrow().kind {
            NodeKind::Text(content) => Some(content.clone()),
            _ => None,
        }
    }

    /// Element tag.
    pub fn tag(&self) -> Option<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element { tag, .. } => Some(tag.clone()),
            _ => None,
        }
    }

    /// Element namespace.
    pub fn namespace(&self) -> Option<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element { namespace, .. } => namespace.clone(),
            _ => None,
        }
    }

    /// Attribute value, for elements.
    pub fn attribute(&self, name: &str) -> Option<String> {
        match &self.inner.borrow().kind {
            NodeKind::Element { attributes, .. } => attributes.get(name).cloned(),
            _ => None,
        }
    }

    /// Field value, for elements and nested objects.
    pub fn field(&self, name: &str) -> Option<Scalar> {
        match &self.inner.borrow().kind {
            NodeKind::Element { fields, .. } | NodeKind::Object { fields, .. } => {
                fields.get(name).cloned()
            }
            _ => None,
        }
    }

    /// Existing nested property target, without creating one.
    pub fn target(&self, name: &str) -> Option<MemoryNode> {
        match &self.inner.borrow().kind {
            NodeKind::Element { targets, .. } | NodeKind::Object { targets, .. } => {
                targets.get(name).cloned()
            }
            _ => None,
        }
    }

    /// Child nodes, in order.
    pub fn children(&self) -> Vec<MemoryNode> {
        match &self.inner.borrow().kind {
            NodeKind::Element { children, .. } => children.clone(),
            _ => Vec::new(),
        }
    }

    /// Child at `index`.
    pub fn child(&self, index: usize) -> Option<MemoryNode> {
        self.children().get(index).cloned()
    }

    /// Parent node, if attached.
    pub fn parent(&self) -> Option<MemoryNode> {
        self.inner
            .borrow()
            .parent
            .upgrade()
            .map(|inner| MemoryNode { inner })
    }

    /// Compact markup dump of the subtree, for assertions.
    ///
    /// Elements render as `<tag a="x" f=y>...</tag>` (attributes quoted,
    /// fields bare), text renders raw, nested objects render as `{..}`.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        self.write_markup(&mut out);
        out
    }

    fn write_markup(&self, out: &mut String) {
        match &self.inner.borrow().kind {
            NodeKind::Text(content) => out.push_str(content),
            NodeKind::Object { fields, .. } => {
                out.push('{');
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = write!(out, "{name}={value}");
                }
                out.push('}');
            }
            NodeKind::Element {
                tag,
                attributes,
                fields,
                children,
                ..
            } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attributes {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                for (name, value) in fields {
                    let _ = write!(out, " {name}={value}");
                }
                if children.is_empty() {
                    out.push_str("/>");
                    return;
                }
                out.push('>');
                for child in children {
                    child.write_markup(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Structure
    // -------------------------------------------------------------------------

    fn detach(&self) {
        let parent = self.inner.borrow().parent.upgrade();
        if let Some(parent) = parent {
            if let NodeKind::Element { children, .. } = &mut parent.borrow_mut().kind {
                children.retain(|child| !Rc::ptr_eq(&child.inner, &self.inner));
            }
        }
        self.inner.borrow_mut().parent = Weak::new();
    }

    fn attach_to(&self, parent: &MemoryNode) {
        self.inner.borrow_mut().parent = Rc::downgrade(&parent.inner);
    }
}

// =============================================================================
// Host
// =============================================================================

/// In-memory [`Host`] implementation.
#[derive(Default)]
pub struct MemoryHost {
    rejected: RefCell<HashSet<String>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a property name as rejected: every attribute or field write
    /// against it fails with [`HostError::Rejected`].
    pub fn fail_field(&self, name: &str) {
        self.rejected.borrow_mut().insert(name.to_string());
    }

    fn check_rejected(&self, name: &str) -> Result<(), HostError> {
        if self.rejected.borrow().contains(name) {
            return Err(HostError::Rejected {
                name: name.to_string(),
                reason: "rejected by host configuration".to_string(),
            });
        }
        Ok(())
    }
}

impl Host for MemoryHost {
    type Node = MemoryNode;

    fn create_element(&self, tag: &str, namespace: Option<&str>) -> MemoryNode {
        MemoryNode::element(tag, namespace)
    }

    fn create_text(&self, content: &str) -> MemoryNode {
        MemoryNode::text(content)
    }

    fn append(&self, parent: &MemoryNode, children: &[MemoryNode]) {
        for child in children {
            child.detach();
            let attached = match &mut parent.inner.borrow_mut().kind {
                NodeKind::Element {
                    children: slots, ..
                } => {
                    slots.push(child.clone());
                    true
                }
                _ => false,
            };
            if attached {
                child.attach_to(parent);
            }
        }
    }

    fn remove(&self, node: &MemoryNode) -> Result<(), HostError> {
        node.detach();
        Ok(())
    }

    fn replace(&self, old: &MemoryNode, new: &MemoryNode) -> Result<(), HostError> {
        let parent = old.parent().ok_or(HostError::Detached)?;
        new.detach();
        {
            let mut data = parent.inner.borrow_mut();
            if let NodeKind::Element { children, .. } = &mut data.kind {
                let index = children
                    .iter()
                    .position(|child| child.same(old))
                    .ok_or(HostError::Detached)?;
                children[index] = new.clone();
            }
        }
        new.attach_to(&parent);
        old.inner.borrow_mut().parent = Weak::new();
        Ok(())
    }

    fn property_target(&self, node: &MemoryNode, key: &str) -> Option<MemoryNode> {
        match &mut node.inner.borrow_mut().kind {
            NodeKind::Element { targets, .. } | NodeKind::Object { targets, .. } => Some(
                targets
                    .entry(key.to_string())
                    .or_insert_with(MemoryNode::object)
                    .clone(),
            ),
            NodeKind::Text(_) => None,
        }
    }

    fn set_attribute(
        &self,
        node: &MemoryNode,
        name: &str,
        value: &Scalar,
    ) -> Result<(), HostError> {
        self.check_rejected(name)?;
        match &mut node.inner.borrow_mut().kind {
            NodeKind::Element { attributes, .. } => {
                attributes.insert(name.to_string(), value.to_string());
                Ok(())
            }
            _ => Err(HostError::Unsupported("set_attribute")),
        }
    }

    fn remove_attribute(&self, node: &MemoryNode, name: &str) -> Result<(), HostError> {
        match &mut node.inner.borrow_mut().kind {
            NodeKind::Element { attributes, .. } => {
                attributes.shift_remove(name);
                Ok(())
            }
            _ => Err(HostError::Unsupported("remove_attribute")),
        }
    }

    fn set_field(&self, node: &MemoryNode, name: &str, value: &Scalar) -> Result<(), HostError> {
        self.check_rejected(name)?;
        match &mut node.inner.borrow_mut().kind {
            NodeKind::Element { fields, .. } | NodeKind::Object { fields, .. } => {
                fields.insert(name.to_string(), value.clone());
                Ok(())
            }
            NodeKind::Text(_) => Err(HostError::Unsupported("set_field")),
        }
    }

    fn clear_field(&self, node: &MemoryNode, name: &str) -> Result<(), HostError> {
        match &mut node.inner.borrow_mut().kind {
            NodeKind::Element { fields, .. } | NodeKind::Object { fields, .. } => {
                fields.shift_remove(name);
                Ok(())
            }
            NodeKind::Text(_) => Err(HostError::Unsupported("clear_field")),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_sets_parent_and_order() {
        let host = MemoryHost::new();
        let parent = host.create_element("div", None);
        let a = host.create_text("a");
        let b = host.create_text("b");

        host.append(&parent, &[a.clone(), b.clone()]);
        assert_eq!(parent.children().len(), 2);
        assert!(parent.child(0).unwrap().same(&a));
        assert!(a.parent().unwrap().same(&parent));
    }

    #[test]
    fn test_append_moves_between_parents() {
        let host = MemoryHost::new();
        let first = host.create_element("div", None);
        let second = host.create_element("div", None);
        let child = host.create_text("x");

        host.append(&first, &[child.clone()]);
        host.append(&second, &[child.clone()]);

        assert!(first.children().is_empty());
        assert_eq!(second.children().len(), 1);
        assert!(child.parent().unwrap().same(&second));
    }

    #[test]
    fn test_remove_is_noop_when_detached() {
        let host = MemoryHost::new();
        let node = host.create_text("x");
        assert_eq!(host.remove(&node), Ok(()));
    }

    #[test]
    fn test_replace_swaps_in_place() {
        let host = MemoryHost::new();
        let parent = host.create_element("div", None);
        let old = host.create_text("old");
        let tail = host.create_text("tail");
        host.append(&parent, &[old.clone(), tail.clone()]);

        let new = host.create_element("span", None);
        host.replace(&old, &new).unwrap();

        assert_eq!(parent.children().len(), 2);
        assert!(parent.child(0).unwrap().same(&new));
        assert!(parent.child(1).unwrap().same(&tail));
        assert!(old.parent().is_none());
    }

    #[test]
    fn test_replace_detached_fails() {
        let host = MemoryHost::new();
        let old = host.create_text("old");
        let new = host.create_text("new");
        assert_eq!(host.replace(&old, &new), Err(HostError::Detached));
    }

    #[test]
    fn test_property_target_auto_creates_and_persists() {
        let host = MemoryHost::new();
        let node = host.create_element("div", None);
        assert!(node.target("style").is_none());

        let style = host.property_target(&node, "style").unwrap();
        host.set_field(&style, "color", &Scalar::Str("red".into()))
            .unwrap();

        let again = host.property_target(&node, "style").unwrap();
        assert!(again.same(&style));
        assert_eq!(node.target("style").unwrap().field("color"), Some(Scalar::Str("red".into())));
    }

    #[test]
    fn test_fail_field_rejects_writes() {
        let host = MemoryHost::new();
        host.fail_field("volatile");
        let node = host.create_element("div", None);

        let result = host.set_field(&node, "volatile", &Scalar::Int(1));
        assert!(matches!(result, Err(HostError::Rejected { .. })));
        assert!(node.field("volatile").is_none());

        host.set_field(&node, "stable", &Scalar::Int(2)).unwrap();
        assert_eq!(node.field("stable"), Some(Scalar::Int(2)));
    }

    #[test]
    fn test_markup_dump() {
        let host = MemoryHost::new();
        let div = host.create_element("div", None);
        host.set_field(&div, "id", &Scalar::Str("box".into())).unwrap();
        let span = host.create_element("span", None);
        host.append(&span, &[host.create_text("hi")]);
        host.append(&div, &[span]);

        assert_eq!(div.markup(), "<div id=box><span>hi</span></div>");
    }
}
