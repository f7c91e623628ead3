//! Renderer - Tree materialization.
//!
//! [`Renderer`] turns a [`Desc`] into live host nodes and keeps them
//! synchronized as the containers inside the description change. The
//! reactivity model is two-tier, by design:
//!
//! - **Coarse observables always replace.** A whole-description
//!   container, a tag-identity container, a whole-children container,
//!   and every text container each rebuild their subtree and swap it
//!   into place, discarding the old nodes.
//! - **Leaf observables patch in place.** Individual property values
//!   re-assign on the live node without touching anything else.
//!
//! Exactly one coarse behavior applies per description: a description
//! that is itself a container swaps wholesale; otherwise an observable
//! tag identity re-creates the element in place. Reactions hold their
//! own handle to the current live node, so the node a caller got back
//! from [`Renderer::render`] may be stale after a swap - the host tree
//! itself is always current.
//!
//! # Example
//!
//! ```
//! use spark_dom::{state, Desc, ElementDesc, MemoryHost, Renderer};
//!
//! let renderer = Renderer::new(MemoryHost::new());
//! let label = state(Desc::from("loading"));
//!
//! let desc: Desc = ElementDesc::new("div")
//!     .child(Desc::State(label.clone()))
//!     .into();
//! let node = renderer.render(&desc);
//!
//! label.set(Desc::from("ready"));
//! assert_eq!(node.child(0).unwrap().text_content().unwrap(), "ready");
//! ```

mod props;

use std::cell::RefCell;
use std::rc::Rc;

use crate::desc::{Desc, ElementDesc, TagValue};
use crate::host::Host;
use crate::ns::{NamespaceResolver, TagTables};
use crate::state::State;

use props::{apply_element, Addressing, Target};

/// Materializes descriptions into live nodes on a [`Host`].
///
/// Cheap to clone; clones share the host and resolver.
pub struct Renderer<H: Host> {
    host: Rc<H>,
    namespaces: Rc<dyn NamespaceResolver>,
}

impl<H: Host> Clone for Renderer<H> {
    fn clone(&self) -> Self {
        Self {
            host: self.host.clone(),
            namespaces: self.namespaces.clone(),
        }
    }
}

impl<H: Host> Renderer<H> {
    /// Renderer over `host` with the default namespace tables.
    pub fn new(host: H) -> Self {
        Self::with_resolver(host, TagTables)
    }

    /// Renderer with a custom namespace resolver.
    pub fn with_resolver(host: H, resolver: impl NamespaceResolver + 'static) -> Self {
        Self {
            host: Rc::new(host),
            namespaces: Rc::new(resolver),
        }
    }

    /// The underlying host.
    pub fn host(&self) -> &H {
        &self.host
    }

    /// Materialize a description: structured descriptions become
    /// elements, plain leaves become text nodes.
    pub fn render(&self, desc: &Desc) -> H::Node {
        if desc.is_element() {
            self.render_element(desc)
        } else {
            self.render_text(desc)
        }
    }

    /// Materialize and append under `parent`.
    pub fn mount(&self, parent: &H::Node, desc: &Desc) -> H::Node {
        let node = self.render(desc);
        self.host.append(parent, std::slice::from_ref(&node));
        node
    }

    // -------------------------------------------------------------------------
    // Elements
    // -------------------------------------------------------------------------

    fn render_element(&self, desc: &Desc) -> H::Node {
        let Desc::Element(record) = desc.resolved() else {
            return self.render_text(desc);
        };
        let target = self.create_target(&record.tag.resolved());
        apply_element(self, &target, &record);

        match desc {
            Desc::State(st) => self.track_whole_swap(st, target.node.clone()),
            Desc::Element(element) => {
                if let TagValue::State(tag) = &element.tag {
                    self.track_tag_swap(tag, element.clone(), target.node.clone());
                }
            }
            Desc::Leaf(_) => {}
        }
        target.node
    }

    /// Create the element for `tag`, deciding namespace and addressing
    /// style once, at construction.
    fn create_target(&self, tag: &str) -> Target<H::Node> {
        let namespace = self.namespaces.resolve(tag);
        let addressing = if namespace.is_some() {
            Addressing::Attribute
        } else {
            Addressing::Field
        };
        Target {
            node: self.host.create_element(tag, namespace),
            addressing,
        }
    }

    /// Whole-description reactivity: every new value re-materializes
    /// from scratch and replaces the previous live node. Applies to
    /// element and text descriptions alike.
    fn track_whole_swap(&self, st: &State<Desc>, initial: H::Node) {
        let renderer = self.clone();
        let current = Rc::new(RefCell::new(initial));
        st.try_sub(move |new, _prev| {
            let update = renderer.render(new);
            let old = current.borrow().clone();
            renderer.host.replace(&old, &update)?;
            *current.borrow_mut() = update;
            Ok(())
        });
    }

    /// Tag-identity reactivity: every new tag re-creates the element,
    /// re-applies the same property record (read fresh at swap time,
    /// children re-materialized), and replaces the previous node.
    fn track_tag_swap(&self, tag: &State<String>, element: Rc<ElementDesc>, initial: H::Node) {
        let renderer = self.clone();
        let current = Rc::new(RefCell::new(initial));
        tag.try_sub(move |new_tag, _prev| {
            let target = renderer.create_target(new_tag);
            apply_element(&renderer, &target, &element);
            let old = current.borrow().clone();
            renderer.host.replace(&old, &target.node)?;
            *current.borrow_mut() = target.node.clone();
            Ok(())
        });
    }

    // -------------------------------------------------------------------------
    // Text
    // -------------------------------------------------------------------------

    fn render_text(&self, desc: &Desc) -> H::Node {
        let node = self.host.create_text(&desc.text_content());
        if let Desc::State(st) = desc {
            // Text is never patched in place: each change replaces the node.
            self.track_whole_swap(st, node.clone());
        }
        node
    }

    /// Materialize an ordered child list.
    pub(crate) fn render_children(&self, children: &[Desc]) -> Vec<H::Node> {
        children.iter().map(|child| self.render(child)).collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
