//! Property reconciliation - applying and removing properties on live
//! nodes.
//!
//! Every non-reserved key of an element description is reconciled here:
//! scalar values assign directly (and re-assign on change), structured
//! values recurse into the node's nested property target, and the
//! children key materializes the child list. Structured reactive values
//! follow the unset-then-apply rule: on each new value, every property
//! named by the *previous* value is removed (recursively) before the
//! new record is applied, so no stale nested property survives a
//! structural replacement.
//!
//! Individual writes are fallible and tolerated: a failed assignment,
//! unassignment, or child removal is reported and reconciliation of
//! everything else continues. There is no recovery policy beyond that -
//! structural failures inside a reaction drop the reaction itself.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::warn;

use crate::desc::{ChildrenValue, ElementDesc, CHILDREN_KEY, TAG_KEY};
use crate::host::Host;
use crate::render::Renderer;
use crate::value::Source;

// =============================================================================
// Addressing
// =============================================================================

/// How properties reach a live node. Chosen once, at node creation,
/// from the namespace decision; never mutated afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Addressing {
    /// Direct field assignment (plain elements, nested objects).
    Field,
    /// Attribute set/remove (namespaced elements).
    Attribute,
}

/// A live node paired with its addressing style.
#[derive(Clone)]
pub(crate) struct Target<N: Clone> {
    pub node: N,
    pub addressing: Addressing,
}

/// The identity-casing key rides as `class` on the wire.
fn wire_name(key: &str) -> &str {
    if key == "className" { "class" } else { key }
}

// =============================================================================
// Apply
// =============================================================================

/// Apply an element description's full surface: properties in record
/// order, then the child list.
pub(crate) fn apply_element<H: Host>(
    renderer: &Renderer<H>,
    target: &Target<H::Node>,
    desc: &ElementDesc,
) {
    apply_props(renderer, target, &desc.props);
    apply_children(renderer, target, desc.children.as_ref());
}

pub(crate) fn apply_props<H: Host>(
    renderer: &Renderer<H>,
    target: &Target<H::Node>,
    props: &IndexMap<String, Source>,
) {
    for (key, value) in props {
        apply_prop(renderer, target, key, value);
    }
}

fn apply_prop<H: Host>(renderer: &Renderer<H>, target: &Target<H::Node>, key: &str, value: &Source) {
    if key == TAG_KEY || key == CHILDREN_KEY {
        return;
    }
    if value.is_structured() {
        apply_object_prop(renderer, target, key, value);
    } else {
        apply_scalar_prop(renderer, target, key, value);
    }
}

/// Structured property: reconcile the nested record against the node's
/// nested target, and on each new value unset the previous record
/// before applying the new one.
fn apply_object_prop<H: Host>(
    renderer: &Renderer<H>,
    target: &Target<H::Node>,
    key: &str,
    value: &Source,
) {
    let Some(node) = renderer.host().property_target(&target.node, key) else {
        warn!(key = %key, "missing nested property target");
        return;
    };
    // Nested targets are plain objects: always field-addressed.
    let nested = Target {
        node,
        addressing: Addressing::Field,
    };

    apply_entries(renderer, &nested, &value.structured_entries());
    if let Source::State(st) = value {
        let renderer = renderer.clone();
        let nested = nested.clone();
        st.sub(move |new, prev| {
            unset_entries(&renderer, &nested, &prev.structured_entries());
            apply_entries(&renderer, &nested, &new.structured_entries());
        });
    }
}

fn apply_entries<H: Host>(
    renderer: &Renderer<H>,
    target: &Target<H::Node>,
    entries: &[(String, Source)],
) {
    for (key, value) in entries {
        apply_prop(renderer, target, key, value);
    }
}

/// Scalar property: assign now, re-assign on every change.
fn apply_scalar_prop<H: Host>(
    renderer: &Renderer<H>,
    target: &Target<H::Node>,
    key: &str,
    value: &Source,
) {
    set_scalar(renderer, target, key, value);
    if let Source::State(st) = value {
        let renderer = renderer.clone();
        let target = target.clone();
        let key = key.to_string();
        st.sub(move |new, _prev| set_scalar(&renderer, &target, &key, new));
    }
}

fn set_scalar<H: Host>(renderer: &Renderer<H>, target: &Target<H::Node>, key: &str, value: &Source) {
    let Some(scalar) = value.resolve_scalar() else {
        warn!(key = %key, "skipping non-scalar value in scalar assignment");
        return;
    };
    let result = match target.addressing {
        Addressing::Attribute => {
            renderer
                .host()
                .set_attribute(&target.node, wire_name(key), &scalar)
        }
        Addressing::Field => renderer.host().set_field(&target.node, key, &scalar),
    };
    if let Err(error) = result {
        warn!(key = %key, error = %error, "failed property assignment");
    }
}

// =============================================================================
// Unset
// =============================================================================

fn unset_entries<H: Host>(
    renderer: &Renderer<H>,
    target: &Target<H::Node>,
    entries: &[(String, Source)],
) {
    for (key, value) in entries {
        unset_prop(renderer, target, key, value);
    }
}

/// Remove one property: recurse into structured values, clear scalars.
fn unset_prop<H: Host>(renderer: &Renderer<H>, target: &Target<H::Node>, key: &str, value: &Source) {
    if key == TAG_KEY || key == CHILDREN_KEY {
        return;
    }
    if value.is_structured() {
        let Some(node) = renderer.host().property_target(&target.node, key) else {
            return;
        };
        let nested = Target {
            node,
            addressing: Addressing::Field,
        };
        unset_entries(renderer, &nested, &value.structured_entries());
    } else {
        unset_scalar(renderer, target, key);
    }
}

fn unset_scalar<H: Host>(renderer: &Renderer<H>, target: &Target<H::Node>, key: &str) {
    let result = match target.addressing {
        Addressing::Attribute => renderer
            .host()
            .remove_attribute(&target.node, wire_name(key)),
        Addressing::Field => renderer.host().clear_field(&target.node, key),
    };
    if let Err(error) = result {
        warn!(key = %key, error = %error, "failed property unassignment");
    }
}

// =============================================================================
// Children
// =============================================================================

/// Materialize and append the child list; a reactive list removes every
/// previous child (best-effort, per-child) and appends the new list.
pub(crate) fn apply_children<H: Host>(
    renderer: &Renderer<H>,
    target: &Target<H::Node>,
    children: Option<&ChildrenValue>,
) {
    let Some(children) = children else {
        return;
    };
    let nodes = renderer.render_children(&children.resolved());
    renderer.host().append(&target.node, &nodes);

    if let ChildrenValue::State(st) = children {
        let renderer = renderer.clone();
        let parent = target.node.clone();
        let nodes = Rc::new(RefCell::new(nodes));
        st.sub(move |new, _prev| {
            for node in nodes.borrow().iter() {
                if let Err(error) = renderer.host().remove(node) {
                    warn!(error = %error, "failed to remove replaced child");
                }
            }
            let fresh = renderer.render_children(new);
            renderer.host().append(&parent, &fresh);
            *nodes.borrow_mut() = fresh;
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
