//! State - The observable value container.
//!
//! `State<T>` is the single reactive primitive everything else builds on:
//! a boxed, time-varying value with synchronous subscription dispatch.
//! Handles are cheap `Rc` clones; all mutation happens on one logical
//! thread of control, so there is no locking anywhere.
//!
//! # Dispatch model
//!
//! Assigning a value invokes every live reaction in registration order
//! with `(new, previous)` and only then commits the new value, so a
//! reaction that reads the container mid-dispatch still observes the
//! previous value. A reaction that returns `Err` is dropped permanently
//! and dispatch continues with the rest; the triggering assignment never
//! fails because of a failing reaction.
//!
//! A `set` on a container that is already mid-dispatch is queued and
//! applied after the in-flight transition commits. Writes to *other*
//! containers run immediately and recursively. Divergent cyclic update
//! graphs therefore spin instead of overflowing the stack; termination
//! is the caller's responsibility.
//!
//! # Example
//!
//! ```
//! use spark_dom::state;
//!
//! let count = state(0);
//! let label = count.derive(|n| format!("count: {n}"));
//!
//! count.set(3);
//! assert_eq!(label.get(), "count: 3");
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use thiserror::Error;
use tracing::warn;

// =============================================================================
// Errors
// =============================================================================

/// Error returned by a fallible reaction to signal it must be dropped.
///
/// Returning `Err` from a reaction is the one-way door out of a
/// subscription: the container removes the reaction and never invokes
/// it again. Panics are not caught and propagate to the caller.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ReactionError {
    message: String,
}

impl ReactionError {
    /// Create a reaction error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Subscription bookkeeping
// =============================================================================

/// Token identifying one subscription on one container.
///
/// Returned by [`State::sub`] / [`State::try_sub`] and accepted by
/// [`State::unsub`]. Tokens are only meaningful on the container that
/// issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Reaction<T> = Box<dyn FnMut(&T, &T) -> Result<(), ReactionError>>;

struct Entry<T> {
    id: SubscriptionId,
    reaction: Rc<RefCell<Reaction<T>>>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            reaction: self.reaction.clone(),
        }
    }
}

// =============================================================================
// State
// =============================================================================

struct StateInner<T> {
    value: RefCell<T>,
    subscribers: RefCell<Vec<Entry<T>>>,
    next_id: Cell<u64>,
    dispatching: Cell<bool>,
    queued: RefCell<VecDeque<T>>,
}

/// A boxed, time-varying value with synchronous subscription dispatch.
///
/// Clones share the same container. See the module docs for the
/// dispatch and re-entrancy rules.
pub struct State<T: Clone + 'static> {
    inner: Rc<StateInner<T>>,
}

impl<T: Clone + 'static> Clone for State<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Create a new state container (house-style free constructor).
pub fn state<T: Clone + 'static>(value: T) -> State<T> {
    State::new(value)
}

impl<T: Clone + 'static> State<T> {
    /// Create a new container holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(StateInner {
                value: RefCell::new(value),
                subscribers: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                dispatching: Cell::new(false),
                queued: RefCell::new(VecDeque::new()),
            }),
        }
    }

    /// Current value, cloned. No side effects.
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Read the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Assign a new value: dispatch `(new, previous)` to every live
    /// reaction in registration order, then commit.
    ///
    /// If this container is already mid-dispatch, the assignment is
    /// queued and applied after the in-flight transition commits.
    pub fn set(&self, value: T) {
        if self.inner.dispatching.get() {
            self.inner.queued.borrow_mut().push_back(value);
            return;
        }

        self.inner.dispatching.set(true);
        let mut next = Some(value);
        while let Some(value) = next {
            self.dispatch(&value);
            *self.inner.value.borrow_mut() = value;
            next = self.inner.queued.borrow_mut().pop_front();
        }
        self.inner.dispatching.set(false);
    }

    /// Assign `f(current)`.
    pub fn update(&self, f: impl FnOnce(T) -> T) {
        let next = f(self.get());
        self.set(next);
    }

    /// Subscribe an infallible reaction. Fires on every subsequent
    /// transition with `(new, previous)`, in registration order.
    pub fn sub(&self, mut f: impl FnMut(&T, &T) + 'static) -> SubscriptionId {
        self.try_sub(move |new, prev| {
            f(new, prev);
            Ok(())
        })
    }

    /// Subscribe a fallible reaction. The first `Err` it returns drops
    /// it permanently; remaining reactions still run for that same
    /// transition and the triggering assignment completes normally.
    pub fn try_sub(
        &self,
        f: impl FnMut(&T, &T) -> Result<(), ReactionError> + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner.subscribers.borrow_mut().push(Entry {
            id,
            reaction: Rc::new(RefCell::new(Box::new(f))),
        });
        id
    }

    /// Explicitly remove a subscription. Returns whether it was present.
    pub fn unsub(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.inner.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|entry| entry.id != id);
        subscribers.len() != before
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Derive a child container that always holds `f(parent)`.
    ///
    /// The child is initialized from the parent's current value and
    /// re-assigned on every parent transition. It is a plain container
    /// in every other respect; there is no reverse link for cleanup.
    pub fn derive<U: Clone + 'static>(&self, f: impl Fn(&T) -> U + 'static) -> State<U> {
        let child = State::new(self.with(|value| f(value)));
        let handle = child.clone();
        self.sub(move |new, _prev| handle.set(f(new)));
        child
    }

    /// Merge named containers into one container holding a record with
    /// one entry per field.
    ///
    /// The record is initialized from each source's current value; every
    /// source transition merges just that one field (preserving the
    /// others) and produces its own dispatch of the merged container.
    pub fn merge_fields(sources: IndexMap<String, State<T>>) -> State<IndexMap<String, T>> {
        let mut initial = IndexMap::new();
        for (name, source) in &sources {
            initial.insert(name.clone(), source.get());
        }
        let merged = State::new(initial);

        for (name, source) in &sources {
            let merged = merged.clone();
            let name = name.clone();
            source.sub(move |new, _prev| {
                let field = name.clone();
                let value = new.clone();
                merged.update(move |mut record| {
                    record.insert(field, value);
                    record
                });
            });
        }
        merged
    }

    /// Whether two handles point at the same container.
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // -------------------------------------------------------------------------
    // Dispatch
    // -------------------------------------------------------------------------

    fn dispatch(&self, new: &T) {
        // Snapshot so reactions may subscribe/unsubscribe mid-dispatch.
        // Reactions added during this pass fire from the next one.
        let snapshot: Vec<Entry<T>> = self.inner.subscribers.borrow().clone();
        let previous = self.inner.value.borrow().clone();

        let mut failed: Vec<SubscriptionId> = Vec::new();
        for entry in &snapshot {
            let mut reaction = entry.reaction.borrow_mut();
            let result = (*reaction)(new, &previous);
            if let Err(error) = result {
                warn!(error = %error, "dropping reaction that failed during dispatch");
                failed.push(entry.id);
            }
        }

        if !failed.is_empty() {
            self.inner
                .subscribers
                .borrow_mut()
                .retain(|entry| !failed.contains(&entry.id));
        }
    }
}

impl<T: Clone + Serialize + 'static> State<T> {
    /// Serialize the current value as JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        self.with(serde_json::to_string)
    }
}

impl<T: Clone + Serialize + 'static> Serialize for State<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.with(|value| value.serialize(serializer))
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("value", &*self.inner.value.borrow())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<T: Clone + Default + 'static> Default for State<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_set_update() {
        let value = state(1);
        assert_eq!(value.get(), 1);

        value.set(2);
        assert_eq!(value.get(), 2);

        value.update(|n| n * 10);
        assert_eq!(value.get(), 20);
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let value = state(0);
        let seen: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let seen_a = seen.clone();
        value.sub(move |_, _| seen_a.borrow_mut().push("a"));
        let seen_b = seen.clone();
        value.sub(move |_, _| seen_b.borrow_mut().push("b"));
        let seen_c = seen.clone();
        value.sub(move |_, _| seen_c.borrow_mut().push("c"));

        value.set(1);
        assert_eq!(*seen.borrow(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_dispatch_passes_new_and_previous() {
        let value = state(1);
        let observed: Rc<RefCell<Vec<(i32, i32)>>> = Rc::new(RefCell::new(Vec::new()));

        let observed_sub = observed.clone();
        value.sub(move |new, prev| observed_sub.borrow_mut().push((*new, *prev)));

        value.set(2);
        value.set(5);
        assert_eq!(*observed.borrow(), vec![(2, 1), (5, 2)]);
    }

    #[test]
    fn test_get_during_dispatch_sees_previous_value() {
        let value = state(1);
        let reader = value.clone();
        let seen: Rc<Cell<i32>> = Rc::new(Cell::new(0));

        let seen_sub = seen.clone();
        value.sub(move |_, _| seen_sub.set(reader.get()));

        value.set(9);
        assert_eq!(seen.get(), 1);
        assert_eq!(value.get(), 9);
    }

    #[test]
    fn test_failing_reaction_dropped_others_continue() {
        let value = state(0);
        let fired: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));

        let fired_a = fired.clone();
        value.sub(move |_, _| fired_a.borrow_mut().push("a"));
        let fired_b = fired.clone();
        value.try_sub(move |_, _| {
            fired_b.borrow_mut().push("b");
            Err(ReactionError::new("boom"))
        });
        let fired_c = fired.clone();
        value.sub(move |_, _| fired_c.borrow_mut().push("c"));

        // Failing reaction still runs (and fails) once, the rest continue.
        value.set(1);
        assert_eq!(*fired.borrow(), vec!["a", "b", "c"]);
        assert_eq!(value.subscriber_count(), 2);

        // It is never invoked again.
        value.set(2);
        assert_eq!(*fired.borrow(), vec!["a", "b", "c", "a", "c"]);
    }

    #[test]
    fn test_assignment_completes_despite_failing_reaction() {
        let value = state(0);
        value.try_sub(|_, _| Err(ReactionError::new("always")));
        value.set(7);
        assert_eq!(value.get(), 7);
        assert_eq!(value.subscriber_count(), 0);
    }

    #[test]
    fn test_unsub_removes_reaction() {
        let value = state(0);
        let count: Rc<Cell<u32>> = Rc::new(Cell::new(0));

        let count_sub = count.clone();
        let id = value.sub(move |_, _| count_sub.set(count_sub.get() + 1));

        value.set(1);
        assert!(value.unsub(id));
        assert!(!value.unsub(id));
        value.set(2);
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_sub_during_dispatch_waits_for_next_transition() {
        let value = state(0);
        let late_fired: Rc<Cell<u32>> = Rc::new(Cell::new(0));

        let handle = value.clone();
        let late_for_sub = late_fired.clone();
        value.sub(move |_, _| {
            let late = late_for_sub.clone();
            handle.sub(move |_, _| late.set(late.get() + 1));
        });

        value.set(1);
        assert_eq!(late_fired.get(), 0);

        value.set(2);
        assert_eq!(late_fired.get(), 1);
    }

    #[test]
    fn test_reentrant_set_is_queued_not_recursive() {
        let value = state(0);
        let handle = value.clone();
        let transitions: Rc<RefCell<Vec<i32>>> = Rc::new(RefCell::new(Vec::new()));

        let transitions_sub = transitions.clone();
        value.sub(move |new, _| {
            transitions_sub.borrow_mut().push(*new);
            if *new < 3 {
                handle.set(*new + 1);
            }
        });

        value.set(1);
        assert_eq!(*transitions.borrow(), vec![1, 2, 3]);
        assert_eq!(value.get(), 3);
    }

    #[test]
    fn test_cross_container_set_runs_immediately() {
        let left = state(0);
        let right = state(0);

        let right_handle = right.clone();
        left.sub(move |new, _| right_handle.set(*new * 2));

        let order: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        let order_right = order.clone();
        right.sub(move |_, _| order_right.borrow_mut().push("right"));
        let order_left = order.clone();
        left.sub(move |_, _| order_left.borrow_mut().push("left-after"));

        left.set(4);
        // The nested write completed before the rest of left's dispatch.
        assert_eq!(*order.borrow(), vec!["right", "left-after"]);
        assert_eq!(right.get(), 8);
    }

    #[test]
    fn test_derive_tracks_parent() {
        let parent = state(2);
        let child = parent.derive(|n| n * n);
        assert_eq!(child.get(), 4);

        parent.set(3);
        assert_eq!(child.get(), 9);
        parent.set(10);
        assert_eq!(child.get(), 100);
    }

    #[test]
    fn test_merge_fields_initial_and_single_field_update() {
        let a = state(1);
        let b = state(2);
        let mut sources = IndexMap::new();
        sources.insert("a".to_string(), a.clone());
        sources.insert("b".to_string(), b.clone());

        let merged = State::merge_fields(sources);
        assert_eq!(merged.get().get("a"), Some(&1));
        assert_eq!(merged.get().get("b"), Some(&2));

        a.set(10);
        assert_eq!(merged.get().get("a"), Some(&10));
        assert_eq!(merged.get().get("b"), Some(&2));
    }

    #[test]
    fn test_merge_fields_dispatches_per_source_change() {
        let a = state(1);
        let b = state(2);
        let mut sources = IndexMap::new();
        sources.insert("a".to_string(), a.clone());
        sources.insert("b".to_string(), b.clone());
        let merged = State::merge_fields(sources);

        let count: Rc<Cell<u32>> = Rc::new(Cell::new(0));
        let count_sub = count.clone();
        merged.sub(move |_, _| count_sub.set(count_sub.get() + 1));

        a.set(5);
        b.set(6);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn test_to_json_serializes_current_value() {
        let value = state(vec![1, 2, 3]);
        assert_eq!(value.to_json().unwrap(), "[1,2,3]");
        value.set(vec![4]);
        assert_eq!(value.to_json().unwrap(), "[4]");
    }
}
