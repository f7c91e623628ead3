//! Flatten - Recursive resolution of nested containers.
//!
//! [`flatten`] walks a [`Source`] (an arbitrary nesting of plain
//! structure and containers) and produces one output container whose
//! value is always the fully dereferenced plain [`Value`], kept
//! continuously current.
//!
//! The accumulation is a fold over single-key writes: every level of
//! the walk composes a *sink* that knows how to set its own key on the
//! parent structure, and every leaf write travels through that
//! composition down to one `update` on the output container. The output
//! therefore dispatches once per individual field write - never once
//! per whole-structure rebuild - and key writes compose safely with any
//! higher-level rebuild in flight.
//!
//! Replacement is total: when a container at any level emits a new
//! value, the accumulated subtree for that level is cleared to null and
//! rebuilt from scratch, discarding keys absent from the new value.
//!
//! # Example
//!
//! ```
//! use indexmap::IndexMap;
//! use spark_dom::{flatten, state, Source, Value};
//!
//! let z = state(Source::from(2));
//! let mut inner = IndexMap::new();
//! inner.insert("z".to_string(), Source::State(z.clone()));
//! let mut root = IndexMap::new();
//! root.insert("x".to_string(), Source::from(1));
//! root.insert("y".to_string(), Source::Record(inner));
//!
//! let flat = flatten(&Source::Record(root));
//! assert_eq!(flat.get().key("y").and_then(|y| y.key("z")), Some(&Value::from(2)));
//!
//! z.set(Source::from(3));
//! assert_eq!(flat.get().key("y").and_then(|y| y.key("z")), Some(&Value::from(3)));
//! ```

use std::rc::Rc;

use indexmap::IndexMap;

use crate::state::{state, State};
use crate::value::{Source, Value};

/// One transformation of the accumulated structure.
type Mutator = Box<dyn FnOnce(Value) -> Value>;

/// A write path into the accumulated structure. The root sink applies
/// mutators to the output container; nested sinks prepend their key.
type Sink = Rc<dyn Fn(Mutator)>;

/// Produce a container holding the fully resolved plain structure of
/// `source`, kept current as containers inside it change.
pub fn flatten(source: &Source) -> State<Value> {
    let out = state(Value::null());
    let sink: Sink = {
        let out = out.clone();
        Rc::new(move |mutate: Mutator| out.update(|value| mutate(value)))
    };
    flatten_into(source, &sink);
    out
}

fn flatten_into(source: &Source, sink: &Sink) {
    match &source.deref_once() {
        Source::Record(entries) => {
            for (key, entry) in entries {
                let key_sink = record_sink(sink, key.clone());
                flatten_entry(entry, &key_sink);
            }
        }
        Source::List(items) => {
            let len = items.len();
            // Same-length null-filled slot, unless a rebuild already made one.
            sink(Box::new(move |value| match value {
                Value::List(items) => Value::List(items),
                _ => Value::List(vec![Value::null(); len]),
            }));
            for (index, item) in items.iter().enumerate() {
                let key_sink = list_sink(sink, index);
                flatten_entry(item, &key_sink);
            }
        }
        Source::Scalar(scalar) => {
            let scalar = scalar.clone();
            sink(Box::new(move |_| Value::Scalar(scalar)));
        }
        // Chained containers: keep dereferencing at this level.
        nested @ Source::State(_) => flatten_into(nested, sink),
    }

    if let Source::State(st) = source {
        let sink = sink.clone();
        st.sub(move |new, _prev| {
            sink(Box::new(|_| Value::null()));
            flatten_into(new, &sink);
        });
    }
}

/// One record key or list index of the walk: structured entries recurse
/// with a composed sink, leaves write their snapshot and track changes.
fn flatten_entry(entry: &Source, sink: &Sink) {
    if entry.is_structured() {
        flatten_into(entry, sink);
        return;
    }

    let initial = entry.resolve();
    sink(Box::new(move |_| initial));
    if let Source::State(st) = entry {
        let sink = sink.clone();
        st.sub(move |new, _prev| {
            let value = new.resolve();
            sink(Box::new(move |_| value));
        });
    }
}

fn record_sink(parent: &Sink, key: String) -> Sink {
    let parent = parent.clone();
    Rc::new(move |mutate: Mutator| {
        let key = key.clone();
        parent(Box::new(move |value| {
            let mut entries = match value {
                Value::Record(entries) => entries,
                _ => IndexMap::new(),
            };
            let previous = entries.get(&key).cloned().unwrap_or(Value::null());
            entries.insert(key, mutate(previous));
            Value::Record(entries)
        }));
    })
}

fn list_sink(parent: &Sink, index: usize) -> Sink {
    let parent = parent.clone();
    Rc::new(move |mutate: Mutator| {
        parent(Box::new(move |value| {
            let mut items = match value {
                Value::List(items) => items,
                _ => Vec::new(),
            };
            if items.len() <= index {
                items.resize(index + 1, Value::null());
            }
            let previous = std::mem::replace(&mut items[index], Value::null());
            items[index] = mutate(previous);
            Value::List(items)
        }));
    })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::value::Scalar;

    fn record(entries: Vec<(&str, Source)>) -> Source {
        Source::Record(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_flatten_nested_record_initial_value() {
        let z = state(Source::from(2));
        let source = record(vec![
            ("x", Source::State(state(Source::from(1)))),
            ("y", record(vec![("z", Source::State(z))])),
        ]);

        let flat = flatten(&source);
        assert_eq!(flat.get().key("x"), Some(&Value::from(1)));
        assert_eq!(
            flat.get().key("y").and_then(|y| y.key("z")),
            Some(&Value::from(2))
        );
    }

    #[test]
    fn test_leaf_update_touches_only_its_key() {
        let z = state(Source::from(2));
        let source = record(vec![
            ("x", Source::State(state(Source::from(1)))),
            ("y", record(vec![("z", Source::State(z.clone()))])),
        ]);
        let flat = flatten(&source);

        z.set(Source::from(3));
        assert_eq!(flat.get().key("x"), Some(&Value::from(1)));
        assert_eq!(
            flat.get().key("y").and_then(|y| y.key("z")),
            Some(&Value::from(3))
        );
    }

    #[test]
    fn test_subtree_replacement_discards_stale_keys() {
        let y = state(record(vec![("z", Source::from(2))]));
        let source = record(vec![
            ("x", Source::from(1)),
            ("y", Source::State(y.clone())),
        ]);
        let flat = flatten(&source);
        assert_eq!(
            flat.get().key("y").and_then(|y| y.key("z")),
            Some(&Value::from(2))
        );

        y.set(record(vec![("w", Source::from(5))]));
        let value = flat.get();
        assert_eq!(value.key("x"), Some(&Value::from(1)));
        assert_eq!(value.key("y").and_then(|y| y.key("w")), Some(&Value::from(5)));
        assert_eq!(value.key("y").and_then(|y| y.key("z")), None);
    }

    #[test]
    fn test_flatten_list_updates_by_index() {
        let second = state(Source::from("b"));
        let source = Source::List(vec![
            Source::from("a"),
            Source::State(second.clone()),
            Source::from("c"),
        ]);
        let flat = flatten(&source);
        assert_eq!(flat.get().index(1), Some(&Value::from("b")));

        second.set(Source::from("B"));
        let value = flat.get();
        assert_eq!(value.index(0), Some(&Value::from("a")));
        assert_eq!(value.index(1), Some(&Value::from("B")));
        assert_eq!(value.index(2), Some(&Value::from("c")));
    }

    #[test]
    fn test_scalar_root_resolves_and_tracks() {
        let root = state(Source::from(5));
        let flat = flatten(&Source::State(root.clone()));
        assert_eq!(flat.get(), Value::from(5));

        root.set(Source::from(7));
        assert_eq!(flat.get(), Value::from(7));
    }

    #[test]
    fn test_output_dispatches_once_per_field_write() {
        let x = state(Source::from(1));
        let source = record(vec![("x", Source::State(x.clone()))]);
        let flat = flatten(&source);

        let dispatches = Rc::new(Cell::new(0u32));
        let count = dispatches.clone();
        flat.sub(move |_, _| count.set(count.get() + 1));

        x.set(Source::from(2));
        assert_eq!(dispatches.get(), 1);
    }

    #[test]
    fn test_rebuild_dispatches_clear_then_per_key() {
        let root = state(record(vec![("a", Source::from(1))]));
        let flat = flatten(&Source::State(root.clone()));

        let dispatches = Rc::new(Cell::new(0u32));
        let count = dispatches.clone();
        flat.sub(move |_, _| count.set(count.get() + 1));

        // One clear plus one write per key of the new structure.
        root.set(record(vec![("a", Source::from(1)), ("b", Source::from(2))]));
        assert_eq!(dispatches.get(), 3);
        assert_eq!(flat.get().key("b"), Some(&Value::from(2)));
    }

    #[test]
    fn test_empty_record_stays_null() {
        let flat = flatten(&record(vec![]));
        assert_eq!(flat.get(), Value::Scalar(Scalar::Null));
    }
}
