//! Structure types flowing through the reactive pipeline.
//!
//! Three layers, from plain to reactive:
//!
//! - [`Scalar`] - a single plain leaf (null, bool, number, string).
//! - [`Value`] - a fully resolved plain structure: scalars, ordered
//!   lists, ordered records. Never contains a container.
//! - [`Source`] - a possibly-reactive structure: like [`Value`] but any
//!   node, at any depth, may be a [`State`] holding another [`Source`].
//!
//! Records are [`IndexMap`]s: insertion order is observable through
//! subscription dispatch order, so it is part of the contract.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::state::State;

// =============================================================================
// Scalar
// =============================================================================

/// A plain leaf value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Absent / cleared.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl Scalar {
    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }
}

/// Text-content rendering. `Null` renders empty.
impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Int(n) => write!(f, "{n}"),
            Scalar::Float(n) => write!(f, "{n}"),
            Scalar::Str(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Str(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(value as i64)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

// =============================================================================
// Value - fully resolved plain structure
// =============================================================================

/// A fully resolved plain structure: no container anywhere inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(Scalar),
    List(Vec<Value>),
    Record(IndexMap<String, Value>),
}

impl Value {
    /// The null scalar.
    pub const fn null() -> Self {
        Value::Scalar(Scalar::Null)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    /// Record field lookup.
    pub fn key(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(entries) => entries.get(key),
            _ => None,
        }
    }

    /// List index lookup.
    pub fn index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::List(items) => items.get(index),
            _ => None,
        }
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Self {
        Value::Scalar(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => Value::Scalar(Scalar::Bool(b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Scalar(Scalar::Int(i)),
                None => Value::Scalar(Scalar::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => Value::Scalar(Scalar::Str(s)),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Record(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

// =============================================================================
// Source - possibly-reactive structure
// =============================================================================

/// A structure whose nodes may be live containers.
///
/// This is the input domain of the flatten combinator and the type of
/// every element property: each node is a plain leaf, a list, a record,
/// or a [`State`] holding another `Source`.
#[derive(Debug, Clone)]
pub enum Source {
    Scalar(Scalar),
    List(Vec<Source>),
    Record(IndexMap<String, Source>),
    State(State<Source>),
}

impl Source {
    /// Dereference one container level; plain nodes pass through.
    pub(crate) fn deref_once(&self) -> Source {
        match self {
            Source::State(st) => st.get(),
            other => other.clone(),
        }
    }

    /// Whether the node, after dereferencing containers, is a record
    /// or a list. Drives the structured-vs-scalar reconciliation split.
    pub fn is_structured(&self) -> bool {
        let mut current = self.clone();
        loop {
            match current {
                Source::Record(_) | Source::List(_) => return true,
                Source::Scalar(_) => return false,
                Source::State(st) => current = st.get(),
            }
        }
    }

    /// Deep snapshot: dereference every container, producing a plain
    /// [`Value`]. Establishes no subscriptions.
    pub fn resolve(&self) -> Value {
        match self {
            Source::Scalar(scalar) => Value::Scalar(scalar.clone()),
            Source::List(items) => Value::List(items.iter().map(Source::resolve).collect()),
            Source::Record(entries) => Value::Record(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.resolve()))
                    .collect(),
            ),
            Source::State(st) => st.get().resolve(),
        }
    }

    /// Snapshot of a leaf node. Structured nodes resolve to `None`.
    pub(crate) fn resolve_scalar(&self) -> Option<Scalar> {
        match self.resolve() {
            Value::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Entries of a structured node, one container level deep: record
    /// keys, or list indices rendered as keys. Scalars have none.
    pub(crate) fn structured_entries(&self) -> Vec<(String, Source)> {
        match self.deref_once() {
            Source::Record(entries) => entries.into_iter().collect(),
            Source::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| (i.to_string(), item))
                .collect(),
            Source::Scalar(_) => Vec::new(),
            // Chained containers: keep dereferencing.
            nested @ Source::State(_) => nested.structured_entries(),
        }
    }
}

impl From<Scalar> for Source {
    fn from(value: Scalar) -> Self {
        Source::Scalar(value)
    }
}

impl From<&str> for Source {
    fn from(value: &str) -> Self {
        Source::Scalar(value.into())
    }
}

impl From<String> for Source {
    fn from(value: String) -> Self {
        Source::Scalar(value.into())
    }
}

impl From<bool> for Source {
    fn from(value: bool) -> Self {
        Source::Scalar(value.into())
    }
}

impl From<i64> for Source {
    fn from(value: i64) -> Self {
        Source::Scalar(value.into())
    }
}

impl From<i32> for Source {
    fn from(value: i32) -> Self {
        Source::Scalar(value.into())
    }
}

impl From<f64> for Source {
    fn from(value: f64) -> Self {
        Source::Scalar(value.into())
    }
}

impl From<State<Source>> for Source {
    fn from(state: State<Source>) -> Self {
        Source::State(state)
    }
}

impl From<Value> for Source {
    fn from(value: Value) -> Self {
        match value {
            Value::Scalar(scalar) => Source::Scalar(scalar),
            Value::List(items) => Source::List(items.into_iter().map(Source::from).collect()),
            Value::Record(entries) => Source::Record(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Source::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Serializes the deep snapshot, mirroring container serialization.
impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.resolve().serialize(serializer)
    }
}

// =============================================================================
// Tests
// =============================================================================
