//! Props - the immutable input mapping handed to a component
//!
//! A [`Props`] value is never edited in place. Containers derive the props of
//! the component they wrap by building a new mapping from the props they
//! received: pass-through keys (everything they do not consume) plus the keys
//! they inject.
//!
//! # Equality
//!
//! Two notions of equality exist and they are not interchangeable:
//!
//! - [`PropValue::same`] is identity equality. Primitives compare by value,
//!   shared values (`List`, `Map`, `Opaque`) compare by pointer. Update
//!   gating uses this one.
//! - `PartialEq` is structural for data (`List`/`Map` compare element-wise)
//!   and is meant for assertions and configuration handling.

use crate::error::ContractError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Prop Values
// ============================================================================

/// A single prop value
#[derive(Clone)]
pub enum PropValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    List(Arc<Vec<PropValue>>),
    Map(Arc<BTreeMap<String, PropValue>>),
    /// Arbitrary shared value (callbacks, handles, domain objects)
    Opaque(Arc<dyn Any + Send + Sync>),
}

impl PropValue {
    /// Wrap any shareable value as an opaque prop
    pub fn opaque<T: Any + Send + Sync>(value: T) -> Self {
        Self::Opaque(Arc::new(value))
    }

    /// Identity equality: same primitive value or same shared allocation
    pub fn same(&self, other: &PropValue) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => Arc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Arc::ptr_eq(a, b),
            (Self::Opaque(a), Self::Opaque(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn kind(&self) -> PropKind {
        match self {
            Self::Null => PropKind::Null,
            Self::Bool(_) => PropKind::Bool,
            Self::Int(_) => PropKind::Int,
            Self::Float(_) => PropKind::Float,
            Self::Str(_) => PropKind::Str,
            Self::List(_) => PropKind::List,
            Self::Map(_) => PropKind::Map,
            Self::Opaque(_) => PropKind::Opaque,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Borrow the inner value of an `Opaque` prop as `T`
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Opaque(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Convert to JSON for display and serialization
    ///
    /// Opaque values and non-finite floats have no JSON form and become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null | Self::Opaque(_) => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::Str(s) => Value::String(s.to_string()),
            Self::List(items) => Value::Array(items.iter().map(PropValue::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "Bool({})", b),
            Self::Int(i) => write!(f, "Int({})", i),
            Self::Float(x) => write!(f, "Float({})", x),
            Self::Str(s) => write!(f, "Str({:?})", s),
            Self::List(items) => f.debug_tuple("List").field(items).finish(),
            Self::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Self::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            _ => self.same(other),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<Vec<PropValue>> for PropValue {
    fn from(value: Vec<PropValue>) -> Self {
        Self::List(Arc::new(value))
    }
}

impl<T: Into<PropValue>> From<Option<T>> for PropValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Self::Null)
    }
}

impl From<serde_json::Value> for PropValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Self::from(s),
            Value::Array(items) => {
                Self::List(Arc::new(items.into_iter().map(PropValue::from).collect()))
            }
            Value::Object(map) => Self::Map(Arc::new(
                map.into_iter().map(|(k, v)| (k, PropValue::from(v))).collect(),
            )),
        }
    }
}

impl Serialize for PropValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(PropValue::from)
    }
}

// ============================================================================
// Props
// ============================================================================

/// Immutable mapping of prop names to values
///
/// Cloning is a reference-count bump; every "modifying" operation returns a
/// new mapping and leaves `self` untouched.
#[derive(Clone, Default, PartialEq)]
pub struct Props {
    entries: Arc<BTreeMap<String, PropValue>>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// New mapping with `key` set to `value`
    pub fn with(&self, key: impl Into<String>, value: impl Into<PropValue>) -> Props {
        let mut entries = (*self.entries).clone();
        entries.insert(key.into(), value.into());
        Props::from_map(entries)
    }

    /// New mapping without the given keys (pass-through filtering)
    pub fn without<K: AsRef<str>>(&self, keys: &[K]) -> Props {
        if keys.iter().all(|k| !self.entries.contains_key(k.as_ref())) {
            return self.clone();
        }
        self.entries
            .iter()
            .filter(|(k, _)| !keys.iter().any(|c| c.as_ref() == k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// New mapping of `self` overlaid with `injected`
    ///
    /// On a key present in both, the injected value wins: data owned by an
    /// enhancer takes precedence over data supplied by the caller.
    pub fn merged_with(&self, injected: &Props) -> Props {
        if injected.is_empty() {
            return self.clone();
        }
        let mut entries = (*self.entries).clone();
        for (k, v) in injected.entries.iter() {
            entries.insert(k.clone(), v.clone());
        }
        Props::from_map(entries)
    }

    fn from_map(entries: BTreeMap<String, PropValue>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl<K: Into<String>, V: Into<PropValue>> FromIterator<(K, V)> for Props {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Props::from_map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Serialize for Props {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.entries.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Props {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        BTreeMap::<String, PropValue>::deserialize(deserializer).map(Props::from_map)
    }
}

/// Build a [`Props`] mapping inline
///
/// ```ignore
/// let props = props! { "id" => 1, "label" => "first" };
/// ```
#[macro_export]
macro_rules! props {
    () => { $crate::props::Props::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {
        <$crate::props::Props as ::std::iter::FromIterator<(String, $crate::props::PropValue)>>::from_iter([
            $((::std::string::String::from($key), $crate::props::PropValue::from($value))),+
        ])
    };
}

// ============================================================================
// Props Contract
// ============================================================================

/// Kind of value a prop is expected to hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropKind {
    Any,
    Null,
    Bool,
    Int,
    Float,
    Str,
    List,
    Map,
    Opaque,
}

impl PropKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropKind::Any => "any",
            PropKind::Null => "null",
            PropKind::Bool => "bool",
            PropKind::Int => "int",
            PropKind::Float => "float",
            PropKind::Str => "string",
            PropKind::List => "list",
            PropKind::Map => "map",
            PropKind::Opaque => "opaque",
        }
    }

    fn accepts(&self, actual: PropKind) -> bool {
        *self == PropKind::Any || *self == actual
    }
}

impl fmt::Display for PropKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared expectation for one prop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropSpec {
    pub kind: PropKind,
    pub required: bool,
}

/// The props contract of a component: prop name to expected kind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropsContract {
    fields: BTreeMap<String, PropSpec>,
}

impl PropsContract {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self, name: impl Into<String>, kind: PropKind) -> Self {
        self.fields.insert(name.into(), PropSpec { kind, required: true });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, kind: PropKind) -> Self {
        self.fields.insert(
            name.into(),
            PropSpec {
                kind,
                required: false,
            },
        );
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropSpec> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Contract seen from outside a container
    ///
    /// Injected props are supplied by the container, so callers no longer
    /// provide them. Consumed props never reach the inner component and
    /// become optional inputs of the container, even when the inner
    /// contract required them.
    pub fn for_container<K: AsRef<str>>(&self, injected: &[K], consumed: &[K]) -> Self {
        let mut fields: BTreeMap<String, PropSpec> = self
            .fields
            .iter()
            .filter(|(name, _)| !injected.iter().any(|k| k.as_ref() == name.as_str()))
            .map(|(name, spec)| (name.clone(), *spec))
            .collect();
        for key in consumed {
            fields.insert(
                key.as_ref().to_string(),
                PropSpec {
                    kind: PropKind::Any,
                    required: false,
                },
            );
        }
        Self { fields }
    }

    /// Verify `props` against this contract
    ///
    /// Keys not mentioned in the contract are always accepted.
    pub fn check(&self, component: &str, props: &Props) -> Result<(), ContractError> {
        for (name, spec) in &self.fields {
            match props.get(name) {
                None if spec.required => {
                    return Err(ContractError::Missing {
                        component: component.to_string(),
                        prop: name.clone(),
                    });
                }
                None => {}
                Some(value) if !spec.kind.accepts(value.kind()) => {
                    return Err(ContractError::Mismatch {
                        component: component.to_string(),
                        prop: name.clone(),
                        expected: spec.kind,
                        actual: value.kind(),
                    });
                }
                Some(_) => {}
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
