//! Static metadata attached to a component value
//!
//! Statics live on the component itself, not on its instances: a debugging
//! name, helper functions tooling calls on the component, marker values.
//! Containers hoist the statics of the component they wrap so introspection
//! keeps working through any number of layers.

use crate::props::PropValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Attribute names intrinsic to component identity, never hoisted
pub const RESERVED_STATICS: &[&str] = &["display_name", "name", "props_contract", "default_props"];

/// Key of the debugging name
pub const DISPLAY_NAME: &str = "display_name";

/// Whether `name` belongs to the reserved intrinsic set
pub fn is_reserved(name: &str) -> bool {
    RESERVED_STATICS.contains(&name)
}

/// Function attached to a component rather than to its instances
pub type StaticFn = Arc<dyn Fn(&[PropValue]) -> anyhow::Result<PropValue> + Send + Sync>;

/// One static attribute
#[derive(Clone)]
pub enum StaticValue {
    Value(PropValue),
    Function(StaticFn),
}

impl StaticValue {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&[PropValue]) -> anyhow::Result<PropValue> + Send + Sync + 'static,
    {
        Self::Function(Arc::new(f))
    }

    /// Invoke a function static
    pub fn call(&self, args: &[PropValue]) -> anyhow::Result<PropValue> {
        match self {
            Self::Function(f) => f(args),
            Self::Value(_) => anyhow::bail!("static is a value, not a function"),
        }
    }

    pub fn as_value(&self) -> Option<&PropValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::Function(_) => None,
        }
    }
}

/// Identity comparison: the same value or the same function allocation
impl PartialEq for StaticValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a.same(b),
            (Self::Function(a), Self::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for StaticValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

macro_rules! static_value_from {
    ($($ty:ty),+) => {
        $(impl From<$ty> for StaticValue {
            fn from(value: $ty) -> Self {
                Self::Value(value.into())
            }
        })+
    };
}

static_value_from!(PropValue, bool, i64, i32, f64, &str, String);

// ============================================================================
// Statics
// ============================================================================

/// Named static attributes of one component
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statics {
    entries: BTreeMap<String, StaticValue>,
}

impl Statics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statics carrying only a display name
    pub fn named(display_name: impl Into<String>) -> Self {
        let mut statics = Self::new();
        statics.set_display_name(display_name);
        statics
    }

    pub fn display_name(&self) -> Option<&str> {
        self.entries
            .get(DISPLAY_NAME)
            .and_then(StaticValue::as_value)
            .and_then(PropValue::as_str)
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        self.entries
            .insert(DISPLAY_NAME.to_string(), StaticValue::Value(name.into().into()));
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<StaticValue>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<String>, value: impl Into<StaticValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&StaticValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Anything that can act as a source of static attributes
pub trait StaticMetadata {
    fn static_names(&self) -> Vec<&str>;

    fn get_static(&self, name: &str) -> Option<&StaticValue>;
}

impl StaticMetadata for Statics {
    fn static_names(&self) -> Vec<&str> {
        self.names().collect()
    }

    fn get_static(&self, name: &str) -> Option<&StaticValue> {
        self.get(name)
    }
}

// ============================================================================
// Hoisting
// ============================================================================

/// What a hoisting pass did, by attribute name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HoistReport {
    pub copied: Vec<String>,
    pub skipped_reserved: Vec<String>,
    pub skipped_existing: Vec<String>,
}

/// Copy statics from `source` onto `target`
///
/// An attribute is copied when `target` does not define it yet and its name
/// is not reserved. Reserved names are skipped without error. Running the
/// pass again copies nothing.
pub fn hoist_statics(target: &mut Statics, source: &dyn StaticMetadata) -> HoistReport {
    let mut report = HoistReport::default();

    for name in source.static_names() {
        if is_reserved(name) {
            tracing::trace!(attribute = name, "Skipping reserved static");
            report.skipped_reserved.push(name.to_string());
            continue;
        }
        if target.contains(name) {
            report.skipped_existing.push(name.to_string());
            continue;
        }
        if let Some(value) = source.get_static(name) {
            target.insert(name, value.clone());
            report.copied.push(name.to_string());
        }
    }

    report
}
