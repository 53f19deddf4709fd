//! Context - entity attributes used to instantiate path templates
//!
//! A `Context` is built per request from entity attributes (`ASSET_TYPE`,
//! `SHOT`, `VERSION`, ...) and discarded after resolution. It is immutable:
//! every "modification" produces a new context, so a context shared across
//! threads never changes under a reader.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};


/// Typed value bound to a template variable
///
/// Untagged so YAML/JSON scalars map naturally: `true` → Bool, `12` →
/// Integer, anything else → String.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContextValue {
    Bool(bool),
    Integer(i64),
    String(String),
}

impl ContextValue {
    /// True when the value renders to an empty string
    pub fn is_empty(&self) -> bool {
        matches!(self, ContextValue::String(s) if s.is_empty())
    }

    /// Short type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            ContextValue::Bool(_) => "boolean",
            ContextValue::Integer(_) => "integer",
            ContextValue::String(_) => "string",
        }
    }
}

impl fmt::Display for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Bool(b) => write!(f, "{}", b),
            ContextValue::Integer(i) => write!(f, "{}", i),
            ContextValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::String(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::String(s)
    }
}

impl From<i64> for ContextValue {
    fn from(i: i64) -> Self {
        ContextValue::Integer(i)
    }
}

impl From<bool> for ContextValue {
    fn from(b: bool) -> Self {
        ContextValue::Bool(b)
    }
}

/// Immutable variable-name → value mapping
///
/// Cloning is O(1): the map lives behind an `Arc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, ContextValue>",
    into = "BTreeMap<String, ContextValue>"
)]
pub struct Context {
    values: Arc<FxHashMap<Arc<str>, ContextValue>>,
}

impl Context {
    /// Start building a context
    pub fn builder() -> ContextBuilder {
        ContextBuilder::default()
    }

    /// Build a context from `(name, value)` pairs; later pairs win
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<ContextValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut builder = Self::builder();
        for (k, v) in pairs {
            builder = builder.set(k.as_ref(), v);
        }
        builder.build()
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&ContextValue> {
        self.values.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over entries in name order (deterministic)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextValue)> {
        let mut entries: Vec<(&str, &ContextValue)> =
            self.values.iter().map(|(k, v)| (k.as_ref(), v)).collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries.into_iter()
    }

    /// New context with `name` set to `value`
    pub fn with(&self, name: &str, value: impl Into<ContextValue>) -> Self {
        let mut values = (*self.values).clone();
        values.insert(Arc::from(name), value.into());
        Self {
            values: Arc::new(values),
        }
    }

    /// New context where every name absent here is taken from `defaults`
    ///
    /// Values already present are kept, so caller-supplied attributes always
    /// win over configured fallbacks.
    pub fn with_defaults<'a, I>(&self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a ContextValue)>,
    {
        let mut values = (*self.values).clone();
        for (name, value) in defaults {
            values
                .entry(Arc::from(name.as_str()))
                .or_insert_with(|| value.clone());
        }
        Self {
            values: Arc::new(values),
        }
    }
}

impl From<BTreeMap<String, ContextValue>> for Context {
    fn from(map: BTreeMap<String, ContextValue>) -> Self {
        Context::from_pairs(map)
    }
}

impl From<Context> for BTreeMap<String, ContextValue> {
    fn from(ctx: Context) -> Self {
        ctx.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }
}

/// Builder for [`Context`]
#[derive(Debug, Default)]
pub struct ContextBuilder {
    values: FxHashMap<Arc<str>, ContextValue>,
}

impl ContextBuilder {
    /// Set a variable; a later `set` for the same name replaces the value
    pub fn set(mut self, name: &str, value: impl Into<ContextValue>) -> Self {
        self.values.insert(Arc::from(name), value.into());
        self
    }

    /// Set a variable only when `value` is present
    pub fn set_opt(self, name: &str, value: Option<impl Into<ContextValue>>) -> Self {
        match value {
            Some(v) => self.set(name, v),
            None => self,
        }
    }

    /// Asset entity attributes (`ASSET_TYPE`, `ASSET_NAME`)
    pub fn asset(self, asset_type: &str, asset_name: &str) -> Self {
        self.set("ASSET_TYPE", asset_type)
            .set("ASSET_NAME", asset_name)
    }

    /// Shot entity attributes (`SEQUENCE`, `SHOT`)
    pub fn shot(self, sequence: &str, shot: &str) -> Self {
        self.set("SEQUENCE", sequence).set("SHOT", shot)
    }

    pub fn build(self) -> Context {
        Context {
            values: Arc::new(self.values),
        }
    }
}
