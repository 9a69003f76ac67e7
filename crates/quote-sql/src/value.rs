//! Bound values and their conversions.
//!
//! A [`Value`] is what a caller binds to a placeholder. The variant decides
//! how the value is rendered; nothing is ever interpolated without going
//! through the dialect's quoting, except raw fragments.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::error::{QuoteError, Result};
use crate::quoter::Quoter;
use crate::schema::{ColumnDescriptor, TableDescriptor};

/// Types that render themselves as SQL and bypass quoting.
pub trait ToSql {
    /// Returns the SQL text, used verbatim.
    fn to_sql(&self) -> String;
}

/// A SQL fragment that is inserted verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawSql(String);

impl RawSql {
    /// Wraps trusted SQL text.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl ToSql for RawSql {
    fn to_sql(&self) -> String {
        self.0.clone()
    }
}

impl fmt::Display for RawSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bare SQL keywords usable as row cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// `DEFAULT`
    Default,
    /// `CURRENT_TIMESTAMP`
    CurrentTimestamp,
}

impl Keyword {
    /// Returns the keyword text.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::CurrentTimestamp => "CURRENT_TIMESTAMP",
        }
    }
}

/// Signature of a caller-supplied renderer.
pub type RenderFn = dyn Fn(&Quoter<'_>) -> Result<String> + Send + Sync;

/// A renderer invoked with the placeholder's quoting context.
#[derive(Clone)]
pub struct Callable(Arc<RenderFn>);

impl Callable {
    /// Invokes the renderer.
    pub fn call(&self, quoter: &Quoter<'_>) -> Result<String> {
        (self.0)(quoter)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callable")
    }
}

/// A shared value exposing [`ToSql`].
#[derive(Clone)]
pub struct Fragment(Arc<dyn ToSql + Send + Sync>);

impl Fragment {
    /// Returns the rendered SQL.
    #[must_use]
    pub fn to_sql(&self) -> String {
        self.0.to_sql()
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fragment({:?})", self.0.to_sql())
    }
}

/// An ordered key/value mapping.
///
/// `strip_nulls` is the compaction directive: entries holding `Null` are
/// left out of every rendering of the object.
#[derive(Debug, Clone, Default)]
pub struct Object {
    entries: Vec<(String, Value)>,
    strip_nulls: bool,
}

impl Object {
    /// Creates an empty object.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            strip_nulls: false,
        }
    }

    /// Inserts or replaces an entry, keeping the first position of the key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Builder form of [`Object::insert`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Drops null-valued entries from renderings.
    #[must_use]
    pub const fn strip_nulls(mut self) -> Self {
        self.strip_nulls = true;
        self
    }

    /// Returns true if null-valued entries are dropped.
    #[must_use]
    pub const fn is_compact(&self) -> bool {
        self.strip_nulls
    }

    /// Looks up a value by key, honouring the compaction directive.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Returns true if the key is present (and not stripped).
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.iter().any(|(k, _)| k == key)
    }

    /// Iterates entries in insertion order, honouring the compaction directive.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        let strip = self.strip_nulls;
        self.entries
            .iter()
            .filter(move |(_, v)| !(strip && v.is_null()))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in insertion order, honouring the compaction directive.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    /// Number of entries, honouring the compaction directive.
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Returns true if there are no visible entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut object = Self::new();
        for (k, v) in iter {
            object.insert(k, v);
        }
        object
    }
}

/// A value bound to a placeholder.
#[derive(Debug, Clone)]
pub enum Value {
    /// Trusted SQL, inserted verbatim.
    Raw(RawSql),
    /// Anything implementing [`ToSql`], inserted verbatim.
    Fragment(Fragment),
    /// `NULL`.
    Null,
    /// `TRUE` / `FALSE`.
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Floating point literal.
    Float(f64),
    /// String literal.
    Text(String),
    /// Timestamp literal.
    Timestamp(DateTime<Utc>),
    /// Bare keyword such as `DEFAULT`.
    Keyword(Keyword),
    /// Ordered sequence.
    Array(Vec<Value>),
    /// Ordered mapping.
    Object(Object),
    /// Renderer called with the quoting context.
    Callable(Callable),
    /// Table metadata.
    Table(TableDescriptor),
    /// Column metadata.
    Columns(Vec<ColumnDescriptor>),
    /// Bare identifier, qualified by the bound table when rendered as one.
    Ident(String),
}

impl Value {
    /// Creates a raw SQL value.
    #[must_use]
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::Raw(RawSql::new(sql))
    }

    /// Creates an identifier value.
    #[must_use]
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    /// Creates a value from anything rendering itself as SQL.
    #[must_use]
    pub fn fragment(sql: impl ToSql + Send + Sync + 'static) -> Self {
        Self::Fragment(Fragment(Arc::new(sql)))
    }

    /// Creates a callable value.
    #[must_use]
    pub fn callable<F>(f: F) -> Self
    where
        F: Fn(&Quoter<'_>) -> Result<String> + Send + Sync + 'static,
    {
        Self::Callable(Callable(Arc::new(f)))
    }

    /// Creates an object value from key/value pairs.
    #[must_use]
    pub fn object<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self::Object(entries.into_iter().collect())
    }

    /// Creates a column list value.
    #[must_use]
    pub const fn columns(columns: Vec<ColumnDescriptor>) -> Self {
        Self::Columns(columns)
    }

    /// Converts any serializable value through its JSON form.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        serde_json::to_value(value).map(Self::from)
    }

    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the variant, used in error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Raw(_) => "raw SQL",
            Self::Fragment(_) => "SQL fragment",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Timestamp(_) => "timestamp",
            Self::Keyword(_) => "keyword",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Callable(_) => "callable",
            Self::Table(_) => "table descriptor",
            Self::Columns(_) => "column list",
            Self::Ident(_) => "identifier",
        }
    }

    /// Nesting depth of an array (1 for a flat array, 0 for non-arrays).
    #[must_use]
    pub fn depth(&self) -> usize {
        match self {
            Self::Array(items) => 1 + items.iter().map(Self::depth).max().unwrap_or(0),
            _ => 0,
        }
    }

    /// Converts to JSON. `key` names the placeholder in errors.
    pub fn to_json(&self, key: &str) -> Result<serde_json::Value> {
        use serde_json::Value as Json;

        Ok(match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(n) => Json::from(*n),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::Text(s) | Self::Ident(s) => Json::String(s.clone()),
            Self::Raw(raw) => Json::String(raw.as_str().to_string()),
            Self::Fragment(fragment) => Json::String(fragment.to_sql()),
            Self::Timestamp(ts) => Json::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Keyword(keyword) => Json::String(keyword.as_sql().to_string()),
            Self::Array(items) => Json::Array(
                items
                    .iter()
                    .map(|item| item.to_json(key))
                    .collect::<Result<_>>()?,
            ),
            Self::Object(object) => {
                let mut map = serde_json::Map::new();
                for (k, v) in object.iter() {
                    map.insert(k.to_string(), v.to_json(key)?);
                }
                Json::Object(map)
            }
            Self::Callable(_) | Self::Table(_) | Self::Columns(_) => {
                return Err(QuoteError::unsupported(key, self.kind(), "JSON"));
            }
        })
    }

    /// Serializes to JSON text.
    pub fn to_json_string(&self, key: &str) -> Result<String> {
        Ok(serde_json::to_string(&self.to_json(key)?)?)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Self::Int(i64::from(n))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Self::Float(f64::from(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(String::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl From<RawSql> for Value {
    fn from(raw: RawSql) -> Self {
        Self::Raw(raw)
    }
}

impl From<Keyword> for Value {
    fn from(keyword: Keyword) -> Self {
        Self::Keyword(keyword)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Self::Object(object)
    }
}

impl From<TableDescriptor> for Value {
    fn from(table: TableDescriptor) -> Self {
        Self::Table(table)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            Json::String(s) => Self::Text(s),
            Json::Array(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Json::Object(map) => Self::Object(map.into_iter().collect()),
        }
    }
}
