//! Value quoting and per-key dispatch.
//!
//! A [`Quoter`] is the rendering context of one placeholder: its key, the
//! bound value, the cast annotation and the session metadata. The key's
//! suffix selects a [`Route`]; `render` follows it.

mod bind;
mod ident;
mod json;
mod values;

pub use bind::{parse_bind, BindList};

use std::fmt;

use crate::cast::{CastEncoding, CastType};
use crate::config::Config;
use crate::dialect::{Dialect, Literal};
use crate::error::{QuoteError, Result};
use crate::metadata::Metadata;
use crate::value::{Object, Value};

/// How a placeholder is rendered, chosen from its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A bound callable renders itself.
    Callable,
    /// `table`, `<name>_table`: quoted table name(s).
    Table,
    /// `columns`, `<name>_columns`: quoted column list.
    Columns,
    /// `ident`, `args` and their `<name>_` forms: identifier rendering.
    Ident,
    /// `constraint(s)`, `raw`, `sql` and their `<name>_` forms: verbatim.
    Passthrough,
    /// `<name>_json`: `json_to_recordset(...)`.
    Json,
    /// `<name>_values`: derived-table VALUES.
    DerivedValues,
    /// `values`: INSERT VALUES.
    InsertValues,
    /// Anything else: literal quoting.
    Quote,
}

fn is_suffix(key: &str, suffix: &str) -> bool {
    key == suffix
        || key
            .strip_suffix(suffix)
            .is_some_and(|rest| rest.ends_with('_'))
}

impl Route {
    /// Selects the route for a key. Callables are routed by value, not key.
    #[must_use]
    pub fn for_key(key: &str) -> Self {
        let has_name = |suffix: &str| {
            key.strip_suffix(suffix)
                .and_then(|rest| rest.strip_suffix('_'))
                .is_some_and(|name| !name.is_empty())
        };

        if is_suffix(key, "table") {
            Self::Table
        } else if is_suffix(key, "columns") {
            Self::Columns
        } else if is_suffix(key, "ident") || is_suffix(key, "args") {
            Self::Ident
        } else if ["constraint", "constraints", "raw", "sql"]
            .iter()
            .any(|suffix| is_suffix(key, suffix))
        {
            Self::Passthrough
        } else if has_name("json") {
            Self::Json
        } else if has_name("values") {
            Self::DerivedValues
        } else if key.ends_with("values") {
            Self::InsertValues
        } else {
            Self::Quote
        }
    }

    /// Route for a key and its bound value.
    #[must_use]
    pub fn select(key: &str, value: Option<&Value>) -> Self {
        if matches!(value, Some(Value::Callable(_))) {
            Self::Callable
        } else {
            Self::for_key(key)
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Callable => "callable",
            Self::Table => "table",
            Self::Columns => "columns",
            Self::Ident => "ident",
            Self::Passthrough => "passthrough",
            Self::Json => "json",
            Self::DerivedValues => "derived values",
            Self::InsertValues => "insert values",
            Self::Quote => "quote",
        };
        f.write_str(name)
    }
}

/// The metadata name of a key: everything before its last `_` segment.
#[must_use]
pub fn name_of(key: &str) -> Option<&str> {
    key.rsplit_once('_').map(|(name, _)| name)
}

/// Rendering context for one placeholder.
pub struct Quoter<'a> {
    config: &'a Config,
    metadata: Metadata<'a>,
    key: &'a str,
    base: &'a str,
    name: Option<&'a str>,
    cast: Option<&'a CastType>,
    value: Option<&'a Value>,
}

impl<'a> Quoter<'a> {
    pub(crate) fn new(
        config: &'a Config,
        metadata: Metadata<'a>,
        key: &'a str,
        base: &'a str,
        cast: Option<&'a CastType>,
        value: Option<&'a Value>,
    ) -> Self {
        let name = name_of(base);
        Self {
            config,
            metadata,
            key,
            base,
            name,
            cast,
            value,
        }
    }

    /// The placeholder key as written.
    #[must_use]
    pub const fn key(&self) -> &str {
        self.key
    }

    /// The metadata name: the key up to its last `_` segment.
    #[must_use]
    pub const fn name(&self) -> Option<&str> {
        self.name
    }

    /// The cast annotation, if any.
    #[must_use]
    pub const fn cast(&self) -> Option<&CastType> {
        self.cast
    }

    /// The bound value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        self.value
    }

    /// The quoting dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.config.dialect.as_ref()
    }

    /// The dispatch route of this placeholder.
    #[must_use]
    pub fn route(&self) -> Route {
        Route::select(self.base, self.value)
    }

    /// Array dimensions an array literal has beyond those of its trailing
    /// colon cast. The resolver appends one `[]` per missing dimension
    /// after the cast as written, so `%ids::int` becomes `::int[]`.
    #[must_use]
    pub fn missing_array_dims(&self) -> usize {
        match (self.route(), self.cast, self.value) {
            (Route::Quote, Some(cast), Some(value @ Value::Array(_)))
                if cast.encoding() == CastEncoding::Colon && !cast.is_json_scalar() =>
            {
                value.depth().saturating_sub(cast.dims())
            }
            _ => 0,
        }
    }

    /// Quotes an identifier through the dialect.
    #[must_use]
    pub fn quote_identifier(&self, name: &str) -> String {
        self.dialect().quote_identifier(name)
    }

    /// Renders the placeholder.
    pub fn render(&self) -> Result<String> {
        match self.route() {
            Route::Callable => self.call_value(),
            Route::Table => self.ident_table(),
            Route::Columns => self.ident_columns(),
            Route::Ident => self.ident(self.bound()?),
            Route::Passthrough => self.passthrough(self.bound()?),
            Route::Json => self.data_json(self.bound()?),
            Route::DerivedValues => self.derived_values(self.bound()?),
            Route::InsertValues => self.insert_values(self.bound()?),
            Route::Quote => self.quote(self.bound()?),
        }
    }

    fn bound(&self) -> Result<&'a Value> {
        self.value.ok_or_else(|| QuoteError::UnresolvedReference {
            keys: vec![self.key.to_string()],
        })
    }

    fn call_value(&self) -> Result<String> {
        match self.value {
            Some(Value::Callable(callable)) => callable.call(self),
            _ => self.quote(self.bound()?),
        }
    }

    fn passthrough(&self, value: &Value) -> Result<String> {
        match value {
            Value::Text(text) => Ok(text.clone()),
            Value::Null => Ok(String::new()),
            _ => self.quote(value),
        }
    }

    /// The `::TYPE` text the renderer appends. Colon casts stay in the
    /// template instead.
    fn appended(cast: Option<&CastType>) -> String {
        cast.filter(|c| c.encoding() == CastEncoding::Underscore)
            .map(CastType::suffix)
            .unwrap_or_default()
    }

    fn unsupported(&self, value: &Value, context: impl Into<String>) -> QuoteError {
        QuoteError::unsupported(self.key, value.kind(), context)
    }

    /// Quotes a value with this placeholder's cast.
    pub fn quote(&self, value: &Value) -> Result<String> {
        self.quote_with(value, self.cast)
    }

    /// Quotes a value with an explicit cast.
    pub fn quote_with(&self, value: &Value, cast: Option<&CastType>) -> Result<String> {
        let dialect = self.dialect();
        let json = cast.is_some_and(CastType::is_json_scalar);

        Ok(match value {
            Value::Raw(raw) => raw.as_str().to_string(),
            Value::Fragment(fragment) => fragment.to_sql(),
            Value::Callable(callable) => callable.call(self)?,
            Value::Keyword(keyword) => keyword.as_sql().to_string(),
            Value::Null => format!("NULL{}", Self::appended(cast)),
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Text(_) | Value::Timestamp(_)
                if json =>
            {
                let encoded = value.to_json_string(self.key)?;
                format!("{}{}", dialect.quote_string(&encoded), Self::appended(cast))
            }
            Value::Bool(b) => format!("{}{}", if *b { "TRUE" } else { "FALSE" }, Self::appended(cast)),
            Value::Int(n) => format!("{}{}", dialect.quote_literal(Literal::Int(*n)), Self::appended(cast)),
            Value::Float(f) => format!("{}{}", dialect.quote_literal(Literal::Float(*f)), Self::appended(cast)),
            Value::Text(s) => format!("{}{}", dialect.quote_literal(Literal::Text(s)), Self::appended(cast)),
            Value::Timestamp(ts) => format!(
                "{}{}",
                dialect.quote_literal(Literal::Timestamp(ts)),
                Self::appended(cast)
            ),
            Value::Array(items) => self.quote_array(value, items, cast)?,
            Value::Object(object) => self.quote_object(object, cast)?,
            Value::Table(_) | Value::Columns(_) | Value::Ident(_) => {
                return Err(self.unsupported(value, "a literal"));
            }
        })
    }

    /// JSON text as a quoted string literal.
    fn json_literal(&self, value: &Value) -> Result<String> {
        Ok(self.dialect().quote_string(&value.to_json_string(self.key)?))
    }

    fn default_json_suffix(&self) -> String {
        format!("::{}", self.config.options.default_json_cast)
    }

    fn quote_array(&self, value: &Value, items: &[Value], cast: Option<&CastType>) -> Result<String> {
        match cast {
            None => Ok(format!("{}{}", self.json_literal(value)?, self.default_json_suffix())),
            Some(c) if c.is_json_scalar() => {
                Ok(format!("{}{}", self.json_literal(value)?, Self::appended(cast)))
            }
            Some(c) => {
                let body = self.array_body(items, c.is_json())?;
                let suffix = if c.encoding() == CastEncoding::Underscore {
                    c.array_suffix(value.depth())
                } else {
                    String::new()
                };
                Ok(format!("ARRAY{body}{suffix}"))
            }
        }
    }

    /// `[elem,elem,...]`, nested arrays as nested bodies.
    fn array_body(&self, items: &[Value], json: bool) -> Result<String> {
        let elements = items
            .iter()
            .map(|item| match item {
                Value::Array(inner) => self.array_body(inner, json),
                Value::Null => Ok(String::from("NULL")),
                Value::Raw(_) | Value::Fragment(_) | Value::Callable(_) => self.quote_with(item, None),
                Value::Object(_) => self.json_literal(item),
                _ if json => self.json_literal(item),
                _ => self.quote_with(item, None),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("[{}]", elements.join(",")))
    }

    fn quote_object(&self, object: &Object, cast: Option<&CastType>) -> Result<String> {
        match cast {
            Some(c) if c.is_hstore() => {
                let literal = self.hstore_literal(object)?;
                Ok(format!("{}{}", self.dialect().quote_string(&literal), Self::appended(cast)))
            }
            Some(c) if c.is_json_scalar() => {
                let value = Value::Object(object.clone());
                Ok(format!("{}{}", self.json_literal(&value)?, Self::appended(cast)))
            }
            None => {
                let value = Value::Object(object.clone());
                Ok(format!("{}{}", self.json_literal(&value)?, self.default_json_suffix()))
            }
            Some(c) => Err(QuoteError::unsupported(
                self.key,
                "object",
                format!("a {} literal", c.as_str()),
            )),
        }
    }

    /// `"k"=>"v","n"=>NULL`, before string quoting.
    fn hstore_literal(&self, object: &Object) -> Result<String> {
        fn escape(text: &str) -> String {
            format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
        }

        let pairs = object
            .iter()
            .map(|(k, v)| {
                let value = match v {
                    Value::Null => String::from("NULL"),
                    Value::Text(s) => escape(s),
                    Value::Bool(b) => escape(if *b { "true" } else { "false" }),
                    Value::Int(n) => escape(&n.to_string()),
                    Value::Float(f) => escape(&f.to_string()),
                    other => escape(&other.to_json_string(self.key)?),
                };
                Ok(format!("{}=>{}", escape(k), value))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(pairs.join(","))
    }
}
