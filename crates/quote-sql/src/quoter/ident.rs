//! Identifier, table and column rendering.

use super::Quoter;
use crate::error::{QuoteError, Result};
use crate::value::{Object, Value};

impl Quoter<'_> {
    /// Renders a value in identifier context.
    ///
    /// Arrays become comma-separated lists; objects become
    /// `<expr> AS "<alias>"` pairs.
    pub fn ident(&self, value: &Value) -> Result<String> {
        match value {
            Value::Array(items) => {
                let parts = items
                    .iter()
                    .map(|item| match item {
                        Value::Object(_) => self.ident(item),
                        _ => self.quote_ident(item),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(parts.join(","))
            }
            Value::Object(object) => self.aliases(object),
            _ => self.quote_ident(value),
        }
    }

    fn aliases(&self, object: &Object) -> Result<String> {
        let parts = object
            .iter()
            .map(|(alias, expr)| {
                Ok(format!(
                    "{} AS {}",
                    self.quote_ident(expr)?,
                    self.quote_identifier(alias)
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(","))
    }

    /// Quotes a dotted path: `schema.table` becomes `"schema"."table"`.
    /// Surrounding double quotes on a part are dropped first.
    #[must_use]
    pub fn quote_path(&self, path: &str) -> String {
        path.split('.')
            .map(|part| part.trim().trim_matches('"'))
            .filter(|part| !part.is_empty())
            .map(|part| self.quote_identifier(part))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Renders a single identifier expression.
    fn quote_ident(&self, value: &Value) -> Result<String> {
        match value {
            Value::Raw(raw) => Ok(raw.as_str().to_string()),
            Value::Fragment(fragment) => Ok(fragment.to_sql()),
            Value::Callable(callable) => callable.call(self),
            Value::Object(object) => self.build_object(object),
            Value::Array(items) => {
                let args = items
                    .iter()
                    .map(|item| self.build_arg(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("jsonb_build_array({})", args.join(",")))
            }
            Value::Int(n) => usize::try_from(*n)
                .ok()
                .filter(|index| *index >= 1)
                .map(|index| self.dialect().bind_marker(index))
                .ok_or_else(|| self.unsupported(value, "a bind parameter")),
            Value::Ident(name) => {
                let column = self.quote_path(name);
                Ok(match self.first_table()? {
                    Some(table) => format!("{table}.{column}"),
                    None => column,
                })
            }
            Value::Text(path) => Ok(self.quote_path(path)),
            Value::Table(table) => Ok(self.quote_path(&table.name)),
            Value::Columns(columns) => Ok(columns
                .iter()
                .map(|c| self.quote_identifier(&c.name))
                .collect::<Vec<_>>()
                .join(",")),
            _ => Err(self.unsupported(value, "an identifier")),
        }
    }

    /// `jsonb_build_object('k', <ident>, ...)`, wrapped in
    /// `jsonb_strip_nulls` for compact objects.
    fn build_object(&self, object: &Object) -> Result<String> {
        let args = object
            .iter()
            .map(|(k, v)| Ok(format!("{}, {}", self.dialect().quote_string(k), self.build_arg(v)?)))
            .collect::<Result<Vec<_>>>()?;
        let built = format!("jsonb_build_object({})", args.join(","));
        Ok(if object.is_compact() {
            format!("jsonb_strip_nulls({built})")
        } else {
            built
        })
    }

    fn build_arg(&self, value: &Value) -> Result<String> {
        match value {
            Value::Null => Ok(String::from("NULL")),
            Value::Array(_) | Value::Object(_) => self.quote_ident(value),
            _ => self.ident(value),
        }
    }

    /// Quoted table references for this placeholder's name.
    fn table_refs(&self, value: &Value) -> Result<Vec<String>> {
        match value {
            Value::Array(items) => {
                let mut refs = Vec::new();
                for item in items {
                    refs.extend(self.table_refs(item)?);
                }
                Ok(refs)
            }
            Value::Table(table) => Ok(vec![self.quote_path(&table.name)]),
            Value::Text(name) | Value::Ident(name) => Ok(vec![self.quote_path(name)]),
            Value::Raw(raw) => Ok(vec![raw.as_str().to_string()]),
            Value::Fragment(fragment) => Ok(vec![fragment.to_sql()]),
            Value::Callable(callable) => Ok(vec![callable.call(self)?]),
            Value::Null => Ok(Vec::new()),
            _ => Err(self.unsupported(value, "a table reference")),
        }
    }

    /// The first quoted table for this placeholder's name, used to qualify
    /// bare identifiers.
    pub(crate) fn first_table(&self) -> Result<Option<String>> {
        match self.metadata.table(self.name) {
            Some(value) => Ok(self.table_refs(&value)?.into_iter().next()),
            None => Ok(None),
        }
    }

    /// Renders the table(s) bound for this placeholder's name, comma-joined.
    pub fn ident_table(&self) -> Result<String> {
        let value = self.metadata.table(self.name).ok_or_else(|| QuoteError::MissingColumns {
            name: self.metadata_name(),
        })?;
        Ok(self.table_refs(&value)?.join(","))
    }

    /// Renders the column list for this placeholder's name: the column
    /// override, else the cast keys, else the table's column names.
    pub fn ident_columns(&self) -> Result<String> {
        if let Some(columns) = self.metadata.columns(self.name) {
            return match columns {
                Value::Object(types) => Ok(types
                    .keys()
                    .map(|column| self.quote_identifier(column))
                    .collect::<Vec<_>>()
                    .join(",")),
                Value::Table(table) => Ok(self.quote_names(table.column_names())),
                _ => self.ident(columns),
            };
        }
        if let Some(casts) = self.metadata.casts(self.name) {
            return Ok(self.quote_names(casts.into_iter().map(|(column, _)| column)));
        }
        if let Some(table) = self.metadata.descriptor(self.name) {
            return Ok(self.quote_names(table.column_names()));
        }
        Err(QuoteError::MissingColumns {
            name: self.metadata_name(),
        })
    }

    fn quote_names(&self, names: impl IntoIterator<Item = String>) -> String {
        names
            .into_iter()
            .map(|name| self.quote_identifier(&name))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The metadata name for error messages; the key when there is none.
    pub(crate) fn metadata_name(&self) -> String {
        self.name.unwrap_or(self.key).to_string()
    }
}
