//! Multi-row VALUES lists.
//!
//! Rows are either positional arrays or field maps. Both the INSERT form
//! (`("a","b") VALUES (...),(...)`) and the derived-table form
//! (`(VALUES (...)) AS "x" ("a","b")`) share row normalization.

use super::Quoter;
use crate::config::ValuesCasts;
use crate::error::{QuoteError, Result};
use crate::value::{Object, Value};

/// A column name with an optional declared SQL type.
pub(crate) type ColumnSpec = (String, Option<String>);

/// One cell of a normalized row.
enum Cell<'v> {
    /// A bound value.
    Value(&'v Value),
    /// A column absent from a map row.
    Missing,
}

/// Which VALUES form is being rendered.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Form {
    Insert,
    Derived,
}

impl Quoter<'_> {
    /// Columns from the explicit column override for this placeholder's
    /// name. A map override or descriptor list also declares types.
    pub(crate) fn column_override(&self) -> Result<Option<Vec<ColumnSpec>>> {
        let Some(columns) = self.metadata.columns(self.name) else {
            return Ok(None);
        };
        let specs = match columns {
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Text(name) | Value::Ident(name) => Ok((name.clone(), None)),
                    other => Err(QuoteError::unsupported(self.key, other.kind(), "a column name")),
                })
                .collect::<Result<Vec<_>>>()?,
            Value::Text(name) | Value::Ident(name) => vec![(name.clone(), None)],
            Value::Object(types) => types
                .iter()
                .map(|(name, sql_type)| {
                    let sql_type = match sql_type {
                        Value::Text(t) => Some(t.to_ascii_uppercase()),
                        _ => None,
                    };
                    (name.to_string(), sql_type)
                })
                .collect(),
            Value::Columns(descriptors) => descriptors
                .iter()
                .filter(|c| !c.is_virtual)
                .map(|c| (c.name.clone(), Some(c.sql_type.to_ascii_uppercase())))
                .collect(),
            Value::Table(table) => table
                .writable_columns()
                .map(|c| (c.name.clone(), None))
                .collect(),
            other => {
                return Err(QuoteError::unsupported(
                    self.key,
                    other.kind(),
                    "a column list",
                ))
            }
        };
        Ok(Some(specs))
    }

    /// Columns from cast or table metadata, virtual columns removed.
    fn metadata_columns(&self) -> Option<Vec<ColumnSpec>> {
        match self.metadata.cast_override(self.name) {
            Some(Value::Columns(descriptors)) => {
                return Some(
                    descriptors
                        .iter()
                        .filter(|c| !c.is_virtual)
                        .map(|c| (c.name.clone(), None))
                        .collect(),
                );
            }
            Some(Value::Table(table)) => {
                return Some(table.writable_columns().map(|c| (c.name.clone(), None)).collect());
            }
            Some(_) => {
                if let Some(casts) = self.metadata.casts(self.name) {
                    return Some(casts.into_iter().map(|(name, _)| (name, None)).collect());
                }
            }
            None => {}
        }
        self.metadata.descriptor(self.name).map(|table| {
            table
                .writable_columns()
                .map(|c| (c.name.clone(), None))
                .collect()
        })
    }

    /// Splits the bound value into rows. `None` rows are dropped.
    fn rows<'v>(&self, value: &'v Value) -> Result<Vec<&'v Value>> {
        let rows: Vec<&Value> = match value {
            Value::Array(items) => items.iter().filter(|row| !row.is_null()).collect(),
            Value::Object(_) => vec![value],
            other => {
                return Err(QuoteError::unsupported(
                    self.key,
                    other.kind(),
                    "a VALUES list",
                ))
            }
        };
        if rows.is_empty() {
            return Err(QuoteError::EmptyRows {
                key: self.key.to_string(),
            });
        }
        Ok(rows)
    }

    /// Normalizes rows into cells in column order. Returns the columns
    /// (if any could be determined) and the cell rows.
    fn normalize<'v>(
        &self,
        rows: &[&'v Value],
        columns: Option<Vec<ColumnSpec>>,
    ) -> Result<(Option<Vec<ColumnSpec>>, Vec<Vec<Cell<'v>>>)> {
        if rows.iter().all(|row| matches!(row, Value::Object(_))) {
            let columns = columns.unwrap_or_else(|| {
                key_union(rows.iter().filter_map(|row| match row {
                    Value::Object(object) => Some(object),
                    _ => None,
                }))
                .into_iter()
                .map(|name| (name, None))
                .collect()
            });
            let cells = rows
                .iter()
                .filter_map(|row| match *row {
                    Value::Object(object) => Some(
                        columns
                            .iter()
                            .map(|(name, _)| object.get(name).map_or(Cell::Missing, Cell::Value))
                            .collect(),
                    ),
                    _ => None,
                })
                .collect();
            return Ok((Some(columns), cells));
        }

        if rows.iter().all(|row| matches!(row, Value::Array(_))) {
            let mut lengths: Vec<usize> = Vec::new();
            for row in rows {
                if let Value::Array(items) = row {
                    if !lengths.contains(&items.len()) {
                        lengths.push(items.len());
                    }
                }
            }
            if lengths.len() > 1 {
                return Err(QuoteError::InconsistentRowLength {
                    key: self.key.to_string(),
                    lengths,
                });
            }
            let length = lengths.first().copied().unwrap_or(0);
            if let Some(columns) = &columns {
                if columns.len() != length {
                    return Err(QuoteError::ColumnCountMismatch {
                        key: self.key.to_string(),
                        columns: columns.len(),
                        values: length,
                    });
                }
            }
            let cells = rows
                .iter()
                .filter_map(|row| match *row {
                    Value::Array(items) => Some(items.iter().map(Cell::Value).collect()),
                    _ => None,
                })
                .collect();
            return Ok((columns, cells));
        }

        Err(QuoteError::unsupported(
            self.key,
            "mixed rows",
            "a VALUES list (rows must be all maps or all arrays)",
        ))
    }

    fn cell(&self, cell: &Cell<'_>, sql_type: Option<&str>, form: Form) -> Result<String> {
        let typed = |sql: String| match sql_type {
            Some(t) => format!("{sql}::{t}"),
            None => sql,
        };
        match cell {
            Cell::Missing if form == Form::Insert => Ok(String::from("DEFAULT")),
            Cell::Missing => Ok(typed(String::from("NULL"))),
            Cell::Value(Value::Keyword(keyword)) => Ok(keyword.as_sql().to_string()),
            Cell::Value(value @ (Value::Array(_) | Value::Object(_))) => {
                let json = value.to_json_string(self.key)?;
                Ok(typed(self.dialect().quote_string(&json)))
            }
            Cell::Value(value @ (Value::Table(_) | Value::Columns(_) | Value::Ident(_))) => {
                Err(self.unsupported(value, "a VALUES cell"))
            }
            Cell::Value(value) => Ok(typed(self.quote_with(value, None)?)),
        }
    }

    fn render_rows(
        &self,
        columns: Option<&[ColumnSpec]>,
        rows: &[Vec<Cell<'_>>],
        form: Form,
    ) -> Result<Vec<String>> {
        let every_row = self.config.options.values_casts == ValuesCasts::EveryRow;
        rows.iter()
            .enumerate()
            .map(|(index, row)| {
                let cells = row
                    .iter()
                    .enumerate()
                    .map(|(i, cell)| {
                        let sql_type = columns
                            .filter(|_| index == 0 || every_row)
                            .and_then(|columns| columns.get(i))
                            .and_then(|(_, sql_type)| sql_type.as_deref());
                        self.cell(cell, sql_type, form)
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("({})", cells.join(",")))
            })
            .collect()
    }

    fn column_list(&self, columns: &[ColumnSpec]) -> String {
        columns
            .iter()
            .map(|(name, _)| self.quote_identifier(name))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// `(<cols>) VALUES (<row>),(<row>)`. Absent map fields render as
    /// `DEFAULT`. A raw fragment is wrapped in parentheses.
    pub fn insert_values(&self, value: &Value) -> Result<String> {
        let raw = match value {
            Value::Raw(raw) => Some(raw.as_str().to_string()),
            Value::Fragment(fragment) => Some(fragment.to_sql()),
            _ => None,
        };
        if let Some(sql) = raw {
            let trimmed = sql.trim();
            return Ok(if trimmed.starts_with('(') && trimmed.ends_with(')') {
                sql
            } else {
                format!("({sql})")
            });
        }

        let rows = self.rows(value)?;
        let columns = match self.column_override()? {
            Some(columns) => Some(columns),
            None => self.metadata_columns(),
        };
        let (columns, cells) = self.normalize(&rows, columns)?;
        let rendered = self.render_rows(columns.as_deref(), &cells, Form::Insert)?;

        Ok(match columns.filter(|c| !c.is_empty()) {
            Some(columns) => format!(
                "({}) VALUES {}",
                self.column_list(&columns),
                rendered.join(",")
            ),
            None => format!("VALUES {}", rendered.join(",")),
        })
    }

    /// `(VALUES (<row>),(<row>)) AS "<name>" (<cols>)`. Absent map fields
    /// render as `NULL`; positional rows without column metadata get
    /// `column1..columnN`.
    pub fn derived_values(&self, value: &Value) -> Result<String> {
        let rows = self.rows(value)?;
        let columns = match self.column_override()? {
            Some(columns) => Some(columns),
            None => self.metadata_columns(),
        };
        let (columns, cells) = self.normalize(&rows, columns)?;
        let rendered = self.render_rows(columns.as_deref(), &cells, Form::Derived)?;

        let names = columns.map_or_else(
            || {
                let width = cells.first().map_or(0, Vec::len);
                (1..=width).map(|i| format!("column{i}")).collect::<Vec<_>>()
            },
            |columns| columns.into_iter().map(|(name, _)| name).collect(),
        );
        let names = names
            .iter()
            .map(|name| self.quote_identifier(name))
            .collect::<Vec<_>>()
            .join(",");

        Ok(format!(
            "(VALUES {}) AS {} ({})",
            rendered.join(","),
            self.quote_identifier(&self.metadata_name()),
            names
        ))
    }
}

/// Union of row keys: each row's keys sorted, first-seen order across rows.
fn key_union<'o>(objects: impl Iterator<Item = &'o Object>) -> Vec<String> {
    let mut union: Vec<String> = Vec::new();
    for object in objects {
        let mut keys: Vec<&str> = object.keys().collect();
        keys.sort_unstable();
        for key in keys {
            if !union.iter().any(|k| k == key) {
                union.push(key.to_string());
            }
        }
    }
    union
}
