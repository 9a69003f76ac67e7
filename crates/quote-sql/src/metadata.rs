//! Table, column and cast metadata attached to a session.
//!
//! Bindings named `table`, `columns` or `casts` (bare, or as `<name>_table`
//! and so on) are not values: they describe the table behind `<name>`.
//! [`Overrides`] stores them; [`Metadata`] combines them with the configured
//! [`Catalog`] for lookups.

use std::collections::HashMap;
use std::fmt::Write as _;

use crate::schema::{Catalog, TableDescriptor};
use crate::value::Value;

/// The kind of metadata a binding key addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    /// `table` / `<name>_table`
    Table,
    /// `columns` / `<name>_columns`
    Columns,
    /// `casts` / `<name>_casts`
    Casts,
}

impl MetaKind {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Columns => "columns",
            Self::Casts => "casts",
        }
    }
}

/// Splits a metadata key into its name and kind.
///
/// `table` yields `(None, Table)`, `users_casts` yields
/// `(Some("users"), Casts)`. Other keys yield `None`.
#[must_use]
pub fn route(key: &str) -> Option<(Option<String>, MetaKind)> {
    let key = key.to_ascii_lowercase();
    [MetaKind::Table, MetaKind::Columns, MetaKind::Casts]
        .into_iter()
        .find_map(|kind| {
            let suffix = kind.suffix();
            if key == suffix {
                return Some((None, kind));
            }
            let name = key.strip_suffix(suffix)?.strip_suffix('_')?;
            (!name.is_empty()).then(|| (Some(name.to_string()), kind))
        })
}

/// Metadata overrides bound on a session.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    tables: HashMap<Option<String>, Value>,
    columns: HashMap<Option<String>, Value>,
    casts: HashMap<Option<String>, Value>,
}

impl Overrides {
    /// Creates empty overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn map_mut(&mut self, kind: MetaKind) -> &mut HashMap<Option<String>, Value> {
        match kind {
            MetaKind::Table => &mut self.tables,
            MetaKind::Columns => &mut self.columns,
            MetaKind::Casts => &mut self.casts,
        }
    }

    /// Stores an override, replacing a previous one.
    pub fn set(&mut self, kind: MetaKind, name: Option<String>, value: Value) {
        self.map_mut(kind).insert(name, value);
    }

    /// The table override for `name`.
    #[must_use]
    pub fn table(&self, name: Option<&str>) -> Option<&Value> {
        self.tables.get(&name.map(str::to_string))
    }

    /// The column override for `name`.
    #[must_use]
    pub fn columns(&self, name: Option<&str>) -> Option<&Value> {
        self.columns.get(&name.map(str::to_string))
    }

    /// The cast override for `name`.
    #[must_use]
    pub fn casts(&self, name: Option<&str>) -> Option<&Value> {
        self.casts.get(&name.map(str::to_string))
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty() && self.columns.is_empty() && self.casts.is_empty()
    }

    /// Removes all overrides.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.columns.clear();
        self.casts.clear();
    }

    /// One-line description of all overrides, sorted by key.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut entries: Vec<(String, &Value)> = Vec::new();
        for (kind, map) in [
            (MetaKind::Table, &self.tables),
            (MetaKind::Columns, &self.columns),
            (MetaKind::Casts, &self.casts),
        ] {
            for (name, value) in map {
                let key = name.as_ref().map_or_else(
                    || kind.suffix().to_string(),
                    |name| format!("{name}_{}", kind.suffix()),
                );
                entries.push((key, value));
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut out = String::from("{");
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{key}: {value:?}");
        }
        out.push('}');
        out
    }
}

/// Read access to overrides backed by a catalog.
#[derive(Clone, Copy)]
pub struct Metadata<'a> {
    overrides: &'a Overrides,
    catalog: Option<&'a dyn Catalog>,
}

impl<'a> Metadata<'a> {
    /// Combines overrides and an optional catalog.
    #[must_use]
    pub fn new(overrides: &'a Overrides, catalog: Option<&'a dyn Catalog>) -> Self {
        Self { overrides, catalog }
    }

    fn lookup(&self, name: &str) -> Option<TableDescriptor> {
        self.catalog.and_then(|catalog| catalog.table(name))
    }

    /// The table bound for `name`: the override, else the catalog table
    /// called `name`.
    #[must_use]
    pub fn table(&self, name: Option<&str>) -> Option<Value> {
        if let Some(value) = self.overrides.table(name) {
            return Some(value.clone());
        }
        self.lookup(name?).map(Value::Table)
    }

    /// The first table descriptor for `name`. Table names bound as text
    /// are looked up in the catalog.
    #[must_use]
    pub fn descriptor(&self, name: Option<&str>) -> Option<TableDescriptor> {
        match self.overrides.table(name) {
            Some(value) => self.descriptor_of(value),
            None => self.lookup(name?),
        }
    }

    fn descriptor_of(&self, value: &Value) -> Option<TableDescriptor> {
        match value {
            Value::Table(table) => Some(table.clone()),
            Value::Text(name) | Value::Ident(name) => self.lookup(name),
            Value::Array(items) => items.first().and_then(|item| self.descriptor_of(item)),
            _ => None,
        }
    }

    /// The explicit cast override for `name`.
    #[must_use]
    pub fn cast_override(&self, name: Option<&str>) -> Option<&'a Value> {
        self.overrides.casts(name)
    }

    /// The explicit column override for `name`.
    #[must_use]
    pub fn columns(&self, name: Option<&str>) -> Option<&'a Value> {
        self.overrides.columns(name)
    }

    /// Column name to SQL type pairs for `name`: the cast override, else
    /// the table descriptor's column types.
    #[must_use]
    pub fn casts(&self, name: Option<&str>) -> Option<Vec<(String, String)>> {
        match self.overrides.casts(name) {
            Some(Value::Object(object)) => Some(
                object
                    .iter()
                    .map(|(column, sql_type)| {
                        let sql_type = match sql_type {
                            Value::Text(t) | Value::Ident(t) => t.clone(),
                            _ => String::new(),
                        };
                        (column.to_string(), sql_type)
                    })
                    .collect(),
            ),
            Some(Value::Columns(columns)) => Some(
                columns
                    .iter()
                    .map(|c| (c.name.clone(), c.sql_type.clone()))
                    .collect(),
            ),
            Some(Value::Table(table)) => Some(table.casts()),
            Some(_) => None,
            None => self.descriptor(name).map(|table| table.casts()),
        }
    }

    /// Returns true if a table is known for `name`.
    #[must_use]
    pub fn has_table(&self, name: Option<&str>) -> bool {
        self.overrides.table(name).is_some() || name.is_some_and(|n| self.lookup(n).is_some())
    }

    /// Returns true if a column list can be derived for `name`.
    #[must_use]
    pub fn has_columns(&self, name: Option<&str>) -> bool {
        self.overrides.columns(name).is_some()
            || self.overrides.casts(name).is_some()
            || self.descriptor(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, StaticCatalog};

    fn catalog() -> StaticCatalog {
        StaticCatalog::new().with_table(
            TableDescriptor::new("users")
                .column(ColumnDescriptor::new("id", "bigint").with_default())
                .column(ColumnDescriptor::new("name", "text")),
        )
    }

    #[test]
    fn test_route() {
        assert_eq!(route("table"), Some((None, MetaKind::Table)));
        assert_eq!(route("x_columns"), Some((Some("x".into()), MetaKind::Columns)));
        assert_eq!(route("My_Big_Casts"), Some((Some("my_big".into()), MetaKind::Casts)));
        assert_eq!(route("_table"), None);
        assert_eq!(route("xtable"), None);
        assert_eq!(route("values"), None);
    }

    #[test]
    fn test_overrides_summary() {
        let mut overrides = Overrides::new();
        overrides.set(MetaKind::Table, None, Value::from("t"));
        overrides.set(MetaKind::Casts, Some("x".into()), Value::object([("a", "int")]));
        assert!(!overrides.is_empty());
        let summary = overrides.summary();
        assert!(summary.starts_with("{table: Text(\"t\")"));
        assert!(summary.contains("x_casts: Object"));
        overrides.clear();
        assert!(overrides.is_empty());
    }

    #[test]
    fn test_catalog_fallback() {
        let overrides = Overrides::new();
        let catalog = catalog();
        let metadata = Metadata::new(&overrides, Some(&catalog));
        assert!(metadata.has_table(Some("users")));
        assert!(!metadata.has_table(None));
        let casts = metadata.casts(Some("users")).unwrap();
        assert_eq!(casts[0], ("id".to_string(), "bigint".to_string()));
        assert!(metadata.casts(Some("other")).is_none());
    }

    #[test]
    fn test_text_table_resolves_through_catalog() {
        let mut overrides = Overrides::new();
        overrides.set(MetaKind::Table, None, Value::from("users"));
        let catalog = catalog();
        let metadata = Metadata::new(&overrides, Some(&catalog));
        let table = metadata.descriptor(None).unwrap();
        assert_eq!(table.column_names(), vec!["id", "name"]);
        assert!(metadata.has_columns(None));
    }

    #[test]
    fn test_cast_override_wins() {
        let mut overrides = Overrides::new();
        overrides.set(
            MetaKind::Casts,
            Some("users".into()),
            Value::object([("name", "varchar(20)")]),
        );
        let catalog = catalog();
        let metadata = Metadata::new(&overrides, Some(&catalog));
        let casts = metadata.casts(Some("users")).unwrap();
        assert_eq!(casts, vec![("name".to_string(), "varchar(20)".to_string())]);
    }
}
