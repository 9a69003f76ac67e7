//! Table and column metadata.
//!
//! Descriptors are read-only inputs: they tell the quoter which columns a
//! table has, their SQL types, and which ones must be left to the database
//! (defaults, generated columns). A [`Catalog`] supplies them by table name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Metadata for one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Column name.
    pub name: String,
    /// SQL type name, e.g. `integer` or `varchar(20)`.
    pub sql_type: String,
    /// Whether the database supplies a default.
    #[serde(default)]
    pub has_default: bool,
    /// Whether the column is virtual/computed and must not be written.
    #[serde(default, alias = "generated")]
    pub is_virtual: bool,
}

impl ColumnDescriptor {
    /// Creates a column descriptor.
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            has_default: false,
            is_virtual: false,
        }
    }

    /// Marks the column as having a database default.
    #[must_use]
    pub const fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    /// Marks the column as virtual/computed.
    #[must_use]
    pub const fn generated(mut self) -> Self {
        self.is_virtual = true;
        self
    }
}

/// Metadata for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// Table name, optionally schema-qualified.
    pub name: String,
    /// Columns in table order.
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDescriptor {
    /// Creates a table descriptor without columns.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Appends a column.
    #[must_use]
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// All column names in table order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Columns that can be written (virtual/computed ones removed).
    pub fn writable_columns(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.is_virtual)
    }

    /// Column name to SQL type pairs in table order.
    #[must_use]
    pub fn casts(&self) -> Vec<(String, String)> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.sql_type.clone()))
            .collect()
    }
}

/// Implemented by `#[derive(Table)]` types.
pub trait Table {
    /// The SQL table name.
    const NAME: &'static str;

    /// Returns the table's descriptor.
    fn descriptor() -> TableDescriptor;
}

/// A provider of table metadata.
pub trait Catalog: Send + Sync {
    /// Looks up a table by name.
    fn table(&self, name: &str) -> Option<TableDescriptor>;
}

/// An in-memory catalog, loadable from JSON.
///
/// The JSON form maps table names to column lists:
///
/// ```json
/// { "users": [ { "name": "id", "sql_type": "bigint", "has_default": true } ] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticCatalog {
    tables: BTreeMap<String, Vec<ColumnDescriptor>>,
}

impl StaticCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a table.
    #[must_use]
    pub fn with_table(mut self, table: TableDescriptor) -> Self {
        self.insert(table);
        self
    }

    /// Adds or replaces a table.
    pub fn insert(&mut self, table: TableDescriptor) {
        self.tables.insert(table.name, table.columns);
    }

    /// Parses a catalog from its JSON form.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }
}

impl Catalog for StaticCatalog {
    fn table(&self, name: &str) -> Option<TableDescriptor> {
        self.tables.get(name).map(|columns| TableDescriptor {
            name: name.to_string(),
            columns: columns.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> TableDescriptor {
        TableDescriptor::new("users")
            .column(ColumnDescriptor::new("id", "bigint").with_default())
            .column(ColumnDescriptor::new("name", "text"))
            .column(ColumnDescriptor::new("search", "tsvector").generated())
    }

    #[test]
    fn test_writable_columns_skip_virtual() {
        let table = users();
        let writable: Vec<&str> = table.writable_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(writable, vec!["id", "name"]);
        assert_eq!(table.column_names(), vec!["id", "name", "search"]);
    }

    #[test]
    fn test_casts_in_table_order() {
        let casts = users().casts();
        assert_eq!(casts[0], ("id".to_string(), "bigint".to_string()));
        assert_eq!(casts[2], ("search".to_string(), "tsvector".to_string()));
    }

    #[test]
    fn test_static_catalog_lookup() {
        let catalog = StaticCatalog::new().with_table(users());
        let table = catalog.table("users").unwrap();
        assert_eq!(table, users());
        assert!(catalog.table("missing").is_none());
        assert_eq!(catalog.table_names().collect::<Vec<_>>(), vec!["users"]);
    }

    #[test]
    fn test_static_catalog_from_json() {
        let catalog = StaticCatalog::from_json(
            r#"{
                "events": [
                    {"name": "id", "sql_type": "uuid", "has_default": true},
                    {"name": "payload", "sql_type": "jsonb"},
                    {"name": "day", "sql_type": "date", "generated": true}
                ]
            }"#,
        )
        .unwrap();
        let events = catalog.table("events").unwrap();
        assert!(events.columns[0].has_default);
        assert!(!events.columns[1].is_virtual);
        assert!(events.columns[2].is_virtual);
    }
}
