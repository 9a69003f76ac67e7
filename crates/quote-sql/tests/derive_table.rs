//! Tests for the `#[derive(Table)]` macro output.
//!
//! These tests verify that the derive macro generates a correct
//! `quote_sql::schema::Table` implementation: table name, column names,
//! inferred and explicit SQL types, and default/generated flags.

mod common;
use common::*;

use quote_sql::schema::Table;
use quote_sql::{ColumnDescriptor, Config, QuoteSql, StaticCatalog, Value};
use quote_sql_derive::Table;
use serde_json::json;

// =============================================================================
// Test: Basic struct with default table name (snake_case)
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Clone, Table)]
pub struct UserAccount {
    #[column(default)]
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub active: bool,
}

#[test]
fn test_default_table_name() {
    assert_eq!(UserAccount::NAME, "user_account");
    assert_eq!(UserAccount::descriptor().name, "user_account");
}

#[test]
fn test_inferred_columns() {
    let table = UserAccount::descriptor();
    assert_eq!(table.column_names(), vec!["id", "name", "email", "active"]);
    assert_eq!(
        table.columns[0],
        ColumnDescriptor::new("id", "bigint").with_default()
    );
    assert_eq!(table.columns[2].sql_type, "text");
    assert_eq!(table.columns[3].sql_type, "boolean");
}

// =============================================================================
// Test: Explicit names, types, generated and skipped fields
// =============================================================================

#[allow(dead_code)]
#[derive(Debug, Table)]
#[table(name = "posts")]
pub struct Post {
    #[column(default)]
    pub id: i32,
    #[column(name = "title_text", sql_type = "varchar(200)")]
    pub title: String,
    pub tags: Vec<String>,
    pub body: serde_json::Value,
    pub published_at: Option<chrono::DateTime<chrono::Utc>>,
    #[column(generated, sql_type = "tsvector")]
    pub search: String,
    #[column(skip)]
    pub cached: Option<Box<Post>>,
}

#[test]
fn test_explicit_attributes() {
    assert_eq!(Post::NAME, "posts");
    let table = Post::descriptor();
    let casts = table.casts();
    assert_eq!(
        casts,
        vec![
            ("id".to_string(), "integer".to_string()),
            ("title_text".to_string(), "varchar(200)".to_string()),
            ("tags".to_string(), "text[]".to_string()),
            ("body".to_string(), "jsonb".to_string()),
            ("published_at".to_string(), "timestamptz".to_string()),
            ("search".to_string(), "tsvector".to_string()),
        ]
    );
    assert!(table.columns[0].has_default);
    assert!(table.columns[5].is_virtual);
    let writable: Vec<&str> = table.writable_columns().map(|c| c.name.as_str()).collect();
    assert!(!writable.contains(&"search"));
}

// =============================================================================
// Test: Derived descriptors drive templates
// =============================================================================

#[test]
fn test_descriptor_as_table_binding() {
    let sql = render(
        QuoteSql::new("INSERT INTO %table %values RETURNING id")
            .bind("table", Post::descriptor())
            .bind("values", json!({"title_text": "Hello", "tags": ["a"]})),
    );
    assert_eq!(
        sql,
        r#"INSERT INTO "posts" ("id","title_text","tags","body","published_at") VALUES (DEFAULT,'Hello','["a"]',DEFAULT,DEFAULT) RETURNING id"#
    );
}

#[test]
fn test_descriptor_in_catalog() {
    let catalog = StaticCatalog::new()
        .with_table(UserAccount::descriptor())
        .with_table(Post::descriptor());
    let sql = render(
        QuoteSql::with_config(
            "SELECT %user_account_columns FROM %user_account_table",
            Config::new().with_catalog(catalog),
        ),
    );
    assert_eq!(
        sql,
        r#"SELECT "id","name","email","active" FROM "user_account""#
    );
}

#[test]
fn test_descriptor_columns_as_typed_values() {
    let sql = render(
        QuoteSql::new("SELECT * FROM %u_values")
            .bind("u_columns", Value::columns(UserAccount::descriptor().columns))
            .bind("u_values", json!([{"id": 1, "name": "a"}, {"id": 2}])),
    );
    assert_eq!(
        sql,
        r#"SELECT * FROM (VALUES (1::BIGINT,'a'::TEXT,NULL::TEXT,NULL::BOOLEAN),(2,NULL,NULL,NULL)) AS "u" ("id","name","email","active")"#
    );
}
