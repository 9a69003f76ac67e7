#![allow(dead_code)]

use quote_sql::{ColumnDescriptor, Config, QuoteSql, StaticCatalog, TableDescriptor};

/// Installs a fmt subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn normalize(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Compares SQL ignoring differences in whitespace.
pub fn assert_sql_eq(actual: &str, expected: &str) {
    assert_eq!(
        normalize(actual),
        normalize(expected),
        "SQL mismatch.\n  Actual:   {actual}\n  Expected: {expected}"
    );
}

/// Resolves a session, panicking with the aggregated error on failure.
pub fn render(mut session: QuoteSql) -> String {
    init_tracing();
    session
        .to_sql()
        .unwrap_or_else(|e| panic!("Failed to resolve: {}\n{e}", session.original()))
}

pub fn users() -> TableDescriptor {
    TableDescriptor::new("users")
        .column(ColumnDescriptor::new("id", "bigint").with_default())
        .column(ColumnDescriptor::new("name", "text"))
        .column(ColumnDescriptor::new("email", "varchar(100)"))
        .column(ColumnDescriptor::new("search", "tsvector").generated())
}

pub fn fixture_catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_table(users())
        .with_table(
            TableDescriptor::new("tags")
                .column(ColumnDescriptor::new("name", "text"))
                .column(ColumnDescriptor::new("color", "text")),
        )
}

pub fn catalog_config() -> Config {
    Config::new().with_catalog(fixture_catalog())
}
