//! SQL Dialect support.
//!
//! The quoter never escapes anything itself: literals and identifiers go
//! through a [`Dialect`], so the escaping rules are pluggable.

mod generic;
mod postgres;

pub use generic::GenericDialect;
pub use postgres::PostgresDialect;

use chrono::{DateTime, Utc};

/// A scalar handed to the dialect for literal quoting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal<'a> {
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// String.
    Text(&'a str),
    /// Point in time.
    Timestamp(&'a DateTime<Utc>),
}

/// Trait for SQL dialect-specific quoting.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Quotes an identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }

    /// Quotes a string literal, doubling single quotes.
    fn quote_string(&self, value: &str) -> String {
        let escaped = value.replace('\'', "''");
        format!("'{escaped}'")
    }

    /// Formats a timestamp for use inside a string literal.
    fn format_timestamp(&self, ts: &DateTime<Utc>) -> String {
        ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }

    /// Renders a non-finite float. Dialects without NaN/Infinity use `NULL`.
    fn non_finite_float(&self, _value: f64) -> String {
        String::from("NULL")
    }

    /// Quotes a scalar literal.
    fn quote_literal(&self, literal: Literal<'_>) -> String {
        match literal {
            Literal::Int(n) => n.to_string(),
            Literal::Float(f) if f.is_finite() => format!("{f}"),
            Literal::Float(f) => self.non_finite_float(f),
            Literal::Text(s) => self.quote_string(s),
            Literal::Timestamp(ts) => self.quote_string(&self.format_timestamp(ts)),
        }
    }

    /// Returns the positional bind marker for a one-based index.
    fn bind_marker(&self, index: usize) -> String {
        format!("${index}")
    }
}
