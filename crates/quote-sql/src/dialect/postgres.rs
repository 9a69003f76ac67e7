//! PostgreSQL dialect.

use chrono::{DateTime, Utc};

use super::Dialect;

/// PostgreSQL quoting rules.
///
/// Assumes `standard_conforming_strings = on`, so backslashes in string
/// literals are ordinary characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Creates a new PostgreSQL dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgresql"
    }

    fn format_timestamp(&self, ts: &DateTime<Utc>) -> String {
        ts.format("%Y-%m-%d %H:%M:%S%.6f+00").to_string()
    }

    fn non_finite_float(&self, value: f64) -> String {
        let text = if value.is_nan() {
            "NaN"
        } else if value.is_sign_positive() {
            "Infinity"
        } else {
            "-Infinity"
        };
        self.quote_string(text)
    }
}
