//! Session configuration.
//!
//! A [`Config`] is passed to each session explicitly: the quoting dialect,
//! an optional metadata catalog and the rendering [`Options`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cast::CastSyntax;
use crate::dialect::{Dialect, PostgresDialect};
use crate::schema::Catalog;

/// Which rows of a VALUES list receive per-column casts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuesCasts {
    /// Only the first row; PostgreSQL infers the rest from it.
    #[default]
    FirstRow,
    /// Every row.
    EveryRow,
}

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Accepted cast encodings.
    pub cast_syntax: CastSyntax,
    /// Rows of a VALUES list that receive explicit casts.
    pub values_casts: ValuesCasts,
    /// Type appended to JSON literals rendered without a cast.
    pub default_json_cast: String,
    /// Upper bound on resolution passes.
    pub max_passes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cast_syntax: CastSyntax::Both,
            values_casts: ValuesCasts::FirstRow,
            default_json_cast: String::from("JSONB"),
            max_passes: 64,
        }
    }
}

impl Options {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Configuration shared by the sessions that use it.
#[derive(Clone)]
pub struct Config {
    /// Literal and identifier quoting.
    pub dialect: Arc<dyn Dialect>,
    /// Table metadata provider.
    pub catalog: Option<Arc<dyn Catalog>>,
    /// Rendering options.
    pub options: Options,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: Arc::new(PostgresDialect::new()),
            catalog: None,
            options: Options::default(),
        }
    }
}

impl Config {
    /// Creates the default configuration (PostgreSQL, no catalog).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: impl Dialect + 'static) -> Self {
        self.dialect = Arc::new(dialect);
        self
    }

    /// Sets the metadata catalog.
    #[must_use]
    pub fn with_catalog(mut self, catalog: impl Catalog + 'static) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("dialect", &self.dialect.name())
            .field("catalog", &self.catalog.is_some())
            .field("options", &self.options)
            .finish()
    }
}
