//! The query session: one template, its bindings and its resolution state.

use std::collections::HashMap;

use crate::cast::CastType;
use crate::config::Config;
use crate::error::{CapturedError, ResolveError};
use crate::metadata::{self, MetaKind, Overrides};
use crate::resolve::{Env, Resolver};
use crate::scanner;
use crate::value::Value;

/// A SQL template with named placeholders.
///
/// # Example
///
/// ```rust
/// use quote_sql::QuoteSql;
///
/// let sql = QuoteSql::new("SELECT * FROM %table WHERE name = %name")
///     .bind("table", "users")
///     .bind("name", "O'Brien")
///     .to_sql()
///     .unwrap();
///
/// assert_eq!(sql, r#"SELECT * FROM "users" WHERE name = 'O''Brien'"#);
/// ```
#[derive(Debug)]
pub struct QuoteSql {
    original: String,
    sql: String,
    bindings: HashMap<String, Value>,
    overrides: Overrides,
    config: Config,
    resolver: Resolver,
}

impl QuoteSql {
    /// Creates a session with the default configuration.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self::with_config(sql, Config::default())
    }

    /// Creates a session with an explicit configuration.
    #[must_use]
    pub fn with_config(sql: impl Into<String>, config: Config) -> Self {
        let original = sql.into();
        Self {
            sql: original.clone(),
            original,
            bindings: HashMap::new(),
            overrides: Overrides::new(),
            config,
            resolver: Resolver::new(),
        }
    }

    /// Binds a value to a placeholder key.
    ///
    /// Keys are case-insensitive. Keys ending in `table`, `columns` or
    /// `casts` describe metadata for the name before the suffix and are
    /// stored as overrides rather than values.
    #[must_use]
    pub fn bind(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Binds every key/value pair, as [`QuoteSql::bind`] does one at a time.
    #[must_use]
    pub fn bind_all<K, V, I>(mut self, bindings: I) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in bindings {
            self.set(key.as_ref(), value);
        }
        self
    }

    /// Binds a value in place. See [`QuoteSql::bind`].
    ///
    /// A key that was already rendered keeps its rendering until
    /// [`QuoteSql::reset`].
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> &mut Self {
        let key = key.to_ascii_lowercase();
        match metadata::route(&key) {
            Some((name, kind)) => self.overrides.set(kind, name, value.into()),
            None => {
                self.bindings.insert(key, value.into());
            }
        }
        self
    }

    /// Sets the table for `name` (`None` for the bare `table` key).
    #[must_use]
    pub fn table(mut self, name: Option<&str>, value: impl Into<Value>) -> Self {
        self.overrides.set(MetaKind::Table, lowercase(name), value.into());
        self
    }

    /// Sets the column list for `name`.
    #[must_use]
    pub fn columns(mut self, name: Option<&str>, value: impl Into<Value>) -> Self {
        self.overrides.set(MetaKind::Columns, lowercase(name), value.into());
        self
    }

    /// Sets the column casts for `name`.
    #[must_use]
    pub fn casts(mut self, name: Option<&str>, value: impl Into<Value>) -> Self {
        self.overrides.set(MetaKind::Casts, lowercase(name), value.into());
        self
    }

    /// The template as given.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The template after the last resolution.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// The value bound to `key`.
    #[must_use]
    pub fn binding(&self, key: &str) -> Option<&Value> {
        self.bindings.get(&key.to_ascii_lowercase())
    }

    /// The cast of each positional bind parameter, by index minus one.
    #[must_use]
    pub fn binds(&self) -> &[Option<CastType>] {
        self.resolver.binds().casts()
    }

    /// Resolves placeholders until a fixpoint and returns the working text.
    ///
    /// Failures are recorded, not returned; see [`QuoteSql::errors`].
    pub fn resolve(&mut self) -> &str {
        let env = Env {
            config: &self.config,
            bindings: &self.bindings,
            overrides: &self.overrides,
        };
        let resolution = self.resolver.resolve(&self.sql, &env);
        self.sql = resolution.sql;
        &self.sql
    }

    /// Resolves and returns the SQL.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if any placeholder failed to render.
    /// Placeholders without a binding stay in the text and are not an error.
    pub fn to_sql(&mut self) -> Result<String, ResolveError> {
        self.resolve();
        if self.has_errors() {
            return Err(self.failure(Vec::new()));
        }
        Ok(self.sql.clone())
    }

    /// Resolves and returns the SQL, requiring every placeholder resolved.
    ///
    /// # Errors
    ///
    /// Returns a [`ResolveError`] if any placeholder failed to render or
    /// remains unresolved.
    pub fn to_sql_strict(&mut self) -> Result<String, ResolveError> {
        self.resolve();
        let unresolved = self.unresolved();
        if self.has_errors() || !unresolved.is_empty() {
            return Err(self.failure(unresolved));
        }
        Ok(self.sql.clone())
    }

    /// Captured per-key errors, ordered by key.
    #[must_use]
    pub fn errors(&self) -> Vec<&CapturedError> {
        self.resolver.errors()
    }

    /// Returns true if any placeholder failed to render.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.resolver.has_errors()
    }

    /// Placeholders still in the working text that did not fail, sorted.
    #[must_use]
    pub fn unresolved(&self) -> Vec<String> {
        let failed = self.resolver.failed_keys();
        let mut keys: Vec<String> = scanner::keys(&self.sql, self.config.options.cast_syntax)
            .into_iter()
            .filter(|key| !failed.contains(key))
            .collect();
        keys.sort();
        keys
    }

    /// Restores the original template and forgets all renders, errors and
    /// binds. Bindings and overrides are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.sql.clone_from(&self.original);
        self.resolver.clear();
        self
    }

    fn failure(&self, unresolved: Vec<String>) -> ResolveError {
        ResolveError {
            original: self.original.clone(),
            processed: self.sql.clone(),
            metadata: self.overrides.summary(),
            errors: self.errors().into_iter().cloned().collect(),
            unresolved,
        }
    }
}

fn lowercase(name: Option<&str>) -> Option<String> {
    name.map(str::to_ascii_lowercase)
}

/// Starts a [`QuoteSql`] session straight from SQL text.
///
/// ```rust
/// use quote_sql::QuoteSqlExt;
///
/// let sql = "SELECT %a".qsql().bind("a", 1).to_sql().unwrap();
/// assert_eq!(sql, "SELECT 1");
/// ```
pub trait QuoteSqlExt {
    /// A session over this text with the default configuration.
    fn quote_sql(&self) -> QuoteSql;

    /// A session over this text with an explicit configuration.
    fn quote_sql_with(&self, config: Config) -> QuoteSql;

    /// Short for [`QuoteSqlExt::quote_sql`].
    fn qsql(&self) -> QuoteSql {
        self.quote_sql()
    }
}

impl QuoteSqlExt for str {
    fn quote_sql(&self) -> QuoteSql {
        QuoteSql::new(self)
    }

    fn quote_sql_with(&self, config: Config) -> QuoteSql {
        QuoteSql::with_config(self, config)
    }
}
