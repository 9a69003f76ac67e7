//! Fixpoint resolution of placeholders.
//!
//! Each pass scans an immutable snapshot of the working text, renders every
//! resolvable occurrence and builds the next text. Rendered output may
//! contain further placeholders, which later passes expand. Resolution
//! stops when no placeholder is left, when a pass leaves the set of
//! pending keys unchanged, or at the configured pass limit.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, trace, warn};

use crate::cast::{CastEncoding, CastSyntax, CastType};
use crate::config::Config;
use crate::error::{CapturedError, QuoteError};
use crate::metadata::{Metadata, Overrides};
use crate::quoter::{name_of, parse_bind, BindList, Quoter, Route};
use crate::scanner::{self, Occurrence, Scanner};
use crate::value::Value;

/// Everything a pass reads but never changes.
pub(crate) struct Env<'a> {
    pub config: &'a Config,
    pub bindings: &'a HashMap<String, Value>,
    pub overrides: &'a Overrides,
}

impl<'a> Env<'a> {
    fn metadata(&self) -> Metadata<'a> {
        Metadata::new(self.overrides, self.config.catalog.as_deref())
    }

    /// The binding for an occurrence: by name without an encoded cast,
    /// else by the name as written.
    fn value(&self, occurrence: &Occurrence) -> Option<&'a Value> {
        self.bindings
            .get(&occurrence.base)
            .or_else(|| self.bindings.get(&occurrence.key))
    }

    /// Whether the occurrence can be rendered at all: it has a binding, or
    /// it asks for table/column metadata that exists.
    fn is_resolvable(&self, occurrence: &Occurrence) -> bool {
        if self.value(occurrence).is_some() {
            return true;
        }
        let name = name_of(&occurrence.base);
        match Route::for_key(&occurrence.base) {
            Route::Table => self.metadata().has_table(name),
            Route::Columns => self.metadata().has_columns(name),
            _ => false,
        }
    }
}

/// The SQL produced for one key and the placeholders found inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderResult {
    /// Rendered SQL text.
    pub sql: String,
    /// Placeholder keys contained in `sql`, in first-seen order.
    pub discovered: Vec<String>,
}

#[derive(Debug, Clone)]
struct Cached {
    cast: Option<CastType>,
    outcome: Result<RenderResult, CapturedError>,
}

/// The result of one [`Resolver::resolve`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// The text after the last pass.
    pub sql: String,
    /// Number of passes run.
    pub passes: usize,
    /// Placeholder keys still present in `sql`.
    pub pending: BTreeSet<String>,
}

/// Per-session resolution state: the render cache, failures that are not
/// tied to a cached render, and the positional bind list.
#[derive(Debug, Default)]
pub struct Resolver {
    cache: HashMap<String, Cached>,
    failures: BTreeMap<String, CapturedError>,
    binds: BindList,
    origins: HashMap<String, String>,
}

fn pending(text: &str, syntax: CastSyntax) -> BTreeSet<String> {
    scanner::keys(text, syntax).into_iter().collect()
}

/// Casts match when written the same way with the same type text.
fn same_cast(a: Option<&CastType>, b: Option<&CastType>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.encoding() == b.encoding() && a.as_str().eq_ignore_ascii_case(b.as_str()),
        _ => false,
    }
}

fn cast_name(cast: Option<&CastType>) -> String {
    cast.map_or_else(|| String::from("none"), |c| c.as_str().to_ascii_lowercase())
}

impl Resolver {
    /// Creates empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The positional bind list.
    #[must_use]
    pub const fn binds(&self) -> &BindList {
        &self.binds
    }

    /// The cached render for a key, if it succeeded.
    #[must_use]
    pub fn rendered(&self, key: &str) -> Option<&RenderResult> {
        self.cache.get(key).and_then(|cached| cached.outcome.as_ref().ok())
    }

    /// All captured errors, ordered by key.
    #[must_use]
    pub fn errors(&self) -> Vec<&CapturedError> {
        let mut errors: Vec<&CapturedError> = self
            .cache
            .values()
            .filter_map(|cached| cached.outcome.as_ref().err())
            .chain(self.failures.values())
            .collect();
        errors.sort_by(|a, b| a.key.cmp(&b.key));
        errors
    }

    /// Returns true if any key failed.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty() || self.cache.values().any(|cached| cached.outcome.is_err())
    }

    /// Keys with a captured error.
    #[must_use]
    pub fn failed_keys(&self) -> BTreeSet<String> {
        self.errors().into_iter().map(|e| e.key.clone()).collect()
    }

    /// Forgets cached renders, failures and binds.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.failures.clear();
        self.binds.clear();
        self.origins.clear();
    }

    /// Runs passes over `text` until a fixpoint.
    pub(crate) fn resolve(&mut self, text: &str, env: &Env<'_>) -> Resolution {
        let syntax = env.config.options.cast_syntax;
        let max_passes = env.config.options.max_passes;
        let mut sql = text.to_string();
        let mut unresolved = pending(&sql, syntax);
        let mut passes = 0;

        while !unresolved.is_empty() {
            if passes >= max_passes {
                warn!(passes, pending = unresolved.len(), "Pass limit reached");
                break;
            }
            passes += 1;
            debug!(pass = passes, unresolved = unresolved.len(), "Resolution pass");

            sql = self.pass(&sql, passes, env);
            let next = pending(&sql, syntax);
            if next == unresolved {
                break;
            }
            unresolved = next;
        }

        if unresolved.is_empty() {
            debug!(passes, "All placeholders resolved");
        } else {
            debug!(passes, pending = ?unresolved, "Resolution stuck");
        }

        Resolution {
            sql,
            passes,
            pending: unresolved,
        }
    }

    fn pass(&mut self, text: &str, pass: usize, env: &Env<'_>) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for occurrence in Scanner::with_syntax(text, env.config.options.cast_syntax) {
            out.push_str(&text[last..occurrence.span.start]);
            last = occurrence.span.end;
            match self.render(&occurrence, pass, env) {
                Some(sql) => out.push_str(&sql),
                None => out.push_str(occurrence.span.slice(text)),
            }
        }
        out.push_str(&text[last..]);
        out
    }

    /// Renders one occurrence into its replacement text: the value, the
    /// colon cast as written and any array dimensions that cast lacks.
    fn render(&mut self, occurrence: &Occurrence, pass: usize, env: &Env<'_>) -> Option<String> {
        if let Some(number) = parse_bind(&occurrence.base) {
            let sql = self.render_bind(occurrence, number, pass, env)?;
            return Some(sql + &occurrence.trailer());
        }
        if !env.is_resolvable(occurrence) {
            trace!(key = %occurrence.key, "Placeholder not resolvable");
            return None;
        }

        let value = env.value(occurrence);
        let cast = occurrence.cast();
        let quoter = Quoter::new(
            env.config,
            env.metadata(),
            &occurrence.key,
            &occurrence.base,
            cast,
            value,
        );
        let route = quoter.route();
        let trailer = occurrence.trailer() + &"[]".repeat(quoter.missing_array_dims());

        if let Some(cached) = self.cache.get(&occurrence.base) {
            let first = cached.outcome.as_ref().ok().map(|r| r.sql.clone())?;
            if same_cast(cached.cast.as_ref(), cast) {
                return Some(first + &trailer);
            }
            let first_cast = cast_name(cached.cast.as_ref());
            return match quoter.render() {
                Ok(sql) if sql == first => Some(sql + &trailer),
                Ok(_) => {
                    let error = QuoteError::ConflictingCast {
                        key: occurrence.base.clone(),
                        first: first_cast,
                        second: cast_name(cast),
                    };
                    self.record_failure(occurrence, value, error, route, pass);
                    None
                }
                Err(error) => {
                    self.record_failure(occurrence, value, error, route, pass);
                    None
                }
            };
        }

        let outcome = match quoter.render() {
            Ok(sql) => {
                trace!(key = %occurrence.key, route = %route, "Rendered placeholder");
                let discovered = scanner::keys(&sql, env.config.options.cast_syntax);
                for key in &discovered {
                    self.origins
                        .entry(key.clone())
                        .or_insert_with(|| occurrence.key.clone());
                }
                Ok(RenderResult { sql, discovered })
            }
            Err(error) => {
                warn!(key = %occurrence.key, route = %route, error = %error, "Placeholder failed");
                Err(self.capture(occurrence, value, error, route, pass))
            }
        };

        let sql = outcome.as_ref().ok().map(|r| r.sql.clone() + &trailer);
        self.cache.insert(
            occurrence.base.clone(),
            Cached {
                cast: cast.cloned(),
                outcome,
            },
        );
        sql
    }

    /// Captures an error for an occurrence once; later passes keep the
    /// first one.
    fn record_failure(
        &mut self,
        occurrence: &Occurrence,
        value: Option<&Value>,
        error: QuoteError,
        route: Route,
        pass: usize,
    ) {
        if !self.failures.contains_key(&occurrence.key) {
            warn!(key = %occurrence.key, route = %route, error = %error, "Placeholder failed");
            let captured = self.capture(occurrence, value, error, route, pass);
            self.failures.insert(occurrence.key.clone(), captured);
        }
    }

    fn render_bind(
        &mut self,
        occurrence: &Occurrence,
        number: Option<usize>,
        pass: usize,
        env: &Env<'_>,
    ) -> Option<String> {
        let cast = occurrence.cast();
        let allocated = match number {
            None => self.binds.allocate(cast),
            Some(index) => self
                .binds
                .numbered(index, cast)
                .map(|governs| (index, governs)),
        };

        match allocated {
            Ok((index, governs)) => {
                let mut sql = env.config.dialect.bind_marker(index);
                if governs {
                    if let Some(cast) = cast.filter(|c| c.encoding() == CastEncoding::Underscore) {
                        sql.push_str(&cast.suffix());
                    }
                }
                Some(sql)
            }
            Err(error) => {
                self.record_failure(occurrence, None, error, Route::Quote, pass);
                None
            }
        }
    }

    /// Builds the captured error with its resolution frames: the failing
    /// pass and route, then each key whose output introduced it.
    fn capture(
        &self,
        occurrence: &Occurrence,
        value: Option<&Value>,
        error: QuoteError,
        route: Route,
        pass: usize,
    ) -> CapturedError {
        let mut trace = vec![format!("pass {pass}: %{} ({route})", occurrence.key)];
        let mut seen = HashSet::from([occurrence.key.clone()]);
        let mut current = &occurrence.key;
        while let Some(parent) = self.origins.get(current) {
            if !seen.insert(parent.clone()) {
                break;
            }
            trace.push(format!("introduced by %{parent}"));
            current = parent;
        }

        CapturedError {
            key: occurrence.key.clone(),
            value: value.map_or_else(|| String::from("none"), |v| format!("{v:?}")),
            error,
            trace,
        }
    }
}
