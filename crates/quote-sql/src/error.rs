//! Error types for placeholder resolution.

use std::fmt;
use std::sync::Arc;

/// Errors raised while rendering a single placeholder.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QuoteError {
    /// The bound value cannot be rendered in the requested context.
    #[error("unsupported type for '{key}': {kind} cannot be rendered as {context}")]
    UnsupportedType {
        /// The placeholder key.
        key: String,
        /// The kind of the offending value.
        kind: &'static str,
        /// What the value was asked to become.
        context: String,
    },

    /// Positional VALUES rows do not share one length.
    #[error("all rows of '{key}' need to have the same length, got {lengths:?}")]
    InconsistentRowLength {
        /// The placeholder key.
        key: String,
        /// Distinct row lengths, in first-seen order.
        lengths: Vec<usize>,
    },

    /// Row length disagrees with the known column count.
    #[error("'{key}' has {columns} columns but rows carry {values} values")]
    ColumnCountMismatch {
        /// The placeholder key.
        key: String,
        /// Number of known columns.
        columns: usize,
        /// Number of values per row.
        values: usize,
    },

    /// No column information is available for a name.
    #[error("no columns, casts or table given for '{name}'")]
    MissingColumns {
        /// The metadata name that was looked up.
        name: String,
    },

    /// A numbered bind parameter was reused with another cast.
    #[error("bind ${index} already cast to {previous}, requested {requested}")]
    InconsistentBindCast {
        /// One-based parameter index.
        index: usize,
        /// The cast recorded first.
        previous: String,
        /// The cast of the conflicting reference.
        requested: String,
    },

    /// A bind parameter index beyond what the database accepts.
    #[error("bind index {index} exceeds the maximum of {max}")]
    BindIndexOutOfRange {
        /// The requested one-based index.
        index: usize,
        /// Largest accepted index.
        max: usize,
    },

    /// Placeholders that could not be resolved at all.
    #[error("unresolved placeholders: {}", .keys.join(", "))]
    UnresolvedReference {
        /// The unresolved keys.
        keys: Vec<String>,
    },

    /// A key was referenced with two different cast annotations.
    #[error("'{key}' is cast as {first} and as {second}")]
    ConflictingCast {
        /// The placeholder key.
        key: String,
        /// Cast of the first rendering (`none` when absent).
        first: String,
        /// Cast of the conflicting occurrence.
        second: String,
    },

    /// A VALUES list without any rows.
    #[error("'{key}' has no rows")]
    EmptyRows {
        /// The placeholder key.
        key: String,
    },

    /// Failure reported by a caller-supplied renderer.
    #[error("render of '{key}' failed: {message}")]
    Render {
        /// The placeholder key.
        key: String,
        /// Error message.
        message: String,
    },

    /// JSON encoding error.
    #[error("JSON error: {0}")]
    Json(#[source] Arc<serde_json::Error>),
}

impl From<serde_json::Error> for QuoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(Arc::new(err))
    }
}

impl QuoteError {
    /// Creates an `UnsupportedType` error.
    #[must_use]
    pub fn unsupported(key: impl Into<String>, kind: &'static str, context: impl Into<String>) -> Self {
        Self::UnsupportedType {
            key: key.into(),
            kind,
            context: context.into(),
        }
    }

    /// Short machine-friendly name of the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedType { .. } => "UnsupportedType",
            Self::InconsistentRowLength { .. } => "InconsistentRowLength",
            Self::ColumnCountMismatch { .. } => "ColumnCountMismatch",
            Self::MissingColumns { .. } => "MissingColumns",
            Self::InconsistentBindCast { .. } => "InconsistentBindCast",
            Self::BindIndexOutOfRange { .. } => "BindIndexOutOfRange",
            Self::UnresolvedReference { .. } => "UnresolvedReference",
            Self::ConflictingCast { .. } => "ConflictingCast",
            Self::EmptyRows { .. } => "EmptyRows",
            Self::Render { .. } => "Render",
            Self::Json(_) => "Json",
        }
    }
}

/// Result type for rendering operations.
pub type Result<T> = std::result::Result<T, QuoteError>;

/// A rendering failure captured against its placeholder key.
#[derive(Debug, Clone)]
pub struct CapturedError {
    /// The placeholder key.
    pub key: String,
    /// Debug rendering of the offending bound value.
    pub value: String,
    /// The underlying failure.
    pub error: QuoteError,
    /// Resolution frames leading to the failure, outermost first.
    pub trace: Vec<String>,
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} {} {{{}}}",
            self.key,
            self.error.kind(),
            self.error,
            self.value
        )?;
        for frame in &self.trace {
            writeln!(f, "  at {frame}")?;
        }
        Ok(())
    }
}

/// Aggregated failure returned when finalizing a session.
#[derive(Debug)]
pub struct ResolveError {
    /// The template as given.
    pub original: String,
    /// The template after the last resolution pass.
    pub processed: String,
    /// Summary of table, column and cast overrides.
    pub metadata: String,
    /// Per-key failures.
    pub errors: Vec<CapturedError>,
    /// Placeholders left unresolved (only populated by strict finalization).
    pub unresolved: Vec<String>,
}

impl ResolveError {
    /// Returns the captured error for a key, if any.
    #[must_use]
    pub fn for_key(&self, key: &str) -> Option<&CapturedError> {
        self.errors.iter().find(|e| e.key == key)
    }

    /// Returns true if a key failed.
    #[must_use]
    pub fn failed(&self, key: &str) -> bool {
        self.for_key(key).is_some()
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Original: {}", self.original)?;
        writeln!(f, "Metadata: {}", self.metadata)?;
        writeln!(f, "Processed: {}", self.processed)?;
        for error in &self.errors {
            writeln!(f, "{error}")?;
        }
        if !self.unresolved.is_empty() {
            let unresolved = QuoteError::UnresolvedReference {
                keys: self.unresolved.clone(),
            };
            writeln!(f, "{unresolved}")?;
        }
        write!(f, "{}", "*".repeat(40))
    }
}

impl std::error::Error for ResolveError {}
