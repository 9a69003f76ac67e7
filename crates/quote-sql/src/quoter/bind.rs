//! Positional bind parameters.
//!
//! `%bind` allocates the next free index, `%bind3` refers to index 3. The cast
//! of each index is recorded by the first occurrence that carries one.

use tracing::trace;

use crate::cast::CastType;
use crate::error::{QuoteError, Result};

/// Largest positional parameter index (PostgreSQL's protocol limit).
pub const MAX_BIND_INDEX: usize = 65_535;

/// Parses a bind key: `bind` yields `Some(None)`, `bind7` yields
/// `Some(Some(7))`. Other keys, and `bind0`, yield `None`. Digit runs too
/// long for `usize` saturate so that they are rejected by [`BindList`].
#[must_use]
pub fn parse_bind(key: &str) -> Option<Option<usize>> {
    let rest = key.strip_prefix("bind")?;
    if rest.is_empty() {
        return Some(None);
    }
    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(rest.parse::<usize>().unwrap_or(usize::MAX))
        .filter(|index| *index >= 1)
        .map(Some)
}

/// The casts recorded for each positional parameter, in index order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindList {
    casts: Vec<Option<CastType>>,
}

fn same_cast(a: &CastType, b: &CastType) -> bool {
    a.as_str().eq_ignore_ascii_case(b.as_str())
}

const fn check_index(index: usize) -> Result<usize> {
    if index > MAX_BIND_INDEX {
        return Err(QuoteError::BindIndexOutOfRange {
            index,
            max: MAX_BIND_INDEX,
        });
    }
    Ok(index)
}

impl BindList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.casts.len()
    }

    /// Returns true if no parameter has been allocated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.casts.is_empty()
    }

    /// The cast of each parameter; `None` where no cast was given.
    #[must_use]
    pub fn casts(&self) -> &[Option<CastType>] {
        &self.casts
    }

    /// Allocates the next index. Returns it and whether this occurrence
    /// governs the cast.
    pub fn allocate(&mut self, cast: Option<&CastType>) -> Result<(usize, bool)> {
        let index = check_index(self.casts.len() + 1)?;
        self.casts.push(cast.cloned());
        trace!(index, cast = ?cast.map(CastType::as_str), "allocated bind");
        Ok((index, cast.is_some()))
    }

    /// Refers to a fixed index. Returns whether this occurrence governs the
    /// cast; fails if the index already has a different cast.
    pub fn numbered(&mut self, index: usize, cast: Option<&CastType>) -> Result<bool> {
        let index = check_index(index.max(1))?;
        if self.casts.len() < index {
            self.casts.resize(index, None);
        }
        match (self.casts[index - 1].clone(), cast) {
            (_, None) => Ok(false),
            (None, Some(cast)) => {
                trace!(index, cast = cast.as_str(), "recorded bind cast");
                self.casts[index - 1] = Some(cast.clone());
                Ok(true)
            }
            (Some(previous), Some(cast)) if same_cast(&previous, cast) => Ok(false),
            (Some(previous), Some(cast)) => Err(QuoteError::InconsistentBindCast {
                index,
                previous: previous.as_str().to_string(),
                requested: cast.as_str().to_string(),
            }),
        }
    }

    /// Forgets all parameters.
    pub fn clear(&mut self) {
        self.casts.clear();
    }
}
