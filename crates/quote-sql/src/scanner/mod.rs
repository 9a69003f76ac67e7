//! Placeholder scanner.
//!
//! Walks a SQL template and yields every `%name` / `%{name}` occurrence,
//! together with any cast annotation attached to it. String literals
//! (including `E'...'` escape strings and `$tag$...$tag$` bodies) and
//! double-quoted identifiers are skipped, so text produced by quoting is
//! never mistaken for a placeholder.

mod span;

pub use span::Span;

use crate::cast::{CastRegistry, CastSyntax, CastType};

/// One placeholder occurrence in a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    /// The whole occurrence, including a trailing colon cast.
    pub span: Span,
    /// The placeholder name as written, lower-cased.
    pub key: String,
    /// The name with an underscore-encoded cast removed.
    pub base: String,
    /// Whether the `%{name}` spelling was used.
    pub braced: bool,
    /// Cast folded into the name (`%id__uuid`).
    pub encoded: Option<CastType>,
    /// Cast written after the placeholder (`%ids::int[]`).
    pub colon: Option<CastType>,
}

impl Occurrence {
    /// The cast governing rendering. A name-encoded cast wins over a
    /// trailing colon cast.
    #[must_use]
    pub fn cast(&self) -> Option<&CastType> {
        self.encoded.as_ref().or(self.colon.as_ref())
    }

    /// Text kept after the rendered value: the colon cast as written.
    #[must_use]
    pub fn trailer(&self) -> String {
        self.colon.as_ref().map(CastType::suffix).unwrap_or_default()
    }
}

/// An iterator over the placeholders of a template.
pub struct Scanner<'a> {
    /// The template text.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current occurrence.
    start: usize,
    /// Accepted cast encodings.
    syntax: CastSyntax,
    registry: &'static CastRegistry,
}

impl<'a> Scanner<'a> {
    /// Creates a scanner accepting both cast encodings.
    #[must_use]
    pub fn new(input: &'a str) -> Self {
        Self::with_syntax(input, CastSyntax::default())
    }

    /// Creates a scanner accepting the given cast encodings.
    #[must_use]
    pub fn with_syntax(input: &'a str, syntax: CastSyntax) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
            syntax,
            registry: CastRegistry::global(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Skips a quoted section, honouring doubled quote escapes. An
    /// unterminated section runs to the end of the input.
    fn skip_quoted(&mut self, quote: char) {
        self.advance();
        while let Some(c) = self.advance() {
            if c == quote {
                if self.peek() == Some(quote) {
                    self.advance();
                } else {
                    return;
                }
            }
        }
    }

    /// Whether the character before the current position ends a word, so
    /// a prefix or tag starting here is not part of an identifier.
    fn at_word_start(&self) -> bool {
        !self.input[..self.pos]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
    }

    /// Skips an `E'...'` escape string, where a backslash escapes the next
    /// character. The current position is on the `E`.
    fn skip_escape_string(&mut self) {
        self.advance();
        self.advance();
        while let Some(c) = self.advance() {
            match c {
                '\\' => {
                    self.advance();
                }
                '\'' if self.peek() == Some('\'') => {
                    self.advance();
                }
                '\'' => return,
                _ => {}
            }
        }
    }

    /// The length of a dollar-quote delimiter (`$$` or `$tag$`) at the
    /// current position, if there is one.
    fn dollar_tag_len(&self) -> Option<usize> {
        let rest = self.input[self.pos..].strip_prefix('$')?;
        let tag_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let tag = &rest[..tag_len];
        if tag.starts_with(|c: char| c.is_ascii_digit()) || !rest[tag_len..].starts_with('$') {
            return None;
        }
        Some(tag_len + 2)
    }

    /// Skips a dollar-quoted body up to the matching delimiter. An
    /// unterminated body runs to the end of the input.
    fn skip_dollar_quoted(&mut self, len: usize) {
        let input = self.input;
        let delimiter = &input[self.pos..self.pos + len];
        let body = self.pos + len;
        self.pos = input[body..]
            .find(delimiter)
            .map_or(self.input.len(), |end| body + end + len);
    }

    /// Scans a placeholder name after the `%`. Returns `None` and rewinds
    /// to just after the `%` when no valid placeholder follows.
    fn scan_placeholder(&mut self) -> Option<Occurrence> {
        let braced = self.peek() == Some('{');
        if braced {
            self.advance();
        }

        let name_start = self.pos;
        if !self.peek().is_some_and(|c| c.is_ascii_alphabetic()) {
            self.pos = self.start + 1;
            return None;
        }
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            self.advance();
        }
        let key = self.input[name_start..self.pos].to_ascii_lowercase();

        if braced {
            if self.peek() != Some('}') {
                self.pos = self.start + 1;
                return None;
            }
            self.advance();
        }

        let colon = if self.syntax.colon() {
            self.registry
                .match_colon(&self.input[self.pos..])
                .map(|(cast, len)| {
                    self.pos += len;
                    cast
                })
        } else {
            None
        };

        let (base, encoded) = if self.syntax.underscore() {
            self.registry
                .detect_underscore(&key)
                .map_or_else(|| (key.clone(), None), |(base, cast)| (base, Some(cast)))
        } else {
            (key.clone(), None)
        };

        Some(Occurrence {
            span: Span::new(self.start, self.pos),
            key,
            base,
            braced,
            encoded,
            colon,
        })
    }
}

impl Iterator for Scanner<'_> {
    type Item = Occurrence;

    fn next(&mut self) -> Option<Occurrence> {
        while let Some(c) = self.peek() {
            match c {
                '\'' | '"' => self.skip_quoted(c),
                'E' | 'e' if self.peek_next() == Some('\'') && self.at_word_start() => {
                    self.skip_escape_string();
                }
                '$' if self.at_word_start() => match self.dollar_tag_len() {
                    Some(len) => self.skip_dollar_quoted(len),
                    None => {
                        self.advance();
                    }
                },
                '%' if self.peek_next().is_some() => {
                    self.start = self.pos;
                    self.advance();
                    if let Some(occurrence) = self.scan_placeholder() {
                        return Some(occurrence);
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
        None
    }
}

/// Scans all placeholder occurrences, accepting both cast encodings.
#[must_use]
pub fn scan(text: &str) -> Vec<Occurrence> {
    Scanner::new(text).collect()
}

/// The distinct placeholder keys of a template, in first-seen order.
#[must_use]
pub fn keys(text: &str, syntax: CastSyntax) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for occurrence in Scanner::with_syntax(text, syntax) {
        if !keys.contains(&occurrence.key) {
            keys.push(occurrence.key);
        }
    }
    keys
}
