//! SQL type-cast recognition.
//!
//! Placeholders may carry an explicit cast in one of two encodings:
//!
//! - colon style, written right after the placeholder: `%ids::int[]`
//! - underscore style, folded into the key: `%ids__int_array`,
//!   `%price__numeric_10_2`, `%at__timestamp_with_time_zone`
//!
//! Colon casts stay in the SQL text verbatim. Underscore casts are decoded
//! into canonical upper-case type text and appended by the renderer.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed catalog of recognized SQL type names. Longer spellings come
/// before their prefixes, the regex engine prefers earlier alternatives.
const DATA_TYPES: &[&str] = &[
    r"(?:character\s+varying|bit\s+varying|character|varbit|varchar|char|bit|interval)(?:\s*\(\s*\d+\s*\))?",
    r"(?:numeric|decimal)(?:\s*\(\s*\d+\s*(?:,\s*\d+\s*)?\))?",
    r"timestamptz",
    r"timetz",
    r"time(?:stamp)?(?:\s*\(\s*\d+\s*\))?(?:\s+with(?:out)?\s+time\s+zone)?",
    r"integer",
    r"(?:small|big)(?:int|serial)",
    r"(?:date|int[48]|num|ts(?:tz)?)(?:multi)?range",
    r"bool(?:ean)?",
    r"box",
    r"bytea",
    r"cidr",
    r"circle",
    r"date",
    r"macaddr8?",
    r"ts(?:query|vector)",
    r"float[48]?",
    r"(?:int|serial)[248]?",
    r"double\s+precision",
    r"jsonb",
    r"json",
    r"inet",
    r"line",
    r"lseg",
    r"money",
    r"path",
    r"pg_lsn",
    r"pg_snapshot",
    r"txid_snapshot",
    r"point",
    r"polygon",
    r"real",
    r"text",
    r"uuid",
    r"xml",
    r"hstore",
];

/// How a cast was written in the template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastEncoding {
    /// `%key::type[]`, kept verbatim in the output.
    Colon,
    /// `%key__type_array`, rendered as `::TYPE[]`.
    Underscore,
}

/// Which cast encodings the scanner accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastSyntax {
    /// Accept both encodings.
    #[default]
    Both,
    /// Only `::type`.
    Colon,
    /// Only `__type`.
    Underscore,
}

impl CastSyntax {
    /// Returns true if colon casts are recognized.
    #[must_use]
    pub const fn colon(self) -> bool {
        matches!(self, Self::Both | Self::Colon)
    }

    /// Returns true if underscore casts are recognized.
    #[must_use]
    pub const fn underscore(self) -> bool {
        matches!(self, Self::Both | Self::Underscore)
    }
}

/// A recognized SQL type annotation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CastType {
    text: String,
    base: String,
    dims: usize,
    encoding: CastEncoding,
}

impl CastType {
    /// The full type text, including array brackets (`int[]`, `NUMERIC(10,2)`).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The element type without array brackets.
    #[must_use]
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Number of array dimensions declared.
    #[must_use]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// How the cast was written.
    #[must_use]
    pub const fn encoding(&self) -> CastEncoding {
        self.encoding
    }

    /// Returns true for `json` and `jsonb` (including their arrays).
    #[must_use]
    pub fn is_json(&self) -> bool {
        let base = self.base.to_ascii_lowercase();
        base.ends_with("json") || base.ends_with("jsonb")
    }

    /// Returns true for a plain `json`/`jsonb` cast without array brackets.
    #[must_use]
    pub fn is_json_scalar(&self) -> bool {
        self.dims == 0 && self.is_json()
    }

    /// Returns true for `hstore`.
    #[must_use]
    pub fn is_hstore(&self) -> bool {
        self.base.eq_ignore_ascii_case("hstore")
    }

    /// The `::type` suffix as written.
    #[must_use]
    pub fn suffix(&self) -> String {
        format!("::{}", self.text)
    }

    /// The `::base[]...` suffix for an array literal of the given depth.
    #[must_use]
    pub fn array_suffix(&self, depth: usize) -> String {
        format!("::{}{}", self.base, "[]".repeat(depth))
    }
}

impl fmt::Display for CastType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Compiled patterns for SQL type names.
#[derive(Debug)]
pub struct CastRegistry {
    colon: Regex,
    exact: Regex,
}

impl CastRegistry {
    fn new() -> Self {
        let types = DATA_TYPES.join("|");
        let colon = Regex::new(&format!(r"(?i)^::({types})((?:\s*\[\s*\d*\s*\])*)"))
            .expect("Invalid cast pattern regex");
        let exact = Regex::new(&format!(r"(?i)^(?:{types})$")).expect("Invalid type pattern regex");
        Self { colon, exact }
    }

    /// Returns the shared registry.
    #[must_use]
    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<CastRegistry> = OnceLock::new();
        REGISTRY.get_or_init(Self::new)
    }

    /// Returns true if `name` is a recognized SQL type (without array brackets).
    #[must_use]
    pub fn is_type(&self, name: &str) -> bool {
        self.exact.is_match(name.trim())
    }

    /// Detects a cast annotation in `text`.
    ///
    /// `name::type[]` and `name__type_array` are both accepted. Returns the
    /// residual name and the cast, or `None` if no recognized type is present.
    #[must_use]
    pub fn detect(&self, text: &str) -> Option<(String, CastType)> {
        if let Some(at) = text.find("::") {
            let (cast, len) = self.match_colon(&text[at..])?;
            return (at + len == text.len()).then(|| (text[..at].to_string(), cast));
        }
        self.detect_underscore(text)
    }

    /// Matches a colon cast at the start of `text`.
    ///
    /// Returns the cast and the number of bytes it spans.
    #[must_use]
    pub fn match_colon(&self, text: &str) -> Option<(CastType, usize)> {
        let caps = self.colon.captures(text)?;
        let whole = caps.get(0)?;
        let base = caps.get(1)?.as_str();
        // `::integerx` is not a cast
        let next = text[whole.end()..].chars().next();
        if next.is_some_and(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        let brackets = caps.get(2).map_or("", |m| m.as_str());
        Some((
            CastType {
                text: whole.as_str()[2..].to_string(),
                base: base.to_string(),
                dims: brackets.matches('[').count(),
                encoding: CastEncoding::Colon,
            },
            whole.end(),
        ))
    }

    /// Splits `key__type` into the residual key and the decoded cast.
    #[must_use]
    pub fn detect_underscore(&self, key: &str) -> Option<(String, CastType)> {
        let (name, encoded) = key.rsplit_once("__")?;
        if name.is_empty() || encoded.is_empty() {
            return None;
        }

        let mut rest = encoded;
        let mut dims = 0;
        while let Some(stripped) = rest.strip_suffix("_array") {
            rest = stripped;
            dims += 1;
        }

        let base = self.decode_underscore(rest)?;
        let base = base.to_ascii_uppercase();
        Some((
            name.to_string(),
            CastType {
                text: format!("{base}{}", "[]".repeat(dims)),
                base,
                dims,
                encoding: CastEncoding::Underscore,
            },
        ))
    }

    /// Turns `numeric_10_2` into `numeric(10,2)` and `double_precision`
    /// into `double precision`.
    fn decode_underscore(&self, encoded: &str) -> Option<String> {
        if self.is_type(encoded) {
            return Some(encoded.to_string());
        }

        let mut words: Vec<&str> = encoded.split('_').filter(|w| !w.is_empty()).collect();
        let mut params = Vec::new();
        while params.len() < 2
            && words.len() > 1
            && words.last().is_some_and(|w| w.bytes().all(|b| b.is_ascii_digit()))
        {
            params.insert(0, words.pop()?);
        }

        let mut decoded = words.join(" ");
        if !params.is_empty() {
            decoded = format!("{decoded}({})", params.join(","));
        }
        self.is_type(&decoded).then_some(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> &'static CastRegistry {
        CastRegistry::global()
    }

    #[test]
    fn test_colon_cast_simple() {
        let (cast, len) = registry().match_colon("::int rest").unwrap();
        assert_eq!(cast.as_str(), "int");
        assert_eq!(len, 5);
        assert_eq!(cast.dims(), 0);
        assert_eq!(cast.encoding(), CastEncoding::Colon);
    }

    #[test]
    fn test_colon_cast_preserves_case_and_dims() {
        let (cast, _) = registry().match_colon("::JSONB[][]").unwrap();
        assert_eq!(cast.as_str(), "JSONB[][]");
        assert_eq!(cast.base(), "JSONB");
        assert_eq!(cast.dims(), 2);
        assert!(cast.is_json());
    }

    #[test]
    fn test_colon_cast_parameterized() {
        let (cast, _) = registry().match_colon("::numeric(10, 2)").unwrap();
        assert_eq!(cast.as_str(), "numeric(10, 2)");
        let (cast, _) = registry().match_colon("::character varying(20)").unwrap();
        assert_eq!(cast.as_str(), "character varying(20)");
        let (cast, _) = registry()
            .match_colon("::timestamp(3) with time zone")
            .unwrap();
        assert_eq!(cast.as_str(), "timestamp(3) with time zone");
    }

    #[test]
    fn test_colon_cast_prefers_longest_type() {
        assert_eq!(registry().match_colon("::integer").unwrap().0.as_str(), "integer");
        assert_eq!(registry().match_colon("::int4range").unwrap().0.as_str(), "int4range");
        assert_eq!(registry().match_colon("::daterange").unwrap().0.as_str(), "daterange");
        assert_eq!(registry().match_colon("::timestamptz").unwrap().0.as_str(), "timestamptz");
    }

    #[test]
    fn test_colon_cast_rejects_unknown() {
        assert!(registry().match_colon("::foo").is_none());
        assert!(registry().match_colon("::integerx").is_none());
        assert!(registry().match_colon(":int").is_none());
    }

    #[test]
    fn test_underscore_cast() {
        let (name, cast) = registry().detect("bind__uuid").unwrap();
        assert_eq!(name, "bind");
        assert_eq!(cast.as_str(), "UUID");
        assert_eq!(cast.suffix(), "::UUID");
        assert_eq!(cast.encoding(), CastEncoding::Underscore);
    }

    #[test]
    fn test_underscore_cast_parameters_and_arrays() {
        let (_, cast) = registry().detect("price__numeric_10_2").unwrap();
        assert_eq!(cast.as_str(), "NUMERIC(10,2)");
        let (_, cast) = registry().detect("name__varchar_255").unwrap();
        assert_eq!(cast.as_str(), "VARCHAR(255)");
        let (_, cast) = registry().detect("ids__int_array").unwrap();
        assert_eq!(cast.as_str(), "INT[]");
        assert_eq!(cast.array_suffix(2), "::INT[][]");
        let (_, cast) = registry().detect("at__timestamp_with_time_zone").unwrap();
        assert_eq!(cast.as_str(), "TIMESTAMP WITH TIME ZONE");
        let (_, cast) = registry().detect("lsn__pg_lsn").unwrap();
        assert_eq!(cast.as_str(), "PG_LSN");
        let (_, cast) = registry().detect("n__int4").unwrap();
        assert_eq!(cast.as_str(), "INT4");
    }

    #[test]
    fn test_detect_without_cast() {
        assert!(registry().detect("plain_key").is_none());
        assert!(registry().detect("x__nosuchtype").is_none());
        assert!(registry().detect("__uuid").is_none());
    }

    #[test]
    fn test_detect_colon_in_text() {
        let (name, cast) = registry().detect("ids::int[]").unwrap();
        assert_eq!(name, "ids");
        assert_eq!(cast.as_str(), "int[]");
        assert!(registry().detect("ids::int[] trailing").is_none());
    }

    #[test]
    fn test_hstore_and_json_flags() {
        let (_, cast) = registry().detect("h__hstore").unwrap();
        assert!(cast.is_hstore());
        assert!(!cast.is_json());
        let (_, cast) = registry().detect("j__json").unwrap();
        assert!(cast.is_json());
    }

    #[test]
    fn test_cast_syntax_flags() {
        assert!(CastSyntax::Both.colon() && CastSyntax::Both.underscore());
        assert!(CastSyntax::Colon.colon() && !CastSyntax::Colon.underscore());
        assert!(!CastSyntax::Underscore.colon() && CastSyntax::Underscore.underscore());
    }
}
