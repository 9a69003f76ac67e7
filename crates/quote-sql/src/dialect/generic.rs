//! Generic SQL dialect.

use super::Dialect;

/// A generic SQL dialect using ANSI SQL quoting.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericDialect;

impl GenericDialect {
    /// Creates a new generic dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for GenericDialect {
    fn name(&self) -> &'static str {
        "generic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Literal;

    #[test]
    fn test_generic_dialect() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.name(), "generic");
        assert_eq!(dialect.identifier_quote(), '"');
        assert_eq!(dialect.bind_marker(3), "$3");
    }

    #[test]
    fn test_generic_quoting() {
        let dialect = GenericDialect::new();
        assert_eq!(dialect.quote_identifier(r#"my"table"#), r#""my""table""#);
        assert_eq!(dialect.quote_literal(Literal::Text("O'Brien")), "'O''Brien'");
        assert_eq!(dialect.quote_literal(Literal::Int(-100)), "-100");
        assert_eq!(dialect.quote_literal(Literal::Float(2.5)), "2.5");
        assert_eq!(dialect.quote_literal(Literal::Float(f64::NAN)), "NULL");
    }
}
