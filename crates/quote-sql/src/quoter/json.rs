//! `json_to_recordset` expansion.

use serde_json::{Map, Value as Json};

use super::values::ColumnSpec;
use super::Quoter;
use crate::error::{QuoteError, Result};
use crate::value::{Object, Value};

/// Column type used when no cast is known.
const DEFAULT_COLUMN_TYPE: &str = "text";

impl Quoter<'_> {
    /// Renders `json_to_recordset(<json or $N>) AS "<name>"("col" type,...)`.
    ///
    /// Columns come from the column override, else from the cast keys.
    /// Records are cut down to those columns.
    pub fn data_json(&self, value: &Value) -> Result<String> {
        let casts = self.metadata.casts(self.name).unwrap_or_default();
        let columns: Vec<ColumnSpec> = match self.column_override()? {
            Some(columns) => columns,
            None if !casts.is_empty() => casts.iter().map(|(name, _)| (name.clone(), None)).collect(),
            None => {
                return Err(QuoteError::MissingColumns {
                    name: self.metadata_name(),
                })
            }
        };

        let definitions = columns
            .iter()
            .map(|(name, declared)| {
                let sql_type = casts
                    .iter()
                    .find(|(column, sql_type)| column == name && !sql_type.is_empty())
                    .map(|(_, sql_type)| sql_type.clone())
                    .or_else(|| declared.clone())
                    .unwrap_or_else(|| DEFAULT_COLUMN_TYPE.to_string());
                format!("{} {sql_type}", self.quote_identifier(name))
            })
            .collect::<Vec<_>>();

        let source = match value {
            Value::Int(n) => usize::try_from(*n)
                .ok()
                .filter(|index| *index >= 1)
                .map(|index| self.dialect().bind_marker(index))
                .ok_or_else(|| self.unsupported(value, "a bind parameter"))?,
            Value::Raw(raw) => raw.as_str().to_string(),
            Value::Fragment(fragment) => fragment.to_sql(),
            Value::Object(_) | Value::Array(_) => {
                let mut records = Vec::new();
                self.collect_records(value, &columns, &mut records)?;
                let text = serde_json::to_string(&Json::Array(records))?;
                self.dialect().quote_string(&text)
            }
            other => return Err(self.unsupported(other, "a JSON recordset")),
        };

        Ok(format!(
            "json_to_recordset({source}) AS {}({})",
            self.quote_identifier(&self.metadata_name()),
            definitions.join(",")
        ))
    }

    /// Flattens nested arrays of records; nulls are dropped.
    fn collect_records(&self, value: &Value, columns: &[ColumnSpec], out: &mut Vec<Json>) -> Result<()> {
        match value {
            Value::Null => Ok(()),
            Value::Array(items) => items
                .iter()
                .try_for_each(|item| self.collect_records(item, columns, out)),
            Value::Object(object) => {
                out.push(self.slice_record(object, columns)?);
                Ok(())
            }
            other => Err(self.unsupported(other, "a JSON record")),
        }
    }

    fn slice_record(&self, object: &Object, columns: &[ColumnSpec]) -> Result<Json> {
        let mut record = Map::new();
        for (name, _) in columns {
            if let Some(field) = object.get(name) {
                record.insert(name.clone(), field.to_json(self.key)?);
            }
        }
        Ok(Json::Object(record))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::Config;
    use crate::error::QuoteError;
    use crate::metadata::{MetaKind, Metadata, Overrides};
    use crate::quoter::Quoter;
    use crate::value::Value;

    fn render(key: &str, value: &Value, overrides: &Overrides) -> Result<String, QuoteError> {
        let config = Config::default();
        let metadata = Metadata::new(overrides, None);
        Quoter::new(&config, metadata, key, key, None, Some(value)).render()
    }

    fn casts() -> Overrides {
        let mut overrides = Overrides::new();
        overrides.set(
            MetaKind::Casts,
            Some("x".into()),
            Value::object([("a", "int"), ("b", "text")]),
        );
        overrides
    }

    #[test]
    fn test_json_recordset_slices_records() {
        let value = Value::Array(vec![
            Value::object([("a", Value::from(1)), ("b", Value::from("foo"))]),
            Value::object([("a", Value::from("2")), ("c", Value::from("bar"))]),
        ]);
        assert_eq!(
            render("x_json", &value, &casts()).unwrap(),
            r#"json_to_recordset('[{"a":1,"b":"foo"},{"a":"2"}]') AS "x"("a" int,"b" text)"#
        );
    }

    #[test]
    fn test_json_recordset_single_map_with_quote() {
        let value = Value::object([("b", Value::from("don't")), ("z", Value::from(1))]);
        assert_eq!(
            render("x_json", &value, &casts()).unwrap(),
            r#"json_to_recordset('[{"b":"don''t"}]') AS "x"("a" int,"b" text)"#
        );
    }

    #[test]
    fn test_json_recordset_bind_parameter() {
        assert_eq!(
            render("x_json", &Value::from(2), &casts()).unwrap(),
            r#"json_to_recordset($2) AS "x"("a" int,"b" text)"#
        );
    }

    #[test]
    fn test_json_recordset_default_type() {
        let mut overrides = Overrides::new();
        overrides.set(MetaKind::Columns, Some("y".into()), Value::from(vec!["name", "color"]));
        let value = Value::object([("name", "auge"), ("color", "#611333"), ("other", "x")]);
        assert_eq!(
            render("y_json", &value, &overrides).unwrap(),
            r##"json_to_recordset('[{"name":"auge","color":"#611333"}]') AS "y"("name" text,"color" text)"##
        );
    }

    #[test]
    fn test_json_recordset_requires_columns() {
        let value = Value::object([("a", 1)]);
        assert!(matches!(
            render("x_json", &value, &Overrides::new()).unwrap_err(),
            QuoteError::MissingColumns { ref name } if name == "x"
        ));
    }

    #[test]
    fn test_json_recordset_rejects_scalars() {
        assert!(matches!(
            render("x_json", &Value::from("text"), &casts()).unwrap_err(),
            QuoteError::UnsupportedType { .. }
        ));
    }
}
