//! End-to-end template rendering: scalars, identifiers, VALUES lists,
//! JSON recordsets and bind parameters.

mod common;
use common::*;

use quote_sql::{QuoteSql, Value};
use serde_json::json;

#[test]
fn scalar_text_is_escaped() {
    let sql = render(QuoteSql::new("SELECT %name").bind("name", "O'Brien"));
    assert_eq!(sql, "SELECT 'O''Brien'");
}

#[test]
fn array_without_cast_is_jsonb() {
    let sql = render(QuoteSql::new("SELECT %ids").bind("ids", vec![1, 2, 3]));
    assert_eq!(sql, "SELECT '[1,2,3]'::JSONB");
}

#[test]
fn insert_values_union_and_default() {
    let sql = render(QuoteSql::new("INSERT INTO t %values").bind(
        "values",
        vec![
            Value::object([("a", Value::from(1)), ("b", Value::from(true))]),
            Value::object([("a", 2)]),
        ],
    ));
    assert_eq!(sql, r#"INSERT INTO t ("a","b") VALUES (1,TRUE),(2,DEFAULT)"#);
}

#[test]
fn json_recordset_with_casts() {
    let sql = render(
        QuoteSql::new("SELECT %x_json")
            .bind("x_casts", json!({"a": "int", "b": "text"}))
            .bind("x_json", json!([{"a": 1, "b": "foo"}])),
    );
    assert_eq!(
        sql,
        r#"SELECT json_to_recordset('[{"a":1,"b":"foo"}]') AS "x"("a" int,"b" text)"#
    );
}

#[test]
fn scalars_and_object() {
    let sql = render(
        QuoteSql::new("SELECT %text, %{number}, %hash FROM %table")
            .bind("text", "a text")
            .bind("number", 123)
            .bind("hash", json!({"abc": "don't"}))
            .bind("table", "my_table"),
    );
    assert_eq!(
        sql,
        r#"SELECT 'a text', 123, '{"abc":"don''t"}'::JSONB FROM "my_table""#
    );
}

#[test]
fn column_list_from_array() {
    let sql = render(QuoteSql::new("SELECT x, %x_columns ").bind("x_columns", vec!["a", "b", "c", "d"]));
    assert_sql_eq(&sql, r#"SELECT x, "a","b","c","d""#);
}

#[test]
fn columns_with_aliases_and_table() {
    let sql = render(
        QuoteSql::new("SELECT %columns FROM %table")
            .bind(
                "columns",
                vec![
                    Value::ident("a"),
                    Value::from("b"),
                    Value::from("gaga.c"),
                    Value::object([
                        ("d", Value::ident("e")),
                        ("f", Value::from("gaga.d")),
                        ("g", Value::raw("1 + 2")),
                    ]),
                    Value::raw("whatever AS raw"),
                ],
            )
            .bind("table", "my_table"),
    );
    assert_eq!(
        sql,
        r#"SELECT "my_table"."a","b","gaga"."c","my_table"."e" AS "d","gaga"."d" AS "f",1 + 2 AS "g",whatever AS raw FROM "my_table""#
    );
}

#[test]
fn columns_qualified_by_first_of_many_tables() {
    let sql = render(
        QuoteSql::new("SELECT %columns FROM %table")
            .bind(
                "columns",
                vec![Value::ident("a"), Value::object([("b", Value::ident("c"))])],
            )
            .bind("table", vec!["table1", "table2"]),
    );
    assert_eq!(
        sql,
        r#"SELECT "table1"."a","table1"."c" AS "b" FROM "table1","table2""#
    );
}

#[test]
fn nested_templates_expand() {
    let sql = render(
        QuoteSql::new("SELECT %raw FROM %table")
            .bind("raw", "%recurse1_raw")
            .bind("recurse1_raw", "%recurse2")
            .bind("recurse2", true)
            .bind("table", "table1"),
    );
    assert_eq!(sql, r#"SELECT TRUE FROM "table1""#);
}

#[test]
fn positional_binds() {
    let mut session =
        QuoteSql::new("SELECT %bind, %bind__uuid, %bind1 AS get_bind_1_again FROM %table")
            .bind("table", "my_table");
    let sql = session.to_sql().unwrap();
    assert_eq!(
        sql,
        r#"SELECT $1, $2::UUID, $1 AS get_bind_1_again FROM "my_table""#
    );
    assert_eq!(session.binds().len(), 2);
    assert_eq!(session.binds()[1].as_ref().unwrap().as_str(), "UUID");
}

#[test]
fn derived_values_from_arrays() {
    let sql = render(QuoteSql::new("SELECT * FROM %x_values").bind(
        "x_values",
        vec![vec![Value::from("a"), Value::from(1), Value::from(true), Value::Null]],
    ));
    assert_eq!(
        sql,
        r#"SELECT * FROM (VALUES ('a',1,TRUE,NULL)) AS "x" ("column1","column2","column3","column4")"#
    );
}

#[test]
fn derived_values_from_maps() {
    let sql = render(QuoteSql::new("SELECT * FROM %y_values").bind(
        "y_values",
        json!([
            {"a": "a", "b": 1, "c": true, "d": null},
            {"d": null, "a": "a", "c": true, "b": 1},
            {"d": 2, "b": 1}
        ]),
    ));
    assert_eq!(
        sql,
        r#"SELECT * FROM (VALUES ('a',1,TRUE,NULL),('a',1,TRUE,NULL),(NULL,1,NULL,2)) AS "y" ("a","b","c","d")"#
    );
}

#[test]
fn derived_values_follow_column_order() {
    let sql = render(
        QuoteSql::new("SELECT * FROM %x_values")
            .bind("x_columns", vec!["d", "c", "b", "a"])
            .bind("x_values", json!([{"a": "a", "b": 1, "c": true, "d": null}])),
    );
    assert_eq!(
        sql,
        r#"SELECT * FROM (VALUES (NULL,TRUE,1,'a')) AS "x" ("d","c","b","a")"#
    );
}

#[test]
fn derived_values_with_typed_columns() {
    let sql = render(
        QuoteSql::new("SELECT * FROM %x_values")
            .bind(
                "x_columns",
                json!({"a": "text", "b": "integer", "c": "boolean", "d": "float"}),
            )
            .bind(
                "x_values",
                json!([
                    {"a": "a", "b": 1, "c": true, "d": null},
                    {"d": null, "a": "a", "c": true, "b": 1},
                    {"d": 2, "b": 1}
                ]),
            ),
    );
    assert_sql_eq(
        &sql,
        r#"SELECT * FROM (VALUES
            ('a'::TEXT,1::INTEGER,TRUE::BOOLEAN,NULL::FLOAT),
            ('a',1,TRUE,NULL),
            (NULL,1,NULL,2)) AS "x" ("a","b","c","d")"#,
    );
}

#[test]
fn insert_values_from_arrays() {
    let sql = render(QuoteSql::new("INSERT INTO x %values").bind(
        "values",
        vec![vec![Value::from("a"), Value::from(1), Value::from(true), Value::Null]],
    ));
    assert_eq!(sql, "INSERT INTO x VALUES ('a',1,TRUE,NULL)");
}

#[test]
fn insert_values_from_single_map() {
    let sql = render(
        QuoteSql::new("INSERT INTO x %values")
            .bind("values", json!({"a": "a", "b": 1, "c": true, "d": null})),
    );
    assert_eq!(sql, r#"INSERT INTO x ("a","b","c","d") VALUES ('a',1,TRUE,NULL)"#);
}

#[test]
fn insert_values_raw_select() {
    let sql = render(QuoteSql::new("INSERT INTO x %values").bind("values", Value::raw("SELECT 1")));
    assert_eq!(sql, "INSERT INTO x (SELECT 1)");
}

#[test]
fn json_recordset_drops_unknown_fields() {
    let sql = render(
        QuoteSql::new("SELECT * FROM %x_json")
            .bind("x_casts", json!({"a": "int", "b": "text"}))
            .bind("x_json", json!([{"a": 1, "b": "foo"}, {"a": "2", "c": "bar"}])),
    );
    assert_eq!(
        sql,
        r#"SELECT * FROM json_to_recordset('[{"a":1,"b":"foo"},{"a":"2"}]') AS "x"("a" int,"b" text)"#
    );
}

#[test]
fn json_recordset_insert() {
    let row = json!({
        "first_name": null, "last_name": null, "stripe_id": null, "credits": null,
        "avatar": null, "name": "auge", "color": "#611333", "founder": null,
        "language": null, "country": null, "data": {},
        "created_at": "2020-11-19T09:30:18.670Z", "updated_at": "2020-11-19T09:40:00.063Z"
    });
    let sql = render(
        QuoteSql::new("INSERT INTO users (name, color) SELECT * from %x_json")
            .bind("x_casts", json!({"name": "text", "color": "text"}))
            .bind("x_json", row),
    );
    assert_eq!(
        sql,
        r##"INSERT INTO users (name, color) SELECT * from json_to_recordset('[{"name":"auge","color":"#611333"}]') AS "x"("name" text,"color" text)"##
    );
}

#[test]
fn casts_in_both_encodings() {
    let sql = render(
        QuoteSql::new("SELECT %id__uuid, %n::int, %tags::text[], %ints__int_array")
            .bind("id", "abc")
            .bind("n", 5)
            .bind("tags", vec!["a", "b"])
            .bind("ints", vec![1, 2]),
    );
    assert_eq!(
        sql,
        "SELECT 'abc'::UUID, 5::int, ARRAY['a','b']::text[], ARRAY[1,2]::INT[]"
    );
}

#[test]
fn hstore_and_compact_objects() {
    let sql = render(
        QuoteSql::new("SELECT %attrs__hstore, %doc")
            .bind("attrs", Value::object([("a", "x")]))
            .bind(
                "doc",
                Value::from(
                    quote_sql::Object::new()
                        .with("a", 1)
                        .with("b", Value::Null)
                        .strip_nulls(),
                ),
            ),
    );
    assert_eq!(sql, r#"SELECT '"a"=>"x"'::HSTORE, '{"a":1}'::JSONB"#);
}

#[test]
fn callable_renders_verbatim() {
    let sql = render(
        QuoteSql::new("SELECT %total FROM t")
            .bind("total", Value::callable(|q| Ok(format!("count({})", q.quote_identifier("id"))))),
    );
    assert_eq!(sql, r#"SELECT count("id") FROM t"#);
}

#[test]
fn serialized_structs_as_rows() {
    #[derive(serde::Serialize)]
    struct Tag {
        name: &'static str,
        color: Option<&'static str>,
    }

    let rows = vec![
        Tag { name: "red", color: Some("#f00") },
        Tag { name: "none", color: None },
    ];
    let sql = render(
        QuoteSql::new("INSERT INTO tags %values")
            .bind("values", Value::from_serialize(&rows).unwrap()),
    );
    assert_eq!(
        sql,
        r##"INSERT INTO tags ("color","name") VALUES ('#f00','red'),(NULL,'none')"##
    );
}
