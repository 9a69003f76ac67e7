//! # quote-sql
//!
//! Safe SQL text templating with typed placeholder quoting.
//!
//! A template is plain SQL with named placeholders (`%name` or `%{name}`).
//! Each placeholder is replaced by its bound value, quoted according to the
//! value's type and to the suffix of its name:
//!
//! - `%name` renders a literal (`'text'`, `42`, `TRUE`, `ARRAY[...]`, JSONB)
//! - `%x_table`, `%x_columns`, `%x_ident` render identifiers
//! - `%values` renders an INSERT column list and VALUES rows
//! - `%x_values` renders a derived table for a FROM clause
//! - `%x_json` renders `json_to_recordset(...)` with typed columns
//! - `%x_raw`, `%x_sql`, `%x_constraint` insert SQL verbatim
//! - `%bind`, `%bind3` render positional parameters
//!
//! A cast may follow the key, either as `::type` or encoded in the name
//! (`%id__uuid`). Rendered text may contain further placeholders, which are
//! expanded until nothing changes.
//!
//! ## Example
//!
//! ```rust
//! use quote_sql::{QuoteSql, Value};
//!
//! let sql = QuoteSql::new("INSERT INTO %table %values RETURNING id")
//!     .bind("table", "users")
//!     .bind(
//!         "values",
//!         vec![
//!             Value::object([("name", Value::from("Alice")), ("active", Value::from(true))]),
//!             Value::object([("name", "Bob")]),
//!         ],
//!     )
//!     .to_sql()
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     r#"INSERT INTO "users" ("active","name") VALUES (TRUE,'Alice'),(DEFAULT,'Bob') RETURNING id"#
//! );
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are never spliced in unquoted unless they are explicitly raw.
//! Quoted output is not scanned again, so a bound string that looks like a
//! placeholder stays a string:
//!
//! ```rust
//! use quote_sql::QuoteSql;
//!
//! let sql = QuoteSql::new("SELECT * FROM users WHERE name = %name")
//!     .bind("name", "'; DROP TABLE users; -- %name")
//!     .to_sql()
//!     .unwrap();
//!
//! assert_eq!(
//!     sql,
//!     "SELECT * FROM users WHERE name = '''; DROP TABLE users; -- %name'"
//! );
//! ```

pub mod cast;
pub mod config;
pub mod dialect;
pub mod error;
pub mod metadata;
pub mod quoter;
pub mod resolve;
pub mod scanner;
pub mod schema;
pub mod session;
pub mod value;

pub use cast::{CastSyntax, CastType};
pub use config::{Config, Options, ValuesCasts};
pub use dialect::{Dialect, GenericDialect, PostgresDialect};
pub use error::{CapturedError, QuoteError, ResolveError, Result};
pub use quoter::{Quoter, Route};
pub use schema::{Catalog, ColumnDescriptor, StaticCatalog, Table, TableDescriptor};
pub use session::{QuoteSql, QuoteSqlExt};
pub use value::{Keyword, Object, RawSql, ToSql, Value};
