//! Derive macros for quote-sql table metadata.
//!
//! This crate provides the `#[derive(Table)]` macro, which describes a
//! struct's table and columns so templates can expand `%x_columns`,
//! `%values` and `%x_json` without a live database.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, Fields, GenericArgument, Ident, Lit,
    Meta, PathArguments, Type,
};

/// Derives `quote_sql::schema::Table` for a struct.
///
/// # Attributes
///
/// - `#[table(name = "table_name")]` - Specifies the SQL table name (optional,
///   defaults to snake_case of struct name)
///
/// # Field Attributes
///
/// - `#[column(name = "column_name")]` - Specifies the SQL column name
///   (optional, defaults to field name)
/// - `#[column(sql_type = "varchar(20)")]` - Specifies the SQL type (optional,
///   inferred from the Rust type)
/// - `#[column(default)]` - The database supplies a default
/// - `#[column(generated)]` - The column is computed and never written
/// - `#[column(skip)]` - The field is not a column
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(&input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_table_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let table_name = get_table_name(&input.attrs, struct_name)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Table derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Table derive only supports structs",
            ));
        }
    };

    let mut column_infos: Vec<ColumnInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let column_attrs = parse_column_attrs(&field.attrs)?;
        if column_attrs.skip {
            continue;
        }

        let sql_type = match column_attrs.sql_type {
            Some(sql_type) => sql_type,
            None => infer_sql_type(&field.ty).ok_or_else(|| {
                syn::Error::new_spanned(
                    &field.ty,
                    "cannot infer a SQL type, add #[column(sql_type = \"...\")]",
                )
            })?,
        };

        column_infos.push(ColumnInfo {
            column_name: column_attrs
                .name
                .unwrap_or_else(|| field_name.to_string().trim_start_matches("r#").to_string()),
            sql_type,
            has_default: column_attrs.default,
            generated: column_attrs.generated,
        });
    }

    let column_entries: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let name = &info.column_name;
            let sql_type = &info.sql_type;
            let has_default = info.has_default;
            let generated = info.generated;
            quote! {
                ::quote_sql::schema::ColumnDescriptor {
                    name: ::std::string::String::from(#name),
                    sql_type: ::std::string::String::from(#sql_type),
                    has_default: #has_default,
                    is_virtual: #generated,
                }
            }
        })
        .collect();

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::quote_sql::schema::Table for #struct_name #ty_generics #where_clause {
            const NAME: &'static str = #table_name;

            fn descriptor() -> ::quote_sql::schema::TableDescriptor {
                ::quote_sql::schema::TableDescriptor {
                    name: ::std::string::String::from(#table_name),
                    columns: ::std::vec![#(#column_entries),*],
                }
            }
        }
    };

    Ok(expanded)
}

struct ColumnInfo {
    column_name: String,
    sql_type: String,
    has_default: bool,
    generated: bool,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    sql_type: Option<String>,
    default: bool,
    generated: bool,
    skip: bool,
}

fn string_value(meta: &syn::meta::ParseNestedMeta<'_>) -> syn::Result<Option<String>> {
    let value: Expr = meta.value()?.parse()?;
    if let Expr::Lit(lit) = value {
        if let Lit::Str(s) = lit.lit {
            return Ok(Some(s.value()));
        }
    }
    Err(meta.error("expected a string literal"))
}

fn get_table_name(attrs: &[Attribute], struct_name: &Ident) -> syn::Result<String> {
    for attr in attrs {
        if attr.path().is_ident("table") {
            let mut table_name = None;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    table_name = string_value(&meta)?;
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute"))
                }
            })?;
            if let Some(name) = table_name {
                return Ok(name);
            }
        }
    }
    Ok(to_snake_case(&struct_name.to_string()))
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // #[column] alone changes nothing
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("default") {
                    result.default = true;
                } else if meta.path.is_ident("generated") {
                    result.generated = true;
                } else if meta.path.is_ident("skip") {
                    result.skip = true;
                } else if meta.path.is_ident("name") {
                    result.name = string_value(&meta)?;
                } else if meta.path.is_ident("sql_type") {
                    result.sql_type = string_value(&meta)?;
                } else {
                    return Err(meta.error("unsupported column attribute"));
                }
                Ok(())
            })?;
        }
    }

    Ok(result)
}

/// The last path segment of a type and its first generic argument.
fn last_segment(ty: &Type) -> Option<(String, Option<&Type>)> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    let argument = match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    };
    Some((segment.ident.to_string(), argument))
}

fn infer_sql_type(ty: &Type) -> Option<String> {
    let (name, argument) = last_segment(ty)?;
    let sql_type = match name.as_str() {
        "Option" | "Box" => return infer_sql_type(argument?),
        "Vec" => return infer_sql_type(argument?).map(|inner| format!("{inner}[]")),
        "i64" | "u32" => "bigint",
        "i32" | "u16" => "integer",
        "i16" | "i8" | "u8" => "smallint",
        "f64" => "double precision",
        "f32" => "real",
        "bool" => "boolean",
        "String" | "str" | "char" => "text",
        "DateTime" => "timestamptz",
        "NaiveDateTime" => "timestamp",
        "NaiveDate" => "date",
        "NaiveTime" => "time",
        "Uuid" => "uuid",
        "Value" => "jsonb",
        _ => return None,
    };
    Some(sql_type.to_string())
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}
