//! Raw column declarations, read from attribute-style source with `syn`.
//!
//! A declaration looks like the arguments of the `#[supamodeled(...)]` attribute:
//!
//! ```text
//! table_name = "task_thing",
//! columns = [
//!     TableColumn("id", String, is_primary_key = true),
//!     TableColumn("createdAt", Date?),
//!     ForeignKeyColumn("otherThing", BlankThing, source_column = "id", target_column = "blank_thing_id"),
//! ]
//! ```
//!
//! Nothing here interprets the arguments; that is the job of
//! [`TableSchema::from_declaration`](crate::TableSchema::from_declaration).

use proc_macro2::TokenStream;
use quote::ToTokens;
use serde::{Deserialize, Serialize};
use syn::parse::Parser;
use syn::punctuated::Punctuated;
use syn::{Expr, Lit, MetaNameValue, Token};

use crate::error::{Error, Result};
use crate::naming::{camel_to_snake, snake_to_camel};

/// Value of a single constructor argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArgValue {
    Str(String),
    Bool(bool),
    /// A type token such as `String` or `Vec<u8>`; `optional` is set by a trailing `?`.
    Type { token: String, optional: bool },
    /// Anything else, kept as normalized source text.
    Other(String),
}

impl ArgValue {
    /// Builds a type argument from text, stripping one trailing `?`.
    pub fn type_token(text: &str) -> Self {
        let text = normalize_token(text);
        match text.strip_suffix('?') {
            Some(stripped) => ArgValue::Type {
                token: stripped.to_string(),
                optional: true,
            },
            None => ArgValue::Type {
                token: text,
                optional: false,
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Argument {
    /// camelCase label for `label = value` arguments, `None` for positional ones.
    pub label: Option<String>,
    pub value: ArgValue,
}

impl Argument {
    pub fn positional(value: ArgValue) -> Self {
        Self { label: None, value }
    }

    pub fn labeled(label: impl Into<String>, value: ArgValue) -> Self {
        Self {
            label: Some(label.into()),
            value,
        }
    }
}

/// One entry of the columns list, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawColumnDeclaration {
    /// Constructor the entry was written with (`TableColumn`, `ForeignKeyColumn`, ...).
    pub constructor: String,
    pub arguments: Vec<Argument>,
}

impl RawColumnDeclaration {
    pub fn labeled(&self, label: &str) -> Option<&ArgValue> {
        self.arguments
            .iter()
            .find(|a| a.label.as_deref() == Some(label))
            .map(|a| &a.value)
    }

    /// Unlabeled arguments, in source order.
    pub fn positional(&self) -> impl Iterator<Item = &ArgValue> {
        self.arguments
            .iter()
            .filter(|a| a.label.is_none())
            .map(|a| &a.value)
    }
}

/// A table name plus its ordered, unvalidated column entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDeclaration {
    pub table_name: String,
    pub columns: Vec<RawColumnDeclaration>,
}

impl TableDeclaration {
    /// Parses `table_name = "...", columns = [...]`.
    ///
    /// When `table_name` is absent the table is named after `default_name` in
    /// snake_case. Fails when `columns` is missing or is not a list.
    pub fn parse(tokens: TokenStream, default_name: &str) -> Result<Self> {
        let entries = Punctuated::<MetaNameValue, Token![,]>::parse_terminated
            .parse2(tokens)
            .map_err(|e| Error::schema_declaration(format!("unreadable table declaration: {e}")))?;

        let mut table_name = None;
        let mut columns = None;
        for entry in entries {
            let key = entry.path.get_ident().map(ToString::to_string);
            match key.as_deref() {
                Some("table_name") | Some("tableName") => {
                    table_name = Some(string_literal(&entry.value).ok_or_else(|| {
                        Error::schema_declaration("`table_name` must be a string literal")
                    })?);
                }
                Some("columns") => columns = Some(column_entries(&entry.value)?),
                other => tracing::debug!(key = ?other, "ignoring unknown declaration key"),
            }
        }

        let columns = columns.ok_or_else(|| {
            Error::schema_declaration("the table declaration has no `columns` list")
        })?;
        Ok(Self {
            table_name: table_name.unwrap_or_else(|| camel_to_snake(default_name)),
            columns,
        })
    }

    pub fn parse_str(source: &str, default_name: &str) -> Result<Self> {
        let tokens: TokenStream = source
            .parse()
            .map_err(|e| Error::schema_declaration(format!("unreadable table declaration: {e}")))?;
        Self::parse(tokens, default_name)
    }
}

fn string_literal(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => Some(s.value()),
            _ => None,
        },
        _ => None,
    }
}

fn column_entries(expr: &Expr) -> Result<Vec<RawColumnDeclaration>> {
    match expr {
        Expr::Array(array) => Ok(array.elems.iter().map(column_entry).collect()),
        Expr::Macro(mac) if mac.mac.path.is_ident("vec") => {
            let elems = Punctuated::<Expr, Token![,]>::parse_terminated
                .parse2(mac.mac.tokens.clone())
                .map_err(|e| Error::schema_declaration(format!("unreadable columns list: {e}")))?;
            Ok(elems.iter().map(column_entry).collect())
        }
        Expr::Reference(reference) => column_entries(&reference.expr),
        Expr::Paren(paren) => column_entries(&paren.expr),
        Expr::Group(group) => column_entries(&group.expr),
        _ => Err(Error::schema_declaration(
            "`columns` must be a list of constructor calls, e.g. [TableColumn(\"id\", String)]",
        )),
    }
}

fn column_entry(expr: &Expr) -> RawColumnDeclaration {
    let Expr::Call(call) = expr else {
        tracing::debug!(entry = %normalize_token(&expr.to_token_stream().to_string()), "column entry is not a constructor call");
        return RawColumnDeclaration::default();
    };
    RawColumnDeclaration {
        constructor: normalize_token(&call.func.to_token_stream().to_string()),
        arguments: call.args.iter().map(argument).collect(),
    }
}

fn argument(expr: &Expr) -> Argument {
    if let Expr::Assign(assign) = expr {
        if let Expr::Path(path) = assign.left.as_ref() {
            if let Some(ident) = path.path.get_ident() {
                return Argument::labeled(snake_to_camel(&ident.to_string()), value(&assign.right));
            }
        }
    }
    Argument::positional(value(expr))
}

fn value(expr: &Expr) -> ArgValue {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Str(s) => ArgValue::Str(s.value()),
            Lit::Bool(b) => ArgValue::Bool(b.value),
            other => ArgValue::Other(other.to_token_stream().to_string()),
        },
        Expr::Path(path) => ArgValue::Type {
            token: normalize_token(&path.to_token_stream().to_string()),
            optional: false,
        },
        Expr::Try(try_expr) => match try_expr.expr.as_ref() {
            Expr::Path(path) => ArgValue::Type {
                token: normalize_token(&path.to_token_stream().to_string()),
                optional: true,
            },
            _ => ArgValue::Other(normalize_token(&expr_text(expr))),
        },
        Expr::Paren(paren) => value(&paren.expr),
        Expr::Group(group) => value(&group.expr),
        other => ArgValue::Other(normalize_token(&expr_text(other))),
    }
}

fn expr_text(expr: &Expr) -> String {
    expr.to_token_stream().to_string()
}

/// Drops whitespace and turbofish: `Vec :: < u8 >` → `Vec<u8>`.
fn normalize_token(text: &str) -> String {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.replace("::<", "<")
}
