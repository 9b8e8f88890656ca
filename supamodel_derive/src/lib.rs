extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::{Ident, TokenStream as TokenStream2};
use quote::quote;
use supamodel::{
    ColumnDescriptor, Diagnostic, FieldDeclaration, Generator, TableArtifacts, TableDeclaration,
    TableSchema, camel_to_snake,
};
use syn::{Data, DeriveInput, Type};

/// Expands a declarative column list into a persisted, syncable struct.
///
/// ```ignore
/// #[supamodeled(table_name = "task_thing", columns = [
///     TableColumn("id", String, is_primary_key = true),
///     TableColumn("createdAt", Date?),
///     ForeignKeyColumn("otherThing", BlankThing, source_column = "id", target_column = "blank_thing_id"),
/// ])]
/// pub struct TaskThing;
/// ```
///
/// A declaration without a usable `columns` list leaves the struct untouched and
/// adds a `SCHEMA_DIAGNOSTIC` constant with guidance instead of failing the build.
#[proc_macro_attribute]
pub fn supamodeled(attr: TokenStream, item: TokenStream) -> TokenStream {
    expand(attr.into(), item.into()).into()
}

fn expand(attr: TokenStream2, item: TokenStream2) -> TokenStream2 {
    let Ok(input) = syn::parse2::<DeriveInput>(item.clone()) else {
        return item;
    };
    if !matches!(input.data, Data::Struct(_)) {
        return diagnostic(&input, &Diagnostic::new("#[supamodeled] only applies to structs"));
    }

    let declaration = match TableDeclaration::parse(attr, &input.ident.to_string()) {
        Ok(declaration) => declaration,
        Err(e) => return diagnostic(&input, &Diagnostic::new(e.to_string())),
    };
    let schema = rust_fields(TableSchema::from_declaration(&declaration));
    let artifacts = Generator::default().generate(&schema);
    table(&input, &schema, &artifacts)
}

/// Keeps only columns that can become a struct field, so the struct, the SQL,
/// the keys and `schema()` all describe the same set of columns.
fn rust_fields(schema: TableSchema) -> TableSchema {
    let TableSchema { table_name, columns } = schema;
    let columns = columns
        .into_iter()
        .filter(|column| {
            field_ident(&column.storage_key()).is_some()
                && (column.is_foreign_key() || syn::parse_str::<Type>(&column.value_type).is_ok())
        })
        .collect();
    TableSchema::new(table_name, columns)
}

fn diagnostic(input: &DeriveInput, diagnostic: &Diagnostic) -> TokenStream2 {
    let ident = &input.ident;
    let message = diagnostic.message();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    quote! {
        #input

        impl #impl_generics #ident #ty_generics #where_clause {
            pub const SCHEMA_DIAGNOSTIC: &'static str = #message;
        }
    }
}

fn table(input: &DeriveInput, schema: &TableSchema, artifacts: &TableArtifacts) -> TokenStream2 {
    let ident = &input.ident;
    let vis = &input.vis;
    let attrs = &input.attrs;

    let mut field_idents = Vec::new();
    let mut fields = Vec::new();
    for field in &artifacts.fields {
        if let Some((name, tokens)) = field_tokens(field) {
            field_idents.push(name);
            fields.push(tokens);
        }
    }

    // -------- relationship accessors --------
    let accessors = artifacts.relationships.iter().filter_map(|rel| {
        let accessor = field_ident(&camel_to_snake(&rel.name))?;
        let local = field_ident(&rel.local_column)?;
        if field_idents.contains(&accessor) {
            return None;
        }
        let doc = format!(
            "Key of the linked `{}` row (`{}.{}`).",
            rel.source_table, rel.source_table, rel.source_column
        );
        Some(quote! {
            #[doc = #doc]
            pub fn #accessor(&self) -> ::core::option::Option<&str> {
                self.#local.as_deref()
            }
        })
    });

    let table_name = &artifacts.table_name;
    let create_sql = artifacts.table_definition.to_sql();
    let sync_template = artifacts.sync_query.template();
    let keys = artifacts.serialization_keys.iter().map(|k| {
        let field = &k.field;
        let storage_key = &k.storage_key;
        quote! { (#field, #storage_key) }
    });
    let columns = schema.columns.iter().map(column_tokens);

    quote! {
        #(#attrs)*
        #[derive(
            ::core::fmt::Debug,
            ::core::clone::Clone,
            ::supamodel::serde::Serialize,
            ::supamodel::serde::Deserialize
        )]
        #[serde(crate = "::supamodel::serde")]
        #vis struct #ident {
            #(#fields,)*
            #[serde(alias = "isDeleted", default)]
            pub is_deleted: bool,
            #[serde(alias = "updatedAt", default)]
            pub updated_at: ::core::option::Option<
                ::supamodel::chrono::DateTime<::supamodel::chrono::Utc>
            >,
        }

        impl #ident {
            #(#accessors)*
        }

        impl ::supamodel::SupaModel for #ident {
            const TABLE_NAME: &'static str = #table_name;
            const CREATE_TABLE_SQL: &'static str = #create_sql;
            const SERIALIZATION_KEYS: &'static [(&'static str, &'static str)] = &[#(#keys),*];
            const SYNC_QUERY_TEMPLATE: &'static str = #sync_template;

            fn schema() -> ::supamodel::TableSchema {
                ::supamodel::TableSchema::new(#table_name, ::std::vec![#(#columns),*])
            }
        }
    }
}

fn field_tokens(field: &FieldDeclaration) -> Option<(Ident, TokenStream2)> {
    let ident = field_ident(&field.storage_key)?;
    let ty: Type = syn::parse_str(&field.value_type).ok()?;
    let ty = if field.is_optional {
        quote! { ::core::option::Option<#ty> }
    } else {
        quote! { #ty }
    };
    let serde_attr = match (field.name != field.storage_key, field.is_optional) {
        (true, true) => {
            let alias = &field.name;
            quote! { #[serde(alias = #alias, default)] }
        }
        (true, false) => {
            let alias = &field.name;
            quote! { #[serde(alias = #alias)] }
        }
        (false, true) => quote! { #[serde(default)] },
        (false, false) => quote! {},
    };
    let tokens = quote! {
        #serde_attr
        pub #ident: #ty
    };
    Some((ident, tokens))
}

fn field_ident(name: &str) -> Option<Ident> {
    // Keywords that cannot be raw identifiers.
    if matches!(name, "self" | "Self" | "super" | "crate" | "_") {
        return None;
    }
    syn::parse_str::<Ident>(name)
        .or_else(|_| syn::parse_str::<Ident>(&format!("r#{name}")))
        .ok()
}

fn column_tokens(column: &ColumnDescriptor) -> TokenStream2 {
    let name = &column.name;
    if let Some(fk) = &column.foreign_key {
        let source_table = &fk.source_table;
        let source_column = &fk.source_column;
        let target_column = &fk.target_column;
        return quote! {
            ::supamodel::ColumnDescriptor::foreign_key(
                #name,
                #source_table,
                #source_column,
                ::core::option::Option::Some(#target_column),
            )
        };
    }
    let value_type = &column.value_type;
    let optional = column.is_optional.then(|| quote! { .optional() });
    let primary = column.is_primary_key.then(|| quote! { .primary_key() });
    quote! {
        ::supamodel::ColumnDescriptor::new(#name, #value_type) #optional #primary
    }
}
