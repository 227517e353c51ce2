//! `#[derive(Qualifier)]` 实现

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Expr, Fields, Lit, Meta, Result};

/// 结构体级参数
#[derive(Debug, Default)]
struct QualifierArgs {
    /// 覆盖限定符类型名
    name: Option<String>,
}

/// 字段是否带有 `#[qualifier(nonbinding)]`
fn is_nonbinding(field: &syn::Field) -> Result<bool> {
    let mut nonbinding = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("qualifier")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("nonbinding") {
                nonbinding = true;
                Ok(())
            } else {
                Err(meta.error("字段上只支持 #[qualifier(nonbinding)]"))
            }
        })?;
    }
    Ok(nonbinding)
}

fn parse_args(input: &DeriveInput) -> Result<QualifierArgs> {
    let mut args = QualifierArgs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("qualifier")) {
        match &attr.meta {
            Meta::List(_) => {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("name") {
                        let value: Expr = meta.value()?.parse()?;
                        match value {
                            Expr::Lit(expr_lit) => match expr_lit.lit {
                                Lit::Str(lit_str) if !lit_str.value().trim().is_empty() => {
                                    args.name = Some(lit_str.value());
                                    Ok(())
                                }
                                other => Err(syn::Error::new_spanned(other, "name 必须是非空字符串")),
                            },
                            other => Err(syn::Error::new_spanned(other, "name 必须是字符串字面量")),
                        }
                    } else {
                        Err(meta.error("结构体上只支持 #[qualifier(name = \"...\")]"))
                    }
                })?;
            }
            other => {
                return Err(syn::Error::new_spanned(other, "用法: #[qualifier(name = \"...\")]"));
            }
        }
    }
    Ok(args)
}

/// 实现 `#[derive(Qualifier)]`
pub fn derive_qualifier_impl(input: DeriveInput) -> TokenStream {
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> Result<TokenStream2> {
    let args = parse_args(input)?;
    let struct_name = &input.ident;
    let type_name = args.name.unwrap_or_else(|| struct_name.to_string());

    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            struct_name,
            "Qualifier 只能派生在具名字段结构体或单元结构体上",
        ));
    };

    let members = match &data.fields {
        Fields::Named(fields) => fields
            .named
            .iter()
            .map(|field| {
                let ident = field.ident.as_ref().ok_or_else(|| {
                    syn::Error::new_spanned(field, "缺少字段名")
                })?;
                let member = ident.to_string();
                let method = if is_nonbinding(field)? {
                    quote!(with_nonbinding_member)
                } else {
                    quote!(with_member)
                };
                Ok(quote! {
                    .#method(#member, ::std::clone::Clone::clone(&self.#ident))
                })
            })
            .collect::<Result<Vec<_>>>()?,
        Fields::Unit => Vec::new(),
        Fields::Unnamed(fields) => {
            return Err(syn::Error::new_spanned(
                fields,
                "元组结构体的成员没有名字, 无法作为限定符成员",
            ));
        }
    };

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::weld_spi::AsQualifier for #struct_name #ty_generics #where_clause {
            fn to_qualifier(&self) -> ::weld_spi::Qualifier {
                ::weld_spi::Qualifier::new(#type_name)
                    #(#members)*
            }
        }

        impl #impl_generics ::std::convert::From<#struct_name #ty_generics> for ::weld_spi::Qualifier #where_clause {
            fn from(value: #struct_name #ty_generics) -> Self {
                ::weld_spi::AsQualifier::to_qualifier(&value)
            }
        }
    })
}
