//! `#[client_proxy]` 实现
//!
//! 为 trait 生成 `ClientProxy<T>` 与 `Reference<T>` 上的实现:
//! 每个方法都经过 `invoke`, 从而走当前上下文实例与拦截链。

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    FnArg, ItemTrait, Pat, Result, ReturnType, TraitItem, TraitItemFn, Type, TypeReference,
};

/// 实现 `#[client_proxy]`
pub fn client_proxy_impl(args: TokenStream, input: TokenStream) -> TokenStream {
    if !args.is_empty() {
        return syn::Error::new(
            proc_macro2::Span::call_site(),
            "client_proxy 不接受参数",
        )
        .to_compile_error()
        .into();
    }
    let item = match syn::parse::<ItemTrait>(input) {
        Ok(item) => item,
        Err(e) => return e.to_compile_error().into(),
    };
    match expand(&item) {
        Ok(tokens) => tokens.into(),
        Err(e) => {
            let error = e.to_compile_error();
            quote!(#item #error).into()
        }
    }
}

fn expand(item: &ItemTrait) -> Result<TokenStream2> {
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "client_proxy 不支持泛型 trait",
        ));
    }

    let trait_name = &item.ident;
    let methods = item
        .items
        .iter()
        .map(|trait_item| match trait_item {
            TraitItem::Fn(method) => forward_method(trait_name, method),
            other => Err(syn::Error::new_spanned(
                other,
                "client_proxy 只支持方法, 不支持关联类型与常量",
            )),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(quote! {
        #item

        impl<__T> #trait_name for ::weld_core::ClientProxy<__T>
        where
            __T: #trait_name + ::std::any::Any + ::std::marker::Send + ::std::marker::Sync,
        {
            #(#methods)*
        }

        impl<__T> #trait_name for ::weld_core::Reference<__T>
        where
            __T: #trait_name + ::std::any::Any + ::std::marker::Send + ::std::marker::Sync,
        {
            #(#methods)*
        }
    })
}

fn forward_method(trait_name: &syn::Ident, method: &TraitItemFn) -> Result<TokenStream2> {
    let signature = &method.sig;
    let name = &signature.ident;

    if !signature.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &signature.generics,
            "client_proxy 不支持泛型方法",
        ));
    }
    if signature.asyncness.is_some() {
        return Err(syn::Error::new_spanned(signature, "client_proxy 不支持 async 方法"));
    }
    if let ReturnType::Type(_, ty) = &signature.output {
        if borrows(ty) {
            return Err(syn::Error::new_spanned(
                ty,
                "代理方法的返回值不能借用目标实例, 请返回拥有所有权的值",
            ));
        }
    }

    let mut inputs = signature.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                signature,
                "代理方法的接收者必须是 &self",
            ));
        }
    }

    // 参数统一重命名, 模式参数 (如 `_`) 也能转发
    let mut params = Vec::new();
    let mut arguments = Vec::new();
    for (index, input) in inputs.enumerate() {
        let FnArg::Typed(typed) = input else {
            return Err(syn::Error::new_spanned(input, "重复的接收者"));
        };
        let ident = match typed.pat.as_ref() {
            Pat::Ident(pat) => format_ident!("__{}", pat.ident),
            _ => format_ident!("__arg{}", index),
        };
        let ty = &typed.ty;
        params.push(quote!(#ident: #ty));
        arguments.push(ident);
    }

    let output = &signature.output;
    let unsafety = &signature.unsafety;
    let method_name = name.to_string();
    let failure = format!("{trait_name}::{method_name}");

    Ok(quote! {
        #unsafety fn #name(&self #(, #params)*) #output {
            match self.invoke(#method_name, move |__target: &__T| {
                <__T as #trait_name>::#name(__target #(, #arguments)*)
            }) {
                ::std::result::Result::Ok(value) => value,
                ::std::result::Result::Err(error) => {
                    ::std::panic!("客户端代理调用失败: {}: {}", #failure, error)
                }
            }
        }
    })
}

/// 类型中是否含有非 `'static` 的引用或生命周期
fn borrows(ty: &Type) -> bool {
    match ty {
        Type::Reference(TypeReference { lifetime, elem, .. }) => {
            lifetime.as_ref().map_or(true, |l| l.ident != "static") || borrows(elem)
        }
        Type::Paren(inner) => borrows(&inner.elem),
        Type::Group(inner) => borrows(&inner.elem),
        Type::Tuple(tuple) => tuple.elems.iter().any(borrows),
        Type::Array(array) => borrows(&array.elem),
        Type::Slice(slice) => borrows(&slice.elem),
        Type::Path(path) => path.path.segments.iter().any(|segment| {
            match &segment.arguments {
                syn::PathArguments::AngleBracketed(args) => args.args.iter().any(|arg| match arg {
                    syn::GenericArgument::Lifetime(lifetime) => lifetime.ident != "static",
                    syn::GenericArgument::Type(inner) => borrows(inner),
                    _ => false,
                }),
                _ => false,
            }
        }),
        _ => false,
    }
}
