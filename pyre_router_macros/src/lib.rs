//! `#[handler]` attribute for pyre-router.
//!
//! ```ignore
//! #[handler]
//! pub fn body(body: Body, request: &mut Request) -> anyhow::Result<serde_json::Value> {
//!     Ok(json!({ "body": body }))
//! }
//! ```
//!
//! becomes `pub fn body() -> Handler` whose manifest declares `body: Body`
//! then `request: Request`, in source order. Owned parameters are moved out
//! of the resolved arguments; a `&Request` or `&mut Request` parameter
//! borrows the live request. Only pyre_router's own `Request` qualifies;
//! borrowing any other type named `Request` is a compile error.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, LitStr, Pat, Type, TypeReference,
};

struct ParamSpec {
    ident: Ident,
    name: String,
    kind: ParamKind,
}

enum ParamKind {
    Owned(Type),
    Request(TypeReference),
}

/// How a parameter type relates to the live request.
enum RequestRef {
    /// `Request`, `request::Request` or `pyre_router::request::Request`
    Live,
    /// Some other type that happens to be named `Request`
    Foreign,
    NotRequest,
}

fn classify(ty: &Type) -> RequestRef {
    let path = match ty {
        Type::Paren(p) => return classify(&p.elem),
        Type::Group(g) => return classify(&g.elem),
        Type::Path(p) if p.qself.is_none() => &p.path,
        _ => return RequestRef::NotRequest,
    };
    let Some(last) = path.segments.last() else {
        return RequestRef::NotRequest;
    };
    if last.ident != "Request" {
        return RequestRef::NotRequest;
    }
    if !last.arguments.is_empty() {
        return RequestRef::Foreign;
    }
    let prefix: Vec<String> = path
        .segments
        .iter()
        .rev()
        .skip(1)
        .map(|seg| seg.ident.to_string())
        .collect();
    let live = match prefix.as_slice() {
        [] => true,
        [m] => m == "request" || m == "pyre_router",
        [m, root] => m == "request" && (root == "pyre_router" || root == "crate"),
        _ => false,
    };
    if live {
        RequestRef::Live
    } else {
        RequestRef::Foreign
    }
}

fn collect_params(func: &ItemFn) -> syn::Result<Vec<ParamSpec>> {
    let mut params = Vec::with_capacity(func.sig.inputs.len());
    let mut request_seen: Option<Span> = None;

    for input in &func.sig.inputs {
        let typed = match input {
            FnArg::Receiver(r) => {
                return Err(syn::Error::new(
                    r.span(),
                    "#[handler] functions cannot take `self`",
                ))
            }
            FnArg::Typed(t) => t,
        };
        let ident = match &*typed.pat {
            Pat::Ident(p) if p.by_ref.is_none() && p.subpat.is_none() => p.ident.clone(),
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "#[handler] parameters must be plain identifiers",
                ))
            }
        };
        let name = syn::ext::IdentExt::unraw(&ident).to_string();

        let kind = match &*typed.ty {
            Type::Reference(r) if matches!(classify(&r.elem), RequestRef::Foreign) => {
                return Err(syn::Error::new(
                    r.elem.span(),
                    "only pyre_router's `Request` may be borrowed; this type is a different `Request`",
                ))
            }
            Type::Reference(r) if matches!(classify(&r.elem), RequestRef::Live) => {
                if let Some(first) = request_seen {
                    let mut err = syn::Error::new(
                        typed.ty.span(),
                        "a handler may take the request at most once",
                    );
                    err.combine(syn::Error::new(first, "request first taken here"));
                    return Err(err);
                }
                request_seen = Some(typed.ty.span());
                ParamKind::Request(r.clone())
            }
            Type::Reference(r) => {
                return Err(syn::Error::new(
                    r.span(),
                    "only `&Request` or `&mut Request` may be borrowed; other parameters are owned",
                ))
            }
            ty => ParamKind::Owned(ty.clone()),
        };
        params.push(ParamSpec { ident, name, kind });
    }
    Ok(params)
}

fn parse_name(attr: TokenStream2, default: &Ident) -> syn::Result<LitStr> {
    let mut name = LitStr::new(
        &syn::ext::IdentExt::unraw(default).to_string(),
        default.span(),
    );
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("name") {
            name = meta.value()?.parse()?;
            Ok(())
        } else {
            Err(meta.error("unsupported #[handler] option; expected `name = \"...\"`"))
        }
    });
    syn::parse::Parser::parse2(parser, attr)?;
    Ok(name)
}

fn expand(attr: TokenStream2, func: ItemFn) -> syn::Result<TokenStream2> {
    let sig = &func.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new(
            asyncness.span(),
            "#[handler] functions must be synchronous",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new(
            sig.generics.span(),
            "#[handler] functions cannot be generic",
        ));
    }

    let handler_name = parse_name(attr, &sig.ident)?;
    let params = collect_params(&func)?;

    let vis = &func.vis;
    let attrs = &func.attrs;
    let outer_ident = &sig.ident;
    let inner_ident = format_ident!("__{}_body", sig.ident);

    let mut inner_sig = sig.clone();
    inner_sig.ident = inner_ident.clone();
    let block = &func.block;

    let declare = params.iter().map(|p| {
        let name = &p.name;
        match &p.kind {
            ParamKind::Owned(ty) => quote! { .param::<#ty>(#name) },
            ParamKind::Request(r) => {
                let elem = &r.elem;
                quote! { .param::<#elem>(#name) }
            }
        }
    });

    let args = format_ident!("__args");
    // owned values first; taking the request consumes the arguments
    let takes = params.iter().filter_map(|p| match &p.kind {
        ParamKind::Owned(ty) => {
            let ident = &p.ident;
            let name = &p.name;
            Some(quote! { let #ident: #ty = #args.take::<#ty>(#name)?; })
        }
        ParamKind::Request(_) => None,
    });
    let borrow = params.iter().find_map(|p| match &p.kind {
        ParamKind::Request(r) => {
            let ident = &p.ident;
            let name = &p.name;
            Some(quote! { let #ident: #r = #args.into_request(#name)?; })
        }
        ParamKind::Owned(_) => None,
    });
    let call_args = params.iter().map(|p| &p.ident);

    let has_owned = params.iter().any(|p| matches!(p.kind, ParamKind::Owned(_)));
    let binding = if params.is_empty() {
        quote! { _ }
    } else if has_owned {
        quote! { mut #args }
    } else {
        quote! { #args }
    };

    Ok(quote! {
        #(#attrs)*
        #[must_use]
        #vis fn #outer_ident() -> ::pyre_router::handler::Handler {
            #[allow(clippy::needless_pass_by_value)]
            #inner_sig #block

            ::pyre_router::handler::Handler::builder(#handler_name)
                #(#declare)*
                .build(|#binding| {
                    #(#takes)*
                    #borrow
                    #inner_ident(#(#call_args),*)
                })
        }
    })
}

/// Turn `fn name(params) -> anyhow::Result<R>` into `fn name() -> Handler`.
///
/// Options: `#[handler(name = "custom")]` overrides the handler name, which
/// otherwise is the function name.
#[proc_macro_attribute]
pub fn handler(attr: TokenStream, item: TokenStream) -> TokenStream {
    let func = parse_macro_input!(item as ItemFn);
    match expand(attr.into(), func) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
