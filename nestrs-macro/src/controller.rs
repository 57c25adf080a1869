use crate::injectable::{component_impl, ComponentFields};
use darling::{ast::NestedMeta, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, FnArg, ImplItem, ItemImpl, ItemStruct, LitInt, LitStr};

const HTTP_METHODS: [&str; 5] = ["get", "post", "put", "delete", "patch"];
const PARAM_ATTRS: [&str; 3] = ["body", "param", "query"];

#[derive(FromMeta, Default)]
#[darling(default)]
struct ControllerArgs {
    prefix: Option<String>,
    path: Option<String>,
    tag: Option<String>,
}

pub fn controller_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    let args = match NestedMeta::parse_meta_list(attr.into()) {
        Ok(list) => list,
        Err(e) => return e.into_compile_error().into(),
    };
    let args = match ControllerArgs::from_list(&args) {
        Ok(args) => args,
        Err(e) => return e.write_errors().into(),
    };
    generate_controller_impl(&args, &input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn generate_controller_impl(args: &ControllerArgs, input: &ItemStruct) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let raw_prefix = args
        .prefix
        .as_deref()
        .or(args.path.as_deref())
        .or(args.tag.as_deref())
        .unwrap_or("");
    let prefix = normalize_prefix(raw_prefix);
    let tag = match &args.tag {
        Some(tag) => quote! { ::core::option::Option::Some(#tag) },
        None => quote! { ::core::option::Option::None },
    };

    let fields = ComponentFields::from_fields(struct_name, &input.fields)?;
    let component = component_impl(struct_name, &input.generics, &fields, false);
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    // `inject` is registered only for the derive, so it cannot stay on the item.
    let mut item = input.clone();
    for field in item.fields.iter_mut() {
        field.attrs.retain(|attr| !attr.path().is_ident("inject"));
    }

    Ok(quote! {
        #item

        #component

        impl #impl_generics #struct_name #ty_generics #where_clause {
            pub const PREFIX: &'static str = #prefix;
            pub const TAG: ::core::option::Option<&'static str> = #tag;
        }
    })
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[derive(Clone, Copy)]
enum ParamKind {
    Body,
    Param,
    Query,
    Raw,
}

struct ParamInfo {
    ty: syn::Type,
    kind: ParamKind,
}

struct RouteInfo {
    method: syn::Ident,
    path: String,
    fn_name: syn::Ident,
    is_async: bool,
    status_code: Option<u16>,
    params: Vec<ParamInfo>,
}

pub fn routes_attribute(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemImpl);
    generate_routes_impl(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn generate_routes_impl(input: ItemImpl) -> syn::Result<TokenStream2> {
    let controller_name = match &*input.self_ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string()),
        _ => None,
    }
    .ok_or_else(|| syn::Error::new_spanned(&input.self_ty, "#[routes] expects `impl Controller`"))?;

    let mut routes: Vec<RouteInfo> = Vec::new();
    let mut clean_items: Vec<ImplItem> = Vec::new();

    for item in input.items.iter() {
        let ImplItem::Fn(method) = item else {
            clean_items.push(item.clone());
            continue;
        };
        let Some(route_info) = extract_route_info(method)? else {
            clean_items.push(item.clone());
            continue;
        };
        routes.push(route_info);

        let mut clean_method = method.clone();
        clean_method
            .attrs
            .retain(|attr| !is_http_method_attr(attr) && !attr.path().is_ident("http_code"));
        for input in clean_method.sig.inputs.iter_mut() {
            if let FnArg::Typed(pat_type) = input {
                pat_type.attrs.retain(|attr| !is_param_attr(attr));
            }
        }
        clean_items.push(ImplItem::Fn(clean_method));
    }

    let route_definitions = routes.iter().map(|route| {
        let variant = match route.method.to_string().as_str() {
            "post" => quote! { Post },
            "put" => quote! { Put },
            "delete" => quote! { Delete },
            "patch" => quote! { Patch },
            _ => quote! { Get },
        };
        let path = &route.path;
        let endpoint = format!("{controller_name}.{}", route.fn_name);
        let status = route.status_code.map(|code| {
            let code = code.to_string();
            quote! { .with_kwarg("status_code", #code) }
        });
        quote! {
            routes.push(
                ::nestrs::RouteDefinition::new(
                    ::nestrs::HttpMethod::#variant,
                    ::nestrs::controller::join_path(Self::PREFIX, #path),
                    #endpoint,
                )
                #status
            );
        }
    });

    let route_registrations = routes.iter().map(|route| {
        let method_ident = &route.method;
        let path = &route.path;
        let fn_name = &route.fn_name;

        let extractor_patterns: Vec<_> = route
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let temp_ident = format_ident!("__p_{}", i);
                let ty = &p.ty;
                match p.kind {
                    ParamKind::Body => quote! { ::nestrs::axum::Json(#temp_ident): ::nestrs::axum::Json<#ty> },
                    ParamKind::Param => quote! { ::nestrs::axum::extract::Path(#temp_ident): ::nestrs::axum::extract::Path<#ty> },
                    ParamKind::Query => quote! { ::nestrs::axum::extract::Query(#temp_ident): ::nestrs::axum::extract::Query<#ty> },
                    ParamKind::Raw => quote! { #temp_ident: #ty },
                }
            })
            .collect();
        let internal_args: Vec<_> = (0..route.params.len())
            .map(|i| format_ident!("__p_{}", i))
            .collect();

        let call = if route.is_async {
            quote! { controller.#fn_name(#(#internal_args),*).await }
        } else {
            quote! { controller.#fn_name(#(#internal_args),*) }
        };
        let respond = match route.status_code {
            Some(code) => quote! {
                let mut response = #call.into_response();
                if let Ok(status) = ::nestrs::axum::http::StatusCode::from_u16(#code) {
                    *response.status_mut() = status;
                }
                response
            },
            None => quote! { #call.into_response() },
        };

        quote! {
            router = router.route(
                &::nestrs::controller::join_path(Self::PREFIX, #path),
                ::nestrs::axum::routing::#method_ident({
                    let controller = controller.clone();
                    move |#(#extractor_patterns),*| {
                        let controller = controller.clone();
                        async move {
                            use ::nestrs::axum::response::IntoResponse;
                            #respond
                        }
                    }
                }),
            );
        }
    });

    let self_ty = &input.self_ty;
    let (impl_generics, _, where_clause) = input.generics.split_for_impl();
    let attrs = &input.attrs;

    Ok(quote! {
        #(#attrs)*
        impl #impl_generics #self_ty #where_clause {
            #(#clean_items)*
        }

        impl #impl_generics ::nestrs::Controller for #self_ty #where_clause {
            fn prefix() -> &'static str {
                Self::PREFIX
            }

            fn tag() -> ::core::option::Option<&'static str> {
                Self::TAG
            }

            fn routes() -> ::std::vec::Vec<::nestrs::RouteDefinition> {
                let mut routes = ::std::vec::Vec::new();
                #(#route_definitions)*
                routes
            }

            fn router(
                controller: ::std::sync::Arc<Self>,
            ) -> ::nestrs::axum::Router<::nestrs::server::AppState> {
                let mut router = ::nestrs::axum::Router::new();
                #(#route_registrations)*
                let _ = &controller;
                router
            }
        }
    })
}

fn extract_route_info(method: &syn::ImplItemFn) -> syn::Result<Option<RouteInfo>> {
    let mut http_method = None;
    let mut path = String::from("/");
    let mut status_code = None;

    for attr in &method.attrs {
        let Some(ident) = attr.path().get_ident() else {
            continue;
        };
        if HTTP_METHODS.contains(&ident.to_string().as_str()) {
            if http_method.is_some() {
                return Err(syn::Error::new_spanned(attr, "a handler maps exactly one HTTP method"));
            }
            http_method = Some(ident.clone());
            if let syn::Meta::List(_) = &attr.meta {
                let lit: LitStr = attr.parse_args()?;
                if lit.value().is_empty() {
                    return Err(syn::Error::new_spanned(lit, "route path must not be empty, use \"/\""));
                }
                path = lit.value();
            }
        } else if ident == "http_code" {
            let lit: LitInt = attr.parse_args()?;
            let code: u16 = lit.base10_parse()?;
            if !(100..=999).contains(&code) {
                return Err(syn::Error::new_spanned(lit, "HTTP status code must be in 100..=999"));
            }
            status_code = Some(code);
        }
    }
    let Some(http_method) = http_method else {
        return Ok(None);
    };
    if method.sig.receiver().is_none() {
        return Err(syn::Error::new_spanned(
            &method.sig,
            "route handlers must take `&self`",
        ));
    }

    let params = method
        .sig
        .inputs
        .iter()
        .filter_map(|input| match input {
            FnArg::Typed(pat_type) => Some(ParamInfo {
                ty: (*pat_type.ty).clone(),
                kind: get_param_kind(&pat_type.attrs),
            }),
            FnArg::Receiver(_) => None,
        })
        .collect();

    Ok(Some(RouteInfo {
        method: http_method,
        path,
        fn_name: method.sig.ident.clone(),
        is_async: method.sig.asyncness.is_some(),
        status_code,
        params,
    }))
}

fn get_param_kind(attrs: &[Attribute]) -> ParamKind {
    for attr in attrs {
        if attr.path().is_ident("body") {
            return ParamKind::Body;
        } else if attr.path().is_ident("param") {
            return ParamKind::Param;
        } else if attr.path().is_ident("query") {
            return ParamKind::Query;
        }
    }
    ParamKind::Raw
}

fn is_http_method_attr(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| HTTP_METHODS.contains(&ident.to_string().as_str()))
}

fn is_param_attr(attr: &Attribute) -> bool {
    attr.path()
        .get_ident()
        .is_some_and(|ident| PARAM_ATTRS.contains(&ident.to_string().as_str()))
}
