use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse::Parse, parse::ParseStream, parse_macro_input, Attribute, Expr, ItemStruct, LitBool, Path, Token};

/// One entry of a type list, keeping its `#[cfg]`-style attributes.
struct ModuleItem {
    attrs: Vec<Attribute>,
    path: Path,
}

impl Parse for ModuleItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let path = input.parse()?;
        Ok(ModuleItem { attrs, path })
    }
}

/// An import: a module type, or an expression producing a `ModuleDef`
/// such as `ConfigModule::for_root(..)`.
struct ImportItem {
    attrs: Vec<Attribute>,
    expr: Expr,
}

impl Parse for ImportItem {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let expr = input.parse()?;
        Ok(ImportItem { attrs, expr })
    }
}

#[derive(Default)]
struct ModuleArgs {
    imports: Option<Vec<ImportItem>>,
    controllers: Option<Vec<ModuleItem>>,
    providers: Option<Vec<ModuleItem>>,
    exports: Option<Vec<ModuleItem>>,
    global: bool,
}

impl Parse for ModuleArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut args = ModuleArgs::default();

        while !input.is_empty() {
            let name: syn::Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            if name == "global" {
                let value: LitBool = input.parse()?;
                args.global = value.value;
            } else {
                // Parse array: [Item1, Item2, ...]
                let content;
                syn::bracketed!(content in input);

                if name == "imports" {
                    let items = content.parse_terminated(ImportItem::parse, Token![,])?;
                    args.imports = Some(items.into_iter().collect());
                } else if name == "controllers" {
                    let items = content.parse_terminated(ModuleItem::parse, Token![,])?;
                    args.controllers = Some(items.into_iter().collect());
                } else if name == "providers" {
                    let items = content.parse_terminated(ModuleItem::parse, Token![,])?;
                    args.providers = Some(items.into_iter().collect());
                } else if name == "exports" {
                    let items = content.parse_terminated(ModuleItem::parse, Token![,])?;
                    args.exports = Some(items.into_iter().collect());
                } else {
                    return Err(syn::Error::new_spanned(
                        &name,
                        "expected one of `imports`, `providers`, `controllers`, `exports`, `global`",
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(args)
    }
}

pub fn module_attribute(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as ModuleArgs);
    let input = parse_macro_input!(item as ItemStruct);
    let expanded = generate_module_impl(&args, &input);

    TokenStream::from(expanded)
}

fn generate_module_impl(args: &ModuleArgs, input: &ItemStruct) -> TokenStream2 {
    let module_name = &input.ident;
    let global = args.global;

    let imports = args.imports.as_ref().map(|imports| {
        let pushes = imports.iter().map(|item| {
            let attrs = &item.attrs;
            let expr = &item.expr;
            let def = match expr {
                Expr::Path(path) => quote! { ::nestrs::ModuleDef::of::<#path>() },
                other => quote! { #other },
            };
            quote! {
                #(#attrs)*
                imports.push(#def);
            }
        });
        quote! {
            let mut imports = ::std::vec::Vec::new();
            #(#pushes)*
            descriptor = descriptor.imports(imports);
        }
    });

    let providers = args.providers.as_ref().map(|providers| {
        let pushes = providers.iter().map(|item| {
            let attrs = &item.attrs;
            let path = &item.path;
            quote! {
                #(#attrs)*
                providers.push(::nestrs::ComponentDef::of::<#path>());
            }
        });
        quote! {
            let mut providers = ::std::vec::Vec::new();
            #(#pushes)*
            descriptor = descriptor.providers(providers);
        }
    });

    let controllers = args.controllers.as_ref().map(|controllers| {
        let pushes = controllers.iter().map(|item| {
            let attrs = &item.attrs;
            let path = &item.path;
            quote! {
                #(#attrs)*
                controllers.push(::nestrs::ControllerDef::of::<#path>());
            }
        });
        quote! {
            let mut controllers = ::std::vec::Vec::new();
            #(#pushes)*
            descriptor = descriptor.controllers(controllers);
        }
    });

    let exports = args.exports.as_ref().map(|exports| {
        let pushes = exports.iter().map(|item| {
            let attrs = &item.attrs;
            let path = &item.path;
            quote! {
                #(#attrs)*
                exports.push(::nestrs::TypeKey::of::<#path>());
            }
        });
        quote! {
            let mut exports = ::std::vec::Vec::new();
            #(#pushes)*
            descriptor = descriptor.exports(exports);
        }
    });

    quote! {
        #input

        impl ::nestrs::Module for #module_name {
            #[allow(unused_mut, clippy::vec_init_then_push)]
            fn descriptor() -> ::nestrs::ModuleDescriptor {
                let mut descriptor = ::nestrs::ModuleDescriptor::new();
                #imports
                #providers
                #controllers
                #exports
                descriptor.global(#global)
            }
        }
    }
}
