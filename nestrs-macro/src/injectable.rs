use darling::FromField;
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Generics, Ident, Type};

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectField {
    ident: Option<Ident>,
    ty: Type,
    /// Initializer expression of a plain field.
    default: Option<String>,
    /// Resolve a registered value instead of a component.
    #[darling(default)]
    value: bool,
}

enum FieldKind {
    Dependency(Type),
    Value(Type),
    Plain { init: syn::Expr, text: String },
}

struct ComponentField {
    ident: Ident,
    kind: FieldKind,
}

/// Fields of a component struct, classified as dependencies or plain state.
pub struct ComponentFields {
    fields: Vec<ComponentField>,
}

impl ComponentFields {
    pub fn from_fields(span_source: &Ident, fields: &Fields) -> syn::Result<Self> {
        let named = match fields {
            Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    span_source,
                    "components must be structs with named fields (or unit structs)",
                ))
            }
        };

        let mut parsed = Vec::with_capacity(named.len());
        for field in named {
            let field = InjectField::from_field(field)
                .map_err(|e| syn::Error::new_spanned(field, e.to_string()))?;
            let Some(ident) = field.ident else {
                continue;
            };
            let kind = match (arc_inner(&field.ty), field.default, field.value) {
                (_, Some(text), _) => {
                    let init = syn::parse_str::<syn::Expr>(&text).map_err(|e| {
                        syn::Error::new_spanned(&ident, format!("invalid default `{text}`: {e}"))
                    })?;
                    FieldKind::Plain { init, text }
                }
                (Some(inner), None, true) => FieldKind::Value(inner),
                (Some(inner), None, false) => FieldKind::Dependency(inner),
                (None, None, true) => {
                    return Err(syn::Error::new_spanned(
                        &field.ty,
                        "#[inject(value)] fields must be declared as Arc<T>",
                    ))
                }
                (None, None, false) => FieldKind::Plain {
                    init: syn::parse_quote!(::core::default::Default::default()),
                    text: "Default::default()".to_string(),
                },
            };
            parsed.push(ComponentField { ident, kind });
        }
        Ok(Self { fields: parsed })
    }

    /// `ClassMetadata` builder chain.
    pub fn metadata(&self) -> TokenStream2 {
        let entries = self.fields.iter().map(|field| {
            let name = field.ident.to_string();
            match &field.kind {
                FieldKind::Dependency(ty) => quote! { .dependency::<#ty>(#name) },
                FieldKind::Value(ty) => quote! {
                    .dependency_on(#name, ::nestrs::TypeKey::of::<#ty>(), true)
                },
                FieldKind::Plain { text, .. } => quote! { .instance_var(#name, #text) },
            }
        });
        quote! {
            ::nestrs::ClassMetadata::new(::nestrs::TypeKey::of::<Self>()) #(#entries)*
        }
    }

    /// `Self { .. }` built from the container.
    pub fn constructor(&self) -> TokenStream2 {
        let inits = self.fields.iter().map(|field| {
            let ident = &field.ident;
            match &field.kind {
                FieldKind::Dependency(ty) => quote! { #ident: container.resolve::<#ty>()? },
                FieldKind::Value(ty) => quote! { #ident: container.get::<#ty>()? },
                FieldKind::Plain { init, .. } => quote! { #ident: #init },
            }
        });
        quote! { Self { #(#inits),* } }
    }
}

/// `impl ::nestrs::Component` for a struct.
pub fn component_impl(
    ident: &Ident,
    generics: &Generics,
    fields: &ComponentFields,
    injectable: bool,
) -> TokenStream2 {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let metadata = fields.metadata();
    let constructor = fields.constructor();
    quote! {
        impl #impl_generics ::nestrs::Component for #ident #ty_generics #where_clause {
            const INJECTABLE: bool = #injectable;

            fn metadata() -> ::nestrs::ClassMetadata {
                #metadata
            }

            #[allow(unused_variables)]
            fn inject(container: &::nestrs::Container) -> ::nestrs::Result<Self> {
                Ok(#constructor)
            }
        }
    }
}

pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    generate_injectable_impl(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn generate_injectable_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let fields = match &input.data {
        Data::Struct(data) => ComponentFields::from_fields(&input.ident, &data.fields)?,
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "#[derive(Injectable)] can only be applied to structs",
            ))
        }
    };
    Ok(component_impl(&input.ident, &input.generics, &fields, true))
}

/// Extract the inner type from `Arc<T>`.
pub fn arc_inner(ty: &Type) -> Option<Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Arc" {
        return None;
    }
    match &segment.arguments {
        syn::PathArguments::AngleBracketed(args) => match args.args.first()? {
            syn::GenericArgument::Type(inner) => Some(inner.clone()),
            _ => None,
        },
        _ => None,
    }
}
