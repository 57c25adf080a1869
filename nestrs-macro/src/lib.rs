use proc_macro::TokenStream;

mod controller;
mod http_methods;
mod injectable;
mod module;

/// Derive macro marking a struct as an injectable provider
///
/// `Arc<T>` fields are dependencies resolved from the container. Other fields
/// are plain state initialized with `Default::default()` or the expression
/// given in `#[inject(default = "...")]`. `#[inject(value)]` resolves an
/// `Arc<T>` registered as a pre-built value.
///
/// # Example
/// ```ignore
/// use nestrs::Injectable;
///
/// #[derive(Injectable)]
/// pub struct UserService {
///     repository: Arc<UserRepository>,
///     #[inject(default = "Vec::new()")]
///     cache: Vec<User>,
/// }
/// ```
#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    injectable::derive_injectable(input)
}

/// Attribute macro for defining a controller
///
/// Accepts `prefix` (or `path`) and `tag`; the prefix defaults to the tag.
/// Controllers resolve their dependencies like providers but are not
/// injectable themselves.
///
/// # Example
/// ```ignore
/// use nestrs::controller;
///
/// #[controller(prefix = "/users", tag = "users")]
/// pub struct UserController {
///     user_service: Arc<UserService>,
/// }
/// ```
#[proc_macro_attribute]
pub fn controller(attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::controller_attribute(attr, item)
}

/// Attribute macro collecting the routes of a controller's impl block
///
/// # Example
/// ```ignore
/// #[routes]
/// impl UserController {
///     #[get("/{id}")]
///     async fn get_user(&self, #[param] id: String) -> Json<User> {
///         // ...
///     }
///
///     #[post("/")]
///     #[http_code(201)]
///     async fn create(&self, #[body] dto: CreateUser) -> Json<User> {
///         // ...
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn routes(_attr: TokenStream, item: TokenStream) -> TokenStream {
    controller::routes_attribute(item)
}

/// Attribute macro declaring a module
///
/// # Example
/// ```ignore
/// use nestrs::module;
///
/// #[module(
///     imports = [DatabaseModule, ConfigModule::for_root(json!({"port": 3000}))],
///     controllers = [UserController],
///     providers = [UserService, UserRepository],
///     exports = [UserService],
/// )]
/// pub struct UserModule;
/// ```
#[proc_macro_attribute]
pub fn module(attr: TokenStream, item: TokenStream) -> TokenStream {
    module::module_attribute(attr, item)
}

/// HTTP GET method attribute for controller methods
#[proc_macro_attribute]
pub fn get(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute(item)
}

/// HTTP POST method attribute for controller methods
#[proc_macro_attribute]
pub fn post(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute(item)
}

/// HTTP PUT method attribute for controller methods
#[proc_macro_attribute]
pub fn put(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute(item)
}

/// HTTP DELETE method attribute for controller methods
#[proc_macro_attribute]
pub fn delete(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute(item)
}

/// HTTP PATCH method attribute for controller methods
#[proc_macro_attribute]
pub fn patch(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute(item)
}

/// Response status of a route, e.g. `#[http_code(201)]`
#[proc_macro_attribute]
pub fn http_code(_attr: TokenStream, item: TokenStream) -> TokenStream {
    http_methods::http_method_attribute(item)
}

/// Parameter attribute for request body (JSON)
/// Wraps the parameter with axum::Json extractor
#[proc_macro_attribute]
pub fn body(_attr: TokenStream, item: TokenStream) -> TokenStream {
    // Pass-through, actual handling is done by #[routes] macro
    item
}

/// Parameter attribute for path parameters
/// Wraps the parameter with axum::extract::Path extractor
#[proc_macro_attribute]
pub fn param(_attr: TokenStream, item: TokenStream) -> TokenStream {
    item
}

/// Parameter attribute for query string parameters
/// Wraps the parameter with axum::extract::Query extractor
#[proc_macro_attribute]
pub fn query(_attr: TokenStream, item: TokenStream) -> TokenStream {
    item
}
