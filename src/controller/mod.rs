//! Controllers and the router fragments they contribute.
//!
//! Controller functionality is primarily provided through macros:
//! - `#[controller(prefix = "...", tag = "...")]` on the struct
//! - `#[routes]` on its impl block, with `#[get]`, `#[post]`, `#[put]`,
//!   `#[delete]`, `#[patch]` on the handler methods
//!
//! The macros generate:
//! 1. a `Component` implementation (controllers are not injectable)
//! 2. a `Controller` implementation holding the route table and axum router

use crate::di::{Component, ComponentDef, Instance, TypeKey};
use crate::error::{NestError, Result};
use crate::server::AppState;
use axum::Router;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use strum_macros::{AsRefStr, Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

/// One declared route: `{path, http_method, endpoint, kwargs}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteDefinition {
    pub method: HttpMethod,
    pub path: String,
    /// `Controller.method` name of the handler.
    pub endpoint: String,
    pub kwargs: BTreeMap<&'static str, String>,
}

impl RouteDefinition {
    pub fn new(method: HttpMethod, path: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            endpoint: endpoint.into(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn with_kwarg(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.kwargs.insert(key, value.into());
        self
    }

    /// Whether both routes cannot be mounted on one router.
    ///
    /// Paths with the same shape clash when they differ only in parameter
    /// names, whatever the method, or when they are identical and share a
    /// method.
    pub fn conflicts_with(&self, other: &RouteDefinition) -> bool {
        route_shape(&self.path) == route_shape(&other.path)
            && (self.path != other.path || self.method == other.method)
    }
}

/// The path with every `{param}` segment replaced by `{}` and every
/// `{*rest}` segment by `{*}`.
pub fn route_shape(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if segment.starts_with("{*") && segment.ends_with('}') {
                "{*}"
            } else if segment.starts_with('{') && segment.ends_with('}') {
                "{}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// First route of `routes` clashing with an earlier one.
pub(crate) fn find_conflict(routes: &[RouteDefinition]) -> Option<&RouteDefinition> {
    routes
        .iter()
        .enumerate()
        .find(|(idx, route)| routes[..*idx].iter().any(|r| r.conflicts_with(route)))
        .map(|(_, route)| route)
}

impl fmt::Display for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Implemented by `#[routes]` for types declared with `#[controller]`.
pub trait Controller: Component {
    /// Normalized prefix: leading `/`, no trailing `/`, empty for the root.
    fn prefix() -> &'static str;

    fn tag() -> Option<&'static str> {
        None
    }

    /// Route table with full paths (prefix included).
    fn routes() -> Vec<RouteDefinition>;

    fn router(controller: Arc<Self>) -> Router<AppState>;
}

/// The routes of one controller instance, ready to merge into the root app.
pub struct RouterFragment {
    controller: &'static str,
    prefix: &'static str,
    tag: Option<&'static str>,
    routes: Vec<RouteDefinition>,
    router: Router<AppState>,
}

impl RouterFragment {
    pub fn new(
        controller: &'static str,
        prefix: &'static str,
        tag: Option<&'static str>,
        routes: Vec<RouteDefinition>,
        router: Router<AppState>,
    ) -> Self {
        Self {
            controller,
            prefix,
            tag,
            routes,
            router,
        }
    }

    pub fn controller(&self) -> &'static str {
        self.controller
    }

    pub fn prefix(&self) -> &'static str {
        self.prefix
    }

    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn get_router(&self) -> &Router<AppState> {
        &self.router
    }

    pub fn into_parts(self) -> (Vec<RouteDefinition>, Router<AppState>) {
        (self.routes, self.router)
    }
}

/// Registration record of a controller.
#[derive(Clone)]
pub struct ControllerDef {
    component: ComponentDef,
    prefix: fn() -> &'static str,
    routes: fn() -> Vec<RouteDefinition>,
    fragment: fn(Instance) -> Result<RouterFragment>,
}

impl ControllerDef {
    pub fn of<C: Controller>() -> Self {
        Self {
            component: ComponentDef::of::<C>(),
            prefix: C::prefix,
            routes: C::routes,
            fragment: build_fragment::<C>,
        }
    }

    pub fn key(&self) -> TypeKey {
        self.component.key()
    }

    pub fn name(&self) -> &'static str {
        self.component.name()
    }

    pub fn component(&self) -> &ComponentDef {
        &self.component
    }

    pub fn prefix(&self) -> &'static str {
        (self.prefix)()
    }

    pub fn routes(&self) -> Vec<RouteDefinition> {
        (self.routes)()
    }

    /// Build the router fragment around the controller singleton.
    pub fn fragment(&self, instance: Instance) -> Result<RouterFragment> {
        (self.fragment)(instance)
    }
}

impl fmt::Debug for ControllerDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerDef")
            .field("type", &self.key())
            .field("prefix", &self.prefix())
            .finish()
    }
}

fn build_fragment<C: Controller>(instance: Instance) -> Result<RouterFragment> {
    let controller = instance
        .downcast::<C>()
        .map_err(|_| NestError::DowncastFailed {
            type_name: std::any::type_name::<C>().to_string(),
        })?;
    let routes = C::routes();
    if let Some(route) = find_conflict(&routes) {
        return Err(NestError::DuplicateRoute {
            method: route.method,
            path: route.path.clone(),
            endpoint: route.endpoint.clone(),
        });
    }
    Ok(RouterFragment::new(
        TypeKey::of::<C>().short_name(),
        C::prefix(),
        C::tag(),
        routes,
        C::router(controller),
    ))
}

/// Normalize a controller prefix: leading `/`, no trailing `/`.
pub fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Join a normalized prefix and a route path into the mounted path.
pub fn join_path(prefix: &str, path: &str) -> String {
    let joined = format!("{prefix}{path}");
    if joined.starts_with('/') {
        joined
    } else {
        format!("/{joined}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_http_method_strings() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Delete.as_ref(), "DELETE");
        assert_eq!(HttpMethod::from_str("patch").unwrap(), HttpMethod::Patch);
        assert!(HttpMethod::from_str("TRACE").is_err());
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("user"), "/user");
        assert_eq!(normalize_prefix("/user/"), "/user");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(""), "");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("/user", "/"), "/user/");
        assert_eq!(join_path("/user", "/{id}"), "/user/{id}");
        assert_eq!(join_path("/user", ""), "/user");
        assert_eq!(join_path("", "/"), "/");
        assert_eq!(join_path("", "health"), "/health");
    }

    #[test]
    fn test_routes_with_same_shape_conflict() {
        let by_id = RouteDefinition::new(HttpMethod::Get, "/a/item/{id}", "A.one");
        let by_name = RouteDefinition::new(HttpMethod::Get, "/a/item/{name}", "A.named");
        let post = RouteDefinition::new(HttpMethod::Post, "/a/item/{id}", "A.update");
        let static_segment = RouteDefinition::new(HttpMethod::Get, "/a/item/latest", "A.latest");

        assert_eq!(route_shape("/a/item/{id}"), "/a/item/{}");
        assert_eq!(route_shape("/files/{*rest}"), "/files/{*}");
        assert!(by_id.conflicts_with(&by_name));
        assert!(by_id.conflicts_with(&by_id));
        assert!(!by_id.conflicts_with(&post));
        assert!(post.conflicts_with(&by_name));
        assert!(!by_id.conflicts_with(&static_segment));

        let routes = vec![by_id, post, by_name];
        assert_eq!(find_conflict(&routes).map(|r| r.endpoint.as_str()), Some("A.named"));
        assert!(find_conflict(&routes[..2]).is_none());
    }

    #[test]
    fn test_route_definition_display_and_kwargs() {
        let route = RouteDefinition::new(HttpMethod::Post, "/user/", "UserController.create")
            .with_kwarg("status_code", "201");
        assert_eq!(route.to_string(), "POST /user/");
        assert_eq!(route.kwargs.get("status_code").map(String::as_str), Some("201"));
    }
}
