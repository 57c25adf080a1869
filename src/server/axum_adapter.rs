use super::{shutdown_signal, AppState, HttpAdapter, Middleware, RouteTable};
use crate::config::ServerOptions;
use crate::controller::{RouterFragment, find_conflict};
use crate::di::Container;
use crate::error::{NestError, Result};
use async_trait::async_trait;
use axum::Router;
use std::sync::Arc;

/// The default adapter, serving the composed router with axum on tokio.
pub struct AxumAdapter {
    options: Option<ServerOptions>,
    router: Router<AppState>,
    route_table: RouteTable,
    middlewares: Vec<Middleware>,
}

impl AxumAdapter {
    pub fn new() -> Self {
        Self {
            options: None,
            router: Router::new(),
            route_table: RouteTable::new(),
            middlewares: Vec::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.options.is_some()
    }
}

impl Default for AxumAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpAdapter for AxumAdapter {
    fn create_app(&mut self, options: ServerOptions) -> Result<()> {
        tracing::debug!(title = %options.title, version = %options.version, "creating axum application");
        self.options = Some(options);
        Ok(())
    }

    fn options(&self) -> Option<&ServerOptions> {
        self.options.as_ref()
    }

    fn get_router(&self) -> &RouteTable {
        &self.route_table
    }

    fn add_middleware(&mut self, middleware: Middleware) {
        self.middlewares.push(middleware);
    }

    fn add_fragment(&mut self, fragment: RouterFragment) -> Result<()> {
        let controller = fragment.controller();
        let (routes, router) = fragment.into_parts();

        let clash = routes
            .iter()
            .find(|route| self.route_table.iter().any(|r| r.conflicts_with(route)))
            .or_else(|| find_conflict(&routes));
        if let Some(route) = clash {
            return Err(NestError::DuplicateRoute {
                method: route.method,
                path: route.path.clone(),
                endpoint: route.endpoint.clone(),
            });
        }

        for route in routes {
            tracing::debug!(controller, route = %route, "mapped");
            self.route_table.push(route);
        }
        self.router = std::mem::take(&mut self.router).merge(router);
        Ok(())
    }

    fn build_router(&mut self, container: Arc<Container>) -> Result<Router> {
        if !self.is_initialized() {
            return Err(NestError::Server(
                "axum application not created yet, call create_app() first".to_string(),
            ));
        }
        let mut router = std::mem::take(&mut self.router);
        for middleware in self.middlewares.drain(..) {
            router = middleware(router);
        }
        Ok(router.with_state(AppState::new(container)))
    }

    async fn run(&mut self, container: Arc<Container>, host: &str, port: u16) -> Result<()> {
        let router = self.build_router(container)?;
        let listener = tokio::net::TcpListener::bind((host, port)).await?;
        tracing::info!("Server running on http://{}", listener.local_addr()?);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{HttpMethod, RouteDefinition};
    use axum::routing::get;

    fn fragment(controller: &'static str, paths: &[&str]) -> RouterFragment {
        let mut router = Router::new();
        let mut routes = Vec::new();
        for path in paths {
            router = router.route(path, get(|| async { "ok" }));
            routes.push(RouteDefinition::new(
                HttpMethod::Get,
                *path,
                format!("{controller}.handler"),
            ));
        }
        RouterFragment::new(controller, "", None, routes, router)
    }

    #[test]
    fn test_fragments_extend_route_table() {
        let mut adapter = AxumAdapter::new();
        adapter.add_fragment(fragment("A", &["/a/"])).unwrap();
        adapter.add_fragment(fragment("B", &["/b/", "/b/{id}"])).unwrap();

        let table = adapter.get_router();
        assert_eq!(table.len(), 3);
        assert!(table.contains(HttpMethod::Get, "/b/{id}"));
        assert!(!table.contains(HttpMethod::Post, "/a/"));
    }

    #[test]
    fn test_duplicate_route_is_rejected() {
        let mut adapter = AxumAdapter::new();
        adapter.add_fragment(fragment("A", &["/same"])).unwrap();
        let err = adapter.add_fragment(fragment("B", &["/same"])).unwrap_err();
        assert!(matches!(
            err,
            NestError::DuplicateRoute { method: HttpMethod::Get, ref path, ref endpoint }
                if path == "/same" && endpoint == "B.handler"
        ));
        assert_eq!(adapter.get_router().len(), 1);
    }

    #[test]
    fn test_param_name_variants_are_rejected_before_merge() {
        let mut adapter = AxumAdapter::new();
        adapter.add_fragment(fragment("A", &["/a/item/{id}"])).unwrap();
        let err = adapter
            .add_fragment(fragment("B", &["/a/item/{name}"]))
            .unwrap_err();
        assert!(matches!(
            err,
            NestError::DuplicateRoute { ref path, .. } if path == "/a/item/{name}"
        ));
        adapter.add_fragment(fragment("C", &["/a/item/{id}/tags"])).unwrap();
        assert_eq!(adapter.get_router().len(), 2);
    }

    #[test]
    fn test_build_router_requires_create_app() {
        let mut adapter = AxumAdapter::new();
        let container = Arc::new(Container::new());
        assert!(matches!(
            adapter.build_router(Arc::clone(&container)),
            Err(NestError::Server(_))
        ));

        adapter.create_app(ServerOptions::default()).unwrap();
        assert!(adapter.build_router(container).is_ok());
    }
}
