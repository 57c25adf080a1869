//! HTTP adapter seam between the container and the web engine.

mod axum_adapter;
mod shutdown;
mod state;

pub use axum_adapter::AxumAdapter;
pub use shutdown::shutdown_signal;
pub use state::AppState;

use crate::config::ServerOptions;
use crate::controller::{HttpMethod, RouteDefinition, RouterFragment};
use crate::di::Container;
use crate::error::Result;
use crate::routes::RoutesResolver;
use async_trait::async_trait;
use axum::Router;
use std::sync::Arc;

/// A transformation applied to the composed router, usually `router.layer(..)`.
pub type Middleware = Box<dyn FnOnce(Router<AppState>) -> Router<AppState> + Send>;

/// Routes mounted on the server, in mount order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteTable {
    routes: Vec<RouteDefinition>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, method: HttpMethod, path: &str) -> bool {
        self.find(method, path).is_some()
    }

    pub fn find(&self, method: HttpMethod, path: &str) -> Option<&RouteDefinition> {
        self.routes
            .iter()
            .find(|route| route.method == method && route.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDefinition> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub(crate) fn push(&mut self, route: RouteDefinition) {
        self.routes.push(route);
    }
}

/// High-level interface for an HTTP framework adapter.
///
/// The factory calls these to create the application, mount every
/// controller's fragment, attach middlewares and finally serve.
#[async_trait]
pub trait HttpAdapter: Send + 'static {
    /// Create the application with opaque server options.
    fn create_app(&mut self, options: ServerOptions) -> Result<()>;

    fn options(&self) -> Option<&ServerOptions>;

    /// The routing table mounted so far.
    fn get_router(&self) -> &RouteTable;

    fn add_middleware(&mut self, middleware: Middleware);

    /// Merge one controller's fragment into the root router.
    fn add_fragment(&mut self, fragment: RouterFragment) -> Result<()>;

    /// Mount the controllers of every module registered in `container`.
    fn register_routes(&mut self, container: &Container) -> Result<usize>
    where
        Self: Sized,
    {
        RoutesResolver::new(container).register_routes(self)
    }

    /// Apply middlewares and bind the container state; the adapter is left empty.
    fn build_router(&mut self, container: Arc<Container>) -> Result<Router>;

    /// Serve until a shutdown signal arrives.
    async fn run(&mut self, container: Arc<Container>, host: &str, port: u16) -> Result<()>;
}
