//! Application bootstrap.
//!
//! [`NestFactory`] builds the container from a root module, creates the HTTP
//! application through an adapter and mounts every controller.
//!
//! ```rust,ignore
//! use nestrs::{NestFactory, ServerOptions};
//!
//! #[tokio::main]
//! async fn main() -> nestrs::Result<()> {
//!     let mut app = NestFactory::create::<AppModule>(ServerOptions::from_env())?;
//!     app.listen("0.0.0.0", 3000).await
//! }
//! ```

mod context;

pub use context::ApplicationContext;

use crate::config::{ContainerConfig, ServerOptions};
use crate::di::Container;
use crate::error::Result;
use crate::module::{Module, ModuleDef};
use crate::server::{AppState, AxumAdapter, HttpAdapter};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;

pub struct NestFactory;

impl NestFactory {
    /// Boot `M` on the default axum adapter.
    pub fn create<M: Module>(options: ServerOptions) -> Result<NestApp<AxumAdapter>> {
        Self::create_with_adapter::<M, _>(AxumAdapter::new(), options)
    }

    pub fn create_with_adapter<M: Module, A: HttpAdapter>(
        adapter: A,
        options: ServerOptions,
    ) -> Result<NestApp<A>> {
        Self::create_with_container(
            Container::with_config(ContainerConfig::from_env()),
            ModuleDef::of::<M>(),
            adapter,
            options,
        )
    }

    /// Boot a (possibly dynamic) root module into a caller-provided container.
    pub fn create_with_container<A: HttpAdapter>(
        mut container: Container,
        root: ModuleDef,
        mut adapter: A,
        options: ServerOptions,
    ) -> Result<NestApp<A>> {
        let started = Instant::now();
        tracing::info!("Starting {} application...", options.title);

        container.add_module(&root)?;
        adapter.create_app(options)?;
        let routes = adapter.register_routes(&container)?;

        tracing::info!(
            modules = container.modules().len(),
            routes,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "application successfully started"
        );
        Ok(NestApp {
            container: Arc::new(container),
            adapter,
            listening: false,
        })
    }
}

/// Handle over a booted application.
pub struct NestApp<A: HttpAdapter = AxumAdapter> {
    container: Arc<Container>,
    adapter: A,
    listening: bool,
}

impl<A: HttpAdapter> NestApp<A> {
    /// The underlying HTTP adapter.
    pub fn get_server(&self) -> &A {
        &self.adapter
    }

    pub fn get_server_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    /// Wrap the composed router, e.g. `app.use_middleware(|r| r.layer(TraceLayer::new_for_http()))`.
    ///
    /// Middlewares are applied in registration order when the router is built.
    pub fn use_middleware<F>(&mut self, middleware: F) -> &mut Self
    where
        F: FnOnce(Router<AppState>) -> Router<AppState> + Send + 'static,
    {
        self.adapter.add_middleware(Box::new(middleware));
        self
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        self.container.get::<T>()
    }

    /// Context scoped to a registered module.
    pub fn select(&self, module: &ModuleDef) -> Result<ApplicationContext<'_>> {
        ApplicationContext::new(&self.container, module)
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Compose the final router, consuming the handle.
    pub fn into_router(mut self) -> Result<Router> {
        self.adapter.build_router(self.container)
    }

    /// Serve on `host:port` until Ctrl+C or SIGTERM.
    pub async fn listen(&mut self, host: &str, port: u16) -> Result<()> {
        self.listening = true;
        let served = self
            .adapter
            .run(Arc::clone(&self.container), host, port)
            .await;
        self.listening = false;
        served
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, HttpMethod, RouteDefinition};
    use crate::di::Component;
    use crate::error::NestError;
    use crate::module::ModuleDescriptor;
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    struct HealthController;

    impl Component for HealthController {
        const INJECTABLE: bool = false;

        fn inject(_: &Container) -> Result<Self> {
            Ok(Self)
        }
    }

    impl Controller for HealthController {
        fn prefix() -> &'static str {
            "/health"
        }

        fn routes() -> Vec<RouteDefinition> {
            vec![RouteDefinition::new(
                HttpMethod::Get,
                "/health/",
                "HealthController.check",
            )]
        }

        fn router(_: Arc<Self>) -> Router<AppState> {
            Router::new().route("/health/", get(|| async { "ok" }))
        }
    }

    struct HealthModule;

    impl Module for HealthModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().controller::<HealthController>()
        }
    }

    struct UnregisteredModule;

    impl Module for UnregisteredModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().providers(Vec::new())
        }
    }

    #[test]
    fn test_create_mounts_routes() {
        let app = NestFactory::create::<HealthModule>(ServerOptions::new().title("health"))
            .unwrap();
        assert!(!app.is_listening());
        assert_eq!(app.get_server().options().unwrap().title, "health");
        assert!(app.get_server().get_router().contains(HttpMethod::Get, "/health/"));
        assert!(app.get::<HealthController>().is_ok());
    }

    #[test]
    fn test_select_unknown_module() {
        let app = NestFactory::create::<HealthModule>(ServerOptions::default()).unwrap();
        assert!(app.select(&ModuleDef::of::<HealthModule>()).is_ok());
        assert!(matches!(
            app.select(&ModuleDef::of::<UnregisteredModule>()),
            Err(NestError::UnknownModule { .. })
        ));
    }

    #[tokio::test]
    async fn test_middlewares_wrap_the_router() {
        let mut app = NestFactory::create::<HealthModule>(ServerOptions::default()).unwrap();
        app.use_middleware(|router| router.route("/extra", get(|| async { "extra" })));

        let router = app.into_router().unwrap();
        for uri in ["/health/", "/extra"] {
            let response = router
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), 200, "{uri}");
        }
    }
}
