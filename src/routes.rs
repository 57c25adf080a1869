//! Mounting of controller router fragments onto the HTTP adapter.

use crate::controller::ControllerDef;
use crate::di::Container;
use crate::error::Result;
use crate::server::HttpAdapter;

/// Walks every registered module's controllers and mounts their fragments.
pub struct RoutesResolver<'a> {
    container: &'a Container,
}

impl<'a> RoutesResolver<'a> {
    pub fn new(container: &'a Container) -> Self {
        Self { container }
    }

    /// Mount every controller, modules in registration order and controllers
    /// in declaration order. Returns the number of routes mounted.
    pub fn register_routes<A: HttpAdapter + ?Sized>(&self, adapter: &mut A) -> Result<usize> {
        let mut mounted = 0;
        for module in self.container.modules().values() {
            for (name, controller) in module.controllers() {
                tracing::debug!(module = module.name(), controller = name, "resolving routes");
                mounted += self.register_route(controller, adapter)?;
            }
        }
        tracing::info!(routes = mounted, "routes resolved");
        Ok(mounted)
    }

    /// Mount one controller's fragment, built around its singleton.
    pub fn register_route<A: HttpAdapter + ?Sized>(
        &self,
        controller: &ControllerDef,
        adapter: &mut A,
    ) -> Result<usize> {
        let instance = self.container.get_instance(controller.key())?;
        let fragment = controller.fragment(instance)?;
        let count = fragment.routes().len();
        tracing::info!(
            "{} mounted at '{}' ({} routes)",
            fragment.controller(),
            fragment.prefix(),
            count
        );
        adapter.add_fragment(fragment)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{Controller, HttpMethod, RouteDefinition};
    use crate::di::{Component, TypeKey};
    use crate::module::{Module, ModuleDef, ModuleDescriptor};
    use crate::server::{AppState, AxumAdapter};
    use axum::{Router, routing::get};
    use std::sync::Arc;

    struct PingController;

    impl Component for PingController {
        const INJECTABLE: bool = false;

        fn inject(_: &Container) -> Result<Self> {
            Ok(Self)
        }
    }

    impl Controller for PingController {
        fn prefix() -> &'static str {
            "/ping"
        }

        fn routes() -> Vec<RouteDefinition> {
            vec![RouteDefinition::new(HttpMethod::Get, "/ping/", "PingController.ping")]
        }

        fn router(_: Arc<Self>) -> Router<AppState> {
            Router::new().route("/ping/", get(|| async { "pong" }))
        }
    }

    struct PingModule;

    impl Module for PingModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().controller::<PingController>()
        }
    }

    struct EchoModule;

    impl Module for EchoModule {
        fn descriptor() -> ModuleDescriptor {
            ModuleDescriptor::new().controller::<PingController>()
        }
    }

    #[test]
    fn test_register_routes_mounts_every_controller() {
        let mut container = Container::new();
        container.add_module(&ModuleDef::of::<PingModule>()).unwrap();

        let mut adapter = AxumAdapter::new();
        let mounted = RoutesResolver::new(&container)
            .register_routes(&mut adapter)
            .unwrap();

        assert_eq!(mounted, 1);
        let route = adapter.get_router().find(HttpMethod::Get, "/ping/").unwrap();
        assert_eq!(route.endpoint, "PingController.ping");
        assert!(container.contains::<PingController>());
        assert_eq!(TypeKey::of::<PingController>().short_name(), "PingController");
    }

    #[test]
    fn test_same_controller_in_two_modules_is_a_duplicate() {
        let mut container = Container::new();
        container.add_module(&ModuleDef::of::<PingModule>()).unwrap();
        container.add_module(&ModuleDef::of::<EchoModule>()).unwrap();

        let mut adapter = AxumAdapter::new();
        let err = RoutesResolver::new(&container)
            .register_routes(&mut adapter)
            .unwrap_err();
        assert!(matches!(err, crate::error::NestError::DuplicateRoute { .. }));
    }
}
