//! # nestrs
//!
//! Module composition and dependency injection for axum applications.
//!
//! Applications are described as a graph of modules. Each module lists the
//! modules it imports, the providers (injectable services) it owns, the
//! controllers that expose HTTP routes and the providers it exports. At boot
//! the container walks that graph, instantiates every provider exactly once
//! and mounts the controllers' routes on an axum router.
//!
//! ## Features
//!
//! - **Dependency Injection**: `#[derive(Injectable)]` turns `Arc<T>` fields into
//!   dependencies resolved as process-wide singletons, with cycle detection
//! - **Controller-based Routing**: `#[controller]` + `#[routes]` with method-level routing
//! - **Modular Architecture**: `#[module]` declarations, dynamic modules with
//!   configuration folded into their identity
//! - **Type-safe Extractors**: [`Inject<T>`] hands singletons to plain axum handlers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use nestrs::prelude::*;
//!
//! #[derive(Injectable)]
//! pub struct UserService {}
//!
//! impl UserService {
//!     pub fn find_all(&self) -> Vec<String> {
//!         vec!["alice".to_string()]
//!     }
//! }
//!
//! #[controller(prefix = "/user")]
//! pub struct UserController {
//!     user_service: Arc<UserService>,
//! }
//!
//! #[routes]
//! impl UserController {
//!     #[get("/")]
//!     async fn find_all(&self) -> Json<Vec<String>> {
//!         Json(self.user_service.find_all())
//!     }
//! }
//!
//! #[module(controllers = [UserController], providers = [UserService])]
//! pub struct AppModule;
//!
//! #[tokio::main]
//! async fn main() -> nestrs::Result<()> {
//!     let mut app = NestFactory::create::<AppModule>(ServerOptions::from_env())?;
//!     app.listen("0.0.0.0", 3000).await
//! }
//! ```

extern crate self as nestrs;

pub mod application;
pub mod config;
pub mod controller;
pub mod di;
pub mod error;
pub mod module;
pub mod routes;
pub mod server;

// Re-export core types
pub use application::{ApplicationContext, NestApp, NestFactory};
pub use config::{ConfigModule, ConfigService, ContainerConfig, ServerOptions};
pub use controller::{Controller, ControllerDef, HttpMethod, RouteDefinition, RouterFragment};
pub use di::{
    AddModuleResult, ClassMetadata, Component, ComponentDef, Container, ContainerBuilder,
    Dependency, HasContainer, Inject, Instance, TypeKey,
};
pub use error::{NestError, Result};
pub use module::{Module, ModuleDef, ModuleDescriptor, ModuleTokenFactory};
pub use routes::RoutesResolver;
pub use server::{AppState, AxumAdapter, HttpAdapter};

// Re-export macros
pub use nestrs_macro::{
    Injectable, body, controller, delete, get, http_code, module, param, patch, post, put, query,
    routes,
};

// Re-export commonly used types from dependencies
pub use async_trait::async_trait;
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use nestrs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{ConfigModule, ConfigService, ServerOptions};
    pub use crate::di::{Component, Container, HasContainer, Inject};
    pub use crate::error::NestError;
    pub use crate::module::{Module, ModuleDef};
    pub use crate::server::HttpAdapter;
    pub use crate::{NestApp, NestFactory};
    pub use crate::{
        Injectable, body, controller, delete, get, http_code, module, param, patch, post, put,
        query, routes,
    };
    pub use async_trait::async_trait;
    pub use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
