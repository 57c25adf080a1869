//! Dependency injection: type metadata, the singleton injector and the
//! container that ties modules to them.

mod builder;
mod container;
mod extractor;
mod injectable;
mod injector;
mod metadata;

pub use builder::ContainerBuilder;
pub use container::{AddModuleResult, Container};
pub use extractor::{HasContainer, Inject};
pub use injectable::{Component, ComponentDef, Instance};
pub use injector::Injector;
pub use metadata::{ClassMetadata, Dependency, TypeKey};
