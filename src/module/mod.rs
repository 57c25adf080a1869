//! Module graph: descriptors, tokens, compilation and runtime nodes.

mod compiler;
mod descriptor;
mod node;
mod token;

pub use compiler::{ModuleCompiler, ModuleFactory, ModuleMetadata};
pub use descriptor::{Module, ModuleDef, ModuleDescriptor};
pub use node::{ModuleNode, ModulesContainer};
pub use token::ModuleTokenFactory;
