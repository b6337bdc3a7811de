pub mod bindings;
pub mod bootstrap;
pub mod config;
pub mod decl;
pub mod error;
pub mod function;
pub mod invoke;
pub mod registry;

pub use bootstrap::{default_registry, FunctionApp};
pub use error::EngineError;
pub use registry::ConverterRegistry;
