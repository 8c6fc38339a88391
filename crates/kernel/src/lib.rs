//! Core traits, settings, and module registry for bookshelf.

pub mod module;
pub mod probe;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
pub use settings::Settings;
