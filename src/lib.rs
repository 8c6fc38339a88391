//! Bookshelf application library
//!
//! Application modules and startup wiring shared by the server binary and the CLI.

pub mod bootstrap;
pub mod modules;

pub use modules::books::service::{BookError, BookService, CacheOutcome};
