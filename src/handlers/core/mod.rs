//! Core handler infrastructure.
//!
//! This module contains the fundamental types for the command handler
//! system: line parsing, the handler context and trait, and the registry
//! that dispatches to handlers.

pub mod context;
pub mod line;
pub mod registry;
pub mod traits;

pub use context::Context;
pub use line::{Args, Input};
pub use registry::Registry;
pub use traits::Handler;
