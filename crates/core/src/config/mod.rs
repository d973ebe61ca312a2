//! Configuration loading and schema definitions
//!
//! Every field has a default, so an absent or partial `pawfinder.toml` is
//! always usable.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
