//! Configuration module for the pxa export tool
//!
//! Provides types and parsing for `pxa.toml` configuration.

pub mod loader;
pub mod schema;

pub use loader::*;
pub use schema::*;
