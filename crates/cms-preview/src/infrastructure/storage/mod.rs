//! Storage infrastructure: configuration file and key/value store.
//!
//! - `config` reads and writes the TOML configuration from the
//!   platform-appropriate directory, with defaults for every field.
//! - `store` implements the application's `KeyValueStore` port in memory and
//!   as a JSON file.

pub mod config;
pub mod store;
