//! Infrastructure layer for the responsive preview.
//!
//! Contains adapters behind the application ports: configuration and
//! key/value storage on the file system, and in-memory document adapters used
//! by the tests and the command-line replay tool.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `cms_preview_core`, but MUST NOT be imported by the domain layer.

pub mod dom;
pub mod storage;
