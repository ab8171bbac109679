//! Document adapters.
//!
//! The application reaches the host document, the preview frame and the
//! server only through the ports declared next to each use case.  A browser
//! front-end implements them against the real DOM; this module ships the
//! in-memory implementations that record every call, used by the unit and
//! integration tests and by the `replay` command.

pub mod mock;
