//! Database layer
//!
//! Storage for the Askbox service, behind a trait-based abstraction:
//! - SQLite (default, for single-binary deployment)
//! - MySQL (for larger deployments)
//!
//! The driver is selected by configuration. Repositories take the pool as an
//! injected dependency and dispatch on the driver, so the rest of the crate
//! never sees a concrete backend.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, DatabasePool, DynDatabasePool};
