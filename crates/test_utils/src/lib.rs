//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! device hub test suite.
//!
//! # Modules
//!
//! - `fixtures`: Fixed field values and entities built from them
//! - `builders`: Randomised entities built with `fake`
//! - `database`: PostgreSQL test containers with the schema applied
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use generators::*;
