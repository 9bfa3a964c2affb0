//! # Taskboard Shared Library
//!
//! Domain core of the Taskboard backend: models, authentication and
//! authorization, the persistence seam and the `Board` service that
//! implements every operation independently of any transport.
//!
//! ## Module Organization
//!
//! - `error`: Domain error taxonomy
//! - `auth`: Password hashing, tokens, caller identity, authorization gate
//! - `models`: Users, projects, tasks and their inputs
//! - `store`: `Store` trait with PostgreSQL and in-memory implementations
//! - `db`: Connection pool and migrations
//! - `board`: The service layer
//! - `seed`: Demo data set

pub mod auth;
pub mod board;
pub mod db;
pub mod error;
pub mod models;
pub mod seed;
pub mod store;

pub use error::{CoreError, CoreResult};

/// Current version of the Taskboard shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
