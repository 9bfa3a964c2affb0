//! # Taskboard API Server Library
//!
//! REST transport for the Taskboard service. Handlers are a thin mapping
//! onto `taskboard_shared::board::Board`.
//!
//! ## Modules
//!
//! - `app`: Application state, store wiring and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Extractors that reject with the JSON error shape
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
