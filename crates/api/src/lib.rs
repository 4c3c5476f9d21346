//! MicroSaaS API server library.
//!
//! Exposes configuration, logging bootstrap, state, error handling and routes
//! so integration tests and the binary entrypoint share them.

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod router;
pub mod routes;
pub mod state;
