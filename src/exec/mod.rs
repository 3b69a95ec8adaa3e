// src/exec/mod.rs

//! Execution layer for watch actions.
//!
//! - [`backend`] provides the `ActionBackend` trait and the concrete
//!   `TaskBackend` the watch runtime uses in production, and which tests can
//!   replace with a fake implementation.

pub mod backend;

pub use backend::{ActionBackend, TaskBackend};
