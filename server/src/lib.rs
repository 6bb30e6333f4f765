//! Pixie Interview API Server
//!
//! HTTP surface over the pixie-engine core, plus a terminal interview
//! client. Used by the pixie-server binary and integration tests.

/// Terminal interview client
pub mod cli;

/// HTTP routes and handlers
pub mod handlers;
