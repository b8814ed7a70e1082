//! Bookcycle server library.
//!
//! The real-time messaging hub and the per-route admission controller of the
//! Bookcycle campus marketplace, wired into an axum server.

// layers
pub mod domain;
pub mod hub;
pub mod infrastructure;
pub mod ui;

// cross-cutting
pub mod admission;
pub mod config;
