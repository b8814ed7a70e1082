//! HTTP / WebSocket server.

mod auth;
mod handler;
mod server;
mod signal;
pub mod state;

pub use auth::{SESSION_COOKIE, session_cookie, session_token};
pub use server::{Server, ServerError};
