//! Shared utilities for the Bookcycle server packages.

pub mod logger;
pub mod time;
