//! SessionStore 実装

mod inmemory;

pub use inmemory::InMemorySessionStore;
