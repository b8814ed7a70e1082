//! Repository 実装

pub mod inmemory;

pub use inmemory::{
    InMemoryCourseCatalog, InMemoryMessageRepository, InMemoryUserDirectory, hash_password,
};
