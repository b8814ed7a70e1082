//! InMemory 実装

mod course;
mod message;
mod user;

pub use course::InMemoryCourseCatalog;
pub use message::InMemoryMessageRepository;
pub use user::{InMemoryUserDirectory, hash_password};
