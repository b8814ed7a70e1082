//! Domain layer
//!
//! 外部の I/O に依存しないドメインモデルと、ドメイン層が必要とする
//! インターフェース（Repository / SessionStore）を定義します。

pub mod entity;
pub mod error;
pub mod repository;
pub mod value_object;

pub use entity::{Course, Message, MessageKind, UserAccount};
pub use error::{RepositoryError, ValueObjectError};
pub use repository::{CourseCatalog, MessageRepository, SessionStore, UserDirectory};
pub use value_object::{Coordinates, CourseId, SessionToken, Timestamp, UserId};

#[cfg(test)]
pub use repository::MockMessageRepository;
