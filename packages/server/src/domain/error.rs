//! ドメイン層のエラー型

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// ユーザー ID が正の整数ではない
    #[error("user id must be positive, got {0}")]
    InvalidUserId(i64),

    /// コース ID が正の整数ではない
    #[error("course id must be positive, got {0}")]
    InvalidCourseId(i64),

    /// セッショントークンが空
    #[error("session token must not be empty")]
    EmptySessionToken,
}

/// Repository（永続化層）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// ストレージへの書き込みに失敗
    #[error("storage write failed: {0}")]
    WriteFailed(String),

    /// ストレージからの読み込みに失敗
    #[error("storage read failed: {0}")]
    ReadFailed(String),
}
