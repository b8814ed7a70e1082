//! HTTP API のリクエスト・レスポンス DTO

use serde::{Deserialize, Serialize};

/// `GET /courses/{id}/json` のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDto {
    pub id: i64,
    pub department: String,
    pub number: String,
    pub title: String,
}

/// `POST /message/{id}/read` のレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkReadDto {
    pub updated: usize,
}

/// `POST /login` のフォーム
#[derive(Debug, Clone, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// `--users` で読み込むアカウント一覧の 1 件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccountDto {
    pub id: i64,
    pub email: String,
    /// bcrypt ハッシュ
    pub password_hash: String,
}
