//! Repository / UserDirectory / SessionStore trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。

use async_trait::async_trait;

use super::{
    entity::{Course, Message},
    error::RepositoryError,
    value_object::{CourseId, SessionToken, UserId},
};

/// Message Repository trait
///
/// ハブは受信したメッセージを配送結果に関わらず `create` で一度だけ永続化する。
/// 履歴の参照系はオフラインだった受信者が後から取得するために使われる。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを永続化
    async fn create(&self, message: Message) -> Result<(), RepositoryError>;

    /// 受信者宛ての未読メッセージを新しい順に最大 `limit` 件取得
    async fn unread_for_receiver(
        &self,
        receiver_id: UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// 2 ユーザー間の会話を新しい順に最大 `limit` 件取得
    async fn conversation_between(
        &self,
        a: UserId,
        b: UserId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;

    /// `sender_id` から `receiver_id` への未読メッセージを既読にし、更新件数を返す
    async fn mark_read_from(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
    ) -> Result<usize, RepositoryError>;
}

/// コースカタログ
#[async_trait]
pub trait CourseCatalog: Send + Sync {
    async fn find(&self, id: CourseId) -> Result<Option<Course>, RepositoryError>;
}

/// ログイン時の資格情報の照合先
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// メールアドレスとパスワードが一致すればユーザー ID を返す
    ///
    /// 一致しない場合は、ユーザーが存在しないときも含めて `Ok(None)`。
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserId>, RepositoryError>;
}

/// ログインセッションの保存先
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// ユーザーのセッションを作成し、Cookie に格納するトークンを返す
    async fn create_session(&self, user_id: UserId) -> SessionToken;

    /// トークンに紐づくユーザーを返す（未ログインなら `None`）
    async fn current_user(&self, token: &SessionToken) -> Option<UserId>;

    /// セッションを破棄（存在しなくてもエラーにしない）
    async fn destroy_session(&self, token: &SessionToken);
}
