//! InMemory User Directory 実装
//!
//! 起動時に与えられたアカウント一覧に対して bcrypt でパスワードを照合します。

use std::collections::HashMap;

use async_trait::async_trait;
use bcrypt::verify;

use crate::domain::{RepositoryError, UserAccount, UserDirectory, UserId};

/// パスワードを bcrypt でハッシュ化する
///
/// アカウント一覧の作成とテストで使う。`cost` は 4 以上 31 以下。
pub fn hash_password(password: &str, cost: u32) -> Result<String, RepositoryError> {
    bcrypt::hash(password, cost).map_err(|e| RepositoryError::WriteFailed(e.to_string()))
}

/// メールアドレス（大文字小文字を区別しない）で引けるアカウント一覧
#[derive(Default)]
pub struct InMemoryUserDirectory {
    accounts: HashMap<String, UserAccount>,
}

impl InMemoryUserDirectory {
    pub fn new(accounts: impl IntoIterator<Item = UserAccount>) -> Self {
        Self {
            accounts: accounts
                .into_iter()
                .map(|account| (normalize(&account.email), account))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<UserId>, RepositoryError> {
        let Some(account) = self.accounts.get(&normalize(email)) else {
            return Ok(None);
        };

        let valid = verify(password, &account.password_hash)
            .map_err(|e| RepositoryError::ReadFailed(e.to_string()))?;
        Ok(valid.then_some(account.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // bcrypt の最小コスト（テストを速くするため）
    const TEST_COST: u32 = 4;

    fn directory() -> InMemoryUserDirectory {
        InMemoryUserDirectory::new(vec![UserAccount {
            id: UserId::new(1).unwrap(),
            email: "Bucky@wisc.edu".to_string(),
            password_hash: hash_password("on-wisconsin", TEST_COST).unwrap(),
        }])
    }

    #[tokio::test]
    async fn test_authenticate_with_correct_password() {
        // テスト項目: 正しいメールアドレスとパスワードでユーザー ID が返される
        // given (前提条件):
        let directory = directory();

        // when (操作): メールアドレスの大文字小文字は区別しない
        let user = directory
            .authenticate("bucky@wisc.edu", "on-wisconsin")
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(user, Some(UserId::new(1).unwrap()));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_wrong_password_and_unknown_email() {
        // テスト項目: パスワード違い・未登録のメールアドレスはどちらも None
        // given (前提条件):
        let directory = directory();

        // when (操作):
        let wrong_password = directory
            .authenticate("bucky@wisc.edu", "go-gophers")
            .await
            .unwrap();
        let unknown = directory
            .authenticate("nobody@wisc.edu", "on-wisconsin")
            .await
            .unwrap();

        // then (期待する結果):
        assert!(wrong_password.is_none());
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_hash_is_a_read_failure() {
        // テスト項目: 保存されたハッシュが壊れている場合はエラーになる
        // given (前提条件):
        let directory = InMemoryUserDirectory::new(vec![UserAccount {
            id: UserId::new(2).unwrap(),
            email: "broken@wisc.edu".to_string(),
            password_hash: "not-a-bcrypt-hash".to_string(),
        }]);

        // when (操作):
        let result = directory.authenticate("broken@wisc.edu", "anything").await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::ReadFailed(_))));
    }
}
