//! InMemory Course Catalog 実装

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{Course, CourseCatalog, CourseId, RepositoryError};

/// 起動時に与えられたコース一覧を保持する読み取り専用カタログ
#[derive(Default)]
pub struct InMemoryCourseCatalog {
    courses: HashMap<CourseId, Course>,
}

impl InMemoryCourseCatalog {
    pub fn new(courses: impl IntoIterator<Item = Course>) -> Self {
        Self {
            courses: courses.into_iter().map(|c| (c.id, c)).collect(),
        }
    }
}

#[async_trait]
impl CourseCatalog for InMemoryCourseCatalog {
    async fn find(&self, id: CourseId) -> Result<Option<Course>, RepositoryError> {
        Ok(self.courses.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_existing_and_missing_course() {
        // テスト項目: 登録済みのコースは取得でき、未登録なら None が返される
        // given (前提条件):
        let id = CourseId::new(1).unwrap();
        let catalog = InMemoryCourseCatalog::new(vec![Course {
            id,
            department: "MATH".to_string(),
            number: "221".to_string(),
            title: "Calculus and Analytic Geometry 1".to_string(),
        }]);

        // when (操作):
        let found = catalog.find(id).await.unwrap();
        let missing = catalog.find(CourseId::new(2).unwrap()).await.unwrap();

        // then (期待する結果):
        assert_eq!(found.map(|c| c.number), Some("221".to_string()));
        assert!(missing.is_none());
    }
}
