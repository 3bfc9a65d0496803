use rusqlite::{params, OptionalExtension};

use crate::db::models::Category;
use crate::services::{ServiceError, ServiceResult};
use crate::state::DbPool;

#[derive(Clone)]
pub struct CategoryService {
    pool: DbPool,
}

impl CategoryService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn create(&self, title: &str) -> ServiceResult<Category> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ServiceError::Validation("Category title is required".into()));
        }

        let conn = self.pool.get()?;
        let category = conn
            .query_row(
                "INSERT INTO categories (title) VALUES (?1) RETURNING id, title",
                params![title],
                Category::from_row,
            )
            .map_err(|e| {
                tracing::error!("Failed to create category {:?}: {}", title, e);
                e
            })?;

        tracing::info!("Category created: id={} title={:?}", category.id, category.title);
        Ok(category)
    }

    pub fn list(&self) -> ServiceResult<Vec<Category>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare("SELECT id, title FROM categories ORDER BY id")?;
        let categories = stmt
            .query_map([], Category::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Case-insensitive title match. The oldest category wins if titles collide.
    pub fn find_by_name(&self, title: &str) -> ServiceResult<Option<Category>> {
        let conn = self.pool.get()?;
        let category = conn
            .query_row(
                "SELECT id, title FROM categories
                 WHERE title = ?1 COLLATE NOCASE
                 ORDER BY id LIMIT 1",
                params![title.trim()],
                Category::from_row,
            )
            .optional()?;
        Ok(category)
    }
}
