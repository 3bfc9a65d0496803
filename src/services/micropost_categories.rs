use rusqlite::params;

use crate::db::models::{Category, PostSummary};
use crate::services::ServiceResult;
use crate::state::DbPool;

/// Both directions of the micropost <-> category relation.
#[derive(Clone)]
pub struct MicropostCategoryService {
    pool: DbPool,
}

impl MicropostCategoryService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn categories_for(&self, micropost_id: i64) -> ServiceResult<Vec<Category>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT c.id, c.title
             FROM micropost_categories mc
             JOIN categories c ON c.id = mc.category_id
             WHERE mc.micropost_id = ?1
             ORDER BY c.id",
        )?;
        let categories = stmt
            .query_map(params![micropost_id], Category::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(categories)
    }

    /// Posts linked to a category, newest first.
    pub fn posts_for(&self, category_id: i64) -> ServiceResult<Vec<PostSummary>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "SELECT p.id, p.title, p.image_path, p.created_at, u.id, u.name
             FROM micropost_categories mc
             JOIN microposts p ON p.id = mc.micropost_id
             JOIN users u ON u.id = p.user_id
             WHERE mc.category_id = ?1
             ORDER BY p.id DESC",
        )?;
        let posts = stmt
            .query_map(params![category_id], PostSummary::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    /// Duplicate links are absorbed silently.
    pub fn link(&self, micropost_id: i64, category_id: i64) -> ServiceResult<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT OR IGNORE INTO micropost_categories (micropost_id, category_id)
             VALUES (?1, ?2)",
            params![micropost_id, category_id],
        )?;
        Ok(())
    }
}
