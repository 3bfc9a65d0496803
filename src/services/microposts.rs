use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::db::models::{Category, MicroPost, PostAuthor, PostSummary};
use crate::services::{MicropostCategoryService, ServiceError, ServiceResult, UserService};
use crate::state::DbPool;

/// Bound on host parameters per `IN (...)` query.
const ID_CHUNK: usize = 500;

const SUMMARY_COLUMNS: &str = "p.id, p.title, p.image_path, p.created_at, u.id, u.name";

#[derive(Debug, Clone)]
pub struct NewMicropost {
    pub user_id: i64,
    pub title: String,
    pub image_path: Option<String>,
    pub category_ids: Vec<i64>,
}

#[derive(Clone)]
pub struct MicropostService {
    pool: DbPool,
    users: UserService,
    links: MicropostCategoryService,
}

impl MicropostService {
    pub fn new(pool: DbPool, users: UserService, links: MicropostCategoryService) -> Self {
        Self { pool, users, links }
    }

    /// Insert the post and its category links in one transaction.
    ///
    /// Unknown category ids are rejected by the foreign key on the link table, which
    /// rolls the whole post back; the storage error is returned as-is.
    pub fn create(&self, new: NewMicropost) -> ServiceResult<MicroPost> {
        let title = new.title.trim();
        if title.is_empty() {
            return Err(ServiceError::Validation("Title is required".into()));
        }
        if self.users.find(new.user_id)?.is_none() {
            return Err(ServiceError::Validation("User not found".into()));
        }

        let mut category_ids = new.category_ids.clone();
        category_ids.sort_unstable();
        category_ids.dedup();

        let conn = self.pool.get()?;
        conn.execute("BEGIN", [])?;

        let result = insert_post(&conn, new.user_id, title, new.image_path.as_deref(), &category_ids)
            .and_then(|post| {
                conn.execute("COMMIT", [])?;
                Ok(post)
            });

        match result {
            Ok(post) => {
                tracing::info!(
                    "Micropost created: id={} user={} categories={}",
                    post.id,
                    post.user.id,
                    post.categories.len()
                );
                Ok(post)
            }
            Err(e) => {
                if let Err(rollback_err) = conn.execute("ROLLBACK", []) {
                    tracing::error!("Rollback failed: {}", rollback_err);
                }
                tracing::error!("Failed to create micropost for user {}: {}", new.user_id, e);
                Err(e)
            }
        }
    }

    /// All posts, newest first, each with its categories.
    pub fn list(&self) -> ServiceResult<Vec<MicroPost>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SUMMARY_COLUMNS}
             FROM microposts p
             JOIN users u ON u.id = p.user_id
             ORDER BY p.id DESC"
        ))?;
        let summaries = stmt
            .query_map([], PostSummary::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(attach_categories(&conn, summaries)?)
    }

    /// Posts linked to a category, newest first, each with all of its categories.
    pub fn list_in_category(&self, category_id: i64) -> ServiceResult<Vec<MicroPost>> {
        let summaries = self.links.posts_for(category_id)?;
        let conn = self.pool.get()?;
        Ok(attach_categories(&conn, summaries)?)
    }

    pub fn find_by_id(&self, id: i64) -> ServiceResult<Option<MicroPost>> {
        let conn = self.pool.get()?;
        let summary = conn
            .query_row(
                &format!(
                    "SELECT {SUMMARY_COLUMNS}
                     FROM microposts p
                     JOIN users u ON u.id = p.user_id
                     WHERE p.id = ?1"
                ),
                params![id],
                PostSummary::from_row,
            )
            .optional()?;

        match summary {
            Some(summary) => Ok(attach_categories(&conn, vec![summary])?.pop()),
            None => Ok(None),
        }
    }

    /// `NotFound` when the post is missing; an empty list when it has no categories.
    pub fn categories_for_micropost(&self, id: i64) -> ServiceResult<Vec<Category>> {
        let exists: bool = {
            let conn = self.pool.get()?;
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM microposts WHERE id = ?1)",
                params![id],
                |row| row.get(0),
            )?
        };
        if !exists {
            return Err(ServiceError::NotFound("Micropost"));
        }
        self.links.categories_for(id)
    }
}

fn insert_post(
    conn: &Connection,
    user_id: i64,
    title: &str,
    image_path: Option<&str>,
    category_ids: &[i64],
) -> ServiceResult<MicroPost> {
    let (id, created_at, author_name): (i64, String, String) = conn.query_row(
        "INSERT INTO microposts (user_id, title, image_path) VALUES (?1, ?2, ?3)
         RETURNING id, created_at, (SELECT name FROM users WHERE id = ?1)",
        params![user_id, title, image_path],
        |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
    )?;
    let author = PostAuthor {
        id: user_id,
        name: author_name,
    };

    for chunk in category_ids.chunks(ID_CHUNK) {
        let values = (0..chunk.len())
            .map(|i| format!("(?1, ?{})", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO micropost_categories (micropost_id, category_id) VALUES {values}"
        );
        let bound = std::iter::once(id).chain(chunk.iter().copied());
        conn.execute(&sql, params_from_iter(bound))?;
    }

    let summary = PostSummary {
        id,
        title: title.to_string(),
        image_path: image_path.map(str::to_string),
        created_at,
        user: author,
    };
    let mut posts = attach_categories(conn, vec![summary])?;
    posts
        .pop()
        .ok_or(ServiceError::NotFound("Micropost"))
}

/// Loads categories for every summary in batched queries and nests them.
fn attach_categories(
    conn: &Connection,
    summaries: Vec<PostSummary>,
) -> rusqlite::Result<Vec<MicroPost>> {
    let ids: Vec<i64> = summaries.iter().map(|s| s.id).collect();
    let mut by_post = categories_by_post(conn, &ids)?;

    Ok(summaries
        .into_iter()
        .map(|summary| {
            let categories = by_post.remove(&summary.id).unwrap_or_default();
            summary.with_categories(categories)
        })
        .collect())
}

fn categories_by_post(
    conn: &Connection,
    post_ids: &[i64],
) -> rusqlite::Result<HashMap<i64, Vec<Category>>> {
    let mut by_post: HashMap<i64, Vec<Category>> = HashMap::new();

    for chunk in post_ids.chunks(ID_CHUNK) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT mc.micropost_id, c.id, c.title
             FROM micropost_categories mc
             JOIN categories c ON c.id = mc.category_id
             WHERE mc.micropost_id IN ({placeholders})
             ORDER BY mc.micropost_id, c.id"
        ))?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                Category {
                    id: row.get(1)?,
                    title: row.get(2)?,
                },
            ))
        })?;
        for row in rows {
            let (post_id, category) = row?;
            by_post.entry(post_id).or_default().push(category);
        }
    }

    Ok(by_post)
}
