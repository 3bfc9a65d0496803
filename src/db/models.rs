use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// A user as exposed outside the persistence layer. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl User {
    /// Maps `id, name, email, is_admin` columns, in that order.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            is_admin: row.get(3)?,
        })
    }
}

/// A user together with the stored password hash. Only the auth service sees this.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i64,
    pub title: String,
}

impl Category {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
        })
    }
}

/// Owner of a post, denormalized into post payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MicroPost {
    pub id: i64,
    pub title: String,
    pub image_path: Option<String>,
    pub created_at: String,
    pub user: PostAuthor,
    pub categories: Vec<Category>,
}

/// A post as listed under a category: no nested category list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub image_path: Option<String>,
    pub created_at: String,
    pub user: PostAuthor,
}

impl PostSummary {
    /// Maps `p.id, p.title, p.image_path, p.created_at, u.id, u.name`.
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            image_path: row.get(2)?,
            created_at: row.get(3)?,
            user: PostAuthor {
                id: row.get(4)?,
                name: row.get(5)?,
            },
        })
    }

    pub fn with_categories(self, categories: Vec<Category>) -> MicroPost {
        MicroPost {
            id: self.id,
            title: self.title,
            image_path: self.image_path,
            created_at: self.created_at,
            user: self.user,
            categories,
        }
    }
}
