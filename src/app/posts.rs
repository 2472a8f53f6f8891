use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::post::Post;
use crate::domain::user::Author;
use crate::infra::db::Db;

#[derive(Clone)]
pub struct PostService {
    db: Db,
}

impl PostService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_post(
        &self,
        title: String,
        content: String,
        img: Option<String>,
        author_id: Option<i64>,
    ) -> Result<i64> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO posts (title, content, img, author_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(title)
        .bind(content)
        .bind(img)
        .bind(author_id)
        .fetch_one(self.db.pool())
        .await?;

        Ok(id)
    }

    /// `viewer_id` only drives the `liked_by_user` flag.
    pub async fn get_post(&self, post_id: i64, viewer_id: Option<i64>) -> Result<Option<Post>> {
        let row = sqlx::query(
            "SELECT p.id, p.title, p.content, p.likes, p.comments, p.img, \
                    u.id AS author_id, u.username AS author_username, \
                    u.display_name AS author_display_name, u.avatar AS author_avatar, \
                    EXISTS ( \
                        SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $2 \
                    ) AS liked_by_user \
             FROM posts p \
             LEFT JOIN users u ON u.id = p.author_id \
             WHERE p.id = $1",
        )
        .bind(post_id)
        .bind(viewer_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.as_ref().map(post_from_row))
    }

    /// All posts, newest first.
    pub async fn list_posts(&self, viewer_id: Option<i64>) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.id, p.title, p.content, p.likes, p.comments, p.img, \
                    u.id AS author_id, u.username AS author_username, \
                    u.display_name AS author_display_name, u.avatar AS author_avatar, \
                    EXISTS ( \
                        SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $1 \
                    ) AS liked_by_user \
             FROM posts p \
             LEFT JOIN users u ON u.id = p.author_id \
             ORDER BY p.id DESC",
        )
        .bind(viewer_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn list_by_author(&self, author_id: i64, viewer_id: Option<i64>) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.id, p.title, p.content, p.likes, p.comments, p.img, \
                    u.id AS author_id, u.username AS author_username, \
                    u.display_name AS author_display_name, u.avatar AS author_avatar, \
                    EXISTS ( \
                        SELECT 1 FROM post_likes l WHERE l.post_id = p.id AND l.user_id = $2 \
                    ) AS liked_by_user \
             FROM posts p \
             JOIN users u ON u.id = p.author_id \
             WHERE p.author_id = $1 \
             ORDER BY p.id DESC",
        )
        .bind(author_id)
        .bind(viewer_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn post_exists(&self, post_id: i64) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(self.db.pool())
            .await?;
        Ok(exists)
    }
}

/// Expects the column set selected by [`PostService::get_post`].
pub(crate) fn post_from_row(row: &PgRow) -> Post {
    let author_id: Option<i64> = row.get("author_id");
    let author = author_id.map(|id| Author {
        id,
        username: row.get("author_username"),
        display_name: row.get("author_display_name"),
        avatar: row.get("author_avatar"),
    });

    Post {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        likes: row.get("likes"),
        comments: row.get("comments"),
        img: row.get("img"),
        liked_by_user: row.get("liked_by_user"),
        author,
    }
}
