use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::collections::HashMap;

use crate::app::posts::post_from_row;
use crate::domain::engagement::{Comment, CommentThread, UserComment};
use crate::domain::post::Post;
use crate::domain::user::Author;
use crate::infra::db::Db;

/// Just enough of a comment row to check ownership and threading.
#[derive(Debug, Clone, Copy)]
pub struct CommentRef {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
}

impl CommentRef {
    /// The top-level comment a reply to this one should hang off.
    pub fn thread_root(&self) -> i64 {
        self.parent_id.unwrap_or(self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteCommentOutcome {
    /// Number of comment rows removed, the comment itself included.
    Deleted(i64),
    NotFound,
    Forbidden,
}

#[derive(Clone)]
pub struct EngagementService {
    db: Db,
}

impl EngagementService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Flips the (user, post) like and adjusts the post's counter, never
    /// letting it go below zero. Returns `None` if the post does not exist,
    /// otherwise whether the post is now liked.
    pub async fn toggle_like(&self, user_id: i64, post_id: i64) -> Result<Option<bool>> {
        let mut tx = self.db.pool().begin().await?;

        let post: Option<i64> = sqlx::query_scalar("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
            .bind(post_id)
            .fetch_optional(&mut *tx)
            .await?;
        if post.is_none() {
            tx.rollback().await?;
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM post_likes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let liked = if removed > 0 {
            sqlx::query("UPDATE posts SET likes = GREATEST(likes - 1, 0) WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
            false
        } else {
            sqlx::query("INSERT INTO post_likes (user_id, post_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("UPDATE posts SET likes = likes + 1 WHERE id = $1")
                .bind(post_id)
                .execute(&mut *tx)
                .await?;
            true
        };

        tx.commit().await?;

        Ok(Some(liked))
    }

    pub async fn find_comment(&self, comment_id: i64) -> Result<Option<CommentRef>> {
        let row = sqlx::query("SELECT id, post_id, user_id, parent_id FROM comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(|row| CommentRef {
            id: row.get("id"),
            post_id: row.get("post_id"),
            user_id: row.get("user_id"),
            parent_id: row.get("parent_id"),
        }))
    }

    /// Inserts the comment and bumps the post's comment counter.
    pub async fn create_comment(
        &self,
        post_id: i64,
        user_id: i64,
        content: String,
        parent_id: Option<i64>,
    ) -> Result<Comment> {
        let mut tx = self.db.pool().begin().await?;

        let row = sqlx::query(
            "WITH inserted AS ( \
                INSERT INTO comments (post_id, user_id, content, parent_id) \
                VALUES ($1, $2, $3, $4) \
                RETURNING id, post_id, user_id, content, parent_id, created_at \
             ) \
             SELECT c.id, c.post_id, c.content, c.parent_id, c.created_at, \
                    u.id AS author_id, u.username AS author_username, \
                    u.display_name AS author_display_name, u.avatar AS author_avatar \
             FROM inserted c \
             JOIN users u ON u.id = c.user_id",
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .bind(parent_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("UPDATE posts SET comments = comments + 1 WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(comment_from_row(&row))
    }

    /// Top-level comments newest first, each with its replies oldest first.
    pub async fn list_comments(&self, post_id: i64) -> Result<Vec<CommentThread>> {
        let top_level = sqlx::query(
            "SELECT c.id, c.post_id, c.content, c.parent_id, c.created_at, \
                    u.id AS author_id, u.username AS author_username, \
                    u.display_name AS author_display_name, u.avatar AS author_avatar \
             FROM comments c \
             JOIN users u ON u.id = c.user_id \
             WHERE c.post_id = $1 AND c.parent_id IS NULL \
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        let replies = sqlx::query(
            "SELECT c.id, c.post_id, c.content, c.parent_id, c.created_at, \
                    u.id AS author_id, u.username AS author_username, \
                    u.display_name AS author_display_name, u.avatar AS author_avatar \
             FROM comments c \
             JOIN users u ON u.id = c.user_id \
             WHERE c.post_id = $1 AND c.parent_id IS NOT NULL \
             ORDER BY c.created_at ASC, c.id ASC",
        )
        .bind(post_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(assemble_threads(
            top_level.iter().map(comment_from_row).collect(),
            replies.iter().map(comment_from_row).collect(),
        ))
    }

    /// Removes the comment and its direct replies if `user_id` wrote it, then
    /// takes all of them off the post's comment counter (floored at zero).
    pub async fn delete_comment(
        &self,
        post_id: i64,
        comment_id: i64,
        user_id: i64,
    ) -> Result<DeleteCommentOutcome> {
        let mut tx = self.db.pool().begin().await?;

        let owner: Option<i64> = sqlx::query_scalar(
            "SELECT user_id FROM comments WHERE id = $1 AND post_id = $2 FOR UPDATE",
        )
        .bind(comment_id)
        .bind(post_id)
        .fetch_optional(&mut *tx)
        .await?;

        match owner {
            None => {
                tx.rollback().await?;
                return Ok(DeleteCommentOutcome::NotFound);
            }
            Some(owner) if owner != user_id => {
                tx.rollback().await?;
                return Ok(DeleteCommentOutcome::Forbidden);
            }
            Some(_) => {}
        }

        let replies = sqlx::query("DELETE FROM comments WHERE parent_id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        let removed = 1 + replies as i64;
        sqlx::query("UPDATE posts SET comments = GREATEST(comments - $2, 0) WHERE id = $1")
            .bind(post_id)
            .bind(removed as i32)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DeleteCommentOutcome::Deleted(removed))
    }

    /// Posts the user liked, most recently liked first.
    pub async fn liked_posts(&self, user_id: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.id, p.title, p.content, p.likes, p.comments, p.img, \
                    u.id AS author_id, u.username AS author_username, \
                    u.display_name AS author_display_name, u.avatar AS author_avatar, \
                    TRUE AS liked_by_user \
             FROM post_likes l \
             JOIN posts p ON p.id = l.post_id \
             LEFT JOIN users u ON u.id = p.author_id \
             WHERE l.user_id = $1 \
             ORDER BY l.created_at DESC, l.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(post_from_row).collect())
    }

    pub async fn user_comments(&self, user_id: i64) -> Result<Vec<UserComment>> {
        let rows = sqlx::query(
            "SELECT c.id, c.content, c.created_at, p.id AS post_id, p.title AS post_title \
             FROM comments c \
             JOIN posts p ON p.id = c.post_id \
             WHERE c.user_id = $1 \
             ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(user_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows
            .iter()
            .map(|row| UserComment {
                id: row.get("id"),
                content: row.get("content"),
                created_at: row.get("created_at"),
                post_id: row.get("post_id"),
                post_title: row.get("post_title"),
            })
            .collect())
    }
}

fn comment_from_row(row: &PgRow) -> Comment {
    Comment {
        id: row.get("id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        parent_id: row.get("parent_id"),
        author: Author {
            id: row.get("author_id"),
            username: row.get("author_username"),
            display_name: row.get("author_display_name"),
            avatar: row.get("author_avatar"),
        },
    }
}

/// Hangs each reply under its parent, keeping the incoming order of both
/// lists. Replies whose parent is not in `top_level` are dropped.
fn assemble_threads(top_level: Vec<Comment>, replies: Vec<Comment>) -> Vec<CommentThread> {
    let mut by_parent: HashMap<i64, Vec<Comment>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    top_level
        .into_iter()
        .map(|comment| {
            let replies = by_parent.remove(&comment.id).unwrap_or_default();
            CommentThread { comment, replies }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn comment(id: i64, parent_id: Option<i64>) -> Comment {
        Comment {
            id,
            content: format!("comment {}", id),
            created_at: OffsetDateTime::UNIX_EPOCH,
            parent_id,
            author: Author {
                id: 7,
                username: "ana".into(),
                display_name: None,
                avatar: None,
            },
        }
    }

    #[test]
    fn replies_attach_to_their_parent_in_order() {
        let threads = assemble_threads(
            vec![comment(3, None), comment(1, None)],
            vec![comment(4, Some(1)), comment(5, Some(3)), comment(6, Some(1))],
        );

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, 3);
        assert_eq!(threads[0].replies.iter().map(|c| c.id).collect::<Vec<_>>(), vec![5]);
        assert_eq!(threads[1].comment.id, 1);
        assert_eq!(threads[1].replies.iter().map(|c| c.id).collect::<Vec<_>>(), vec![4, 6]);
    }

    #[test]
    fn orphan_replies_are_dropped() {
        let threads = assemble_threads(vec![comment(1, None)], vec![comment(2, Some(99))]);
        assert_eq!(threads.len(), 1);
        assert!(threads[0].replies.is_empty());
    }

    #[test]
    fn replies_to_replies_hang_off_the_root() {
        let top = CommentRef { id: 1, post_id: 1, user_id: 2, parent_id: None };
        let reply = CommentRef { id: 5, post_id: 1, user_id: 3, parent_id: Some(1) };
        assert_eq!(top.thread_root(), 1);
        assert_eq!(reply.thread_root(), 1);
    }
}
