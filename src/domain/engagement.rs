use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::user::Author;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: i64,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub parent_id: Option<i64>,
    pub author: Author,
}

/// A top-level comment with its direct replies, oldest reply first.
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// A comment as listed on its author's activity page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserComment {
    pub id: i64,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub post_id: i64,
    pub post_title: String,
}
