use serde::Serialize;

use crate::domain::user::Author;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Denormalized counter, maintained on like toggles.
    pub likes: i32,
    /// Denormalized counter, maintained on comment create/delete.
    pub comments: i32,
    pub img: Option<String>,
    pub liked_by_user: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
}
