use serde::Serialize;
use time::OffsetDateTime;

/// Fixed set of categories offered to article authors.
pub const CATEGORIES: [&str; 8] = [
    "Inteligencia Artificial",
    "Smartphones",
    "Gaming",
    "Software",
    "Hardware",
    "Redes Sociales",
    "Ciberseguridad",
    "Startups",
];

/// Listing shape: everything except the body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePreview {
    pub id: i64,
    pub title: String,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
    pub category: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Article {
    #[serde(flatten)]
    pub preview: ArticlePreview,
    pub content: Option<String>,
}
