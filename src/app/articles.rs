use anyhow::Result;
use sqlx::postgres::PgRow;
use sqlx::Row;

use crate::domain::article::{Article, ArticlePreview};
use crate::infra::db::Db;

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub category: String,
    pub cover_image: Option<String>,
    pub published: bool,
    pub author_id: i64,
}

#[derive(Clone)]
pub struct ArticleService {
    db: Db,
}

impl ArticleService {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    pub async fn create_article(&self, article: NewArticle) -> Result<Article> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO articles (title, summary, content, category, cover_image, published, author_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(article.title)
        .bind(article.summary)
        .bind(article.content)
        .bind(article.category)
        .bind(article.cover_image)
        .bind(article.published)
        .bind(article.author_id)
        .fetch_one(self.db.pool())
        .await?;

        self.get_article(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("article {} vanished after insert", id))
    }

    /// Fetches an article whether or not it is published.
    pub async fn get_article(&self, article_id: i64) -> Result<Option<Article>> {
        let row = sqlx::query(
            "SELECT a.id, a.title, a.summary, a.content, a.cover_image, a.category, a.created_at, \
                    a.published, COALESCE(u.display_name, u.username) AS author_name \
             FROM articles a \
             LEFT JOIN users u ON u.id = a.author_id \
             WHERE a.id = $1",
        )
        .bind(article_id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(|row| Article {
            preview: preview_from_row(&row),
            content: row.get("content"),
        }))
    }

    /// Published articles, newest first.
    pub async fn list_published(&self) -> Result<Vec<ArticlePreview>> {
        let rows = sqlx::query(
            "SELECT a.id, a.title, a.summary, a.cover_image, a.category, a.created_at, a.published, \
                    COALESCE(u.display_name, u.username) AS author_name \
             FROM articles a \
             LEFT JOIN users u ON u.id = a.author_id \
             WHERE a.published \
             ORDER BY a.created_at DESC, a.id DESC",
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(preview_from_row).collect())
    }

    pub async fn list_by_category(&self, category: &str) -> Result<Vec<ArticlePreview>> {
        let rows = sqlx::query(
            "SELECT a.id, a.title, a.summary, a.cover_image, a.category, a.created_at, a.published, \
                    COALESCE(u.display_name, u.username) AS author_name \
             FROM articles a \
             LEFT JOIN users u ON u.id = a.author_id \
             WHERE a.published AND a.category = $1 \
             ORDER BY a.created_at DESC, a.id DESC",
        )
        .bind(category)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(preview_from_row).collect())
    }

    /// Published articles whose title contains `query`, ignoring case.
    pub async fn search_titles(&self, query: &str) -> Result<Vec<ArticlePreview>> {
        let pattern = format!("%{}%", escape_like(query));
        let rows = sqlx::query(
            "SELECT a.id, a.title, a.summary, a.cover_image, a.category, a.created_at, a.published, \
                    COALESCE(u.display_name, u.username) AS author_name \
             FROM articles a \
             LEFT JOIN users u ON u.id = a.author_id \
             WHERE a.published AND a.title ILIKE $1 ESCAPE '\\' \
             ORDER BY a.created_at DESC, a.id DESC",
        )
        .bind(pattern)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.iter().map(preview_from_row).collect())
    }

    pub async fn delete_article(&self, article_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(article_id)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn preview_from_row(row: &PgRow) -> ArticlePreview {
    ArticlePreview {
        id: row.get("id"),
        title: row.get("title"),
        summary: row.get("summary"),
        cover_image: row.get("cover_image"),
        category: row.get("category"),
        created_at: row.get("created_at"),
        published: row.get("published"),
        author_name: row.get("author_name"),
    }
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
