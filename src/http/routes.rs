use axum::{routing::delete, routing::get, routing::post, Router};

use crate::AppState;
use crate::http::handlers;

pub fn health() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health))
}

pub fn auth() -> Router<AppState> {
    Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route(
            "/api/auth/user/:id",
            get(handlers::get_user).put(handlers::update_user),
        )
        .route("/api/auth/user/:id/avatar", post(handlers::upload_avatar))
}

pub fn posts() -> Router<AppState> {
    Router::new()
        .route(
            "/api/posts",
            get(handlers::list_posts).post(handlers::create_post),
        )
        .route("/api/posts/user/:author_id", get(handlers::list_author_posts))
        .route("/api/posts/:post_id/like", post(handlers::toggle_like))
        .route(
            "/api/posts/:post_id/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route(
            "/api/posts/:post_id/comments/:comment_id",
            delete(handlers::delete_comment),
        )
}

pub fn articles() -> Router<AppState> {
    Router::new()
        .route(
            "/api/articles",
            get(handlers::list_articles).post(handlers::create_article),
        )
        .route("/api/articles/categories", get(handlers::article_categories))
        .route("/api/articles/search", get(handlers::search_articles))
        .route(
            "/api/articles/category/:category",
            get(handlers::list_articles_by_category),
        )
        .route(
            "/api/articles/:id",
            get(handlers::get_article).delete(handlers::delete_article),
        )
}

pub fn users() -> Router<AppState> {
    Router::new()
        .route("/api/users/:user_id/liked-posts", get(handlers::liked_posts))
        .route("/api/users/:user_id/comments", get(handlers::user_comments))
}
