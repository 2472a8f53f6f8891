use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::infra::storage::PUBLIC_PREFIX;
use crate::AppState;

mod error;
mod extract;
mod form;
mod handlers;
mod routes;

pub use error::AppError;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(state.cors_origin.clone())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE]);

    let uploads = ServeDir::new(state.storage.dir());

    Router::new()
        .merge(routes::health())
        .merge(routes::auth())
        .merge(routes::posts())
        .merge(routes::articles())
        .merge(routes::users())
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(state.upload_max_bytes))
        .layer(cors)
        .with_state(state)
}
