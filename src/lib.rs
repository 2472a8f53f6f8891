pub mod app;
pub mod config;
pub mod domain;
pub mod http;
pub mod infra;

use axum::http::HeaderValue;

use crate::config::AppConfig;
use crate::infra::{db::Db, storage::UploadStore};

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub storage: UploadStore,
    pub upload_max_bytes: usize,
    pub cors_origin: HeaderValue,
}

impl AppState {
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let db = Db::connect(config).await?;
        let storage = UploadStore::new(config);

        Ok(Self {
            db,
            storage,
            upload_max_bytes: config.upload_max_bytes,
            cors_origin: config.cors_origin.clone(),
        })
    }
}
