use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::config::AppConfig;

/// Route prefix under which stored files are served.
pub const PUBLIC_PREFIX: &str = "/uploads";

/// Local directory that receives uploaded images and the public URL they
/// are reachable under.
#[derive(Clone)]
pub struct UploadStore {
    dir: PathBuf,
    public_base_url: String,
}

impl UploadStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            dir: config.upload_dir.clone(),
            public_base_url: config.public_base_url.clone(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `bytes` under a fresh random name that starts with `prefix` and
    /// keeps the extension of `original_name`. Returns the public URL.
    pub async fn save(&self, prefix: &str, original_name: Option<&str>, bytes: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create upload dir {}", self.dir.display()))?;

        let file_name = match original_name.and_then(extension_of) {
            Some(ext) => format!("{}{}.{}", prefix, Uuid::new_v4(), ext),
            None => format!("{}{}", prefix, Uuid::new_v4()),
        };

        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write upload {}", path.display()))?;

        Ok(self.public_url(&file_name))
    }

    pub fn public_url(&self, file_name: &str) -> String {
        format!("{}{}/{}", self.public_base_url, PUBLIC_PREFIX, file_name)
    }
}

/// Extension after the last `.`, only if it is plain ASCII alphanumerics.
fn extension_of(name: &str) -> Option<&str> {
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() || ext.len() > 10 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext)
}
