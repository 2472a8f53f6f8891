use axum::async_trait;
use axum::extract::{FromRequest, Multipart, Request};
use bytes::Bytes;
use std::collections::HashMap;

use crate::http::AppError;

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: Option<String>,
    pub bytes: Bytes,
}

/// A fully buffered `multipart/form-data` body. Parts that carry a filename
/// are files, everything else is a text field.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn read(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|err| AppError::bad_request(format!("invalid multipart body: {}", err)))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field.bytes().await.map_err(|err| {
                        AppError::bad_request(format!("invalid multipart body: {}", err))
                    })?;
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name: Some(file_name),
                            bytes,
                        },
                    );
                }
                None => {
                    let text = field.text().await.map_err(|err| {
                        AppError::bad_request(format!("invalid multipart body: {}", err))
                    })?;
                    form.fields.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// A field that must be present; blank values count as missing.
    pub fn required(&self, name: &str) -> Result<String, AppError> {
        match self.text(name).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(AppError::bad_request(format!("{} is required", name))),
        }
    }

    pub fn optional_i64(&self, name: &str) -> Result<Option<i64>, AppError> {
        match self.text(name).map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => value
                .parse::<i64>()
                .map(Some)
                .map_err(|_| AppError::bad_request(format!("{} must be a number", name))),
        }
    }

    pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, AppError> {
        match self.text(name).map(str::trim) {
            None | Some("") => Ok(None),
            Some("true") => Ok(Some(true)),
            Some("false") => Ok(Some(false)),
            Some(_) => Err(AppError::bad_request(format!("{} must be true or false", name))),
        }
    }

    /// The named file, skipping parts that were sent empty.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).filter(|file| !file.bytes.is_empty())
    }
}

#[async_trait]
impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let multipart = Multipart::from_request(req, state).await?;
        Self::read(multipart).await
    }
}
