use axum::extract::Multipart;
use std::collections::HashMap;

use crate::{
    error::{ApiError, ApiResult},
    storage::{self, StorageService},
};

/// UploadedFile
///
/// One file part of a multipart body, fully buffered.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// FormData
///
/// A multipart body split into text fields and file parts, keyed by field name.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    /// read
    ///
    /// Drains the multipart stream. Parts carrying a filename are treated as files; an empty
    /// file part (an unselected `<input type="file">`) is dropped.
    pub async fn read(mut multipart: Multipart) -> ApiResult<Self> {
        let mut form = FormData::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };

            if let Some(filename) = field.file_name().map(str::to_string) {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                form.files.insert(
                    name,
                    UploadedFile {
                        filename: Some(filename),
                        content_type,
                        bytes: bytes.to_vec(),
                    },
                );
            } else {
                let value = field.text().await?;
                form.fields.insert(name, value);
            }
        }

        Ok(form)
    }

    /// The trimmed value of a text field, if present and non-blank.
    pub fn optional(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    }

    pub fn required(&self, name: &str) -> ApiResult<String> {
        self.optional(name).ok_or_else(|| missing(name))
    }

    /// The value exactly as sent, for fields such as passwords where surrounding whitespace
    /// is significant. A blank value still counts as absent.
    pub fn raw(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .filter(|value| !value.trim().is_empty())
            .cloned()
    }

    pub fn required_raw(&self, name: &str) -> ApiResult<String> {
        self.raw(name).ok_or_else(|| missing(name))
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn missing(name: &str) -> ApiError {
    ApiError::bad_request(format!("Missing required field: {}", name))
}

/// upload_image
///
/// Stores an uploaded image under `<prefix>/<uuid>.<ext>` and returns its public URL.
/// Storage failures become a 400.
pub async fn upload_image(
    storage: &dyn StorageService,
    prefix: &str,
    file: UploadedFile,
) -> ApiResult<String> {
    let key = storage::object_key(prefix, file.filename.as_deref());
    let url = storage
        .upload(&key, &file.content_type, file.bytes)
        .await
        .map_err(|e| {
            tracing::warn!(key = %key, error = %e, "image upload failed");
            ApiError::from(e)
        })?;
    Ok(url)
}
