//! Binary transfer handlers
//!
//! Download streams any file's raw bytes; upload stores multipart file
//! fields into a directory. Neither goes through the content cache, but
//! uploads invalidate the listings they change.

use std::path::Path;

use axum::{
    body::Body,
    extract::{multipart::MultipartError, Multipart, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};

use crate::api::handlers::child_path;
use crate::api::state::AppState;
use crate::error::{Result, VfsError};
use crate::models::{file_info::mime_for, ApiResponse, PathQuery, UploadedFile};
use crate::vfs::normalize_virtual;

// == Download ==
/// Handler for `GET /api/files/download?path=<file>`
pub async fn download_file(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Response> {
    if query.path.is_empty() {
        return Err(VfsError::BadRequest("File path is required".to_string()));
    }
    let path = normalize_virtual(&query.path);
    let physical = state.resolver.build_safe_path(&path)?;

    let file = File::open(&physical)
        .await
        .map_err(|err| VfsError::from_io(err, &path))?;
    let metadata = file
        .metadata()
        .await
        .map_err(|err| VfsError::from_io(err, &path))?;
    if metadata.is_dir() {
        return Err(VfsError::BadRequest(format!("{path} is a directory")));
    }

    let name = physical
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    info!(path = %path, size = metadata.len(), "Download started");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, mime_for(&name))
        .header(header::CONTENT_LENGTH, metadata.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{}\"", disposition_name(&name)),
        )
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|err| VfsError::Internal(err.to_string()))
}

/// ASCII-only file name safe to quote in `Content-Disposition`.
fn disposition_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "download".to_string()
    } else {
        cleaned
    }
}

// == Upload ==
/// Handler for `POST /api/files/upload?path=<dir>`
///
/// A text field named `path` overrides the query directory for the fields
/// after it. Every field carrying a file name is stored under that
/// directory, replacing any existing file.
pub async fn upload_files(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<Vec<UploadedFile>>>> {
    let mut dir = normalize_virtual(&query.path);
    let mut uploaded = Vec::new();

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(raw_name) = field.file_name().map(str::to_string) else {
            if field.name() == Some("path") {
                let value = field.text().await.map_err(multipart_error)?;
                dir = normalize_virtual(&value);
            }
            continue;
        };

        let name = upload_name(&raw_name)?;
        let path = child_path(&dir, &name);
        let physical = state.resolver.build_safe_path(&path)?;
        if let Some(parent) = physical.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| VfsError::from_io(err, &dir))?;
        }

        let written = store_field(&mut field, &physical, &path, state.config.max_file_size).await;
        let size = match written {
            Ok(size) => size,
            Err(err) => {
                // Leave no partial file behind.
                if let Err(remove_err) = tokio::fs::remove_file(&physical).await {
                    warn!(path = %path, error = %remove_err, "Failed to remove partial upload");
                }
                return Err(err);
            }
        };

        state.invalidate_path(&path);
        info!(path = %path, size, "File uploaded");
        uploaded.push(UploadedFile { path, size });
    }

    if uploaded.is_empty() {
        return Err(VfsError::BadRequest("No files in upload".to_string()));
    }
    let message = format!("{} file(s) uploaded", uploaded.len());
    Ok(Json(ApiResponse::with_message(uploaded, message)))
}

/// Last path segment of a client-supplied file name.
fn upload_name(raw: &str) -> Result<String> {
    let name = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    if name.is_empty() || name == "." || name == ".." {
        return Err(VfsError::BadRequest(format!("Invalid file name: {raw}")));
    }
    Ok(name.to_string())
}

async fn store_field(
    field: &mut axum::extract::multipart::Field<'_>,
    physical: &Path,
    path: &str,
    max_size: u64,
) -> Result<u64> {
    let mut file = File::create(physical)
        .await
        .map_err(|err| VfsError::from_io(err, path))?;
    let mut size: u64 = 0;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        size += chunk.len() as u64;
        if size > max_size {
            return Err(VfsError::TooLarge(format!(
                "{path} exceeds the {max_size} byte limit"
            )));
        }
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(size)
}

fn multipart_error(err: MultipartError) -> VfsError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        VfsError::TooLarge(err.body_text())
    } else {
        VfsError::BadRequest(err.body_text())
    }
}
