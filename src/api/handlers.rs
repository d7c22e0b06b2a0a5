//! API Handlers
//!
//! HTTP request handlers for each file server endpoint. Filesystem work
//! runs on the worker pool; responses are served from the cache when the
//! relevant fingerprint, modification time or query digest still matches.

use std::fs;
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::{debug, info, warn};

use crate::api::state::{AppState, CachedValue};
use crate::cache::keys;
use crate::cache::LISTING_ITEM_SIZE;
use crate::error::{Result, VfsError};
use crate::files::{self, NameMatcher};
use crate::models::{
    ApiResponse, BatchDeleteResponse, BatchFailure, BatchPathsRequest, ConfigResponse,
    ContentResponse, CreateDirectoryRequest, CreateFileRequest, FileInfo, HealthResponse,
    MoveRequest, PathQuery, PathResponse, SaveFileRequest, SearchRequest, SearchScope,
    SpecificDirInfo, StatsResponse,
};
use crate::vfs::{normalize_virtual, root_name};

// == Listing ==
/// Handler for `GET /api/files?path=`
///
/// Answers 304 when `If-None-Match` carries the directory's current
/// fingerprint; otherwise sets `ETag` and serves the listing, cached under
/// that fingerprint.
pub async fn list_files(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let dir = normalize_virtual(&query.path);

    let fingerprinter = state.fingerprinter.clone();
    let target = dir.clone();
    let fingerprint = state
        .run_pooled(move || fingerprinter.fingerprint(&target))
        .await?;

    if fingerprint.is_empty() {
        // Nothing to key on; list uncached so the caller gets the real error.
        let target = dir.clone();
        let listing = state
            .run_fan_out(move |resolver, pool| files::list_directory(resolver, pool, &target))
            .await?;
        return Ok(Json(ApiResponse::ok(listing)).into_response());
    }

    let etag = format!("\"{fingerprint}\"");
    if let Some(client) = headers.get(header::IF_NONE_MATCH) {
        if etag_matches(client, &fingerprint) {
            debug!(dir = %dir, "Listing not modified");
            return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
        }
    }

    let key = keys::listing_key(&dir, &fingerprint);
    let listing = match state.cache.get(&key) {
        Some(CachedValue::Listing(listing)) => listing,
        _ => {
            let target = dir.clone();
            let listing = Arc::new(
                state
                    .run_fan_out(move |resolver, pool| files::list_directory(resolver, pool, &target))
                    .await?,
            );
            let size = listing.len() as u64 * LISTING_ITEM_SIZE;
            state.cache.set(
                key,
                CachedValue::Listing(Arc::clone(&listing)),
                size,
                state.config.cache_ttl,
            );
            listing
        }
    };

    Ok((
        [(header::ETAG, etag)],
        Json(ApiResponse::ok(listing.as_slice())),
    )
        .into_response())
}

/// Accepts `"fp"`, `W/"fp"`, bare `fp`, comma-separated lists and `*`.
fn etag_matches(header: &HeaderValue, fingerprint: &str) -> bool {
    let Ok(value) = header.to_str() else {
        return false;
    };
    value.split(',').map(str::trim).any(|candidate| {
        candidate == "*"
            || candidate
                .trim_start_matches("W/")
                .trim_matches('"')
                == fingerprint
    })
}

// == Content ==
/// Handler for `GET /api/files/content?path=`
pub async fn get_file_content(
    State(state): State<AppState>,
    Query(query): Query<PathQuery>,
) -> Result<Json<ApiResponse<ContentResponse>>> {
    if query.path.trim().is_empty() {
        return Err(VfsError::BadRequest("Path required".to_string()));
    }
    let path = normalize_virtual(&query.path);
    let physical = state.resolver.to_physical(&path)?;

    let stat_path = physical.clone();
    let virtual_path = path.clone();
    let meta = state
        .run_pooled(move || {
            fs::metadata(&stat_path).map_err(|err| VfsError::from_io(err, &virtual_path))
        })
        .await?;
    if meta.is_dir() {
        return Err(VfsError::BadRequest(format!("{path} is a directory")));
    }

    let key = keys::content_key(&path, files::mtime_secs(&meta));
    if let Some(CachedValue::Content(content)) = state.cache.get(&key) {
        return Ok(Json(ApiResponse::ok(ContentResponse {
            path,
            content: content.to_string(),
        })));
    }

    let virtual_path = path.clone();
    let (content, read_meta) = state
        .run_pooled(move || files::read_text(&physical, &virtual_path))
        .await?;
    let content: Arc<str> = Arc::from(content);
    state.cache.set(
        key,
        CachedValue::Content(Arc::clone(&content)),
        read_meta.len(),
        state.config.cache_ttl,
    );

    Ok(Json(ApiResponse::ok(ContentResponse {
        path,
        content: content.to_string(),
    })))
}

// == Save ==
/// Handler for `POST /api/files/save`
pub async fn save_file(
    State(state): State<AppState>,
    Json(req): Json<SaveFileRequest>,
) -> Result<Json<ApiResponse<()>>> {
    if let Some(error_msg) = req.validate() {
        return Err(VfsError::BadRequest(error_msg));
    }
    let path = normalize_virtual(&req.path);
    let physical = state.resolver.build_safe_path(&path)?;
    let max_size = state.config.max_file_size;

    let virtual_path = path.clone();
    state
        .run_pooled(move || files::write_text(&physical, &virtual_path, &req.content, max_size))
        .await?;

    state.invalidate_path(&path);
    info!(path = %path, "File saved");
    Ok(Json(ApiResponse::message("File saved successfully")))
}

// == Create ==
/// Handler for `POST /api/files/create`
pub async fn create_file(
    State(state): State<AppState>,
    Json(req): Json<CreateFileRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PathResponse>>)> {
    if let Some(error_msg) = req.validate() {
        return Err(VfsError::BadRequest(error_msg));
    }
    let path = child_path(&req.path, &req.file_name());
    let physical = state.resolver.build_safe_path(&path)?;
    let content = req.initial_content();
    let max_size = state.config.max_file_size;

    let virtual_path = path.clone();
    state
        .run_pooled(move || files::create_file(&physical, &virtual_path, &content, max_size))
        .await?;

    state.invalidate_path(&path);
    info!(path = %path, "File created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            PathResponse { path },
            "File created successfully",
        )),
    ))
}

// == Mkdir ==
/// Handler for `POST /api/files/mkdir`
pub async fn create_directory(
    State(state): State<AppState>,
    Json(req): Json<CreateDirectoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PathResponse>>)> {
    if let Some(error_msg) = req.validate() {
        return Err(VfsError::BadRequest(error_msg));
    }
    let path = child_path(&req.path, req.name.trim());
    let physical = state.resolver.build_safe_path(&path)?;

    let virtual_path = path.clone();
    state
        .run_pooled(move || files::create_directory(&physical, &virtual_path))
        .await?;

    state.invalidate_path(&path);
    info!(path = %path, "Directory created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            PathResponse { path },
            "Directory created successfully",
        )),
    ))
}

// == Move ==
/// Handler for `POST /api/files/move`
pub async fn move_file(
    State(state): State<AppState>,
    Json(req): Json<MoveRequest>,
) -> Result<Json<ApiResponse<PathResponse>>> {
    if let Some(error_msg) = req.validate() {
        return Err(VfsError::BadRequest(error_msg));
    }
    let source = normalize_virtual(&req.source_path);
    let target = normalize_virtual(&req.target_path);
    let source_physical = state.resolver.build_safe_path(&source)?;
    let target_physical = state.resolver.build_safe_path(&target)?;
    files::ensure_not_root(&state.resolver, &source_physical, &source)?;
    files::ensure_not_root(&state.resolver, &target_physical, &target)?;

    let (from, to) = (source.clone(), target.clone());
    state
        .run_pooled(move || files::move_path(&source_physical, &from, &target_physical, &to))
        .await?;

    state.invalidate_path(&source);
    state.invalidate_path(&target);
    info!(from = %source, to = %target, "Entry moved");
    Ok(Json(ApiResponse::with_message(
        PathResponse { path: target },
        "File moved successfully",
    )))
}

// == Batch Delete ==
/// Handler for `POST /api/files/batch-delete`
///
/// Deletes run in parallel on the pool. Any failure turns the whole
/// response into an error carrying the per-path failures, with the most
/// severe status among them.
pub async fn batch_delete(
    State(state): State<AppState>,
    Json(req): Json<BatchPathsRequest>,
) -> Result<Response> {
    if let Some(error_msg) = req.validate() {
        return Err(VfsError::BadRequest(error_msg));
    }

    let paths = req.paths;
    let outcomes = state
        .run_fan_out(move |resolver, pool| Ok(files::delete_many(resolver, pool, &paths)))
        .await?;

    let mut deleted = 0;
    let mut failed = Vec::new();
    let mut status = StatusCode::OK;
    for outcome in outcomes {
        match outcome.result {
            Ok(()) => {
                state.invalidate_path(&outcome.path);
                deleted += 1;
            }
            Err(err) => {
                warn!(path = %outcome.path, error = %err, "Delete failed");
                if err.status().as_u16() > status.as_u16() {
                    status = err.status();
                }
                failed.push(BatchFailure {
                    path: outcome.path,
                    error: err.to_string(),
                });
            }
        }
    }

    info!(deleted, failed = failed.len(), "Batch delete finished");
    if failed.is_empty() {
        return Ok(Json(ApiResponse::with_message(
            BatchDeleteResponse { deleted, failed },
            "Selected items deleted successfully",
        ))
        .into_response());
    }

    let message = failed
        .iter()
        .map(|failure| format!("{}: {}", failure.path, failure.error))
        .collect::<Vec<_>>()
        .join("\n");
    let body = ApiResponse {
        success: false,
        message: Some(message),
        data: Some(BatchDeleteResponse { deleted, failed }),
    };
    Ok((status, Json(body)).into_response())
}

// == Search ==
/// Handler for `POST /api/search`
pub async fn search_files(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> Result<Json<ApiResponse<Vec<FileInfo>>>> {
    if let Some(error_msg) = req.validate() {
        return Err(VfsError::BadRequest(error_msg));
    }
    let base = normalize_virtual(&req.path);
    let limit = req.result_limit();

    let key = keys::search_key(
        &req.term,
        &base,
        req.scope.as_str(),
        req.use_regex,
        req.case_sensitive,
        limit,
    );
    if let Some(CachedValue::Search(results)) = state.cache.get(&key) {
        return Ok(Json(ApiResponse::ok(results.as_ref().clone())));
    }

    let matcher = NameMatcher::new(&req.term, req.use_regex, req.case_sensitive)?;
    let target = base.clone();
    let results = match req.scope {
        SearchScope::Current => {
            let matcher = Arc::new(matcher);
            state
                .run_fan_out(move |resolver, pool| {
                    files::search_current(resolver, pool, &target, matcher, limit)
                })
                .await?
        }
        SearchScope::Recursive => {
            let resolver = state.resolver.clone();
            state
                .run_pooled(move || files::search_recursive(&resolver, &target, &matcher, limit))
                .await?
        }
    };

    debug!(term = %req.term, base = %base, hits = results.len(), "Search finished");
    let results = Arc::new(results);
    state.cache.set(
        key,
        CachedValue::Search(Arc::clone(&results)),
        results.len() as u64 * LISTING_ITEM_SIZE,
        state.config.search_ttl,
    );
    Ok(Json(ApiResponse::ok(results.as_ref().clone())))
}

// == System ==
/// Handler for `GET /api/config`
pub async fn get_config(State(state): State<AppState>) -> Json<ApiResponse<ConfigResponse>> {
    let config = &state.config;
    Json(ApiResponse::ok(ConfigResponse {
        storage_dir: config.storage_dir.clone(),
        mount_dirs: config.mount_dirs.clone(),
        specific_dirs: config.specific_dirs.clone(),
        max_file_size: config.max_file_size,
    }))
}

/// Handler for `GET /api/specific-dirs`
///
/// Only roots that currently exist as directories are reported.
pub async fn specific_dirs(State(state): State<AppState>) -> Json<ApiResponse<Vec<SpecificDirInfo>>> {
    let dirs = state
        .config
        .specific_dirs
        .iter()
        .filter_map(|dir| {
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "Specific directory missing");
                return None;
            }
            let name = root_name(dir)?;
            Some(SpecificDirInfo {
                name: name.to_string(),
                path: format!("/{name}"),
            })
        })
        .collect();
    Json(ApiResponse::ok(dirs))
}

/// Handler for `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        state.pool.active_workers(),
        state.cache.usage(),
    ))
}

/// Handler for `GET /api/stats`
pub async fn stats(State(state): State<AppState>) -> Json<ApiResponse<StatsResponse>> {
    let cache = state.cache.stats();
    Json(ApiResponse::ok(StatsResponse {
        hit_rate: cache.hit_rate(),
        cache,
        max_size: state.config.cache_max_size,
        max_items: state.config.cache_max_items,
        workers: state.pool.worker_count(),
        active_workers: state.pool.active_workers(),
        queued: state.pool.queued(),
    }))
}

/// `<dir>/<name>` in virtual form.
pub(crate) fn child_path(dir: &str, name: &str) -> String {
    let dir = normalize_virtual(dir);
    if dir == "/" {
        format!("/{name}")
    } else {
        format!("{dir}/{name}")
    }
}
