//! Response DTOs for the file API
//!
//! Every JSON body is wrapped in the [`ApiResponse`] envelope.

use std::path::PathBuf;

use serde::Serialize;

use crate::cache::CacheStats;

/// `{ success, message?, data? }`
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::ok(data)
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// Body of `GET /api/files/content`
#[derive(Debug, Clone, Serialize)]
pub struct ContentResponse {
    pub path: String,
    pub content: String,
}

/// Body of create, mkdir and move: the virtual path now holding the entry
#[derive(Debug, Clone, Serialize)]
pub struct PathResponse {
    pub path: String,
}

/// One stored file in the body of `POST /api/files/upload`
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub path: String,
    pub size: u64,
}

/// Body of `POST /api/files/batch-delete`
#[derive(Debug, Clone, Serialize)]
pub struct BatchDeleteResponse {
    pub deleted: usize,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub path: String,
    pub error: String,
}

/// Body of `GET /api/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub active_workers: usize,
    pub cache_stats: CacheUsage,
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheUsage {
    pub entries: usize,
    pub size: u64,
}

impl HealthResponse {
    pub fn healthy(active_workers: usize, (entries, size): (usize, u64)) -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            active_workers,
            cache_stats: CacheUsage { entries, size },
        }
    }
}

/// Body of `GET /api/stats`
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub cache: CacheStats,
    pub hit_rate: f64,
    pub max_size: u64,
    pub max_items: usize,
    pub workers: usize,
    pub active_workers: usize,
    pub queued: usize,
}

/// Body of `GET /api/config`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigResponse {
    pub storage_dir: PathBuf,
    pub mount_dirs: Vec<PathBuf>,
    pub specific_dirs: Vec<PathBuf>,
    pub max_file_size: u64,
}

/// One entry of `GET /api/specific-dirs`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpecificDirInfo {
    pub name: String,
    /// Virtual path, `/<name>`
    pub path: String,
}
