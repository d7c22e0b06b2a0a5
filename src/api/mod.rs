//! API Module
//!
//! HTTP handlers and routing for the virtual filesystem REST API.
//!
//! # Endpoints (all under `/api`)
//! - `GET /files?path=` - Directory listing with `ETag` / `If-None-Match`
//! - `GET /files/content?path=` - Text content of a file
//! - `GET /files/download?path=` - Raw bytes of any file, streamed
//! - `POST /files/upload?path=` - Multipart upload into a directory
//! - `POST /files/save` - Overwrite a file
//! - `POST /files/create` - Create a new file
//! - `POST /files/mkdir` - Create a directory
//! - `POST /files/move` - Move or rename an entry
//! - `POST /files/batch-delete` - Delete several entries in parallel
//! - `POST /search` - Name search
//! - `GET /config`, `GET /specific-dirs` - Namespace configuration
//! - `GET /health`, `GET /stats` - Server and cache status

pub mod handlers;
pub mod routes;
pub mod state;
pub mod transfer;

pub use handlers::*;
pub use routes::create_router;
pub use state::{AppState, CachedValue};
pub use transfer::{download_file, upload_files};
