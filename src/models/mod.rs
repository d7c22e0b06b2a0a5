//! Request and response models for the file API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod file_info;
pub mod requests;
pub mod responses;

pub use file_info::FileInfo;
pub use requests::{
    BatchPathsRequest, CreateDirectoryRequest, CreateFileRequest, MoveRequest, PathQuery,
    SaveFileRequest, SearchRequest, SearchScope,
};
pub use responses::{
    ApiResponse, BatchDeleteResponse, BatchFailure, ContentResponse, ConfigResponse,
    HealthResponse, PathResponse, SpecificDirInfo, StatsResponse, UploadedFile,
};
