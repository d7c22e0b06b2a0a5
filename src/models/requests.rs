//! Request DTOs for the file API
//!
//! Defines the structure of incoming query strings and JSON bodies.

use serde::Deserialize;

/// Default cap on search results.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// `?path=` query for listing and content reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: String,
}

/// Request body for `POST /api/files/save`
#[derive(Debug, Clone, Deserialize)]
pub struct SaveFileRequest {
    pub path: String,
    pub content: String,
}

impl SaveFileRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.path.trim().is_empty() {
            return Some("Path cannot be empty".to_string());
        }
        None
    }
}

/// Request body for `POST /api/files/create`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFileRequest {
    /// Virtual directory to create the file in
    #[serde(default)]
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl CreateFileRequest {
    pub fn validate(&self) -> Option<String> {
        validate_name(&self.name)
    }

    /// Name with `.md` appended when it has no extension.
    pub fn file_name(&self) -> String {
        let name = self.name.trim();
        if std::path::Path::new(name).extension().is_none() {
            format!("{name}.md")
        } else {
            name.to_string()
        }
    }

    /// Provided content, or a markdown heading named after the file stem.
    pub fn initial_content(&self) -> String {
        match &self.content {
            Some(content) => content.clone(),
            None => {
                let file_name = self.file_name();
                let stem = std::path::Path::new(&file_name)
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .unwrap_or(&file_name)
                    .to_string();
                format!("# {stem}\n\n")
            }
        }
    }
}

/// Request body for `POST /api/files/mkdir`
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDirectoryRequest {
    #[serde(default)]
    pub path: String,
    pub name: String,
}

impl CreateDirectoryRequest {
    pub fn validate(&self) -> Option<String> {
        validate_name(&self.name)
    }
}

/// Request body for `POST /api/files/move`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub source_path: String,
    pub target_path: String,
}

impl MoveRequest {
    pub fn validate(&self) -> Option<String> {
        if self.source_path.trim().is_empty() || self.target_path.trim().is_empty() {
            return Some("Source and target paths are required".to_string());
        }
        None
    }
}

/// Request body for `POST /api/files/batch-delete`
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPathsRequest {
    pub paths: Vec<String>,
}

impl BatchPathsRequest {
    pub fn validate(&self) -> Option<String> {
        if self.paths.is_empty() {
            return Some("No paths provided".to_string());
        }
        None
    }
}

/// Name-matching scope of a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchScope {
    /// Immediate children of the base directory
    #[default]
    Current,
    /// Whole subtree below the base directory
    Recursive,
}

impl SearchScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchScope::Current => "current",
            SearchScope::Recursive => "recursive",
        }
    }
}

/// Request body for `POST /api/search`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub term: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub scope: SearchScope,
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default)]
    pub max_results: usize,
}

impl SearchRequest {
    pub fn validate(&self) -> Option<String> {
        if self.term.trim().is_empty() {
            return Some("Search term is required".to_string());
        }
        None
    }

    /// Requested cap, or [`DEFAULT_MAX_RESULTS`] when zero.
    pub fn result_limit(&self) -> usize {
        if self.max_results == 0 {
            DEFAULT_MAX_RESULTS
        } else {
            self.max_results
        }
    }
}

/// A client-supplied name must be exactly one path segment.
fn validate_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        return Some("Name cannot be empty".to_string());
    }
    if name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
        return Some(format!("Invalid name: {name}"));
    }
    None
}
