//! File metadata as served to clients.

use std::fs::Metadata;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

const OCTET_STREAM: &str = "application/octet-stream";

/// Extension → MIME type. Lookup is case-insensitive on the extension.
const MIME_TYPES: &[(&str, &str)] = &[
    ("txt", "text/plain; charset=utf-8"),
    ("md", "text/markdown; charset=utf-8"),
    ("markdown", "text/markdown; charset=utf-8"),
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("csv", "text/csv; charset=utf-8"),
    ("js", "text/javascript; charset=utf-8"),
    ("json", "application/json"),
    ("xml", "text/xml; charset=utf-8"),
    ("yaml", "application/yaml"),
    ("yml", "application/yaml"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("gz", "application/gzip"),
    ("tar", "application/x-tar"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("flac", "audio/flac"),
    ("mp4", "video/mp4"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("wasm", "application/wasm"),
];

/// MIME prefixes considered text.
const TEXT_MIME_PREFIXES: &[&str] = &[
    "text/",
    "application/json",
    "application/xml",
    "application/javascript",
    "application/x-yaml",
    "application/yaml",
];

/// Extensions the editor accepts even when the MIME type is not textual.
const EDITABLE_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "json", "xml", "yaml", "yml", "html", "htm", "css", "js", "jsx",
    "ts", "tsx", "py", "java", "c", "cpp", "h", "hpp", "go", "rs", "php", "rb", "sh", "bash",
    "zsh", "ps1", "bat", "cmd", "sql", "conf", "config", "ini", "env", "dockerfile", "gitignore",
    "gitattributes", "editorconfig", "prettierrc", "eslintrc", "babelrc", "npmrc", "yarnrc",
    "toml",
];

// == File Info ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    /// Virtual path
    pub path: String,
    pub size: u64,
    /// RFC 3339; empty when the platform cannot report it
    pub mod_time: String,
    pub is_dir: bool,
    pub mime_type: String,
    pub is_editable: bool,
    pub is_mount: bool,
}

impl FileInfo {
    /// Builds the entry for `name` at `virtual_path`. `meta` is `None` when
    /// the entry could not be stat'ed (or is neither file nor directory); it
    /// is then reported with size 0 and no modification time.
    pub fn describe(
        name: impl Into<String>,
        virtual_path: impl Into<String>,
        meta: Option<&Metadata>,
        is_dir: bool,
    ) -> Self {
        let name = name.into();
        let (mime_type, is_editable) = if is_dir {
            (OCTET_STREAM.to_string(), false)
        } else {
            let mime = mime_for(&name);
            let editable = is_text_mime(mime) || is_editable_name(&name);
            (mime.to_string(), editable)
        };

        Self {
            size: meta.map_or(0, Metadata::len),
            mod_time: meta.map(format_mod_time).unwrap_or_default(),
            name,
            path: virtual_path.into(),
            is_dir,
            mime_type,
            is_editable,
            is_mount: false,
        }
    }

    /// Entry for a mount root listed at the namespace root.
    pub fn mount(name: impl Into<String>, virtual_path: impl Into<String>, meta: &Metadata) -> Self {
        Self {
            is_mount: true,
            ..Self::describe(name, virtual_path, Some(meta), true)
        }
    }
}

fn format_mod_time(meta: &Metadata) -> String {
    meta.modified()
        .map(|time| DateTime::<Utc>::from(time).to_rfc3339())
        .unwrap_or_default()
}

fn extension(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
}

/// MIME type by extension; `application/octet-stream` when unknown.
pub fn mime_for(name: &str) -> &'static str {
    extension(name)
        .and_then(|ext| {
            MIME_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| *mime)
        })
        .unwrap_or(OCTET_STREAM)
}

pub fn is_text_mime(mime: &str) -> bool {
    TEXT_MIME_PREFIXES
        .iter()
        .any(|prefix| mime.starts_with(prefix))
}

/// Dotfiles such as `.gitignore` count by their whole name.
pub fn is_editable_name(name: &str) -> bool {
    let ext = extension(name).or_else(|| {
        name.strip_prefix('.')
            .map(str::to_ascii_lowercase)
    });
    ext.is_some_and(|ext| EDITABLE_EXTENSIONS.contains(&ext.as_str()))
}
