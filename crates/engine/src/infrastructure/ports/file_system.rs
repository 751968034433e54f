//! Virtual file system collaborator port.
//!
//! The desktop shell owns the file tree. The engine only needs to read
//! through it so file opens can be recorded as actions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::FileSystemError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One child of a listed directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadata {
    pub path: String,
    pub kind: NodeKind,
    /// Content length in bytes, 0 for directories
    pub size: usize,
    pub modified_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileSystemPort: Send + Sync {
    async fn exists(&self, path: &str) -> bool;
    async fn read_file(&self, path: &str) -> Result<String, FileSystemError>;
    async fn write_file(&self, path: &str, content: &str) -> Result<(), FileSystemError>;
    async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, FileSystemError>;
    async fn delete_item(&self, path: &str) -> Result<(), FileSystemError>;
    async fn get_metadata(&self, path: &str) -> Result<FileMetadata, FileSystemError>;
}
