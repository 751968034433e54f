//! In-memory virtual file system.
//!
//! Backs the demo binary and tests. Paths are absolute and `/`-separated;
//! writing a file creates any missing parent directories.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::infrastructure::ports::{
    ClockPort, FileEntry, FileMetadata, FileSystemError, FileSystemPort, NodeKind,
};

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    content: String,
    modified_at: DateTime<Utc>,
}

pub struct InMemoryFileSystem {
    nodes: RwLock<BTreeMap<String, Node>>,
    clock: Arc<dyn ClockPort>,
}

impl InMemoryFileSystem {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Node {
                kind: NodeKind::Directory,
                content: String::new(),
                modified_at: clock.now(),
            },
        );
        Self {
            nodes: RwLock::new(nodes),
            clock,
        }
    }

    /// Seed a file at construction time.
    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        if let Ok(path) = normalize(path) {
            let now = self.clock.now();
            let nodes = self.nodes.get_mut();
            insert_file(nodes, &path, content, now);
        }
        self
    }
}

#[async_trait]
impl FileSystemPort for InMemoryFileSystem {
    async fn exists(&self, path: &str) -> bool {
        match normalize(path) {
            Ok(path) => self.nodes.read().await.contains_key(&path),
            Err(_) => false,
        }
    }

    async fn read_file(&self, path: &str) -> Result<String, FileSystemError> {
        let path = normalize(path)?;
        let nodes = self.nodes.read().await;
        let node = nodes
            .get(&path)
            .ok_or_else(|| FileSystemError::NotFound(path.clone()))?;
        match node.kind {
            NodeKind::File => Ok(node.content.clone()),
            NodeKind::Directory => Err(FileSystemError::IsADirectory(path)),
        }
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<(), FileSystemError> {
        let path = normalize(path)?;
        if path == "/" {
            return Err(FileSystemError::IsADirectory(path));
        }
        let now = self.clock.now();
        let mut nodes = self.nodes.write().await;
        if matches!(nodes.get(&path), Some(node) if node.kind == NodeKind::Directory) {
            return Err(FileSystemError::IsADirectory(path));
        }
        for ancestor in ancestors(&path) {
            if matches!(nodes.get(&ancestor), Some(node) if node.kind == NodeKind::File) {
                return Err(FileSystemError::NotADirectory(ancestor));
            }
        }
        insert_file(&mut nodes, &path, content, now);
        Ok(())
    }

    async fn list_directory(&self, path: &str) -> Result<Vec<FileEntry>, FileSystemError> {
        let path = normalize(path)?;
        let nodes = self.nodes.read().await;
        match nodes.get(&path) {
            None => return Err(FileSystemError::NotFound(path)),
            Some(node) if node.kind == NodeKind::File => {
                return Err(FileSystemError::NotADirectory(path))
            }
            Some(_) => {}
        }

        Ok(nodes
            .iter()
            .filter(|(child, _)| parent_of(child).as_deref() == Some(path.as_str()))
            .map(|(child, node)| FileEntry {
                name: file_name(child).to_string(),
                path: child.clone(),
                kind: node.kind,
            })
            .collect())
    }

    async fn delete_item(&self, path: &str) -> Result<(), FileSystemError> {
        let path = normalize(path)?;
        if path == "/" {
            return Err(FileSystemError::InvalidPath(path));
        }
        let mut nodes = self.nodes.write().await;
        if nodes.remove(&path).is_none() {
            return Err(FileSystemError::NotFound(path));
        }
        let prefix = format!("{}/", path);
        nodes.retain(|child, _| !child.starts_with(&prefix));
        Ok(())
    }

    async fn get_metadata(&self, path: &str) -> Result<FileMetadata, FileSystemError> {
        let path = normalize(path)?;
        let nodes = self.nodes.read().await;
        let node = nodes
            .get(&path)
            .ok_or_else(|| FileSystemError::NotFound(path.clone()))?;
        Ok(FileMetadata {
            size: node.content.len(),
            kind: node.kind,
            modified_at: node.modified_at,
            path,
        })
    }
}

fn insert_file(nodes: &mut BTreeMap<String, Node>, path: &str, content: &str, now: DateTime<Utc>) {
    for ancestor in ancestors(path) {
        nodes.entry(ancestor).or_insert_with(|| Node {
            kind: NodeKind::Directory,
            content: String::new(),
            modified_at: now,
        });
    }
    nodes.insert(
        path.to_string(),
        Node {
            kind: NodeKind::File,
            content: content.to_string(),
            modified_at: now,
        },
    );
}

/// Canonical absolute form: leading `/`, no empty or `.` segments, no trailing `/`.
fn normalize(path: &str) -> Result<String, FileSystemError> {
    let trimmed = path.trim();
    if !trimmed.starts_with('/') {
        return Err(FileSystemError::InvalidPath(path.to_string()));
    }
    let mut segments: Vec<&str> = Vec::new();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    Ok(format!("/{}", segments.join("/")))
}

fn parent_of(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/".to_string()),
        Some(idx) => Some(path[..idx].to_string()),
        None => None,
    }
}

/// Every proper ancestor, root first.
fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = parent_of(path);
    while let Some(parent) = current {
        current = parent_of(&parent);
        out.push(parent);
    }
    out.reverse();
    out
}

fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
