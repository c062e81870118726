use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;

/// Describes the kind of entry returned by a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

/// One named entry of a remote or local directory listing.
///
/// Nodes are snapshots: they are produced by a single listing and never
/// refreshed, so a node may describe something that has since changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub size: u64,
    pub owner: Option<String>,
    pub modified: Option<DateTime<Utc>>,
    /// The listing line the node was parsed from, when the service keeps it.
    pub raw_listing: Option<String>,
}

impl Node {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
            size,
            owner: None,
            modified: None,
            raw_listing: None,
        }
    }

    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
            size: 0,
            owner: None,
            modified: None,
            raw_listing: None,
        }
    }

    /// Synthetic node standing for the filesystem root, which has no listing entry.
    pub fn root() -> Self {
        Self::directory(crate::path::ROOT_PATH)
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Builds a node from local metadata. Symlinks are described by their target.
    pub fn from_metadata(name: impl Into<String>, meta: &fs::Metadata) -> Self {
        let kind = if meta.is_dir() {
            NodeKind::Directory
        } else {
            NodeKind::File
        };
        Self {
            name: name.into(),
            kind,
            size: if meta.is_dir() { 0 } else { meta.len() },
            owner: metadata_owner(meta),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
            raw_listing: None,
        }
    }
}

#[cfg(unix)]
fn metadata_owner(meta: &fs::Metadata) -> Option<String> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.uid().to_string())
}

#[cfg(not(unix))]
fn metadata_owner(_meta: &fs::Metadata) -> Option<String> {
    None
}
