//! Lexical path canonicalization for the remote namespace and the local one.
//!
//! Nothing here touches the network or the disk: `..` is collapsed textually,
//! so a symlinked directory on the server resolves as its link path.

use serde::Serialize;
use std::fmt;
use std::path::{Component, Path, PathBuf};

pub const ROOT_PATH: &str = "/";
pub const CURRENT_PATH_ABBREVIATION: &str = ".";
pub const PARENT_PATH_ABBREVIATION: &str = "..";

/// Canonical absolute remote path. Always starts with `/`, never ends with one
/// (except the root itself) and never contains `.`, `..` or empty components.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RemotePath(String);

impl RemotePath {
    pub fn root() -> Self {
        Self(ROOT_PATH.to_string())
    }

    /// Builds a canonical path from already clean components.
    fn from_components<'a>(components: impl IntoIterator<Item = &'a str>) -> Self {
        let mut out = String::new();
        for component in components {
            out.push('/');
            out.push_str(component);
        }
        if out.is_empty() {
            Self::root()
        } else {
            Self(out)
        }
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_PATH
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Last component, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.components().last()
    }

    /// Parent directory; the root is its own parent.
    pub fn parent(&self) -> RemotePath {
        match self.0.rfind('/') {
            Some(0) | None => Self::root(),
            Some(idx) => Self(self.0[..idx].to_string()),
        }
    }

    /// Appends a single entry name. The name is taken verbatim apart from
    /// surrounding slashes, so listing entries can be joined without re-parsing.
    pub fn join(&self, name: &str) -> RemotePath {
        let name = name.trim_matches('/');
        if name.is_empty() {
            return self.clone();
        }
        if self.is_root() {
            Self(format!("/{}", name))
        } else {
            Self(format!("{}/{}", self.0, name))
        }
    }

    /// Component-wise prefix test; a path starts with itself.
    pub fn starts_with(&self, ancestor: &RemotePath) -> bool {
        let mut mine = self.components();
        for theirs in ancestor.components() {
            match mine.next() {
                Some(component) if component == theirs => {}
                _ => return false,
            }
        }
        true
    }

    /// Every prefix of this path below the root, shortest first.
    pub fn ancestors_from_root(&self) -> Vec<RemotePath> {
        let components: Vec<&str> = self.components().collect();
        (1..=components.len())
            .map(|len| Self::from_components(components[..len].iter().copied()))
            .collect()
    }
}

impl Default for RemotePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl AsRef<str> for RemotePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves `requested` against `cwd` into a canonical absolute path.
///
/// `.` is the working directory, `..` its parent, absolute requests ignore
/// `cwd`. `..` above the root stays at the root.
pub fn resolve(requested: &str, cwd: &RemotePath) -> RemotePath {
    let mut stack: Vec<&str> = if requested.starts_with('/') {
        Vec::new()
    } else {
        cwd.components().collect()
    };

    for component in requested.split('/') {
        match component {
            "" | CURRENT_PATH_ABBREVIATION => {}
            PARENT_PATH_ABBREVIATION => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }

    RemotePath::from_components(stack)
}

/// Lexical counterpart of [`resolve`] for local paths.
pub fn resolve_local(requested: &Path, base: &Path) -> PathBuf {
    let joined = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        base.join(requested)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Drops every path equal to or nested under another path of the set.
/// An outer path takes the slot of the first nested path it replaces.
pub fn collapse_nested<T, F>(paths: Vec<T>, is_within: F) -> Vec<T>
where
    F: Fn(&T, &T) -> bool,
{
    let mut kept: Vec<T> = Vec::with_capacity(paths.len());
    for candidate in paths {
        if kept.iter().any(|existing| is_within(&candidate, existing)) {
            continue;
        }
        match kept.iter().position(|existing| is_within(existing, &candidate)) {
            Some(slot) => {
                kept.retain(|existing| !is_within(existing, &candidate));
                kept.insert(slot.min(kept.len()), candidate);
            }
            None => kept.push(candidate),
        }
    }
    kept
}
