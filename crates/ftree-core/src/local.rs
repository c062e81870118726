//! Local filesystem collaborator.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::node::Node;
use crate::walker::Namespace;

pub trait LocalFilesystem {
    /// Returns the node at `path`, or `None` when nothing exists there.
    fn stat(&self, path: &Path) -> io::Result<Option<Node>>;
    /// Lists a single directory level.
    fn list(&self, path: &Path) -> io::Result<Vec<Node>>;
    fn create_dir(&self, path: &Path) -> io::Result<()>;
    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>>;
    /// Creates a new file; fails if something already exists at `path`.
    fn open_write(&self, path: &Path) -> io::Result<Box<dyn Write>>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
    fn current_dir(&self) -> io::Result<PathBuf>;
}

/// [`LocalFilesystem`] over `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFilesystem;

impl LocalFilesystem for StdFilesystem {
    fn stat(&self, path: &Path) -> io::Result<Option<Node>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(Node::from_metadata(entry_name(path), &meta))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Symlinks are not followed and never listed. An entry whose metadata
    /// cannot be read is listed as a file so that its own transfer fails.
    fn list(&self, path: &Path) -> io::Result<Vec<Node>> {
        let mut nodes = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    log::warn!("skipping unreadable entry in {}: {}", path.display(), err);
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            match entry.file_type() {
                Ok(kind) if kind.is_symlink() => {
                    log::debug!("not following symlink {}", entry.path().display());
                    continue;
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("cannot read type of {}: {}", entry.path().display(), err);
                    nodes.push(Node::file(name, 0));
                    continue;
                }
            }
            match entry.metadata() {
                Ok(meta) => nodes.push(Node::from_metadata(name, &meta)),
                Err(err) => {
                    log::warn!("cannot read metadata of {}: {}", entry.path().display(), err);
                    nodes.push(Node::file(name, 0));
                }
            }
        }
        nodes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(nodes)
    }

    fn create_dir(&self, path: &Path) -> io::Result<()> {
        fs::create_dir(path)
    }

    fn open_read(&self, path: &Path) -> io::Result<Box<dyn Read>> {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }

    fn open_write(&self, path: &Path) -> io::Result<Box<dyn Write>> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn current_dir(&self) -> io::Result<PathBuf> {
        std::env::current_dir()
    }
}

pub(crate) fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Adapts a [`LocalFilesystem`] to the walker.
pub struct LocalNamespace<'a, L: ?Sized> {
    fs: &'a L,
}

impl<'a, L: LocalFilesystem + ?Sized> LocalNamespace<'a, L> {
    pub fn new(fs: &'a L) -> Self {
        Self { fs }
    }
}

impl<L: LocalFilesystem + ?Sized> Namespace for LocalNamespace<'_, L> {
    type Path = PathBuf;

    fn list_dir(&mut self, dir: &PathBuf) -> io::Result<Vec<Node>> {
        self.fs.list(dir)
    }

    fn child_path(&self, parent: &PathBuf, name: &str) -> PathBuf {
        parent.join(name)
    }
}
