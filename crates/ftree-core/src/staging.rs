//! Local scratch space for remote-to-remote copies.
//!
//! A copy streams each file down into a staged temporary file and back up
//! under its final name. The staging directory is created on first use and
//! removed when the [`StagingArea`] is dropped; each operation borrows a
//! [`StagingScope`] that sweeps the files it created when it ends.

use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile, TempDir};

use crate::config::CoreConfig;

const STAGING_DIR_PREFIX: &str = "ftree-staging-";
const STAGED_FILE_PREFIX: &str = "staged-";

#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    dir: Option<TempDir>,
}

impl StagingArea {
    /// Staging directories will be created inside `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dir: None,
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.staging_root())
    }

    /// The staging directory, once something has been staged.
    pub fn path(&self) -> Option<&Path> {
        self.dir.as_ref().map(TempDir::path)
    }

    fn ensure_dir(&mut self) -> io::Result<&Path> {
        if self.dir.is_none() {
            fs::create_dir_all(&self.root)?;
            let dir = Builder::new()
                .prefix(STAGING_DIR_PREFIX)
                .tempdir_in(&self.root)?;
            log::debug!("staging directory created at {}", dir.path().display());
            self.dir = Some(dir);
        }
        match &self.dir {
            Some(dir) => Ok(dir.path()),
            None => Err(io::Error::new(
                io::ErrorKind::Other,
                "staging directory unavailable",
            )),
        }
    }

    /// Opens a per-operation ledger of staged files.
    pub fn scope(&mut self) -> StagingScope<'_> {
        StagingScope {
            area: self,
            created: Vec::new(),
        }
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(err) = dir.close() {
                log::warn!("cannot remove staging directory {}: {}", path.display(), err);
            }
        }
    }
}

/// Files staged by one operation. Whatever is still on disk when the scope
/// ends is removed; files staged by other operations are never touched.
#[derive(Debug)]
pub struct StagingScope<'a> {
    area: &'a mut StagingArea,
    created: Vec<PathBuf>,
}

impl StagingScope<'_> {
    pub fn stage(&mut self) -> io::Result<StagedFile> {
        let dir = self.area.ensure_dir()?;
        let file = Builder::new().prefix(STAGED_FILE_PREFIX).tempfile_in(dir)?;
        self.created.push(file.path().to_path_buf());
        Ok(StagedFile { file })
    }

    pub fn created(&self) -> &[PathBuf] {
        &self.created
    }

    fn sweep(&mut self) {
        for path in self.created.drain(..) {
            match fs::remove_file(&path) {
                Ok(()) => log::debug!("swept leftover staged file {}", path.display()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => {}
                Err(err) => log::warn!("cannot remove staged file {}: {}", path.display(), err),
            }
        }
    }
}

impl Drop for StagingScope<'_> {
    fn drop(&mut self) {
        self.sweep();
    }
}

/// A staged file; deleted from disk when dropped.
#[derive(Debug)]
pub struct StagedFile {
    file: NamedTempFile,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn as_file_mut(&mut self) -> &mut File {
        self.file.as_file_mut()
    }

    /// Rewinds to the start so the staged content can be read back.
    pub fn rewind(&mut self) -> io::Result<&mut File> {
        let file = self.file.as_file_mut();
        file.seek(SeekFrom::Start(0))?;
        Ok(file)
    }
}
