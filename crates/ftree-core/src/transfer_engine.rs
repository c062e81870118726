//! User-facing tree operations over one remote session.
//!
//! Every operation first makes sure the session is usable, then validates its
//! inputs. A validation failure aborts the call before anything is mutated and
//! comes back as `Err`; once traversal starts, each node's primitive succeeds or
//! fails on its own and the outcome is folded into the returned report.

mod delete;
mod fetch;
mod mkdirs;
mod rename;
mod tree;
mod upload;

pub use tree::{ListingOptions, TreeCounts, TreeListing};

use std::path::{Path, PathBuf};

use crate::config::CoreConfig;
use crate::errors::{TreeError, TreeResult};
use crate::local::{LocalFilesystem, StdFilesystem};
use crate::node::Node;
use crate::path::{self, RemotePath};
use crate::service::{ConnectParams, RemoteDirectoryService};
use crate::session::Session;
use crate::staging::StagingArea;

pub struct TransferEngine<S: RemoteDirectoryService, L: LocalFilesystem = StdFilesystem> {
    session: Session<S>,
    local: L,
    staging: StagingArea,
}

impl<S: RemoteDirectoryService> TransferEngine<S, StdFilesystem> {
    /// Engine configured from `ftree.toml` in the configuration directory.
    pub fn new(service: S) -> Self {
        Self::with_config(service, &CoreConfig::resolve())
    }

    pub fn with_config(service: S, config: &CoreConfig) -> Self {
        Self::from_parts(
            Session::new(service).with_passive_mode(config.passive_mode),
            StdFilesystem,
            StagingArea::from_config(config),
        )
    }
}

impl<S: RemoteDirectoryService, L: LocalFilesystem> TransferEngine<S, L> {
    pub fn from_parts(session: Session<S>, local: L, staging: StagingArea) -> Self {
        Self {
            session,
            local,
            staging,
        }
    }

    pub fn session(&self) -> &Session<S> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<S> {
        &mut self.session
    }

    pub fn local(&self) -> &L {
        &self.local
    }

    pub fn staging(&self) -> &StagingArea {
        &self.staging
    }

    pub fn connect(&mut self, params: ConnectParams) -> TreeResult<()> {
        self.session.connect(params)
    }

    pub fn terminate(&mut self) {
        self.session.terminate();
    }

    pub fn working_directory(&self) -> &RemotePath {
        self.session.working_directory()
    }

    pub fn change_working_directory(&mut self, requested: &str) -> TreeResult<RemotePath> {
        self.session.change_working_directory(requested)
    }

    pub fn move_to_parent(&mut self) -> TreeResult<RemotePath> {
        self.session.move_to_parent()
    }

    pub fn move_to_root(&mut self) -> TreeResult<()> {
        self.session.move_to_root()
    }

    pub fn stat(&mut self, requested: &str) -> TreeResult<Option<Node>> {
        self.session.ensure_connectivity()?;
        let path = self.session.resolve(requested);
        self.session.lookup(&path)
    }

    pub fn path_exists(&mut self, requested: &str) -> TreeResult<bool> {
        Ok(self.stat(requested)?.is_some())
    }

    /// Resolves `requested` and fetches its node, failing if nothing is there.
    fn existing_remote(&mut self, requested: &str) -> TreeResult<(RemotePath, Node)> {
        let path = self.session.resolve(requested);
        match self.session.lookup(&path)? {
            Some(node) => Ok((path, node)),
            None => Err(TreeError::not_found(requested)),
        }
    }

    fn remote_directory(&mut self, requested: &str) -> TreeResult<RemotePath> {
        let (path, node) = self.existing_remote(requested)?;
        if !node.is_directory() {
            return Err(TreeError::not_a_directory(requested));
        }
        Ok(path)
    }

    fn existing_remotes(&mut self, requested: &[&str]) -> TreeResult<Vec<(RemotePath, Node)>> {
        let mut found = Vec::with_capacity(requested.len());
        for entry in requested {
            found.push(self.existing_remote(entry)?);
        }
        Ok(found)
    }

    fn local_path(&self, requested: &Path) -> TreeResult<PathBuf> {
        let base = self
            .local
            .current_dir()
            .map_err(|err| TreeError::io("reading local working directory", err))?;
        Ok(path::resolve_local(requested, &base))
    }

    fn existing_local(&self, requested: &Path) -> TreeResult<(PathBuf, Node)> {
        let path = self.local_path(requested)?;
        let found = self
            .local
            .stat(&path)
            .map_err(|err| TreeError::io(format!("checking {}", path.display()), err))?;
        match found {
            Some(node) => Ok((path, node)),
            None => Err(TreeError::not_found(requested.display())),
        }
    }
}

/// Drops every root nested under another root, so no node is visited twice.
fn outermost<P, N, F>(roots: Vec<(P, N)>, is_within: F) -> Vec<(P, N)>
where
    F: Fn(&P, &P) -> bool,
{
    path::collapse_nested(roots, |(inner, _), (outer, _)| is_within(inner, outer))
}

/// Issues one make-directory primitive; a refusal becomes [`TreeError::Create`].
fn make_remote_directory<S: RemoteDirectoryService + ?Sized>(
    service: &mut S,
    path: &RemotePath,
) -> TreeResult<()> {
    log::debug!("creating remote directory {}", path);
    let created = service
        .make_directory(path)
        .map_err(|err| TreeError::io(format!("creating {}", path), err))?;
    if created {
        Ok(())
    } else {
        Err(TreeError::Create {
            path: path.to_string(),
        })
    }
}
