//! Remote-to-local `get` and remote-to-remote `copy`.
//!
//! Both walk each source in pre-order: a directory is created at the
//! destination before its children are listed, a file is streamed across.
//! A copy has no direct server-side primitive, so each file goes down into a
//! staged local file and back up under its final name.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::{make_remote_directory, outermost, TransferEngine};
use crate::errors::{InvalidReason, TreeError, TreeResult};
use crate::local::LocalFilesystem;
use crate::naming;
use crate::node::Node;
use crate::path::RemotePath;
use crate::report::RemoteReport;
use crate::service::RemoteDirectoryService;
use crate::session::Session;
use crate::staging::StagingScope;
use crate::walker::{TreeWalker, Visitor, WalkEntry};

#[derive(Debug, Clone)]
enum Target {
    Local(PathBuf),
    Remote(RemotePath),
}

impl Target {
    fn join(&self, name: &str) -> Target {
        match self {
            Target::Local(dir) => Target::Local(dir.join(name)),
            Target::Remote(dir) => Target::Remote(dir.join(name)),
        }
    }
}

struct Fetcher<'a, L: ?Sized> {
    local: &'a L,
    staging: StagingScope<'a>,
    /// Resolved destination of the current walk root.
    root_target: Option<Target>,
    /// Destination of every directory on the path to the current node.
    open_targets: Vec<Target>,
    report: RemoteReport,
}

impl<S, L> Visitor<Session<S>> for Fetcher<'_, L>
where
    S: RemoteDirectoryService,
    L: LocalFilesystem + ?Sized,
{
    fn enter(&mut self, session: &mut Session<S>, entry: &WalkEntry<RemotePath>) {
        self.open_targets.truncate(entry.depth);
        let target = if entry.depth == 0 {
            self.root_target.clone()
        } else {
            self.open_targets.last().map(|parent| parent.join(&entry.node.name))
        };
        let Some(target) = target else {
            return;
        };

        let outcome = self.transfer(session.service_mut(), entry, &target);
        self.report
            .record(entry.path.clone(), entry.node.clone(), outcome);
        // Children still get their own attempt when the directory could not
        // be created; each of them then fails on its own.
        self.open_targets.push(target);
    }

    fn listing_failed(
        &mut self,
        _session: &mut Session<S>,
        entry: &WalkEntry<RemotePath>,
        err: io::Error,
    ) {
        let error = TreeError::io(format!("listing {}", entry.path), err);
        self.report.record_listing_failure(entry.path.clone(), error);
    }
}

impl<L: LocalFilesystem + ?Sized> Fetcher<'_, L> {
    fn transfer<S: RemoteDirectoryService>(
        &mut self,
        service: &mut S,
        entry: &WalkEntry<RemotePath>,
        target: &Target,
    ) -> TreeResult<()> {
        match (entry.node.is_directory(), target) {
            (true, Target::Local(dir)) => {
                log::debug!("creating local directory {}", dir.display());
                self.local
                    .create_dir(dir)
                    .map_err(|err| TreeError::io(format!("creating {}", dir.display()), err))
            }
            (true, Target::Remote(dir)) => make_remote_directory(service, dir),
            (false, Target::Local(file)) => download(service, self.local, &entry.path, file),
            (false, Target::Remote(file)) => relay(service, &mut self.staging, &entry.path, file),
        }
    }
}

/// Streams a remote file into a new local file. The local file is removed
/// again if the transfer does not complete.
fn download<S, L>(service: &mut S, local: &L, source: &RemotePath, target: &Path) -> TreeResult<()>
where
    S: RemoteDirectoryService,
    L: LocalFilesystem + ?Sized,
{
    log::debug!("downloading {} to {}", source, target.display());
    let mut sink = local
        .open_write(target)
        .map_err(|err| TreeError::io(format!("creating {}", target.display()), err))?;

    let outcome = match service.retrieve(source, &mut *sink) {
        Ok(true) => sink
            .flush()
            .map_err(|err| TreeError::io(format!("writing {}", target.display()), err)),
        Ok(false) => Err(TreeError::transfer(source, "server refused to send the file")),
        Err(err) => Err(TreeError::io(format!("downloading {}", source), err)),
    };
    drop(sink);

    if outcome.is_err() {
        if let Err(err) = local.remove_file(target) {
            log::warn!("cannot remove partial file {}: {}", target.display(), err);
        }
    }
    outcome
}

/// Copies one remote file through a staged local file.
fn relay<S: RemoteDirectoryService>(
    service: &mut S,
    staging: &mut StagingScope<'_>,
    source: &RemotePath,
    target: &RemotePath,
) -> TreeResult<()> {
    log::debug!("copying {} to {} through staging", source, target);
    let mut staged = staging
        .stage()
        .map_err(|err| TreeError::io("creating staged file", err))?;

    match service.retrieve(source, staged.as_file_mut()) {
        Ok(true) => {}
        Ok(false) => return Err(TreeError::transfer(source, "server refused to send the file")),
        Err(err) => return Err(TreeError::io(format!("downloading {}", source), err)),
    }

    let file = staged
        .rewind()
        .map_err(|err| TreeError::io(format!("reading back staged copy of {}", source), err))?;
    match service.store(target, file) {
        Ok(true) => Ok(()),
        Ok(false) => Err(TreeError::transfer(target, "server refused to store the file")),
        Err(err) => Err(TreeError::io(format!("uploading {}", target), err)),
    }
}

/// Picks the collision-free destination of one walk root.
fn first_level_target<S, L>(
    session: &mut Session<S>,
    local: &L,
    destination: &Target,
    base_name: &str,
    is_directory: bool,
) -> TreeResult<Target>
where
    S: RemoteDirectoryService,
    L: LocalFilesystem + ?Sized,
{
    match destination {
        Target::Local(dir) => {
            let (_, path) = naming::next_name(
                |candidate: &PathBuf| local.stat(candidate).map(|found| found.is_some()),
                |dir: &PathBuf, name: &str| dir.join(name),
                base_name,
                is_directory,
                dir,
            )
            .map_err(|err| TreeError::io(format!("probing names in {}", dir.display()), err))?;
            Ok(Target::Local(path))
        }
        Target::Remote(dir) => {
            let (_, path) = naming::next_name(
                |candidate: &RemotePath| session.path_exists(candidate),
                |dir: &RemotePath, name: &str| dir.join(name),
                base_name,
                is_directory,
                dir,
            )?;
            Ok(Target::Remote(path))
        }
    }
}

impl<S: RemoteDirectoryService, L: LocalFilesystem> TransferEngine<S, L> {
    /// Downloads `sources` recursively into the local directory `destination`.
    pub fn get(&mut self, sources: &[&str], destination: &Path) -> TreeResult<RemoteReport> {
        self.session.ensure_connectivity()?;
        let roots = self.existing_remotes(sources)?;

        let (dir, node) = self.existing_local(destination)?;
        if !node.is_directory() {
            return Err(TreeError::not_a_directory(destination.display()));
        }
        Ok(self.run_fetch(roots, Target::Local(dir), "get"))
    }

    /// Copies `sources` recursively into the remote directory `destination`.
    ///
    /// Fails before anything is created when `destination` is one of the
    /// sources or lies beneath one.
    pub fn copy(&mut self, sources: &[&str], destination: &str) -> TreeResult<RemoteReport> {
        self.session.ensure_connectivity()?;
        let roots = self.existing_remotes(sources)?;

        let dir = self.remote_directory(destination)?;
        if let Some((source, _)) = roots.iter().find(|(source, _)| dir.starts_with(source)) {
            return Err(TreeError::InvalidOperation(
                InvalidReason::DestinationInSource {
                    source: source.to_string(),
                    destination: dir.to_string(),
                },
            ));
        }
        Ok(self.run_fetch(roots, Target::Remote(dir), "copy"))
    }

    /// [`get`](Self::get) or [`copy`](Self::copy), chosen by `copy_on_remote`.
    pub fn fetch(
        &mut self,
        sources: &[&str],
        destination: &str,
        copy_on_remote: bool,
    ) -> TreeResult<RemoteReport> {
        if copy_on_remote {
            self.copy(sources, destination)
        } else {
            self.get(sources, Path::new(destination))
        }
    }

    fn run_fetch(
        &mut self,
        roots: Vec<(RemotePath, Node)>,
        destination: Target,
        label: &str,
    ) -> RemoteReport {
        let roots = outermost(roots, RemotePath::starts_with);
        // The root has no name of its own; it is materialized under the host name.
        let root_name = self.session.host().unwrap_or("root").to_string();

        let mut fetcher = Fetcher {
            local: &self.local,
            staging: self.staging.scope(),
            root_target: None,
            open_targets: Vec::new(),
            report: RemoteReport::new(),
        };

        for (source, node) in roots {
            let base_name = source.name().unwrap_or(root_name.as_str()).to_string();
            match first_level_target(
                &mut self.session,
                fetcher.local,
                &destination,
                &base_name,
                node.is_directory(),
            ) {
                Ok(target) => {
                    fetcher.root_target = Some(target);
                    fetcher.open_targets.clear();
                    TreeWalker::new(&mut self.session)
                        .walk(WalkEntry::root(source, node), &mut fetcher);
                }
                Err(err) => {
                    fetcher.report.record_failure(source, node, err);
                }
            }
        }

        let (ok, failed) = fetcher.report.counts();
        log::info!("{} finished: {} transferred, {} failed", label, ok, failed);
        fetcher.report
    }
}
