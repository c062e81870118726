use std::io;
use std::path::{Path, PathBuf};

use super::{make_remote_directory, outermost, TransferEngine};
use crate::errors::{TreeError, TreeResult};
use crate::local::{entry_name, LocalFilesystem, LocalNamespace};
use crate::naming;
use crate::path::RemotePath;
use crate::report::LocalReport;
use crate::service::RemoteDirectoryService;
use crate::session::Session;
use crate::walker::{TreeWalker, Visitor, WalkEntry};

/// Mirrors local trees into the remote namespace through the session it borrows.
struct Uploader<'s, 'l, S: RemoteDirectoryService, L: ?Sized> {
    session: &'s mut Session<S>,
    local: &'l L,
    root_target: Option<RemotePath>,
    open_targets: Vec<RemotePath>,
    report: LocalReport,
}

impl<'a, S, L> Visitor<LocalNamespace<'a, L>> for Uploader<'_, '_, S, L>
where
    S: RemoteDirectoryService,
    L: LocalFilesystem + ?Sized,
{
    fn enter(&mut self, _ns: &mut LocalNamespace<'a, L>, entry: &WalkEntry<PathBuf>) {
        self.open_targets.truncate(entry.depth);
        let target = if entry.depth == 0 {
            self.root_target.clone()
        } else {
            self.open_targets.last().map(|parent| parent.join(&entry.node.name))
        };
        let Some(target) = target else {
            return;
        };

        let service = self.session.service_mut();
        let outcome = if entry.node.is_directory() {
            make_remote_directory(service, &target)
        } else {
            upload(service, self.local, &entry.path, &target)
        };
        self.report
            .record(entry.path.clone(), entry.node.clone(), outcome);
        self.open_targets.push(target);
    }

    fn listing_failed(
        &mut self,
        _ns: &mut LocalNamespace<'a, L>,
        entry: &WalkEntry<PathBuf>,
        err: io::Error,
    ) {
        let error = TreeError::io(format!("listing {}", entry.path.display()), err);
        self.report.record_listing_failure(entry.path.clone(), error);
    }
}

fn upload<S, L>(service: &mut S, local: &L, source: &Path, target: &RemotePath) -> TreeResult<()>
where
    S: RemoteDirectoryService,
    L: LocalFilesystem + ?Sized,
{
    log::debug!("uploading {} to {}", source.display(), target);
    let mut reader = local
        .open_read(source)
        .map_err(|err| TreeError::io(format!("opening {}", source.display()), err))?;
    match service.store(target, &mut *reader) {
        Ok(true) => Ok(()),
        Ok(false) => Err(TreeError::transfer(target, "server refused to store the file")),
        Err(err) => Err(TreeError::io(format!("uploading {}", target), err)),
    }
}

impl<S: RemoteDirectoryService, L: LocalFilesystem> TransferEngine<S, L> {
    /// Uploads local files and directory trees into the remote directory
    /// `destination`. The report is keyed by local path.
    pub fn put(&mut self, sources: &[&Path], destination: &str) -> TreeResult<LocalReport> {
        self.session.ensure_connectivity()?;
        let dir = self.remote_directory(destination)?;

        let mut roots = Vec::with_capacity(sources.len());
        for source in sources {
            roots.push(self.existing_local(source)?);
        }
        let roots = outermost(roots, |inner: &PathBuf, outer: &PathBuf| {
            inner.starts_with(outer)
        });

        let mut uploader = Uploader {
            session: &mut self.session,
            local: &self.local,
            root_target: None,
            open_targets: Vec::new(),
            report: LocalReport::new(),
        };
        for (source, node) in roots {
            let named = naming::next_name(
                |candidate: &RemotePath| uploader.session.path_exists(candidate),
                |dir: &RemotePath, name: &str| dir.join(name),
                &entry_name(&source),
                node.is_directory(),
                &dir,
            );
            match named {
                Ok((_, target)) => {
                    uploader.root_target = Some(target);
                    uploader.open_targets.clear();
                    let mut ns = LocalNamespace::new(&self.local);
                    TreeWalker::new(&mut ns).walk(WalkEntry::root(source, node), &mut uploader);
                }
                Err(err) => {
                    uploader.report.record_failure(source, node, err);
                }
            }
        }

        let (ok, failed) = uploader.report.counts();
        log::info!("put finished: {} uploaded, {} failed", ok, failed);
        Ok(uploader.report)
    }
}
