use std::io;

use super::{outermost, TransferEngine};
use crate::errors::{InvalidReason, TreeError, TreeResult};
use crate::local::LocalFilesystem;
use crate::path::RemotePath;
use crate::report::RemoteReport;
use crate::service::RemoteDirectoryService;
use crate::session::Session;
use crate::walker::{TreeWalker, Visitor, WalkEntry};

struct Remover {
    report: RemoteReport,
}

impl<S: RemoteDirectoryService> Visitor<Session<S>> for Remover {
    // Children are left before their parent, so a directory is removed only
    // after every removal below it has been attempted.
    fn leave(&mut self, session: &mut Session<S>, entry: &WalkEntry<RemotePath>) {
        let outcome = remove_node(session.service_mut(), entry);
        self.report
            .record(entry.path.clone(), entry.node.clone(), outcome);
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

fn remove_node<S: RemoteDirectoryService>(
    service: &mut S,
    entry: &WalkEntry<RemotePath>,
) -> TreeResult<()> {
    log::debug!("removing {}", entry.path);
    let removed = if entry.node.is_directory() {
        service.remove_directory(&entry.path)
    } else {
        service.delete_file(&entry.path)
    }
    .map_err(|err| TreeError::io(format!("removing {}", entry.path), err))?;

    if removed {
        Ok(())
    } else {
        Err(TreeError::Delete {
            path: entry.path.to_string(),
        })
    }
}

impl<S: RemoteDirectoryService, L: LocalFilesystem> TransferEngine<S, L> {
    /// Removes every target recursively, deepest nodes first.
    ///
    /// The root can never be a target, and every target must exist; either
    /// violation aborts before anything is removed.
    pub fn delete(&mut self, targets: &[&str]) -> TreeResult<RemoteReport> {
        self.session.ensure_connectivity()?;

        let mut roots = Vec::with_capacity(targets.len());
        for target in targets {
            if self.session.resolve(target).is_root() {
                return Err(TreeError::InvalidOperation(InvalidReason::RootDeletion));
            }
            roots.push(self.existing_remote(target)?);
        }
        let roots = outermost(roots, RemotePath::starts_with);

        let mut remover = Remover {
            report: RemoteReport::new(),
        };
        for (path, node) in roots {
            TreeWalker::new(&mut self.session).walk(WalkEntry::root(path, node), &mut remover);
        }

        let (ok, failed) = remover.report.counts();
        log::info!("delete finished: {} removed, {} failed", ok, failed);
        Ok(remover.report)
    }
}
