use super::{outermost, TransferEngine};
use crate::errors::{InvalidReason, TreeError, TreeResult};
use crate::local::LocalFilesystem;
use crate::path::RemotePath;
use crate::report::RemoteReport;
use crate::service::RemoteDirectoryService;

impl<S: RemoteDirectoryService, L: LocalFilesystem> TransferEngine<S, L> {
    /// Moves each source with a single rename primitive, no traversal.
    ///
    /// Into a directory, every source keeps its name. Onto an existing file,
    /// exactly one source is accepted and renamed to that file's path.
    pub fn move_paths(&mut self, sources: &[&str], destination: &str) -> TreeResult<RemoteReport> {
        self.session.ensure_connectivity()?;
        let (dest, dest_node) = self.existing_remote(destination)?;
        let roots = self.existing_remotes(sources)?;

        if !dest_node.is_directory() && roots.len() > 1 {
            return Err(TreeError::InvalidOperation(
                InvalidReason::MultipleSourcesToFile {
                    destination: dest.to_string(),
                },
            ));
        }
        if let Some((source, _)) = roots.iter().find(|(source, _)| dest.starts_with(source)) {
            return Err(TreeError::InvalidOperation(
                InvalidReason::DestinationInSource {
                    source: source.to_string(),
                    destination: dest.to_string(),
                },
            ));
        }

        let mut report = RemoteReport::new();
        for (source, node) in outermost(roots, RemotePath::starts_with) {
            let target = match source.name() {
                Some(name) if dest_node.is_directory() => dest.join(name),
                _ => dest.clone(),
            };
            log::debug!("renaming {} to {}", source, target);
            let outcome = match self.session.service_mut().rename(&source, &target) {
                Ok(true) => Ok(()),
                Ok(false) => Err(TreeError::Rename {
                    from: source.to_string(),
                    to: target.to_string(),
                }),
                Err(err) => Err(TreeError::io(format!("renaming {}", source), err)),
            };
            report.record(source, node, outcome);
        }

        let (ok, failed) = report.counts();
        log::info!("move finished: {} moved, {} failed", ok, failed);
        Ok(report)
    }
}
