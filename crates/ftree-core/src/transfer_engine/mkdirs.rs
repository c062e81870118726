use super::{make_remote_directory, TransferEngine};
use crate::errors::{TreeError, TreeResult};
use crate::local::LocalFilesystem;
use crate::path::RemotePath;
use crate::service::RemoteDirectoryService;

impl<S: RemoteDirectoryService, L: LocalFilesystem> TransferEngine<S, L> {
    /// Creates `requested` and any missing parents, outermost first.
    /// Returns the canonical path.
    pub fn mkdirs(&mut self, requested: &str) -> TreeResult<RemotePath> {
        self.session.ensure_connectivity()?;
        let path = self.session.resolve(requested);

        let mut created = 0usize;
        for prefix in path.ancestors_from_root() {
            match self.session.lookup(&prefix)? {
                Some(node) if node.is_directory() => continue,
                Some(_) => return Err(TreeError::not_a_directory(&prefix)),
                None => {
                    make_remote_directory(self.session.service_mut(), &prefix)?;
                    created += 1;
                }
            }
        }

        log::info!("mkdirs {}: {} directories created", path, created);
        Ok(path)
    }
}
