use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::path::PathBuf;

use crate::errors::TreeError;
use crate::node::Node;
use crate::path::RemotePath;

/// A node whose primitive failed, with the reason.
#[derive(Debug)]
pub struct Failure {
    pub node: Node,
    pub error: TreeError,
}

/// Outcome of one tree operation: every processed node lands in exactly one
/// of `succeeded` or `failed`, in the order the traversal reached it.
///
/// Directories whose children could not be listed are kept apart in
/// `listing_failures`; their own outcome stays where it was recorded, but
/// the subtree below them was never reached.
#[derive(Debug)]
pub struct TransferReport<K> {
    succeeded: Vec<(K, Node)>,
    failed: Vec<(K, Failure)>,
    listing_failures: Vec<(K, TreeError)>,
    seen: HashSet<K>,
}

/// Report keyed by remote path (delete, copy, move, get).
pub type RemoteReport = TransferReport<RemotePath>;
/// Report keyed by local path (put).
pub type LocalReport = TransferReport<PathBuf>;

impl<K> Default for TransferReport<K> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
            listing_failures: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<K: Clone + Eq + Hash + Debug> TransferReport<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a success. Returns false if `key` already has an outcome.
    pub fn record_success(&mut self, key: K, node: Node) -> bool {
        if !self.claim(&key) {
            return false;
        }
        log::debug!("ok {:?}", key);
        self.succeeded.push((key, node));
        true
    }

    /// Records a failure. Returns false if `key` already has an outcome.
    pub fn record_failure(&mut self, key: K, node: Node, error: TreeError) -> bool {
        if !self.claim(&key) {
            return false;
        }
        log::debug!("failed {:?}: {}", key, error);
        self.failed.push((key, Failure { node, error }));
        true
    }

    /// Records whichever side `outcome` selects.
    pub fn record(&mut self, key: K, node: Node, outcome: Result<(), TreeError>) -> bool {
        match outcome {
            Ok(()) => self.record_success(key, node),
            Err(error) => self.record_failure(key, node, error),
        }
    }

    /// Records that the children of directory `key` could not be listed.
    pub fn record_listing_failure(&mut self, key: K, error: TreeError) {
        log::warn!("subtree of {:?} skipped: {}", key, error);
        self.listing_failures.push((key, error));
    }

    fn claim(&mut self, key: &K) -> bool {
        if self.seen.contains(key) {
            log::debug!("outcome for {:?} already recorded, keeping the first", key);
            return false;
        }
        self.seen.insert(key.clone());
        true
    }

    pub fn contains(&self, key: &K) -> bool {
        self.seen.contains(key)
    }
}

impl<K> TransferReport<K> {
    pub fn succeeded(&self) -> &[(K, Node)] {
        &self.succeeded
    }

    pub fn failed(&self) -> &[(K, Failure)] {
        &self.failed
    }

    pub fn listing_failures(&self) -> &[(K, TreeError)] {
        &self.listing_failures
    }

    pub fn succeeded_keys(&self) -> impl Iterator<Item = &K> {
        self.succeeded.iter().map(|(k, _)| k)
    }

    pub fn failed_keys(&self) -> impl Iterator<Item = &K> {
        self.failed.iter().map(|(k, _)| k)
    }

    /// True when every node succeeded and every directory could be listed.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty() && self.listing_failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn counts(&self) -> (usize, usize) {
        (self.succeeded.len(), self.failed.len())
    }
}
