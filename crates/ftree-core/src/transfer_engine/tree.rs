//! Read-only operations: tree, count and single-level listing.

use std::io;

use regex::Regex;
use serde::Serialize;

use super::TransferEngine;
use crate::errors::{TreeError, TreeResult};
use crate::local::LocalFilesystem;
use crate::node::Node;
use crate::path::{RemotePath, ROOT_PATH};
use crate::service::RemoteDirectoryService;
use crate::session::Session;
use crate::walker::{TreeWalker, Visitor, WalkEntry};

const INDENT: &str = "    ";
const BRANCH: &str = "|-- ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeCounts {
    pub directories: u64,
    pub files: u64,
}

impl TreeCounts {
    pub fn total(&self) -> u64 {
        self.directories + self.files
    }

    fn add(&mut self, node: &Node) {
        if node.is_directory() {
            self.directories += 1;
        } else {
            self.files += 1;
        }
    }
}

/// Rendered tree, summary line last.
#[derive(Debug, Clone, Default)]
pub struct TreeListing {
    pub lines: Vec<String>,
    pub counts: TreeCounts,
}

#[derive(Debug, Clone, Default)]
pub struct ListingOptions {
    pub directories_only: bool,
    /// Regular expression the whole entry name must match.
    pub pattern: Option<String>,
}

impl ListingOptions {
    pub fn directories_only() -> Self {
        Self {
            directories_only: true,
            pattern: None,
        }
    }

    pub fn matching(pattern: impl Into<String>) -> Self {
        Self {
            directories_only: false,
            pattern: Some(pattern.into()),
        }
    }

    fn compile(&self) -> TreeResult<Option<Regex>> {
        let Some(pattern) = &self.pattern else {
            return Ok(None);
        };
        // Anchored on both ends: a name matches only as a whole.
        Regex::new(&format!("^(?:{})$", pattern))
            .map(Some)
            .map_err(|err| TreeError::Pattern {
                pattern: pattern.clone(),
                reason: err.to_string(),
            })
    }
}

pub(crate) fn tree_line(depth: usize, node: &Node) -> String {
    let mut line = INDENT.repeat(depth);
    line.push_str(BRANCH);
    line.push_str(&node.name);
    if node.is_directory() && node.name != ROOT_PATH {
        line.push('/');
    }
    line
}

pub(crate) fn summary_line(counts: &TreeCounts) -> String {
    format!(
        "  [dirs={}, files={}, total={}]",
        counts.directories,
        counts.files,
        counts.total()
    )
}

struct Survey {
    lines: Option<Vec<String>>,
    counts: TreeCounts,
    /// First directory that could not be listed.
    unlisted: Option<TreeError>,
}

impl<S: RemoteDirectoryService> Visitor<Session<S>> for Survey {
    fn enter(&mut self, _session: &mut Session<S>, entry: &WalkEntry<RemotePath>) {
        self.counts.add(&entry.node);
        if let Some(lines) = &mut self.lines {
            lines.push(tree_line(entry.depth, &entry.node));
        }
    }

    fn listing_failed(
        &mut self,
        _session: &mut Session<S>,
        entry: &WalkEntry<RemotePath>,
        err: io::Error,
    ) {
        log::warn!("cannot list {}: {}", entry.path, err);
        if self.unlisted.is_none() {
            self.unlisted = Some(TreeError::io(format!("listing {}", entry.path), err));
        }
    }
}

impl<S: RemoteDirectoryService, L: LocalFilesystem> TransferEngine<S, L> {
    /// One line per node below `root` (included), in pre-order.
    pub fn tree(&mut self, root: &str) -> TreeResult<TreeListing> {
        let survey = self.survey(root, true)?;
        let mut lines = survey.lines.unwrap_or_default();
        lines.push(summary_line(&survey.counts));
        Ok(TreeListing {
            lines,
            counts: survey.counts,
        })
    }

    /// Directories and files below `root`, `root` itself included.
    ///
    /// A directory that cannot be listed fails the whole count rather than
    /// returning totals for a partial tree.
    pub fn count(&mut self, root: &str) -> TreeResult<TreeCounts> {
        Ok(self.survey(root, false)?.counts)
    }

    fn survey(&mut self, root: &str, render: bool) -> TreeResult<Survey> {
        self.session.ensure_connectivity()?;
        let (path, node) = self.existing_remote(root)?;

        let mut survey = Survey {
            lines: render.then(Vec::new),
            counts: TreeCounts::default(),
            unlisted: None,
        };
        TreeWalker::new(&mut self.session).walk(WalkEntry::root(path.clone(), node), &mut survey);
        if let Some(err) = survey.unlisted.take() {
            return Err(err);
        }
        log::info!(
            "surveyed {}: {} dirs, {} files",
            path,
            survey.counts.directories,
            survey.counts.files
        );
        Ok(survey)
    }

    /// Lists a single level of `requested`. A file lists as itself.
    pub fn listing(&mut self, requested: &str, options: &ListingOptions) -> TreeResult<Vec<Node>> {
        let matcher = options.compile()?;
        self.session.ensure_connectivity()?;
        let (path, node) = self.existing_remote(requested)?;

        let nodes = if node.is_directory() {
            self.session
                .service_mut()
                .list(&path)
                .map_err(|err| TreeError::io(format!("listing {}", path), err))?
        } else {
            vec![node]
        };

        Ok(nodes
            .into_iter()
            .filter(|node| !options.directories_only || node.is_directory())
            .filter(|node| matcher.as_ref().map_or(true, |m| m.is_match(&node.name)))
            .collect())
    }
}
