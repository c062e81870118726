//! Depth-first traversal over either namespace.
//!
//! Only one directory level is listed at a time, right before its children
//! are visited, so memory stays bounded by the depth of the tree and a
//! directory that changes mid-walk is seen as it is when reached.

use std::fmt::Debug;
use std::io;

use crate::node::Node;

/// Something that can be listed one directory level at a time.
pub trait Namespace {
    type Path: Clone + Debug;

    fn list_dir(&mut self, dir: &Self::Path) -> io::Result<Vec<Node>>;
    fn child_path(&self, parent: &Self::Path, name: &str) -> Self::Path;
}

/// A node together with where the walk found it.
#[derive(Debug, Clone)]
pub struct WalkEntry<P> {
    pub path: P,
    pub node: Node,
    /// Distance from the walk root, which has depth 0.
    pub depth: usize,
}

impl<P> WalkEntry<P> {
    pub fn root(path: P, node: Node) -> Self {
        Self {
            path,
            node,
            depth: 0,
        }
    }
}

/// Callbacks invoked by [`TreeWalker`].
///
/// The namespace is handed back on every call so a visitor can issue
/// primitives on the same connection the walk is listing through.
pub trait Visitor<N: Namespace + ?Sized> {
    /// Pre-order hook: runs before any child of `entry` is listed.
    fn enter(&mut self, _ns: &mut N, _entry: &WalkEntry<N::Path>) {}

    /// Post-order hook: runs after every child of `entry` has been left.
    fn leave(&mut self, _ns: &mut N, _entry: &WalkEntry<N::Path>) {}

    /// The children of `entry` could not be listed; its subtree is skipped.
    fn listing_failed(&mut self, _ns: &mut N, entry: &WalkEntry<N::Path>, err: io::Error) {
        log::warn!("cannot list {:?}: {}", entry.path, err);
    }
}

pub struct TreeWalker<'a, N: ?Sized> {
    ns: &'a mut N,
}

impl<'a, N: Namespace + ?Sized> TreeWalker<'a, N> {
    pub fn new(ns: &'a mut N) -> Self {
        Self { ns }
    }

    /// Walks the tree below `root`, calling `enter` in pre-order and `leave`
    /// in post-order for every node, the root included.
    pub fn walk<V: Visitor<N>>(&mut self, root: WalkEntry<N::Path>, visitor: &mut V) {
        self.visit(root, visitor);
    }

    fn visit<V: Visitor<N>>(&mut self, entry: WalkEntry<N::Path>, visitor: &mut V) {
        visitor.enter(self.ns, &entry);

        if entry.node.is_directory() {
            match self.ns.list_dir(&entry.path) {
                Ok(children) => {
                    for child in children {
                        let path = self.ns.child_path(&entry.path, &child.name);
                        self.visit(
                            WalkEntry {
                                path,
                                node: child,
                                depth: entry.depth + 1,
                            },
                            visitor,
                        );
                    }
                }
                Err(err) => visitor.listing_failed(self.ns, &entry, err),
            }
        }

        visitor.leave(self.ns, &entry);
    }
}
