//! Text rendering of directory listings for a shell front end.

use std::cmp::Ordering;

use crate::node::{Node, NodeKind};

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingFormat {
    /// `kind owner size time name`
    #[default]
    Details,
    /// The listing line as the service sent it.
    Raw,
    NameOnly,
}

/// Directories first, then by name.
pub fn sort_for_display(nodes: &mut [Node]) {
    nodes.sort_by(|a, b| match (a.is_directory(), b.is_directory()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
}

pub fn format_size(size: u64) -> String {
    let s = size as f64;
    if s < KIB {
        format!("{:>8} B", size)
    } else if s < MIB {
        format!("{:.2} K", s / KIB)
    } else if s < GIB {
        format!("{:.2} M", s / MIB)
    } else {
        format!("{:.2} G", s / GIB)
    }
}

/// One line per node, in display order.
pub fn render_listing(nodes: &[Node], format: ListingFormat) -> Vec<String> {
    let mut sorted = nodes.to_vec();
    sort_for_display(&mut sorted);
    sorted.iter().map(|node| render_node(node, format)).collect()
}

fn render_node(node: &Node, format: ListingFormat) -> String {
    match format {
        ListingFormat::Details => {
            let kind = match node.kind {
                NodeKind::File => "file",
                NodeKind::Directory => "dir",
            };
            let modified = node
                .modified
                .map(|t| t.format("%H:%M:%S %d-%m-%Y").to_string())
                .unwrap_or_else(|| "-".to_string());
            format!(
                "    {:>4}  {:>10}  {:>10}  {}  {}",
                kind,
                node.owner.as_deref().unwrap_or("-"),
                format_size(node.size),
                modified,
                node.name
            )
        }
        ListingFormat::Raw => format!("  {}", node.raw_listing.as_deref().unwrap_or(&node.name)),
        ListingFormat::NameOnly => {
            let suffix = if node.is_directory() { "/" } else { "" };
            format!("  {}{}", node.name, suffix)
        }
    }
}
