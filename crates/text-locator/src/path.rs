//! Structural path addressing.
//!
//! A path is a chain of `tag[index]` segments from the document root, e.g.
//! `/article[1]/div[2]/p[1]`. The index is the 1-based position of the node
//! among its parent's children that share its tag. Resolution is all or
//! nothing; partial recovery belongs to the fallback cascade.

use std::fmt;

use document_tree::DocumentTree;
use textanchor_core_types::{NodeId, Span};

use crate::errors::AnchorError;
use crate::flatten::FlatText;
use crate::normalize::find_all_char_indices;

/// One `tag[index]` step of a structural path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub tag: String,
    pub index: usize,
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.tag, self.index)
    }
}

/// Build the root-to-node path of `node`.
pub fn build_path(tree: &dyn DocumentTree, node: NodeId) -> Result<String, AnchorError> {
    if !tree.contains(node) {
        return Err(AnchorError::UnreachableNode(node));
    }
    let root = tree.root();
    let mut segments = Vec::new();
    let mut current = node;
    loop {
        let tag = tree.tag(current);
        let index = match tree.parent(current) {
            Some(parent) => same_tag_index(tree, parent, current)
                .ok_or(AnchorError::UnreachableNode(node))?,
            None => 1,
        };
        segments.push(PathSegment {
            tag: tag.to_string(),
            index,
        });
        if current == root {
            break;
        }
        current = tree
            .parent(current)
            .ok_or(AnchorError::UnreachableNode(node))?;
    }
    segments.reverse();
    Ok(render(&segments))
}

fn same_tag_index(tree: &dyn DocumentTree, parent: NodeId, node: NodeId) -> Option<usize> {
    let tag = tree.tag(node);
    tree.children(parent)
        .iter()
        .filter(|child| tree.tag(**child) == tag)
        .position(|child| *child == node)
        .map(|pos| pos + 1)
}

fn render(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        out.push_str(&segment.to_string());
    }
    out
}

/// Parse a path into segments, reporting why it is malformed.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, AnchorError> {
    let body = path
        .strip_prefix('/')
        .ok_or_else(|| AnchorError::malformed_path(path, "missing leading '/'"))?;
    if body.is_empty() {
        return Err(AnchorError::malformed_path(path, "no segments"));
    }
    body.split('/')
        .map(|raw| parse_segment(path, raw))
        .collect()
}

fn parse_segment(path: &str, raw: &str) -> Result<PathSegment, AnchorError> {
    let open = raw
        .find('[')
        .ok_or_else(|| AnchorError::malformed_path(path, format!("segment '{raw}' has no index")))?;
    let tag = &raw[..open];
    if tag.is_empty() || tag.chars().any(|c| c.is_whitespace() || c == ']') {
        return Err(AnchorError::malformed_path(
            path,
            format!("segment '{raw}' has an invalid tag"),
        ));
    }
    let inner = raw[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| AnchorError::malformed_path(path, format!("segment '{raw}' is unbalanced")))?;
    let index: usize = inner
        .parse()
        .map_err(|_| AnchorError::malformed_path(path, format!("segment '{raw}' index is not a number")))?;
    if index == 0 {
        return Err(AnchorError::malformed_path(
            path,
            format!("segment '{raw}' index must be 1-based"),
        ));
    }
    Ok(PathSegment {
        tag: tag.to_string(),
        index,
    })
}

/// Structural sanity check; a well-formed path may still fail to resolve.
pub fn is_well_formed(path: &str) -> bool {
    parse_path(path).is_ok()
}

/// Resolve the full chain against the current tree.
pub fn resolve_path(tree: &dyn DocumentTree, path: &str) -> Result<NodeId, AnchorError> {
    let segments = parse_path(path)?;
    let (node, matched) = walk(tree, &segments);
    match node {
        Some(node) if matched == segments.len() => Ok(node),
        _ => Err(AnchorError::PathNotFound(path.to_string())),
    }
}

/// Deepest node reachable by following the path's leading segments.
///
/// Returns the node and how many segments matched; `None` when not even the
/// root segment matches.
pub fn resolve_prefix(
    tree: &dyn DocumentTree,
    path: &str,
) -> Result<Option<(NodeId, usize)>, AnchorError> {
    let segments = parse_path(path)?;
    let (node, matched) = walk(tree, &segments);
    Ok(node.map(|node| (node, matched)))
}

fn walk(tree: &dyn DocumentTree, segments: &[PathSegment]) -> (Option<NodeId>, usize) {
    let root = tree.root();
    match segments.first() {
        Some(first) if first.tag == tree.tag(root) && first.index == 1 => {}
        _ => return (None, 0),
    }
    let mut current = root;
    let mut matched = 1;
    for segment in &segments[1..] {
        let next = tree
            .children(current)
            .iter()
            .filter(|child| tree.tag(**child) == segment.tag)
            .nth(segment.index - 1)
            .copied();
        match next {
            Some(node) => {
                current = node;
                matched += 1;
            }
            None => break,
        }
    }
    (Some(current), matched)
}

/// First occurrence of `text` in the subtree of `node`, preferring matches
/// that sit inside a single text node.
pub fn locate_text(tree: &dyn DocumentTree, node: NodeId, text: &str) -> Option<Span> {
    locate_occurrence(tree, node, text, None)
}

/// Occurrence of `text` closest to the flattened offset `hint`.
pub fn locate_text_near(
    tree: &dyn DocumentTree,
    node: NodeId,
    text: &str,
    hint: usize,
) -> Option<Span> {
    locate_occurrence(tree, node, text, Some(hint))
}

fn locate_occurrence(
    tree: &dyn DocumentTree,
    node: NodeId,
    text: &str,
    hint: Option<usize>,
) -> Option<Span> {
    if text.is_empty() || !tree.contains(node) {
        return None;
    }
    let flat = FlatText::build(tree, node);
    let len = text.chars().count();
    let spans: Vec<Span> = find_all_char_indices(flat.text(), text)
        .into_iter()
        .filter_map(|start| flat.span(start..start + len))
        .collect();
    match hint {
        Some(hint) => spans
            .into_iter()
            .min_by_key(|span| span.range.start.abs_diff(hint)),
        None => {
            let first_single = spans.iter().position(Span::is_single_node);
            match first_single {
                Some(pos) => spans.into_iter().nth(pos),
                None => spans.into_iter().next(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_tree::{SnapshotTree, TEXT_TAG};

    struct Fixture {
        tree: SnapshotTree,
        second_div: NodeId,
        target: NodeId,
    }

    fn fixture() -> Fixture {
        let mut tree = SnapshotTree::new("article").unwrap();
        let root = tree.root();
        let first = tree.append_element(root, "div").unwrap();
        tree.append_text(first, "Intro text").unwrap();
        tree.append_element(root, "aside").unwrap();
        let second_div = tree.append_element(root, "div").unwrap();
        let p = tree.append_element(second_div, "p").unwrap();
        tree.append_text(p, "Type ").unwrap();
        let target = tree.append_text(p, "Safety first, Type Safety always").unwrap();
        Fixture {
            tree,
            second_div,
            target,
        }
    }

    #[test]
    fn build_path_counts_same_tag_siblings() {
        let fx = fixture();
        assert_eq!(
            build_path(&fx.tree, fx.second_div).unwrap(),
            "/article[1]/div[2]"
        );
        assert_eq!(
            build_path(&fx.tree, fx.target).unwrap(),
            format!("/article[1]/div[2]/p[1]/{TEXT_TAG}[2]")
        );
        assert_eq!(build_path(&fx.tree, fx.tree.root()).unwrap(), "/article[1]");
    }

    #[test]
    fn build_path_rejects_detached_nodes() {
        let mut fx = fixture();
        let orphan = fx.tree.detached_element("div").unwrap();
        assert_eq!(
            build_path(&fx.tree, orphan),
            Err(AnchorError::UnreachableNode(orphan))
        );
        assert_eq!(
            build_path(&fx.tree, NodeId(500)),
            Err(AnchorError::UnreachableNode(NodeId(500)))
        );
    }

    #[test]
    fn resolve_round_trips_every_node() {
        let fx = fixture();
        for node in fx.tree.descendants(fx.tree.root()) {
            let path = build_path(&fx.tree, node).unwrap();
            assert_eq!(resolve_path(&fx.tree, &path).unwrap(), node, "{path}");
        }
    }

    #[test]
    fn resolve_is_all_or_nothing() {
        let fx = fixture();
        assert_eq!(
            resolve_path(&fx.tree, "/article[1]/div[3]"),
            Err(AnchorError::PathNotFound("/article[1]/div[3]".into()))
        );
        assert!(resolve_path(&fx.tree, "/section[1]").is_err());
        assert_eq!(
            resolve_prefix(&fx.tree, "/article[1]/div[2]/ul[1]/li[4]").unwrap(),
            Some((fx.second_div, 2))
        );
        assert_eq!(resolve_prefix(&fx.tree, "/body[1]").unwrap(), None);
    }

    #[test]
    fn well_formedness_checks_brackets_and_root_marker() {
        assert!(is_well_formed("/article[1]/div[2]"));
        assert!(is_well_formed("/#text[3]"));
        assert!(!is_well_formed("article[1]"));
        assert!(!is_well_formed("/"));
        assert!(!is_well_formed("/div[1"));
        assert!(!is_well_formed("/div[x]"));
        assert!(!is_well_formed("/div[0]"));
        assert!(!is_well_formed("/[1]"));
        assert!(!is_well_formed("/div[1]//p[1]"));
        assert!(matches!(
            resolve_path(&fixture().tree, "div[1]"),
            Err(AnchorError::MalformedPath { .. })
        ));
    }

    #[test]
    fn locate_text_prefers_single_node_matches() {
        let fx = fixture();
        // "Type Safety" first appears across the two text nodes, then inside one
        let span = locate_text(&fx.tree, fx.second_div, "Type Safety").unwrap();
        assert_eq!(span.text, "Type Safety");
        assert!(span.is_single_node());
        assert_eq!(span.start.node, fx.target);
        assert_eq!(span.range, 19..30);
    }

    #[test]
    fn locate_text_near_picks_closest_occurrence() {
        let fx = fixture();
        let span = locate_text_near(&fx.tree, fx.second_div, "Type Safety", 0).unwrap();
        assert_eq!(span.range, 0..11);
        assert!(!span.is_single_node());
        assert!(locate_text(&fx.tree, fx.second_div, "missing").is_none());
        assert!(locate_text(&fx.tree, fx.second_div, "").is_none());
    }
}
