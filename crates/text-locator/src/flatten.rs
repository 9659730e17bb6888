//! Flattened text of a container subtree.

use std::ops::Range;

use document_tree::DocumentTree;
use textanchor_core_types::{NodeId, Span, TextPosition};

use crate::normalize::{char_len, char_slice};

/// One text-bearing node's slice of the flattened string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub node: NodeId,
    pub start: usize,
    pub len: usize,
}

impl Segment {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Text of every text-bearing descendant of `container`, in document order.
#[derive(Debug, Clone)]
pub struct FlatText {
    container: NodeId,
    text: String,
    char_len: usize,
    segments: Vec<Segment>,
}

impl FlatText {
    pub fn build(tree: &dyn DocumentTree, container: NodeId) -> Self {
        let mut text = String::new();
        let mut segments = Vec::new();
        let mut offset = 0usize;
        for node in tree.text_nodes(container) {
            let own = tree.text(node).unwrap_or_default();
            let len = char_len(own);
            segments.push(Segment {
                node,
                start: offset,
                len,
            });
            text.push_str(own);
            offset += len;
        }
        Self {
            container,
            text,
            char_len: offset,
            segments,
        }
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_len(&self) -> usize {
        self.char_len
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn contains_range(&self, range: &Range<usize>) -> bool {
        range.start < range.end && range.end <= self.char_len
    }

    pub fn slice(&self, range: Range<usize>) -> Option<&str> {
        if !self.contains_range(&range) {
            return None;
        }
        Some(char_slice(&self.text, range))
    }

    /// Up to `count` chars immediately before `at`.
    pub fn before(&self, at: usize, count: usize) -> &str {
        let at = at.min(self.char_len);
        char_slice(&self.text, at.saturating_sub(count)..at)
    }

    /// Up to `count` chars starting at `at`.
    pub fn after(&self, at: usize, count: usize) -> &str {
        let at = at.min(self.char_len);
        char_slice(&self.text, at..at.saturating_add(count).min(self.char_len))
    }

    /// Map a char range to node positions.
    pub fn span(&self, range: Range<usize>) -> Option<Span> {
        if !self.contains_range(&range) {
            return None;
        }
        let first = self
            .segments
            .iter()
            .find(|seg| seg.len > 0 && seg.start <= range.start && range.start < seg.end())?;
        let last = self
            .segments
            .iter()
            .find(|seg| seg.len > 0 && seg.start < range.end && range.end <= seg.end())?;
        Some(Span {
            container: self.container,
            start: TextPosition::new(first.node, range.start - first.start),
            end: TextPosition::new(last.node, range.end - last.start),
            text: char_slice(&self.text, range.clone()).to_string(),
            range,
        })
    }

    /// Flattened offset of a node position, if the node belongs to this container.
    pub fn offset_of(&self, position: TextPosition) -> Option<usize> {
        self.segments
            .iter()
            .find(|seg| seg.node == position.node && position.offset <= seg.len)
            .map(|seg| seg.start + position.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_tree::SnapshotTree;

    fn tree() -> SnapshotTree {
        let mut tree = SnapshotTree::new("root").unwrap();
        let root = tree.root();
        let p = tree.append_element(root, "p").unwrap();
        tree.append_text(p, "Rust ").unwrap();
        tree.append_text(p, "").unwrap();
        let b = tree.append_element(p, "b").unwrap();
        tree.append_text(b, "borrow").unwrap();
        tree.append_text(p, " checker").unwrap();
        tree
    }

    #[test]
    fn segments_cover_text_in_order() {
        let tree = tree();
        let flat = FlatText::build(&tree, tree.root());
        assert_eq!(flat.text(), "Rust borrow checker");
        assert_eq!(flat.char_len(), 19);
        let lens: Vec<usize> = flat.segments().iter().map(|s| s.len).collect();
        assert_eq!(lens, vec![5, 0, 6, 8]);
    }

    #[test]
    fn span_inside_one_node() {
        let tree = tree();
        let flat = FlatText::build(&tree, tree.root());
        let span = flat.span(5..11).unwrap();
        assert_eq!(span.text, "borrow");
        assert!(span.is_single_node());
        assert_eq!(span.start.offset, 0);
        assert_eq!(span.end.offset, 6);
    }

    #[test]
    fn span_crossing_nodes_skips_empty_segments() {
        let tree = tree();
        let flat = FlatText::build(&tree, tree.root());
        let span = flat.span(2..8).unwrap();
        assert_eq!(span.text, "st bor");
        assert!(!span.is_single_node());
        assert_eq!(span.start.offset, 2);
        assert_eq!(span.end.offset, 3);
        assert_eq!(flat.offset_of(span.end), Some(8));
    }

    #[test]
    fn out_of_range_spans_are_rejected() {
        let tree = tree();
        let flat = FlatText::build(&tree, tree.root());
        assert!(flat.span(10..10).is_none());
        assert!(flat.span(15..40).is_none());
        assert_eq!(flat.before(5, 3), "st ");
        assert_eq!(flat.after(12, 100), "checker");
    }
}
