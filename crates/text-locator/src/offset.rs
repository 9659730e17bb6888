//! Character offsets inside a container's flattened text.
//!
//! Offsets survive attribute and path churn but shift when text is inserted
//! before the target. Lookups run a normalization cascade and always report
//! positions in the original, unnormalized text.

use std::ops::Range;

use document_tree::DocumentTree;
use textanchor_core_types::{NodeId, Span};
use tracing::debug;

use crate::flatten::FlatText;
use crate::normalize::{find_char_index, find_chars, normalize, words, NormalizeMode};

/// Share of positionally equal words required by the word-sequence pass.
pub const WORD_MATCH_RATIO: f64 = 0.8;

/// Which pass of the cascade found the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OffsetMatchKind {
    Exact,
    Whitespace,
    Aggressive,
    WordSequence,
}

/// Match position in source chars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetMatch {
    pub range: Range<usize>,
    pub kind: OffsetMatchKind,
}

/// Offset of `text`'s first occurrence in the flattened text of `container`.
pub fn compute_offset(tree: &dyn DocumentTree, container: NodeId, text: &str) -> Option<usize> {
    let flat = FlatText::build(tree, container);
    find_text_range(flat.text(), text).map(|found| found.range.start)
}

/// Run the exact, whitespace, aggressive and word-sequence passes in order.
pub fn find_text_range(haystack: &str, needle: &str) -> Option<OffsetMatch> {
    if needle.trim().is_empty() || haystack.is_empty() {
        return None;
    }

    if let Some(start) = find_char_index(haystack, needle) {
        return Some(OffsetMatch {
            range: start..start + needle.chars().count(),
            kind: OffsetMatchKind::Exact,
        });
    }

    for (mode, kind) in [
        (NormalizeMode::Whitespace, OffsetMatchKind::Whitespace),
        (NormalizeMode::Aggressive, OffsetMatchKind::Aggressive),
    ] {
        let hay = normalize(haystack, mode);
        let pattern = normalize(needle, mode);
        if pattern.is_empty() {
            continue;
        }
        if let Some(at) = find_chars(&hay.chars, &pattern.chars) {
            if let Some(range) = hay.source_range(at..at + pattern.chars.len()) {
                debug!(?kind, ?range, "offset found after normalization");
                return Some(OffsetMatch { range, kind });
            }
        }
    }

    word_sequence_match(haystack, needle)
}

fn word_sequence_match(haystack: &str, needle: &str) -> Option<OffsetMatch> {
    let hay_words = words(haystack);
    let needle_words = words(needle);
    let count = needle_words.len();
    if count == 0 || count > hay_words.len() {
        return None;
    }

    let mut best: Option<(f64, usize)> = None;
    for start in 0..=hay_words.len() - count {
        let equal = needle_words
            .iter()
            .zip(&hay_words[start..start + count])
            .filter(|(a, b)| a.key == b.key)
            .count();
        let ratio = equal as f64 / count as f64;
        if ratio >= WORD_MATCH_RATIO && best.map_or(true, |(b, _)| ratio > b) {
            best = Some((ratio, start));
        }
    }

    best.map(|(ratio, start)| {
        debug!(ratio, "offset found by word sequence");
        OffsetMatch {
            range: hay_words[start].range.start..hay_words[start + count - 1].range.end,
            kind: OffsetMatchKind::WordSequence,
        }
    })
}

/// Span covering `length` chars from `offset` in the flattened text of `container`.
pub fn locate_by_offset(
    tree: &dyn DocumentTree,
    container: NodeId,
    offset: usize,
    length: usize,
) -> Option<Span> {
    if length == 0 || !tree.contains(container) {
        return None;
    }
    let end = offset.checked_add(length)?;
    FlatText::build(tree, container).span(offset..end)
}

/// True when `offset..offset + length` fits inside the flattened text.
pub fn is_offset_plausible(
    tree: &dyn DocumentTree,
    container: NodeId,
    offset: usize,
    length: usize,
) -> bool {
    if !tree.contains(container) {
        return false;
    }
    match offset.checked_add(length) {
        Some(end) => end <= FlatText::build(tree, container).char_len(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_tree::SnapshotTree;

    fn tree_with(texts: &[&str]) -> (SnapshotTree, NodeId) {
        let mut tree = SnapshotTree::new("root").unwrap();
        let root = tree.root();
        let p = tree.append_element(root, "p").unwrap();
        for text in texts {
            tree.append_text(p, *text).unwrap();
        }
        (tree, p)
    }

    #[test]
    fn exact_offset_is_char_based() {
        let (tree, p) = tree_with(&["Crème brûlée ", "and Type Safety"]);
        assert_eq!(compute_offset(&tree, p, "Type Safety"), Some(17));
        assert_eq!(compute_offset(&tree, p, "nothing here"), None);
    }

    #[test]
    fn whitespace_pass_maps_back_to_source() {
        let found = find_text_range("offers   Type\n\nSafety and", "Type Safety").unwrap();
        assert_eq!(found.kind, OffsetMatchKind::Whitespace);
        assert_eq!(found.range, 9..21);
    }

    #[test]
    fn aggressive_pass_ignores_case_and_punctuation() {
        let found = find_text_range("We love TYPE SAFETY, really", "type safety.").unwrap();
        assert_eq!(found.kind, OffsetMatchKind::Aggressive);
        // maps onto "TYPE SAFETY" minus the trailing comma
        assert_eq!(found.range, 8..19);
    }

    #[test]
    fn word_sequence_tolerates_one_changed_word() {
        let found = find_text_range(
            "the quick brown fox leaps over the lazy dog",
            "quick brown fox jumps over",
        )
        .unwrap();
        assert_eq!(found.kind, OffsetMatchKind::WordSequence);
        assert_eq!(found.range, 4..30);
    }

    #[test]
    fn word_sequence_requires_eighty_percent() {
        assert!(find_text_range("one two three four", "one two five six").is_none());
    }

    #[test]
    fn locate_by_offset_spans_multiple_nodes() {
        let (tree, p) = tree_with(&["Type ", "Safety matters"]);
        let span = locate_by_offset(&tree, p, 0, 11).unwrap();
        assert_eq!(span.text, "Type Safety");
        assert!(!span.is_single_node());
        assert!(locate_by_offset(&tree, p, 15, 10).is_none());
        assert!(locate_by_offset(&tree, p, 0, 0).is_none());
    }

    #[test]
    fn plausibility_checks_bounds() {
        let (tree, p) = tree_with(&["0123456789"]);
        assert!(is_offset_plausible(&tree, p, 0, 10));
        assert!(is_offset_plausible(&tree, p, 4, 6));
        assert!(!is_offset_plausible(&tree, p, 4, 7));
        assert!(!is_offset_plausible(&tree, p, usize::MAX, 2));
        assert!(!is_offset_plausible(&tree, NodeId(99), 0, 1));
    }
}
