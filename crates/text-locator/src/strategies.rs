//! Anchor resolution strategies
//!
//! Three strategies in fallback order:
//! 1. PathBased - structural path, then exact text inside the node
//! 2. OffsetBased - recovered container, then stored char offset
//! 3. FuzzyMatch - approximate search seeded with the stored context

use document_tree::DocumentTree;
use textanchor_core_types::{Anchor, AnchorStrategy, NodeId};
use tracing::debug;

use crate::errors::AnchorError;
use crate::flatten::FlatText;
use crate::offset::locate_by_offset;
use crate::path::{locate_text_near, resolve_path, resolve_prefix};
use crate::similarity::{calculate_similarity, MatchContext, SimilarityMatcher, DEFAULT_THRESHOLD};
use crate::types::Candidate;

/// Strategy capability iterated by the coordinator
pub trait Strategy: Send + Sync {
    /// Propose a span for `anchor` in `tree`, or nothing
    fn attempt(
        &self,
        anchor: &Anchor,
        tree: &dyn DocumentTree,
    ) -> Result<Option<Candidate>, AnchorError>;

    /// Get strategy type
    fn strategy_type(&self) -> AnchorStrategy;

    /// Get strategy name
    fn name(&self) -> &'static str {
        self.strategy_type().name()
    }
}

/// Structural path strategy
#[derive(Debug, Default)]
pub struct PathStrategy;

impl Strategy for PathStrategy {
    fn attempt(
        &self,
        anchor: &Anchor,
        tree: &dyn DocumentTree,
    ) -> Result<Option<Candidate>, AnchorError> {
        let node = match resolve_path(tree, &anchor.structural_path) {
            Ok(node) => node,
            Err(AnchorError::PathNotFound(path)) => {
                debug!("Structural path no longer resolves: {}", path);
                return Ok(None);
            }
            Err(err) => return Err(err),
        };

        Ok(
            locate_text_near(tree, node, &anchor.selected_text, anchor.start_offset)
                .map(|span| Candidate::new(span, AnchorStrategy::PathBased, 1.0)),
        )
    }

    fn strategy_type(&self) -> AnchorStrategy {
        AnchorStrategy::PathBased
    }
}

/// Char offset strategy
#[derive(Debug, Default)]
pub struct OffsetStrategy;

impl OffsetStrategy {
    /// Full path, else the deepest resolvable prefix, else the root
    fn recover_container(
        tree: &dyn DocumentTree,
        path: &str,
    ) -> Result<NodeId, AnchorError> {
        match resolve_path(tree, path) {
            Ok(node) => Ok(node),
            Err(AnchorError::PathNotFound(_)) => match resolve_prefix(tree, path)? {
                Some((node, matched)) => {
                    debug!(matched, "Offset container recovered from path prefix");
                    Ok(node)
                }
                None => Ok(tree.root()),
            },
            Err(AnchorError::MalformedPath { reason, .. }) => {
                debug!(%reason, "Unparseable path, offsets taken from the document root");
                Ok(tree.root())
            }
            Err(err) => Err(err),
        }
    }
}

impl Strategy for OffsetStrategy {
    fn attempt(
        &self,
        anchor: &Anchor,
        tree: &dyn DocumentTree,
    ) -> Result<Option<Candidate>, AnchorError> {
        let container = Self::recover_container(tree, &anchor.structural_path)?;
        let expected = anchor.selected_text.trim();
        let length = anchor.span_len();

        // The recovered node may be an ancestor of the old container; any
        // element below it whose text starts at the same place qualifies.
        let scopes = tree
            .descendants(container)
            .into_iter()
            .filter(|node| !tree.is_text_bearing(*node));
        for scope in scopes {
            if let Some(span) = locate_by_offset(tree, scope, anchor.start_offset, length) {
                if span.text.trim() == expected {
                    return Ok(Some(Candidate::new(span, AnchorStrategy::OffsetBased, 1.0)));
                }
            }
        }

        // text shifted by an earlier edit
        if let Some(span) =
            locate_text_near(tree, container, &anchor.selected_text, anchor.start_offset)
        {
            debug!(
                from = anchor.start_offset,
                to = span.range.start,
                "Offset re-anchored on exact text"
            );
            return Ok(Some(Candidate::new(span, AnchorStrategy::OffsetBased, 1.0)));
        }

        Ok(
            locate_by_offset(tree, container, anchor.start_offset, length).map(|span| {
                let score = calculate_similarity(expected, span.text.trim());
                Candidate::new(span, AnchorStrategy::OffsetBased, score)
            }),
        )
    }

    fn strategy_type(&self) -> AnchorStrategy {
        AnchorStrategy::OffsetBased
    }
}

/// Approximate text strategy
#[derive(Debug)]
pub struct FuzzyStrategy {
    matcher: SimilarityMatcher,
}

impl FuzzyStrategy {
    pub fn new(threshold: f64) -> Self {
        Self {
            matcher: SimilarityMatcher::new(threshold),
        }
    }
}

impl Default for FuzzyStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl Strategy for FuzzyStrategy {
    fn attempt(
        &self,
        anchor: &Anchor,
        tree: &dyn DocumentTree,
    ) -> Result<Option<Candidate>, AnchorError> {
        let root = tree.root();
        let mut scopes = Vec::with_capacity(2);
        if let Ok(node) = resolve_path(tree, &anchor.structural_path) {
            scopes.push(node);
        }
        if !scopes.contains(&root) {
            scopes.push(root);
        }

        let context = MatchContext::new(&anchor.context_before, &anchor.context_after);
        for scope in scopes {
            let flat = FlatText::build(tree, scope);
            let Some(found) =
                self.matcher
                    .find_best_match(&anchor.selected_text, flat.text(), Some(&context))
            else {
                continue;
            };
            if let Some(span) = flat.span(found.range.clone()) {
                debug!(stage = ?found.stage, score = found.score, "Fuzzy match found");
                return Ok(Some(Candidate::new(
                    span,
                    AnchorStrategy::FuzzyMatch,
                    found.score,
                )));
            }
        }
        Ok(None)
    }

    fn strategy_type(&self) -> AnchorStrategy {
        AnchorStrategy::FuzzyMatch
    }
}

/// Build the strategy for one position of the fallback order
pub fn strategy_for(strategy: AnchorStrategy, fuzzy_threshold: f64) -> Option<Box<dyn Strategy>> {
    match strategy {
        AnchorStrategy::PathBased => Some(Box::new(PathStrategy)),
        AnchorStrategy::OffsetBased => Some(Box::new(OffsetStrategy)),
        AnchorStrategy::FuzzyMatch => Some(Box::new(FuzzyStrategy::new(fuzzy_threshold))),
        AnchorStrategy::Unrecognized => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use document_tree::SnapshotTree;
    use textanchor_core_types::ContainerId;

    fn anchor(text: &str, start: usize, path: &str) -> Anchor {
        Anchor {
            selected_text: text.to_string(),
            start_offset: start,
            end_offset: start + text.chars().count(),
            structural_path: path.to_string(),
            container_id: ContainerId::new("msg-1"),
            context_before: "offers ".to_string(),
            context_after: " and".to_string(),
            content_checksum: String::new(),
            confidence: 0.9,
            strategy: AnchorStrategy::PathBased,
        }
    }

    fn doc(container_tag: &str, text: &str) -> SnapshotTree {
        let mut tree = SnapshotTree::new("article").unwrap();
        let root = tree.root();
        let div = tree.append_element(root, "div").unwrap();
        let p = tree.append_element(div, container_tag).unwrap();
        tree.append_text(p, text).unwrap();
        tree
    }

    const TEXT: &str = "TypeScript offers Type Safety and Better IDE Support.";

    #[test]
    fn path_strategy_finds_exact_text() {
        let tree = doc("p", TEXT);
        let found = PathStrategy
            .attempt(&anchor("Type Safety", 18, "/article[1]/div[1]/p[1]"), &tree)
            .unwrap()
            .unwrap();
        assert_eq!(found.span.text, "Type Safety");
        assert_eq!(found.span.range, 18..29);
        assert_eq!(found.strategy, AnchorStrategy::PathBased);
    }

    #[test]
    fn path_strategy_yields_nothing_for_stale_path() {
        let tree = doc("section", TEXT);
        let found = PathStrategy
            .attempt(&anchor("Type Safety", 18, "/article[1]/div[1]/p[1]"), &tree)
            .unwrap();
        assert!(found.is_none());
        assert!(PathStrategy
            .attempt(&anchor("Type Safety", 18, "not-a-path"), &tree)
            .is_err());
    }

    #[test]
    fn offset_strategy_recovers_container_from_prefix() {
        let tree = doc("section", TEXT);
        let found = OffsetStrategy
            .attempt(&anchor("Type Safety", 18, "/article[1]/div[1]/p[1]"), &tree)
            .unwrap()
            .unwrap();
        assert_eq!(found.span.text, "Type Safety");
        assert_eq!(found.strategy, AnchorStrategy::OffsetBased);
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn offset_strategy_reports_shifted_text_with_low_score() {
        let tree = doc("p", "TypeScript provides Typ Safety and more.");
        let found = OffsetStrategy
            .attempt(&anchor("Type Safety", 18, "/article[1]/div[1]/p[1]"), &tree)
            .unwrap()
            .unwrap();
        assert_eq!(found.span.text, "s Typ Safet");
        assert!(found.score < 1.0);
    }

    #[test]
    fn offset_strategy_follows_text_shifted_by_one_char() {
        let tree = doc("section", "TypeScript offers: Type Safety and Better IDE Support.");
        let found = OffsetStrategy
            .attempt(&anchor("Type Safety", 18, "/article[1]/div[1]/p[1]"), &tree)
            .unwrap()
            .unwrap();
        assert_eq!(found.span.text, "Type Safety");
        assert_eq!(found.span.range, 19..30);
        assert_eq!(found.score, 1.0);
    }

    #[test]
    fn offset_strategy_uses_root_for_malformed_path() {
        let tree = doc("p", TEXT);
        let found = OffsetStrategy
            .attempt(&anchor("Type Safety", 18, "garbage"), &tree)
            .unwrap()
            .unwrap();
        assert_eq!(found.span.text, "Type Safety");
        assert_eq!(found.span.range, 18..29);
    }

    #[test]
    fn fuzzy_strategy_falls_back_to_root() {
        let tree = doc("section", "TypeScript provides Type Safety and more.");
        let found = FuzzyStrategy::default()
            .attempt(&anchor("Type Safety", 18, "/article[1]/div[1]/p[1]"), &tree)
            .unwrap()
            .unwrap();
        assert_eq!(found.span.text, "Type Safety");
        assert_eq!(found.strategy, AnchorStrategy::FuzzyMatch);
    }

    #[test]
    fn strategy_factory_skips_unrecognized() {
        assert!(strategy_for(AnchorStrategy::Unrecognized, 0.7).is_none());
        let fuzzy = strategy_for(AnchorStrategy::FuzzyMatch, 0.7).unwrap();
        assert_eq!(fuzzy.name(), "fuzzy-match");
    }
}
