//! Anchor creation and the resolution cascade.
//!
//! Creation captures every strategy's descriptor at once and scores how likely
//! the anchor is to survive document drift. Resolution runs the strategies in
//! priority order under a wall-clock budget; the budget is checked between
//! attempts, never inside one. Every candidate must pass range validation
//! before it is accepted, and every call records a metrics sample.

use std::ops::Range;
use std::time::Instant;

use document_tree::DocumentTree;
use textanchor_core_types::{Anchor, AnchorStrategy, ContainerId, NodeId, Span, TextSelection};
use tracing::{debug, info, warn};

use crate::checksum::{content_checksum, verify_checksum};
use crate::errors::AnchorError;
use crate::flatten::FlatText;
use crate::metrics::ResolutionMetrics;
use crate::normalize::{char_len, find_all_char_indices};
use crate::offset::{find_text_range, is_offset_plausible};
use crate::path::{build_path, resolve_path};
use crate::policy::EngineConfig;
use crate::similarity::calculate_similarity;
use crate::strategies::{strategy_for, Strategy};
use crate::types::{
    duration_ms, AttemptVerdict, ResolutionOutcome, ResolutionReport, ResolvedSpan,
    StrategyAttempt,
};

/// Context captured on each side when a selection is built from a range.
pub const DEFAULT_CONTEXT_CHARS: usize = 32;

const BASE_CONFIDENCE: f64 = 0.5;
const PATH_BONUS: f64 = 0.2;
const OFFSET_BONUS: f64 = 0.15;

/// Signals feeding the creation-time confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfidenceInputs {
    pub path_round_trips: bool,
    pub offset_plausible: bool,
    /// Combined length of both context strings, in chars.
    pub context_chars: usize,
    pub selection_chars: usize,
}

/// Heuristic estimate of how likely an anchor keeps resolving.
pub fn score_confidence(inputs: ConfidenceInputs) -> f64 {
    let mut score = BASE_CONFIDENCE;
    if inputs.path_round_trips {
        score += PATH_BONUS;
    }
    if inputs.offset_plausible {
        score += OFFSET_BONUS;
    }
    score += match inputs.context_chars {
        n if n >= 50 => 0.10,
        n if n >= 20 => 0.05,
        _ => 0.0,
    };
    score += match inputs.selection_chars {
        n if n >= 30 => 0.05,
        n if n >= 10 => 0.025,
        _ => 0.0,
    };
    score.min(1.0)
}

pub struct AnchorCoordinator {
    config: EngineConfig,
    strategies: Vec<Box<dyn Strategy>>,
    metrics: ResolutionMetrics,
}

impl Default for AnchorCoordinator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl AnchorCoordinator {
    /// Coordinator running the configured strategy order.
    pub fn new(config: EngineConfig) -> Self {
        let strategies = config
            .effective_order()
            .into_iter()
            .filter_map(|strategy| strategy_for(strategy, config.fuzzy_threshold))
            .collect();
        Self::with_strategies(config, strategies)
    }

    /// Coordinator over a caller-supplied cascade.
    pub fn with_strategies(config: EngineConfig, strategies: Vec<Box<dyn Strategy>>) -> Self {
        let metrics = ResolutionMetrics::new(config.metrics_capacity);
        Self {
            config,
            strategies,
            metrics,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ResolutionMetrics {
        &self.metrics
    }

    pub fn strategy_order(&self) -> Vec<AnchorStrategy> {
        self.strategies.iter().map(|s| s.strategy_type()).collect()
    }

    /// Build a selection from a char range of `container`'s flattened text,
    /// capturing up to `context_chars` of context on each side.
    pub fn selection_from_range(
        &self,
        tree: &dyn DocumentTree,
        container: NodeId,
        range: Range<usize>,
        container_id: &ContainerId,
        context_chars: usize,
    ) -> Result<TextSelection, AnchorError> {
        if !tree.contains(container) {
            return Err(AnchorError::InvalidSelection(format!(
                "unknown container {container}"
            )));
        }
        let flat = FlatText::build(tree, container);
        let text = flat.slice(range.clone()).ok_or_else(|| {
            AnchorError::InvalidSelection(format!(
                "range {}..{} outside container text of {} chars",
                range.start,
                range.end,
                flat.char_len()
            ))
        })?;
        Ok(TextSelection::new(text, container, container_id.as_str())
            .with_range(range.clone())
            .with_context(
                flat.before(range.start, context_chars),
                flat.after(range.end, context_chars),
            ))
    }

    pub fn create_anchor(
        &self,
        selection: &TextSelection,
        tree: &dyn DocumentTree,
    ) -> Result<Anchor, AnchorError> {
        let text = &selection.selected_text;
        if text.trim().is_empty() {
            return Err(AnchorError::InvalidSelection(
                "selected text is empty".to_string(),
            ));
        }
        if selection.container_id.is_empty() {
            return Err(AnchorError::InvalidSelection(
                "container id is empty".to_string(),
            ));
        }
        if selection.context_before.is_empty() && selection.context_after.is_empty() {
            return Err(AnchorError::InvalidSelection(
                "selection carries no surrounding context".to_string(),
            ));
        }
        let container = selection.container;
        if !tree.contains(container) {
            return Err(AnchorError::InvalidSelection(format!(
                "unknown container {container}"
            )));
        }
        if !tree.is_reachable(container) {
            return Err(AnchorError::InvalidSelection(format!(
                "container {container} is detached from the document"
            )));
        }

        let structural_path = build_path(tree, container)
            .map_err(|err| AnchorError::InvalidSelection(err.to_string()))?;
        let flat = FlatText::build(tree, container);
        let text_len = char_len(text);

        let start_offset = match &selection.range {
            Some(range) => {
                if range.start >= range.end
                    || range.end > flat.char_len()
                    || range.end - range.start != text_len
                    || flat.slice(range.clone()) != Some(text.as_str())
                {
                    return Err(AnchorError::InvalidSelection(format!(
                        "range {}..{} does not cover the {}-char selection in a {}-char container",
                        range.start,
                        range.end,
                        text_len,
                        flat.char_len()
                    )));
                }
                range.start
            }
            None => locate_selection(&flat, selection).ok_or_else(|| {
                AnchorError::InvalidSelection(format!(
                    "selected text not found in container {container}"
                ))
            })?,
        };
        let end_offset = start_offset + text_len;

        let confidence = score_confidence(ConfidenceInputs {
            path_round_trips: resolve_path(tree, &structural_path)
                .map(|node| node == container)
                .unwrap_or(false),
            offset_plausible: is_offset_plausible(tree, container, start_offset, text_len),
            context_chars: char_len(&selection.context_before)
                + char_len(&selection.context_after),
            selection_chars: text_len,
        });

        let anchor = Anchor {
            selected_text: text.clone(),
            start_offset,
            end_offset,
            structural_path,
            container_id: selection.container_id.clone(),
            context_before: selection.context_before.clone(),
            context_after: selection.context_after.clone(),
            content_checksum: content_checksum(
                &selection.context_before,
                text,
                &selection.context_after,
            ),
            confidence,
            strategy: AnchorStrategy::PathBased,
        };

        info!(
            "Created anchor at {} [{}..{}] (confidence: {:.3})",
            anchor.structural_path, anchor.start_offset, anchor.end_offset, anchor.confidence
        );
        Ok(anchor)
    }

    pub fn validate_anchor(&self, anchor: &Anchor) -> bool {
        self.check_anchor(anchor).is_ok()
    }

    /// Validation gate with the first failing reason.
    pub fn check_anchor(&self, anchor: &Anchor) -> Result<(), AnchorError> {
        let reject = |reason: &str| Err(AnchorError::InvalidAnchor(reason.to_string()));
        if anchor.selected_text.trim().is_empty() {
            return reject("selected text is empty");
        }
        if anchor.structural_path.trim().is_empty() {
            return reject("structural path is empty");
        }
        if anchor.container_id.is_empty() {
            return reject("container id is empty");
        }
        if anchor.start_offset >= anchor.end_offset {
            return reject("end offset must be greater than start offset");
        }
        if !anchor.confidence.is_finite() || !(0.0..=1.0).contains(&anchor.confidence) {
            return reject("confidence outside [0, 1]");
        }
        if !anchor.strategy.is_recognized() {
            return reject("unrecognized strategy");
        }
        if !anchor.has_context() {
            return reject("both context strings are empty");
        }
        Ok(())
    }

    /// Similarity of a candidate's text to the anchor's selection.
    pub fn range_similarity(&self, anchor: &Anchor, text: &str) -> f64 {
        let expected = anchor.selected_text.trim();
        let actual = text.trim();
        if expected == actual {
            1.0
        } else {
            calculate_similarity(expected, actual)
        }
    }

    pub fn validate_resolved_range(&self, anchor: &Anchor, span: &Span) -> bool {
        self.range_similarity(anchor, &span.text) >= self.config.min_confidence
    }

    pub fn resolve_anchor(&self, anchor: &Anchor, tree: &dyn DocumentTree) -> Option<ResolvedSpan> {
        self.resolve_with_report(anchor, tree).resolved
    }

    pub fn resolve_with_report(&self, anchor: &Anchor, tree: &dyn DocumentTree) -> ResolutionReport {
        let started = Instant::now();

        if let Err(err) = self.check_anchor(anchor) {
            warn!("Rejected anchor before resolution: {}", err);
            return self.finish(ResolutionOutcome::Invalid, None, Vec::new(), started);
        }

        let budget = self.config.time_budget();
        let mut attempts = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            if started.elapsed() >= budget {
                warn!(
                    "Resolution budget of {}ms exhausted after {} attempt(s)",
                    self.config.time_budget_ms,
                    attempts.len()
                );
                return self.finish(ResolutionOutcome::TimedOut, None, attempts, started);
            }

            let strategy_type = strategy.strategy_type();
            debug!("Trying strategy: {}", strategy.name());
            let attempt_started = Instant::now();
            let mut accepted = None;

            let verdict = match strategy.attempt(anchor, tree) {
                Ok(Some(candidate)) => {
                    let similarity = self.range_similarity(anchor, &candidate.span.text);
                    if similarity >= self.config.min_confidence {
                        let checksum_verified = self.verify_surroundings(anchor, tree, &candidate.span);
                        accepted = Some(ResolvedSpan {
                            span: candidate.span,
                            strategy: strategy_type,
                            similarity,
                            checksum_verified,
                        });
                        AttemptVerdict::Validated
                    } else {
                        debug!(
                            "Strategy {} candidate rejected (similarity: {:.3})",
                            strategy.name(),
                            similarity
                        );
                        AttemptVerdict::Rejected { similarity }
                    }
                }
                Ok(None) => {
                    debug!("Strategy {} returned no candidate", strategy.name());
                    AttemptVerdict::NoCandidate
                }
                Err(err) => {
                    let err = match err {
                        AnchorError::StrategyFailed { .. } => err,
                        other => AnchorError::StrategyFailed {
                            strategy: strategy.name().to_string(),
                            reason: other.to_string(),
                        },
                    };
                    warn!("{}", err);
                    AttemptVerdict::Errored {
                        message: err.to_string(),
                    }
                }
            };

            attempts.push(StrategyAttempt {
                strategy: strategy_type,
                verdict,
                elapsed_ms: duration_ms(attempt_started.elapsed()),
            });

            if let Some(resolved) = accepted {
                info!(
                    "Resolved anchor using {} strategy: '{}' (similarity: {:.2})",
                    strategy.name(),
                    resolved.span.text,
                    resolved.similarity
                );
                return self.finish(ResolutionOutcome::Resolved, Some(resolved), attempts, started);
            }
        }

        info!("All strategies exhausted for anchor at {}", anchor.structural_path);
        self.finish(ResolutionOutcome::NotFound, None, attempts, started)
    }

    fn finish(
        &self,
        outcome: ResolutionOutcome,
        resolved: Option<ResolvedSpan>,
        attempts: Vec<StrategyAttempt>,
        started: Instant,
    ) -> ResolutionReport {
        let elapsed = started.elapsed();
        self.metrics.record(
            resolved.as_ref().map(|r| r.strategy),
            outcome,
            elapsed,
        );
        ResolutionReport::new(outcome, resolved, attempts, elapsed)
    }

    fn verify_surroundings(&self, anchor: &Anchor, tree: &dyn DocumentTree, span: &Span) -> bool {
        let flat = FlatText::build(tree, span.container);
        let before = flat.before(span.range.start, char_len(&anchor.context_before));
        let after = flat.after(span.range.end, char_len(&anchor.context_after));
        verify_checksum(&anchor.content_checksum, before, &span.text, after)
    }
}

/// Start offset of the selection, preferring the occurrence that follows `context_before`.
fn locate_selection(flat: &FlatText, selection: &TextSelection) -> Option<usize> {
    let text = &selection.selected_text;
    let occurrences = find_all_char_indices(flat.text(), text);
    if occurrences.is_empty() {
        return find_text_range(flat.text(), text).map(|found| found.range.start);
    }

    let before = selection.context_before.trim();
    if occurrences.len() > 1 && !before.is_empty() {
        let probe = char_len(&selection.context_before);
        let preceded = occurrences
            .iter()
            .copied()
            .find(|start| flat.before(*start, probe).trim_end().ends_with(before));
        if preceded.is_some() {
            return preceded;
        }
    }
    occurrences.first().copied()
}
