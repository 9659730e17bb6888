//! Core types for anchor resolution

use serde::Serialize;
use std::time::Duration;
use textanchor_core_types::{AnchorStrategy, Span};

use crate::errors::AnchorError;

/// Span proposed by one strategy, before validation
#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    /// Location in the current snapshot
    pub span: Span,

    /// Strategy that produced the candidate
    pub strategy: AnchorStrategy,

    /// Strategy-local match score (0.0-1.0)
    pub score: f64,
}

impl Candidate {
    pub fn new(span: Span, strategy: AnchorStrategy, score: f64) -> Self {
        Self {
            span,
            strategy,
            score,
        }
    }

    /// Exact strategies report 1.0
    pub fn is_exact(&self) -> bool {
        self.score >= 1.0
    }
}

/// Accepted resolution result handed to highlighting
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedSpan {
    pub span: Span,

    /// Strategy whose candidate passed validation
    pub strategy: AnchorStrategy,

    /// Similarity of the resolved text to the anchor's selected text
    pub similarity: f64,

    /// Whether the stored checksum still matches the surrounding text
    pub checksum_verified: bool,
}

/// Per-attempt verdict
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", content = "detail", rename_all = "snake_case")]
pub enum AttemptVerdict {
    /// Candidate passed range validation
    Validated,

    /// Candidate found but its text was too far from the selection
    Rejected { similarity: f64 },

    /// Strategy produced nothing
    NoCandidate,

    /// Strategy failed internally; the cascade moved on
    Errored { message: String },
}

/// One strategy attempt inside a resolution
#[derive(Debug, Clone, Serialize)]
pub struct StrategyAttempt {
    pub strategy: AnchorStrategy,
    pub verdict: AttemptVerdict,
    pub elapsed_ms: f64,
}

/// Final state of one resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Resolved,
    NotFound,
    TimedOut,
    /// Anchor failed the validation gate; no strategy ran
    Invalid,
}

impl ResolutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResolutionOutcome::Resolved)
    }
}

/// Diagnostics for one resolution call
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionReport {
    pub outcome: ResolutionOutcome,
    pub resolved: Option<ResolvedSpan>,
    pub attempts: Vec<StrategyAttempt>,
    pub elapsed_ms: f64,
}

impl ResolutionReport {
    pub(crate) fn new(
        outcome: ResolutionOutcome,
        resolved: Option<ResolvedSpan>,
        attempts: Vec<StrategyAttempt>,
        elapsed: Duration,
    ) -> Self {
        Self {
            outcome,
            resolved,
            attempts,
            elapsed_ms: duration_ms(elapsed),
        }
    }

    /// Strategy that produced the accepted span, if any
    pub fn strategy(&self) -> Option<AnchorStrategy> {
        self.resolved.as_ref().map(|resolved| resolved.strategy)
    }

    /// Convert into a result, mapping failures onto the error taxonomy
    pub fn into_result(self) -> Result<ResolvedSpan, AnchorError> {
        match (self.outcome, self.resolved) {
            (ResolutionOutcome::Resolved, Some(resolved)) => Ok(resolved),
            (ResolutionOutcome::TimedOut, _) => Err(AnchorError::Timeout(format!(
                "budget exhausted after {} attempt(s)",
                self.attempts.len()
            ))),
            (ResolutionOutcome::Invalid, _) => Err(AnchorError::InvalidAnchor(
                "anchor rejected before resolution".to_string(),
            )),
            _ => Err(AnchorError::ResolutionFailure(format!(
                "no acceptable match after {} attempt(s)",
                self.attempts.len()
            ))),
        }
    }
}

pub(crate) fn duration_ms(elapsed: Duration) -> f64 {
    elapsed.as_secs_f64() * 1000.0
}
