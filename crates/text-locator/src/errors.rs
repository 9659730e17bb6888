//! Error types for the anchoring engine

use textanchor_core_types::NodeId;
use thiserror::Error;

/// Anchoring error enumeration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnchorError {
    /// Selection handed to anchor creation is malformed
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Stored anchor fails the validation gate
    #[error("Invalid anchor: {0}")]
    InvalidAnchor(String),

    /// Node is not connected to the document root
    #[error("Node {0} is not reachable from the document root")]
    UnreachableNode(NodeId),

    /// Structural path cannot be parsed
    #[error("Malformed structural path '{path}': {reason}")]
    MalformedPath { path: String, reason: String },

    /// Structural path no longer resolves against the tree
    #[error("Structural path not found: {0}")]
    PathNotFound(String),

    /// Strategy execution failed
    #[error("Strategy '{strategy}' failed: {reason}")]
    StrategyFailed { strategy: String, reason: String },

    /// Every strategy ran without an acceptable match
    #[error("Resolution failed: {0}")]
    ResolutionFailure(String),

    /// Time budget ran out before a match was accepted
    #[error("Resolution timeout: {0}")]
    Timeout(String),
}

impl AnchorError {
    pub fn malformed_path(path: &str, reason: impl Into<String>) -> Self {
        AnchorError::MalformedPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the caller can reasonably try again (older anchor, fresh snapshot, re-selection)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AnchorError::PathNotFound(_)
                | AnchorError::StrategyFailed { .. }
                | AnchorError::ResolutionFailure(_)
                | AnchorError::Timeout(_)
        )
    }

    /// Get error severity (0=low, 1=medium, 2=high)
    pub fn severity(&self) -> u8 {
        match self {
            AnchorError::InvalidSelection(_) | AnchorError::InvalidAnchor(_) => 2,
            AnchorError::UnreachableNode(_)
            | AnchorError::MalformedPath { .. }
            | AnchorError::StrategyFailed { .. }
            | AnchorError::Timeout(_) => 1,
            AnchorError::PathNotFound(_) | AnchorError::ResolutionFailure(_) => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_failures_are_recoverable() {
        assert!(AnchorError::ResolutionFailure("none".into()).is_recoverable());
        assert!(AnchorError::Timeout("50ms".into()).is_recoverable());
        assert!(!AnchorError::InvalidSelection("empty".into()).is_recoverable());
    }

    #[test]
    fn malformed_path_message_names_path() {
        let err = AnchorError::malformed_path("root[1", "missing leading '/'");
        assert_eq!(
            err.to_string(),
            "Malformed structural path 'root[1': missing leading '/'"
        );
        assert_eq!(err.severity(), 1);
    }
}
