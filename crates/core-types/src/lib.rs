//! Shared primitives for the textanchor engine.
//!
//! These types form the contract between the anchoring engine and its
//! collaborators: the selection-capture side hands in a [`TextSelection`],
//! persistence stores the resulting [`Anchor`] verbatim, and highlighting
//! consumes a resolved [`Span`].

use std::fmt;
use std::ops::Range;

/// Arena index of a node inside one document snapshot.
///
/// Identities are only meaningful for the snapshot that produced them and
/// are recomputed per call.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Opaque logical identifier (message id, section id, ...) owned by the caller.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(transparent))]
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct ContainerId(pub String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Anchoring strategy, in descending precision / ascending resilience order.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(from = "String", into = "String"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AnchorStrategy {
    /// Structural path from the document root.
    PathBased,
    /// Character offset inside the container's flattened text.
    OffsetBased,
    /// Approximate text search.
    FuzzyMatch,
    /// Any value a newer or older writer stored that this engine does not know.
    Unrecognized,
}

impl AnchorStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            AnchorStrategy::PathBased => "path-based",
            AnchorStrategy::OffsetBased => "offset-based",
            AnchorStrategy::FuzzyMatch => "fuzzy-match",
            AnchorStrategy::Unrecognized => "unrecognized",
        }
    }

    /// All resolvable strategies in fallback order.
    pub fn fallback_chain() -> Vec<AnchorStrategy> {
        vec![
            AnchorStrategy::PathBased,
            AnchorStrategy::OffsetBased,
            AnchorStrategy::FuzzyMatch,
        ]
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, AnchorStrategy::Unrecognized)
    }

    /// Name used in persisted anchors.
    pub fn wire_name(&self) -> &'static str {
        match self {
            AnchorStrategy::PathBased => "PathBased",
            AnchorStrategy::OffsetBased => "OffsetBased",
            AnchorStrategy::FuzzyMatch => "FuzzyMatch",
            AnchorStrategy::Unrecognized => "Unrecognized",
        }
    }

    pub fn from_wire_name(value: &str) -> Self {
        match value {
            "PathBased" => AnchorStrategy::PathBased,
            "OffsetBased" => AnchorStrategy::OffsetBased,
            "FuzzyMatch" => AnchorStrategy::FuzzyMatch,
            _ => AnchorStrategy::Unrecognized,
        }
    }
}

impl From<String> for AnchorStrategy {
    fn from(value: String) -> Self {
        AnchorStrategy::from_wire_name(&value)
    }
}

impl From<AnchorStrategy> for String {
    fn from(value: AnchorStrategy) -> Self {
        value.wire_name().to_string()
    }
}

impl fmt::Display for AnchorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Persisted, strategy-tagged descriptor of a text span's location.
///
/// Anchors are immutable once created; a changed selection produces a new
/// anchor rather than an edited one.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, PartialEq)]
pub struct Anchor {
    pub selected_text: String,
    /// Char offset of the selection inside the container's flattened text.
    pub start_offset: usize,
    pub end_offset: usize,
    pub structural_path: String,
    pub container_id: ContainerId,
    pub context_before: String,
    pub context_after: String,
    pub content_checksum: String,
    pub confidence: f64,
    pub strategy: AnchorStrategy,
}

impl Anchor {
    /// Selection length in characters as recorded by the offsets.
    pub fn span_len(&self) -> usize {
        self.end_offset.saturating_sub(self.start_offset)
    }

    pub fn has_context(&self) -> bool {
        !self.context_before.is_empty() || !self.context_after.is_empty()
    }
}

/// A user selection captured against the current document, input to anchor creation.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct TextSelection {
    pub selected_text: String,
    /// Node whose subtree owns the selection.
    pub container: NodeId,
    /// Char range inside the container's flattened text, when the capturing side knows it.
    pub range: Option<Range<usize>>,
    pub context_before: String,
    pub context_after: String,
    pub container_id: ContainerId,
}

impl TextSelection {
    pub fn new(
        selected_text: impl Into<String>,
        container: NodeId,
        container_id: impl Into<String>,
    ) -> Self {
        Self {
            selected_text: selected_text.into(),
            container,
            range: None,
            context_before: String::new(),
            context_after: String::new(),
            container_id: ContainerId::new(container_id),
        }
    }

    pub fn with_range(mut self, range: Range<usize>) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_context(mut self, before: impl Into<String>, after: impl Into<String>) -> Self {
        self.context_before = before.into();
        self.context_after = after.into();
        self
    }
}

/// A point inside one text-bearing node, in characters.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TextPosition {
    pub node: NodeId,
    pub offset: usize,
}

impl TextPosition {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// Concrete location of text inside a specific document snapshot.
///
/// `end` is exclusive and may sit in a different node than `start` when the
/// text crosses node boundaries.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Span {
    pub container: NodeId,
    pub start: TextPosition,
    pub end: TextPosition,
    /// Char range inside the container's flattened text.
    pub range: Range<usize>,
    pub text: String,
}

impl Span {
    pub fn is_single_node(&self) -> bool {
        self.start.node == self.end.node
    }

    pub fn char_len(&self) -> usize {
        self.range.end.saturating_sub(self.range.start)
    }
}
