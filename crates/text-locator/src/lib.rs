//! Text anchoring - multi-strategy span re-location
//!
//! This crate implements the anchoring engine with:
//! - Structural path addressing (primary strategy)
//! - Character offsets in flattened container text (secondary)
//! - Staged approximate matching seeded with stored context (tertiary)
//! - Anchor creation with confidence scoring and a validation gate
//! - A time-budgeted fallback cascade with bounded resolution metrics

pub mod checksum;
pub mod coordinator;
pub mod errors;
pub mod flatten;
pub mod metrics;
pub mod normalize;
pub mod offset;
pub mod path;
pub mod policy;
pub mod similarity;
pub mod strategies;
pub mod types;

pub use checksum::{content_checksum, verify_checksum};
pub use coordinator::*;
pub use errors::*;
pub use flatten::{FlatText, Segment};
pub use metrics::*;
pub use offset::{compute_offset, find_text_range, is_offset_plausible, locate_by_offset};
pub use path::{build_path, is_well_formed, locate_text, locate_text_near, resolve_path};
pub use policy::EngineConfig;
pub use similarity::{calculate_similarity, FuzzyMatch, MatchContext, MatchStage, SimilarityMatcher};
pub use strategies::*;
pub use types::*;

pub use document_tree::{DocumentTree, SnapshotTree};
pub use textanchor_core_types::{
    Anchor, AnchorStrategy, ContainerId, NodeId, Span, TextPosition, TextSelection,
};
