//! Read-only document trees for the anchoring engine.
//!
//! The engine never touches a live document. Callers hand it a snapshot
//! through the [`DocumentTree`] walk abstraction; [`SnapshotTree`] is the
//! arena-backed implementation used by the CLI and the tests.

pub mod errors;
pub mod model;
pub mod snapshot;
pub mod tree;

pub use errors::TreeError;
pub use model::NodeSpec;
pub use snapshot::{SnapshotTree, TEXT_TAG};
pub use tree::DocumentTree;

pub use textanchor_core_types::NodeId;
