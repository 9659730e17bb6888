pub mod create;
pub mod inspect;
pub mod io;
pub mod output;
pub mod resolve;
pub mod similarity;
pub mod validate;

pub use create::{cmd_create, CreateArgs};
pub use inspect::{cmd_inspect, InspectArgs};
pub use output::OutputFormat;
pub use resolve::{cmd_resolve, ResolveArgs};
pub use similarity::{cmd_similarity, SimilarityArgs};
pub use validate::{cmd_validate, ValidateArgs};
