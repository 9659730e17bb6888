use textanchor_core_types::NodeId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TreeError {
    #[error("node {0} does not exist in this snapshot")]
    UnknownNode(NodeId),
    #[error("node tag must not be empty")]
    EmptyTag,
    #[error("text node {0} cannot have children")]
    TextNodeChildren(NodeId),
    #[error("tree description is invalid: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for TreeError {
    fn from(err: serde_json::Error) -> Self {
        TreeError::Parse(err.to_string())
    }
}
