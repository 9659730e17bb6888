//! Serializable description of a document tree.

use serde::{Deserialize, Serialize};

use crate::errors::TreeError;
use crate::snapshot::TEXT_TAG;

/// Nested, serde-friendly node description.
///
/// Text nodes carry `text` and may omit `tag` (it defaults to `#text`);
/// element nodes carry `tag` and `children`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn element(tag: impl Into<String>, children: Vec<NodeSpec>) -> Self {
        Self {
            tag: Some(tag.into()),
            text: None,
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            tag: None,
            text: Some(text.into()),
            children: Vec::new(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TreeError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Effective tag, defaulting text nodes to `#text`.
    pub fn resolved_tag(&self) -> Result<&str, TreeError> {
        match (self.tag.as_deref(), self.text.is_some()) {
            (Some(tag), _) if !tag.trim().is_empty() => Ok(tag),
            (None, true) => Ok(TEXT_TAG),
            _ => Err(TreeError::EmptyTag),
        }
    }

    /// Mutable access to a descendant by child-index chain, for building edited copies.
    pub fn child_mut(&mut self, chain: &[usize]) -> Option<&mut NodeSpec> {
        let mut current = self;
        for index in chain {
            current = current.children.get_mut(*index)?;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_nodes_default_their_tag() {
        let spec = NodeSpec::text("hello");
        assert_eq!(spec.resolved_tag().unwrap(), TEXT_TAG);
    }

    #[test]
    fn element_without_tag_is_rejected() {
        let spec = NodeSpec::default();
        assert_eq!(spec.resolved_tag(), Err(TreeError::EmptyTag));
    }

    #[test]
    fn parses_nested_json() {
        let spec = NodeSpec::from_json_str(
            r#"{"tag":"article","children":[{"tag":"p","children":[{"text":"Hi"}]}]}"#,
        )
        .unwrap();
        assert_eq!(spec.children[0].tag.as_deref(), Some("p"));
        assert_eq!(spec.children[0].children[0].text.as_deref(), Some("Hi"));
    }

    #[test]
    fn child_mut_follows_index_chain() {
        let mut spec = NodeSpec::element(
            "root",
            vec![NodeSpec::element("p", vec![NodeSpec::text("a")])],
        );
        spec.child_mut(&[0, 0]).unwrap().text = Some("b".into());
        assert_eq!(spec.children[0].children[0].text.as_deref(), Some("b"));
        assert!(spec.child_mut(&[3]).is_none());
    }
}
