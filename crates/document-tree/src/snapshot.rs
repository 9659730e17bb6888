//! Arena-backed immutable document snapshot.

use textanchor_core_types::NodeId;
use tracing::debug;

use crate::errors::TreeError;
use crate::model::NodeSpec;
use crate::tree::DocumentTree;

/// Tag given to text-bearing leaf nodes.
pub const TEXT_TAG: &str = "#text";

#[derive(Clone, Debug)]
struct NodeData {
    tag: String,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// Document snapshot stored as a flat arena; ids are arena indices.
#[derive(Clone, Debug)]
pub struct SnapshotTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SnapshotTree {
    /// Start a tree whose root element has `root_tag`.
    pub fn new(root_tag: impl Into<String>) -> Result<Self, TreeError> {
        let tag = root_tag.into();
        if tag.trim().is_empty() {
            return Err(TreeError::EmptyTag);
        }
        Ok(Self {
            nodes: vec![NodeData {
                tag,
                text: None,
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
        })
    }

    pub fn from_spec(spec: &NodeSpec) -> Result<Self, TreeError> {
        if spec.text.is_some() {
            return Err(TreeError::Parse("root must be an element".to_string()));
        }
        let mut tree = Self::new(spec.resolved_tag()?)?;
        let root = tree.root;
        for child in &spec.children {
            tree.attach_spec(root, child)?;
        }
        debug!(nodes = tree.len(), "built snapshot tree");
        Ok(tree)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, TreeError> {
        Self::from_spec(&NodeSpec::from_json_str(raw)?)
    }

    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(TreeError::EmptyTag);
        }
        self.push(Some(parent), tag, None)
    }

    pub fn append_text(
        &mut self,
        parent: NodeId,
        text: impl Into<String>,
    ) -> Result<NodeId, TreeError> {
        self.push(Some(parent), TEXT_TAG.to_string(), Some(text.into()))
    }

    /// Node that lives in the arena but is not attached below the root.
    pub fn detached_element(&mut self, tag: impl Into<String>) -> Result<NodeId, TreeError> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(TreeError::EmptyTag);
        }
        self.push(None, tag, None)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Back to the nested description; detached nodes are dropped.
    pub fn to_spec(&self) -> NodeSpec {
        self.spec_of(self.root)
    }

    fn spec_of(&self, node: NodeId) -> NodeSpec {
        let data = &self.nodes[node.index()];
        match &data.text {
            Some(text) => NodeSpec::text(text.clone()),
            None => NodeSpec::element(
                data.tag.clone(),
                data.children.iter().map(|c| self.spec_of(*c)).collect(),
            ),
        }
    }

    fn attach_spec(&mut self, parent: NodeId, spec: &NodeSpec) -> Result<NodeId, TreeError> {
        let tag = spec.resolved_tag()?.to_string();
        let id = self.push(Some(parent), tag, spec.text.clone())?;
        if spec.text.is_some() && !spec.children.is_empty() {
            return Err(TreeError::TextNodeChildren(id));
        }
        for child in &spec.children {
            self.attach_spec(id, child)?;
        }
        Ok(id)
    }

    fn push(
        &mut self,
        parent: Option<NodeId>,
        tag: String,
        text: Option<String>,
    ) -> Result<NodeId, TreeError> {
        if let Some(parent) = parent {
            let data = self
                .nodes
                .get(parent.index())
                .ok_or(TreeError::UnknownNode(parent))?;
            if data.text.is_some() {
                return Err(TreeError::TextNodeChildren(parent));
            }
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag,
            text,
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.index()].children.push(id);
        }
        Ok(id)
    }
}

impl DocumentTree for SnapshotTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn contains(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.index()).and_then(|data| data.parent)
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.index())
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    fn tag(&self, node: NodeId) -> &str {
        self.nodes
            .get(node.index())
            .map(|data| data.tag.as_str())
            .unwrap_or("")
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        self.nodes
            .get(node.index())
            .and_then(|data| data.text.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SnapshotTree {
        let mut tree = SnapshotTree::new("article").unwrap();
        let root = tree.root();
        let p = tree.append_element(root, "p").unwrap();
        tree.append_text(p, "Hello ").unwrap();
        let em = tree.append_element(p, "em").unwrap();
        tree.append_text(em, "brave").unwrap();
        tree.append_text(p, " world").unwrap();
        tree
    }

    #[test]
    fn text_content_follows_document_order() {
        let tree = sample();
        assert_eq!(tree.text_content(tree.root()), "Hello brave world");
    }

    #[test]
    fn text_nodes_cannot_take_children() {
        let mut tree = sample();
        let text = tree.text_nodes(tree.root())[0];
        assert_eq!(
            tree.append_element(text, "b"),
            Err(TreeError::TextNodeChildren(text))
        );
    }

    #[test]
    fn detached_nodes_are_not_reachable() {
        let mut tree = sample();
        let orphan = tree.detached_element("div").unwrap();
        assert!(tree.contains(orphan));
        assert!(!tree.is_reachable(orphan));
        assert!(tree.is_reachable(tree.text_nodes(tree.root())[1]));
    }

    #[test]
    fn unknown_ids_read_as_empty() {
        let tree = sample();
        let missing = NodeId(999);
        assert!(!tree.contains(missing));
        assert_eq!(tree.tag(missing), "");
        assert!(tree.children(missing).is_empty());
        assert!(tree.descendants(missing).is_empty());
    }

    #[test]
    fn spec_round_trip_keeps_structure() {
        let tree = sample();
        let rebuilt = SnapshotTree::from_spec(&tree.to_spec()).unwrap();
        assert_eq!(rebuilt.len(), tree.len());
        assert_eq!(rebuilt.text_content(rebuilt.root()), "Hello brave world");
    }
}
