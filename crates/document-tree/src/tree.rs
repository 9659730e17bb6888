//! Tree walk abstraction consumed by the locators.

use textanchor_core_types::NodeId;

/// Read-only view over a hierarchical document.
///
/// Implementations must be stable for the duration of one engine call. Node
/// ids handed out by `root`/`children`/`parent` must be accepted by every
/// other accessor; lookups for ids the tree does not know return empty values.
pub trait DocumentTree {
    fn root(&self) -> NodeId;

    fn contains(&self, node: NodeId) -> bool;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children in document order.
    fn children(&self, node: NodeId) -> &[NodeId];

    fn tag(&self, node: NodeId) -> &str;

    /// Own text of a text-bearing node. Element nodes return `None`.
    fn text(&self, node: NodeId) -> Option<&str>;

    fn is_text_bearing(&self, node: NodeId) -> bool {
        self.text(node).is_some()
    }

    /// Pre-order walk of `node`'s subtree, `node` included.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(node) {
            return out;
        }
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Text-bearing nodes of `node`'s subtree in document order.
    fn text_nodes(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|id| self.is_text_bearing(*id))
            .collect()
    }

    /// Concatenated text of the subtree, in document order.
    fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        for id in self.text_nodes(node) {
            if let Some(text) = self.text(id) {
                out.push_str(text);
            }
        }
        out
    }

    /// Whether walking parents from `node` ends at the root.
    fn is_reachable(&self, node: NodeId) -> bool {
        if !self.contains(node) {
            return false;
        }
        let root = self.root();
        let mut current = node;
        loop {
            if current == root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }
}
