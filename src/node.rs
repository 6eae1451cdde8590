//! Arena nodes of a merkle tree

/// Position of a node inside the tree's arena
pub type NodeIndex = usize;

/// A node is either a leaf (no children) or an internal node owning
/// exactly two children. Nodes never have a single child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<T> {
    pub(crate) digest: T,
    pub(crate) children: Option<(NodeIndex, NodeIndex)>,
    pub(crate) parent: Option<NodeIndex>,
}

impl<T> Node<T> {
    pub(crate) fn leaf(digest: T) -> Self {
        Self {
            digest,
            children: None,
            parent: None,
        }
    }

    pub(crate) fn internal(digest: T, left: NodeIndex, right: NodeIndex) -> Self {
        Self {
            digest,
            children: Some((left, right)),
            parent: None,
        }
    }

    pub fn digest(&self) -> &T {
        &self.digest
    }

    /// Left and right child indices of an internal node
    pub fn children(&self) -> Option<(NodeIndex, NodeIndex)> {
        self.children
    }

    pub fn parent(&self) -> Option<NodeIndex> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}
