//! Merkle Tree construction, queries and mutation.

use crate::{
    error::Error,
    hash::{MerkleHasher, TruncatedSha256},
    node::{Node, NodeIndex},
};
use log::{debug, trace};

/// Binary merkle tree over an ordered sequence of data blocks.
///
/// Nodes live in an arena: the leaves occupy slots `0..num_leaves()` in
/// insertion order and internal nodes are appended level by level above
/// them. When a level has an odd number of nodes the last one is moved up
/// to the next level as is, without being re-hashed or paired with itself,
/// so a leaf's parent may sit more than one level above it.
#[derive(Debug, Clone)]
pub struct MerkleTree<H: MerkleHasher = TruncatedSha256> {
    hasher: H,
    pub(crate) nodes: Vec<Node<H::Hash>>,
    root: NodeIndex,
    leaf_count: usize,
}

impl MerkleTree<TruncatedSha256> {
    /// Build a tree from raw data blocks using truncated SHA-256
    pub fn new<I, B>(blocks: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        Self::with_hasher(blocks, TruncatedSha256)
    }
}

impl<H: MerkleHasher> MerkleTree<H> {
    /// Build a tree from raw data blocks, hashing each block with `hasher`
    pub fn with_hasher<I, B>(blocks: I, hasher: H) -> Result<Self, Error>
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let leaves = blocks
            .into_iter()
            .map(|block| hasher.hash(block.as_ref()))
            .collect();
        Self::from_leaf_hashes(leaves, hasher)
    }

    /// Build a tree from already hashed leaves
    pub fn from_leaf_hashes(leaves: Vec<H::Hash>, hasher: H) -> Result<Self, Error> {
        if leaves.is_empty() {
            return Err(Error::EmptyInput);
        }
        let leaf_count = leaves.len();
        let (nodes, root) = build_nodes(&hasher, leaves);
        debug!(
            "Built merkle tree with {} leaves and {} nodes",
            leaf_count,
            nodes.len()
        );
        Ok(Self {
            hasher,
            nodes,
            root,
            leaf_count,
        })
    }

    /// Get the merkle root of the tree
    pub fn root(&self) -> &H::Hash {
        &self.nodes[self.root].digest
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Get the number of leaves in the tree
    pub fn num_leaves(&self) -> usize {
        self.leaf_count
    }

    /// Get a node of the arena by index
    pub fn node(&self, index: NodeIndex) -> Option<&Node<H::Hash>> {
        self.nodes.get(index)
    }

    /// Arena index of the root node
    pub fn root_index(&self) -> NodeIndex {
        self.root
    }

    /// Get the digest of a leaf by its position
    pub fn get_leaf(&self, leaf_index: usize) -> Result<&H::Hash, Error> {
        self.leaf_exists(leaf_index)?;
        Ok(&self.nodes[leaf_index].digest)
    }

    /// Collect the leaf digests from left to right
    pub fn leaves(&self) -> Vec<H::Hash> {
        let mut leaves = Vec::with_capacity(self.leaf_count);
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match node.children {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => leaves.push(node.digest.clone()),
            }
        }
        leaves
    }

    /// Number of nodes on the longest root to leaf path, a lone leaf has depth 1
    pub fn max_depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(self.root, 1)];
        while let Some((index, depth)) = stack.pop() {
            match self.nodes[index].children {
                Some((left, right)) => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
                None => max_depth = max_depth.max(depth),
            }
        }
        max_depth
    }

    /// Replace the first leaf (in left-to-right order) whose digest matches
    /// `old_data` with the digest of `new_data` and re-hash its ancestors.
    ///
    /// When the same block appears more than once only the leftmost
    /// occurrence is replaced. Returns `false` and leaves the tree untouched
    /// when no leaf matches.
    pub fn update(&mut self, new_data: impl AsRef<[u8]>, old_data: impl AsRef<[u8]>) -> bool {
        let old_hash = self.hasher.hash(old_data.as_ref());
        let Some(leaf) = self.find_leaf(&old_hash) else {
            debug!("No leaf matches {:?}, tree left unchanged", old_hash);
            return false;
        };
        self.nodes[leaf].digest = self.hasher.hash(new_data.as_ref());
        self.rehash_ancestors(leaf);
        true
    }

    /// Set the leaf at `leaf_index` to the digest of `new_data`
    pub fn update_at(
        &mut self,
        leaf_index: usize,
        new_data: impl AsRef<[u8]>,
    ) -> Result<(), Error> {
        self.leaf_exists(leaf_index)?;
        self.nodes[leaf_index].digest = self.hasher.hash(new_data.as_ref());
        self.rehash_ancestors(leaf_index);
        Ok(())
    }

    /// Append a block as the new rightmost leaf.
    ///
    /// The whole tree is rebuilt from the extended leaf sequence, so the
    /// shape may change beyond the new leaf's path.
    pub fn push(&mut self, data: impl AsRef<[u8]>) {
        self.extend([data]);
    }

    /// Append several blocks, rebuilding the tree once
    pub fn extend<I, B>(&mut self, blocks: I)
    where
        I: IntoIterator<Item = B>,
        B: AsRef<[u8]>,
    {
        let mut leaves = self.leaves();
        let before = leaves.len();
        leaves.extend(blocks.into_iter().map(|block| self.hasher.hash(block.as_ref())));
        if leaves.len() == before {
            return;
        }
        self.leaf_count = leaves.len();
        let (nodes, root) = build_nodes(&self.hasher, leaves);
        self.nodes = nodes;
        self.root = root;
        debug!(
            "Rebuilt merkle tree with {} leaves ({} appended)",
            self.leaf_count,
            self.leaf_count - before
        );
    }

    /// Depth first search for the leftmost leaf carrying `digest`
    pub(crate) fn find_leaf(&self, digest: &H::Hash) -> Option<NodeIndex> {
        let mut stack = vec![self.root];
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            match node.children {
                Some((left, right)) => {
                    // Left is popped first
                    stack.push(right);
                    stack.push(left);
                }
                None if &node.digest == digest => return Some(index),
                None => {}
            }
        }
        None
    }

    /// Recompute every digest on the path from `index` up to the root
    fn rehash_ancestors(&mut self, mut index: NodeIndex) {
        while let Some(parent) = self.nodes[index].parent {
            if let Some((left, right)) = self.nodes[parent].children {
                let digest = self.hasher.hash_pair(
                    self.nodes[left].digest.as_ref(),
                    self.nodes[right].digest.as_ref(),
                );
                self.nodes[parent].digest = digest;
            }
            index = parent;
        }
    }

    /// Ensure the leaf is a member of the tree
    fn leaf_exists(&self, leaf_index: usize) -> Result<(), Error> {
        if leaf_index >= self.leaf_count {
            return Err(Error::ExceededMaxIndex(leaf_index, self.leaf_count));
        }
        Ok(())
    }
}

/// Fold a non-empty level of leaves pairwise up to a single root.
/// Returns the arena and the index of the root within it.
fn build_nodes<H: MerkleHasher>(
    hasher: &H,
    leaves: Vec<H::Hash>,
) -> (Vec<Node<H::Hash>>, NodeIndex) {
    let mut nodes: Vec<Node<H::Hash>> = leaves.into_iter().map(Node::leaf).collect();
    let mut level: Vec<NodeIndex> = (0..nodes.len()).collect();

    while level.len() > 1 {
        trace!("Folding level of {} nodes", level.len());
        let mut next_level = Vec::with_capacity(level.len().div_ceil(2));
        for pair in level.chunks(2) {
            if let [left, right] = *pair {
                let digest =
                    hasher.hash_pair(nodes[left].digest.as_ref(), nodes[right].digest.as_ref());
                let parent = nodes.len();
                nodes[left].parent = Some(parent);
                nodes[right].parent = Some(parent);
                nodes.push(Node::internal(digest, left, right));
                next_level.push(parent);
            } else {
                // Odd node out moves up unchanged
                next_level.push(pair[0]);
            }
        }
        level = next_level;
    }
    (nodes, level[0])
}
