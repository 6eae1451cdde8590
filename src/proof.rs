//! Merkle paths: generation from a tree and standalone verification.

use crate::{
    error::Error,
    hash::MerkleHasher,
    node::NodeIndex,
    tree::MerkleTree,
};
use log::trace;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which side of the running hash a sibling is concatenated on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Side {
    Left,
    Right,
}

/// Individual path element holding a sibling's digest
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PathElement<T> {
    pub side: Side,
    pub digest: T,
}

impl<T> PathElement<T> {
    pub fn new(side: Side, digest: T) -> Self {
        Self { side, digest }
    }
}

/// Inclusion proof for a single data block.
///
/// Elements run from the leaf's nearest sibling outward to the sibling of
/// the root's child. A path is self-contained: checking it needs only the
/// root digest, the data and the hasher the tree was built with.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MerklePath<T> {
    elements: Vec<PathElement<T>>,
}

impl<T> MerklePath<T> {
    pub fn new(elements: Vec<PathElement<T>>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathElement<T>> {
        self.elements.iter()
    }

    pub fn elements_mut(&mut self) -> &mut [PathElement<T>] {
        &mut self.elements
    }

    /// Sibling digests in path order
    pub fn digests(&self) -> impl Iterator<Item = &T> {
        self.elements.iter().map(|element| &element.digest)
    }

    /// Compute the implied Merkle Root Hash of `data` from the path
    pub fn compute_implied_root<H>(&self, hasher: &H, data: &[u8]) -> T
    where
        H: MerkleHasher<Hash = T>,
        T: AsRef<[u8]>,
    {
        self.elements
            .iter()
            .fold(hasher.hash(data), |running, element| match element.side {
                Side::Right => hasher.hash_pair(running.as_ref(), element.digest.as_ref()),
                Side::Left => hasher.hash_pair(element.digest.as_ref(), running.as_ref()),
            })
    }

    /// Check that `data` is committed to by `root`
    pub fn verify<H>(&self, hasher: &H, root: &T, data: &[u8]) -> bool
    where
        H: MerkleHasher<Hash = T>,
        T: AsRef<[u8]> + Eq,
    {
        &self.compute_implied_root(hasher, data) == root
    }
}

impl<'a, T> IntoIterator for &'a MerklePath<T> {
    type Item = &'a PathElement<T>;
    type IntoIter = std::slice::Iter<'a, PathElement<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Verify a merkle path without access to the tree that produced it
#[must_use = "Must use the result of the path verification"]
pub fn verify_path<H: MerkleHasher>(
    hasher: &H,
    root: &H::Hash,
    data: impl AsRef<[u8]>,
    path: &MerklePath<H::Hash>,
) -> bool {
    path.verify(hasher, root, data.as_ref())
}

impl<H: MerkleHasher> MerkleTree<H> {
    /// Generate the merkle path for `data`.
    ///
    /// Leaves are searched depth first, left subtree before right, and the
    /// first leaf whose digest equals the hash of `data` is used. If the
    /// same block was inserted more than once the path proves its leftmost
    /// occurrence. Returns `None` when no leaf matches.
    pub fn generate_path(&self, data: impl AsRef<[u8]>) -> Option<MerklePath<H::Hash>> {
        let target = self.hasher().hash(data.as_ref());
        let leaf = self.find_leaf(&target)?;
        trace!("Generating merkle path for leaf {}", leaf);
        Some(self.path_from(leaf))
    }

    /// Generate the merkle path for the leaf at `leaf_index`
    pub fn generate_path_at(&self, leaf_index: usize) -> Result<MerklePath<H::Hash>, Error> {
        self.get_leaf(leaf_index)?;
        Ok(self.path_from(leaf_index))
    }

    fn path_from(&self, mut index: NodeIndex) -> MerklePath<H::Hash> {
        let mut elements = Vec::new();
        while let Some(parent) = self.nodes[index].parent {
            if let Some((left, right)) = self.nodes[parent].children {
                let element = if left == index {
                    PathElement::new(Side::Right, self.nodes[right].digest.clone())
                } else {
                    PathElement::new(Side::Left, self.nodes[left].digest.clone())
                };
                elements.push(element);
            }
            index = parent;
        }
        MerklePath::new(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        hash::{Blake2sHasher, MerkleHash, Sha3Hasher, TruncatedSha256},
        test_utils::{h, hash_pair, tree_of},
    };
    use quickcheck::{quickcheck, TestResult};

    #[test]
    fn test_path_for_leftmost_leaf() {
        let tree = tree_of(&["hello", "world", "foo", "bar"]);
        let path = tree.generate_path("hello").unwrap();
        let digests: Vec<&MerkleHash> = path.digests().collect();
        assert_eq!(
            digests,
            vec![&h("world"), &hash_pair(&h("foo"), &h("bar"))]
        );
        assert!(path.iter().all(|element| element.side == Side::Right));
        assert!(verify_path(&TruncatedSha256, tree.root(), "hello", &path));
    }

    #[test]
    fn test_path_for_right_leaf() {
        let tree = tree_of(&["hello", "world", "foo", "bar"]);
        let path = tree.generate_path("bar").unwrap();
        assert_eq!(
            path,
            MerklePath::new(vec![
                PathElement::new(Side::Left, h("foo")),
                PathElement::new(Side::Left, hash_pair(&h("hello"), &h("world"))),
            ])
        );
        assert!(verify_path(&TruncatedSha256, tree.root(), "bar", &path));
        assert!(!verify_path(&TruncatedSha256, tree.root(), "foo", &path));
    }

    #[test]
    fn test_path_skips_carried_level() {
        // "e" is carried up twice and only meets a sibling at the root
        let tree = tree_of(&["a", "b", "c", "d", "e"]);
        let path = tree.generate_path("e").unwrap();
        assert_eq!(path.len(), 1);
        assert!(path.verify(tree.hasher(), tree.root(), b"e"));

        let path = tree.generate_path("a").unwrap();
        assert_eq!(path.len(), 3);
        assert_eq!(path.iter().last().unwrap().digest, h("e"));
    }

    #[test]
    fn test_single_leaf_path() {
        let tree = tree_of(&["hello"]);
        let path = tree.generate_path("hello").unwrap();
        assert!(path.is_empty());
        assert!(verify_path(&TruncatedSha256, tree.root(), "hello", &path));
        assert!(tree.generate_path("world").is_none());
    }

    #[test]
    fn test_path_not_found() {
        let tree = tree_of(&["hello", "world", "foo", "bar"]);
        assert!(tree.generate_path("baz").is_none());
        // Only raw data is hashed, a leaf digest is not itself a member
        assert!(tree.generate_path(h("hello")).is_none());
    }

    #[test]
    fn test_duplicate_leaf_uses_leftmost() {
        let tree = tree_of(&["x", "y", "z", "x"]);
        let path = tree.generate_path("x").unwrap();
        assert_eq!(path, tree.generate_path_at(0).unwrap());
        let last = tree.generate_path_at(3).unwrap();
        assert_ne!(path, last);
        assert!(verify_path(&TruncatedSha256, tree.root(), "x", &last));
        assert_eq!(tree.generate_path_at(4), Err(Error::ExceededMaxIndex(4, 4)));
    }

    #[test]
    fn test_tampered_path_fails() {
        let tree = tree_of(&["hello", "world", "foo", "bar", "baz"]);
        let path = tree.generate_path("foo").unwrap();
        assert!(verify_path(&TruncatedSha256, tree.root(), "foo", &path));
        assert!(!verify_path(&TruncatedSha256, tree.root(), "fop", &path));

        for i in 0..path.len() {
            let mut tampered = path.clone();
            tampered.elements_mut()[i].digest.0[0] ^= 1;
            assert!(!verify_path(&TruncatedSha256, tree.root(), "foo", &tampered));
        }
        let mut swapped = path.clone();
        swapped.elements_mut()[0].side = Side::Left;
        assert!(!verify_path(&TruncatedSha256, tree.root(), "foo", &swapped));
    }

    #[test]
    fn test_mismatched_hasher_fails() {
        let blocks = ["hello", "world", "foo"];
        let tree = MerkleTree::with_hasher(blocks, Sha3Hasher::new()).unwrap();
        let path = tree.generate_path("world").unwrap();
        assert!(verify_path(&Sha3Hasher::new(), tree.root(), "world", &path));
        assert!(!verify_path(&Blake2sHasher::new(), tree.root(), "world", &path));
    }

    #[test]
    fn test_path_after_mutation() {
        let mut tree = tree_of(&["hello", "world", "foo"]);
        assert!(tree.update("qux", "world"));
        let path = tree.generate_path("qux").unwrap();
        assert!(verify_path(&TruncatedSha256, tree.root(), "qux", &path));
        assert!(tree.generate_path("world").is_none());

        tree.push("bar");
        let path = tree.generate_path("foo").unwrap();
        assert_eq!(path.len(), 2);
        assert!(verify_path(&TruncatedSha256, tree.root(), "foo", &path));
    }

    #[test]
    fn prop_every_leaf_verifies() {
        fn prop(blocks: Vec<Vec<u8>>) -> TestResult {
            if blocks.is_empty() {
                return TestResult::discard();
            }
            let tree = MerkleTree::new(&blocks).unwrap();
            let all_verify = blocks.iter().all(|block| {
                tree.generate_path(block)
                    .map(|path| verify_path(&TruncatedSha256, tree.root(), block, &path))
                    .unwrap_or(false)
            });
            TestResult::from_bool(all_verify)
        }
        quickcheck(prop as fn(Vec<Vec<u8>>) -> TestResult);
    }

    #[test]
    fn prop_flipped_data_bit_fails() {
        fn prop(blocks: Vec<Vec<u8>>, pick: usize, bit: u8) -> TestResult {
            if blocks.is_empty() || blocks[pick % blocks.len()].is_empty() {
                return TestResult::discard();
            }
            let tree = MerkleTree::new(&blocks).unwrap();
            let block = &blocks[pick % blocks.len()];
            let path = tree.generate_path(block).unwrap();

            let mut tampered = block.clone();
            let position = pick % tampered.len();
            tampered[position] ^= 1 << (bit % 8);
            TestResult::from_bool(!verify_path(&TruncatedSha256, tree.root(), &tampered, &path))
        }
        quickcheck(prop as fn(Vec<Vec<u8>>, usize, u8) -> TestResult);
    }
}
