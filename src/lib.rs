//! Binary Merkle Tree with inclusion proofs
//!
//! Builds a tree over an ordered sequence of data blocks, produces the root
//! digest committing to all of them, and generates paths proving that a
//! single block is part of the tree. Paths are checked with [`verify_path`]
//! using nothing but the root digest, the block and the hasher.
//!
//! ```
//! use binary_merkle_tree::{verify_path, MerkleTree, TruncatedSha256};
//!
//! let tree = MerkleTree::new(["hello", "world", "foo", "bar"]).unwrap();
//! let path = tree.generate_path("hello").unwrap();
//! assert_eq!(path.len(), 2);
//! assert!(verify_path(&TruncatedSha256, tree.root(), "hello", &path));
//! ```
//!
//! The tree does no internal synchronization; callers sharing one across
//! threads must serialize `update`/`push` against readers themselves.

mod error;
mod hash;
mod node;
mod proof;
mod tree;

pub use crate::{
    error::Error,
    hash::{
        Blake2sHasher, DigestHasher, FnHasher, MerkleHash, MerkleHasher, Sha3Hasher,
        TruncatedSha256, MERKLE_HASH_LEN,
    },
    node::{Node, NodeIndex},
    proof::{verify_path, MerklePath, PathElement, Side},
    tree::MerkleTree,
};
