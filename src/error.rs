//! Merkle Tree Errors

use displaydoc::Display;

#[derive(Debug, Display, Clone, PartialEq, Eq)]
pub enum Error {
    /// A merkle tree needs at least one data block
    EmptyInput,
    /// Requested index: {0} exceeds number of leaves: {1}
    ExceededMaxIndex(usize, usize),
    /// Expected a digest of {0} bytes, received {1} bytes
    InvalidHashLength(usize, usize),
}

impl std::error::Error for Error {}
