//! Hash functions used to build and verify trees

use crate::error::Error;
use blake2::Blake2s256;
use sha2::{
    digest::{Digest, Output},
    Sha256,
};
use sha3::Sha3_256;
use std::{fmt, marker::PhantomData, ops::Deref};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Width in bytes of the default truncated SHA-256 digest
pub const MERKLE_HASH_LEN: usize = 16;

/// Strategy mapping arbitrary bytes to a fixed width digest.
///
/// A tree keeps the hasher it was built with. Verification must be given
/// the same hasher; nothing in a digest records which function made it.
pub trait MerkleHasher {
    type Hash: AsRef<[u8]> + Clone + Eq + fmt::Debug;

    /// Hash a single data block
    fn hash(&self, data: &[u8]) -> Self::Hash;

    /// Hash the concatenation `left ++ right`
    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Self::Hash {
        self.hash(&[left, right].concat())
    }
}

/// SHA-256 truncated to its first 16 bytes (128 bit security target).
/// This is the hasher trees use unless another one is supplied.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TruncatedSha256;

impl MerkleHasher for TruncatedSha256 {
    type Hash = MerkleHash;

    fn hash(&self, data: &[u8]) -> MerkleHash {
        MerkleHash::truncate(&Sha256::digest(data))
    }

    fn hash_pair(&self, left: &[u8], right: &[u8]) -> MerkleHash {
        let mut hasher = Sha256::new();
        hasher.update(left);
        hasher.update(right);
        MerkleHash::truncate(&hasher.finalize())
    }
}

/// Adapter turning any RustCrypto [`Digest`] into a [`MerkleHasher`]
/// producing the digest's full output.
pub struct DigestHasher<D>(PhantomData<fn() -> D>);

pub type Sha3Hasher = DigestHasher<Sha3_256>;
pub type Blake2sHasher = DigestHasher<Blake2s256>;

impl<D> DigestHasher<D> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<D> Default for DigestHasher<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for DigestHasher<D> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<D> Copy for DigestHasher<D> {}

impl<D> fmt::Debug for DigestHasher<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DigestHasher<{}>", std::any::type_name::<D>())
    }
}

impl<D: Digest> MerkleHasher for DigestHasher<D> {
    type Hash = Output<D>;

    fn hash(&self, data: &[u8]) -> Output<D> {
        D::digest(data)
    }

    fn hash_pair(&self, left: &[u8], right: &[u8]) -> Output<D> {
        D::new().chain_update(left).chain_update(right).finalize()
    }
}

/// Wraps a plain function or closure as a hasher. The closure must be
/// deterministic and always return the same number of bytes.
#[derive(Clone, Copy)]
pub struct FnHasher<F>(pub F);

impl<F> fmt::Debug for FnHasher<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnHasher")
    }
}

impl<F> MerkleHasher for FnHasher<F>
where
    F: Fn(&[u8]) -> Vec<u8>,
{
    type Hash = Vec<u8>;

    fn hash(&self, data: &[u8]) -> Vec<u8> {
        (self.0)(data)
    }
}

/// Container for truncated SHA-256 digests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MerkleHash(pub [u8; MERKLE_HASH_LEN]);

impl MerkleHash {
    fn truncate(digest: &[u8]) -> Self {
        let mut result = [0u8; MERKLE_HASH_LEN];
        result.copy_from_slice(&digest[..MERKLE_HASH_LEN]);
        MerkleHash(result)
    }
}

impl Deref for MerkleHash {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for MerkleHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; MERKLE_HASH_LEN]> for MerkleHash {
    fn from(value: [u8; MERKLE_HASH_LEN]) -> Self {
        MerkleHash(value)
    }
}

impl TryFrom<&[u8]> for MerkleHash {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes = <[u8; MERKLE_HASH_LEN]>::try_from(value)
            .map_err(|_| Error::InvalidHashLength(MERKLE_HASH_LEN, value.len()))?;
        Ok(MerkleHash(bytes))
    }
}

impl PartialEq<[u8; MERKLE_HASH_LEN]> for MerkleHash {
    fn eq(&self, other: &[u8; MERKLE_HASH_LEN]) -> bool {
        &self.0 == other
    }
}

impl fmt::Display for MerkleHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
