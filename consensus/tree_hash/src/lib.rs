//! Hashing primitives for SSZ merkleization: the two-to-one hash, the cached zero-subtree
//! roots and the from-scratch padded merkleization of a byte string.

#[macro_use]
extern crate lazy_static;

mod merkleize_padded;

pub use eth2_hashing::hash;
pub use merkleize_padded::merkleize_padded;

use int_to_bytes::int_to_bytes32;

pub const BYTES_PER_CHUNK: usize = 32;
pub const HASHSIZE: usize = 32;
pub const MERKLE_HASH_CHUNK: usize = 2 * BYTES_PER_CHUNK;

/// The maximum tree height supported by the zero-hash cache.
///
/// We panic if a tree exceeds it. It is set to 48 as we expect it to be sufficiently high for
/// any realistic collection size.
pub const MAX_TREE_DEPTH: usize = 48;

pub type Hash256 = ethereum_types::H256;

lazy_static! {
    /// Cached zero hashes where `ZERO_HASHES[i]` is the root of a Merkle tree with 2^i zero
    /// leaves.
    pub static ref ZERO_HASHES: Vec<Hash256> = {
        let mut hashes = vec![Hash256::zero(); MAX_TREE_DEPTH + 1];

        for i in 0..MAX_TREE_DEPTH {
            hashes[i + 1] = hash_concat(hashes[i].as_bytes(), hashes[i].as_bytes());
        }

        hashes
    };
}

/// Returns the cached root of an all-zero subtree of the given `height`.
pub fn get_zero_hash(height: usize) -> Hash256 {
    if height <= MAX_TREE_DEPTH {
        ZERO_HASHES[height]
    } else {
        panic!("Tree exceeds MAX_TREE_DEPTH of {}", MAX_TREE_DEPTH)
    }
}

/// Compute the hash of two 32-byte nodes concatenated.
pub fn hash_concat(h1: &[u8], h2: &[u8]) -> Hash256 {
    let mut preimage = [0; MERKLE_HASH_CHUNK];
    preimage[..BYTES_PER_CHUNK].copy_from_slice(h1);
    preimage[BYTES_PER_CHUNK..].copy_from_slice(h2);
    Hash256::from_slice(&hash(&preimage))
}

/// Returns the node created by hashing `root` and `length`.
///
/// Used for inserting the length of a list above its root.
pub fn mix_in_length(root: &Hash256, length: usize) -> Hash256 {
    hash_concat(root.as_bytes(), &int_to_bytes32(length as u64))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mix_length() {
        let hash = {
            let mut preimage = vec![42; BYTES_PER_CHUNK];
            preimage.push(42);
            preimage.resize(2 * BYTES_PER_CHUNK, 0);
            eth2_hashing::hash(&preimage)
        };

        assert_eq!(
            mix_in_length(&Hash256::from_slice(&[42; BYTES_PER_CHUNK]), 42).as_bytes(),
            &hash[..]
        );
    }

    #[test]
    fn zero_hashes_chain() {
        assert_eq!(ZERO_HASHES[0], Hash256::zero());

        for i in 0..MAX_TREE_DEPTH {
            assert_eq!(
                ZERO_HASHES[i + 1],
                hash_concat(ZERO_HASHES[i].as_bytes(), ZERO_HASHES[i].as_bytes())
            );
        }
    }
}
