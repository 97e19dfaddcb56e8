use crate::{get_zero_hash, hash, hash_concat, Hash256, BYTES_PER_CHUNK, MERKLE_HASH_CHUNK};

/// Merkleize `bytes` and return the root, optionally padding the tree out to `min_leaves`
/// number of leaves.
///
/// First all nodes are extracted from `bytes` and then padding nodes are added until the
/// number of leaf chunks is greater than or equal to `min_leaves`. Callers may set
/// `min_leaves` to `0` if no additional chunks should be added to the given `bytes`.
///
/// If `bytes.len() <= BYTES_PER_CHUNK`, no hashing is done and `bytes` is returned, potentially
/// padded out to `BYTES_PER_CHUNK` length with `0`.
///
/// ## CPU Performance
///
/// Padding nodes are read from the zero-hash cache, so adding them only incurs one more hash
/// per additional height of the tree.
///
/// ## Memory Performance
///
/// The scratch buffer only ever stores nodes with at least one non-padding descendant, and at
/// each height of the tree half of it is freed until a single node remains.
pub fn merkleize_padded(bytes: &[u8], min_leaves: usize) -> Hash256 {
    // If the bytes are just one chunk or less, pad to one chunk and return without hashing.
    if bytes.len() <= BYTES_PER_CHUNK && min_leaves <= 1 {
        let mut chunk = [0; BYTES_PER_CHUNK];
        chunk[..bytes.len()].copy_from_slice(bytes);
        return Hash256::from(chunk);
    }

    // The number of leaves that can be made directly from `bytes`.
    let leaves_with_values = (bytes.len() + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK;

    // The number of parents that have at least one non-padding leaf.
    //
    // Since there is more than one node in this tree (see prior exit), there is always one or
    // more initial parent node.
    let initial_parents_with_values = std::cmp::max(1, next_even_number(leaves_with_values) / 2);

    // The number of leaves in the full tree (including padding nodes).
    let num_leaves = std::cmp::max(leaves_with_values, min_leaves).next_power_of_two();

    // The number of levels in the tree.
    //
    // A tree with a single node has `height == 1`.
    let height = num_leaves.trailing_zeros() as usize + 1;

    // A buffer/scratch-space used for storing each round of hashes at each height.
    //
    // This buffer is kept as small as possible; it will shrink so it never stores a padding
    // node.
    let mut chunks: Vec<Hash256> = Vec::with_capacity(initial_parents_with_values);

    // First round of hashing: create a parent chunk for every two chunks in `bytes`, padding
    // the final pair with zeros where it runs past the end of the input.
    for i in 0..initial_parents_with_values {
        let start = i * MERKLE_HASH_CHUNK;

        let digest = match bytes.get(start..start + MERKLE_HASH_CHUNK) {
            // All bytes are available, hash as usual.
            Some(slice) => hash(slice),
            // Unable to get all the bytes, pad the tail out with zeros.
            None => {
                let mut preimage = bytes.get(start..).unwrap_or(&[]).to_vec();
                preimage.resize(MERKLE_HASH_CHUNK, 0);
                hash(&preimage)
            }
        };

        chunks.push(Hash256::from_slice(&digest));
    }

    // Iterate through all heights above the leaf nodes and either (a) hash two children or,
    // (b) hash a left child and a cached zero hash standing in for a right padding node.
    //
    // Skip the 0'th height because the leaves have already been processed, and the
    // highest height because the root does not require hashing.
    for height in 1..height - 1 {
        let parent_nodes = next_even_number(chunks.len()) / 2;

        for i in 0..parent_nodes {
            let left = chunks[2 * i];
            let right = chunks
                .get(2 * i + 1)
                .copied()
                .unwrap_or_else(|| get_zero_hash(height));

            chunks[i] = hash_concat(left.as_bytes(), right.as_bytes());
        }

        // Shrink the buffer to neatly fit the nodes created in this round.
        //
        // The number of `parent_nodes` is either decreasing or stable; it never increases.
        chunks.truncate(parent_nodes);
    }

    // A single chunk is left in the buffer and it is the Merkle root.
    chunks[0]
}

/// Returns the next even number following `n`. If `n` is even, `n` is returned.
fn next_even_number(n: usize) -> usize {
    n + n % 2
}
