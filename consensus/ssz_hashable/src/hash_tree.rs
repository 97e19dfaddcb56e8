use crate::{Error, Hash256};
use rpds::{HashTrieMap, HashTrieMapSync, Vector, VectorSync};
use tree_hash::{get_zero_hash, hash_concat};

/// The persistent chunk vector holding the leaves of a [`HashTree`].
pub type ChunkVector = VectorSync<Hash256>;

/// Internal nodes keyed by generalized index: the root is `1` and the children of node `i`
/// are `2i` and `2i + 1`. A leaf at position `j` sits at `2^depth + j`.
type NodeMap = HashTrieMapSync<usize, Hash256>;

/// A sparse, persistent padded binary Merkle tree over a vector of 32-byte chunks.
///
/// The tree has a fixed depth `d = ceil(log2(chunk_count))`, so missing leaves read as zero
/// chunks and missing internal nodes as the zero hash of their height. Only internal nodes
/// whose subtree contains a non-zero leaf are materialized; a structure with a small fill
/// ratio therefore stores O(non-zero leaves * depth) nodes regardless of capacity.
///
/// [`mset`](Self::mset) and [`extend`](Self::extend) return a new tree that shares every
/// untouched node and chunk with its predecessor, which stays valid indefinitely.
#[derive(Debug, Clone, PartialEq)]
pub struct HashTree {
    chunks: ChunkVector,
    nodes: NodeMap,
    root: Hash256,
    depth: usize,
    chunk_count: usize,
}

/// Smallest depth `d` such that `n <= 2^d`.
fn int_log(n: usize) -> usize {
    match n.checked_next_power_of_two() {
        Some(x) => x.trailing_zeros() as usize,
        None => 8 * std::mem::size_of::<usize>(),
    }
}

/// Compute the dirty positions one layer up.
fn lift_dirty(dirty_indices: &[usize]) -> Vec<usize> {
    let mut new_dirty: Vec<usize> = dirty_indices.iter().map(|index| index / 2).collect();
    new_dirty.dedup();
    new_dirty
}

impl HashTree {
    /// Build a tree from scratch with leaf capacity for `chunk_count` chunks.
    ///
    /// An empty input is treated as a single zero chunk. Supplying more chunks than
    /// `chunk_count` is a programming error and fails with `CapacityExceeded`.
    pub fn compute(chunks: &[Hash256], chunk_count: usize) -> Result<Self, Error> {
        let zero_chunk = [Hash256::zero()];
        let chunks = if chunks.is_empty() {
            &zero_chunk[..]
        } else {
            chunks
        };

        let chunk_count = std::cmp::max(chunk_count, 1);
        if chunks.len() > chunk_count {
            return Err(Error::CapacityExceeded {
                len: chunks.len(),
                capacity: chunk_count,
            });
        }

        let depth = int_log(chunk_count);

        let empty = HashTree {
            chunks: Vector::new_sync(),
            nodes: HashTrieMap::new_sync(),
            root: get_zero_hash(depth),
            depth,
            chunk_count,
        };

        let mut leaves = Vector::new_sync();
        for chunk in chunks {
            leaves.push_back_mut(*chunk);
        }

        empty.rebuild(leaves, (0..chunks.len()).collect())
    }

    /// The Merkle root over the full padded tree.
    pub fn root(&self) -> Hash256 {
        self.root
    }

    /// The leaves of the tree, excluding padding.
    pub fn chunks(&self) -> &ChunkVector {
        &self.chunks
    }

    /// The chunk at leaf position `index`, if populated.
    pub fn chunk(&self, index: usize) -> Option<&Hash256> {
        self.chunks.get(index)
    }

    /// The number of populated leaves.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.len() == 0
    }

    /// The fixed tree depth; leaf capacity is `2^depth`.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// The leaf capacity requested at construction.
    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// The number of materialized internal nodes (zero subtrees are never stored).
    pub fn num_internal_nodes(&self) -> usize {
        self.nodes.size()
    }

    /// Replace a batch of chunks at the given leaf positions.
    ///
    /// Returns a new tree sharing all untouched nodes with `self`. Positions must lie within
    /// the populated chunk vector.
    pub fn mset(&self, pairs: &[(usize, Hash256)]) -> Result<Self, Error> {
        if pairs.is_empty() {
            return Ok(self.clone());
        }

        let mut chunks = self.chunks.clone();
        let mut dirty = Vec::with_capacity(pairs.len());

        for &(index, chunk) in pairs {
            if !chunks.set_mut(index, chunk) {
                return Err(Error::IndexOutOfRange {
                    index,
                    len: self.chunks.len(),
                });
            }
            dirty.push(index);
        }

        self.rebuild(chunks, dirty)
    }

    /// Append chunks after the current leaves, returning a new tree.
    ///
    /// The total number of leaves must stay within the `2^depth` capacity.
    pub fn extend(&self, new_chunks: &[Hash256]) -> Result<Self, Error> {
        if new_chunks.is_empty() {
            return Ok(self.clone());
        }

        let capacity = 1usize << self.depth;
        if self.chunks.len() + new_chunks.len() > capacity {
            return Err(Error::CapacityExceeded {
                len: self.chunks.len() + new_chunks.len(),
                capacity,
            });
        }

        let mut chunks = self.chunks.clone();
        let mut dirty = Vec::with_capacity(new_chunks.len());

        for chunk in new_chunks {
            dirty.push(chunks.len());
            chunks.push_back_mut(*chunk);
        }

        self.rebuild(chunks, dirty)
    }

    /// Recompute the internal nodes above the `dirty` leaf positions over the final chunk
    /// vector `chunks`.
    ///
    /// Children of an affected parent resolve from the nodes recomputed so far, then from the
    /// predecessor's node map, then from the zero-hash table. Nodes that hash to the zero hash
    /// of their level are dropped from the map so zero subtrees stay unmaterialized.
    fn rebuild(&self, chunks: ChunkVector, mut dirty: Vec<usize>) -> Result<Self, Error> {
        dirty.sort_unstable();
        dirty.dedup();

        if dirty.is_empty() {
            return Ok(self.clone());
        }

        let mut nodes = self.nodes.clone();

        for level in 1..=self.depth {
            dirty = lift_dirty(&dirty);

            for &position in &dirty {
                let left = node_digest(&chunks, &nodes, self.depth, level - 1, 2 * position);
                let right =
                    node_digest(&chunks, &nodes, self.depth, level - 1, 2 * position + 1);
                let digest = hash_concat(left.as_bytes(), right.as_bytes());

                let gen_index = (1usize << (self.depth - level)) + position;
                if digest == get_zero_hash(level) {
                    nodes.remove_mut(&gen_index);
                } else {
                    nodes.insert_mut(gen_index, digest);
                }
            }
        }

        let root = node_digest(&chunks, &nodes, self.depth, self.depth, 0);

        Ok(HashTree {
            chunks,
            nodes,
            root,
            depth: self.depth,
            chunk_count: self.chunk_count,
        })
    }
}

/// Resolve the digest of the node at `(level, position)`, where level 0 holds the leaves and
/// `depth` the root. Unpopulated positions read as the zero hash of their level.
fn node_digest(
    chunks: &ChunkVector,
    nodes: &NodeMap,
    depth: usize,
    level: usize,
    position: usize,
) -> Hash256 {
    if level == 0 {
        chunks.get(position).copied().unwrap_or_else(Hash256::zero)
    } else {
        let gen_index = (1usize << (depth - level)) + position;
        nodes
            .get(&gen_index)
            .copied()
            .unwrap_or_else(|| get_zero_hash(level))
    }
}
