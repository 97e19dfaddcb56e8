//! Persistent, incrementally updatable SSZ hashable collections.
//!
//! A [`HashableVector`] or [`HashableList`] pairs an immutable element sequence with the
//! Merkle tree over its serialized chunks. Editing an element produces a *new* collection that
//! shares every untouched tree node and element with its parent, and only rehashes the path
//! from the touched chunks to the root. Batches of edits are staged on an evolver and applied
//! in a single rebuild pass.
//!
//! How elements map onto tree leaves is described by a [`Sedes`] implementation supplied by
//! the caller: basic elements pack multiple to a chunk, composite elements contribute their
//! own hash tree root as a whole chunk.

mod chunking;
mod error;
mod hash_tree;
mod list;
mod sedes;
mod structure;
mod vector;

pub use chunking::{
    appended_chunks, num_padding_elements, update_element_in_chunk, update_elements_in_chunk,
    updated_chunks,
};
pub use error::Error;
pub use hash_tree::{ChunkVector, HashTree};
pub use list::{HashableList, ListEvolver};
pub use sedes::{LeafBytes, ListSedes, Sedes, VectorSedes};
pub use structure::{
    HashableStructure, HashableStructureEvolver, ResizableHashableStructureEvolver,
};
pub use vector::{HashableVector, VectorEvolver};

pub type Hash256 = ethereum_types::H256;
