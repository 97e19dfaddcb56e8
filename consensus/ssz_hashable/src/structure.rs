use crate::chunking::{appended_chunks, num_padding_elements, updated_chunks};
use crate::hash_tree::{ChunkVector, HashTree};
use crate::sedes::{LeafBytes, Sedes};
use crate::{Error, Hash256};
use rpds::{Vector, VectorSync};
use std::collections::BTreeMap;
use tree_hash::BYTES_PER_CHUNK;

/// An immutable element sequence paired with the Merkle tree over its serialized chunks.
///
/// This is the machinery shared by [`HashableVector`](crate::HashableVector) and
/// [`HashableList`](crate::HashableList). Every mutating operation returns a new structure
/// that shares untouched tree nodes and element spine with its parent; predecessors stay
/// valid and independently usable.
#[derive(Debug, Clone, PartialEq)]
pub struct HashableStructure<T, S> {
    elements: VectorSync<T>,
    hash_tree: HashTree,
    sedes: S,
}

impl<T: Clone, S: Sedes<T> + Clone> HashableStructure<T, S> {
    /// Build a structure by serializing every element of `iter` and merkleizing the packed
    /// chunks into a tree with the sedes' leaf capacity.
    pub fn from_iterable<I: IntoIterator<Item = T>>(iter: I, sedes: S) -> Result<Self, Error> {
        let mut elements = Vector::new_sync();
        for element in iter {
            elements.push_back_mut(element);
        }

        let serialized: Vec<LeafBytes> = elements
            .iter()
            .enumerate()
            .map(|(index, element)| sedes.serialize_leaf(index, element))
            .collect();

        // There are no pre-existing chunks, so no appends are absorbed as padding.
        let chunks = appended_chunks(&serialized, 0)?;
        let hash_tree = HashTree::compute(&chunks, sedes.chunk_count())?;

        Ok(HashableStructure {
            elements,
            hash_tree,
            sedes,
        })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.elements.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.elements.iter()
    }

    /// The persistent element sequence itself.
    pub fn elements(&self) -> &VectorSync<T> {
        &self.elements
    }

    pub fn hash_tree(&self) -> &HashTree {
        &self.hash_tree
    }

    /// The leaves of the backing tree.
    pub fn chunks(&self) -> &ChunkVector {
        self.hash_tree.chunks()
    }

    pub fn sedes(&self) -> &S {
        &self.sedes
    }

    /// The Merkle root of the chunk tree, before any length mixing.
    pub fn raw_root(&self) -> Hash256 {
        self.hash_tree.root()
    }

    /// Return a new structure with the element at `index` replaced by `value`.
    pub fn set(&self, index: usize, value: T) -> Result<Self, Error> {
        self.mset(std::iter::once((index, value)))
    }

    /// Return a new structure with a batch of `(index, value)` replacements applied.
    pub fn mset(&self, pairs: impl IntoIterator<Item = (usize, T)>) -> Result<Self, Error> {
        let mut evolver = self.evolver();
        for (index, value) in pairs {
            evolver.set(index, value)?;
        }
        evolver.persistent()
    }

    /// Return a new structure with `f` applied to the element at `index`.
    pub fn transform<F: FnOnce(&T) -> T>(&self, index: usize, f: F) -> Result<Self, Error> {
        let element = self.get(index).ok_or(Error::IndexOutOfRange {
            index,
            len: self.len(),
        })?;
        self.set(index, f(element))
    }

    /// Stage a batch of edits against this structure.
    pub fn evolver(&self) -> HashableStructureEvolver<'_, T, S> {
        HashableStructureEvolver::new(self)
    }
}

/// A single-threaded staging buffer that batches element edits and materializes them with one
/// tree rebuild, instead of paying a root-path rehash per edit.
///
/// `persistent` consumes the evolver; stage further edits by constructing a new evolver from
/// the structure it produced.
#[derive(Debug)]
pub struct HashableStructureEvolver<'a, T, S> {
    original: &'a HashableStructure<T, S>,
    updated_elements: BTreeMap<usize, T>,
    // Staged here but only exposed through the resizable evolver, so that `persistent`
    // handles both kinds of edit in one pipeline.
    appended_elements: Vec<T>,
}

impl<'a, T: Clone, S: Sedes<T> + Clone> HashableStructureEvolver<'a, T, S> {
    pub(crate) fn new(original: &'a HashableStructure<T, S>) -> Self {
        HashableStructureEvolver {
            original,
            updated_elements: BTreeMap::new(),
            appended_elements: Vec::new(),
        }
    }

    /// The element that `persistent` would place at `index`.
    pub fn get(&self, index: usize) -> Result<&T, Error> {
        if let Some(element) = self.updated_elements.get(&index) {
            Ok(element)
        } else if let Some(element) = self.original.get(index) {
            Ok(element)
        } else if let Some(element) = index
            .checked_sub(self.original.len())
            .and_then(|tail_index| self.appended_elements.get(tail_index))
        {
            Ok(element)
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    /// Stage a replacement of the element at `index`. A later set of the same index wins.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), Error> {
        if index < self.original.len() {
            self.updated_elements.insert(index, value);
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.original.len(),
            })
        }
    }

    /// The number of elements the materialized structure will hold.
    pub fn len(&self) -> usize {
        self.original.len() + self.appended_elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True iff any edit has been staged.
    pub fn is_dirty(&self) -> bool {
        !self.updated_elements.is_empty() || !self.appended_elements.is_empty()
    }

    pub(crate) fn original_len(&self) -> usize {
        self.original.len()
    }

    pub(crate) fn push(&mut self, value: T) {
        self.appended_elements.push(value);
    }

    pub(crate) fn set_appended(&mut self, tail_index: usize, value: T) -> bool {
        match self.appended_elements.get_mut(tail_index) {
            Some(element) => {
                *element = value;
                true
            }
            None => false,
        }
    }

    /// Materialize the staged edits into a new structure.
    ///
    /// Updates are serialized and folded into their existing chunks, appends fill the free
    /// tail of the last chunk and then form fresh chunks; the tree is rebuilt once over the
    /// affected leaf positions. A clean evolver hands back the original.
    pub fn persistent(self) -> Result<HashableStructure<T, S>, Error> {
        if !self.is_dirty() {
            return Ok(self.original.clone());
        }

        let original = self.original;
        let sedes = &original.sedes;

        let updated_bytes: BTreeMap<usize, LeafBytes> = self
            .updated_elements
            .iter()
            .map(|(&index, element)| (index, sedes.serialize_leaf(index, element)))
            .collect();
        let appended_bytes: Vec<LeafBytes> = self
            .appended_elements
            .iter()
            .enumerate()
            .map(|(offset, element)| sedes.serialize_leaf(original.len() + offset, element))
            .collect();

        // Any staged edit fixes the element size; `is_dirty` ruled out the empty case.
        let element_size = updated_bytes
            .values()
            .chain(appended_bytes.first())
            .next()
            .map(|bytes| bytes.len())
            .ok_or(Error::InvariantViolation {
                message: "dirty evolver with no staged edits",
            })?;
        if element_size == 0 || BYTES_PER_CHUNK % element_size != 0 {
            return Err(Error::InvalidElementSize { element_size });
        }

        let num_padding =
            num_padding_elements(original.chunks().len(), original.len(), element_size);

        let updated = updated_chunks(
            &updated_bytes,
            &appended_bytes,
            original.chunks(),
            original.len(),
        )?;
        let appended = appended_chunks(&appended_bytes, num_padding)?;

        let update_pairs: Vec<(usize, Hash256)> = updated.into_iter().collect();
        let hash_tree = original.hash_tree.mset(&update_pairs)?.extend(&appended)?;

        let mut elements = original.elements.clone();
        for (index, element) in self.updated_elements {
            if !elements.set_mut(index, element) {
                return Err(Error::InvariantViolation {
                    message: "staged update outside the element range",
                });
            }
        }
        for element in self.appended_elements {
            elements.push_back_mut(element);
        }

        Ok(HashableStructure {
            elements,
            hash_tree,
            sedes: original.sedes.clone(),
        })
    }
}

/// An evolver for resizable structures: additionally stages appends, and permits setting
/// elements within the appended tail.
#[derive(Debug)]
pub struct ResizableHashableStructureEvolver<'a, T, S> {
    inner: HashableStructureEvolver<'a, T, S>,
}

impl<'a, T: Clone, S: Sedes<T> + Clone> ResizableHashableStructureEvolver<'a, T, S> {
    pub(crate) fn new(original: &'a HashableStructure<T, S>) -> Self {
        ResizableHashableStructureEvolver {
            inner: HashableStructureEvolver::new(original),
        }
    }

    /// The element that `persistent` would place at `index`.
    pub fn get(&self, index: usize) -> Result<&T, Error> {
        self.inner.get(index)
    }

    /// Stage a replacement at `index`, which may point into the appended tail.
    pub fn set(&mut self, index: usize, value: T) -> Result<(), Error> {
        let original_len = self.inner.original_len();
        if index < original_len {
            self.inner.set(index, value)
        } else if self.inner.set_appended(index - original_len, value) {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.inner.len(),
            })
        }
    }

    /// Stage a new element after the current end.
    pub fn append(&mut self, value: T) {
        self.inner.push(value);
    }

    /// Stage every element of `values`, in order.
    pub fn extend<I: IntoIterator<Item = T>>(&mut self, values: I) {
        for value in values {
            self.inner.push(value);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.is_dirty()
    }

    /// Materialize the staged edits into a new structure.
    pub fn persistent(self) -> Result<HashableStructure<T, S>, Error> {
        self.inner.persistent()
    }
}
