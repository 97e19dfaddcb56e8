use crate::hash_tree::{ChunkVector, HashTree};
use crate::sedes::VectorSedes;
use crate::structure::{HashableStructure, HashableStructureEvolver};
use crate::{Error, Hash256};

/// A fixed-length hashable sequence.
///
/// Its root is the raw Merkle root of its chunks, with no length mixing: a vector's length is
/// part of its type-level shape, not its value.
#[derive(Debug, Clone, PartialEq)]
pub struct HashableVector<T, S> {
    structure: HashableStructure<T, S>,
}

impl<T: Clone, S: VectorSedes<T> + Clone> HashableVector<T, S> {
    /// Build a vector from `iter`, which must yield exactly `sedes.length()` elements.
    pub fn from_iterable<I: IntoIterator<Item = T>>(iter: I, sedes: S) -> Result<Self, Error> {
        let elements: Vec<T> = iter.into_iter().collect();

        let expected = sedes.length();
        if elements.len() != expected {
            return Err(Error::LengthMismatch {
                expected,
                actual: elements.len(),
            });
        }

        Ok(HashableVector {
            structure: HashableStructure::from_iterable(elements, sedes)?,
        })
    }

    /// The hash tree root.
    pub fn root(&self) -> Hash256 {
        self.structure.raw_root()
    }

    pub fn raw_root(&self) -> Hash256 {
        self.structure.raw_root()
    }

    pub fn len(&self) -> usize {
        self.structure.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structure.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.structure.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.structure.iter()
    }

    pub fn elements(&self) -> &rpds::VectorSync<T> {
        self.structure.elements()
    }

    pub fn chunks(&self) -> &ChunkVector {
        self.structure.chunks()
    }

    pub fn hash_tree(&self) -> &HashTree {
        self.structure.hash_tree()
    }

    pub fn sedes(&self) -> &S {
        self.structure.sedes()
    }

    /// Return a new vector with the element at `index` replaced by `value`.
    pub fn set(&self, index: usize, value: T) -> Result<Self, Error> {
        Ok(HashableVector {
            structure: self.structure.set(index, value)?,
        })
    }

    /// Return a new vector with a batch of `(index, value)` replacements applied.
    pub fn mset(&self, pairs: impl IntoIterator<Item = (usize, T)>) -> Result<Self, Error> {
        Ok(HashableVector {
            structure: self.structure.mset(pairs)?,
        })
    }

    /// Return a new vector with `f` applied to the element at `index`.
    pub fn transform<F: FnOnce(&T) -> T>(&self, index: usize, f: F) -> Result<Self, Error> {
        Ok(HashableVector {
            structure: self.structure.transform(index, f)?,
        })
    }

    /// Stage a batch of edits against this vector.
    pub fn evolver(&self) -> VectorEvolver<'_, T, S> {
        VectorEvolver {
            inner: self.structure.evolver(),
        }
    }
}

/// An evolver over a vector; materializes back into a [`HashableVector`].
#[derive(Debug)]
pub struct VectorEvolver<'a, T, S> {
    inner: HashableStructureEvolver<'a, T, S>,
}

impl<'a, T: Clone, S: VectorSedes<T> + Clone> VectorEvolver<'a, T, S> {
    pub fn get(&self, index: usize) -> Result<&T, Error> {
        self.inner.get(index)
    }

    pub fn set(&mut self, index: usize, value: T) -> Result<(), Error> {
        self.inner.set(index, value)
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

    pub fn persistent(self) -> Result<HashableVector<T, S>, Error> {
        Ok(HashableVector {
            structure: self.inner.persistent()?,
        })
    }
}
