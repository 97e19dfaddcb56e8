use smallvec::SmallVec;

/// The leaf bytes contributed by a single element to the chunk stream.
///
/// Payloads are at most one chunk, so they live on the stack.
pub type LeafBytes = SmallVec<[u8; 32]>;

/// Describes how the elements of a hashable structure map onto tree leaves.
///
/// Basic elements serialize to fixed-width encodings smaller than a chunk and are packed
/// together; composite elements contribute their own hash tree root and occupy exactly one
/// chunk each. The structures never interpret leaf bytes beyond packing them.
pub trait Sedes<T> {
    /// Returns the leaf bytes contributed by `element` at position `index`.
    fn serialize_leaf(&self, index: usize, element: &T) -> LeafBytes;

    /// The byte width of `serialize_leaf` output, uniform across elements.
    ///
    /// Must be in `[1, 32]` and divide the chunk size.
    fn element_size(&self) -> usize;

    /// The leaf capacity of the backing tree.
    fn chunk_count(&self) -> usize;
}

/// Sedes for fixed-length structures.
pub trait VectorSedes<T>: Sedes<T> {
    /// The exact number of elements a structure with this sedes holds.
    fn length(&self) -> usize;
}

/// Sedes for variable-length structures.
pub trait ListSedes<T>: Sedes<T> {
    /// The logical element capacity.
    fn max_length(&self) -> usize;
}
