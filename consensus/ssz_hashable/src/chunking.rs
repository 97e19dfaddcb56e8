//! Packing of fixed-width element encodings into 32-byte chunks, and the chunk-level diff of
//! an element changeset.

use crate::hash_tree::ChunkVector;
use crate::{Error, Hash256, LeafBytes};
use std::collections::BTreeMap;
use tree_hash::BYTES_PER_CHUNK;

/// Replace the `index`-th `element.len()`-byte slot of `chunk`.
///
/// The chunk is interpreted as a concatenated sequence of equally sized elements.
pub fn update_element_in_chunk(
    chunk: Hash256,
    index: usize,
    element: &[u8],
) -> Result<Hash256, Error> {
    let element_size = element.len();

    if element_size == 0 || BYTES_PER_CHUNK % element_size != 0 {
        return Err(Error::InvalidElementSize { element_size });
    }

    let elements_per_chunk = BYTES_PER_CHUNK / element_size;
    if index >= elements_per_chunk {
        return Err(Error::IndexOutOfRange {
            index,
            len: elements_per_chunk,
        });
    }

    let mut bytes = chunk.to_fixed_bytes();
    bytes[index * element_size..(index + 1) * element_size].copy_from_slice(element);
    Ok(Hash256::from(bytes))
}

/// Apply a batch of slot replacements to a single chunk.
pub fn update_elements_in_chunk(
    chunk: Hash256,
    updated_elements: &BTreeMap<usize, LeafBytes>,
) -> Result<Hash256, Error> {
    updated_elements
        .iter()
        .try_fold(chunk, |chunk, (&index, element)| {
            update_element_in_chunk(chunk, index, element)
        })
}

/// The number of element slots still free in the trailing chunk of a structure.
///
/// `element_size` must be non-zero; callers validate it before packing.
pub fn num_padding_elements(
    num_original_chunks: usize,
    num_original_elements: usize,
    element_size: usize,
) -> usize {
    let total_size = num_original_chunks * BYTES_PER_CHUNK;
    let used_size = num_original_elements * element_size;
    total_size.saturating_sub(used_size) / element_size
}

/// For an element changeset, compute the updates that have to be applied to existing chunks.
///
/// The changeset is a map from element index to replacement leaf bytes plus a sequence of
/// appended leaf bytes. Appended elements that fall into the free tail of the last existing
/// chunk are merged with the in-range updates; appends beyond that tail form entirely new
/// chunks and are ignored here (see [`appended_chunks`]).
///
/// The return value maps chunk indices to their updated contents.
pub fn updated_chunks(
    updated_elements: &BTreeMap<usize, LeafBytes>,
    appended_elements: &[LeafBytes],
    original_chunks: &ChunkVector,
    num_original_elements: usize,
) -> Result<BTreeMap<usize, Hash256>, Error> {
    // Any element of the changeset fixes the element size; an empty changeset updates no
    // chunks.
    let element_size = match updated_elements
        .values()
        .chain(appended_elements.first())
        .next()
    {
        Some(element) => element.len(),
        None => return Ok(BTreeMap::new()),
    };

    if element_size == 0 || BYTES_PER_CHUNK % element_size != 0 {
        return Err(Error::InvalidElementSize { element_size });
    }
    let elements_per_chunk = BYTES_PER_CHUNK / element_size;

    let num_padding = num_padding_elements(
        original_chunks.len(),
        num_original_elements,
        element_size,
    );

    // Appends absorbed by the trailing chunk, keyed by element index like the updates.
    let spill_in = appended_elements
        .iter()
        .take(num_padding)
        .enumerate()
        .map(|(offset, element)| (num_original_elements + offset, element));

    // Group the merged changeset by the chunk each element lives in.
    let mut updates_by_chunk: BTreeMap<usize, BTreeMap<usize, LeafBytes>> = BTreeMap::new();
    for (element_index, element) in updated_elements
        .iter()
        .map(|(&index, element)| (index, element))
        .chain(spill_in)
    {
        updates_by_chunk
            .entry(element_index / elements_per_chunk)
            .or_insert_with(BTreeMap::new)
            .insert(element_index % elements_per_chunk, element.clone());
    }

    let mut chunks = BTreeMap::new();
    for (chunk_index, chunk_updates) in updates_by_chunk {
        let original = original_chunks
            .get(chunk_index)
            .ok_or(Error::IndexOutOfRange {
                index: chunk_index,
                len: original_chunks.len(),
            })?;
        chunks.insert(
            chunk_index,
            update_elements_in_chunk(*original, &chunk_updates)?,
        );
    }

    Ok(chunks)
}

/// The sequence of entirely new chunks created by an append changeset.
///
/// The first `num_padding` elements are absorbed into the last existing chunk by
/// [`updated_chunks`] and skipped here; the remainder is packed into fresh chunks, the last
/// one zero-padded.
pub fn appended_chunks(
    appended_elements: &[LeafBytes],
    num_padding: usize,
) -> Result<Vec<Hash256>, Error> {
    if appended_elements.len() <= num_padding {
        return Ok(vec![]);
    }

    let element_size = appended_elements[0].len();
    if element_size == 0 || BYTES_PER_CHUNK % element_size != 0 {
        return Err(Error::InvalidElementSize { element_size });
    }
    let elements_per_chunk = BYTES_PER_CHUNK / element_size;

    let chunks = appended_elements[num_padding..]
        .chunks(elements_per_chunk)
        .map(|group| {
            let mut chunk = [0; BYTES_PER_CHUNK];
            for (slot, element) in group.iter().enumerate() {
                chunk[slot * element_size..(slot + 1) * element_size].copy_from_slice(element);
            }
            Hash256::from(chunk)
        })
        .collect();

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpds::Vector;

    fn leaf(bytes: &[u8]) -> LeafBytes {
        LeafBytes::from_slice(bytes)
    }

    fn chunk_of(halves: (&[u8; 16], &[u8; 16])) -> Hash256 {
        let mut bytes = [0; BYTES_PER_CHUNK];
        bytes[..16].copy_from_slice(halves.0);
        bytes[16..].copy_from_slice(halves.1);
        Hash256::from(bytes)
    }

    fn chunk_vector(chunks: &[Hash256]) -> ChunkVector {
        let mut vector = Vector::new_sync();
        for chunk in chunks {
            vector.push_back_mut(*chunk);
        }
        vector
    }

    #[test]
    fn replaces_the_indexed_slot() {
        let original = chunk_of((&[0xaa; 16], &[0xbb; 16]));

        let updated = update_element_in_chunk(original, 1, &[0xcc; 16]).unwrap();

        assert_eq!(updated, chunk_of((&[0xaa; 16], &[0xcc; 16])));
    }

    #[test]
    fn rejects_zero_and_non_divisor_element_sizes() {
        let chunk = Hash256::zero();

        assert_eq!(
            update_element_in_chunk(chunk, 0, &[]),
            Err(Error::InvalidElementSize { element_size: 0 })
        );
        assert_eq!(
            update_element_in_chunk(chunk, 0, &[0; 5]),
            Err(Error::InvalidElementSize { element_size: 5 })
        );
    }

    #[test]
    fn rejects_out_of_range_slots() {
        let chunk = Hash256::zero();

        assert_eq!(
            update_element_in_chunk(chunk, 2, &[0; 16]),
            Err(Error::IndexOutOfRange { index: 2, len: 2 })
        );
    }

    #[test]
    fn batched_slot_updates_apply_in_order() {
        let original = Hash256::zero();

        let mut updates = BTreeMap::new();
        updates.insert(0, leaf(&[0xaa; 16]));
        updates.insert(1, leaf(&[0xbb; 16]));

        assert_eq!(
            update_elements_in_chunk(original, &updates).unwrap(),
            chunk_of((&[0xaa; 16], &[0xbb; 16]))
        );
    }

    #[test]
    fn padding_element_counts() {
        // One chunk holding a single 16-byte element leaves one free slot.
        assert_eq!(num_padding_elements(1, 1, 16), 1);
        // A full chunk leaves none.
        assert_eq!(num_padding_elements(1, 2, 16), 0);
        // Composite elements fill a chunk each, so there is never padding.
        assert_eq!(num_padding_elements(3, 3, 32), 0);
        // Eight-byte elements, five stored across two chunks.
        assert_eq!(num_padding_elements(2, 5, 8), 3);
    }

    #[test]
    fn empty_changeset_updates_nothing() {
        let original = chunk_vector(&[Hash256::zero()]);

        let updates = updated_chunks(&BTreeMap::new(), &[], &original, 0).unwrap();

        assert!(updates.is_empty());
    }

    #[test]
    fn updates_group_by_chunk() {
        let original = chunk_vector(&[
            chunk_of((&[0x11; 16], &[0x22; 16])),
            chunk_of((&[0x33; 16], &[0x44; 16])),
        ]);

        let mut updated_elements = BTreeMap::new();
        updated_elements.insert(1, leaf(&[0xaa; 16]));
        updated_elements.insert(2, leaf(&[0xbb; 16]));

        let updates = updated_chunks(&updated_elements, &[], &original, 4).unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[&0], chunk_of((&[0x11; 16], &[0xaa; 16])));
        assert_eq!(updates[&1], chunk_of((&[0xbb; 16], &[0x44; 16])));
    }

    #[test]
    fn appends_spill_into_the_trailing_chunk() {
        // One element stored, so the second slot of the only chunk is free.
        let original = chunk_vector(&[chunk_of((&[0x11; 16], &[0; 16]))]);

        let appended = vec![leaf(&[0xaa; 16]), leaf(&[0xbb; 16])];
        let updates = updated_chunks(&BTreeMap::new(), &appended, &original, 1).unwrap();

        // Only the first append fits; the second becomes a fresh chunk elsewhere.
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[&0], chunk_of((&[0x11; 16], &[0xaa; 16])));

        let fresh = appended_chunks(&appended, 1).unwrap();
        assert_eq!(fresh, vec![chunk_of((&[0xbb; 16], &[0; 16]))]);
    }

    #[test]
    fn appended_chunks_partition_and_pad() {
        let appended = vec![
            leaf(&[0xaa; 16]),
            leaf(&[0xbb; 16]),
            leaf(&[0xcc; 16]),
        ];

        let fresh = appended_chunks(&appended, 0).unwrap();

        assert_eq!(
            fresh,
            vec![
                chunk_of((&[0xaa; 16], &[0xbb; 16])),
                chunk_of((&[0xcc; 16], &[0; 16])),
            ]
        );
    }

    #[test]
    fn appended_chunks_consumed_by_padding_are_empty() {
        let appended = vec![leaf(&[0xaa; 16])];

        assert_eq!(appended_chunks(&appended, 1).unwrap(), vec![]);
        assert_eq!(appended_chunks(&[], 0).unwrap(), vec![]);
    }

    #[test]
    fn composite_elements_form_whole_chunks() {
        let appended = vec![leaf(&[0xaa; 32]), leaf(&[0xbb; 32])];

        let fresh = appended_chunks(&appended, 0).unwrap();

        assert_eq!(
            fresh,
            vec![Hash256::from([0xaa; 32]), Hash256::from([0xbb; 32])]
        );
    }

    #[test]
    fn update_outside_existing_chunks_is_rejected() {
        let original = chunk_vector(&[Hash256::zero()]);

        let mut updated_elements = BTreeMap::new();
        updated_elements.insert(2, leaf(&[0xaa; 16]));

        assert_eq!(
            updated_chunks(&updated_elements, &[], &original, 2),
            Err(Error::IndexOutOfRange { index: 1, len: 1 })
        );
    }
}
