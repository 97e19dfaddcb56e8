#![allow(dead_code)]

//! Concrete sedes used by the scenario and property tests: `uint128` basic elements (16-byte
//! little-endian, two to a chunk) and 16-byte-vector composite elements (one padded chunk
//! each, standing in for a nested hash tree root).

use ssz_hashable::{LeafBytes, ListSedes, Sedes, VectorSedes};

pub const BYTES_PER_UINT128: usize = 16;
pub const BYTES_PER_CHUNK: usize = 32;

fn chunks_for(num_elements: usize, element_size: usize) -> usize {
    (num_elements * element_size + BYTES_PER_CHUNK - 1) / BYTES_PER_CHUNK
}

fn uint128_leaf(element: &u128) -> LeafBytes {
    LeafBytes::from_slice(&element.to_le_bytes())
}

fn bytes16_leaf(element: &[u8; 16]) -> LeafBytes {
    let mut chunk = [0; BYTES_PER_CHUNK];
    chunk[..16].copy_from_slice(element);
    LeafBytes::from_slice(&chunk)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uint128VectorSedes {
    pub length: usize,
}

impl Sedes<u128> for Uint128VectorSedes {
    fn serialize_leaf(&self, _index: usize, element: &u128) -> LeafBytes {
        uint128_leaf(element)
    }

    fn element_size(&self) -> usize {
        BYTES_PER_UINT128
    }

    fn chunk_count(&self) -> usize {
        chunks_for(self.length, BYTES_PER_UINT128)
    }
}

impl VectorSedes<u128> for Uint128VectorSedes {
    fn length(&self) -> usize {
        self.length
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Uint128ListSedes {
    pub max_length: usize,
}

impl Sedes<u128> for Uint128ListSedes {
    fn serialize_leaf(&self, _index: usize, element: &u128) -> LeafBytes {
        uint128_leaf(element)
    }

    fn element_size(&self) -> usize {
        BYTES_PER_UINT128
    }

    fn chunk_count(&self) -> usize {
        chunks_for(self.max_length, BYTES_PER_UINT128)
    }
}

impl ListSedes<u128> for Uint128ListSedes {
    fn max_length(&self) -> usize {
        self.max_length
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bytes16VectorSedes {
    pub length: usize,
}

impl Sedes<[u8; 16]> for Bytes16VectorSedes {
    fn serialize_leaf(&self, _index: usize, element: &[u8; 16]) -> LeafBytes {
        bytes16_leaf(element)
    }

    fn element_size(&self) -> usize {
        BYTES_PER_CHUNK
    }

    fn chunk_count(&self) -> usize {
        self.length
    }
}

impl VectorSedes<[u8; 16]> for Bytes16VectorSedes {
    fn length(&self) -> usize {
        self.length
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bytes16ListSedes {
    pub max_length: usize,
}

impl Sedes<[u8; 16]> for Bytes16ListSedes {
    fn serialize_leaf(&self, _index: usize, element: &[u8; 16]) -> LeafBytes {
        bytes16_leaf(element)
    }

    fn element_size(&self) -> usize {
        BYTES_PER_CHUNK
    }

    fn chunk_count(&self) -> usize {
        self.max_length
    }
}

impl ListSedes<[u8; 16]> for Bytes16ListSedes {
    fn max_length(&self) -> usize {
        self.max_length
    }
}
