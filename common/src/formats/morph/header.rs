//! Morph header structure and operations

use super::types::{MorphFormatError, JCT_ENTRY_SIZE, SPARSE_ENTRY_SIZE};
use crate::formats::{MORPH_MAGIC, MORPH_VERSION};

/// Morph file header (44 bytes)
///
/// The magic constant is checked during parsing and not stored. Length
/// fields are i32 on the wire; parsing rejects negative values so they are
/// held as u32 here.
///
/// Note: Not packed - we use explicit byte serialization.
#[derive(Debug, Clone, Copy)]
#[repr(C)]
pub struct MorphHeader {
    /// Body layout version
    pub version: i32,
    /// Byte length of the UTF-8 morph name
    pub name_len: u32,
    /// Dense vertex-delta channel length (vertex count)
    pub vertex_dense_len: u32,
    /// Dense normal-delta channel length
    pub normal_dense_len: u32,
    /// Dense tangent-delta channel length
    pub tangent_dense_len: u32,
    /// Sparse vertex entry count
    pub vertex_packed: u32,
    /// Sparse normal entry count
    pub normal_packed: u32,
    /// Sparse tangent entry count
    pub tangent_packed: u32,
    /// Byte length of the separator-joined joint-name blob
    pub jct_keys_len: u32,
    /// Byte length of the joint position payload
    pub jcts_len: u32,
}

impl MorphHeader {
    pub const SIZE: usize = 44;

    /// Write header to bytes, including the magic constant
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&MORPH_MAGIC.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.version.to_le_bytes());
        let fields = [
            self.name_len,
            self.vertex_dense_len,
            self.normal_dense_len,
            self.tangent_dense_len,
            self.vertex_packed,
            self.normal_packed,
            self.tangent_packed,
            self.jct_keys_len,
            self.jcts_len,
        ];
        for (i, f) in fields.iter().enumerate() {
            bytes[8 + i * 4..12 + i * 4].copy_from_slice(&(*f as i32).to_le_bytes());
        }
        bytes
    }

    /// Read header from bytes.
    ///
    /// Fails closed: an unrecognized magic or version rejects the whole
    /// buffer, as does any negative length field.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MorphFormatError> {
        if bytes.len() < Self::SIZE {
            return Err(MorphFormatError::Truncated {
                expected: Self::SIZE,
                actual: bytes.len(),
            });
        }

        let read_i32 = |offset: usize| {
            i32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ])
        };

        let magic = read_i32(0);
        if magic != MORPH_MAGIC {
            return Err(MorphFormatError::BadMagic(magic));
        }
        let version = read_i32(4);
        if version != MORPH_VERSION {
            return Err(MorphFormatError::UnsupportedVersion(version));
        }

        const FIELD_NAMES: [&str; 9] = [
            "name_len",
            "vertex_dense_len",
            "normal_dense_len",
            "tangent_dense_len",
            "vertex_packed",
            "normal_packed",
            "tangent_packed",
            "jct_keys_len",
            "jcts_len",
        ];
        let mut fields = [0u32; 9];
        for (i, &field) in FIELD_NAMES.iter().enumerate() {
            let value = read_i32(8 + i * 4);
            if value < 0 {
                return Err(MorphFormatError::NegativeLength { field, value });
            }
            fields[i] = value as u32;
        }

        Ok(Self {
            version,
            name_len: fields[0],
            vertex_dense_len: fields[1],
            normal_dense_len: fields[2],
            tangent_dense_len: fields[3],
            vertex_packed: fields[4],
            normal_packed: fields[5],
            tangent_packed: fields[6],
            jct_keys_len: fields[7],
            jcts_len: fields[8],
        })
    }

    /// Calculate expected body size (excluding header)
    pub fn data_size(&self) -> usize {
        let packed = (self.vertex_packed + self.normal_packed + self.tangent_packed) as usize;
        self.name_len as usize
            + packed * SPARSE_ENTRY_SIZE
            + self.jct_keys_len as usize
            + self.jcts_len as usize
    }

    /// Calculate total file size (header + body)
    pub fn file_size(&self) -> usize {
        Self::SIZE + self.data_size()
    }

    /// Number of joints in the correction table
    pub fn joint_count(&self) -> usize {
        self.jcts_len as usize / JCT_ENTRY_SIZE
    }
}
