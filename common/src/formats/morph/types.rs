//! Morph record data types and format errors

use glam::Vec3;
use thiserror::Error;

/// Size of one sparse delta entry on the wire (16 bytes)
pub const SPARSE_ENTRY_SIZE: usize = 16;

/// Size of one joint correction entry on the wire (24 bytes: 6 × f32)
pub const JCT_ENTRY_SIZE: usize = 24;

/// Errors raised while decoding or validating a morph record.
///
/// All variants are fatal for the asset in question: the load aborts and no
/// partial record is produced. Nothing here is raised on the per-frame path.
#[derive(Debug, Error)]
pub enum MorphFormatError {
    /// Magic constant did not match; the buffer is not a morph file
    #[error("bad magic 0x{0:08x}, not a morph file")]
    BadMagic(i32),

    /// Body layout version is newer than this build understands
    #[error("unsupported morph format version {0}")]
    UnsupportedVersion(i32),

    /// Buffer is shorter than the header declares
    #[error("morph data truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// A header length field is negative
    #[error("negative length {value} for {field}")]
    NegativeLength { field: &'static str, value: i32 },

    /// A string field is not valid UTF-8
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 { field: &'static str },

    /// A sparse entry points past the end of its dense channel
    #[error("{channel} sparse index {index} out of range (dense length {dense_len})")]
    IndexOutOfRange {
        channel: &'static str,
        index: u32,
        dense_len: u32,
    },

    /// Joint-name count and joint-position count disagree
    #[error("joint table mismatch: {names} names, {locals} local offsets, {worlds} world offsets")]
    JointTableMismatch {
        names: usize,
        locals: usize,
        worlds: usize,
    },
}

/// One nonzero-magnitude vertex delta: `(index, offset)`.
///
/// Wire layout is 16 bytes: i32 index followed by three f32 components,
/// all little-endian.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseEntry {
    /// Vertex id this delta applies to (`index < dense_len` for its channel)
    pub index: u32,
    /// Delta vector
    pub offset: Vec3,
}

impl SparseEntry {
    /// Parse from raw bytes (16 bytes)
    pub fn from_bytes(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() >= SPARSE_ENTRY_SIZE);
        Self {
            index: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            offset: Vec3::new(
                f32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
                f32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
                f32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]),
            ),
        }
    }

    /// Write to raw bytes (16 bytes)
    pub fn to_bytes(&self) -> [u8; SPARSE_ENTRY_SIZE] {
        let mut bytes = [0u8; SPARSE_ENTRY_SIZE];
        bytes[0..4].copy_from_slice(&self.index.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.offset.x.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.offset.y.to_le_bytes());
        bytes[12..16].copy_from_slice(&self.offset.z.to_le_bytes());
        bytes
    }
}

/// Joint-correction table carried by a morph.
///
/// Parallel arrays: entry `k` names a joint and gives the local-space and
/// world-space position offsets to apply at full weight.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointCorrection {
    pub joint_names: Vec<String>,
    pub local_offsets: Vec<Vec3>,
    pub world_offsets: Vec<Vec3>,
}

impl JointCorrection {
    /// Number of corrected joints
    pub fn len(&self) -> usize {
        self.joint_names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joint_names.is_empty()
    }

    /// Enforce the three-way length invariant
    pub fn validate(&self) -> Result<(), MorphFormatError> {
        if self.joint_names.len() != self.local_offsets.len()
            || self.joint_names.len() != self.world_offsets.len()
        {
            return Err(MorphFormatError::JointTableMismatch {
                names: self.joint_names.len(),
                locals: self.local_offsets.len(),
                worlds: self.world_offsets.len(),
            });
        }
        Ok(())
    }
}

/// A named, immutable deformation record.
///
/// Delta channels are dense arrays indexed by vertex id, or `None` when the
/// channel is absent. Created once at import time and never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MorphRecord {
    /// Morph name (e.g. `"FBMHeavy"`)
    pub name: String,
    /// Mesh this morph targets. Runtime metadata assigned by the loader;
    /// not part of the wire format.
    pub target_mesh_name: String,
    pub vertex_deltas: Option<Vec<Vec3>>,
    pub normal_deltas: Option<Vec<Vec3>>,
    pub tangent_deltas: Option<Vec<Vec3>>,
    pub joint_correction: Option<JointCorrection>,
}

impl MorphRecord {
    /// Validate load-time invariants (joint table lengths)
    pub fn validate(&self) -> Result<(), MorphFormatError> {
        if let Some(jct) = &self.joint_correction {
            jct.validate()?;
        }
        Ok(())
    }
}
