//! Binary asset formats for the morphrig runtime
//!
//! Currently a single format: the versioned `.morph` deformation record.

pub mod morph;

pub use morph::{
    decode, encode, encode_with_threshold, JointCorrection, MorphFormatError, MorphHeader,
    MorphRecord, SparseEntry, JCT_ENTRY_SIZE, SPARSE_ENTRY_SIZE,
};

/// File extension for morph records
pub const MORPH_EXT: &str = "morph";

/// Magic constant identifying a morph file (`"MRPH"` as little-endian i32)
pub const MORPH_MAGIC: i32 = i32::from_le_bytes(*b"MRPH");

/// Current morph body layout version
pub const MORPH_VERSION: i32 = 1;

/// Separator joining joint names in the serialized joint-name blob.
///
/// Must never occur inside a joint name.
pub const JCT_KEY_SEPARATOR: char = ':';
