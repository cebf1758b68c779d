//! Morph record binary format (`.morph`)
//!
//! Versioned deformation record containing sparse per-vertex delta channels
//! and an optional joint-correction table. All integers and floats are
//! fixed-width (4 bytes) little-endian.
//!
//! # Layout
//! ```text
//! Header (44 bytes):
//! 0x00: magic i32            - Must equal MORPH_MAGIC ("MRPH")
//! 0x04: version i32          - Body layout version (currently 1)
//! 0x08: name_len i32         - Byte length of UTF-8 morph name
//! 0x0C: vertex_dense_len i32 - Dense vertex-delta channel length
//! 0x10: normal_dense_len i32 - Dense normal-delta channel length
//! 0x14: tangent_dense_len i32- Dense tangent-delta channel length
//! 0x18: vertex_packed i32    - Sparse vertex entry count
//! 0x1C: normal_packed i32    - Sparse normal entry count
//! 0x20: tangent_packed i32   - Sparse tangent entry count
//! 0x24: jct_keys_len i32     - Byte length of joint-name blob
//! 0x28: jcts_len i32         - Byte length of joint position payload
//!
//! Body, in order:
//! - name bytes (UTF-8)
//! - sparse vertex entries   (16 bytes each: i32 index, f32 x, f32 y, f32 z)
//! - sparse normal entries   (same layout)
//! - sparse tangent entries  (same layout)
//! - joint-name blob         (UTF-8, names joined by JCT_KEY_SEPARATOR)
//! - joint positions         (24 bytes per joint: f32 local xyz, f32 world xyz)
//! ```
//!
//! A record with zero joint corrections has `jct_keys_len == jcts_len == 0`
//! and decodes with `joint_correction: None`.

mod encoding;
mod header;
mod types;


// Re-export public API
pub use encoding::{decode, encode, encode_with_threshold};
pub use header::MorphHeader;
pub use types::{
    JointCorrection, MorphFormatError, MorphRecord, SparseEntry, JCT_ENTRY_SIZE, SPARSE_ENTRY_SIZE,
};
