//! Shared morph-format types and utilities for the morphrig runtime
//!
//! This crate provides the load-time half of the system, shared between:
//! - `morphrig-core` (runtime correction engine)
//! - asset tooling that writes `.morph` files
//!
//! # Modules
//!
//! - [`formats`] - Versioned binary morph format (`.morph`)
//! - [`sparse`] - Sparse delta compression for per-vertex channels
//! - [`loader`] - Morph file loader

pub mod formats;
pub mod loader;
pub mod sparse;

// Re-export the file loader
pub use loader::load_morph_file;

// Re-export commonly used format items
pub use formats::{
    decode, encode, encode_with_threshold, JointCorrection, MorphFormatError, MorphHeader,
    MorphRecord, SparseEntry, JCT_ENTRY_SIZE, JCT_KEY_SEPARATOR, MORPH_EXT, MORPH_MAGIC,
    MORPH_VERSION, SPARSE_ENTRY_SIZE,
};

// Re-export the compressor
pub use sparse::{compress, decompress, DELTA_THRESHOLD};
