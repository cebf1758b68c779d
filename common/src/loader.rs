//! Morph file loader
//!
//! Reads a `.morph` file from disk and decodes it. A corrupt or truncated
//! file aborts the load of that single asset and reports the reason; no
//! partial record is ever produced.
//!
//! Files follow the `<mesh>.<morph>.morph` naming convention; the mesh part
//! of the stem becomes `target_mesh_name` on the decoded record.

use std::path::Path;

use anyhow::{Context, Result};

use crate::formats::{decode, MorphRecord};

/// Load and decode a single morph file.
pub fn load_morph_file(path: &Path) -> Result<MorphRecord> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read morph file: {}", path.display()))?;

    let mut record = decode(&bytes)
        .with_context(|| format!("Failed to decode morph file: {}", path.display()))?;

    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        if let Some((mesh, _)) = stem.split_once('.') {
            record.target_mesh_name = mesh.to_string();
        }
    }

    Ok(record)
}
