//! Sparse delta compression for per-vertex channels
//!
//! Morph delta channels are mostly zero; only vectors with a component above
//! a threshold are stored as `(index, vector)` pairs. Expansion zero-fills
//! back to the dense length, so anything under the threshold decodes to an
//! exact zero.

use glam::Vec3;

use crate::formats::SparseEntry;

/// Default packing threshold for dense delta channels
pub const DELTA_THRESHOLD: f32 = 1e-4;

/// Filter near-zero vectors out of a dense channel.
///
/// Keeps entries where any axis magnitude exceeds `threshold`. Output is in
/// ascending index order.
pub fn compress(dense: &[Vec3], threshold: f32) -> Vec<SparseEntry> {
    dense
        .iter()
        .enumerate()
        .filter(|(_, v)| v.abs().max_element() > threshold)
        .map(|(i, v)| SparseEntry {
            index: i as u32,
            offset: *v,
        })
        .collect()
}

/// Expand sparse entries back to a dense, zero-filled channel of `len`.
pub fn decompress(sparse: &[SparseEntry], len: usize) -> Vec<Vec3> {
    let mut dense = vec![Vec3::ZERO; len];
    for entry in sparse {
        dense[entry.index as usize] = entry.offset;
    }
    dense
}
