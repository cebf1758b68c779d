//! Encoding and decoding of complete morph records

use glam::Vec3;

use super::header::MorphHeader;
use super::types::{
    JointCorrection, MorphFormatError, MorphRecord, SparseEntry, JCT_ENTRY_SIZE, SPARSE_ENTRY_SIZE,
};
use crate::formats::{JCT_KEY_SEPARATOR, MORPH_VERSION};
use crate::sparse::{compress, decompress, DELTA_THRESHOLD};

/// Encode a morph record with the default packing threshold.
///
/// Pure transformation; the record must satisfy [`MorphRecord::validate`].
pub fn encode(record: &MorphRecord) -> Vec<u8> {
    encode_with_threshold(record, DELTA_THRESHOLD)
}

/// Encode a morph record, packing dense channels at the given threshold.
pub fn encode_with_threshold(record: &MorphRecord, threshold: f32) -> Vec<u8> {
    debug_assert!(record.validate().is_ok());

    let pack = |channel: &Option<Vec<Vec3>>| match channel {
        Some(dense) => compress(dense, threshold),
        None => Vec::new(),
    };
    let dense_len = |channel: &Option<Vec<Vec3>>| channel.as_ref().map_or(0, |d| d.len() as u32);

    let vertex_entries = pack(&record.vertex_deltas);
    let normal_entries = pack(&record.normal_deltas);
    let tangent_entries = pack(&record.tangent_deltas);

    let mut keys_blob = String::new();
    let mut joint_count = 0usize;
    if let Some(jct) = &record.joint_correction {
        joint_count = jct.len();
        for (k, name) in jct.joint_names.iter().enumerate() {
            if k > 0 {
                keys_blob.push(JCT_KEY_SEPARATOR);
            }
            keys_blob.push_str(name);
        }
    }

    let header = MorphHeader {
        version: MORPH_VERSION,
        name_len: record.name.len() as u32,
        vertex_dense_len: dense_len(&record.vertex_deltas),
        normal_dense_len: dense_len(&record.normal_deltas),
        tangent_dense_len: dense_len(&record.tangent_deltas),
        vertex_packed: vertex_entries.len() as u32,
        normal_packed: normal_entries.len() as u32,
        tangent_packed: tangent_entries.len() as u32,
        jct_keys_len: keys_blob.len() as u32,
        jcts_len: (joint_count * JCT_ENTRY_SIZE) as u32,
    };

    let mut bytes = Vec::with_capacity(header.file_size());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(record.name.as_bytes());
    for entry in vertex_entries
        .iter()
        .chain(normal_entries.iter())
        .chain(tangent_entries.iter())
    {
        bytes.extend_from_slice(&entry.to_bytes());
    }
    bytes.extend_from_slice(keys_blob.as_bytes());
    if let Some(jct) = &record.joint_correction {
        for k in 0..joint_count {
            for v in [jct.local_offsets[k], jct.world_offsets[k]] {
                bytes.extend_from_slice(&v.x.to_le_bytes());
                bytes.extend_from_slice(&v.y.to_le_bytes());
                bytes.extend_from_slice(&v.z.to_le_bytes());
            }
        }
    }

    debug_assert_eq!(bytes.len(), header.file_size());
    bytes
}

/// Decode a morph record.
///
/// Fails closed on bad magic, unsupported version, truncation, out-of-range
/// sparse indices, and joint-table mismatches. A zero-length joint section
/// yields `joint_correction: None`.
pub fn decode(bytes: &[u8]) -> Result<MorphRecord, MorphFormatError> {
    let header = MorphHeader::from_bytes(bytes)?;
    if bytes.len() < header.file_size() {
        return Err(MorphFormatError::Truncated {
            expected: header.file_size(),
            actual: bytes.len(),
        });
    }

    fn take<'a>(bytes: &'a [u8], offset: &mut usize, len: usize) -> &'a [u8] {
        let slice = &bytes[*offset..*offset + len];
        *offset += len;
        slice
    }
    let mut offset = MorphHeader::SIZE;

    let name = std::str::from_utf8(take(bytes, &mut offset, header.name_len as usize))
        .map_err(|_| MorphFormatError::InvalidUtf8 { field: "name" })?
        .to_string();

    let channels = [
        ("vertex", header.vertex_dense_len, header.vertex_packed),
        ("normal", header.normal_dense_len, header.normal_packed),
        ("tangent", header.tangent_dense_len, header.tangent_packed),
    ];
    let mut decoded: [Option<Vec<Vec3>>; 3] = [None, None, None];
    for (slot, (channel, dense_len, packed)) in decoded.iter_mut().zip(channels) {
        let mut entries = Vec::with_capacity(packed as usize);
        for _ in 0..packed {
            let entry = SparseEntry::from_bytes(take(bytes, &mut offset, SPARSE_ENTRY_SIZE));
            if entry.index >= dense_len {
                return Err(MorphFormatError::IndexOutOfRange {
                    channel,
                    index: entry.index,
                    dense_len,
                });
            }
            entries.push(entry);
        }
        if dense_len > 0 {
            *slot = Some(decompress(&entries, dense_len as usize));
        }
    }
    let [vertex_deltas, normal_deltas, tangent_deltas] = decoded;

    let keys_blob = std::str::from_utf8(take(bytes, &mut offset, header.jct_keys_len as usize))
        .map_err(|_| MorphFormatError::InvalidUtf8 { field: "jct_keys" })?;
    let joint_names: Vec<String> = if keys_blob.is_empty() {
        Vec::new()
    } else {
        keys_blob.split(JCT_KEY_SEPARATOR).map(String::from).collect()
    };

    if header.jcts_len as usize % JCT_ENTRY_SIZE != 0
        || header.joint_count() != joint_names.len()
    {
        return Err(MorphFormatError::JointTableMismatch {
            names: joint_names.len(),
            locals: header.joint_count(),
            worlds: header.joint_count(),
        });
    }

    let joint_correction = if joint_names.is_empty() {
        None
    } else {
        let mut read_vec3 = || {
            let b = take(bytes, &mut offset, 12);
            Vec3::new(
                f32::from_le_bytes([b[0], b[1], b[2], b[3]]),
                f32::from_le_bytes([b[4], b[5], b[6], b[7]]),
                f32::from_le_bytes([b[8], b[9], b[10], b[11]]),
            )
        };
        let mut local_offsets = Vec::with_capacity(joint_names.len());
        let mut world_offsets = Vec::with_capacity(joint_names.len());
        for _ in 0..joint_names.len() {
            local_offsets.push(read_vec3());
            world_offsets.push(read_vec3());
        }
        Some(JointCorrection {
            joint_names,
            local_offsets,
            world_offsets,
        })
    };

    Ok(MorphRecord {
        name,
        target_mesh_name: String::new(),
        vertex_deltas,
        normal_deltas,
        tangent_deltas,
        joint_correction,
    })
}
