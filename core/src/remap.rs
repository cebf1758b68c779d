//! Name-based joint index mapping between skeletons
//!
//! A dependent mesh shares the base skeleton but lists its joints in its own
//! order, sometimes with disambiguation suffixes added by import tooling
//! (e.g. `"lCollar 2"`). The map resolves each target joint name to a base
//! joint index, falling back to suffix-stripped matching, and degrades
//! unresolved slots to [`UNMAPPED`] rather than failing.

use hashbrown::HashMap;

/// Map value for a joint that could not be resolved in the base skeleton
pub const UNMAPPED: i32 = -1;

/// Build a name index for a base skeleton's joint list.
pub fn joint_index(joint_names: &[String]) -> HashMap<String, u32> {
    joint_names
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i as u32))
        .collect()
}

/// Build a joint map from a target skeleton to the base skeleton.
///
/// Each slot is a base joint index, or [`UNMAPPED`] when the name cannot be
/// resolved even after suffix stripping. Unresolved slots are logged and
/// left for the caller to pass through untouched; this is an explicit
/// degrade, never a failure.
pub fn build_joint_map(target_joints: &[String], base_index: &HashMap<String, u32>) -> Vec<i32> {
    // Normalized lookup is built lazily on the first miss. Insertion order
    // is by base index so collisions resolve deterministically to the
    // lowest-indexed joint.
    let mut normalized: Option<HashMap<String, u32>> = None;

    target_joints
        .iter()
        .map(|name| {
            if let Some(&index) = base_index.get(name) {
                return index as i32;
            }

            let normalized = normalized.get_or_insert_with(|| {
                let mut by_index: Vec<(&String, u32)> =
                    base_index.iter().map(|(n, &i)| (n, i)).collect();
                by_index.sort_by_key(|&(_, i)| i);
                let mut map = HashMap::new();
                for (base_name, index) in by_index {
                    map.entry(strip_duplicate_suffix(base_name).to_string())
                        .or_insert(index);
                }
                map
            });

            if let Some(&index) = normalized.get(strip_duplicate_suffix(name)) {
                return index as i32;
            }

            tracing::warn!(
                "joint '{}' not found in base skeleton - slot degrades to passthrough",
                name
            );
            UNMAPPED
        })
        .collect()
}

/// Strip a trailing whitespace-plus-digits disambiguation suffix.
///
/// `"lCollar 2"` becomes `"lCollar"`; names without that exact shape are
/// returned unchanged (`"lThumb2"` keeps its trailing digit, `"lThumb2_dup"`
/// is untouched).
fn strip_duplicate_suffix(name: &str) -> &str {
    let without_digits = name.trim_end_matches(|c: char| c.is_ascii_digit());
    if without_digits.len() == name.len() || !without_digits.ends_with(char::is_whitespace) {
        return name;
    }
    without_digits.trim_end()
}
