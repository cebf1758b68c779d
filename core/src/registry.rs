//! Subscriber registry
//!
//! Tracks which dependent rigs receive joint corrections. The registry owns
//! per-subscriber joint maps, bind-pose backups for restore, and the
//! clone-on-first-write flag; it never owns the rigs themselves.

use glam::Mat4;
use hashbrown::HashMap;

use crate::error::CorrectionError;
use crate::remap::{build_joint_map, UNMAPPED};
use crate::rig::{MeshRig, RigId};

/// Per-subscriber bookkeeping
#[derive(Debug)]
struct SubscriberState {
    /// target joint index -> base joint index, or UNMAPPED
    joint_map: Vec<i32>,
    /// Original bind poses, written back on restore
    backup: Vec<Mat4>,
    /// Whether this rig's shared geometry has been deep-cloned yet.
    /// Cloning happens lazily on the first actual correction write.
    cloned: bool,
}

/// Registry of subscriber rigs, keyed by mesh-instance id.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    states: HashMap<RigId, SubscriberState>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rig to receive joint corrections.
    ///
    /// Builds the joint map against the base skeleton and snapshots the
    /// rig's current bind poses as the restore backup. The rig is marked
    /// "pending clone"; its geometry is not touched here.
    ///
    /// A rig with no joints is a programmer error and fails immediately.
    pub fn subscribe(
        &mut self,
        rig: &MeshRig,
        base_index: &HashMap<String, u32>,
    ) -> Result<(), CorrectionError> {
        if rig.joint_count() == 0 {
            return Err(CorrectionError::EmptySubscriber);
        }
        if self.states.contains_key(&rig.id()) {
            tracing::warn!("rig {:?} subscribed twice - refreshing its backup", rig.id());
        }
        self.states.insert(
            rig.id(),
            SubscriberState {
                joint_map: build_joint_map(rig.joint_names(), base_index),
                backup: rig.bind_poses().to_vec(),
                cloned: false,
            },
        );
        Ok(())
    }

    /// Remove a subscriber by id. Idempotent if not present.
    pub fn unsubscribe(&mut self, id: RigId) -> bool {
        self.states.remove(&id).is_some()
    }

    pub fn contains(&self, id: RigId) -> bool {
        self.states.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn joint_map(&self, id: RigId) -> Option<&[i32]> {
        self.states.get(&id).map(|s| s.joint_map.as_slice())
    }

    pub fn is_cloned(&self, id: RigId) -> bool {
        self.states.get(&id).is_some_and(|s| s.cloned)
    }

    /// Copy the base skeleton's corrected bind poses into a subscriber.
    ///
    /// Unmapped slots are left untouched (identity passthrough). The rig's
    /// shared geometry is deep-cloned exactly once, strictly before the
    /// first write.
    pub fn push_corrections(&mut self, rig: &mut MeshRig, current_bind: &[Mat4]) {
        let Some(state) = self.states.get_mut(&rig.id()) else {
            return;
        };
        if !state.joint_map.iter().any(|&m| m != UNMAPPED) {
            return;
        }
        if !state.cloned {
            rig.clone_geometry();
            state.cloned = true;
        }
        let bind_poses = rig.bind_poses_mut();
        for (target, &mapped) in state.joint_map.iter().enumerate() {
            if mapped == UNMAPPED {
                continue;
            }
            bind_poses[target] = current_bind[mapped as usize];
        }
    }

    /// Write a subscriber's backup bind poses back.
    ///
    /// A rig that was never cloned was never written to, so there is
    /// nothing to undo.
    pub fn restore(&mut self, rig: &mut MeshRig) {
        let Some(state) = self.states.get_mut(&rig.id()) else {
            return;
        };
        if !state.cloned {
            return;
        }
        rig.bind_poses_mut().copy_from_slice(&state.backup);
    }
}
