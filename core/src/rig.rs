//! Joint-list view of a mesh instance
//!
//! A [`MeshRig`] is what the correction engine knows about a mesh: its joint
//! names, host-writable joint local positions, and a bind-pose array that
//! may be shared with other instances built from the same asset. Bind poses
//! sit behind an `Arc`; instance-specific writes must go through
//! [`MeshRig::clone_geometry`] first so one character's correction can never
//! corrupt another's shared data.

use std::sync::Arc;

use glam::{Mat4, Vec3};

/// Opaque mesh-instance identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigId(pub u32);

/// Joint-list view of one mesh instance.
#[derive(Debug, Clone)]
pub struct MeshRig {
    id: RigId,
    joint_names: Vec<String>,
    /// Joint local positions. The external animator writes these between
    /// engine updates; the engine reads them for drift reconciliation.
    local_positions: Vec<Vec3>,
    /// Bind-pose matrices, shared across instances of the same asset until
    /// cloned.
    bind_poses: Arc<Vec<Mat4>>,
}

impl MeshRig {
    /// Create a rig view.
    ///
    /// `joint_names`, `local_positions`, and `bind_poses` are parallel
    /// arrays indexed by joint.
    pub fn new(
        id: RigId,
        joint_names: Vec<String>,
        local_positions: Vec<Vec3>,
        bind_poses: Arc<Vec<Mat4>>,
    ) -> Self {
        debug_assert_eq!(joint_names.len(), local_positions.len());
        debug_assert_eq!(joint_names.len(), bind_poses.len());
        Self {
            id,
            joint_names,
            local_positions,
            bind_poses,
        }
    }

    pub fn id(&self) -> RigId {
        self.id
    }

    pub fn joint_names(&self) -> &[String] {
        &self.joint_names
    }

    pub fn joint_count(&self) -> usize {
        self.joint_names.len()
    }

    pub fn local_positions(&self) -> &[Vec3] {
        &self.local_positions
    }

    /// Host-side write access for the external animator
    pub fn local_positions_mut(&mut self) -> &mut [Vec3] {
        &mut self.local_positions
    }

    pub fn bind_poses(&self) -> &[Mat4] {
        &self.bind_poses
    }

    /// Whether two rigs still alias the same underlying bind-pose data
    pub fn shares_geometry_with(&self, other: &MeshRig) -> bool {
        Arc::ptr_eq(&self.bind_poses, &other.bind_poses)
    }

    /// Deep-copy the shared bind-pose data so this instance owns it alone.
    ///
    /// Callers track whether a rig has already been cloned; calling this
    /// again on an already-unique rig allocates a fresh copy, so it must be
    /// guarded by that flag.
    pub(crate) fn clone_geometry(&mut self) {
        self.bind_poses = Arc::new(self.bind_poses.as_ref().clone());
    }

    /// Mutable bind-pose access. Must only be used after the rig's geometry
    /// has been cloned; `Arc::make_mut` keeps the no-aliasing guarantee even
    /// if that invariant is broken.
    pub(crate) fn bind_poses_mut(&mut self) -> &mut [Mat4] {
        Arc::<Vec<Mat4>>::make_mut(&mut self.bind_poses)
    }
}
