//! Per-frame joint-correction state machine
//!
//! The engine owns the base rig, the registered morph records (in
//! registration order, which is part of the observable contract: overlapping
//! joint contributions accumulate in that order), the per-joint correction
//! state, and the subscriber set. The host calls [`CorrectionEngine::update`]
//! once per frame, after the external animator has written joint positions
//! and before render submission.
//!
//! Weight changes and subscriber changes set a dirty flag inspected at the
//! top of `update()`; there is no event broadcast. `update()` itself never
//! fails - per-joint mapping problems degrade to passthrough.

use glam::{Mat4, Vec3, Vec4};
use hashbrown::HashMap;
use smallvec::SmallVec;

use morphrig_common::MorphRecord;

use crate::error::CorrectionError;
use crate::registry::SubscriberRegistry;
use crate::remap::{build_joint_map, joint_index, UNMAPPED};
use crate::rig::{MeshRig, RigId};

#[cfg(test)]
mod tests;

/// Live source of normalized blend weights, keyed by morph name.
///
/// Implemented by whatever owns the authoritative weights (UI sliders, a
/// character preset, a network snapshot); the engine pulls from it via
/// [`CorrectionEngine::sync_weights`].
pub trait WeightSource {
    fn weight(&self, morph: &str) -> f32;
}

/// Engine states. `Recomputing` is transient within one `update()` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Idle,
    Dirty,
    Recomputing,
}

/// A loaded morph plus its precomputed joint map and current weight
struct RegisteredMorph {
    record: MorphRecord,
    /// morph correction slot -> base joint index, or UNMAPPED
    joint_map: Vec<i32>,
    weight: f32,
}

/// Per-joint correction state for the base mesh.
///
/// Created lazily the first time any morph carries nonzero weight; persists
/// for the engine's lifetime. `last_applied` is the morph-driven local
/// position delta written last frame, used to detect how far the external
/// animator has moved each joint since.
struct JointCorrectionState {
    base_local: Vec<Vec3>,
    current_local: Vec<Vec3>,
    base_bind: Vec<Mat4>,
    current_bind: Vec<Mat4>,
    last_applied: Vec<Vec3>,
}

impl JointCorrectionState {
    fn snapshot(base: &MeshRig) -> Self {
        let n = base.joint_count();
        Self {
            base_local: base.local_positions().to_vec(),
            current_local: base.local_positions().to_vec(),
            base_bind: base.bind_poses().to_vec(),
            current_bind: base.bind_poses().to_vec(),
            last_applied: vec![Vec3::ZERO; n],
        }
    }
}

/// Per-frame correction engine for one base mesh and its subscribers.
pub struct CorrectionEngine {
    base: MeshRig,
    base_index: HashMap<String, u32>,
    /// Registration order; accumulation iterates this order every recompute
    morphs: Vec<RegisteredMorph>,
    morph_index: HashMap<String, usize>,
    subscribers: Vec<MeshRig>,
    registry: SubscriberRegistry,
    state: EngineState,
    correction: Option<JointCorrectionState>,
    base_cloned: bool,
    animator_refresh: bool,
}

impl CorrectionEngine {
    /// Create an engine around a base rig. No correction state is allocated
    /// until a morph first carries nonzero weight.
    pub fn new(base: MeshRig) -> Self {
        let base_index = joint_index(base.joint_names());
        Self {
            base,
            base_index,
            morphs: Vec::new(),
            morph_index: HashMap::new(),
            subscribers: Vec::new(),
            registry: SubscriberRegistry::new(),
            state: EngineState::Idle,
            correction: None,
            base_cloned: false,
            animator_refresh: false,
        }
    }

    /// Register a loaded morph record.
    ///
    /// Validates the record's joint table (a mismatch is a load-time format
    /// error, never a frame-time one) and precomputes its joint map against
    /// the base skeleton. Registration order is observable: overlapping
    /// corrections accumulate in it.
    pub fn register_morph(&mut self, record: MorphRecord) -> Result<(), CorrectionError> {
        record.validate()?;
        if self.morph_index.contains_key(&record.name) {
            return Err(CorrectionError::DuplicateMorph(record.name));
        }
        let joint_map = match &record.joint_correction {
            Some(jct) => build_joint_map(&jct.joint_names, &self.base_index),
            None => Vec::new(),
        };
        self.morph_index
            .insert(record.name.clone(), self.morphs.len());
        self.morphs.push(RegisteredMorph {
            record,
            joint_map,
            weight: 0.0,
        });
        Ok(())
    }

    /// Set a morph's blend weight, clamped to [0, 1]. Marks the engine
    /// dirty. A name that was never registered is logged and ignored.
    pub fn set_morph_weight(&mut self, name: &str, weight: f32) {
        let Some(&i) = self.morph_index.get(name) else {
            tracing::warn!("weight set for unregistered morph '{}' - ignored", name);
            return;
        };
        self.morphs[i].weight = weight.clamp(0.0, 1.0);
        self.state = EngineState::Dirty;
    }

    /// Pull current weights for every registered morph from a live source.
    /// Marks the engine dirty only if some weight actually changed.
    pub fn sync_weights(&mut self, source: &impl WeightSource) {
        let mut changed = false;
        for morph in &mut self.morphs {
            let weight = source.weight(&morph.record.name).clamp(0.0, 1.0);
            if weight != morph.weight {
                morph.weight = weight;
                changed = true;
            }
        }
        if changed {
            self.state = EngineState::Dirty;
        }
    }

    /// Attach a dependent rig. It will receive joint corrections on the
    /// next recompute. Fails immediately for a rig with no joints.
    pub fn attach_subscriber(&mut self, rig: MeshRig) -> Result<(), CorrectionError> {
        self.registry.subscribe(&rig, &self.base_index)?;
        if let Some(existing) = self.subscribers.iter_mut().find(|s| s.id() == rig.id()) {
            *existing = rig;
        } else {
            self.subscribers.push(rig);
        }
        self.state = EngineState::Dirty;
        Ok(())
    }

    /// Detach a subscriber, returning its rig. Idempotent if not attached.
    pub fn detach_subscriber(&mut self, id: RigId) -> Option<MeshRig> {
        self.registry.unsubscribe(id);
        let position = self.subscribers.iter().position(|s| s.id() == id)?;
        self.state = EngineState::Dirty;
        Some(self.subscribers.remove(position))
    }

    pub fn base(&self) -> &MeshRig {
        &self.base
    }

    /// Host-side access to the base rig, e.g. for the external animator's
    /// joint position writes between updates.
    pub fn base_mut(&mut self) -> &mut MeshRig {
        &mut self.base
    }

    pub fn subscriber(&self, id: RigId) -> Option<&MeshRig> {
        self.subscribers.iter().find(|s| s.id() == id)
    }

    pub fn subscribers(&self) -> impl Iterator<Item = &MeshRig> {
        self.subscribers.iter()
    }

    /// True once per recompute that wrote bind poses: the external animator
    /// component should re-evaluate root motion/pivot so the skeleton
    /// repositioning is respected by subsequent animation sampling.
    pub fn take_animator_refresh(&mut self) -> bool {
        std::mem::take(&mut self.animator_refresh)
    }

    /// Per-frame entry point. Never fails.
    ///
    /// When dirty, recomputes the base skeleton's corrected positions and
    /// bind poses from all weighted morphs and fans them out to every
    /// subscriber. Drift reconciliation runs every call, dirty or not, so
    /// external skeletal animation and joint correction compose additively.
    pub fn update(&mut self) {
        let dirty = self.state == EngineState::Dirty;

        if self.correction.is_none() {
            // Lazy init on the first nonzero weight. Until then there is
            // nothing to reconcile either: the engine has never written.
            let any_weighted = self.morphs.iter().any(|m| m.weight != 0.0);
            if !(dirty && any_weighted) {
                self.state = EngineState::Idle;
                return;
            }
            // The base rig's geometry may alias other instances of the same
            // asset; deep-clone strictly before the first bind-pose write.
            if !self.base_cloned {
                self.base.clone_geometry();
                self.base_cloned = true;
            }
            self.correction = Some(JointCorrectionState::snapshot(&self.base));
        }
        if dirty {
            self.state = EngineState::Recomputing;
        }
        let Some(corr) = self.correction.as_mut() else {
            return;
        };
        let joint_count = corr.base_local.len();

        // Drift reconciliation: whatever the animator moved a joint since
        // our last write becomes part of that joint's baseline.
        let observed = self.base.local_positions();
        for j in 0..joint_count {
            let drift = observed[j] - (corr.base_local[j] + corr.last_applied[j]);
            corr.base_local[j] += drift;
        }

        if dirty {
            let mut delta_local = vec![Vec3::ZERO; joint_count];
            let mut delta_world = vec![Vec3::ZERO; joint_count];

            let active: SmallVec<[usize; 8]> = self
                .morphs
                .iter()
                .enumerate()
                .filter(|(_, m)| m.weight != 0.0 && m.record.joint_correction.is_some())
                .map(|(i, _)| i)
                .collect();
            for &i in &active {
                let morph = &self.morphs[i];
                let Some(jct) = morph.record.joint_correction.as_ref() else {
                    continue;
                };
                for (slot, &mapped) in morph.joint_map.iter().enumerate() {
                    if mapped == UNMAPPED {
                        continue;
                    }
                    let j = mapped as usize;
                    delta_local[j] += jct.local_offsets[slot] * morph.weight;
                    delta_world[j] += jct.world_offsets[slot] * morph.weight;
                }
            }

            for j in 0..joint_count {
                corr.current_local[j] = corr.base_local[j] + delta_local[j];
                let mut bind = corr.base_bind[j];
                let t = bind.w_axis;
                bind.w_axis = Vec4::new(
                    t.x - delta_world[j].x,
                    t.y - delta_world[j].y,
                    t.z - delta_world[j].z,
                    t.w,
                );
                corr.current_bind[j] = bind;
                corr.last_applied[j] = delta_local[j];
            }
        } else {
            for j in 0..joint_count {
                corr.current_local[j] = corr.base_local[j] + corr.last_applied[j];
            }
        }

        self.base
            .local_positions_mut()
            .copy_from_slice(&corr.current_local);

        if dirty {
            self.base.bind_poses_mut().copy_from_slice(&corr.current_bind);
            for rig in self.subscribers.iter_mut() {
                self.registry.push_corrections(rig, &corr.current_bind);
            }
            self.animator_refresh = true;
        }

        self.state = EngineState::Idle;
    }

    /// Undo all corrections: every subscriber's backup bind poses and the
    /// base mesh's base bind poses are written back. Used on
    /// teardown/disable. Animation drift absorbed into the baseline stays.
    pub fn restore_all(&mut self) {
        for rig in self.subscribers.iter_mut() {
            self.registry.restore(rig);
        }
        if let Some(corr) = self.correction.as_mut() {
            self.base.bind_poses_mut().copy_from_slice(&corr.base_bind);
            self.base
                .local_positions_mut()
                .copy_from_slice(&corr.base_local);
            corr.current_bind.copy_from_slice(&corr.base_bind);
            corr.current_local.copy_from_slice(&corr.base_local);
            corr.last_applied.fill(Vec3::ZERO);
        }
        self.state = EngineState::Idle;
    }
}
