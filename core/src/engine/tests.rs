//! Tests for the correction engine

use super::*;
use morphrig_common::JointCorrection;
use std::sync::Arc;

fn rig_with(id: u32, joints: &[&str], bind_poses: Arc<Vec<Mat4>>) -> MeshRig {
    let names: Vec<String> = joints.iter().map(|s| s.to_string()).collect();
    let positions: Vec<Vec3> = (0..names.len())
        .map(|i| Vec3::new(0.0, i as f32, 0.0))
        .collect();
    MeshRig::new(RigId(id), names, positions, bind_poses)
}

fn base_rig() -> MeshRig {
    let bind_poses = Arc::new(vec![
        Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)),
        Mat4::from_translation(Vec3::new(0.0, -2.0, 0.0)),
        Mat4::from_translation(Vec3::new(0.5, -2.0, 0.0)),
    ]);
    rig_with(0, &["hip", "spine", "lShldr"], bind_poses)
}

fn heavy_morph() -> MorphRecord {
    MorphRecord {
        name: "FBMHeavy".to_string(),
        joint_correction: Some(JointCorrection {
            joint_names: vec!["hip".to_string(), "spine".to_string()],
            local_offsets: vec![Vec3::new(0.0, 0.25, 0.0), Vec3::new(0.0, 0.125, 0.0625)],
            world_offsets: vec![Vec3::new(0.0, 0.5, 0.0), Vec3::new(0.0, 0.25, 0.125)],
        }),
        ..Default::default()
    }
}

fn pear_morph() -> MorphRecord {
    MorphRecord {
        name: "FBMPearFigure".to_string(),
        joint_correction: Some(JointCorrection {
            joint_names: vec!["hip".to_string()],
            local_offsets: vec![Vec3::new(0.125, 0.0, 0.0)],
            world_offsets: vec![Vec3::new(0.375, 0.0, 0.0)],
        }),
        ..Default::default()
    }
}

fn engine_with_heavy() -> CorrectionEngine {
    let mut engine = CorrectionEngine::new(base_rig());
    engine.register_morph(heavy_morph()).unwrap();
    engine
}

fn translation(m: &Mat4) -> Vec3 {
    m.w_axis.truncate()
}

// ========================================================================
// State Machine
// ========================================================================

#[test]
fn test_update_without_weights_is_noop() {
    let mut engine = engine_with_heavy();
    let before_local = engine.base().local_positions().to_vec();
    let before_bind = engine.base().bind_poses().to_vec();

    engine.update();

    assert_eq!(engine.base().local_positions(), &before_local[..]);
    assert_eq!(engine.base().bind_poses(), &before_bind[..]);
    assert!(!engine.take_animator_refresh());
}

#[test]
fn test_weight_applies_local_and_bind_corrections() {
    let mut engine = engine_with_heavy();
    let base_local = engine.base().local_positions().to_vec();
    let base_bind_t = translation(&engine.base().bind_poses()[0]);

    engine.set_morph_weight("FBMHeavy", 0.5);
    engine.update();

    let expected_local = base_local[0] + Vec3::new(0.0, 0.25, 0.0) * 0.5;
    assert_eq!(engine.base().local_positions()[0], expected_local);

    // Bind-pose translation is decremented by the world offset
    let expected_bind_t = base_bind_t - Vec3::new(0.0, 0.5, 0.0) * 0.5;
    assert_eq!(translation(&engine.base().bind_poses()[0]), expected_bind_t);

    // lShldr is uncorrected by this morph
    assert_eq!(engine.base().local_positions()[2], base_local[2]);
}

#[test]
fn test_weight_is_clamped_to_unit_range() {
    let mut clamped = engine_with_heavy();
    clamped.set_morph_weight("FBMHeavy", 5.0);
    clamped.update();

    let mut full = engine_with_heavy();
    full.set_morph_weight("FBMHeavy", 1.0);
    full.update();

    assert_eq!(
        clamped.base().local_positions(),
        full.base().local_positions()
    );

    let mut negative = engine_with_heavy();
    negative.set_morph_weight("FBMHeavy", -3.0);
    negative.update();
    assert_eq!(negative.base().local_positions(), base_rig().local_positions());
}

#[test]
fn test_unknown_morph_weight_is_ignored() {
    let mut engine = engine_with_heavy();
    engine.set_morph_weight("FBMNotLoaded", 1.0);
    engine.update();
    assert_eq!(
        engine.base().local_positions(),
        base_rig().local_positions()
    );
}

#[test]
fn test_duplicate_morph_registration_fails() {
    let mut engine = engine_with_heavy();
    assert!(matches!(
        engine.register_morph(heavy_morph()),
        Err(CorrectionError::DuplicateMorph(name)) if name == "FBMHeavy"
    ));
}

#[test]
fn test_animator_refresh_signaled_once_per_recompute() {
    let mut engine = engine_with_heavy();
    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.update();
    assert!(engine.take_animator_refresh());
    assert!(!engine.take_animator_refresh());

    // A clean update reconciles drift but does not rewrite bind poses
    engine.update();
    assert!(!engine.take_animator_refresh());
}

// ========================================================================
// Determinism
// ========================================================================

#[test]
fn test_identical_weight_sequences_are_deterministic() {
    let run = || {
        let mut engine = CorrectionEngine::new(base_rig());
        engine.register_morph(heavy_morph()).unwrap();
        engine.register_morph(pear_morph()).unwrap();
        engine.set_morph_weight("FBMHeavy", 0.3);
        engine.update();
        engine.set_morph_weight("FBMPearFigure", 0.7);
        engine.set_morph_weight("FBMHeavy", 0.9);
        engine.update();
        (
            engine.base().local_positions().to_vec(),
            engine.base().bind_poses().to_vec(),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn test_overlapping_morphs_accumulate() {
    let mut engine = CorrectionEngine::new(base_rig());
    engine.register_morph(heavy_morph()).unwrap();
    engine.register_morph(pear_morph()).unwrap();
    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.set_morph_weight("FBMPearFigure", 1.0);
    engine.update();

    // Both morphs correct "hip"; contributions sum
    let expected = Vec3::new(0.0, 0.0, 0.0) + Vec3::new(0.0, 0.25, 0.0) + Vec3::new(0.125, 0.0, 0.0);
    assert_eq!(engine.base().local_positions()[0], expected);
}

// ========================================================================
// Drift Reconciliation
// ========================================================================

#[test]
fn test_external_drift_composes_additively() {
    let mut engine = engine_with_heavy();
    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.update();
    let first = engine.base().local_positions()[1];

    // The external animator moves "spine" between frames
    let v = Vec3::new(0.5, 0.0, -0.25);
    engine.base_mut().local_positions_mut()[1] += v;
    engine.update();

    assert_eq!(engine.base().local_positions()[1], first + v);

    // Stable thereafter: no further drift, no change
    engine.update();
    assert_eq!(engine.base().local_positions()[1], first + v);
}

#[test]
fn test_drift_survives_weight_recompute() {
    let mut engine = engine_with_heavy();
    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.update();

    let v = Vec3::new(0.0, 0.5, 0.0);
    engine.base_mut().local_positions_mut()[0] += v;

    // Weight change and drift land in the same frame
    engine.set_morph_weight("FBMHeavy", 0.0);
    engine.update();

    // Morph delta is gone, animation movement is kept
    let base_local = base_rig().local_positions()[0];
    assert_eq!(engine.base().local_positions()[0], base_local + v);
}

// ========================================================================
// Subscribers
// ========================================================================

#[test]
fn test_subscriber_receives_mapped_bind_poses() {
    let mut engine = engine_with_heavy();
    let shirt_binds = Arc::new(vec![Mat4::IDENTITY; 2]);
    engine
        .attach_subscriber(rig_with(1, &["spine", "hip"], shirt_binds))
        .unwrap();

    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.update();

    let shirt = engine.subscriber(RigId(1)).unwrap();
    assert_eq!(shirt.bind_poses()[0], engine.base().bind_poses()[1]);
    assert_eq!(shirt.bind_poses()[1], engine.base().bind_poses()[0]);
}

#[test]
fn test_unmapped_joint_is_passthrough() {
    let mut engine = engine_with_heavy();
    let binds = Arc::new(vec![Mat4::IDENTITY; 2]);
    engine
        .attach_subscriber(rig_with(1, &["lThumb2_dup", "hip"], binds))
        .unwrap();

    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.update();

    let prop = engine.subscriber(RigId(1)).unwrap();
    // Unresolved slot is left untouched, mapped slot is corrected
    assert_eq!(prop.bind_poses()[0], Mat4::IDENTITY);
    assert_eq!(prop.bind_poses()[1], engine.base().bind_poses()[0]);
}

#[test]
fn test_shared_geometry_subscribers_are_isolated() {
    let asset = Arc::new(vec![Mat4::IDENTITY; 2]);
    let mut engine = engine_with_heavy();
    engine
        .attach_subscriber(rig_with(1, &["hip", "spine"], asset.clone()))
        .unwrap();
    engine
        .attach_subscriber(rig_with(2, &["lThumb2_dup", "lFoot_dup"], asset.clone()))
        .unwrap();

    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.update();

    // Writing subscriber 1 cloned its geometry; the shared asset and the
    // fully-unmapped subscriber 2 still hold the originals
    assert_eq!(asset[0], Mat4::IDENTITY);
    let unmapped = engine.subscriber(RigId(2)).unwrap();
    assert_eq!(unmapped.bind_poses()[0], Mat4::IDENTITY);
    assert_eq!(unmapped.bind_poses()[1], Mat4::IDENTITY);

    let corrected = engine.subscriber(RigId(1)).unwrap();
    assert_ne!(corrected.bind_poses()[0], Mat4::IDENTITY);
}

#[test]
fn test_detached_subscriber_stops_receiving() {
    let mut engine = engine_with_heavy();
    engine
        .attach_subscriber(rig_with(1, &["hip"], Arc::new(vec![Mat4::IDENTITY])))
        .unwrap();

    let shirt = engine.detach_subscriber(RigId(1)).unwrap();
    assert!(engine.subscriber(RigId(1)).is_none());
    assert!(engine.detach_subscriber(RigId(1)).is_none());

    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.update();
    assert_eq!(shirt.bind_poses()[0], Mat4::IDENTITY);
}

// ========================================================================
// Restore
// ========================================================================

#[test]
fn test_restore_all_undoes_corrections() {
    let original_bind = base_rig().bind_poses().to_vec();
    let mut engine = engine_with_heavy();
    engine
        .attach_subscriber(rig_with(1, &["hip"], Arc::new(vec![Mat4::IDENTITY])))
        .unwrap();

    engine.set_morph_weight("FBMHeavy", 1.0);
    engine.update();
    assert_ne!(engine.base().bind_poses(), &original_bind[..]);

    engine.restore_all();
    assert_eq!(engine.base().bind_poses(), &original_bind[..]);
    assert_eq!(
        engine.subscriber(RigId(1)).unwrap().bind_poses()[0],
        Mat4::IDENTITY
    );
    assert_eq!(
        engine.base().local_positions(),
        base_rig().local_positions()
    );
}

// ========================================================================
// Weight Source
// ========================================================================

struct FixedWeights(f32);

impl WeightSource for FixedWeights {
    fn weight(&self, _morph: &str) -> f32 {
        self.0
    }
}

#[test]
fn test_sync_weights_pulls_from_source() {
    let mut engine = engine_with_heavy();
    engine.sync_weights(&FixedWeights(0.5));
    engine.update();

    let mut manual = engine_with_heavy();
    manual.set_morph_weight("FBMHeavy", 0.5);
    manual.update();

    assert_eq!(
        engine.base().local_positions(),
        manual.base().local_positions()
    );

    // Re-syncing unchanged weights does not trigger a recompute
    engine.take_animator_refresh();
    engine.sync_weights(&FixedWeights(0.5));
    engine.update();
    assert!(!engine.take_animator_refresh());
}
