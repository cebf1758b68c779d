//! Joint-correction runtime for the morphrig system
//!
//! Blends loaded morph records at runtime and corrects skeleton joint bind
//! poses so that meshes rigidly bound to the same skeleton as a deformed
//! base body (clothing, hair) do not visually separate from it.
//!
//! The host scheduler drives the engine explicitly: construct it around a
//! base [`rig::MeshRig`], register morphs, then call
//! [`engine::CorrectionEngine::update`] once per rendered frame, strictly
//! after the external skeletal-animation system has written its pose and
//! strictly before render submission.
//!
//! # Modules
//!
//! - [`rig`] - Joint-list view of a mesh instance with shared bind poses
//! - [`remap`] - Name-based joint index mapping between skeletons
//! - [`registry`] - Subscriber tracking, backups, clone-on-first-write
//! - [`engine`] - Per-frame correction state machine

pub mod engine;
pub mod error;
pub mod registry;
pub mod remap;
pub mod rig;

pub use engine::{CorrectionEngine, WeightSource};
pub use error::CorrectionError;
pub use remap::UNMAPPED;
pub use rig::{MeshRig, RigId};
