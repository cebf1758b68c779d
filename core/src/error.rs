//! Error types for the correction runtime

use morphrig_common::MorphFormatError;
use thiserror::Error;

/// Errors raised at registration and attach boundaries.
///
/// Nothing on the per-frame path returns these: `update()` never fails, and
/// per-joint mapping problems degrade to passthrough with a warning instead.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// Attached a rig with no joints; programmer error, fatal at the call site
    #[error("subscriber rig has no joints")]
    EmptySubscriber,

    /// A morph with this name is already registered
    #[error("morph '{0}' is already registered")]
    DuplicateMorph(String),

    /// The morph record failed load-time validation
    #[error(transparent)]
    Format(#[from] MorphFormatError),
}
