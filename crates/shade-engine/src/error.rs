use thiserror::Error;

use crate::api::types::LightId;

/// Errors raised by the lighting pipeline.
///
/// Geometric degeneracies never show up here; they are resolved locally.
/// Everything in this enum is a setup or caller bug.
#[derive(Debug, Error)]
pub enum LightingError {
    #[error("light range must be positive")]
    InvalidRange,

    #[error("variant {index} out of range for a light with {count} variants")]
    InvalidVariant { index: u32, count: u32 },

    #[error("occluder set is not enclosed by a bounding rectangle")]
    Unbounded,

    #[error("no light with id {0:?} in the pool")]
    UnknownLight(LightId),

    #[error(transparent)]
    Config(#[from] serde_json::Error),
}
