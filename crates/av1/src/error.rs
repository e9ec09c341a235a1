//! Error types for the AV1 SVC encoder.

use thiserror::Error;

use crate::settings::RateControlMode;

/// Errors returned by [`SvcEncoder`](crate::SvcEncoder) and the OBU helpers.
#[derive(Error, Debug)]
pub enum Av1Error {
    /// The per-call encode parameters were rejected before anything was
    /// sent to the engine.
    #[error("invalid encode parameters: {0}")]
    InvalidParams(#[from] ValidationError),

    /// A call into the encoder engine failed.
    #[error("encoder engine failed to {operation}: {reason}")]
    Engine {
        /// The engine operation that failed.
        operation: &'static str,
        /// The reason reported by the engine.
        reason: String,
    },

    /// The engine accepted a layer but produced no frame packet for it.
    #[error("no encoded output for spatial layer {spatial_id}")]
    MissingOutput {
        /// Spatial id of the layer without output.
        spatial_id: u8,
    },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid OBU data.
    #[error("invalid OBU: {0}")]
    InvalidObu(String),
}

impl Av1Error {
    pub(crate) fn engine(operation: &'static str, error: EngineError) -> Self {
        Av1Error::Engine {
            operation,
            reason: error.0,
        }
    }
}

/// Failure reported by an [`EncoderEngine`](crate::EncoderEngine).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct EngineError(pub String);

impl EngineError {
    /// Creates an engine error from any message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

/// A rejected encode request. Checks run in a fixed order and the first
/// failing one is reported.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No layer settings were given.
    #[error("no frame settings")]
    NoLayers,

    /// The input frame is larger than the configured maximum.
    #[error(
        "frame of {width}x{height} exceeds the maximum encode dimensions {max_width}x{max_height}"
    )]
    FrameTooLarge {
        /// Input frame width.
        width: u32,
        /// Input frame height.
        height: u32,
        /// Configured maximum width.
        max_width: u32,
        /// Configured maximum height.
        max_height: u32,
    },

    /// `effort_level` is outside `-2..=2`.
    #[error("effort level {0} is outside -2..=2")]
    EffortLevelOutOfRange(i32),

    /// `spatial_id` is outside `0..4`.
    #[error("spatial id {spatial_id} is outside 0..4")]
    SpatialIdOutOfRange {
        /// The offending spatial id.
        spatial_id: u8,
    },

    /// `temporal_id` is outside `0..4`.
    #[error("layer S{spatial_id}: temporal id {temporal_id} is outside 0..4")]
    TemporalIdOutOfRange {
        /// Spatial id of the layer.
        spatial_id: u8,
        /// The offending temporal id.
        temporal_id: u8,
    },

    /// `resolution_scale` is not one of 1/1, 1/2, 1/4 or 1/8.
    #[error("layer S{spatial_id}: unsupported resolution scale {num}/{den}")]
    UnsupportedResolutionScale {
        /// Spatial id of the layer.
        spatial_id: u8,
        /// Scale numerator.
        num: u32,
        /// Scale denominator.
        den: u32,
    },

    /// A keyframe layer references buffers.
    #[error("layer S{spatial_id}: keyframe must not reference buffers")]
    KeyframeWithReferences {
        /// Spatial id of the layer.
        spatial_id: u8,
    },

    /// More than three reference buffers.
    #[error("layer S{spatial_id}: {count} reference buffers, at most 3 are allowed")]
    TooManyReferenceBuffers {
        /// Spatial id of the layer.
        spatial_id: u8,
        /// Number of reference buffers given.
        count: usize,
    },

    /// More than eight update buffers.
    #[error("layer S{spatial_id}: {count} update buffers, at most 8 are allowed")]
    TooManyUpdateBuffers {
        /// Spatial id of the layer.
        spatial_id: u8,
        /// Number of update buffers given.
        count: usize,
    },

    /// A buffer index outside `0..8`.
    #[error("layer S{spatial_id}: buffer {buffer} is outside 0..8")]
    BufferOutOfRange {
        /// Spatial id of the layer.
        spatial_id: u8,
        /// The offending buffer index.
        buffer: u8,
    },

    /// A buffer listed twice in the same set.
    #[error("layer S{spatial_id}: buffer {buffer} is listed twice")]
    DuplicateBuffer {
        /// Spatial id of the layer.
        spatial_id: u8,
        /// The repeated buffer index.
        buffer: u8,
    },

    /// The layer's rate options do not match the encoder's rate control mode.
    #[error("layer S{spatial_id}: rate options do not match rate control mode {mode:?}")]
    RateOptionsMismatch {
        /// Spatial id of the layer.
        spatial_id: u8,
        /// The encoder's configured mode.
        mode: RateControlMode,
    },

    /// A constant QP target above 63.
    #[error("layer S{spatial_id}: target qp {qp} is greater than 63")]
    TargetQpOutOfRange {
        /// Spatial id of the layer.
        spatial_id: u8,
        /// The offending QP.
        qp: u8,
    },

    /// Spatial ids are duplicated or not increasing.
    #[error("spatial id {spatial_id} follows spatial id {previous}")]
    SpatialIdsNotIncreasing {
        /// Spatial id of the preceding layer.
        previous: u8,
        /// Spatial id of the offending layer.
        spatial_id: u8,
    },
}

/// Result type alias for AV1 encoder operations.
pub type Result<T> = std::result::Result<T, Av1Error>;
