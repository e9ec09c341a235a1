//! The native encoder engine seam.
//!
//! [`SvcEncoder`](crate::SvcEncoder) drives any [`EncoderEngine`] through a
//! libaom-shaped "init / control / config / encode / drain packets" contract.
//! The types here mirror the engine's SVC structures.

use bytes::Bytes;

use crate::error::EngineError;
use crate::frame::I420Buffer;
use crate::settings::Resolution;

/// Number of reference frame buffers of the AV1 decoder model.
pub const NUM_REF_BUFFERS: usize = 8;
/// Number of named references (`LAST_FRAME` .. `ALTREF_FRAME`).
pub const NUM_REF_NAMES: usize = 7;
/// Spatial layers the engine supports.
pub const MAX_SPATIAL_LAYERS: usize = 4;
/// Temporal layers the engine is configured with.
pub const MAX_TEMPORAL_LAYERS: usize = 4;
/// Size of the per-layer arrays of [`SvcParams`].
pub const MAX_LAYERS: usize = MAX_SPATIAL_LAYERS * MAX_TEMPORAL_LAYERS;

/// Named reference slot of an inter frame, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum RefFrameName {
    /// `LAST_FRAME`
    Last = 0,
    /// `LAST2_FRAME`
    Last2 = 1,
    /// `LAST3_FRAME`
    Last3 = 2,
    /// `GOLDEN_FRAME`
    Golden = 3,
    /// `BWDREF_FRAME`
    Bwdref = 4,
    /// `ALTREF2_FRAME`
    Altref2 = 5,
    /// `ALTREF_FRAME`
    Altref = 6,
}

impl RefFrameName {
    /// Slot index of the name.
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Which buffers one layer reads and refreshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SvcRefFrameConfig {
    /// `reference[name]`: the named slot is used for prediction.
    pub reference: [bool; NUM_REF_NAMES],
    /// `ref_idx[name]`: buffer the named slot points at.
    pub ref_idx: [u8; NUM_REF_NAMES],
    /// `refresh[buffer]`: the buffer is overwritten with this frame.
    pub refresh: [bool; NUM_REF_BUFFERS],
}

impl SvcRefFrameConfig {
    /// Buffers used for prediction, in slot order.
    pub fn referenced_buffers(&self) -> impl Iterator<Item = u8> + '_ {
        self.reference
            .iter()
            .zip(self.ref_idx)
            .filter_map(|(used, buffer)| used.then_some(buffer))
    }
}

/// Layer structure and per-layer rate targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvcParams {
    /// Number of spatial layers.
    pub number_spatial_layers: u8,
    /// Number of temporal layers.
    pub number_temporal_layers: u8,
    /// Per spatial layer scaling numerator.
    pub scaling_factor_num: [u32; MAX_SPATIAL_LAYERS],
    /// Per spatial layer scaling denominator.
    pub scaling_factor_den: [u32; MAX_SPATIAL_LAYERS],
    /// Per layer target bitrate in kbps, indexed by
    /// `spatial_id * MAX_TEMPORAL_LAYERS + temporal_id`.
    pub layer_target_bitrate_kbps: [u32; MAX_LAYERS],
    /// Per layer minimum quantizer.
    pub min_quantizers: [u8; MAX_LAYERS],
    /// Per layer maximum quantizer.
    pub max_quantizers: [u8; MAX_LAYERS],
    /// Per temporal layer frame rate decimation.
    pub framerate_factor: [u32; MAX_TEMPORAL_LAYERS],
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            number_spatial_layers: 1,
            number_temporal_layers: 1,
            scaling_factor_num: [1; MAX_SPATIAL_LAYERS],
            scaling_factor_den: [1; MAX_SPATIAL_LAYERS],
            layer_target_bitrate_kbps: [0; MAX_LAYERS],
            min_quantizers: [0; MAX_LAYERS],
            max_quantizers: [0; MAX_LAYERS],
            framerate_factor: [1; MAX_TEMPORAL_LAYERS],
        }
    }
}

/// Index into the per-layer arrays of [`SvcParams`].
pub fn layer_index(spatial_id: u8, temporal_id: u8) -> usize {
    spatial_id as usize * MAX_TEMPORAL_LAYERS + temporal_id as usize
}

/// The layer the next encode call produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerId {
    /// `spatial_layer_id`
    pub spatial_layer_id: u8,
    /// `temporal_layer_id`
    pub temporal_layer_id: u8,
}

/// Content tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TuneContent {
    /// Default tools.
    #[default]
    Default,
    /// Screen content tools.
    Screen,
}

/// Superblock size selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SuperblockSize {
    /// Chosen by the engine.
    #[default]
    Dynamic,
    /// Always 64x64.
    Size64x64,
}

/// Engine control parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// `AOME_SET_CPUUSED`
    Speed(i32),
    /// `AV1E_SET_TUNE_CONTENT`
    TuneContent(TuneContent),
    /// `AV1E_SET_ROW_MT`
    RowMultiThreading(bool),
    /// `AV1E_SET_TILE_ROWS`, log2 of the tile row count.
    TileRows(u8),
    /// `AV1E_SET_SUPERBLOCK_SIZE`
    SuperblockSize(SuperblockSize),
    /// `AV1E_SET_SVC_PARAMS`
    SvcParams(Box<SvcParams>),
    /// `AV1E_SET_SVC_LAYER_ID`
    SvcLayerId(LayerId),
    /// `AV1E_SET_SVC_REF_FRAME_CONFIG`
    SvcRefFrameConfig(SvcRefFrameConfig),
}

/// Rate control end usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndUsage {
    /// `AOM_CBR`
    #[default]
    Cbr,
    /// `AOM_Q`
    Q,
}

/// Global engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// `g_w` and `g_h`
    pub resolution: Resolution,
    /// `g_threads`
    pub threads: u32,
    /// `g_timebase`, as `1 / timebase_den` seconds.
    pub timebase_den: u32,
    /// `g_lag_in_frames`
    pub lag_in_frames: u32,
    /// `rc_end_usage`
    pub end_usage: EndUsage,
    /// `rc_target_bitrate` in kbps.
    pub target_bitrate_kbps: u32,
    /// `AOM_USAGE_REALTIME`
    pub realtime: bool,
}

/// Flags of one encode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeFlags {
    /// `AOM_EFLAG_FORCE_KF`
    pub force_keyframe: bool,
}

/// Output of the engine after an encode call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    /// `AOM_CODEC_CX_FRAME_PKT`
    Frame {
        /// Compressed OBUs of the layer frame.
        data: Bytes,
        /// The frame is a keyframe.
        is_keyframe: bool,
    },
    /// Statistics and other non-frame packets.
    Other,
}

/// A native AV1 encoder.
///
/// All calls of one instance are serialized by the caller.
pub trait EncoderEngine {
    /// Initializes the engine.
    fn init(&mut self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Sets one control parameter.
    fn set_control(&mut self, control: Control) -> Result<(), EngineError>;

    /// Replaces the global configuration.
    fn set_config(&mut self, config: &EngineConfig) -> Result<(), EngineError>;

    /// Encodes `image` as the layer selected by the last
    /// [`Control::SvcLayerId`]. `pts` and `duration` are in timebase ticks.
    fn encode(
        &mut self,
        image: &I420Buffer,
        pts: i64,
        duration: u64,
        flags: EncodeFlags,
    ) -> Result<(), EngineError>;

    /// Returns the next packet produced by the last encode call.
    fn next_packet(&mut self) -> Option<EnginePacket>;

    /// Quantizer of the last encoded frame.
    fn last_quantizer(&mut self) -> Result<u8, EngineError>;
}
