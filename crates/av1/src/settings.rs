//! Encoder configuration and per-call layer settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A picture size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Creates a resolution.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Downscaling factor of a spatial layer relative to the input frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionScale {
    /// Numerator.
    pub num: u32,
    /// Denominator.
    pub den: u32,
}

impl ResolutionScale {
    /// Full resolution.
    pub const FULL: Self = Self::new(1, 1);
    /// Half width and height.
    pub const HALF: Self = Self::new(1, 2);
    /// Quarter width and height.
    pub const QUARTER: Self = Self::new(1, 4);
    /// One eighth width and height.
    pub const EIGHTH: Self = Self::new(1, 8);

    /// Creates a scale of `num / den`.
    pub const fn new(num: u32, den: u32) -> Self {
        Self { num, den }
    }

    /// Returns `true` for the scales the encoder supports: 1/1, 1/2, 1/4 and 1/8.
    pub fn is_supported(&self) -> bool {
        [Self::FULL, Self::HALF, Self::QUARTER, Self::EIGHTH].contains(self)
    }

    /// Scales `resolution`, rounding up so no dimension becomes zero.
    pub fn apply(&self, resolution: Resolution) -> Resolution {
        let scale = |value: u32| (value as u64 * self.num as u64).div_ceil(self.den as u64) as u32;
        Resolution::new(scale(resolution.width), scale(resolution.height))
    }
}

impl Default for ResolutionScale {
    fn default() -> Self {
        Self::FULL
    }
}

/// Rate control mode of the whole encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateControlMode {
    /// Constant bitrate; every layer carries [`RateOptions::Cbr`].
    #[default]
    Cbr,
    /// Constant quantizer; every layer carries [`RateOptions::Cqp`].
    Cqp,
}

/// Per-layer rate target. Must match the encoder's [`RateControlMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateOptions {
    /// Constant bitrate.
    Cbr {
        /// Frame duration, used as the encode duration.
        duration: Duration,
        /// Target bitrate of the layer in bits per second.
        target_bitrate_bps: u64,
    },
    /// Constant quantizer.
    Cqp {
        /// Quantizer in `0..=63`.
        target_qp: u8,
    },
}

impl RateOptions {
    /// Returns the rate control mode these options belong to.
    pub fn mode(&self) -> RateControlMode {
        match self {
            RateOptions::Cbr { .. } => RateControlMode::Cbr,
            RateOptions::Cqp { .. } => RateControlMode::Cqp,
        }
    }
}

impl Default for RateOptions {
    fn default() -> Self {
        RateOptions::Cqp { target_qp: 0 }
    }
}

/// Content type hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentHint {
    /// Natural camera content.
    #[default]
    Camera,
    /// Screen content; enables screen content tools.
    Screen,
}

/// Settings shared by all layers of one temporal unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TemporalUnitSettings {
    /// Content type hint.
    pub content_hint: ContentHint,
    /// Presentation time of the temporal unit.
    pub presentation_timestamp: Duration,
    /// Speed/quality trade-off in `-2..=2`, higher is slower.
    pub effort_level: i32,
}

/// Encode request for one spatial layer of a temporal unit.
///
/// The default value is the placeholder used for spatial layers that are
/// encoded without being requested.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FrameEncodeSettings {
    /// Spatial layer id in `0..4`.
    pub spatial_id: u8,
    /// Temporal layer id in `0..4`.
    pub temporal_id: u8,
    /// Size of this layer relative to the input frame.
    pub resolution_scale: ResolutionScale,
    /// Up to 3 distinct buffers in `0..8` to predict from. Empty for keyframes.
    pub reference_buffers: Vec<u8>,
    /// Up to 8 distinct buffers in `0..8` to refresh after encoding.
    pub update_buffers: Vec<u8>,
    /// Rate target of the layer.
    pub rate_options: RateOptions,
    /// Force a keyframe.
    pub keyframe: bool,
}

/// Construction-time encoder configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Largest input frame the encoder accepts.
    pub max_encode_dimensions: Resolution,
    /// Rate control mode for all layers.
    pub rc_mode: RateControlMode,
    /// Upper bound on encoder threads.
    pub max_number_of_threads: u32,
    /// Timestamp ticks per second.
    pub timebase: u32,
    /// Effort level applied at initialization.
    pub initial_effort_level: i32,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            max_encode_dimensions: Resolution::new(1920, 1080),
            rc_mode: RateControlMode::Cbr,
            max_number_of_threads: 8,
            timebase: 1_000_000,
            initial_effort_level: 0,
        }
    }
}

impl EncoderSettings {
    /// Converts a duration into timebase ticks, saturating at `u64::MAX`.
    pub fn ticks(&self, duration: Duration) -> u64 {
        let ticks = duration.as_nanos() * self.timebase as u128 / 1_000_000_000;
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }
}
