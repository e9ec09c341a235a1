//! Validation of per-call layer settings and their translation into the
//! engine's SVC structures.

use tracing::warn;

use crate::engine::{
    MAX_SPATIAL_LAYERS, MAX_TEMPORAL_LAYERS, NUM_REF_BUFFERS, RefFrameName, SvcParams,
    SvcRefFrameConfig, layer_index,
};
use crate::error::ValidationError;
use crate::frame::I420Buffer;
use crate::settings::{EncoderSettings, FrameEncodeSettings, RateOptions, TemporalUnitSettings};

/// Highest AV1 quantizer index the rate controller works with.
pub const MAX_QP: u8 = 63;

/// Most buffers a layer may reference.
pub const MAX_REFERENCE_BUFFERS: usize = 3;

/// Lowest and highest accepted effort level.
pub const EFFORT_LEVEL_RANGE: std::ops::RangeInclusive<i32> = -2..=2;

/// Named slot for each position of `reference_buffers`. Two references
/// become LAST and GOLDEN, which have dedicated bitstream signalling.
pub const PREFERRED_SLOT_NAMES: [RefFrameName; 7] = [
    RefFrameName::Last,
    RefFrameName::Golden,
    RefFrameName::Last2,
    RefFrameName::Last3,
    RefFrameName::Bwdref,
    RefFrameName::Altref2,
    RefFrameName::Altref,
];

/// Checks an encode request before anything is sent to the engine.
///
/// The first failing check is logged and returned.
pub fn validate_encode_params(
    frame: &I420Buffer,
    temporal_unit: &TemporalUnitSettings,
    frame_settings: &[FrameEncodeSettings],
    encoder_settings: &EncoderSettings,
) -> Result<(), ValidationError> {
    check_encode_params(frame, temporal_unit, frame_settings, encoder_settings).inspect_err(
        |error| {
            warn!(%error, layers = frame_settings.len(), "rejecting encode parameters");
        },
    )
}

fn check_encode_params(
    frame: &I420Buffer,
    temporal_unit: &TemporalUnitSettings,
    frame_settings: &[FrameEncodeSettings],
    encoder_settings: &EncoderSettings,
) -> Result<(), ValidationError> {
    if frame_settings.is_empty() {
        return Err(ValidationError::NoLayers);
    }

    let max = encoder_settings.max_encode_dimensions;
    if frame.width() > max.width || frame.height() > max.height {
        return Err(ValidationError::FrameTooLarge {
            width: frame.width(),
            height: frame.height(),
            max_width: max.width,
            max_height: max.height,
        });
    }

    if !EFFORT_LEVEL_RANGE.contains(&temporal_unit.effort_level) {
        return Err(ValidationError::EffortLevelOutOfRange(
            temporal_unit.effort_level,
        ));
    }

    let mut previous_spatial_id = None;
    for settings in frame_settings {
        let spatial_id = settings.spatial_id;
        if spatial_id as usize >= MAX_SPATIAL_LAYERS {
            return Err(ValidationError::SpatialIdOutOfRange { spatial_id });
        }
        if settings.temporal_id as usize >= MAX_TEMPORAL_LAYERS {
            return Err(ValidationError::TemporalIdOutOfRange {
                spatial_id,
                temporal_id: settings.temporal_id,
            });
        }
        if !settings.resolution_scale.is_supported() {
            return Err(ValidationError::UnsupportedResolutionScale {
                spatial_id,
                num: settings.resolution_scale.num,
                den: settings.resolution_scale.den,
            });
        }

        if settings.keyframe && !settings.reference_buffers.is_empty() {
            return Err(ValidationError::KeyframeWithReferences { spatial_id });
        }
        if settings.reference_buffers.len() > MAX_REFERENCE_BUFFERS {
            return Err(ValidationError::TooManyReferenceBuffers {
                spatial_id,
                count: settings.reference_buffers.len(),
            });
        }
        check_buffer_set(spatial_id, &settings.reference_buffers)?;

        if settings.update_buffers.len() > NUM_REF_BUFFERS {
            return Err(ValidationError::TooManyUpdateBuffers {
                spatial_id,
                count: settings.update_buffers.len(),
            });
        }
        check_buffer_set(spatial_id, &settings.update_buffers)?;

        if settings.rate_options.mode() != encoder_settings.rc_mode {
            return Err(ValidationError::RateOptionsMismatch {
                spatial_id,
                mode: encoder_settings.rc_mode,
            });
        }
        if let RateOptions::Cqp { target_qp } = settings.rate_options
            && target_qp > MAX_QP
        {
            return Err(ValidationError::TargetQpOutOfRange {
                spatial_id,
                qp: target_qp,
            });
        }

        if let Some(previous) = previous_spatial_id
            && spatial_id <= previous
        {
            return Err(ValidationError::SpatialIdsNotIncreasing {
                previous,
                spatial_id,
            });
        }
        previous_spatial_id = Some(spatial_id);
    }

    Ok(())
}

/// Buffers must be in range and listed at most once.
fn check_buffer_set(spatial_id: u8, buffers: &[u8]) -> Result<(), ValidationError> {
    let mut seen = [false; NUM_REF_BUFFERS];
    for &buffer in buffers {
        let Some(slot) = seen.get_mut(buffer as usize) else {
            return Err(ValidationError::BufferOutOfRange { spatial_id, buffer });
        };
        if *slot {
            return Err(ValidationError::DuplicateBuffer { spatial_id, buffer });
        }
        *slot = true;
    }
    Ok(())
}

/// Maps a layer's reference and update buffers onto named slots.
///
/// `reference_buffers[i]` is assigned to [`PREFERRED_SLOT_NAMES`]`[i]`.
///
/// # Panics
///
/// Panics if the settings were not validated: more buffers than slot names
/// or a buffer index outside `0..8`.
pub fn svc_ref_frame_config(settings: &FrameEncodeSettings) -> SvcRefFrameConfig {
    assert!(
        settings.reference_buffers.len() <= PREFERRED_SLOT_NAMES.len(),
        "{} reference buffers do not fit the named slots",
        settings.reference_buffers.len()
    );

    let mut config = SvcRefFrameConfig::default();
    for (name, &buffer) in PREFERRED_SLOT_NAMES.iter().zip(&settings.reference_buffers) {
        config.reference[name.index()] = true;
        config.ref_idx[name.index()] = buffer;
    }
    for &buffer in &settings.update_buffers {
        config.refresh[buffer as usize] = true;
    }
    config
}

/// Builds the layer structure and rate targets for one temporal unit.
///
/// The spatial layer count is taken from the last (highest) spatial id and
/// four temporal layers are always configured. CBR layers get their bitrate
/// with the full quantizer range so the encoder may go as coarse as needed to
/// stay under it. CQP layers are marked active with a bitrate of 1 kbps and
/// pinned to their quantizer.
///
/// # Panics
///
/// Panics if `frame_settings` is empty.
pub fn svc_params(frame_settings: &[FrameEncodeSettings]) -> SvcParams {
    let last = frame_settings
        .last()
        .map(|settings| settings.spatial_id)
        .unwrap_or_else(|| panic!("svc_params: no frame settings"));

    let mut params = SvcParams {
        number_spatial_layers: last + 1,
        number_temporal_layers: MAX_TEMPORAL_LAYERS as u8,
        ..Default::default()
    };

    for settings in frame_settings {
        let spatial = settings.spatial_id as usize;
        params.scaling_factor_num[spatial] = settings.resolution_scale.num;
        params.scaling_factor_den[spatial] = settings.resolution_scale.den;

        let layer = layer_index(settings.spatial_id, settings.temporal_id);
        match settings.rate_options {
            RateOptions::Cbr {
                target_bitrate_bps, ..
            } => {
                params.layer_target_bitrate_kbps[layer] = bps_to_kbps(target_bitrate_bps);
                params.max_quantizers[layer] = MAX_QP;
            }
            RateOptions::Cqp { target_qp } => {
                params.layer_target_bitrate_kbps[layer] = 1;
                params.min_quantizers[layer] = target_qp;
                params.max_quantizers[layer] = target_qp;
            }
        }
    }

    params
}

/// Sum of the CBR layer targets in bits per second, saturating at `u64::MAX`.
pub fn aggregate_target_bitrate_bps(frame_settings: &[FrameEncodeSettings]) -> u64 {
    frame_settings
        .iter()
        .map(|settings| match settings.rate_options {
            RateOptions::Cbr {
                target_bitrate_bps, ..
            } => target_bitrate_bps,
            RateOptions::Cqp { .. } => 0,
        })
        .fold(0, u64::saturating_add)
}

/// Converts a bitrate to the engine's kbps unit, saturating at `u32::MAX`.
pub(crate) fn bps_to_kbps(bps: u64) -> u32 {
    u32::try_from(bps / 1000).unwrap_or(u32::MAX)
}
