//! Per temporal unit orchestration of an SVC encode.

use bytes::Bytes;
use tracing::{debug, error, trace, warn};

use crate::engine::{
    Control, EncodeFlags, EncoderEngine, EndUsage, EngineConfig, EnginePacket, LayerId,
    TuneContent,
};
use crate::error::{Av1Error, Result, ValidationError};
use crate::frame::I420Buffer;
use crate::layer_config::{
    EFFORT_LEVEL_RANGE, aggregate_target_bitrate_bps, bps_to_kbps, svc_params,
    svc_ref_frame_config, validate_encode_params,
};
use crate::obu::first_extension_header;
use crate::settings::{
    ContentHint, EncoderSettings, FrameEncodeSettings, RateControlMode, RateOptions, Resolution,
    TemporalUnitSettings,
};
use crate::threading::ThreadingLayout;

/// Speed the engine runs at for effort level 0.
const BASE_SPEED: i32 = 8;

/// Why a requested layer has no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The engine produced no frame for the layer.
    Error,
}

/// A requested layer that produced no output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DroppedFrame {
    /// Why the layer was dropped.
    pub reason: DropReason,
    /// Spatial id of the layer.
    pub spatial_id: u8,
}

/// Compressed output of one requested layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedData {
    /// AV1 OBUs of the layer frame.
    pub bitstream: Bytes,
    /// The frame is a keyframe.
    pub is_keyframe: bool,
    /// Spatial id of the layer.
    pub spatial_id: u8,
    /// Quantizer the frame was encoded with.
    pub qp: u8,
    /// Buffers the frame predicts from, as requested.
    pub referenced_buffers: Vec<u8>,
}

/// Per-layer result delivered to the callback of [`VideoEncoder::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeResult {
    /// The layer was encoded.
    Encoded(EncodedData),
    /// The layer was dropped.
    Dropped(DroppedFrame),
}

/// A layered video encoder.
pub trait VideoEncoder {
    /// Encodes one temporal unit.
    ///
    /// `on_result` is called synchronously, once for each layer in
    /// `frame_settings` that reaches the output stage, in spatial id order.
    fn encode(
        &mut self,
        frame: &I420Buffer,
        temporal_unit: &TemporalUnitSettings,
        frame_settings: &[FrameEncodeSettings],
        on_result: &mut dyn FnMut(EncodeResult),
    ) -> Result<()>;
}

/// Configuration last pushed to the engine. `None` means unknown, so the
/// next encode applies it unconditionally.
#[derive(Debug, Clone, Copy, Default)]
struct AppliedState {
    effort_level: Option<i32>,
    content_hint: Option<ContentHint>,
    dimensions: Option<Resolution>,
}

/// Drives an [`EncoderEngine`] to encode all spatial layers of a temporal
/// unit.
///
/// Every spatial layer from 0 up to the highest requested one is encoded on
/// each call. Layers missing from the request are encoded with placeholder
/// settings and their output is discarded.
pub struct SvcEncoder<E> {
    engine: E,
    settings: EncoderSettings,
    config: EngineConfig,
    applied: AppliedState,
}

impl<E: EncoderEngine> SvcEncoder<E> {
    /// Initializes `engine` for encodes of up to
    /// `settings.max_encode_dimensions`.
    pub fn new(mut engine: E, settings: EncoderSettings) -> Result<Self> {
        if !EFFORT_LEVEL_RANGE.contains(&settings.initial_effort_level) {
            return Err(
                ValidationError::EffortLevelOutOfRange(settings.initial_effort_level).into(),
            );
        }

        let layout = ThreadingLayout::for_resolution(
            settings.max_encode_dimensions,
            settings.max_number_of_threads,
        );
        let config = EngineConfig {
            resolution: settings.max_encode_dimensions,
            threads: layout.threads,
            timebase_den: settings.timebase,
            lag_in_frames: 0,
            end_usage: match settings.rc_mode {
                RateControlMode::Cbr => EndUsage::Cbr,
                RateControlMode::Cqp => EndUsage::Q,
            },
            target_bitrate_kbps: 0,
            realtime: true,
        };

        engine
            .init(&config)
            .map_err(|e| Av1Error::engine("initialize", e))?;
        debug!(?config, "initialized encoder engine");

        let mut encoder = Self {
            engine,
            settings,
            config,
            applied: AppliedState::default(),
        };
        encoder.control(Control::Speed(BASE_SPEED - settings.initial_effort_level))?;
        encoder.control(Control::RowMultiThreading(true))?;
        encoder.applied = AppliedState {
            effort_level: Some(settings.initial_effort_level),
            content_hint: Some(ContentHint::Camera),
            dimensions: None,
        };

        Ok(encoder)
    }

    /// Returns the encoder settings.
    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }

    /// Returns a reference to the engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Consumes the encoder and returns the engine.
    pub fn into_engine(self) -> E {
        self.engine
    }

    fn control(&mut self, control: Control) -> Result<()> {
        let operation = control_operation(&control);
        self.engine
            .set_control(control)
            .map_err(|e| Av1Error::engine(operation, e))
    }

    fn apply_settings(
        &mut self,
        frame: &I420Buffer,
        temporal_unit: &TemporalUnitSettings,
        frame_settings: &[FrameEncodeSettings],
    ) -> Result<()> {
        if self.applied.effort_level != Some(temporal_unit.effort_level) {
            let speed = BASE_SPEED - temporal_unit.effort_level;
            debug!(effort_level = temporal_unit.effort_level, speed, "updating speed");
            self.control(Control::Speed(speed))?;
            self.applied.effort_level = Some(temporal_unit.effort_level);
        }

        if self.applied.content_hint != Some(temporal_unit.content_hint) {
            let tune = match temporal_unit.content_hint {
                ContentHint::Screen => TuneContent::Screen,
                ContentHint::Camera => TuneContent::Default,
            };
            debug!(content_hint = ?temporal_unit.content_hint, "updating content tuning");
            self.control(Control::TuneContent(tune))?;
            self.applied.content_hint = Some(temporal_unit.content_hint);
        }

        let target_bitrate_kbps = bps_to_kbps(aggregate_target_bitrate_bps(frame_settings));
        if target_bitrate_kbps != self.config.target_bitrate_kbps {
            debug!(target_bitrate_kbps, "updating target bitrate");
            self.config.target_bitrate_kbps = target_bitrate_kbps;
        }

        let dimensions = frame.resolution();
        if self.applied.dimensions != Some(dimensions) {
            let layout =
                ThreadingLayout::for_resolution(dimensions, self.settings.max_number_of_threads);
            self.config.resolution = dimensions;
            self.config.threads = layout.threads;
            self.control(Control::TileRows(layout.tile_rows_log2))?;
            self.control(Control::SuperblockSize(layout.superblock_size))?;
            self.applied.dimensions = Some(dimensions);
        }

        self.engine
            .set_config(&self.config)
            .map_err(|e| Av1Error::engine("set config", e))?;
        self.control(Control::SvcParams(Box::new(svc_params(frame_settings))))
    }

    fn encode_layers(
        &mut self,
        frame: &I420Buffer,
        temporal_unit: &TemporalUnitSettings,
        frame_settings: &[FrameEncodeSettings],
        on_result: &mut dyn FnMut(EncodeResult),
    ) -> Result<()> {
        let pts = i64::try_from(self.settings.ticks(temporal_unit.presentation_timestamp))
            .unwrap_or(i64::MAX);
        let max_spatial_id = frame_settings
            .last()
            .map_or(0, |settings| settings.spatial_id);

        let mut missing_output = None;
        for spatial_id in 0..=max_spatial_id {
            let requested = frame_settings
                .iter()
                .find(|settings| settings.spatial_id == spatial_id);
            let placeholder;
            let settings = match requested {
                Some(settings) => settings,
                None => {
                    placeholder = FrameEncodeSettings {
                        spatial_id,
                        ..Default::default()
                    };
                    &placeholder
                }
            };

            self.control(Control::SvcLayerId(LayerId {
                spatial_layer_id: spatial_id,
                temporal_layer_id: settings.temporal_id,
            }))?;
            self.control(Control::SvcRefFrameConfig(svc_ref_frame_config(settings)))?;

            let duration = match settings.rate_options {
                RateOptions::Cbr { duration, .. } => self.settings.ticks(duration).max(1),
                RateOptions::Cqp { .. } => 1,
            };
            let flags = EncodeFlags {
                force_keyframe: settings.keyframe,
            };
            trace!(
                spatial_id,
                temporal_id = settings.temporal_id,
                pts,
                duration,
                keyframe = settings.keyframe,
                placeholder = requested.is_none(),
                "encoding layer"
            );
            self.engine
                .encode(frame, pts, duration, flags)
                .map_err(|e| Av1Error::engine("encode", e))?;

            let Some(settings) = requested else {
                let discarded = std::iter::from_fn(|| self.engine.next_packet()).count();
                trace!(spatial_id, discarded, "discarded placeholder layer output");
                continue;
            };

            match self.next_frame_packet() {
                Some((bitstream, is_keyframe)) => {
                    // The drained packet cannot be delivered without its qp.
                    let qp = match self.engine.last_quantizer() {
                        Ok(qp) => qp,
                        Err(e) => {
                            on_result(EncodeResult::Dropped(DroppedFrame {
                                reason: DropReason::Error,
                                spatial_id,
                            }));
                            return Err(Av1Error::engine("query last quantizer", e));
                        }
                    };
                    check_layer_ids(&bitstream, settings);
                    on_result(EncodeResult::Encoded(EncodedData {
                        bitstream,
                        is_keyframe,
                        spatial_id,
                        qp,
                        referenced_buffers: settings.reference_buffers.clone(),
                    }));
                }
                None => {
                    error!(spatial_id, "engine produced no frame for requested layer");
                    on_result(EncodeResult::Dropped(DroppedFrame {
                        reason: DropReason::Error,
                        spatial_id,
                    }));
                    missing_output.get_or_insert(spatial_id);
                }
            }
        }

        match missing_output {
            Some(spatial_id) => Err(Av1Error::MissingOutput { spatial_id }),
            None => Ok(()),
        }
    }

    /// Drains all packets of the last encode and returns the first
    /// non-empty frame.
    fn next_frame_packet(&mut self) -> Option<(Bytes, bool)> {
        let mut frame = None;
        while let Some(packet) = self.engine.next_packet() {
            if let EnginePacket::Frame { data, is_keyframe } = packet
                && frame.is_none()
                && !data.is_empty()
            {
                frame = Some((data, is_keyframe));
            }
        }
        frame
    }
}

impl<E: EncoderEngine> VideoEncoder for SvcEncoder<E> {
    fn encode(
        &mut self,
        frame: &I420Buffer,
        temporal_unit: &TemporalUnitSettings,
        frame_settings: &[FrameEncodeSettings],
        on_result: &mut dyn FnMut(EncodeResult),
    ) -> Result<()> {
        validate_encode_params(frame, temporal_unit, frame_settings, &self.settings)?;

        let result = self
            .apply_settings(frame, temporal_unit, frame_settings)
            .and_then(|()| self.encode_layers(frame, temporal_unit, frame_settings, on_result));
        if let Err(error) = &result {
            error!(%error, "encode failed, configuration will be re-applied");
            self.applied = AppliedState::default();
        }
        result
    }
}

fn check_layer_ids(bitstream: &[u8], settings: &FrameEncodeSettings) {
    match first_extension_header(bitstream) {
        Ok(Some(extension))
            if extension.spatial_id != settings.spatial_id
                || extension.temporal_id != settings.temporal_id =>
        {
            warn!(
                expected_spatial_id = settings.spatial_id,
                expected_temporal_id = settings.temporal_id,
                spatial_id = extension.spatial_id,
                temporal_id = extension.temporal_id,
                "layer ids of encoded frame do not match the request"
            );
        }
        Ok(_) => {}
        Err(error) => {
            warn!(spatial_id = settings.spatial_id, %error, "could not read encoded frame OBUs");
        }
    }
}

fn control_operation(control: &Control) -> &'static str {
    match control {
        Control::Speed(_) => "set speed",
        Control::TuneContent(_) => "set content tuning",
        Control::RowMultiThreading(_) => "enable row multithreading",
        Control::TileRows(_) => "set tile rows",
        Control::SuperblockSize(_) => "set superblock size",
        Control::SvcParams(_) => "set svc params",
        Control::SvcLayerId(_) => "set svc layer id",
        Control::SvcRefFrameConfig(_) => "set svc reference frame config",
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use std::collections::VecDeque;
    use std::time::Duration;

    use super::*;
    use crate::engine::{SuperblockSize, SvcRefFrameConfig};
    use crate::error::EngineError;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Init(EngineConfig),
        Control(Control),
        Config(EngineConfig),
        Encode { pts: i64, duration: u64, keyframe: bool },
    }

    /// Records every call and answers each encode with one frame packet.
    #[derive(Default)]
    struct RecordingEngine {
        calls: Vec<Call>,
        pending: VecDeque<EnginePacket>,
        fail_encode: bool,
        fail_quantizer: bool,
        silent_layers: Vec<u8>,
        layer: LayerId,
    }

    impl RecordingEngine {
        fn controls(&self) -> Vec<&Control> {
            self.calls
                .iter()
                .filter_map(|call| match call {
                    Call::Control(control) => Some(control),
                    _ => None,
                })
                .collect()
        }

        fn encodes(&self) -> usize {
            self.calls
                .iter()
                .filter(|call| matches!(call, Call::Encode { .. }))
                .count()
        }
    }

    impl EncoderEngine for RecordingEngine {
        fn init(&mut self, config: &EngineConfig) -> std::result::Result<(), EngineError> {
            self.calls.push(Call::Init(*config));
            Ok(())
        }

        fn set_control(&mut self, control: Control) -> std::result::Result<(), EngineError> {
            if let Control::SvcLayerId(layer) = control {
                self.layer = layer;
            }
            self.calls.push(Call::Control(control));
            Ok(())
        }

        fn set_config(&mut self, config: &EngineConfig) -> std::result::Result<(), EngineError> {
            self.calls.push(Call::Config(*config));
            Ok(())
        }

        fn encode(
            &mut self,
            _image: &I420Buffer,
            pts: i64,
            duration: u64,
            flags: EncodeFlags,
        ) -> std::result::Result<(), EngineError> {
            self.calls.push(Call::Encode {
                pts,
                duration,
                keyframe: flags.force_keyframe,
            });
            if self.fail_encode {
                return Err(EngineError::new("out of memory"));
            }
            self.pending.push_back(EnginePacket::Other);
            if !self.silent_layers.contains(&self.layer.spatial_layer_id) {
                self.pending.push_back(EnginePacket::Frame {
                    data: Bytes::from(vec![self.layer.spatial_layer_id + 1; 4]),
                    is_keyframe: flags.force_keyframe,
                });
            }
            Ok(())
        }

        fn next_packet(&mut self) -> Option<EnginePacket> {
            self.pending.pop_front()
        }

        fn last_quantizer(&mut self) -> std::result::Result<u8, EngineError> {
            if self.fail_quantizer {
                return Err(EngineError::new("no frame statistics"));
            }
            Ok(20 + self.layer.spatial_layer_id)
        }
    }

    fn cbr_layer(spatial_id: u8, kbps: u64) -> FrameEncodeSettings {
        FrameEncodeSettings {
            spatial_id,
            reference_buffers: vec![spatial_id],
            update_buffers: vec![spatial_id],
            rate_options: RateOptions::Cbr {
                duration: Duration::from_millis(33),
                target_bitrate_bps: kbps * 1000,
            },
            ..Default::default()
        }
    }

    fn encoder() -> SvcEncoder<RecordingEngine> {
        SvcEncoder::new(RecordingEngine::default(), EncoderSettings::default()).unwrap()
    }

    fn encode(
        encoder: &mut SvcEncoder<RecordingEngine>,
        temporal_unit: &TemporalUnitSettings,
        frame_settings: &[FrameEncodeSettings],
    ) -> (Result<()>, Vec<EncodeResult>) {
        let mut results = Vec::new();
        let result = encoder.encode(
            &I420Buffer::new(1280, 720),
            temporal_unit,
            frame_settings,
            &mut |r| results.push(r),
        );
        (result, results)
    }

    #[test]
    fn test_new_initializes_engine() {
        let encoder = encoder();
        let calls = &encoder.engine().calls;
        let Call::Init(config) = &calls[0] else {
            panic!("expected init, got {:?}", calls[0]);
        };
        assert_eq!(config.resolution, Resolution::new(1920, 1080));
        assert_eq!(config.threads, 8);
        assert_eq!(config.timebase_den, 1_000_000);
        assert_eq!(config.end_usage, EndUsage::Cbr);
        assert!(config.realtime);
        assert_eq!(
            calls[1..],
            [
                Call::Control(Control::Speed(8)),
                Call::Control(Control::RowMultiThreading(true))
            ]
        );
    }

    #[test]
    fn test_new_rejects_initial_effort_level() {
        let settings = EncoderSettings {
            initial_effort_level: 5,
            ..Default::default()
        };
        let err = SvcEncoder::new(RecordingEngine::default(), settings)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            Av1Error::InvalidParams(ValidationError::EffortLevelOutOfRange(5))
        ));
    }

    #[test]
    fn test_encode_single_layer() {
        let mut encoder = encoder();
        let temporal_unit = TemporalUnitSettings {
            presentation_timestamp: Duration::from_millis(100),
            ..Default::default()
        };
        let (result, results) = encode(&mut encoder, &temporal_unit, &[cbr_layer(0, 500)]);
        result.unwrap();
        assert_eq!(
            results,
            [EncodeResult::Encoded(EncodedData {
                bitstream: Bytes::from_static(&[1; 4]),
                is_keyframe: false,
                spatial_id: 0,
                qp: 20,
                referenced_buffers: vec![0],
            })]
        );

        let engine = encoder.engine();
        assert!(engine.calls.contains(&Call::Encode {
            pts: 100_000,
            duration: 33_000,
            keyframe: false
        }));
        let config = engine
            .calls
            .iter()
            .find_map(|call| match call {
                Call::Config(config) => Some(config),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.target_bitrate_kbps, 500);
        assert_eq!(config.resolution, Resolution::new(1280, 720));
        assert_eq!(config.threads, 4);
    }

    #[test]
    fn test_missing_layers_are_encoded_with_placeholder() {
        let mut encoder = encoder();
        let (result, results) = encode(
            &mut encoder,
            &TemporalUnitSettings::default(),
            &[cbr_layer(0, 100), cbr_layer(2, 400)],
        );
        result.unwrap();

        assert_eq!(encoder.engine().encodes(), 3);
        let spatial_ids: Vec<_> = results
            .iter()
            .map(|result| match result {
                EncodeResult::Encoded(data) => data.spatial_id,
                EncodeResult::Dropped(dropped) => panic!("unexpected drop {dropped:?}"),
            })
            .collect();
        assert_eq!(spatial_ids, [0, 2]);

        let placeholder_config = encoder
            .engine()
            .controls()
            .into_iter()
            .skip_while(|control| {
                **control
                    != Control::SvcLayerId(LayerId {
                        spatial_layer_id: 1,
                        temporal_layer_id: 0,
                    })
            })
            .nth(1)
            .cloned();
        assert_eq!(
            placeholder_config,
            Some(Control::SvcRefFrameConfig(SvcRefFrameConfig::default()))
        );
        assert!(encoder.engine().calls.contains(&Call::Encode {
            pts: 0,
            duration: 1,
            keyframe: false
        }));
    }

    #[test]
    fn test_controls_only_sent_on_change() {
        let mut encoder = encoder();
        let layers = [cbr_layer(0, 300)];
        let temporal_unit = TemporalUnitSettings::default();
        encode(&mut encoder, &temporal_unit, &layers).0.unwrap();
        let first = encoder.engine().controls().len();
        assert!(
            encoder
                .engine()
                .controls()
                .contains(&&Control::SuperblockSize(SuperblockSize::Dynamic))
        );

        encoder.engine.calls.clear();
        encode(&mut encoder, &temporal_unit, &layers).0.unwrap();
        let controls = encoder.engine().controls();
        assert!(controls.len() < first);
        assert!(!controls.iter().any(|control| matches!(
            control,
            Control::Speed(_) | Control::TuneContent(_) | Control::TileRows(_)
        )));

        encoder.engine.calls.clear();
        let temporal_unit = TemporalUnitSettings {
            content_hint: ContentHint::Screen,
            effort_level: -2,
            ..Default::default()
        };
        encode(&mut encoder, &temporal_unit, &layers).0.unwrap();
        let controls = encoder.engine().controls();
        assert!(controls.contains(&&Control::Speed(10)));
        assert!(controls.contains(&&Control::TuneContent(TuneContent::Screen)));
    }

    #[test]
    fn test_validation_failure_reaches_no_engine() {
        let mut encoder = encoder();
        encoder.engine.calls.clear();
        let mut keyframe = cbr_layer(0, 300);
        keyframe.keyframe = true;
        let (result, results) = encode(&mut encoder, &TemporalUnitSettings::default(), &[keyframe]);
        assert!(matches!(
            result,
            Err(Av1Error::InvalidParams(ValidationError::KeyframeWithReferences { spatial_id: 0 }))
        ));
        assert!(results.is_empty());
        assert!(encoder.engine().calls.is_empty());
    }

    #[test]
    fn test_missing_output_drops_layer() {
        let mut encoder = encoder();
        encoder.engine.silent_layers = vec![0];
        let (result, results) = encode(
            &mut encoder,
            &TemporalUnitSettings::default(),
            &[cbr_layer(0, 100), cbr_layer(1, 400)],
        );
        assert!(matches!(result, Err(Av1Error::MissingOutput { spatial_id: 0 })));
        assert_eq!(
            results[0],
            EncodeResult::Dropped(DroppedFrame {
                reason: DropReason::Error,
                spatial_id: 0
            })
        );
        assert!(matches!(&results[1], EncodeResult::Encoded(data) if data.spatial_id == 1));
    }

    #[test]
    fn test_failure_reapplies_configuration() {
        let mut encoder = encoder();
        let layers = [cbr_layer(0, 300)];
        let temporal_unit = TemporalUnitSettings::default();
        encode(&mut encoder, &temporal_unit, &layers).0.unwrap();

        encoder.engine.fail_encode = true;
        let (result, _) = encode(&mut encoder, &temporal_unit, &layers);
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "encoder engine failed to encode: out of memory");

        encoder.engine.fail_encode = false;
        encoder.engine.calls.clear();
        encode(&mut encoder, &temporal_unit, &layers).0.unwrap();
        let controls = encoder.engine().controls();
        assert!(controls.contains(&&Control::Speed(8)));
        assert!(controls.contains(&&Control::TuneContent(TuneContent::Default)));
        assert!(controls.contains(&&Control::TileRows(0)));
    }

    #[test]
    fn test_quantizer_failure_drops_layer() {
        let mut encoder = encoder();
        encoder.engine.fail_quantizer = true;
        let (result, results) = encode(
            &mut encoder,
            &TemporalUnitSettings::default(),
            &[cbr_layer(0, 100), cbr_layer(1, 400)],
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "encoder engine failed to query last quantizer: no frame statistics"
        );
        assert_eq!(
            results,
            [EncodeResult::Dropped(DroppedFrame {
                reason: DropReason::Error,
                spatial_id: 0
            })]
        );
        assert_eq!(encoder.engine().encodes(), 1);
    }

    #[test]
    fn test_presentation_timestamp_saturates() {
        let mut encoder = encoder();
        let temporal_unit = TemporalUnitSettings {
            presentation_timestamp: Duration::MAX,
            ..Default::default()
        };
        encode(&mut encoder, &temporal_unit, &[cbr_layer(0, 300)])
            .0
            .unwrap();
        assert!(encoder.engine().calls.contains(&Call::Encode {
            pts: i64::MAX,
            duration: 33_000,
            keyframe: false
        }));
    }

    #[test]
    fn test_cqp_encode() {
        let settings = EncoderSettings {
            rc_mode: RateControlMode::Cqp,
            ..Default::default()
        };
        let mut encoder = SvcEncoder::new(RecordingEngine::default(), settings).unwrap();
        let layer = FrameEncodeSettings {
            keyframe: true,
            update_buffers: vec![0],
            rate_options: RateOptions::Cqp { target_qp: 40 },
            ..Default::default()
        };
        let (result, results) = encode(&mut encoder, &TemporalUnitSettings::default(), &[layer]);
        result.unwrap();
        assert!(matches!(&results[0], EncodeResult::Encoded(data) if data.is_keyframe));

        let engine = encoder.engine();
        assert!(engine.calls.contains(&Call::Encode {
            pts: 0,
            duration: 1,
            keyframe: true
        }));
        let Some(Control::SvcParams(params)) = engine
            .controls()
            .into_iter()
            .find(|control| matches!(control, Control::SvcParams(_)))
        else {
            panic!("svc params not set");
        };
        assert_eq!(params.min_quantizers[0], 40);
        assert_eq!(params.max_quantizers[0], 40);
        assert_eq!(params.layer_target_bitrate_kbps[0], 1);
    }
}
