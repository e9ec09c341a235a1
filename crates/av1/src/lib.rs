//! A crate for encoding AV1 spatial and temporal scalable (SVC) video.
//!
//! Supports:
//! - Validating per temporal unit layer requests ([`validate_encode_params`])
//! - Mapping reference and update buffers onto named reference slots
//! - Deriving layer structure and rate targets for the encoder engine
//! - Orchestrating one engine encode per spatial layer ([`SvcEncoder`])
//! - OBU header and LEB128 parsing and writing ([`obu`])
//!
//! The native encoder is abstracted by [`EncoderEngine`].
//!
//! ## License
//!
//! This project is licensed under the [MIT](./LICENSE.MIT) or
//! [Apache-2.0](./LICENSE.Apache-2.0) license. You can choose between one of
//! them if you use this work.
//!
//! `SPDX-License-Identifier: MIT OR Apache-2.0`
#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod encoder;
pub mod engine;
pub mod error;
mod frame;
mod layer_config;
pub mod obu;
mod settings;
mod threading;

pub use encoder::{
    DropReason, DroppedFrame, EncodeResult, EncodedData, SvcEncoder, VideoEncoder,
};
pub use engine::EncoderEngine;
pub use error::{Av1Error, EngineError, Result, ValidationError};
pub use frame::I420Buffer;
pub use layer_config::{
    EFFORT_LEVEL_RANGE, MAX_QP, MAX_REFERENCE_BUFFERS, PREFERRED_SLOT_NAMES,
    aggregate_target_bitrate_bps, svc_params, svc_ref_frame_config, validate_encode_params,
};
pub use obu::{ObuExtensionHeader, ObuHeader, ObuType, first_extension_header};
pub use settings::{
    ContentHint, EncoderSettings, FrameEncodeSettings, RateControlMode, RateOptions, Resolution,
    ResolutionScale, TemporalUnitSettings,
};
pub use threading::ThreadingLayout;
