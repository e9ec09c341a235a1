//! A crate for building and parsing synthetic H.265 Annex-B frames.
//!
//! Supports:
//! - NAL unit framing with emulation prevention ([`NaluBuilder`])
//! - Key frames carrying VPS, SPS, PPS and an IDR slice ([`build_key_frame`])
//! - Delta frames carrying a single `TRAIL_N` slice ([`build_delta_frame`])
//! - Parsing the parameter sets and slice headers back ([`parse`])
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

pub mod builder;
mod enums;
pub mod frame;
pub mod parse;

pub use builder::{NaluBuilder, START_CODE};
pub use enums::{NALUnitType, NumTemporalLayers, SliceType};
pub use frame::{build_delta_frame, build_key_frame};
