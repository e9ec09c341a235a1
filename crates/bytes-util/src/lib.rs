//! Bit-level helpers shared by the codec crates.
//!
//! - [`BitWriter`]: MSB-first writer backed by a 64-bit register, with
//!   optional Annex-B emulation prevention.
//! - [`BitReader`]: MSB-first reader over any [`std::io::Read`].
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

mod bit_reader;
mod bit_writer;

pub use bit_reader::BitReader;
pub use bit_writer::{BUFFER_GROWTH_STEP, BitWriter};
