//! Exponential-Golomb coding as used by H.264/H.265 syntax (`ue(v)` / `se(v)`).
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

use std::io;

use bytes_util::{BitReader, BitWriter};

/// Exp-Golomb decoding for [`BitReader`].
pub trait BitReaderExpGolombExt {
    /// Reads an unsigned Exp-Golomb code (`ue(v)`).
    fn read_exp_golomb(&mut self) -> io::Result<u64>;

    /// Reads a signed Exp-Golomb code (`se(v)`).
    fn read_signed_exp_golomb(&mut self) -> io::Result<i64>;
}

impl<R: io::Read> BitReaderExpGolombExt for BitReader<R> {
    fn read_exp_golomb(&mut self) -> io::Result<u64> {
        let mut leading_zeros = 0u8;
        while !self.read_bit()? {
            leading_zeros += 1;
            if leading_zeros > 63 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "exp-golomb code has more than 63 leading zeros",
                ));
            }
        }

        let suffix = self.read_bits(leading_zeros)?;
        Ok((1u64 << leading_zeros) - 1 + suffix)
    }

    fn read_signed_exp_golomb(&mut self) -> io::Result<i64> {
        let code = self.read_exp_golomb()?;
        if code % 2 == 1 {
            Ok(code.div_ceil(2) as i64)
        } else {
            Ok(-((code / 2) as i64))
        }
    }
}

/// Exp-Golomb encoding for [`BitWriter`].
pub trait BitWriterExpGolombExt {
    /// Appends `value` as an unsigned Exp-Golomb code.
    ///
    /// With `v = value + 1` and `k = floor(log2(v))` this writes `k` zero
    /// bits followed by the `k + 1` bit binary form of `v`.
    ///
    /// # Panics
    ///
    /// Panics if `value == u64::MAX`.
    fn append_ue(&mut self, value: u64);

    /// Appends `value` as a signed Exp-Golomb code.
    ///
    /// Positive values map to `2 * value - 1`, everything else to `-2 * value`.
    ///
    /// # Panics
    ///
    /// Panics if `value == i64::MIN`.
    fn append_se(&mut self, value: i64);
}

impl BitWriterExpGolombExt for BitWriter {
    fn append_ue(&mut self, value: u64) {
        assert!(value < u64::MAX, "append_ue: {value} has no 64-bit code");
        let v = value + 1;
        let k = u64::BITS - 1 - v.leading_zeros();
        self.append_bits(k, 0);
        self.append_bits(k + 1, v);
    }

    fn append_se(&mut self, value: i64) {
        assert!(value > i64::MIN, "append_se: {value} has no 64-bit code");
        self.append_ue(signed_to_code(value));
    }
}

/// Maps a signed value to its unsigned Exp-Golomb code number.
pub fn signed_to_code(value: i64) -> u64 {
    if value > 0 {
        (value as u64) * 2 - 1
    } else {
        value.unsigned_abs() * 2
    }
}
