//! Annex-B splitting and parsing of the H.265 syntax structures produced by
//! [`crate::frame`].
//!
//! Optional syntax the builder never emits (scaling lists, PCM, long-term
//! reference pictures, tiles, weighted prediction, HRD parameters) is
//! rejected with [`io::ErrorKind::InvalidData`] instead of being skipped.

use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use crate::NALUnitType;

mod pps;
mod profile_tier_level;
mod rps;
mod slice;
mod sps;
mod vps;

pub use pps::Pps;
pub use profile_tier_level::{ProfileTierLevel, SubLayerProfileLevel};
pub use rps::ShortTermRefPicSet;
pub use slice::SliceSegmentHeader;
pub use sps::{ConformanceWindow, Sps};
pub use vps::{Vps, VpsTimingInfo};

/// Splits an Annex-B byte stream on `00 00 01` / `00 00 00 01` start codes.
///
/// The returned slices start at the NAL unit header and still contain
/// emulation-prevention bytes.
pub fn split_annex_b(data: &[u8]) -> Vec<&[u8]> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i + 3 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            starts.push(i + 3);
            i += 3;
        } else {
            i += 1;
        }
    }

    let mut nal_units = Vec::with_capacity(starts.len());
    for (n, &start) in starts.iter().enumerate() {
        let mut end = starts.get(n + 1).map_or(data.len(), |next| next - 3);
        // trailing_zero_8bits, or the leading zero of a 4-byte start code
        while end > start && data[end - 1] == 0 {
            end -= 1;
        }
        nal_units.push(&data[start..end]);
    }
    nal_units
}

/// Removes `emulation_prevention_three_byte`s, turning a NAL unit payload
/// back into its RBSP.
pub fn remove_emulation_prevention(data: &[u8]) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(data.len());
    let mut zeros = 0;
    for &byte in data {
        if zeros >= 2 && byte == 0x03 {
            zeros = 0;
            continue;
        }
        rbsp.push(byte);
        zeros = if byte == 0x00 { zeros + 1 } else { 0 };
    }
    rbsp
}

/// `nal_unit_header()`
/// ISO/IEC-23008-2-2020 - 7.3.1.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NalUnitHeader {
    /// `nal_unit_type`
    ///
    /// 6 bits
    pub nal_unit_type: NALUnitType,
    /// `nuh_layer_id`
    ///
    /// 6 bits
    pub nuh_layer_id: u8,
    /// `nuh_temporal_id_plus1 - 1`
    pub temporal_id: u8,
}

impl NalUnitHeader {
    /// Parses the two-byte NAL unit header.
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(io::Cursor::new(data));

        if bit_reader.read_bit()? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "forbidden_zero_bit is not 0",
            ));
        }

        let nal_unit_type = NALUnitType::from(bit_reader.read_bits(6)? as u8);
        let nuh_layer_id = bit_reader.read_bits(6)? as u8;
        let temporal_id_plus1 = bit_reader.read_bits(3)? as u8;
        if temporal_id_plus1 == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "nuh_temporal_id_plus1 is 0",
            ));
        }

        Ok(NalUnitHeader {
            nal_unit_type,
            nuh_layer_id,
            temporal_id: temporal_id_plus1 - 1,
        })
    }
}

/// A NAL unit split into its header and RBSP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NalUnit {
    /// The NAL unit header.
    pub header: NalUnitHeader,
    /// The payload after the header with emulation prevention removed.
    pub rbsp: Vec<u8>,
}

impl NalUnit {
    /// Parses one NAL unit as returned by [`split_annex_b`].
    pub fn parse(data: &[u8]) -> io::Result<Self> {
        let header = NalUnitHeader::parse(data)?;
        Ok(NalUnit {
            header,
            rbsp: remove_emulation_prevention(&data[2..]),
        })
    }
}

/// Sub-layer ordering info shared by the VPS and SPS.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubLayerOrderingInfo {
    /// `*_max_dec_pic_buffering_minus1[i]`
    pub max_dec_pic_buffering_minus1: u64,
    /// `*_max_num_reorder_pics[i]`
    pub max_num_reorder_pics: u64,
    /// `*_max_latency_increase_plus1[i]`
    pub max_latency_increase_plus1: u64,
}

/// Reads `*_sub_layer_ordering_info_present_flag` and the entries it
/// announces. Only the highest sub-layer is present when the flag is 0.
fn parse_sub_layer_ordering_info<R: io::Read>(
    bit_reader: &mut BitReader<R>,
    max_sub_layers_minus1: u8,
) -> io::Result<Vec<SubLayerOrderingInfo>> {
    let present = bit_reader.read_bit()?;
    let first = if present { 0 } else { max_sub_layers_minus1 };

    (first..=max_sub_layers_minus1)
        .map(|_| {
            Ok(SubLayerOrderingInfo {
                max_dec_pic_buffering_minus1: bit_reader.read_exp_golomb()?,
                max_num_reorder_pics: bit_reader.read_exp_golomb()?,
                max_latency_increase_plus1: bit_reader.read_exp_golomb()?,
            })
        })
        .collect()
}

fn unsupported(what: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("unsupported syntax: {what}"),
    )
}

fn invalid(what: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, what.into())
}

/// `Ceil(Log2(value))`
fn ceil_log2(value: u64) -> u8 {
    if value <= 1 {
        0
    } else {
        (u64::BITS - (value - 1).leading_zeros()) as u8
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_split_annex_b() {
        let data = [
            0, 0, 0, 1, 0x40, 0x01, 0xAA, 0, 0, 1, 0x42, 0x01, 0xBB, 0x00, 0, 0, 0, 1, 0x44, 0x01,
        ];
        let nal_units = split_annex_b(&data);
        assert_eq!(
            nal_units,
            [&[0x40, 0x01, 0xAA][..], &[0x42, 0x01, 0xBB], &[0x44, 0x01]]
        );
    }

    #[test]
    fn test_split_annex_b_without_start_code() {
        assert!(split_annex_b(&[0x40, 0x01, 0xAA]).is_empty());
    }

    #[test]
    fn test_remove_emulation_prevention() {
        assert_eq!(
            remove_emulation_prevention(&[0xAA, 0, 0, 3, 0, 0, 0, 3, 1, 0, 0, 3, 3, 0, 3]),
            [0xAA, 0, 0, 0, 0, 0, 1, 0, 0, 3, 0, 3]
        );
    }

    #[test]
    fn test_nal_unit_header() {
        let header = NalUnitHeader::parse(&[0x42, 0x01]).unwrap();
        insta::assert_debug_snapshot!(header, @r"
        NalUnitHeader {
            nal_unit_type: SpsNut,
            nuh_layer_id: 0,
            temporal_id: 0,
        }
        ");
    }

    #[test]
    fn test_nal_unit_header_forbidden_bit() {
        let err = NalUnitHeader::parse(&[0xC2, 0x01]).unwrap_err();
        assert_eq!(err.to_string(), "forbidden_zero_bit is not 0");
    }

    #[test]
    fn test_nal_unit_header_zero_temporal_id_plus1() {
        let err = NalUnitHeader::parse(&[0x42, 0x00]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_ceil_log2() {
        assert_eq!(ceil_log2(0), 0);
        assert_eq!(ceil_log2(1), 0);
        assert_eq!(ceil_log2(2), 1);
        assert_eq!(ceil_log2(3), 2);
        assert_eq!(ceil_log2(510), 9);
        assert_eq!(ceil_log2(512), 9);
    }
}
