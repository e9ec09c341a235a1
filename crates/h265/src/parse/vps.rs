use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use super::{
    ProfileTierLevel, SubLayerOrderingInfo, invalid, parse_sub_layer_ordering_info, unsupported,
};

/// Video parameter set.
/// ISO/IEC-23008-2-2020 - 7.3.2.1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vps {
    /// `vps_video_parameter_set_id`
    ///
    /// 4 bits
    pub vps_video_parameter_set_id: u8,
    /// `vps_base_layer_internal_flag`
    pub vps_base_layer_internal_flag: bool,
    /// `vps_base_layer_available_flag`
    pub vps_base_layer_available_flag: bool,
    /// `vps_max_layers_minus1`
    ///
    /// 6 bits
    pub vps_max_layers_minus1: u8,
    /// `vps_max_sub_layers_minus1`
    ///
    /// 3 bits
    pub vps_max_sub_layers_minus1: u8,
    /// `vps_temporal_id_nesting_flag`
    pub vps_temporal_id_nesting_flag: bool,
    /// `profile_tier_level(1, vps_max_sub_layers_minus1)`
    pub profile_tier_level: ProfileTierLevel,
    /// Sub-layer ordering info, one entry per signalled sub-layer.
    pub sub_layer_ordering_info: Vec<SubLayerOrderingInfo>,
    /// `vps_max_layer_id`
    ///
    /// 6 bits
    pub vps_max_layer_id: u8,
    /// `vps_num_layer_sets_minus1`
    pub vps_num_layer_sets_minus1: u64,
    /// Present if `vps_timing_info_present_flag` is set.
    pub timing_info: Option<VpsTimingInfo>,
    /// `vps_extension_flag`
    pub vps_extension_flag: bool,
}

/// VPS timing information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VpsTimingInfo {
    /// `vps_num_units_in_tick`
    pub vps_num_units_in_tick: u32,
    /// `vps_time_scale`
    pub vps_time_scale: u32,
    /// `vps_num_ticks_poc_diff_one_minus1`, if
    /// `vps_poc_proportional_to_timing_flag` is set.
    pub vps_num_ticks_poc_diff_one_minus1: Option<u64>,
}

impl Vps {
    /// Parses a VPS from its RBSP (the bytes after the NAL unit header).
    pub fn parse(rbsp: &[u8]) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(io::Cursor::new(rbsp));

        let vps_video_parameter_set_id = bit_reader.read_bits(4)? as u8;
        let vps_base_layer_internal_flag = bit_reader.read_bit()?;
        let vps_base_layer_available_flag = bit_reader.read_bit()?;
        let vps_max_layers_minus1 = bit_reader.read_bits(6)? as u8;
        let vps_max_sub_layers_minus1 = bit_reader.read_bits(3)? as u8;
        if vps_max_sub_layers_minus1 > 6 {
            return Err(invalid(format!(
                "vps_max_sub_layers_minus1 {vps_max_sub_layers_minus1} is greater than 6"
            )));
        }
        let vps_temporal_id_nesting_flag = bit_reader.read_bit()?;

        let reserved = bit_reader.read_bits(16)?;
        if reserved != 0xFFFF {
            return Err(invalid(format!(
                "vps_reserved_0xffff_16bits is {reserved:#06x}"
            )));
        }

        let profile_tier_level =
            ProfileTierLevel::parse(&mut bit_reader, vps_max_sub_layers_minus1)?;
        let sub_layer_ordering_info =
            parse_sub_layer_ordering_info(&mut bit_reader, vps_max_sub_layers_minus1)?;

        let vps_max_layer_id = bit_reader.read_bits(6)? as u8;
        let vps_num_layer_sets_minus1 = bit_reader.read_exp_golomb()?;
        // layer_id_included_flag[i][j]
        let included_flags = vps_num_layer_sets_minus1
            .checked_mul(vps_max_layer_id as u64 + 1)
            .and_then(|bits| usize::try_from(bits).ok())
            .ok_or_else(|| invalid("vps_num_layer_sets_minus1 is too large"))?;
        bit_reader.seek_bits(included_flags)?;

        let timing_info = if bit_reader.read_bit()? {
            let vps_num_units_in_tick = bit_reader.read_bits(32)? as u32;
            let vps_time_scale = bit_reader.read_bits(32)? as u32;
            let vps_num_ticks_poc_diff_one_minus1 = if bit_reader.read_bit()? {
                Some(bit_reader.read_exp_golomb()?)
            } else {
                None
            };
            if bit_reader.read_exp_golomb()? != 0 {
                return Err(unsupported("hrd_parameters"));
            }
            Some(VpsTimingInfo {
                vps_num_units_in_tick,
                vps_time_scale,
                vps_num_ticks_poc_diff_one_minus1,
            })
        } else {
            None
        };

        let vps_extension_flag = bit_reader.read_bit()?;

        Ok(Vps {
            vps_video_parameter_set_id,
            vps_base_layer_internal_flag,
            vps_base_layer_available_flag,
            vps_max_layers_minus1,
            vps_max_sub_layers_minus1,
            vps_temporal_id_nesting_flag,
            profile_tier_level,
            sub_layer_ordering_info,
            vps_max_layer_id,
            vps_num_layer_sets_minus1,
            timing_info,
            vps_extension_flag,
        })
    }
}
