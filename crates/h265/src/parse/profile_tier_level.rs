use std::io;

use bytes_util::BitReader;

/// `profile_tier_level(1, maxNumSubLayersMinus1)`
/// ISO/IEC-23008-2-2020 - 7.3.3
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileTierLevel {
    /// `general_profile_space`
    ///
    /// 2 bits
    pub general_profile_space: u8,
    /// `general_tier_flag`
    pub general_tier_flag: bool,
    /// `general_profile_idc`
    ///
    /// 5 bits
    pub general_profile_idc: u8,
    /// `general_profile_compatibility_flag[j]` packed MSB-first.
    pub general_profile_compatibility_flags: u32,
    /// `general_progressive_source_flag`
    pub general_progressive_source_flag: bool,
    /// `general_interlaced_source_flag`
    pub general_interlaced_source_flag: bool,
    /// `general_non_packed_constraint_flag`
    pub general_non_packed_constraint_flag: bool,
    /// `general_frame_only_constraint_flag`
    pub general_frame_only_constraint_flag: bool,
    /// `general_level_idc`
    pub general_level_idc: u8,
    /// One entry per sub-layer below the highest one.
    pub sub_layers: Vec<SubLayerProfileLevel>,
}

/// Per sub-layer part of [`ProfileTierLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubLayerProfileLevel {
    /// `sub_layer_profile_present_flag[i]`
    pub sub_layer_profile_present_flag: bool,
    /// `sub_layer_level_present_flag[i]`
    pub sub_layer_level_present_flag: bool,
    /// `sub_layer_level_idc[i]`, if present.
    pub sub_layer_level_idc: Option<u8>,
}

impl ProfileTierLevel {
    /// Parses `profile_tier_level` with `profilePresentFlag = 1`.
    pub fn parse<R: io::Read>(
        bit_reader: &mut BitReader<R>,
        max_sub_layers_minus1: u8,
    ) -> io::Result<Self> {
        let general_profile_space = bit_reader.read_bits(2)? as u8;
        let general_tier_flag = bit_reader.read_bit()?;
        let general_profile_idc = bit_reader.read_bits(5)? as u8;
        let general_profile_compatibility_flags = bit_reader.read_bits(32)? as u32;
        let general_progressive_source_flag = bit_reader.read_bit()?;
        let general_interlaced_source_flag = bit_reader.read_bit()?;
        let general_non_packed_constraint_flag = bit_reader.read_bit()?;
        let general_frame_only_constraint_flag = bit_reader.read_bit()?;
        // general_reserved_zero_43bits and general_inbld_flag / reserved bit
        bit_reader.seek_bits(44)?;
        let general_level_idc = bit_reader.read_bits(8)? as u8;

        let mut flags = Vec::with_capacity(max_sub_layers_minus1 as usize);
        for _ in 0..max_sub_layers_minus1 {
            let profile_present = bit_reader.read_bit()?;
            let level_present = bit_reader.read_bit()?;
            flags.push((profile_present, level_present));
        }

        if max_sub_layers_minus1 > 0 {
            // reserved_zero_2bits
            bit_reader.seek_bits(2 * (8 - max_sub_layers_minus1 as usize))?;
        }

        let mut sub_layers = Vec::with_capacity(flags.len());
        for (profile_present, level_present) in flags {
            if profile_present {
                // profile space, tier, idc, compatibility and constraint flags
                bit_reader.seek_bits(88)?;
            }
            let sub_layer_level_idc = if level_present {
                Some(bit_reader.read_bits(8)? as u8)
            } else {
                None
            };
            sub_layers.push(SubLayerProfileLevel {
                sub_layer_profile_present_flag: profile_present,
                sub_layer_level_present_flag: level_present,
                sub_layer_level_idc,
            });
        }

        Ok(ProfileTierLevel {
            general_profile_space,
            general_tier_flag,
            general_profile_idc,
            general_profile_compatibility_flags,
            general_progressive_source_flag,
            general_interlaced_source_flag,
            general_non_packed_constraint_flag,
            general_frame_only_constraint_flag,
            general_level_idc,
            sub_layers,
        })
    }
}
