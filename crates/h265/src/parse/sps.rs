use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use super::{
    ProfileTierLevel, ShortTermRefPicSet, SubLayerOrderingInfo, invalid,
    parse_sub_layer_ordering_info, unsupported,
};
use crate::NumTemporalLayers;

/// Sequence parameter set up to `vui_parameters_present_flag`.
/// ISO/IEC-23008-2-2020 - 7.3.2.2
///
/// VUI and SPS extensions are not parsed. When VUI is present parsing stops
/// at its flag and [`sps_extension_present_flag`](Self::sps_extension_present_flag)
/// is `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sps {
    /// `sps_video_parameter_set_id`
    ///
    /// 4 bits
    pub sps_video_parameter_set_id: u8,
    /// `sps_max_sub_layers_minus1`
    ///
    /// 3 bits
    pub sps_max_sub_layers_minus1: u8,
    /// `sps_temporal_id_nesting_flag`
    pub sps_temporal_id_nesting_flag: bool,
    /// `profile_tier_level(1, sps_max_sub_layers_minus1)`
    pub profile_tier_level: ProfileTierLevel,
    /// `sps_seq_parameter_set_id`
    pub sps_seq_parameter_set_id: u64,
    /// `chroma_format_idc`
    pub chroma_format_idc: u8,
    /// `separate_colour_plane_flag`
    pub separate_colour_plane_flag: bool,
    /// `pic_width_in_luma_samples`
    pub pic_width_in_luma_samples: u64,
    /// `pic_height_in_luma_samples`
    pub pic_height_in_luma_samples: u64,
    /// Present if `conformance_window_flag` is set.
    pub conformance_window: Option<ConformanceWindow>,
    /// `bit_depth_luma_minus8`
    pub bit_depth_luma_minus8: u64,
    /// `bit_depth_chroma_minus8`
    pub bit_depth_chroma_minus8: u64,
    /// `log2_max_pic_order_cnt_lsb_minus4`
    pub log2_max_pic_order_cnt_lsb_minus4: u8,
    /// Sub-layer ordering info, one entry per signalled sub-layer.
    pub sub_layer_ordering_info: Vec<SubLayerOrderingInfo>,
    /// `log2_min_luma_coding_block_size_minus3`
    pub log2_min_luma_coding_block_size_minus3: u64,
    /// `log2_diff_max_min_luma_coding_block_size`
    pub log2_diff_max_min_luma_coding_block_size: u64,
    /// `log2_min_luma_transform_block_size_minus2`
    pub log2_min_luma_transform_block_size_minus2: u64,
    /// `log2_diff_max_min_luma_transform_block_size`
    pub log2_diff_max_min_luma_transform_block_size: u64,
    /// `max_transform_hierarchy_depth_inter`
    pub max_transform_hierarchy_depth_inter: u64,
    /// `max_transform_hierarchy_depth_intra`
    pub max_transform_hierarchy_depth_intra: u64,
    /// `scaling_list_enabled_flag`
    pub scaling_list_enabled_flag: bool,
    /// `amp_enabled_flag`
    pub amp_enabled_flag: bool,
    /// `sample_adaptive_offset_enabled_flag`
    pub sample_adaptive_offset_enabled_flag: bool,
    /// `pcm_enabled_flag`
    pub pcm_enabled_flag: bool,
    /// `st_ref_pic_set(i)` for `i` in `0..num_short_term_ref_pic_sets`.
    pub short_term_ref_pic_sets: Vec<ShortTermRefPicSet>,
    /// `long_term_ref_pics_present_flag`
    pub long_term_ref_pics_present_flag: bool,
    /// `sps_temporal_mvp_enabled_flag`
    pub sps_temporal_mvp_enabled_flag: bool,
    /// `strong_intra_smoothing_enabled_flag`
    pub strong_intra_smoothing_enabled_flag: bool,
    /// `vui_parameters_present_flag`
    pub vui_parameters_present_flag: bool,
    /// `sps_extension_present_flag`, unless VUI stopped parsing.
    pub sps_extension_present_flag: Option<bool>,
}

/// `conf_win_*_offset`, in chroma sample units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConformanceWindow {
    /// `conf_win_left_offset`
    pub conf_win_left_offset: u64,
    /// `conf_win_right_offset`
    pub conf_win_right_offset: u64,
    /// `conf_win_top_offset`
    pub conf_win_top_offset: u64,
    /// `conf_win_bottom_offset`
    pub conf_win_bottom_offset: u64,
}

impl Sps {
    /// Parses an SPS from its RBSP (the bytes after the NAL unit header).
    pub fn parse(rbsp: &[u8]) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(io::Cursor::new(rbsp));

        let sps_video_parameter_set_id = bit_reader.read_bits(4)? as u8;
        let sps_max_sub_layers_minus1 = bit_reader.read_bits(3)? as u8;
        if sps_max_sub_layers_minus1 > 6 {
            return Err(invalid(format!(
                "sps_max_sub_layers_minus1 {sps_max_sub_layers_minus1} is greater than 6"
            )));
        }
        let sps_temporal_id_nesting_flag = bit_reader.read_bit()?;
        let profile_tier_level =
            ProfileTierLevel::parse(&mut bit_reader, sps_max_sub_layers_minus1)?;

        let sps_seq_parameter_set_id = bit_reader.read_exp_golomb()?;
        if sps_seq_parameter_set_id > 15 {
            return Err(invalid(format!(
                "sps_seq_parameter_set_id {sps_seq_parameter_set_id} is greater than 15"
            )));
        }

        let chroma_format_idc = bit_reader.read_exp_golomb()?;
        if chroma_format_idc > 3 {
            return Err(invalid(format!("chroma_format_idc {chroma_format_idc} is greater than 3")));
        }
        let chroma_format_idc = chroma_format_idc as u8;
        let separate_colour_plane_flag = chroma_format_idc == 3 && bit_reader.read_bit()?;

        let pic_width_in_luma_samples = bit_reader.read_exp_golomb()?;
        let pic_height_in_luma_samples = bit_reader.read_exp_golomb()?;
        if pic_width_in_luma_samples == 0 || pic_height_in_luma_samples == 0 {
            return Err(invalid("picture dimensions must not be zero"));
        }

        let conformance_window = if bit_reader.read_bit()? {
            Some(ConformanceWindow {
                conf_win_left_offset: bit_reader.read_exp_golomb()?,
                conf_win_right_offset: bit_reader.read_exp_golomb()?,
                conf_win_top_offset: bit_reader.read_exp_golomb()?,
                conf_win_bottom_offset: bit_reader.read_exp_golomb()?,
            })
        } else {
            None
        };

        let bit_depth_luma_minus8 = bit_reader.read_exp_golomb()?;
        let bit_depth_chroma_minus8 = bit_reader.read_exp_golomb()?;

        let log2_max_pic_order_cnt_lsb_minus4 = bit_reader.read_exp_golomb()?;
        if log2_max_pic_order_cnt_lsb_minus4 > 12 {
            return Err(invalid(format!(
                "log2_max_pic_order_cnt_lsb_minus4 {log2_max_pic_order_cnt_lsb_minus4} is greater than 12"
            )));
        }
        let log2_max_pic_order_cnt_lsb_minus4 = log2_max_pic_order_cnt_lsb_minus4 as u8;

        let sub_layer_ordering_info =
            parse_sub_layer_ordering_info(&mut bit_reader, sps_max_sub_layers_minus1)?;

        let log2_min_luma_coding_block_size_minus3 = bit_reader.read_exp_golomb()?;
        let log2_diff_max_min_luma_coding_block_size = bit_reader.read_exp_golomb()?;
        if log2_min_luma_coding_block_size_minus3 + log2_diff_max_min_luma_coding_block_size > 3 {
            return Err(invalid("CTB size is larger than 64"));
        }
        let log2_min_luma_transform_block_size_minus2 = bit_reader.read_exp_golomb()?;
        let log2_diff_max_min_luma_transform_block_size = bit_reader.read_exp_golomb()?;
        let max_transform_hierarchy_depth_inter = bit_reader.read_exp_golomb()?;
        let max_transform_hierarchy_depth_intra = bit_reader.read_exp_golomb()?;

        let scaling_list_enabled_flag = bit_reader.read_bit()?;
        if scaling_list_enabled_flag && bit_reader.read_bit()? {
            return Err(unsupported("scaling_list_data"));
        }
        let amp_enabled_flag = bit_reader.read_bit()?;
        let sample_adaptive_offset_enabled_flag = bit_reader.read_bit()?;
        let pcm_enabled_flag = bit_reader.read_bit()?;
        if pcm_enabled_flag {
            return Err(unsupported("pcm"));
        }

        let num_short_term_ref_pic_sets = bit_reader.read_exp_golomb()?;
        if num_short_term_ref_pic_sets > 64 {
            return Err(invalid(format!(
                "num_short_term_ref_pic_sets {num_short_term_ref_pic_sets} is greater than 64"
            )));
        }
        let num_short_term_ref_pic_sets = num_short_term_ref_pic_sets as usize;
        let mut short_term_ref_pic_sets = Vec::with_capacity(num_short_term_ref_pic_sets);
        for st_rps_idx in 0..num_short_term_ref_pic_sets {
            let set = ShortTermRefPicSet::parse(
                &mut bit_reader,
                st_rps_idx,
                &short_term_ref_pic_sets,
                num_short_term_ref_pic_sets,
            )?;
            short_term_ref_pic_sets.push(set);
        }

        let long_term_ref_pics_present_flag = bit_reader.read_bit()?;
        if long_term_ref_pics_present_flag {
            return Err(unsupported("long-term reference pictures"));
        }
        let sps_temporal_mvp_enabled_flag = bit_reader.read_bit()?;
        let strong_intra_smoothing_enabled_flag = bit_reader.read_bit()?;
        let vui_parameters_present_flag = bit_reader.read_bit()?;
        let sps_extension_present_flag = if vui_parameters_present_flag {
            None
        } else {
            Some(bit_reader.read_bit()?)
        };

        Ok(Sps {
            sps_video_parameter_set_id,
            sps_max_sub_layers_minus1,
            sps_temporal_id_nesting_flag,
            profile_tier_level,
            sps_seq_parameter_set_id,
            chroma_format_idc,
            separate_colour_plane_flag,
            pic_width_in_luma_samples,
            pic_height_in_luma_samples,
            conformance_window,
            bit_depth_luma_minus8,
            bit_depth_chroma_minus8,
            log2_max_pic_order_cnt_lsb_minus4,
            sub_layer_ordering_info,
            log2_min_luma_coding_block_size_minus3,
            log2_diff_max_min_luma_coding_block_size,
            log2_min_luma_transform_block_size_minus2,
            log2_diff_max_min_luma_transform_block_size,
            max_transform_hierarchy_depth_inter,
            max_transform_hierarchy_depth_intra,
            scaling_list_enabled_flag,
            amp_enabled_flag,
            sample_adaptive_offset_enabled_flag,
            pcm_enabled_flag,
            short_term_ref_pic_sets,
            long_term_ref_pics_present_flag,
            sps_temporal_mvp_enabled_flag,
            strong_intra_smoothing_enabled_flag,
            vui_parameters_present_flag,
            sps_extension_present_flag,
        })
    }

    /// `ChromaArrayType`
    pub fn chroma_array_type(&self) -> u8 {
        if self.separate_colour_plane_flag {
            0
        } else {
            self.chroma_format_idc
        }
    }

    /// `SubWidthC` and `SubHeightC`
    /// ISO/IEC-23008-2-2020 - Table 6-1
    fn chroma_subsampling(&self) -> (u64, u64) {
        match self.chroma_array_type() {
            1 => (2, 2),
            2 => (2, 1),
            _ => (1, 1),
        }
    }

    /// Picture width after conformance window cropping.
    pub fn width(&self) -> u64 {
        let Some(window) = &self.conformance_window else {
            return self.pic_width_in_luma_samples;
        };
        let (sub_width_c, _) = self.chroma_subsampling();
        self.pic_width_in_luma_samples.saturating_sub(
            sub_width_c * (window.conf_win_left_offset + window.conf_win_right_offset),
        )
    }

    /// Picture height after conformance window cropping.
    pub fn height(&self) -> u64 {
        let Some(window) = &self.conformance_window else {
            return self.pic_height_in_luma_samples;
        };
        let (_, sub_height_c) = self.chroma_subsampling();
        self.pic_height_in_luma_samples.saturating_sub(
            sub_height_c * (window.conf_win_top_offset + window.conf_win_bottom_offset),
        )
    }

    /// `MaxPicOrderCntLsb`
    pub fn max_pic_order_cnt_lsb(&self) -> u32 {
        1 << (self.log2_max_pic_order_cnt_lsb_minus4 + 4)
    }

    /// `CtbLog2SizeY`
    pub fn ctb_log2_size_y(&self) -> u64 {
        self.log2_min_luma_coding_block_size_minus3
            + 3
            + self.log2_diff_max_min_luma_coding_block_size
    }

    /// `PicSizeInCtbsY`
    pub fn pic_size_in_ctbs_y(&self) -> u64 {
        let ctb_size_y = 1u64 << self.ctb_log2_size_y();
        self.pic_width_in_luma_samples.div_ceil(ctb_size_y)
            * self.pic_height_in_luma_samples.div_ceil(ctb_size_y)
    }

    /// Number of temporal sub-layers.
    pub fn num_temporal_layers(&self) -> NumTemporalLayers {
        NumTemporalLayers::from_max_sub_layers_minus1(self.sps_max_sub_layers_minus1)
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use bytes_util::BitWriter;
    use expgolomb::BitWriterExpGolombExt;

    use super::*;
    use crate::NaluBuilder;
    use crate::frame::build_key_frame;
    use crate::parse::{NalUnit, split_annex_b};

    fn key_frame_sps(width: u32, height: u32, num_temporal_layers: u8) -> Sps {
        let mut builder = NaluBuilder::new();
        build_key_frame(&mut builder, width, height, num_temporal_layers, 30, 100);
        let nal = NalUnit::parse(split_annex_b(builder.data())[1]).unwrap();
        Sps::parse(&nal.rbsp).unwrap()
    }

    #[test]
    fn test_key_frame_sps() {
        let sps = key_frame_sps(1280, 720, 1);
        assert_eq!(sps.width(), 1280);
        assert_eq!(sps.height(), 720);
        assert_eq!(sps.chroma_array_type(), 1);
        assert_eq!(sps.ctb_log2_size_y(), 6);
        assert_eq!(sps.pic_size_in_ctbs_y(), 20 * 12);
        assert_eq!(sps.max_pic_order_cnt_lsb(), 16);
        assert!(sps.sample_adaptive_offset_enabled_flag);
        assert_eq!(sps.sps_extension_present_flag, Some(false));
        assert_eq!(sps.num_temporal_layers(), NumTemporalLayers::NotScalable);
    }

    #[test]
    fn test_key_frame_short_term_ref_pic_sets() {
        let sps = key_frame_sps(320, 180, 2);
        insta::assert_debug_snapshot!(sps.short_term_ref_pic_sets, @r"
        [
            ShortTermRefPicSet {
                inter_ref_pic_set_prediction_flag: false,
                delta_poc_s0: [
                    -1,
                ],
                used_by_curr_pic_s0: [
                    true,
                ],
                delta_poc_s1: [],
                used_by_curr_pic_s1: [],
            },
            ShortTermRefPicSet {
                inter_ref_pic_set_prediction_flag: true,
                delta_poc_s0: [
                    -1,
                ],
                used_by_curr_pic_s0: [
                    true,
                ],
                delta_poc_s1: [],
                used_by_curr_pic_s1: [],
            },
        ]
        ");
    }

    #[test]
    fn test_sub_layers_signalled() {
        let sps = key_frame_sps(1920, 1080, 3);
        assert_eq!(sps.sps_max_sub_layers_minus1, 2);
        assert_eq!(sps.profile_tier_level.sub_layers.len(), 2);
        assert_eq!(sps.num_temporal_layers(), NumTemporalLayers::Count(3));
    }

    #[test]
    fn test_conformance_window_crop() {
        let mut writer = BitWriter::new();
        writer.append_bits(4, 0);
        writer.append_bits(3, 0);
        writer.append_bool(true);
        writer.append_bits(64, 0x0160_0000_0090_0000);
        writer.append_bits(32, 0);
        writer.append_ue(0); // sps_seq_parameter_set_id
        writer.append_ue(1); // chroma_format_idc
        writer.append_ue(1920);
        writer.append_ue(1088);
        writer.append_bool(true); // conformance_window_flag
        writer.append_ue(0);
        writer.append_ue(0);
        writer.append_ue(0);
        writer.append_ue(4);
        writer.append_ue(0);
        writer.append_ue(0);
        writer.append_ue(4);
        writer.append_bool(false);
        for value in [4, 0, 0, 0, 3, 0, 3, 1, 1] {
            writer.append_ue(value);
        }
        writer.append_bool(false); // scaling_list_enabled_flag
        writer.append_bool(false);
        writer.append_bool(false);
        writer.append_bool(false);
        writer.append_ue(0); // num_short_term_ref_pic_sets
        writer.append_bool(false);
        writer.append_bool(true);
        writer.append_bool(true);
        writer.append_bool(true); // vui_parameters_present_flag
        writer.byte_align();
        writer.flush();

        let sps = Sps::parse(writer.data()).unwrap();
        assert_eq!(sps.pic_height_in_luma_samples, 1088);
        assert_eq!(sps.height(), 1080);
        assert_eq!(sps.width(), 1920);
        assert_eq!(sps.max_pic_order_cnt_lsb(), 256);
        assert_eq!(sps.sub_layer_ordering_info.len(), 1);
        assert_eq!(sps.short_term_ref_pic_sets.len(), 0);
        assert_eq!(sps.sps_extension_present_flag, None);
    }

    #[test]
    fn test_pcm_is_unsupported() {
        let mut writer = BitWriter::new();
        writer.append_bits(8, 0x01);
        writer.append_bits(64, 0x0160_0000_0090_0000);
        writer.append_bits(32, 0);
        for value in [0, 1, 64, 64] {
            writer.append_ue(value);
        }
        writer.append_bool(false); // conformance_window_flag
        for value in [0, 0, 0] {
            writer.append_ue(value);
        }
        writer.append_bool(false); // sps_sub_layer_ordering_info_present_flag
        for value in [1, 0, 0, 0, 3, 0, 3, 0, 0] {
            writer.append_ue(value);
        }
        writer.append_bool(false); // scaling_list_enabled_flag
        writer.append_bool(false);
        writer.append_bool(false);
        writer.append_bool(true); // pcm_enabled_flag
        writer.byte_align();
        writer.flush();

        let err = Sps::parse(writer.data()).unwrap_err();
        assert_eq!(err.to_string(), "unsupported syntax: pcm");
    }
}
