use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use super::{invalid, unsupported};

/// Picture parameter set.
/// ISO/IEC-23008-2-2020 - 7.3.2.3
///
/// PPS range extensions are not parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pps {
    /// `pps_pic_parameter_set_id`
    pub pps_pic_parameter_set_id: u64,
    /// `pps_seq_parameter_set_id`
    pub pps_seq_parameter_set_id: u64,
    /// `dependent_slice_segments_enabled_flag`
    pub dependent_slice_segments_enabled_flag: bool,
    /// `output_flag_present_flag`
    pub output_flag_present_flag: bool,
    /// `num_extra_slice_header_bits`
    ///
    /// 3 bits
    pub num_extra_slice_header_bits: u8,
    /// `sign_data_hiding_enabled_flag`
    pub sign_data_hiding_enabled_flag: bool,
    /// `cabac_init_present_flag`
    pub cabac_init_present_flag: bool,
    /// `num_ref_idx_l0_default_active_minus1`
    pub num_ref_idx_l0_default_active_minus1: u64,
    /// `num_ref_idx_l1_default_active_minus1`
    pub num_ref_idx_l1_default_active_minus1: u64,
    /// `init_qp_minus26`
    pub init_qp_minus26: i64,
    /// `constrained_intra_pred_flag`
    pub constrained_intra_pred_flag: bool,
    /// `transform_skip_enabled_flag`
    pub transform_skip_enabled_flag: bool,
    /// `diff_cu_qp_delta_depth`, if `cu_qp_delta_enabled_flag` is set.
    pub diff_cu_qp_delta_depth: Option<u64>,
    /// `pps_cb_qp_offset`
    pub pps_cb_qp_offset: i64,
    /// `pps_cr_qp_offset`
    pub pps_cr_qp_offset: i64,
    /// `pps_slice_chroma_qp_offsets_present_flag`
    pub pps_slice_chroma_qp_offsets_present_flag: bool,
    /// `transquant_bypass_enabled_flag`
    pub transquant_bypass_enabled_flag: bool,
    /// `entropy_coding_sync_enabled_flag`
    pub entropy_coding_sync_enabled_flag: bool,
    /// `pps_loop_filter_across_slices_enabled_flag`
    pub pps_loop_filter_across_slices_enabled_flag: bool,
    /// `deblocking_filter_override_enabled_flag`
    pub deblocking_filter_override_enabled_flag: bool,
    /// `pps_deblocking_filter_disabled_flag`
    pub pps_deblocking_filter_disabled_flag: bool,
    /// `pps_beta_offset_div2`
    pub pps_beta_offset_div2: i64,
    /// `pps_tc_offset_div2`
    pub pps_tc_offset_div2: i64,
    /// `lists_modification_present_flag`
    pub lists_modification_present_flag: bool,
    /// `log2_parallel_merge_level_minus2`
    pub log2_parallel_merge_level_minus2: u64,
    /// `slice_segment_header_extension_present_flag`
    pub slice_segment_header_extension_present_flag: bool,
    /// `pps_extension_present_flag`
    pub pps_extension_present_flag: bool,
}

impl Pps {
    /// Parses a PPS from its RBSP (the bytes after the NAL unit header).
    pub fn parse(rbsp: &[u8]) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(io::Cursor::new(rbsp));

        let pps_pic_parameter_set_id = bit_reader.read_exp_golomb()?;
        if pps_pic_parameter_set_id > 63 {
            return Err(invalid(format!(
                "pps_pic_parameter_set_id {pps_pic_parameter_set_id} is greater than 63"
            )));
        }
        let pps_seq_parameter_set_id = bit_reader.read_exp_golomb()?;
        if pps_seq_parameter_set_id > 15 {
            return Err(invalid(format!(
                "pps_seq_parameter_set_id {pps_seq_parameter_set_id} is greater than 15"
            )));
        }

        let dependent_slice_segments_enabled_flag = bit_reader.read_bit()?;
        let output_flag_present_flag = bit_reader.read_bit()?;
        let num_extra_slice_header_bits = bit_reader.read_bits(3)? as u8;
        let sign_data_hiding_enabled_flag = bit_reader.read_bit()?;
        let cabac_init_present_flag = bit_reader.read_bit()?;
        let num_ref_idx_l0_default_active_minus1 = bit_reader.read_exp_golomb()?;
        let num_ref_idx_l1_default_active_minus1 = bit_reader.read_exp_golomb()?;
        if num_ref_idx_l0_default_active_minus1 > 14 || num_ref_idx_l1_default_active_minus1 > 14 {
            return Err(invalid("num_ref_idx_default_active_minus1 is greater than 14"));
        }
        let init_qp_minus26 = bit_reader.read_signed_exp_golomb()?;
        let constrained_intra_pred_flag = bit_reader.read_bit()?;
        let transform_skip_enabled_flag = bit_reader.read_bit()?;
        let diff_cu_qp_delta_depth = if bit_reader.read_bit()? {
            Some(bit_reader.read_exp_golomb()?)
        } else {
            None
        };
        let pps_cb_qp_offset = bit_reader.read_signed_exp_golomb()?;
        let pps_cr_qp_offset = bit_reader.read_signed_exp_golomb()?;
        let pps_slice_chroma_qp_offsets_present_flag = bit_reader.read_bit()?;

        let weighted_pred_flag = bit_reader.read_bit()?;
        let weighted_bipred_flag = bit_reader.read_bit()?;
        if weighted_pred_flag || weighted_bipred_flag {
            return Err(unsupported("weighted prediction"));
        }
        let transquant_bypass_enabled_flag = bit_reader.read_bit()?;
        if bit_reader.read_bit()? {
            return Err(unsupported("tiles"));
        }
        let entropy_coding_sync_enabled_flag = bit_reader.read_bit()?;
        let pps_loop_filter_across_slices_enabled_flag = bit_reader.read_bit()?;

        let mut deblocking_filter_override_enabled_flag = false;
        let mut pps_deblocking_filter_disabled_flag = false;
        let mut pps_beta_offset_div2 = 0;
        let mut pps_tc_offset_div2 = 0;
        // deblocking_filter_control_present_flag
        if bit_reader.read_bit()? {
            deblocking_filter_override_enabled_flag = bit_reader.read_bit()?;
            pps_deblocking_filter_disabled_flag = bit_reader.read_bit()?;
            if !pps_deblocking_filter_disabled_flag {
                pps_beta_offset_div2 = bit_reader.read_signed_exp_golomb()?;
                pps_tc_offset_div2 = bit_reader.read_signed_exp_golomb()?;
            }
        }

        if bit_reader.read_bit()? {
            return Err(unsupported("scaling_list_data"));
        }
        let lists_modification_present_flag = bit_reader.read_bit()?;
        let log2_parallel_merge_level_minus2 = bit_reader.read_exp_golomb()?;
        let slice_segment_header_extension_present_flag = bit_reader.read_bit()?;
        let pps_extension_present_flag = bit_reader.read_bit()?;

        Ok(Pps {
            pps_pic_parameter_set_id,
            pps_seq_parameter_set_id,
            dependent_slice_segments_enabled_flag,
            output_flag_present_flag,
            num_extra_slice_header_bits,
            sign_data_hiding_enabled_flag,
            cabac_init_present_flag,
            num_ref_idx_l0_default_active_minus1,
            num_ref_idx_l1_default_active_minus1,
            init_qp_minus26,
            constrained_intra_pred_flag,
            transform_skip_enabled_flag,
            diff_cu_qp_delta_depth,
            pps_cb_qp_offset,
            pps_cr_qp_offset,
            pps_slice_chroma_qp_offsets_present_flag,
            transquant_bypass_enabled_flag,
            entropy_coding_sync_enabled_flag,
            pps_loop_filter_across_slices_enabled_flag,
            deblocking_filter_override_enabled_flag,
            pps_deblocking_filter_disabled_flag,
            pps_beta_offset_div2,
            pps_tc_offset_div2,
            lists_modification_present_flag,
            log2_parallel_merge_level_minus2,
            slice_segment_header_extension_present_flag,
            pps_extension_present_flag,
        })
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::NaluBuilder;
    use crate::frame::build_key_frame;
    use crate::parse::{NalUnit, split_annex_b};

    #[test]
    fn test_key_frame_pps() {
        let mut builder = NaluBuilder::new();
        build_key_frame(&mut builder, 640, 360, 1, 30, 100);
        let nal = NalUnit::parse(split_annex_b(builder.data())[2]).unwrap();
        let pps = Pps::parse(&nal.rbsp).unwrap();

        insta::assert_debug_snapshot!(pps, @r"
        Pps {
            pps_pic_parameter_set_id: 0,
            pps_seq_parameter_set_id: 0,
            dependent_slice_segments_enabled_flag: false,
            output_flag_present_flag: false,
            num_extra_slice_header_bits: 0,
            sign_data_hiding_enabled_flag: false,
            cabac_init_present_flag: false,
            num_ref_idx_l0_default_active_minus1: 0,
            num_ref_idx_l1_default_active_minus1: 0,
            init_qp_minus26: 0,
            constrained_intra_pred_flag: false,
            transform_skip_enabled_flag: false,
            diff_cu_qp_delta_depth: Some(
                0,
            ),
            pps_cb_qp_offset: 0,
            pps_cr_qp_offset: 0,
            pps_slice_chroma_qp_offsets_present_flag: false,
            transquant_bypass_enabled_flag: false,
            entropy_coding_sync_enabled_flag: false,
            pps_loop_filter_across_slices_enabled_flag: false,
            deblocking_filter_override_enabled_flag: false,
            pps_deblocking_filter_disabled_flag: false,
            pps_beta_offset_div2: 0,
            pps_tc_offset_div2: 0,
            lists_modification_present_flag: false,
            log2_parallel_merge_level_minus2: 0,
            slice_segment_header_extension_present_flag: false,
            pps_extension_present_flag: false,
        }
        ");
    }

    #[test]
    fn test_tiles_are_unsupported() {
        // ids 0 0, seven zero bits, ue 0 0, se 0, two flags, cu_qp_delta 0,
        // se 0 0, four flags, tiles_enabled_flag = 1
        let data = [0b1100_0000, 0b0111_0001, 0b1000_0100];
        let err = Pps::parse(&data).unwrap_err();
        assert_eq!(err.to_string(), "unsupported syntax: tiles");
    }
}
