use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use super::{Pps, ShortTermRefPicSet, Sps, ceil_log2, invalid, unsupported};
use crate::{NALUnitType, SliceType};

/// `slice_segment_header()` of an independent slice segment.
/// ISO/IEC-23008-2-2020 - 7.3.6.1
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceSegmentHeader {
    /// `first_slice_segment_in_pic_flag`
    pub first_slice_segment_in_pic_flag: bool,
    /// `no_output_of_prior_pics_flag`, present for IRAP pictures.
    pub no_output_of_prior_pics_flag: Option<bool>,
    /// `slice_pic_parameter_set_id`
    pub slice_pic_parameter_set_id: u64,
    /// `slice_segment_address`
    pub slice_segment_address: u64,
    /// `slice_type`
    pub slice_type: SliceType,
    /// `pic_output_flag`, inferred to be `true` when absent.
    pub pic_output_flag: bool,
    /// `slice_pic_order_cnt_lsb`, `0` for IDR pictures.
    pub slice_pic_order_cnt_lsb: u16,
    /// `short_term_ref_pic_set_sps_flag`
    pub short_term_ref_pic_set_sps_flag: bool,
    /// `short_term_ref_pic_set_idx`
    pub short_term_ref_pic_set_idx: u8,
    /// The RPS coded in the slice header, if any.
    pub short_term_ref_pic_set: Option<ShortTermRefPicSet>,
    /// `slice_temporal_mvp_enabled_flag`
    pub slice_temporal_mvp_enabled_flag: bool,
    /// `slice_sao_luma_flag`
    pub slice_sao_luma_flag: bool,
    /// `slice_sao_chroma_flag`
    pub slice_sao_chroma_flag: bool,
    /// `num_ref_idx_l0_active_minus1`, from the PPS unless overridden.
    pub num_ref_idx_l0_active_minus1: u64,
    /// `num_ref_idx_l1_active_minus1`, from the PPS unless overridden.
    pub num_ref_idx_l1_active_minus1: u64,
    /// `five_minus_max_num_merge_cand`, present for inter slices.
    pub five_minus_max_num_merge_cand: Option<u64>,
    /// `slice_qp_delta`
    pub slice_qp_delta: i64,
    /// `slice_cb_qp_offset`
    pub slice_cb_qp_offset: i64,
    /// `slice_cr_qp_offset`
    pub slice_cr_qp_offset: i64,
    /// `slice_deblocking_filter_disabled_flag`
    pub slice_deblocking_filter_disabled_flag: bool,
    /// `slice_loop_filter_across_slices_enabled_flag`
    pub slice_loop_filter_across_slices_enabled_flag: bool,
}

impl SliceSegmentHeader {
    /// Parses the slice segment header at the start of a VCL NAL unit RBSP.
    pub fn parse(
        rbsp: &[u8],
        nal_unit_type: NALUnitType,
        sps: &Sps,
        pps: &Pps,
    ) -> io::Result<Self> {
        if !nal_unit_type.is_vcl() {
            return Err(invalid(format!("{nal_unit_type:?} is not a slice")));
        }

        let mut bit_reader = BitReader::new(io::Cursor::new(rbsp));

        let first_slice_segment_in_pic_flag = bit_reader.read_bit()?;
        let no_output_of_prior_pics_flag = if nal_unit_type.is_irap() {
            Some(bit_reader.read_bit()?)
        } else {
            None
        };
        let slice_pic_parameter_set_id = bit_reader.read_exp_golomb()?;
        if slice_pic_parameter_set_id != pps.pps_pic_parameter_set_id {
            return Err(invalid(format!(
                "slice refers to PPS {slice_pic_parameter_set_id}, got PPS {}",
                pps.pps_pic_parameter_set_id
            )));
        }

        let mut slice_segment_address = 0;
        if !first_slice_segment_in_pic_flag {
            if pps.dependent_slice_segments_enabled_flag && bit_reader.read_bit()? {
                return Err(unsupported("dependent slice segments"));
            }
            slice_segment_address = bit_reader.read_bits(ceil_log2(sps.pic_size_in_ctbs_y()))?;
        }

        // slice_reserved_flag[i]
        bit_reader.seek_bits(pps.num_extra_slice_header_bits as usize)?;

        let slice_type_code = bit_reader.read_exp_golomb()?;
        let slice_type = SliceType::from_code(slice_type_code)
            .ok_or_else(|| invalid(format!("slice_type {slice_type_code} is out of range")))?;

        let pic_output_flag = !pps.output_flag_present_flag || bit_reader.read_bit()?;
        if sps.separate_colour_plane_flag {
            // colour_plane_id
            bit_reader.seek_bits(2)?;
        }

        let mut slice_pic_order_cnt_lsb = 0;
        let mut short_term_ref_pic_set_sps_flag = false;
        let mut short_term_ref_pic_set_idx = 0;
        let mut short_term_ref_pic_set = None;
        let mut slice_temporal_mvp_enabled_flag = false;
        if !nal_unit_type.is_idr() {
            slice_pic_order_cnt_lsb =
                bit_reader.read_bits(sps.log2_max_pic_order_cnt_lsb_minus4 + 4)? as u16;

            let num_sets = sps.short_term_ref_pic_sets.len();
            short_term_ref_pic_set_sps_flag = bit_reader.read_bit()?;
            if !short_term_ref_pic_set_sps_flag {
                short_term_ref_pic_set = Some(ShortTermRefPicSet::parse(
                    &mut bit_reader,
                    num_sets,
                    &sps.short_term_ref_pic_sets,
                    num_sets,
                )?);
            } else if num_sets == 0 {
                return Err(invalid("slice selects an SPS RPS but the SPS has none"));
            } else if num_sets > 1 {
                short_term_ref_pic_set_idx =
                    bit_reader.read_bits(ceil_log2(num_sets as u64))? as u8;
                if short_term_ref_pic_set_idx as usize >= num_sets {
                    return Err(invalid(format!(
                        "short_term_ref_pic_set_idx {short_term_ref_pic_set_idx} is out of range"
                    )));
                }
            }

            if sps.sps_temporal_mvp_enabled_flag {
                slice_temporal_mvp_enabled_flag = bit_reader.read_bit()?;
            }
        }

        let mut slice_sao_luma_flag = false;
        let mut slice_sao_chroma_flag = false;
        if sps.sample_adaptive_offset_enabled_flag {
            slice_sao_luma_flag = bit_reader.read_bit()?;
            if sps.chroma_array_type() != 0 {
                slice_sao_chroma_flag = bit_reader.read_bit()?;
            }
        }

        let mut num_ref_idx_l0_active_minus1 = pps.num_ref_idx_l0_default_active_minus1;
        let mut num_ref_idx_l1_active_minus1 = pps.num_ref_idx_l1_default_active_minus1;
        let mut five_minus_max_num_merge_cand = None;
        if slice_type.is_inter() {
            // num_ref_idx_active_override_flag
            if bit_reader.read_bit()? {
                num_ref_idx_l0_active_minus1 = bit_reader.read_exp_golomb()?;
                if slice_type == SliceType::B {
                    num_ref_idx_l1_active_minus1 = bit_reader.read_exp_golomb()?;
                }
            }

            let rps = match &short_term_ref_pic_set {
                Some(rps) => rps,
                None => &sps.short_term_ref_pic_sets[short_term_ref_pic_set_idx as usize],
            };
            if pps.lists_modification_present_flag && rps.num_used_by_curr_pic() > 1 {
                return Err(unsupported("ref_pic_lists_modification"));
            }

            if slice_type == SliceType::B {
                // mvd_l1_zero_flag
                bit_reader.read_bit()?;
            }
            if pps.cabac_init_present_flag {
                // cabac_init_flag
                bit_reader.read_bit()?;
            }
            if slice_temporal_mvp_enabled_flag {
                let collocated_from_l0_flag = slice_type != SliceType::B || bit_reader.read_bit()?;
                if (collocated_from_l0_flag && num_ref_idx_l0_active_minus1 > 0)
                    || (!collocated_from_l0_flag && num_ref_idx_l1_active_minus1 > 0)
                {
                    // collocated_ref_idx
                    bit_reader.read_exp_golomb()?;
                }
            }
            five_minus_max_num_merge_cand = Some(bit_reader.read_exp_golomb()?);
        }

        let slice_qp_delta = bit_reader.read_signed_exp_golomb()?;
        let mut slice_cb_qp_offset = 0;
        let mut slice_cr_qp_offset = 0;
        if pps.pps_slice_chroma_qp_offsets_present_flag {
            slice_cb_qp_offset = bit_reader.read_signed_exp_golomb()?;
            slice_cr_qp_offset = bit_reader.read_signed_exp_golomb()?;
        }

        let deblocking_filter_override_flag =
            pps.deblocking_filter_override_enabled_flag && bit_reader.read_bit()?;
        let mut slice_deblocking_filter_disabled_flag = pps.pps_deblocking_filter_disabled_flag;
        if deblocking_filter_override_flag {
            slice_deblocking_filter_disabled_flag = bit_reader.read_bit()?;
            if !slice_deblocking_filter_disabled_flag {
                // slice_beta_offset_div2, slice_tc_offset_div2
                bit_reader.read_signed_exp_golomb()?;
                bit_reader.read_signed_exp_golomb()?;
            }
        }

        let mut slice_loop_filter_across_slices_enabled_flag =
            pps.pps_loop_filter_across_slices_enabled_flag;
        if pps.pps_loop_filter_across_slices_enabled_flag
            && (slice_sao_luma_flag
                || slice_sao_chroma_flag
                || !slice_deblocking_filter_disabled_flag)
        {
            slice_loop_filter_across_slices_enabled_flag = bit_reader.read_bit()?;
        }

        if pps.entropy_coding_sync_enabled_flag {
            let num_entry_point_offsets = bit_reader.read_exp_golomb()?;
            if num_entry_point_offsets > 0 {
                let offset_len_minus1 = bit_reader.read_exp_golomb()?;
                if offset_len_minus1 > 31 {
                    return Err(invalid(format!(
                        "offset_len_minus1 {offset_len_minus1} is greater than 31"
                    )));
                }
                let bits = num_entry_point_offsets
                    .checked_mul(offset_len_minus1 + 1)
                    .and_then(|bits| usize::try_from(bits).ok())
                    .ok_or_else(|| invalid("num_entry_point_offsets is too large"))?;
                bit_reader.seek_bits(bits)?;
            }
        }

        if pps.slice_segment_header_extension_present_flag {
            let length = bit_reader.read_exp_golomb()?;
            if length > 256 {
                return Err(invalid(format!(
                    "slice_segment_header_extension_length {length} is greater than 256"
                )));
            }
            bit_reader.seek_bits(length as usize * 8)?;
        }

        // byte_alignment()
        if !bit_reader.read_bit()? {
            return Err(invalid("alignment_bit_equal_to_one is 0"));
        }
        while !bit_reader.is_aligned() {
            if bit_reader.read_bit()? {
                return Err(invalid("alignment_bit_equal_to_zero is 1"));
            }
        }

        Ok(SliceSegmentHeader {
            first_slice_segment_in_pic_flag,
            no_output_of_prior_pics_flag,
            slice_pic_parameter_set_id,
            slice_segment_address,
            slice_type,
            pic_output_flag,
            slice_pic_order_cnt_lsb,
            short_term_ref_pic_set_sps_flag,
            short_term_ref_pic_set_idx,
            short_term_ref_pic_set,
            slice_temporal_mvp_enabled_flag,
            slice_sao_luma_flag,
            slice_sao_chroma_flag,
            num_ref_idx_l0_active_minus1,
            num_ref_idx_l1_active_minus1,
            five_minus_max_num_merge_cand,
            slice_qp_delta,
            slice_cb_qp_offset,
            slice_cr_qp_offset,
            slice_deblocking_filter_disabled_flag,
            slice_loop_filter_across_slices_enabled_flag,
        })
    }

    /// `SliceQpY = 26 + init_qp_minus26 + slice_qp_delta`
    pub fn slice_qp_y(&self, pps: &Pps) -> i64 {
        26 + pps.init_qp_minus26 + self.slice_qp_delta
    }

    /// The short-term RPS the slice uses, either coded in the header or
    /// selected from the SPS.
    pub fn short_term_ref_pic_set<'a>(&'a self, sps: &'a Sps) -> Option<&'a ShortTermRefPicSet> {
        match &self.short_term_ref_pic_set {
            Some(rps) => Some(rps),
            None if self.short_term_ref_pic_set_sps_flag => sps
                .short_term_ref_pic_sets
                .get(self.short_term_ref_pic_set_idx as usize),
            None => None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;
    use crate::NaluBuilder;
    use crate::frame::{build_delta_frame, build_key_frame};
    use crate::parse::{NalUnit, split_annex_b};

    fn parameter_sets() -> (Sps, Pps, NalUnit) {
        let mut builder = NaluBuilder::new();
        build_key_frame(&mut builder, 1280, 720, 2, 34, 100);
        let nal_units = split_annex_b(builder.data());
        let sps = Sps::parse(&NalUnit::parse(nal_units[1]).unwrap().rbsp).unwrap();
        let pps = Pps::parse(&NalUnit::parse(nal_units[2]).unwrap().rbsp).unwrap();
        let idr = NalUnit::parse(nal_units[3]).unwrap();
        (sps, pps, idr)
    }

    #[test]
    fn test_idr_slice() {
        let (sps, pps, idr) = parameter_sets();
        assert_eq!(idr.header.nal_unit_type, NALUnitType::IdrWRadl);

        let header =
            SliceSegmentHeader::parse(&idr.rbsp, idr.header.nal_unit_type, &sps, &pps).unwrap();
        assert_eq!(header.slice_type, SliceType::I);
        assert_eq!(header.no_output_of_prior_pics_flag, Some(false));
        assert!(header.slice_sao_luma_flag);
        assert!(header.slice_sao_chroma_flag);
        assert_eq!(header.slice_pic_order_cnt_lsb, 0);
        assert_eq!(header.five_minus_max_num_merge_cand, None);
        assert_eq!(header.slice_qp_y(&pps), 34);
        assert!(header.short_term_ref_pic_set(&sps).is_none());
    }

    #[test]
    fn test_trail_slice() {
        let (sps, pps, _) = parameter_sets();
        let mut builder = NaluBuilder::new();
        build_delta_frame(&mut builder, 1, 21, 100, 11);
        let nal = NalUnit::parse(split_annex_b(builder.data())[0]).unwrap();
        assert_eq!(nal.header.nal_unit_type, NALUnitType::TrailN);
        assert_eq!(nal.header.temporal_id, 1);

        let header =
            SliceSegmentHeader::parse(&nal.rbsp, nal.header.nal_unit_type, &sps, &pps).unwrap();
        assert_eq!(header.slice_type, SliceType::P);
        assert_eq!(header.no_output_of_prior_pics_flag, None);
        assert_eq!(header.slice_pic_order_cnt_lsb, 11);
        assert!(header.short_term_ref_pic_set_sps_flag);
        assert_eq!(header.short_term_ref_pic_set_idx, 0);
        assert_eq!(header.num_ref_idx_l0_active_minus1, 0);
        assert_eq!(header.five_minus_max_num_merge_cand, Some(0));
        assert_eq!(header.slice_qp_y(&pps), 21);
        assert_eq!(
            header.short_term_ref_pic_set(&sps).map(|rps| rps.delta_poc_s0.clone()),
            Some(vec![-1])
        );
    }

    #[test]
    fn test_rps_index_follows_temporal_layer() {
        let (sps, pps, _) = parameter_sets();
        let mut builder = NaluBuilder::new();
        for temporal_id in 0..4 {
            build_delta_frame(&mut builder, temporal_id, 30, 100, 1);
            let nal = NalUnit::parse(split_annex_b(builder.data())[0]).unwrap();
            let header =
                SliceSegmentHeader::parse(&nal.rbsp, nal.header.nal_unit_type, &sps, &pps)
                    .unwrap();
            assert_eq!(header.short_term_ref_pic_set_idx, (temporal_id + 1) % 2);
        }
    }

    #[test]
    fn test_non_vcl_is_rejected() {
        let (sps, pps, _) = parameter_sets();
        let err = SliceSegmentHeader::parse(&[0x80], NALUnitType::SpsNut, &sps, &pps).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
