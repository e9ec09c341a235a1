//! Synthetic H.265 key and delta frames.
//!
//! The frames carry syntactically complete parameter sets and slice
//! segment headers followed by zero padding, which is enough for Annex-B
//! parsers, depacketizers and bitrate tests. They do not contain decodable
//! picture data.
//!
//! [`build_key_frame`] writes VPS, SPS, PPS and an IDR slice;
//! [`build_delta_frame`] writes a single `TRAIL_N` slice that relies on
//! the parameter sets of the last key frame.

use tracing::trace;

use crate::{NALUnitType, NaluBuilder, SliceType};

/// `slice_pic_order_cnt_lsb` wraps at this value (`log2_max_pic_order_cnt_lsb_minus4 = 0`).
pub const POC_LSB_WRAP: u8 = 16;

/// Highest number of temporal sub-layers a parameter set can signal.
pub const MAX_TEMPORAL_LAYERS: u8 = 7;

const GENERAL_PROFILE_IDC_MAIN: u64 = 1;
/// Main + Main 10 compatibility (`general_profile_compatibility_flag[1..=2]`).
const GENERAL_PROFILE_COMPATIBILITY_FLAGS: u64 = 0x6000_0000;
/// Level 5.
const GENERAL_LEVEL_IDC: u64 = 150;

const NUM_UNITS_IN_TICK: u64 = 1;
const TIME_SCALE: u64 = 30;

const CHROMA_FORMAT_IDC_420: u64 = 1;
const LOG2_MAX_PIC_ORDER_CNT_LSB_MINUS4: u64 = 0;
const NUM_SHORT_TERM_REF_PIC_SETS: u64 = 2;

/// `26 + init_qp_minus26` with `init_qp_minus26 = 0`.
const INIT_QP: i64 = 26;

/// Writes VPS, SPS, PPS and an IDR slice into `builder`, replacing its
/// previous contents.
///
/// The IDR slice is padded with zero bytes so the output lands near
/// `frame_size_bytes`.
///
/// # Panics
///
/// Panics if `num_temporal_layers` is not in `1..=7`, if `width` or
/// `height` is zero, or if `frame_size_bytes` is zero.
pub fn build_key_frame(
    builder: &mut NaluBuilder,
    width: u32,
    height: u32,
    num_temporal_layers: u8,
    qp: u32,
    frame_size_bytes: usize,
) {
    assert!(
        (1..=MAX_TEMPORAL_LAYERS).contains(&num_temporal_layers),
        "build_key_frame: {num_temporal_layers} temporal layers is outside 1..={MAX_TEMPORAL_LAYERS}"
    );
    assert!(width > 0 && height > 0, "build_key_frame: empty picture {width}x{height}");
    assert!(frame_size_bytes > 0, "build_key_frame: frame size must be positive");

    let max_sub_layers_minus1 = (num_temporal_layers - 1) as u64;

    builder.reset();

    builder.begin_nalu(NALUnitType::VpsNut, 0, 0);
    write_vps(builder, max_sub_layers_minus1);
    builder.finish_nalu();

    builder.begin_nalu(NALUnitType::SpsNut, 0, 0);
    write_sps(builder, width, height, max_sub_layers_minus1);
    builder.finish_nalu();

    builder.begin_nalu(NALUnitType::PpsNut, 0, 0);
    write_pps(builder);
    builder.finish_nalu();

    builder.begin_nalu(NALUnitType::IdrWRadl, 0, 0);
    builder.append_bool(true); // first_slice_segment_in_pic_flag
    builder.append_bool(false); // no_output_of_prior_pics_flag
    builder.append_ue(0); // slice_pic_parameter_set_id
    builder.append_ue(SliceType::I.code());
    builder.append_bool(true); // slice_sao_luma_flag
    builder.append_bool(true); // slice_sao_chroma_flag
    builder.append_se(qp as i64 - INIT_QP); // slice_qp_delta
    builder.append_byte_alignment();
    pad_to_frame_size(builder, frame_size_bytes);
    builder.finish_nalu();
}

/// Writes a single `TRAIL_N` slice into `builder`, replacing its previous
/// contents.
///
/// The slice selects short-term RPS `(temporal_layer_id + 1) % 2` from the
/// SPS written by [`build_key_frame`] and carries `wrapped_on_16_poc_lsb` as
/// its 4-bit picture order count.
///
/// # Panics
///
/// Panics if `wrapped_on_16_poc_lsb > 15`, if `temporal_layer_id > 6` or if
/// `frame_size_bytes` is zero.
pub fn build_delta_frame(
    builder: &mut NaluBuilder,
    temporal_layer_id: u8,
    qp: u32,
    frame_size_bytes: usize,
    wrapped_on_16_poc_lsb: u8,
) {
    assert!(
        wrapped_on_16_poc_lsb < POC_LSB_WRAP,
        "build_delta_frame: poc lsb {wrapped_on_16_poc_lsb} does not fit 4 bits"
    );
    assert!(frame_size_bytes > 0, "build_delta_frame: frame size must be positive");

    builder.reset();

    builder.begin_nalu(NALUnitType::TrailN, 0, temporal_layer_id);
    builder.append_bool(true); // first_slice_segment_in_pic_flag
    builder.append_ue(0); // slice_pic_parameter_set_id
    builder.append_ue(SliceType::P.code());
    builder.append_bits(
        LOG2_MAX_PIC_ORDER_CNT_LSB_MINUS4 as u32 + 4,
        wrapped_on_16_poc_lsb as u64,
    ); // slice_pic_order_cnt_lsb
    builder.append_bool(true); // short_term_ref_pic_set_sps_flag
    builder.append_bits(1, (temporal_layer_id as u64 + 1) % 2); // short_term_ref_pic_set_idx
    builder.append_bool(true); // slice_sao_luma_flag
    builder.append_bool(true); // slice_sao_chroma_flag
    builder.append_bool(false); // num_ref_idx_active_override_flag
    builder.append_ue(0); // five_minus_max_num_merge_cand
    builder.append_se(qp as i64 - INIT_QP); // slice_qp_delta
    builder.append_byte_alignment();
    pad_to_frame_size(builder, frame_size_bytes);
    builder.finish_nalu();
}

/// Appends zero bytes so the escaped output ends up close to
/// `frame_size_bytes`.
///
/// Runs of zero bytes grow by 3/2 once emulation prevention escapes them,
/// so only two thirds of the missing size is written.
fn pad_to_frame_size(builder: &mut NaluBuilder, frame_size_bytes: usize) {
    builder.flush();
    let current_size = builder.bytes_in_buffer();
    let padding = frame_size_bytes.saturating_sub(current_size) * 2 / 3;
    trace!(current_size, frame_size_bytes, padding, "padding synthetic slice");

    for _ in 0..padding {
        builder.append_bits(8, 0);
    }
}

/// `video_parameter_set_rbsp()`
/// ISO/IEC-23008-2-2020 - 7.3.2.1
fn write_vps(builder: &mut NaluBuilder, max_sub_layers_minus1: u64) {
    builder.append_bits(4, 0); // vps_video_parameter_set_id
    builder.append_bool(true); // vps_base_layer_internal_flag
    builder.append_bool(true); // vps_base_layer_available_flag
    builder.append_bits(6, 0); // vps_max_layers_minus1
    builder.append_bits(3, max_sub_layers_minus1); // vps_max_sub_layers_minus1
    builder.append_bool(true); // vps_temporal_id_nesting_flag
    builder.append_bits(16, 0xFFFF); // vps_reserved_0xffff_16bits

    write_profile_tier_level(builder, max_sub_layers_minus1);

    write_sub_layer_ordering_info(builder);
    builder.append_bits(6, 0); // vps_max_layer_id
    builder.append_ue(0); // vps_num_layer_sets_minus1

    builder.append_bool(true); // vps_timing_info_present_flag
    builder.append_bits(32, NUM_UNITS_IN_TICK); // vps_num_units_in_tick
    builder.append_bits(32, TIME_SCALE); // vps_time_scale
    builder.append_bool(false); // vps_poc_proportional_to_timing_flag
    builder.append_ue(0); // vps_num_hrd_parameters

    builder.append_bool(false); // vps_extension_flag
}

/// `seq_parameter_set_rbsp()`
/// ISO/IEC-23008-2-2020 - 7.3.2.2.1
fn write_sps(builder: &mut NaluBuilder, width: u32, height: u32, max_sub_layers_minus1: u64) {
    builder.append_bits(4, 0); // sps_video_parameter_set_id
    builder.append_bits(3, max_sub_layers_minus1); // sps_max_sub_layers_minus1
    builder.append_bool(true); // sps_temporal_id_nesting_flag

    write_profile_tier_level(builder, max_sub_layers_minus1);

    builder.append_ue(0); // sps_seq_parameter_set_id
    builder.append_ue(CHROMA_FORMAT_IDC_420);
    builder.append_ue(width as u64); // pic_width_in_luma_samples
    builder.append_ue(height as u64); // pic_height_in_luma_samples
    builder.append_bool(false); // conformance_window_flag
    builder.append_ue(0); // bit_depth_luma_minus8
    builder.append_ue(0); // bit_depth_chroma_minus8
    builder.append_ue(LOG2_MAX_PIC_ORDER_CNT_LSB_MINUS4);

    write_sub_layer_ordering_info(builder);

    builder.append_ue(0); // log2_min_luma_coding_block_size_minus3
    builder.append_ue(3); // log2_diff_max_min_luma_coding_block_size
    builder.append_ue(0); // log2_min_luma_transform_block_size_minus2
    builder.append_ue(3); // log2_diff_max_min_luma_transform_block_size
    builder.append_ue(0); // max_transform_hierarchy_depth_inter
    builder.append_ue(0); // max_transform_hierarchy_depth_intra
    builder.append_bool(false); // scaling_list_enabled_flag
    builder.append_bool(false); // amp_enabled_flag
    builder.append_bool(true); // sample_adaptive_offset_enabled_flag
    builder.append_bool(false); // pcm_enabled_flag

    builder.append_ue(NUM_SHORT_TERM_REF_PIC_SETS);
    // st_ref_pic_set(0): a single negative picture at delta POC -1.
    builder.append_ue(1); // num_negative_pics
    builder.append_ue(0); // num_positive_pics
    builder.append_ue(0); // delta_poc_s0_minus1[0]
    builder.append_bool(true); // used_by_curr_pic_s0_flag[0]
    // st_ref_pic_set(1): predicted from set 0 with deltaRps = -1, keeping
    // only the picture at delta POC -1.
    builder.append_bool(true); // inter_ref_pic_set_prediction_flag
    builder.append_bool(true); // delta_rps_sign
    builder.append_ue(0); // abs_delta_rps_minus1
    builder.append_bool(false); // used_by_curr_pic_flag[0]
    builder.append_bool(false); // use_delta_flag[0]
    builder.append_bool(true); // used_by_curr_pic_flag[1]

    builder.append_bool(false); // long_term_ref_pics_present_flag
    builder.append_bool(false); // sps_temporal_mvp_enabled_flag
    builder.append_bool(false); // strong_intra_smoothing_enabled_flag
    builder.append_bool(false); // vui_parameters_present_flag
    builder.append_bool(false); // sps_extension_present_flag
}

/// `pic_parameter_set_rbsp()`
/// ISO/IEC-23008-2-2020 - 7.3.2.3.1
fn write_pps(builder: &mut NaluBuilder) {
    builder.append_ue(0); // pps_pic_parameter_set_id
    builder.append_ue(0); // pps_seq_parameter_set_id
    builder.append_bool(false); // dependent_slice_segments_enabled_flag
    builder.append_bool(false); // output_flag_present_flag
    builder.append_bits(3, 0); // num_extra_slice_header_bits
    builder.append_bool(false); // sign_data_hiding_enabled_flag
    builder.append_bool(false); // cabac_init_present_flag
    builder.append_ue(0); // num_ref_idx_l0_default_active_minus1
    builder.append_ue(0); // num_ref_idx_l1_default_active_minus1
    builder.append_se(0); // init_qp_minus26
    builder.append_bool(false); // constrained_intra_pred_flag
    builder.append_bool(false); // transform_skip_enabled_flag
    builder.append_bool(true); // cu_qp_delta_enabled_flag
    builder.append_ue(0); // diff_cu_qp_delta_depth
    builder.append_se(0); // pps_cb_qp_offset
    builder.append_se(0); // pps_cr_qp_offset
    builder.append_bool(false); // pps_slice_chroma_qp_offsets_present_flag
    builder.append_bool(false); // weighted_pred_flag
    builder.append_bool(false); // weighted_bipred_flag
    builder.append_bool(false); // transquant_bypass_enabled_flag
    builder.append_bool(false); // tiles_enabled_flag
    builder.append_bool(false); // entropy_coding_sync_enabled_flag
    builder.append_bool(false); // pps_loop_filter_across_slices_enabled_flag
    builder.append_bool(true); // deblocking_filter_control_present_flag
    builder.append_bool(false); // deblocking_filter_override_enabled_flag
    builder.append_bool(false); // pps_deblocking_filter_disabled_flag
    builder.append_se(0); // pps_beta_offset_div2
    builder.append_se(0); // pps_tc_offset_div2
    builder.append_bool(false); // pps_scaling_list_data_present_flag
    builder.append_bool(false); // lists_modification_present_flag
    builder.append_ue(0); // log2_parallel_merge_level_minus2
    builder.append_bool(false); // slice_segment_header_extension_present_flag
    builder.append_bool(false); // pps_extension_present_flag
}

/// `profile_tier_level(1, max_sub_layers_minus1)` for Main profile.
/// ISO/IEC-23008-2-2020 - 7.3.3
fn write_profile_tier_level(builder: &mut NaluBuilder, max_sub_layers_minus1: u64) {
    builder.append_bits(2, 0); // general_profile_space
    builder.append_bool(false); // general_tier_flag
    builder.append_bits(5, GENERAL_PROFILE_IDC_MAIN);
    builder.append_bits(32, GENERAL_PROFILE_COMPATIBILITY_FLAGS);
    builder.append_bool(true); // general_progressive_source_flag
    builder.append_bool(false); // general_interlaced_source_flag
    builder.append_bool(false); // general_non_packed_constraint_flag
    builder.append_bool(true); // general_frame_only_constraint_flag
    builder.append_bits(43, 0); // general_reserved_zero_43bits
    builder.append_bool(false); // general_reserved_zero_bit
    builder.append_bits(8, GENERAL_LEVEL_IDC);

    for _ in 0..max_sub_layers_minus1 {
        builder.append_bool(false); // sub_layer_profile_present_flag
        builder.append_bool(false); // sub_layer_level_present_flag
    }
    if max_sub_layers_minus1 > 0 {
        for _ in max_sub_layers_minus1..8 {
            builder.append_bits(2, 0); // reserved_zero_2bits
        }
    }
}

/// Sub-layer ordering info with `*_sub_layer_ordering_info_present_flag = 0`,
/// shared by the VPS and SPS.
fn write_sub_layer_ordering_info(builder: &mut NaluBuilder) {
    builder.append_bool(false); // sub_layer_ordering_info_present_flag
    builder.append_ue(1); // max_dec_pic_buffering_minus1
    builder.append_ue(0); // max_num_reorder_pics
    builder.append_ue(0); // max_latency_increase_plus1
}
