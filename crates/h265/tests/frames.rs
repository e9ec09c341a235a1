use h265::parse::{NalUnit, Pps, SliceSegmentHeader, Sps, Vps, split_annex_b};
use h265::{NALUnitType, NaluBuilder, SliceType, build_delta_frame, build_key_frame};
use rstest::rstest;

struct ParameterSets {
    vps: Vps,
    sps: Sps,
    pps: Pps,
}

fn parse_key_frame(data: &[u8]) -> (ParameterSets, NalUnit) {
    let nal_units: Vec<NalUnit> = split_annex_b(data)
        .into_iter()
        .map(|nal| NalUnit::parse(nal).unwrap())
        .collect();
    let types: Vec<NALUnitType> = nal_units.iter().map(|nal| nal.header.nal_unit_type).collect();
    assert_eq!(
        types,
        [
            NALUnitType::VpsNut,
            NALUnitType::SpsNut,
            NALUnitType::PpsNut,
            NALUnitType::IdrWRadl
        ]
    );

    let mut nal_units = nal_units.into_iter();
    let vps = Vps::parse(&nal_units.next().unwrap().rbsp).unwrap();
    let sps = Sps::parse(&nal_units.next().unwrap().rbsp).unwrap();
    let pps = Pps::parse(&nal_units.next().unwrap().rbsp).unwrap();
    (ParameterSets { vps, sps, pps }, nal_units.next().unwrap())
}

fn parse_slice(data: &[u8], sets: &ParameterSets) -> (NalUnit, SliceSegmentHeader) {
    let nal_units = split_annex_b(data);
    assert_eq!(nal_units.len(), 1);
    let nal = NalUnit::parse(nal_units[0]).unwrap();
    let header =
        SliceSegmentHeader::parse(&nal.rbsp, nal.header.nal_unit_type, &sets.sps, &sets.pps)
            .unwrap();
    (nal, header)
}

#[test]
fn key_frame_parses_back() {
    let mut builder = NaluBuilder::new();
    build_key_frame(&mut builder, 1920, 1080, 1, 30, 5000);

    let (sets, idr) = parse_key_frame(builder.data());
    assert_eq!(sets.sps.width(), 1920);
    assert_eq!(sets.sps.height(), 1080);
    assert_eq!(sets.sps.sps_max_sub_layers_minus1, 0);
    assert_eq!(sets.vps.vps_max_sub_layers_minus1, 0);
    assert_eq!(sets.sps.profile_tier_level.general_profile_idc, 1);
    assert_eq!(sets.sps.profile_tier_level.general_level_idc, 150);

    let header =
        SliceSegmentHeader::parse(&idr.rbsp, idr.header.nal_unit_type, &sets.sps, &sets.pps)
            .unwrap();
    assert_eq!(header.slice_type, SliceType::I);
    assert_eq!(header.slice_qp_y(&sets.pps), 30);
}

#[rstest]
fn temporal_layers_are_signalled_in_vps_and_sps(#[values(1, 2, 3, 4, 5, 6, 7)] layers: u8) {
    let mut builder = NaluBuilder::new();
    build_key_frame(&mut builder, 640, 480, layers, 26, 200);
    let (sets, _) = parse_key_frame(builder.data());
    assert_eq!(sets.vps.vps_max_sub_layers_minus1, layers - 1);
    assert_eq!(sets.sps.sps_max_sub_layers_minus1, layers - 1);
    assert_eq!(u8::from(sets.sps.num_temporal_layers()), layers);
}

#[test]
fn delta_frame_parses_against_key_frame_parameter_sets() {
    let mut builder = NaluBuilder::new();
    build_key_frame(&mut builder, 1920, 1080, 3, 30, 5000);
    let (sets, _) = parse_key_frame(builder.data());

    build_delta_frame(&mut builder, 1, 27, 2000, 1);
    let (nal, header) = parse_slice(builder.data(), &sets);
    assert_eq!(nal.header.nal_unit_type, NALUnitType::TrailN);
    assert_eq!(nal.header.temporal_id, 1);
    assert_eq!(header.slice_type, SliceType::P);
    assert_eq!(header.slice_pic_order_cnt_lsb, 1);
    assert_eq!(header.slice_qp_y(&sets.pps), 27);
}

#[rstest]
#[case::base_layer(0, 30, 0)]
#[case::first_enhancement(1, 27, 1)]
#[case::highest_layer(6, 51, 15)]
#[case::lowest_qp(2, 0, 9)]
fn delta_frame_fields_parse_back(
    #[case] temporal_id: u8,
    #[case] qp: u32,
    #[case] poc_lsb: u8,
) {
    let mut builder = NaluBuilder::new();
    build_key_frame(&mut builder, 1280, 720, 7, 30, 1000);
    let (sets, _) = parse_key_frame(builder.data());

    build_delta_frame(&mut builder, temporal_id, qp, 500, poc_lsb);
    let (nal, header) = parse_slice(builder.data(), &sets);
    assert_eq!(nal.header.temporal_id, temporal_id);
    assert_eq!(header.slice_pic_order_cnt_lsb, poc_lsb as u16);
    assert_eq!(header.slice_qp_y(&sets.pps), qp as i64);
    assert_eq!(header.short_term_ref_pic_set_idx, (temporal_id + 1) % 2);
}

#[test]
fn delta_frame_sequence_wraps_poc_lsb() {
    let mut builder = NaluBuilder::new();
    build_key_frame(&mut builder, 320, 240, 2, 30, 400);
    let (sets, _) = parse_key_frame(builder.data());

    for i in 0..32u8 {
        let poc_lsb = (i + 1) % 16;
        let temporal_id = i % 2;
        build_delta_frame(&mut builder, temporal_id, 20 + i as u32, 300, poc_lsb);
        let (nal, header) = parse_slice(builder.data(), &sets);
        assert_eq!(header.slice_pic_order_cnt_lsb, poc_lsb as u16);
        assert_eq!(nal.header.temporal_id, temporal_id);
        assert_eq!(header.slice_qp_y(&sets.pps), 20 + i as i64);
    }
}

#[test]
fn padding_is_escaped_and_recovered() {
    let mut builder = NaluBuilder::new();
    build_delta_frame(&mut builder, 0, 30, 3000, 3);
    let data = builder.data().to_vec();
    let nal = split_annex_b(&data)[0];

    // long zero runs are broken by emulation prevention, never by start codes
    assert!(!nal.windows(3).any(|w| w[0] == 0 && w[1] == 0 && w[2] <= 0x02));
    assert!(nal.windows(3).any(|w| w == [0, 0, 3]));

    let rbsp = NalUnit::parse(nal).unwrap().rbsp;
    assert!(rbsp.len() < nal.len() - 2);
    assert_eq!(rbsp.last(), Some(&0x80));
    assert!(rbsp[rbsp.len() - 100..rbsp.len() - 1].iter().all(|b| *b == 0));
}

#[test]
fn key_frames_of_different_sizes_share_parameter_sets() {
    let mut builder = NaluBuilder::new();
    build_key_frame(&mut builder, 1280, 720, 1, 30, 100);
    let small = builder.data().to_vec();
    build_key_frame(&mut builder, 1280, 720, 1, 30, 20_000);
    let large = builder.data().to_vec();

    let small_nal_units = split_annex_b(&small);
    let large_nal_units = split_annex_b(&large);
    assert_eq!(small_nal_units[..3], large_nal_units[..3]);
    assert!(large.len() > small.len() * 10);
}
