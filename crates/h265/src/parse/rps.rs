use std::io;

use bytes_util::BitReader;
use expgolomb::BitReaderExpGolombExt;

use super::invalid;

/// Upper bound on pictures in one set (`sps_max_dec_pic_buffering_minus1 < 16`).
const MAX_PICS: u64 = 16;

/// `st_ref_pic_set(stRpsIdx)` with the derived delta POC lists.
/// ISO/IEC-23008-2-2020 - 7.3.7 and 7.4.8
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortTermRefPicSet {
    /// `inter_ref_pic_set_prediction_flag`
    pub inter_ref_pic_set_prediction_flag: bool,
    /// `DeltaPocS0`, closest picture first.
    pub delta_poc_s0: Vec<i32>,
    /// `UsedByCurrPicS0`
    pub used_by_curr_pic_s0: Vec<bool>,
    /// `DeltaPocS1`, closest picture first.
    pub delta_poc_s1: Vec<i32>,
    /// `UsedByCurrPicS1`
    pub used_by_curr_pic_s1: Vec<bool>,
}

impl ShortTermRefPicSet {
    /// `NumNegativePics`
    pub fn num_negative_pics(&self) -> usize {
        self.delta_poc_s0.len()
    }

    /// `NumPositivePics`
    pub fn num_positive_pics(&self) -> usize {
        self.delta_poc_s1.len()
    }

    /// `NumDeltaPocs`
    pub fn num_delta_pocs(&self) -> usize {
        self.num_negative_pics() + self.num_positive_pics()
    }

    /// Number of pictures the current picture may reference.
    pub fn num_used_by_curr_pic(&self) -> usize {
        self.used_by_curr_pic_s0
            .iter()
            .chain(&self.used_by_curr_pic_s1)
            .filter(|used| **used)
            .count()
    }

    /// Parses set `st_rps_idx` given the sets that precede it in the SPS.
    ///
    /// `st_rps_idx == previous.len()` is the case of a set coded in a slice
    /// header, where `delta_idx_minus1` is present.
    pub(crate) fn parse<R: io::Read>(
        bit_reader: &mut BitReader<R>,
        st_rps_idx: usize,
        previous: &[ShortTermRefPicSet],
        num_short_term_ref_pic_sets: usize,
    ) -> io::Result<Self> {
        let inter_ref_pic_set_prediction_flag = st_rps_idx != 0 && bit_reader.read_bit()?;

        if inter_ref_pic_set_prediction_flag {
            let delta_idx_minus1 = if st_rps_idx == num_short_term_ref_pic_sets {
                bit_reader.read_exp_golomb()?
            } else {
                0
            };
            let ref_rps_idx = (st_rps_idx as u64)
                .checked_sub(delta_idx_minus1 + 1)
                .and_then(|idx| previous.get(idx as usize))
                .ok_or_else(|| {
                    invalid(format!("delta_idx_minus1 {delta_idx_minus1} is out of range"))
                })?;

            let delta_rps_sign = bit_reader.read_bit()?;
            let abs_delta_rps_minus1 = bit_reader.read_exp_golomb()?;
            if abs_delta_rps_minus1 >= 1 << 15 {
                return Err(invalid(format!(
                    "abs_delta_rps_minus1 {abs_delta_rps_minus1} is out of range"
                )));
            }
            let magnitude = abs_delta_rps_minus1 as i32 + 1;
            let delta_rps = if delta_rps_sign { -magnitude } else { magnitude };

            let mut used_by_curr_pic_flag = Vec::with_capacity(ref_rps_idx.num_delta_pocs() + 1);
            let mut use_delta_flag = Vec::with_capacity(ref_rps_idx.num_delta_pocs() + 1);
            for _ in 0..=ref_rps_idx.num_delta_pocs() {
                let used = bit_reader.read_bit()?;
                used_by_curr_pic_flag.push(used);
                use_delta_flag.push(used || bit_reader.read_bit()?);
            }

            Ok(Self::predict(
                ref_rps_idx,
                delta_rps,
                &used_by_curr_pic_flag,
                &use_delta_flag,
            ))
        } else {
            let num_negative_pics = bit_reader.read_exp_golomb()?;
            let num_positive_pics = bit_reader.read_exp_golomb()?;
            if num_negative_pics > MAX_PICS || num_positive_pics > MAX_PICS {
                return Err(invalid(format!(
                    "st_ref_pic_set with {num_negative_pics} negative and {num_positive_pics} positive pictures"
                )));
            }

            let mut set = ShortTermRefPicSet::default();
            let mut poc = 0i32;
            for _ in 0..num_negative_pics {
                poc -= read_delta_poc_minus1(bit_reader)? + 1;
                set.delta_poc_s0.push(poc);
                set.used_by_curr_pic_s0.push(bit_reader.read_bit()?);
            }
            poc = 0;
            for _ in 0..num_positive_pics {
                poc += read_delta_poc_minus1(bit_reader)? + 1;
                set.delta_poc_s1.push(poc);
                set.used_by_curr_pic_s1.push(bit_reader.read_bit()?);
            }
            Ok(set)
        }
    }

    /// Equations 7-61 and 7-62.
    fn predict(
        reference: &ShortTermRefPicSet,
        delta_rps: i32,
        used_by_curr_pic_flag: &[bool],
        use_delta_flag: &[bool],
    ) -> Self {
        let num_negative = reference.num_negative_pics();
        let num_delta_pocs = reference.num_delta_pocs();
        let mut set = ShortTermRefPicSet {
            inter_ref_pic_set_prediction_flag: true,
            ..Default::default()
        };

        for j in (0..reference.num_positive_pics()).rev() {
            let d_poc = reference.delta_poc_s1[j] + delta_rps;
            if d_poc < 0 && use_delta_flag[num_negative + j] {
                set.delta_poc_s0.push(d_poc);
                set.used_by_curr_pic_s0.push(used_by_curr_pic_flag[num_negative + j]);
            }
        }
        if delta_rps < 0 && use_delta_flag[num_delta_pocs] {
            set.delta_poc_s0.push(delta_rps);
            set.used_by_curr_pic_s0.push(used_by_curr_pic_flag[num_delta_pocs]);
        }
        for j in 0..num_negative {
            let d_poc = reference.delta_poc_s0[j] + delta_rps;
            if d_poc < 0 && use_delta_flag[j] {
                set.delta_poc_s0.push(d_poc);
                set.used_by_curr_pic_s0.push(used_by_curr_pic_flag[j]);
            }
        }

        for j in (0..num_negative).rev() {
            let d_poc = reference.delta_poc_s0[j] + delta_rps;
            if d_poc > 0 && use_delta_flag[j] {
                set.delta_poc_s1.push(d_poc);
                set.used_by_curr_pic_s1.push(used_by_curr_pic_flag[j]);
            }
        }
        if delta_rps > 0 && use_delta_flag[num_delta_pocs] {
            set.delta_poc_s1.push(delta_rps);
            set.used_by_curr_pic_s1.push(used_by_curr_pic_flag[num_delta_pocs]);
        }
        for j in 0..reference.num_positive_pics() {
            let d_poc = reference.delta_poc_s1[j] + delta_rps;
            if d_poc > 0 && use_delta_flag[num_negative + j] {
                set.delta_poc_s1.push(d_poc);
                set.used_by_curr_pic_s1.push(used_by_curr_pic_flag[num_negative + j]);
            }
        }

        set
    }
}

fn read_delta_poc_minus1<R: io::Read>(bit_reader: &mut BitReader<R>) -> io::Result<i32> {
    let value = bit_reader.read_exp_golomb()?;
    if value >= 1 << 15 {
        return Err(invalid(format!("delta_poc_minus1 {value} is out of range")));
    }
    Ok(value as i32)
}
