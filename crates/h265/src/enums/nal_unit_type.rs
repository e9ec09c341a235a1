/// `nal_unit_type`
/// ISO/IEC-23008-2-2020 - Table 7-1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NALUnitType {
    /// `TRAIL_N`: non-reference trailing picture.
    TrailN,
    /// `TRAIL_R`: reference trailing picture.
    TrailR,
    /// `TSA_N`
    TsaN,
    /// `TSA_R`
    TsaR,
    /// `STSA_N`
    StsaN,
    /// `STSA_R`
    StsaR,
    /// `RADL_N`
    RadlN,
    /// `RADL_R`
    RadlR,
    /// `RASL_N`
    RaslN,
    /// `RASL_R`
    RaslR,
    /// `BLA_W_LP`
    BlaWLp,
    /// `BLA_W_RADL`
    BlaWRadl,
    /// `BLA_N_LP`
    BlaNLp,
    /// `IDR_W_RADL`
    IdrWRadl,
    /// `IDR_N_LP`
    IdrNLp,
    /// `CRA_NUT`
    CraNut,
    /// `VPS_NUT`: video parameter set.
    VpsNut,
    /// `SPS_NUT`: sequence parameter set.
    SpsNut,
    /// `PPS_NUT`: picture parameter set.
    PpsNut,
    /// `AUD_NUT`: access unit delimiter.
    AudNut,
    /// `EOS_NUT`: end of sequence.
    EosNut,
    /// `EOB_NUT`: end of bitstream.
    EobNut,
    /// `FD_NUT`: filler data.
    FdNut,
    /// `PREFIX_SEI_NUT`
    PrefixSeiNut,
    /// `SUFFIX_SEI_NUT`
    SuffixSeiNut,
    /// Reserved or unspecified values.
    Other(u8),
}

impl NALUnitType {
    /// Returns `true` for intra random access point types (16..=23).
    pub fn is_irap(self) -> bool {
        (16..=23).contains(&u8::from(self))
    }

    /// Returns `true` for `IDR_W_RADL` and `IDR_N_LP`.
    pub fn is_idr(self) -> bool {
        matches!(self, NALUnitType::IdrWRadl | NALUnitType::IdrNLp)
    }

    /// Returns `true` for VCL NAL unit types (0..=31).
    pub fn is_vcl(self) -> bool {
        u8::from(self) < 32
    }
}

impl From<u8> for NALUnitType {
    fn from(value: u8) -> Self {
        match value {
            0 => NALUnitType::TrailN,
            1 => NALUnitType::TrailR,
            2 => NALUnitType::TsaN,
            3 => NALUnitType::TsaR,
            4 => NALUnitType::StsaN,
            5 => NALUnitType::StsaR,
            6 => NALUnitType::RadlN,
            7 => NALUnitType::RadlR,
            8 => NALUnitType::RaslN,
            9 => NALUnitType::RaslR,
            16 => NALUnitType::BlaWLp,
            17 => NALUnitType::BlaWRadl,
            18 => NALUnitType::BlaNLp,
            19 => NALUnitType::IdrWRadl,
            20 => NALUnitType::IdrNLp,
            21 => NALUnitType::CraNut,
            32 => NALUnitType::VpsNut,
            33 => NALUnitType::SpsNut,
            34 => NALUnitType::PpsNut,
            35 => NALUnitType::AudNut,
            36 => NALUnitType::EosNut,
            37 => NALUnitType::EobNut,
            38 => NALUnitType::FdNut,
            39 => NALUnitType::PrefixSeiNut,
            40 => NALUnitType::SuffixSeiNut,
            _ => NALUnitType::Other(value),
        }
    }
}

impl From<NALUnitType> for u8 {
    fn from(value: NALUnitType) -> Self {
        match value {
            NALUnitType::TrailN => 0,
            NALUnitType::TrailR => 1,
            NALUnitType::TsaN => 2,
            NALUnitType::TsaR => 3,
            NALUnitType::StsaN => 4,
            NALUnitType::StsaR => 5,
            NALUnitType::RadlN => 6,
            NALUnitType::RadlR => 7,
            NALUnitType::RaslN => 8,
            NALUnitType::RaslR => 9,
            NALUnitType::BlaWLp => 16,
            NALUnitType::BlaWRadl => 17,
            NALUnitType::BlaNLp => 18,
            NALUnitType::IdrWRadl => 19,
            NALUnitType::IdrNLp => 20,
            NALUnitType::CraNut => 21,
            NALUnitType::VpsNut => 32,
            NALUnitType::SpsNut => 33,
            NALUnitType::PpsNut => 34,
            NALUnitType::AudNut => 35,
            NALUnitType::EosNut => 36,
            NALUnitType::EobNut => 37,
            NALUnitType::FdNut => 38,
            NALUnitType::PrefixSeiNut => 39,
            NALUnitType::SuffixSeiNut => 40,
            NALUnitType::Other(value) => value,
        }
    }
}
