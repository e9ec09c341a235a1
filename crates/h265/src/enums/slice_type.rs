/// `slice_type`
/// ISO/IEC-23008-2-2020 - Table 7-7
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceType {
    /// Bi-predicted slice.
    B,
    /// Predicted slice.
    P,
    /// Intra slice.
    I,
}

impl SliceType {
    /// Returns the `slice_type` code.
    pub fn code(self) -> u64 {
        match self {
            SliceType::B => 0,
            SliceType::P => 1,
            SliceType::I => 2,
        }
    }

    /// Maps a `slice_type` code back to the enum.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(SliceType::B),
            1 => Some(SliceType::P),
            2 => Some(SliceType::I),
            _ => None,
        }
    }

    /// Returns `true` for P and B slices.
    pub fn is_inter(self) -> bool {
        matches!(self, SliceType::P | SliceType::B)
    }
}
