/// The number of temporal sub-layers signalled by a parameter set.
///
/// Derived from `sps_max_sub_layers_minus1 + 1` (or the VPS equivalent).
/// `0` and `1` are special values.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NumTemporalLayers {
    /// The stream might be temporally scalable.
    Unknown,
    /// The stream is not temporally scalable.
    NotScalable,
    /// A specific number of temporal layers, represented by the enclosed value.
    Count(u8),
}

impl NumTemporalLayers {
    /// Builds the value from a `*_max_sub_layers_minus1` syntax element.
    pub fn from_max_sub_layers_minus1(max_sub_layers_minus1: u8) -> Self {
        Self::from(max_sub_layers_minus1 + 1)
    }
}

impl From<u8> for NumTemporalLayers {
    fn from(value: u8) -> Self {
        match value {
            0 => NumTemporalLayers::Unknown,
            1 => NumTemporalLayers::NotScalable,
            _ => NumTemporalLayers::Count(value),
        }
    }
}

impl From<NumTemporalLayers> for u8 {
    fn from(value: NumTemporalLayers) -> Self {
        match value {
            NumTemporalLayers::Unknown => 0,
            NumTemporalLayers::NotScalable => 1,
            NumTemporalLayers::Count(count) => count,
        }
    }
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_from_max_sub_layers_minus1() {
        assert_eq!(
            NumTemporalLayers::from_max_sub_layers_minus1(0),
            NumTemporalLayers::NotScalable
        );
        assert_eq!(
            NumTemporalLayers::from_max_sub_layers_minus1(2),
            NumTemporalLayers::Count(3)
        );
        assert_eq!(u8::from(NumTemporalLayers::Count(3)), 3);
        assert_eq!(u8::from(NumTemporalLayers::Unknown), 0);
    }
}
