mod nal_unit_type;
mod num_temporal_layers;
mod slice_type;

pub use nal_unit_type::NALUnitType;
pub use num_temporal_layers::NumTemporalLayers;
pub use slice_type::SliceType;
