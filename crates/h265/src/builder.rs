//! NAL unit framing on top of [`BitWriter`].

use bytes_util::BitWriter;
use expgolomb::BitWriterExpGolombExt;

use crate::NALUnitType;

/// Annex-B start code emitted in front of every NAL unit.
pub const START_CODE: [u8; 4] = [0x00, 0x00, 0x00, 0x01];

/// Builds an Annex-B byte stream one NAL unit at a time.
///
/// Every NAL unit is opened with [`begin_nalu`](Self::begin_nalu), filled
/// with the `append_*` methods and closed with
/// [`finish_nalu`](Self::finish_nalu). Emulation prevention is applied to
/// everything written between those two calls.
#[derive(Debug, Default)]
pub struct NaluBuilder {
    writer: BitWriter,
    in_nalu: bool,
}

impl NaluBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops all output and returns to the initial state.
    pub fn reset(&mut self) {
        self.writer.reset();
        self.in_nalu = false;
    }

    /// Writes a start code and the two-byte NAL unit header.
    ///
    /// # Panics
    ///
    /// Panics if a NAL unit is already open, if the previous one was not
    /// finished, or if `layer_id > 63` or `temporal_id > 6`.
    pub fn begin_nalu(&mut self, nal_unit_type: NALUnitType, layer_id: u8, temporal_id: u8) {
        assert!(!self.in_nalu, "begin_nalu: the previous NAL unit is still open");
        assert!(
            self.writer.is_flushed(),
            "begin_nalu: the previous NAL unit was not finished"
        );
        assert!(layer_id < 64, "begin_nalu: nuh_layer_id {layer_id} exceeds 6 bits");
        assert!(temporal_id < 7, "begin_nalu: temporal id {temporal_id} exceeds 6");

        for byte in START_CODE {
            self.writer.append_bits(8, byte as u64);
        }
        self.writer.flush();

        self.in_nalu = true;
        self.writer.set_emulation_prevention(true);

        self.writer.append_bool(false); // forbidden_zero_bit
        self.writer.append_bits(6, u8::from(nal_unit_type) as u64);
        self.writer.append_bits(6, layer_id as u64);
        self.writer.append_bits(3, temporal_id as u64 + 1);
    }

    /// Writes `rbsp_trailing_bits()` and closes the NAL unit.
    ///
    /// # Panics
    ///
    /// Panics if no NAL unit is open.
    pub fn finish_nalu(&mut self) {
        assert!(self.in_nalu, "finish_nalu: no NAL unit is open");

        self.writer.append_bool(true); // rbsp_stop_one_bit
        self.writer.byte_align();
        self.writer.flush();

        self.writer.set_emulation_prevention(false);
        self.in_nalu = false;
    }

    /// Returns `true` between [`begin_nalu`](Self::begin_nalu) and
    /// [`finish_nalu`](Self::finish_nalu).
    pub fn in_nalu(&self) -> bool {
        self.in_nalu
    }

    /// Appends `u(n)`.
    pub fn append_bits(&mut self, num_bits: u32, value: u64) {
        self.assert_in_nalu("append_bits");
        self.writer.append_bits(num_bits, value);
    }

    /// Appends a one-bit flag.
    pub fn append_bool(&mut self, bit: bool) {
        self.assert_in_nalu("append_bool");
        self.writer.append_bool(bit);
    }

    /// Appends `ue(v)`.
    pub fn append_ue(&mut self, value: u64) {
        self.assert_in_nalu("append_ue");
        self.writer.append_ue(value);
    }

    /// Appends `se(v)`.
    pub fn append_se(&mut self, value: i64) {
        self.assert_in_nalu("append_se");
        self.writer.append_se(value);
    }

    /// Writes `byte_alignment()`: a one bit followed by zero bits up to the
    /// next byte boundary.
    pub fn append_byte_alignment(&mut self) {
        self.append_bool(true); // alignment_bit_equal_to_one
        self.writer.byte_align();
    }

    /// Flushes every complete byte to the output buffer.
    pub fn flush(&mut self) {
        self.writer.flush();
    }

    /// Returns the number of output bytes, including emulation-prevention bytes.
    ///
    /// # Panics
    ///
    /// Panics if bits are still pending in the register.
    pub fn bytes_in_buffer(&self) -> usize {
        self.writer.bytes_in_buffer()
    }

    /// Returns the Annex-B output.
    ///
    /// # Panics
    ///
    /// Panics if bits are still pending in the register.
    pub fn data(&self) -> &[u8] {
        self.writer.data()
    }

    fn assert_in_nalu(&self, caller: &str) {
        assert!(self.in_nalu, "{caller}: called outside of a NAL unit");
    }
}
