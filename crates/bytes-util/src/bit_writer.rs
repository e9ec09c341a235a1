use bytes::Bytes;

/// Width of the scratch register in bits.
const REG_BITS: u32 = u64::BITS;

/// The output buffer grows by this many bytes whenever it is full.
pub const BUFFER_GROWTH_STEP: usize = 4096;

/// An MSB-first bit writer.
///
/// Bits are accumulated in a 64-bit register and moved to the byte buffer
/// in whole bytes. While emulation prevention is active every byte `<= 0x03`
/// that would follow two zero bytes is preceded by an `0x03` escape byte.
///
/// Reading the buffer ([`data`](Self::data), [`bytes_in_buffer`](Self::bytes_in_buffer))
/// requires the register to be empty, i.e. the stream must be byte aligned
/// and flushed.
#[derive(Debug)]
pub struct BitWriter {
    buf: Vec<u8>,
    reg: u64,
    bits_left_in_reg: u32,
    emulation_prevention: bool,
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BitWriter {
    /// Creates an empty writer with emulation prevention disabled.
    pub fn new() -> Self {
        let mut writer = Self {
            buf: Vec::new(),
            reg: 0,
            bits_left_in_reg: REG_BITS,
            emulation_prevention: false,
        };
        writer.grow();
        writer
    }

    /// Drops all written data and returns to the initial state.
    pub fn reset(&mut self) {
        self.buf = Vec::new();
        self.grow();
        self.reg = 0;
        self.bits_left_in_reg = REG_BITS;
        self.emulation_prevention = false;
    }

    /// Enables or disables emulation-prevention byte insertion for bytes
    /// flushed from now on.
    pub fn set_emulation_prevention(&mut self, enabled: bool) {
        self.emulation_prevention = enabled;
    }

    /// Returns `true` if emulation-prevention bytes are currently inserted.
    pub fn emulation_prevention(&self) -> bool {
        self.emulation_prevention
    }

    /// Appends the low `num_bits` bits of `value`, most significant bit first.
    ///
    /// # Panics
    ///
    /// Panics if `num_bits > 64`.
    pub fn append_bits(&mut self, num_bits: u32, value: u64) {
        assert!(
            num_bits <= REG_BITS,
            "append_bits: {num_bits} bits do not fit the {REG_BITS}-bit register"
        );
        if num_bits == 0 {
            return;
        }

        let value = if num_bits == REG_BITS {
            value
        } else {
            value & ((1u64 << num_bits) - 1)
        };

        if num_bits <= self.bits_left_in_reg {
            self.bits_left_in_reg -= num_bits;
            self.reg |= value << self.bits_left_in_reg;
            if self.bits_left_in_reg == 0 {
                self.flush_reg();
            }
            return;
        }

        // The value straddles the register boundary: fill the register with
        // the high bits, drain it, then start over with the low bits.
        let spill = num_bits - self.bits_left_in_reg;
        self.reg |= value >> spill;
        self.bits_left_in_reg = 0;
        self.flush_reg();

        self.bits_left_in_reg = REG_BITS - spill;
        self.reg = value << self.bits_left_in_reg;
    }

    /// Appends a single bit.
    pub fn append_bool(&mut self, bit: bool) {
        self.append_bits(1, bit as u64);
    }

    /// Pads with zero bits up to the next byte boundary.
    pub fn byte_align(&mut self) {
        let pending = (REG_BITS - self.bits_left_in_reg) % 8;
        if pending != 0 {
            self.append_bits(8 - pending, 0);
        }
    }

    /// Returns `true` if the number of bits written so far is a multiple of 8.
    pub fn is_byte_aligned(&self) -> bool {
        (REG_BITS - self.bits_left_in_reg) % 8 == 0
    }

    /// Returns `true` if the register holds no pending bits.
    pub fn is_flushed(&self) -> bool {
        self.bits_left_in_reg == REG_BITS
    }

    /// Moves every complete byte from the register to the buffer.
    ///
    /// Bits that do not form a whole byte stay in the register.
    pub fn flush_reg(&mut self) {
        while self.bits_left_in_reg <= REG_BITS - 8 {
            let byte = (self.reg >> (REG_BITS - 8)) as u8;
            self.reg <<= 8;
            self.bits_left_in_reg += 8;
            self.push_byte(byte);
        }
    }

    /// Flushes the register if it holds any bits.
    pub fn flush(&mut self) {
        if !self.is_flushed() {
            self.flush_reg();
        }
    }

    /// Returns the number of bytes in the buffer.
    ///
    /// # Panics
    ///
    /// Panics if the register still holds bits.
    pub fn bytes_in_buffer(&self) -> usize {
        self.assert_flushed("bytes_in_buffer");
        self.buf.len()
    }

    /// Returns the written bytes.
    ///
    /// # Panics
    ///
    /// Panics if the register still holds bits.
    pub fn data(&self) -> &[u8] {
        self.assert_flushed("data");
        &self.buf
    }

    /// Returns the current buffer capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Consumes the writer and returns the written bytes.
    ///
    /// # Panics
    ///
    /// Panics if the register still holds bits.
    pub fn into_bytes(self) -> Bytes {
        self.assert_flushed("into_bytes");
        Bytes::from(self.buf)
    }

    fn assert_flushed(&self, caller: &str) {
        assert!(
            self.is_flushed(),
            "{caller}: {} bits are still pending in the register",
            REG_BITS - self.bits_left_in_reg
        );
    }

    fn push_byte(&mut self, byte: u8) {
        if self.emulation_prevention && byte <= 0x03 && self.buf.ends_with(&[0x00, 0x00]) {
            self.push_raw(0x03);
        }
        self.push_raw(byte);
    }

    fn push_raw(&mut self, byte: u8) {
        if self.buf.len() == self.buf.capacity() {
            self.grow();
        }
        self.buf.push(byte);
    }

    fn grow(&mut self) {
        self.buf.reserve_exact(BUFFER_GROWTH_STEP);
    }
}
