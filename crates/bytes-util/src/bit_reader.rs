use std::io;

/// An MSB-first bit reader over any [`io::Read`].
#[derive(Debug)]
pub struct BitReader<T> {
    data: T,
    bit_pos: u8,
    current_byte: u8,
}

impl<T: io::Read> BitReader<T> {
    /// Creates a new bit reader positioned at the first bit of `data`.
    pub fn new(data: T) -> Self {
        Self {
            data,
            bit_pos: 0,
            current_byte: 0,
        }
    }

    /// Reads a single bit.
    pub fn read_bit(&mut self) -> io::Result<bool> {
        if self.is_aligned() {
            let mut byte = [0u8; 1];
            self.data.read_exact(&mut byte)?;
            self.current_byte = byte[0];
        }

        let bit = (self.current_byte >> (7 - self.bit_pos)) & 1 == 1;
        self.bit_pos = (self.bit_pos + 1) % 8;
        Ok(bit)
    }

    /// Reads `count` bits (at most 64) as an unsigned integer.
    pub fn read_bits(&mut self, count: u8) -> io::Result<u64> {
        if count > 64 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot read more than 64 bits at once",
            ));
        }

        let mut value = 0u64;
        for _ in 0..count {
            value = (value << 1) | self.read_bit()? as u64;
        }
        Ok(value)
    }

    /// Skips `count` bits.
    pub fn seek_bits(&mut self, count: usize) -> io::Result<()> {
        for _ in 0..count {
            self.read_bit()?;
        }
        Ok(())
    }

    /// Discards the remaining bits of the current byte.
    pub fn align(&mut self) {
        self.bit_pos = 0;
    }

    /// Returns `true` if the reader is on a byte boundary.
    pub fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Returns the underlying reader.
    pub fn into_inner(self) -> T {
        self.data
    }

    /// Returns a reference to the underlying reader.
    pub fn get_ref(&self) -> &T {
        &self.data
    }
}
