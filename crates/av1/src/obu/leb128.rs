use std::io;

use bytes_util::BitReader;

/// Largest value a conforming `leb128()` may carry.
/// AV1-Spec-2 - 4.10.5
pub const MAX_LEB128_VALUE: u64 = u32::MAX as u64;

/// Reads `leb128()`, at most 8 bytes.
///
/// Values above [`MAX_LEB128_VALUE`] are rejected with `InvalidData`.
pub fn read_leb128<T: io::Read>(reader: &mut BitReader<T>) -> io::Result<u64> {
    let mut value = 0u64;
    let mut shift = 0;
    loop {
        let byte = reader.read_bits(8)?;
        value |= (byte & 0x7F) << shift;
        shift += 7;
        if byte & 0x80 == 0 || shift == 56 {
            break;
        }
    }

    if value > MAX_LEB128_VALUE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("leb128 value {value} exceeds {MAX_LEB128_VALUE}"),
        ));
    }
    Ok(value)
}

/// Writes `value` as `leb128()` using the minimal number of bytes.
///
/// Returns the number of bytes written.
pub fn write_leb128<W: io::Write>(writer: &mut W, value: u64) -> io::Result<usize> {
    let size = leb128_size(value);
    let mut bytes = [0u8; 10];
    for (i, byte) in bytes[..size].iter_mut().enumerate() {
        *byte = ((value >> (7 * i)) & 0x7F) as u8;
        if i + 1 < size {
            *byte |= 0x80;
        }
    }
    writer.write_all(&bytes[..size])?;
    Ok(size)
}

/// Returns the number of bytes [`write_leb128`] uses for `value`.
pub fn leb128_size(value: u64) -> usize {
    let significant_bits = (u64::BITS - value.leading_zeros()).max(1) as usize;
    significant_bits.div_ceil(7)
}

#[cfg(test)]
#[cfg_attr(all(test, coverage_nightly), coverage(off))]
mod tests {
    use super::*;

    fn encode(value: u64) -> Vec<u8> {
        let mut buf = Vec::new();
        let written = write_leb128(&mut buf, value).unwrap();
        assert_eq!(written, buf.len());
        buf
    }

    #[test]
    fn test_write_leb128() {
        assert_eq!(encode(0), [0x00]);
        assert_eq!(encode(127), [0x7F]);
        assert_eq!(encode(128), [0x80, 0x01]);
        assert_eq!(encode(300), [0xAC, 0x02]);
        assert_eq!(encode(16_384), [0x80, 0x80, 0x01]);
        assert_eq!(encode(MAX_LEB128_VALUE), [0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_leb128_size() {
        let cases = [
            (0, 1),
            (127, 1),
            (128, 2),
            (16_383, 2),
            (16_384, 3),
            (MAX_LEB128_VALUE, 5),
        ];
        for (value, size) in cases {
            assert_eq!(leb128_size(value), size, "size of {value}");
        }
    }

    #[test]
    fn test_read_leb128() {
        for value in [0, 1, 127, 128, 300, 65_535, MAX_LEB128_VALUE] {
            let mut reader = BitReader::new(io::Cursor::new(encode(value)));
            assert_eq!(read_leb128(&mut reader).unwrap(), value);
        }
    }

    #[test]
    fn test_read_leb128_non_minimal() {
        // padded encodings are legal
        let mut reader = BitReader::new(io::Cursor::new([0x85, 0x80, 0x00]));
        assert_eq!(read_leb128(&mut reader).unwrap(), 5);
        assert_eq!(reader.get_ref().position(), 3);
    }

    #[test]
    fn test_read_leb128_overflow() {
        let mut reader = BitReader::new(io::Cursor::new([0x80, 0x80, 0x80, 0x80, 0x10]));
        let err = read_leb128(&mut reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_read_leb128_truncated() {
        let mut reader = BitReader::new(io::Cursor::new([0x80]));
        let err = read_leb128(&mut reader).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }
}
