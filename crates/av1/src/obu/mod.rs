//! OBU headers and LEB128 as used in low-overhead AV1 bitstreams.

use std::io;

use bytes_util::{BitReader, BitWriter};

use crate::{Av1Error, Result};

mod leb128;

pub use leb128::{MAX_LEB128_VALUE, leb128_size, read_leb128, write_leb128};

/// OBU Header
/// AV1-Spec-2 - 5.3.2
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct ObuHeader {
    /// `obu_type`
    ///
    /// 4 bits
    pub obu_type: ObuType,
    /// `obu_size` if `obu_has_size_field` is 1
    ///
    /// leb128()
    pub size: Option<u64>,
    /// `obu_extension_header()` if `obu_extension_flag` is 1
    pub extension_header: Option<ObuExtensionHeader>,
}

/// OBU Extension Header
/// AV1-Spec-2 - 5.3.3
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub struct ObuExtensionHeader {
    /// `temporal_id`
    ///
    /// 3 bits
    pub temporal_id: u8,
    /// `spatial_id`
    ///
    /// 2 bits
    pub spatial_id: u8,
}

impl ObuHeader {
    /// Parses an OBU header, leaving `reader` at the first payload byte.
    pub fn parse(reader: &mut impl io::Read) -> io::Result<Self> {
        let mut bit_reader = BitReader::new(reader);

        if bit_reader.read_bit()? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "obu_forbidden_bit is not 0",
            ));
        }
        let obu_type = ObuType::from(bit_reader.read_bits(4)? as u8);
        let obu_extension_flag = bit_reader.read_bit()?;
        let obu_has_size_field = bit_reader.read_bit()?;
        bit_reader.read_bit()?; // obu_reserved_1bit

        let extension_header = if obu_extension_flag {
            let temporal_id = bit_reader.read_bits(3)? as u8;
            let spatial_id = bit_reader.read_bits(2)? as u8;
            bit_reader.read_bits(3)?; // extension_header_reserved_3bits
            Some(ObuExtensionHeader {
                temporal_id,
                spatial_id,
            })
        } else {
            None
        };

        let size = if obu_has_size_field {
            Some(read_leb128(&mut bit_reader)?)
        } else {
            None
        };

        Ok(ObuHeader {
            obu_type,
            size,
            extension_header,
        })
    }

    /// Writes the header. `obu_has_size_field` is set when `size` is `Some`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Panics
    ///
    /// Panics if the extension header ids do not fit their 3 and 2 bit fields.
    pub fn mux<W: io::Write>(&self, writer: &mut W) -> io::Result<usize> {
        let mut bit_writer = BitWriter::new();
        bit_writer.append_bool(false); // obu_forbidden_bit
        bit_writer.append_bits(4, u8::from(self.obu_type) as u64);
        bit_writer.append_bool(self.extension_header.is_some());
        bit_writer.append_bool(self.size.is_some());
        bit_writer.append_bool(false); // obu_reserved_1bit

        if let Some(extension) = &self.extension_header {
            assert!(
                extension.temporal_id < 8,
                "temporal_id {} exceeds 3 bits",
                extension.temporal_id
            );
            assert!(
                extension.spatial_id < 4,
                "spatial_id {} exceeds 2 bits",
                extension.spatial_id
            );
            bit_writer.append_bits(3, extension.temporal_id as u64);
            bit_writer.append_bits(2, extension.spatial_id as u64);
            bit_writer.append_bits(3, 0); // extension_header_reserved_3bits
        }
        bit_writer.flush();

        writer.write_all(bit_writer.data())?;
        let mut written = bit_writer.bytes_in_buffer();
        if let Some(size) = self.size {
            written += write_leb128(writer, size)?;
        }
        Ok(written)
    }

    /// Returns the number of bytes [`mux`](Self::mux) writes.
    pub fn header_size(&self) -> usize {
        let fixed = if self.extension_header.is_some() { 2 } else { 1 };
        fixed + self.size.map_or(0, leb128_size)
    }
}

/// Walks a low-overhead bitstream (`obu_has_size_field = 1`) and returns the
/// extension header of the first OBU that carries one.
///
/// An OBU without a size field extends to the end of `data` and ends the walk.
pub fn first_extension_header(data: &[u8]) -> Result<Option<ObuExtensionHeader>> {
    let mut cursor = io::Cursor::new(data);
    while (cursor.position() as usize) < data.len() {
        let header = ObuHeader::parse(&mut cursor)?;
        if header.extension_header.is_some() {
            return Ok(header.extension_header);
        }
        let Some(size) = header.size else {
            break;
        };

        let next = cursor
            .position()
            .checked_add(size)
            .filter(|next| *next <= data.len() as u64)
            .ok_or_else(|| {
                Av1Error::InvalidObu(format!(
                    "{:?} of {size} bytes overruns the {} byte packet",
                    header.obu_type,
                    data.len()
                ))
            })?;
        cursor.set_position(next);
    }
    Ok(None)
}

/// OBU Type
/// AV1-Spec-2 - 6.2.2
#[derive(Debug, Clone, PartialEq, Eq, Copy)]
pub enum ObuType {
    /// `OBU_SEQUENCE_HEADER`
    SequenceHeader,
    /// `OBU_TEMPORAL_DELIMITER`
    TemporalDelimiter,
    /// `OBU_FRAME_HEADER`
    FrameHeader,
    /// `OBU_TILE_GROUP`
    TileGroup,
    /// `OBU_METADATA`
    Metadata,
    /// `OBU_FRAME`
    Frame,
    /// `OBU_REDUNDANT_FRAME_HEADER`
    RedundantFrameHeader,
    /// `OBU_TILE_LIST`
    TileList,
    /// `OBU_PADDING`
    Padding,
    /// Reserved
    Reserved(u8),
}

impl From<u8> for ObuType {
    fn from(value: u8) -> Self {
        match value {
            1 => ObuType::SequenceHeader,
            2 => ObuType::TemporalDelimiter,
            3 => ObuType::FrameHeader,
            4 => ObuType::TileGroup,
            5 => ObuType::Metadata,
            6 => ObuType::Frame,
            7 => ObuType::RedundantFrameHeader,
            8 => ObuType::TileList,
            15 => ObuType::Padding,
            _ => ObuType::Reserved(value),
        }
    }
}

impl From<ObuType> for u8 {
    fn from(value: ObuType) -> Self {
        match value {
            ObuType::SequenceHeader => 1,
            ObuType::TemporalDelimiter => 2,
            ObuType::FrameHeader => 3,
            ObuType::TileGroup => 4,
            ObuType::Metadata => 5,
            ObuType::Frame => 6,
            ObuType::RedundantFrameHeader => 7,
            ObuType::TileList => 8,
            ObuType::Padding => 15,
            ObuType::Reserved(value) => value,
        }
    }
}
