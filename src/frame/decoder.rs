use std::io::{self, ErrorKind, Read};

use nalgebra::{DMatrix, DVector};

use super::{
    channel_block_size, CompressedFrame, BYTES_PER_FACTOR, HEADER_SIZE, MAGIC, MAX_PIXEL_COUNT,
};
use crate::{color::ColorComponent, decomposition::FactorTriple, error::Error, logger, Result};

struct FrameHeader {
    height: usize,
    width: usize,
    rank: usize,
}

/// Reads a [`CompressedFrame`]. Nothing is returned unless the whole frame
/// is valid.
pub struct FrameDecoder<R> {
    reader: R,
}

impl<R: Read> FrameDecoder<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    pub fn decode(mut self) -> Result<CompressedFrame> {
        self.read_magic()?;
        let header = self.read_header()?;
        let red = self.read_channel(&header, ColorComponent::Red)?;
        let green = self.read_channel(&header, ColorComponent::Green)?;
        let blue = self.read_channel(&header, ColorComponent::Blue)?;
        self.check_end_of_frame()?;
        CompressedFrame::new(
            header.height,
            header.width,
            header.rank,
            [red, green, blue],
        )
    }

    fn read_section(&mut self, buffer: &mut [u8], section: &'static str) -> Result<()> {
        self.reader.read_exact(buffer).map_err(|e| {
            if e.kind() == ErrorKind::UnexpectedEof {
                Error::TruncatedFrame(section)
            } else {
                Error::FailedToReadFrame(e)
            }
        })
    }

    fn read_magic(&mut self) -> Result<()> {
        let mut magic = [0; MAGIC.len()];
        self.read_section(&mut magic, "magic")?;
        if magic != MAGIC {
            return Err(Error::InvalidMagic(magic));
        }
        Ok(())
    }

    fn read_header(&mut self) -> Result<FrameHeader> {
        let mut header = [0; HEADER_SIZE - MAGIC.len()];
        self.read_section(&mut header, "header")?;
        logger::log_frame_header(&MAGIC, &header);
        let field = |index: usize| {
            let offset = index * 4;
            u32::from_le_bytes([
                header[offset],
                header[offset + 1],
                header[offset + 2],
                header[offset + 3],
            ]) as usize
        };
        let (height, width, rank) = (field(0), field(1), field(2));
        if rank == 0 || rank > height.min(width) {
            return Err(Error::InvalidRank {
                rank,
                height,
                width,
            });
        }
        match height.checked_mul(width) {
            Some(pixels) if pixels <= MAX_PIXEL_COUNT => {}
            _ => return Err(Error::DimensionsExceedFormat(width, height)),
        }
        log::info!(
            "Decoding {}x{} frame with rank {}",
            width,
            height,
            rank
        );
        Ok(FrameHeader {
            height,
            width,
            rank,
        })
    }

    /// Reads one channel block without trusting the header for the
    /// allocation size.
    fn read_block(&mut self, header: &FrameHeader, component: ColorComponent) -> Result<Vec<u8>> {
        let truncated = || Error::TruncatedFrame(component.name());
        // a block whose size overflows cannot be present in the input
        let length = header
            .height
            .checked_add(header.width)
            .and_then(|sum| sum.checked_add(1))
            .and_then(|sum| sum.checked_mul(header.rank))
            .and_then(|count| count.checked_mul(BYTES_PER_FACTOR))
            .ok_or_else(truncated)?;
        debug_assert_eq!(
            length,
            channel_block_size(header.height, header.width, header.rank)
        );
        let mut block = Vec::new();
        (&mut self.reader)
            .take(length as u64)
            .read_to_end(&mut block)
            .map_err(Error::FailedToReadFrame)?;
        if block.len() < length {
            return Err(truncated());
        }
        Ok(block)
    }

    fn read_channel(
        &mut self,
        header: &FrameHeader,
        component: ColorComponent,
    ) -> Result<FactorTriple> {
        let FrameHeader {
            height,
            width,
            rank,
        } = *header;
        let block = self.read_block(header, component)?;
        let values: Vec<f32> = block
            .chunks_exact(BYTES_PER_FACTOR)
            .map(|bytes| f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            .collect();
        if values.iter().any(|value| !value.is_finite()) {
            return Err(Error::NonFiniteFactor(component.name()));
        }
        let (u, rest) = values.split_at(height * rank);
        let (s, vt) = rest.split_at(rank);
        Ok(FactorTriple::new(
            DMatrix::from_row_slice(height, rank, u),
            DVector::from_row_slice(s),
            DMatrix::from_row_slice(rank, width, vt),
        ))
    }

    fn check_end_of_frame(&mut self) -> Result<()> {
        let trailing = io::copy(&mut self.reader, &mut io::sink()).map_err(Error::FailedToReadFrame)?;
        if trailing > 0 {
            return Err(Error::TrailingFrameBytes(trailing));
        }
        Ok(())
    }
}
