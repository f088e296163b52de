use std::io::Write;

use nalgebra::DMatrix;

use super::{channel_block_size, CompressedFrame, MAGIC};
use crate::{color::ColorComponent, error::Error, logger, Result};

pub struct FrameEncoder<'a, T> {
    writer: &'a mut T,
    frame: &'a CompressedFrame,
}

impl<'a, T: Write> FrameEncoder<'a, T> {
    pub fn new(writer: &'a mut T, frame: &'a CompressedFrame) -> FrameEncoder<'a, T> {
        FrameEncoder { writer, frame }
    }

    pub fn encode(&mut self) -> Result<()> {
        self.write_magic()?;
        self.write_header()?;
        self.write_all_channels()?;
        self.writer.flush().map_err(Error::FailedToWriteFrame)
    }

    fn write_magic(&mut self) -> Result<()> {
        self.writer
            .write_all(&MAGIC)
            .map_err(Error::FailedToWriteFrame)
    }

    fn header_field(&self, value: usize) -> Result<[u8; 4]> {
        u32::try_from(value)
            .map(u32::to_le_bytes)
            .map_err(|_| Error::DimensionsExceedFormat(self.frame.width(), self.frame.height()))
    }

    fn write_header(&mut self) -> Result<()> {
        let mut header = Vec::with_capacity(12);
        header.extend(self.header_field(self.frame.height())?);
        header.extend(self.header_field(self.frame.width())?);
        header.extend(self.header_field(self.frame.rank())?);
        logger::log_frame_header(&MAGIC, &header);
        self.writer
            .write_all(&header)
            .map_err(Error::FailedToWriteFrame)
    }

    fn write_all_channels(&mut self) -> Result<()> {
        for component in ColorComponent::ALL {
            self.write_channel(component)?;
        }
        Ok(())
    }

    fn extend_row_major(block: &mut Vec<u8>, matrix: &DMatrix<f32>) {
        for row in matrix.row_iter() {
            for value in row.iter() {
                block.extend(value.to_le_bytes());
            }
        }
    }

    fn write_channel(&mut self, component: ColorComponent) -> Result<()> {
        let triple = self.frame.channel(component);
        let block_size =
            channel_block_size(self.frame.height(), self.frame.width(), self.frame.rank());
        let mut block = Vec::with_capacity(block_size);
        Self::extend_row_major(&mut block, triple.u());
        for value in triple.singular_values().iter() {
            block.extend(value.to_le_bytes());
        }
        Self::extend_row_major(&mut block, triple.vt());
        log::debug!("Writing {} bytes of {} channel factors", block.len(), component);
        self.writer
            .write_all(&block)
            .map_err(Error::FailedToWriteFrame)
    }
}
