use crate::{color::ColorComponent, decomposition::FactorTriple, error::Error};

pub mod decoder;
pub mod encoder;

pub const MAGIC: [u8; 4] = *b"SVDS";
/// Magic followed by height, width and rank as u32.
pub const HEADER_SIZE: usize = 16;
pub const BYTES_PER_FACTOR: usize = 4;
/// Largest `height * width` a decoded frame may have. Reconstruction holds
/// one `f64` per pixel and channel.
pub const MAX_PIXEL_COUNT: usize = 1 << 26;

/// Size of the `U`, `s` and `Vt` block stored for one channel.
pub fn channel_block_size(height: usize, width: usize, rank: usize) -> usize {
    BYTES_PER_FACTOR * rank * (height + width + 1)
}

/// Three channel factorizations sharing one rank.
#[derive(Clone, Debug, PartialEq)]
pub struct CompressedFrame {
    height: usize,
    width: usize,
    rank: usize,
    channels: [FactorTriple; 3],
}

impl CompressedFrame {
    pub fn new(
        height: usize,
        width: usize,
        rank: usize,
        channels: [FactorTriple; 3],
    ) -> crate::Result<Self> {
        if rank == 0 || rank > height.min(width) {
            return Err(Error::InvalidRank {
                rank,
                height,
                width,
            });
        }
        for (component, triple) in ColorComponent::ALL.iter().zip(&channels) {
            if triple.height() != height || triple.width() != width || triple.rank() != rank {
                return Err(Error::FactorShapeMismatch(component.name()));
            }
        }
        Ok(Self {
            height,
            width,
            rank,
            channels,
        })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn channel(&self, component: ColorComponent) -> &FactorTriple {
        match component {
            ColorComponent::Red => &self.channels[0],
            ColorComponent::Green => &self.channels[1],
            ColorComponent::Blue => &self.channels[2],
        }
    }

    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + ColorComponent::ALL.len() * channel_block_size(self.height, self.width, self.rank)
    }
}
