use bytes::{
    Bytes,
    BytesMut,
};
use tokio_util::codec::{
    Decoder,
    Encoder,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Which way a packet travels over the link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Host to board: frames carry a leading unit-address byte.
    ToBoard,
    /// Board to host: no address byte.
    FromBoard,
}

impl Direction {
    /// Bytes preceding the message: `[address?][checksum][byte count]`.
    #[inline]
    pub const fn header_len(self) -> usize {
        match self {
            Direction::ToBoard => 3,
            Direction::FromBoard => 2,
        }
    }
}

/// Splits a boundary-less byte stream into frames using the byte-count field.
///
/// Encoding is a passthrough: packets already carry their own framing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameCodec {
    direction: Direction,
}

impl FrameCodec {
    #[inline]
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
        }
    }

    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl<T> Encoder<T> for FrameCodec
where
    T: AsRef<[u8]>,
{
    type Error = Error;

    fn encode(&mut self, item: T, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(item.as_ref());
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Error = Error;
    type Item = Bytes;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let header_len = self.direction.header_len();

        if src.len() < header_len {
            src.reserve(header_len - src.len());
            return Ok(None);
        }

        let total = header_len + src[header_len - 1] as usize;

        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        let frame = src.split_to(total).freeze();
        tracing::trace!(frame = %hex::encode(&frame), "split frame");

        Ok(Some(frame))
    }
}
