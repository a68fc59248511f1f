use std::fmt::{
    Display,
    Formatter,
};

use bytes::{
    BufMut,
    Bytes,
    BytesMut,
};

use crate::{
    checksum,
    Direction,
    Error,
    Message,
    UnitAddress,
};

/// A message together with the unit it is addressed to (host to board) or came from (board to
/// host).
///
/// Wire layout: `[address?][checksum][byte count][tag][payload..]`, where the address byte only
/// appears on host-to-board packets and the byte count covers the tag and payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    pub address: UnitAddress,
    pub message: Message,
}

impl Packet {
    #[inline]
    pub fn new(address: UnitAddress, message: Message) -> Self {
        Self {
            address,
            message,
        }
    }

    pub fn encode(&self, direction: Direction) -> Result<Bytes, Error> {
        let payload = self.message.payload()?;
        let tag = self.message.tag();

        // the count field is a single byte; oversized messages wrap
        let byte_count = (payload.len() + 1) as u8;

        let address = match direction {
            Direction::ToBoard => self.address,
            Direction::FromBoard => UnitAddress::BROADCAST,
        };

        let mut out = BytesMut::with_capacity(direction.header_len() + payload.len() + 1);

        if direction == Direction::ToBoard {
            out.put_u8(address.get());
        }

        out.put_u8(checksum::packet(address, byte_count, tag, &payload));
        out.put_u8(byte_count);
        out.put_u8(tag);
        out.extend_from_slice(&payload);

        Ok(out.freeze())
    }

    pub fn decode(raw: &[u8], direction: Direction) -> Result<Self, Error> {
        match direction {
            Direction::ToBoard => Self::decode_command(raw),
            Direction::FromBoard => Self::decode_reply(raw),
        }
    }

    fn decode_reply(raw: &[u8]) -> Result<Self, Error> {
        let [checksum, byte_count, body @ ..] = raw else {
            return Err(Error::TruncatedHeader);
        };

        let (tag, payload) = split_body(*byte_count, body)?;
        let message = Message::decode_reply(tag, payload)?;

        verify(*checksum, UnitAddress::BROADCAST, *byte_count, tag, payload)?;

        Ok(Self::new(UnitAddress::BROADCAST, message))
    }

    // The checksum is checked against the raw bytes before the payload is interpreted, so a
    // corrupted payload reports as a checksum failure rather than a payload error.
    fn decode_command(raw: &[u8]) -> Result<Self, Error> {
        let [address, checksum, byte_count, body @ ..] = raw else {
            return Err(Error::TruncatedHeader);
        };

        let address = UnitAddress(*address);
        let (tag, payload) = split_body(*byte_count, body)?;

        verify(*checksum, address, *byte_count, tag, payload)?;
        let message = Message::decode_command(tag, payload)?;

        Ok(Self::new(address, message))
    }
}

#[inline]
fn split_body(byte_count: u8, body: &[u8]) -> Result<(u8, &[u8]), Error> {
    if byte_count as usize != body.len() {
        return Err(Error::LengthMismatch {
            declared: byte_count,
            actual:   body.len(),
        });
    }

    match body {
        [tag, payload @ ..] => Ok((*tag, payload)),
        [] => Err(Error::TruncatedHeader),
    }
}

#[inline]
fn verify(received: u8, address: UnitAddress, byte_count: u8, tag: u8, payload: &[u8]) -> Result<(), Error> {
    let computed = checksum::packet(address, byte_count, tag, payload);

    if received != computed {
        tracing::debug!(received, computed, "packet checksum mismatch");

        return Err(Error::ChecksumMismatch {
            received,
            computed,
        });
    }

    Ok(())
}

impl Display for Packet {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[unit {}] {}", self.address, self.message)
    }
}
