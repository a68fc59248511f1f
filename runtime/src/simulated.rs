//! Board-side emulation of the protocol, for tests and for running the console without hardware.

use bytes::Bytes;
use fnv::FnvHashMap;
use futures::StreamExt;
use tokio::io::{
    AsyncRead,
    AsyncWrite,
    AsyncWriteExt,
};
use codec::{
    tokio_codec::FramedRead,
    Direction,
    FrameCodec,
};
use message::{
    Message,
    MotorCommands,
    Packet,
    SensorTypes,
    Tag,
    UnitAddress,
    Values,
};

use crate::Error;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitState {
    pub sensors:    SensorTypes,
    pub motors:     MotorCommands,
    pub readings:   Values,
    pub timeout_ms: Option<u32>,
    pub stopped:    bool,
}

/// A board hosting any number of units, answering packets the way the firmware does.
///
/// Packets for addresses without a unit go unanswered.
#[derive(Debug, Clone, Default)]
pub struct SimulatedBoard {
    units:        FnvHashMap<UnitAddress, UnitState>,
    drop_next:    usize,
    corrupt_next: usize,
}

impl SimulatedBoard {
    pub fn new(units: impl IntoIterator<Item = UnitAddress>) -> Self {
        Self {
            units: units.into_iter().map(|unit| (unit, UnitState::default())).collect(),
            ..Default::default()
        }
    }

    #[inline]
    pub fn unit(&self, unit: UnitAddress) -> Option<&UnitState> {
        self.units.get(&unit)
    }

    /// Readings reported in the next value replies from `unit`.
    pub fn set_readings(&mut self, unit: UnitAddress, readings: Values) -> bool {
        match self.units.get_mut(&unit) {
            Some(state) => {
                state.readings = readings;
                true
            },
            None => false,
        }
    }

    /// Ignore the next `n` packets entirely.
    #[inline]
    pub fn drop_next(&mut self, n: usize) {
        self.drop_next = n;
    }

    /// Damage the checksum of the next `n` replies.
    #[inline]
    pub fn corrupt_next(&mut self, n: usize) {
        self.corrupt_next = n;
    }

    /// Apply a command and produce the unit's reply, if it answers at all.
    pub fn respond(&mut self, packet: &Packet) -> Result<Option<Message>, Error> {
        if let Message::AddressChange {
            address,
        } = packet.message
        {
            return Ok(self.units.remove(&packet.address).map(|state| {
                self.units.insert(address, state);

                Message::Ack {
                    tag:    Tag::AddressChange.byte(),
                    origin: UnitAddress::BROADCAST,
                }
            }));
        }

        let Some(state) = self.units.get_mut(&packet.address) else {
            tracing::trace!(address = %packet.address, "no unit at address");
            return Ok(None);
        };

        let ack = |tag: Tag| {
            Some(Message::Ack {
                tag:    tag.byte(),
                origin: UnitAddress::BROADCAST,
            })
        };

        let reply = match &packet.message {
            Message::EmergencyStop => {
                state.motors = MotorCommands::default();
                state.stopped = true;

                ack(Tag::EmergencyStop)
            },
            Message::SensorTypes(types) => {
                state.sensors = *types;

                ack(Tag::SensorTypes)
            },
            Message::Timeout {
                millis,
            } => {
                state.timeout_ms = Some(*millis);

                ack(Tag::Timeout)
            },
            Message::Values(motors) => {
                state.motors = *motors;
                state.stopped = false;

                let payload = state.readings.encode(state.sensors)?;

                Some(Message::AckValues {
                    origin:  UnitAddress::BROADCAST,
                    payload: Bytes::from(payload),
                })
            },
            reply => {
                tracing::debug!(%reply, "ignoring board-originated message");
                None
            },
        };

        Ok(reply)
    }

    /// Handle one raw host packet, returning the encoded reply.
    pub fn handle_frame(&mut self, frame: &[u8]) -> Option<Bytes> {
        if self.drop_next > 0 {
            self.drop_next -= 1;
            tracing::debug!(frame = %hex::encode(frame), "dropping packet");

            return None;
        }

        let result = Packet::decode(frame, Direction::ToBoard)
            .map_err(Error::from)
            .and_then(|packet| {
                tracing::trace!(%packet, "received");
                self.respond(&packet)
            });

        let reply = match result {
            Ok(reply) => reply?,
            Err(e) => {
                tracing::warn!(error = %e, frame = %hex::encode(frame), "rejecting packet");
                return None;
            },
        };

        let encoded = match Packet::new(UnitAddress::BROADCAST, reply).encode(Direction::FromBoard) {
            Ok(encoded) => encoded,
            Err(e) => {
                tracing::warn!(error = %e, "unable to encode reply");
                return None;
            },
        };

        if self.corrupt_next > 0 {
            self.corrupt_next -= 1;

            let mut corrupted = encoded.to_vec();
            corrupted[0] = corrupted[0].wrapping_add(1);

            return Some(Bytes::from(corrupted));
        }

        Some(encoded)
    }
}

/// Answer host packets arriving on `io` until it closes.
#[tracing::instrument(skip_all)]
pub async fn serve<T>(io: T, board: &mut SimulatedBoard) -> Result<(), Error>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let (rx, mut tx) = tokio::io::split(io);
    let mut frames = FramedRead::new(rx, FrameCodec::new(Direction::ToBoard));

    while let Some(frame) = frames.next().await {
        let frame = frame?;

        if let Some(reply) = board.handle_frame(&frame) {
            tx.write_all(&reply).await?;
            tx.flush().await?;
        }
    }

    tracing::debug!("host disconnected");
    Ok(())
}
