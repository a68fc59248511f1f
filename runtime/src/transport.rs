use message::{
    Direction,
    Message,
    Packet,
    UnitAddress,
};

use crate::{
    Channel,
    Error,
    TransportConfig,
};

/// Byte count the board firmware sometimes reports in place of 10.
const FIRMWARE_BAD_COUNT: u8 = 104;
const FIRMWARE_FIXED_COUNT: u8 = 10;

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, derive_more::Display)]
pub enum State {
    Idle,
    Sending,
    AwaitingResponse,
    Retrying,
}

/// Synchronous request/response over a [`Channel`], retrying until a valid reply arrives.
///
/// An exchange never gives up on its own: silence, truncated frames and frames that fail
/// validation all lead to the request being sent again after the retry timeout. Callers that
/// need an overall deadline wrap [`Transport::exchange`] in one.
pub struct Transport<C> {
    channel: C,
    config:  TransportConfig,
    state:   State,
}

impl<C> Transport<C>
where
    C: Channel,
{
    pub fn new(channel: C, config: TransportConfig) -> Self {
        Self {
            channel,
            config,
            state: State::Idle,
        }
    }

    #[inline]
    pub fn state(&self) -> State {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    #[inline]
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Return to [`State::Idle`] after an exchange future was dropped before completing.
    pub fn reset(&mut self) {
        if self.state != State::Idle {
            tracing::debug!(state = %self.state, "exchange cancelled");
        }

        self.state = State::Idle;
    }

    #[inline]
    pub fn into_inner(self) -> C {
        self.channel
    }

    /// Send `message` to `unit` and wait for its reply. The returned packet is addressed to the
    /// replying unit and its message is attributed to it.
    #[tracing::instrument(skip_all, fields(%unit, %message))]
    pub async fn exchange(&mut self, unit: UnitAddress, message: &Message) -> Result<Packet, Error> {
        let result = self.exchange_inner(unit, message).await;
        self.state = State::Idle;

        result
    }

    async fn exchange_inner(&mut self, unit: UnitAddress, message: &Message) -> Result<Packet, Error> {
        let request = Packet::new(unit, message.clone()).encode(Direction::ToBoard)?;
        let mut attempt = 0usize;

        loop {
            attempt += 1;

            self.state = State::Sending;
            self.channel.clear_input().await?;
            self.channel.write_all(&request).await?;
            tracing::trace!(attempt, request = %hex::encode(&request), "wrote request");

            self.state = State::AwaitingResponse;
            tokio::time::sleep(self.config.settle_delay()).await;

            match self.read_frame().await? {
                Some(frame) => match Packet::decode(&frame, Direction::FromBoard) {
                    Ok(reply) => {
                        let reply = reply.message.with_origin(unit);
                        tracing::debug!(attempt, %reply, "exchange complete");

                        return Ok(Packet::new(unit, reply));
                    },
                    Err(e) if e.is_frame_invalid() => {
                        tracing::warn!(attempt, error = %e, frame = %hex::encode(&frame), "discarding invalid reply");
                    },
                    Err(e) => return Err(e.into()),
                },
                None => tracing::debug!(attempt, "no reply"),
            }

            self.state = State::Retrying;

            tokio::time::sleep(self.config.retry_timeout()).await;
        }
    }

    /// One read attempt: checksum byte, byte count, then the counted bytes. Any shortfall yields
    /// `None` and the partial frame is dropped.
    async fn read_frame(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let wait = self.config.poll_interval();
        let mut header = [0u8; 2];

        if !self.channel.read_within(&mut header[..1], wait).await? {
            return Ok(None);
        }

        if !self.channel.read_within(&mut header[1..], wait).await? {
            tracing::debug!("checksum byte without byte count");
            return Ok(None);
        }

        let byte_count = match header[1] {
            FIRMWARE_BAD_COUNT => FIRMWARE_FIXED_COUNT,
            count => count,
        };

        // the firmware's count is signed
        if byte_count > i8::MAX as u8 {
            tracing::debug!(byte_count, "corrupted byte count");
            return Ok(None);
        }

        let mut frame = vec![0u8; 2 + byte_count as usize];
        frame[0] = header[0];
        frame[1] = byte_count;

        if !self.channel.read_within(&mut frame[2..], wait).await? {
            tracing::debug!(byte_count, "reply shorter than its byte count");
            return Ok(None);
        }

        Ok(Some(frame))
    }
}
