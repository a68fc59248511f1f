use std::time::Duration;

use message::{
    Message,
    MotorCommands,
    SensorTable,
    SensorTypes,
    Tag,
    UnitAddress,
    Values,
};

use crate::{
    Error,
    Handle,
};

/// Typed client for the board's command set.
///
/// Tracks the sensor types declared to each unit so value replies can be decoded.
#[derive(Debug, Clone)]
pub struct Board {
    handle:  Handle,
    sensors: SensorTable,
}

impl Board {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            sensors: SensorTable::new(),
        }
    }

    #[inline]
    pub fn sensors(&self) -> &SensorTable {
        &self.sensors
    }

    /// Move `unit` to `address`. Sensor types declared to the old address follow it.
    pub async fn change_address(&mut self, unit: UnitAddress, address: UnitAddress) -> Result<(), Error> {
        self.command(unit, Message::AddressChange {
            address,
        })
        .await?;

        self.sensors.readdress(unit, address);
        Ok(())
    }

    pub async fn emergency_stop(&mut self, unit: UnitAddress) -> Result<(), Error> {
        self.command(unit, Message::EmergencyStop).await
    }

    pub async fn declare_sensors(&mut self, unit: UnitAddress, types: SensorTypes) -> Result<(), Error> {
        self.command(unit, Message::SensorTypes(types)).await?;

        if let Some(previous) = self.sensors.record(unit, types) {
            tracing::debug!(%unit, ?previous, current = ?types, "sensor types replaced");
        }

        Ok(())
    }

    /// Have `unit` stop its motors when no command arrives within `timeout`.
    pub async fn set_timeout(&mut self, unit: UnitAddress, timeout: Duration) -> Result<(), Error> {
        let millis = u32::try_from(timeout.as_millis()).map_err(|_| message::Error::OutOfRange {
            what:  "timeout millis",
            value: i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX),
        })?;

        self.command(unit, Message::Timeout {
            millis,
        })
        .await
    }

    /// Push motor commands and read back encoder and sensor values.
    pub async fn exchange_values(&mut self, unit: UnitAddress, motors: MotorCommands) -> Result<Values, Error> {
        let reply = self.handle.exchange(unit, Message::Values(motors)).await?;

        match reply.message.values(&self.sensors)? {
            Some(values) => Ok(values),
            None => Err(Error::UnexpectedReply(reply.message)),
        }
    }

    async fn command(&mut self, unit: UnitAddress, message: Message) -> Result<(), Error> {
        let expected = message.tag();
        let reply = self.handle.exchange(unit, message).await?;

        match reply.message {
            Message::Ack {
                tag, ..
            } if tag == expected => {},
            other @ Message::Ack {
                ..
            } => {
                tracing::warn!(%unit, expected, reply = %other, "ack for a different command");
                return Err(Error::UnexpectedReply(other));
            },
            // the firmware answers some commands with fresh values
            Message::AckValues {
                ..
            } if expected != Tag::Values.byte() => tracing::debug!(%unit, expected, "values in place of ack"),
            other => return Err(Error::UnexpectedReply(other)),
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;
    use message::{
        MotorCommand,
        SensorType,
    };

    use super::*;
    use crate::{
        transport::test::{
            reply,
            Scripted,
        },
        Transport,
        TransportConfig,
        Worker,
    };

    const UNIT: UnitAddress = UnitAddress(1);

    fn ack(tag: Tag) -> Vec<u8> {
        reply(Message::Ack {
            tag:    tag.byte(),
            origin: UnitAddress::BROADCAST,
        })
    }

    fn board(script: impl IntoIterator<Item = Vec<u8>>) -> Board {
        let transport = Transport::new(Scripted::new(script), TransportConfig::default());
        let (handle, _task) = Worker::spawn(transport, 1);

        Board::new(handle)
    }

    #[tokio::test(start_paused = true)]
    async fn values_follow_declared_types() -> eyre::Result<()> {
        let values = reply(Message::AckValues {
            origin:  UnitAddress::BROADCAST,
            payload: Bytes::from_static(&[0x03, 0x34, 0x0a]),
        });
        let mut board = board([ack(Tag::SensorTypes), values]);

        let types = SensorTypes([SensorType::Touch, SensorType::UltrasonicContinuous]);
        board.declare_sensors(UNIT, types).await?;
        assert_eq!(board.sensors().get(UNIT), types);

        let values = board
            .exchange_values(UNIT, MotorCommands::new(Some(MotorCommand(100)), None))
            .await?;

        assert_eq!(values, Values {
            encoders: [5, 0],
            sensors:  [1, 20],
        });

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn readdress_moves_sensor_types() -> eyre::Result<()> {
        let mut board = board([ack(Tag::SensorTypes), ack(Tag::AddressChange)]);
        let types = SensorTypes([SensorType::RcxLight, SensorType::Touch]);

        board.declare_sensors(UNIT, types).await?;
        board.change_address(UNIT, UnitAddress(7)).await?;

        assert_eq!(board.sensors().get(UnitAddress(7)), types);
        assert_eq!(board.sensors().get(UNIT), SensorTypes::default());

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn plain_ack_for_values_is_unexpected() {
        let mut board = board([ack(Tag::Values)]);

        let result = board.exchange_values(UNIT, MotorCommands::default()).await;
        assert!(matches!(result, Err(Error::UnexpectedReply(Message::Ack { tag: 3, .. }))));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_range() -> eyre::Result<()> {
        let mut board = board([ack(Tag::Timeout)]);

        board.set_timeout(UNIT, Duration::from_millis(250)).await?;

        let result = board.set_timeout(UNIT, Duration::from_secs(u64::from(u32::MAX))).await;
        assert!(matches!(result, Err(Error::Message(message::Error::OutOfRange { .. }))));

        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn mismatched_ack_is_rejected() {
        let mut board = board([ack(Tag::Timeout)]);

        let result = board.emergency_stop(UNIT).await;
        assert!(matches!(result, Err(Error::UnexpectedReply(Message::Ack { tag: 5, .. }))));
    }
}
