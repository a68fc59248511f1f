use std::{
    io,
    time::Duration,
};

use tokio::io::{
    AsyncRead,
    AsyncReadExt,
    AsyncWrite,
    AsyncWriteExt,
};
use tokio_serial::{
    ClearBuffer,
    SerialPort,
    SerialStream,
};

use crate::SerialConfig;

/// Byte-level access to the link. Only the transport touches it.
#[async_trait::async_trait]
pub trait Channel: Send {
    /// Drop any unread input.
    async fn clear_input(&mut self) -> io::Result<()>;

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;

    /// Fill `buf` if enough bytes arrive within `wait`. Returns `false` on timeout; bytes read
    /// before the timeout are lost.
    async fn read_within(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<bool>;
}

/// [`Channel`] over any async byte stream.
#[derive(Debug)]
pub struct StreamChannel<T> {
    inner: T,
}

impl<T> StreamChannel<T> {
    #[inline]
    pub fn new(inner: T) -> Self {
        Self {
            inner,
        }
    }

    #[inline]
    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait::async_trait]
impl<T> Channel for StreamChannel<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn clear_input(&mut self) -> io::Result<()> {
        let mut scratch = [0u8; 64];

        // drain whatever is immediately readable
        loop {
            match tokio::time::timeout(Duration::ZERO, self.inner.read(&mut scratch)).await {
                Ok(Ok(0)) | Err(_) => return Ok(()),
                Ok(Ok(n)) => tracing::trace!(discarded = %hex::encode(&scratch[..n]), "cleared stale input"),
                Ok(Err(e)) => return Err(e),
            }
        }
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.inner.write_all(buf).await?;
        self.inner.flush().await
    }

    async fn read_within(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<bool> {
        match tokio::time::timeout(wait, self.inner.read_exact(buf)).await {
            Ok(Ok(_)) => Ok(true),
            Ok(Err(e)) => Err(e),
            Err(_elapsed) => Ok(false),
        }
    }
}

/// [`Channel`] over a serial port, clearing input through the driver.
pub struct SerialChannel(StreamChannel<SerialStream>);

impl SerialChannel {
    #[tracing::instrument(fields(port = %config.port, baud = config.baud), skip(config), err(Display))]
    pub fn open(config: &SerialConfig) -> Result<Self, tokio_serial::Error> {
        let builder = tokio_serial::new(&config.port, config.baud);
        let stream = SerialStream::open(&builder)?;

        tracing::info!("opened serial port");

        Ok(Self(StreamChannel::new(stream)))
    }
}

#[async_trait::async_trait]
impl Channel for SerialChannel {
    async fn clear_input(&mut self) -> io::Result<()> {
        self.0.inner.clear(ClearBuffer::Input).map_err(io::Error::from)
    }

    async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.0.write_all(buf).await
    }

    async fn read_within(&mut self, buf: &mut [u8], wait: Duration) -> io::Result<bool> {
        self.0.read_within(buf, wait).await
    }
}
