use std::time::Duration;

pub const DEFAULT_BAUD: u32 = 500_000;

/// Timing of the request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// How long a single read waits for bytes to arrive.
    pub poll_interval_ms: u64,

    /// Pause between writing a request and the first read, a little longer than the poll
    /// interval.
    pub settle_delay_ms: u64,

    /// Backoff after an attempt produced no usable reply.
    pub retry_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5,
            settle_delay_ms:  6,
            retry_timeout_ms: 50,
        }
    }
}

impl TransportConfig {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    #[inline]
    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyAMA0".to_owned(),
            baud: DEFAULT_BAUD,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub serial:    SerialConfig,
    pub transport: TransportConfig,
}
