mod board;
mod channel;
mod config;
pub mod simulated;
mod transport;
mod worker;

pub use board::Board;
pub use channel::{
    Channel,
    SerialChannel,
    StreamChannel,
};
pub use config::{
    Config,
    SerialConfig,
    TransportConfig,
    DEFAULT_BAUD,
};
pub use simulated::SimulatedBoard;
pub use transport::{
    State,
    Transport,
};
pub use worker::{
    Handle,
    Worker,
};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Frame(#[from] codec::Error),

    #[error(transparent)]
    Message(#[from] message::Error),

    #[error("transport worker stopped")]
    WorkerGone,

    #[error("unexpected reply: {0}")]
    UnexpectedReply(message::Message),
}
