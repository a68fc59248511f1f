#[derive(Debug, Clone, PartialEq, Eq, structopt::StructOpt)]
pub struct Options {
    /// Serial device to answer on, typically one end of a pty pair.
    #[structopt(short, long)]
    pub serial_port: String,

    #[structopt(short, long, default_value = "500000")]
    pub baud: u32,

    /// Unit addresses hosted by the board.
    #[structopt(long = "unit", default_value = "1")]
    pub units: Vec<u8>,

    /// Ignore this many packets at startup.
    #[structopt(long, default_value = "0")]
    pub drop: usize,

    /// Corrupt this many replies at startup.
    #[structopt(long, default_value = "0")]
    pub corrupt: usize,

    #[structopt(long)]
    pub pretty: bool,
}
