use message::UnitAddress;
use runtime::{
    simulated,
    SimulatedBoard,
};
use structopt::StructOpt;
use tokio_serial::SerialStream;

mod options;

pub use options::Options;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let opts = Options::from_args();
    brickwire::trace::init(opts.pretty);

    let mut board = SimulatedBoard::new(opts.units.iter().copied().map(UnitAddress));
    board.drop_next(opts.drop);
    board.corrupt_next(opts.corrupt);

    let builder = tokio_serial::new(&opts.serial_port, opts.baud);
    let stream = SerialStream::open(&builder)?;
    tracing::info!(port = %opts.serial_port, units = ?opts.units, "serving simulated board");

    tokio::select! {
        result = simulated::serve(stream, &mut board) => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted"),
    }

    Ok(())
}
