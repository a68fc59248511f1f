use std::{
    future::Future,
    time::Duration,
};

use structopt::StructOpt;

use brickwire::{
    trace_catch,
    Options,
};
use message::{
    MotorCommand,
    MotorCommands,
    SensorType,
    SensorTypes,
    UnitAddress,
};
use runtime::{
    Board,
    SerialChannel,
    Transport,
    Worker,
};

/// Drive a motor/sensor board over its serial link.
#[derive(Debug, StructOpt)]
#[structopt(name = "brickwire")]
struct Args {
    #[structopt(flatten)]
    options: Options,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Stop all motors on a unit.
    Estop {
        #[structopt(short, long, default_value = "1")]
        unit: u8,
    },

    /// Reassign a unit's address.
    Address {
        #[structopt(short, long, default_value = "1")]
        unit: u8,

        address: u8,
    },

    /// Stop the motors if no command arrives within the timeout.
    Timeout {
        #[structopt(short, long, default_value = "1")]
        unit: u8,

        millis: u64,
    },

    /// Declare the sensors attached to a unit.
    Sensors {
        #[structopt(short, long, default_value = "1")]
        unit: u8,

        sensor0: SensorType,
        sensor1: SensorType,
    },

    /// Repeatedly push motor commands and print the readings until interrupted.
    Drive(Drive),
}

#[derive(Debug, StructOpt)]
struct Drive {
    #[structopt(short, long, default_value = "1")]
    unit: u8,

    #[structopt(long, allow_hyphen_values = true)]
    motor0: Option<i32>,

    #[structopt(long, allow_hyphen_values = true)]
    motor1: Option<i32>,

    #[structopt(long, default_value = "raw")]
    sensor0: SensorType,

    #[structopt(long, default_value = "raw")]
    sensor1: SensorType,

    #[structopt(long, default_value = "100")]
    period_ms: u64,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let Args {
        options,
        command,
    } = Args::from_args();

    brickwire::trace::init(options.pretty);

    let config = options.load()?;
    let channel = SerialChannel::open(&config.serial)?;
    let (handle, worker) = Worker::spawn(Transport::new(channel, config.transport), 8);
    let mut board = Board::new(handle);

    run(&mut board, command).await?;

    drop(board);
    worker.await?;

    Ok(())
}

#[tracing::instrument(skip(board), err(Display))]
async fn run(board: &mut Board, command: Command) -> eyre::Result<()> {
    match command {
        Command::Estop {
            unit,
        } => until_interrupted(board.emergency_stop(UnitAddress(unit))).await,
        Command::Address {
            unit,
            address,
        } => until_interrupted(board.change_address(UnitAddress(unit), UnitAddress(address))).await,
        Command::Timeout {
            unit,
            millis,
        } => until_interrupted(board.set_timeout(UnitAddress(unit), Duration::from_millis(millis))).await,
        Command::Sensors {
            unit,
            sensor0,
            sensor1,
        } => until_interrupted(board.declare_sensors(UnitAddress(unit), SensorTypes([sensor0, sensor1]))).await,
        Command::Drive(args) => drive(board, args).await,
    }
}

/// Wait for a single acknowledged command, giving up on ctrl-c.
async fn until_interrupted(command: impl Future<Output = Result<(), runtime::Error>>) -> eyre::Result<()> {
    tokio::select! {
        result = command => {
            result?;
            tracing::info!("acknowledged");
        },
        _ = tokio::signal::ctrl_c() => tracing::warn!("interrupted before the board replied"),
    }

    Ok(())
}

async fn drive(board: &mut Board, args: Drive) -> eyre::Result<()> {
    let Drive {
        unit,
        motor0,
        motor1,
        sensor0,
        sensor1,
        period_ms,
    } = args;

    let unit = UnitAddress(unit);
    let motors = MotorCommands::new(
        motor0.map(MotorCommand::checked).transpose()?,
        motor1.map(MotorCommand::checked).transpose()?,
    );

    board.declare_sensors(unit, SensorTypes([sensor0, sensor1])).await?;

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);

    let mut interval = tokio::time::interval(Duration::from_millis(period_ms));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        let result = tokio::select! {
            _ = &mut interrupted => break,
            result = async {
                interval.tick().await;
                board.exchange_values(unit, motors).await
            } => result,
        };

        trace_catch!(result, %unit, "exchanging values");

        if let Ok(values) = result {
            println!("{}", serde_json::to_string(&values)?);
        }
    }

    tracing::info!(%unit, "interrupted, stopping motors");
    board.emergency_stop(unit).await?;

    Ok(())
}
