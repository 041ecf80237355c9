// Commandline argument parser using clap for pinpoint

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::measurement::Id;

/// Track a UWB tag from serial telemetry.
#[derive(Debug, Parser, Clone)]
#[clap(version, about)]
pub struct PinpointArgs {
    /// Where the telemetry comes from, a serial device or the simulator
    #[command(subcommand)]
    pub command: SourceCommand,

    /// Path to a RON session config file; flags below override its values
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Room width in meters
    #[arg(long = "room-width")]
    pub room_width: Option<f64>,

    /// Room height in meters
    #[arg(long = "room-height")]
    pub room_height: Option<f64>,

    /// The three measured anchor distances d01 d02 d12, in meters
    #[arg(short = 'd', long = "distances", num_args = 3)]
    pub distances: Option<Vec<f64>>,

    /// Id of the auxiliary anchor to give proximity feedback for
    #[arg(long = "aux")]
    pub aux_anchor: Option<Id>,

    /// How often to poll for fixes, per second
    #[arg(short = 'u', long = "update")]
    pub update_hz: Option<f32>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum SourceCommand {
    /// Read telemetry from a UWB radio on a serial port
    #[command(about)]
    Serial(SerialCommand),

    /// Generate telemetry with the built-in simulator
    #[command(about)]
    Simulate(SimulateCommand),
}

#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct SerialCommand {
    /// Device path, e.g. /dev/ttyACM0; a picker is shown when omitted
    #[arg(short = 'p', long = "port")]
    pub port: Option<PathBuf>,

    /// Baud rate of the link
    #[arg(short = 'b', long = "baud", default_value_t = 115_200)]
    pub baud: u32,
}

#[derive(Debug, Args, Clone)]
#[command(version, about)]
pub struct SimulateCommand {
    /// Range noise amplitude, in meters
    #[arg(short = 'n', long = "noise", default_value_t = 0.01)]
    pub noise: f64,

    /// How long to run, in seconds; forever when omitted
    #[arg(short = 't', long = "seconds")]
    pub seconds: Option<u64>,
}
