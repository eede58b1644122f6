//! Two channel oscilloscope simulator
//!
//! Channel 1 sees a 1 kHz, 1 V sine and channel 2 a 1 kHz, 0.5 V square wave.
//! `!TRG` acquires one record per channel; `?DAT ch` returns the last record
//! as an IEEE 488.2 block of 8-bit ADC codes (128 is 0 V, 32 codes per
//! vertical division).

use std::f64::consts::TAU;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::SimulatorConfig;
use crate::error::CommandError;
use crate::instrument::{check_range, parse_channel, rng_from_seed, Instrument};
use crate::protocol::{Command, CommandKind, Reply};

const CHANNELS: usize = 2;

/// Samples per acquisition
pub const POINTS: usize = 1000;

const HORIZONTAL_DIVISIONS: f64 = 10.0;
const CODES_PER_DIVISION: f64 = 32.0;
const SIGNAL_FREQUENCY: f64 = 1e3;
const NOISE_VOLTS: f64 = 0.01;

/// Simulated oscilloscope
#[derive(Debug, Clone)]
pub struct Oscilloscope {
    time_per_division: f64,
    volts_per_division: [f64; CHANNELS],
    records: [Vec<u8>; CHANNELS],
    rng: ChaCha8Rng,
}

impl Oscilloscope {
    /// Create an oscilloscope at 1 ms/div and 1 V/div with no acquisition
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            time_per_division: 1e-3,
            volts_per_division: [1.0; CHANNELS],
            records: Default::default(),
            rng,
        }
    }

    fn signal(channel: usize, t: f64) -> f64 {
        let phase = TAU * SIGNAL_FREQUENCY * t;
        match channel {
            0 => phase.sin(),
            _ => {
                if phase.sin() >= 0.0 {
                    0.5
                } else {
                    -0.5
                }
            }
        }
    }

    fn acquire(&mut self) {
        let window = self.time_per_division * HORIZONTAL_DIVISIONS;
        let start: f64 = self.rng.gen_range(0.0..1.0 / SIGNAL_FREQUENCY);

        for channel in 0..CHANNELS {
            let scale = CODES_PER_DIVISION / self.volts_per_division[channel];
            let record = (0..POINTS)
                .map(|i| {
                    let t = start + window * i as f64 / POINTS as f64;
                    let noise = self.rng.gen_range(-NOISE_VOLTS..=NOISE_VOLTS);
                    let volts = Self::signal(channel, t) + noise;
                    (128.0 + volts * scale).round().clamp(0.0, 255.0) as u8
                })
                .collect();
            self.records[channel] = record;
        }
        debug!(points = POINTS, "Acquired records");
    }
}

impl Instrument for Oscilloscope {
    fn name(&self) -> &'static str {
        "osci"
    }

    fn idn(&self) -> &'static str {
        "Oscilloscope Serial #24680"
    }

    fn handle(&mut self, command: &Command) -> Result<Reply, CommandError> {
        use CommandKind::{Query, Set};

        match (command.kind, command.mnemonic.as_str()) {
            (Query, "TDV") => {
                command.expect_args(0)?;
                Ok(Reply::number(self.time_per_division))
            }
            (Set, "TDV") => {
                command.expect_args(1)?;
                self.time_per_division =
                    check_range("time per division", command.arg(0)?, 1e-9, 10.0)?;
                Ok(Reply::Ok)
            }
            (Query, "VDV") => {
                command.expect_args(1)?;
                let channel = parse_channel(command, 0, 1, CHANNELS)?;
                Ok(Reply::number(self.volts_per_division[channel]))
            }
            (Set, "VDV") => {
                command.expect_args(2)?;
                let channel = parse_channel(command, 0, 1, CHANNELS)?;
                self.volts_per_division[channel] =
                    check_range("volts per division", command.arg(1)?, 1e-3, 10.0)?;
                Ok(Reply::Ok)
            }
            (Query, "NPT") => {
                command.expect_args(0)?;
                Ok(Reply::Value(POINTS.to_string()))
            }
            (Set, "TRG") => {
                command.expect_args(0)?;
                self.acquire();
                Ok(Reply::Ok)
            }
            (Query, "DAT") => {
                command.expect_args(1)?;
                let channel = parse_channel(command, 0, 1, CHANNELS)?;
                Ok(Reply::Block(self.records[channel].clone()))
            }
            _ => Err(CommandError::Unknown(command.to_string())),
        }
    }
}

/// Handler entry point: serve an oscilloscope until Ctrl-C
pub fn main(args: Vec<String>) -> anyhow::Result<()> {
    crate::launch::launch("osci", args, |config: &SimulatorConfig| {
        Oscilloscope::new(rng_from_seed(config.seed))
    })
}
