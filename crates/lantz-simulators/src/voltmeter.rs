//! Four channel voltmeter simulator
//!
//! `?AIN ch` reads analog input `ch` (0-3). `?RNG ch` / `!RNG ch r` select the
//! input range, one of 0.1, 1 or 10 volts. Readings carry uniform noise of 1%
//! of the range and saturate at the range limits.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::SimulatorConfig;
use crate::error::CommandError;
use crate::instrument::{parse_channel, rng_from_seed, Instrument};
use crate::protocol::{Command, CommandKind, Reply};

const CHANNELS: usize = 4;

/// Selectable input ranges in volts
pub const RANGES: [f64; 3] = [0.1, 1.0, 10.0];

/// Voltage present at each input
pub const NOMINAL_INPUTS: [f64; CHANNELS] = [0.0, 0.5, 2.5, -1.25];

const NOISE_FRACTION: f64 = 0.01;

/// Simulated voltmeter
#[derive(Debug, Clone)]
pub struct Voltmeter {
    ranges: [f64; CHANNELS],
    rng: ChaCha8Rng,
}

impl Voltmeter {
    /// Create a voltmeter with every channel on the 10 V range
    pub fn new(rng: ChaCha8Rng) -> Self {
        Self {
            ranges: [10.0; CHANNELS],
            rng,
        }
    }

    fn read(&mut self, channel: usize) -> f64 {
        let range = self.ranges[channel];
        let noise = self.rng.gen_range(-1.0..=1.0) * NOISE_FRACTION * range;
        let reading = (NOMINAL_INPUTS[channel] + noise).clamp(-range, range);
        // Six decimals, like a 6½ digit meter
        (reading * 1e6).round() / 1e6
    }
}

impl Instrument for Voltmeter {
    fn name(&self) -> &'static str {
        "voltmeter"
    }

    fn idn(&self) -> &'static str {
        "Voltmeter Serial #67890"
    }

    fn handle(&mut self, command: &Command) -> Result<Reply, CommandError> {
        match (command.kind, command.mnemonic.as_str()) {
            (CommandKind::Query, "AIN") => {
                command.expect_args(1)?;
                let channel = parse_channel(command, 0, 0, CHANNELS)?;
                let reading = self.read(channel);
                debug!(channel, reading, "Analog input read");
                Ok(Reply::number(reading))
            }
            (CommandKind::Query, "RNG") => {
                command.expect_args(1)?;
                let channel = parse_channel(command, 0, 0, CHANNELS)?;
                Ok(Reply::number(self.ranges[channel]))
            }
            (CommandKind::Set, "RNG") => {
                command.expect_args(2)?;
                let channel = parse_channel(command, 0, 0, CHANNELS)?;
                let requested: f64 = command.arg(1)?;
                let range = RANGES
                    .iter()
                    .copied()
                    .find(|range| (range - requested).abs() < 1e-9)
                    .ok_or_else(|| CommandError::InvalidArgument(command.args[1].clone()))?;
                self.ranges[channel] = range;
                Ok(Reply::Ok)
            }
            _ => Err(CommandError::Unknown(command.to_string())),
        }
    }
}

/// Handler entry point: serve a voltmeter until Ctrl-C
pub fn main(args: Vec<String>) -> anyhow::Result<()> {
    crate::launch::launch("voltmeter", args, |config: &SimulatorConfig| {
        Voltmeter::new(rng_from_seed(config.seed))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn voltmeter() -> Voltmeter {
        Voltmeter::new(rng_from_seed(Some(3)))
    }

    fn reading(voltmeter: &mut Voltmeter, channel: usize) -> f64 {
        let command = Command::parse(&format!("?AIN {channel}")).unwrap();
        match voltmeter.respond(&command).unwrap() {
            Reply::Value(value) => value.parse().unwrap(),
            other => panic!("unexpected reply {other:?}"),
        }
    }

    #[test]
    fn readings_stay_near_the_nominal_input() {
        let mut voltmeter = voltmeter();
        for (channel, nominal) in NOMINAL_INPUTS.iter().enumerate() {
            for _ in 0..50 {
                let value = reading(&mut voltmeter, channel);
                assert!((value - nominal).abs() <= 0.1 + 1e-6, "{value} vs {nominal}");
            }
        }
    }

    #[test]
    fn small_range_saturates() {
        let mut voltmeter = voltmeter();
        let set = Command::parse("!RNG 2 0.1").unwrap();
        assert_eq!(voltmeter.respond(&set).unwrap(), Reply::Ok);

        let query = Command::parse("?RNG 2").unwrap();
        assert_eq!(voltmeter.respond(&query).unwrap(), Reply::Value("0.1".into()));
        assert_eq!(reading(&mut voltmeter, 2), 0.1);
    }

    #[test]
    fn rejects_unknown_ranges_and_channels() {
        let mut voltmeter = voltmeter();
        for line in ["!RNG 0 5", "?AIN 4", "?AIN -1", "!RNG 1"] {
            let command = Command::parse(line).unwrap();
            assert!(voltmeter.respond(&command).is_err(), "{line}");
        }
        assert_matches!(
            voltmeter.respond(&Command::parse("!AIN 0").unwrap()),
            Err(CommandError::Unknown(_))
        );
    }

    #[test]
    fn same_seed_same_readings() {
        let mut a = voltmeter();
        let mut b = voltmeter();
        assert_eq!(reading(&mut a, 1), reading(&mut b, 1));
    }
}
