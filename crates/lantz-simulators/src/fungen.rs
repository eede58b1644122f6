//! Function generator simulator
//!
//! | command               | meaning                                    |
//! |-----------------------|--------------------------------------------|
//! | `?AMP` / `!AMP v`     | amplitude, 0 to 10 V                       |
//! | `?OFF` / `!OFF v`     | DC offset, -5 to 5 V                       |
//! | `?FRE` / `!FRE v`     | frequency, 1 Hz to 100 kHz                 |
//! | `?OUT` / `!OUT b`     | output enabled                             |
//! | `?WVF` / `!WVF n`     | 0 sine, 1 square, 2 triangular, 3 ramp     |
//! | `?DOU k` / `!DOU k b` | digital output `k` (1-8)                   |
//! | `?DIN k`              | digital input `k` (1-8)                    |
//! | `!CAL`                | calibrate                                  |
//! | `!TES level reps`     | self test, level 1-3                       |

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::SimulatorConfig;
use crate::error::CommandError;
use crate::instrument::{check_range, parse_channel, parse_flag, rng_from_seed, Instrument};
use crate::protocol::{Command, CommandKind, Reply};

const DIGITAL_LINES: usize = 8;

/// Output waveform shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Waveform {
    /// Sine wave
    #[default]
    Sine = 0,
    /// Square wave
    Square = 1,
    /// Triangular wave
    Triangular = 2,
    /// Sawtooth ramp
    Ramp = 3,
}

impl TryFrom<u8> for Waveform {
    type Error = CommandError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Waveform::Sine),
            1 => Ok(Waveform::Square),
            2 => Ok(Waveform::Triangular),
            3 => Ok(Waveform::Ramp),
            other => Err(CommandError::InvalidArgument(other.to_string())),
        }
    }
}

/// Simulated function generator
#[derive(Debug, Clone)]
pub struct FunctionGenerator {
    amplitude: f64,
    offset: f64,
    frequency: f64,
    output_enabled: bool,
    waveform: Waveform,
    digital_outputs: [bool; DIGITAL_LINES],
    digital_inputs: [bool; DIGITAL_LINES],
}

impl FunctionGenerator {
    /// Create a generator with its output disabled. Digital inputs are drawn
    /// from `rng`.
    pub fn new(mut rng: ChaCha8Rng) -> Self {
        let mut digital_inputs = [false; DIGITAL_LINES];
        for input in &mut digital_inputs {
            *input = rng.gen();
        }

        Self {
            amplitude: 0.0,
            offset: 0.0,
            frequency: 1000.0,
            output_enabled: false,
            waveform: Waveform::Sine,
            digital_outputs: [false; DIGITAL_LINES],
            digital_inputs,
        }
    }

    /// Current waveform
    pub fn waveform(&self) -> Waveform {
        self.waveform
    }
}

impl Instrument for FunctionGenerator {
    fn name(&self) -> &'static str {
        "fungen"
    }

    fn idn(&self) -> &'static str {
        "FunctionGenerator Serial #12345"
    }

    fn handle(&mut self, command: &Command) -> Result<Reply, CommandError> {
        use CommandKind::{Query, Set};

        match (command.kind, command.mnemonic.as_str()) {
            (Query, "AMP") => {
                command.expect_args(0)?;
                Ok(Reply::number(self.amplitude))
            }
            (Set, "AMP") => {
                command.expect_args(1)?;
                self.amplitude = check_range("amplitude", command.arg(0)?, 0.0, 10.0)?;
                Ok(Reply::Ok)
            }
            (Query, "OFF") => {
                command.expect_args(0)?;
                Ok(Reply::number(self.offset))
            }
            (Set, "OFF") => {
                command.expect_args(1)?;
                self.offset = check_range("offset", command.arg(0)?, -5.0, 5.0)?;
                Ok(Reply::Ok)
            }
            (Query, "FRE") => {
                command.expect_args(0)?;
                Ok(Reply::number(self.frequency))
            }
            (Set, "FRE") => {
                command.expect_args(1)?;
                self.frequency = check_range("frequency", command.arg(0)?, 1.0, 1e5)?;
                Ok(Reply::Ok)
            }
            (Query, "OUT") => {
                command.expect_args(0)?;
                Ok(Reply::flag(self.output_enabled))
            }
            (Set, "OUT") => {
                command.expect_args(1)?;
                self.output_enabled = parse_flag(command, 0)?;
                info!(enabled = self.output_enabled, "Output toggled");
                Ok(Reply::Ok)
            }
            (Query, "WVF") => {
                command.expect_args(0)?;
                Ok(Reply::Value((self.waveform as u8).to_string()))
            }
            (Set, "WVF") => {
                command.expect_args(1)?;
                self.waveform = Waveform::try_from(command.arg::<u8>(0)?)?;
                Ok(Reply::Ok)
            }
            (Query, "DOU") => {
                command.expect_args(1)?;
                let line = parse_channel(command, 0, 1, DIGITAL_LINES)?;
                Ok(Reply::flag(self.digital_outputs[line]))
            }
            (Set, "DOU") => {
                command.expect_args(2)?;
                let line = parse_channel(command, 0, 1, DIGITAL_LINES)?;
                self.digital_outputs[line] = parse_flag(command, 1)?;
                Ok(Reply::Ok)
            }
            (Query, "DIN") => {
                command.expect_args(1)?;
                let line = parse_channel(command, 0, 1, DIGITAL_LINES)?;
                Ok(Reply::flag(self.digital_inputs[line]))
            }
            (Set, "CAL") => {
                command.expect_args(0)?;
                debug!("Calibrating");
                Ok(Reply::Ok)
            }
            (Set, "TES") => {
                command.expect_args(2)?;
                let level: u8 = command.arg(0)?;
                let repetitions: u32 = command.arg(1)?;
                if !(1..=3).contains(&level) || repetitions == 0 {
                    return Err(CommandError::InvalidArgument(command.to_string()));
                }
                debug!(level, repetitions, "Self test passed");
                Ok(Reply::Ok)
            }
            _ => Err(CommandError::Unknown(command.to_string())),
        }
    }
}

/// Handler entry point: serve a function generator until Ctrl-C
pub fn main(args: Vec<String>) -> anyhow::Result<()> {
    crate::launch::launch("fungen", args, |config: &SimulatorConfig| {
        FunctionGenerator::new(rng_from_seed(config.seed))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn send(fungen: &mut FunctionGenerator, line: &str) -> Result<Reply, CommandError> {
        fungen.respond(&Command::parse(line).unwrap())
    }

    fn value(fungen: &mut FunctionGenerator, line: &str) -> String {
        match send(fungen, line).unwrap() {
            Reply::Value(value) => value,
            other => panic!("expected a value for {line}, got {other:?}"),
        }
    }

    fn fungen() -> FunctionGenerator {
        FunctionGenerator::new(rng_from_seed(Some(1)))
    }

    #[test]
    fn initial_state() {
        let mut fungen = fungen();
        assert_eq!(value(&mut fungen, "?IDN"), "FunctionGenerator Serial #12345");
        assert_eq!(value(&mut fungen, "?AMP"), "0");
        assert_eq!(value(&mut fungen, "?FRE"), "1000");
        assert_eq!(value(&mut fungen, "?OUT"), "0");
        assert_eq!(value(&mut fungen, "?WVF"), "0");
        assert_eq!(fungen.waveform(), Waveform::Sine);
    }

    #[test]
    fn setters_update_state() {
        let mut fungen = fungen();
        assert_eq!(send(&mut fungen, "!AMP 1.5").unwrap(), Reply::Ok);
        assert_eq!(value(&mut fungen, "?AMP"), "1.5");

        assert_eq!(send(&mut fungen, "!off -2.25").unwrap(), Reply::Ok);
        assert_eq!(value(&mut fungen, "?OFF"), "-2.25");

        assert_eq!(send(&mut fungen, "!OUT 1").unwrap(), Reply::Ok);
        assert_eq!(value(&mut fungen, "?OUT"), "1");

        assert_eq!(send(&mut fungen, "!WVF 3").unwrap(), Reply::Ok);
        assert_eq!(fungen.waveform(), Waveform::Ramp);

        assert_eq!(send(&mut fungen, "!DOU 4 1").unwrap(), Reply::Ok);
        assert_eq!(value(&mut fungen, "?DOU 4"), "1");
        assert_eq!(value(&mut fungen, "?DOU 5"), "0");
    }

    #[test]
    fn limits_are_enforced() {
        let mut fungen = fungen();
        assert_matches!(send(&mut fungen, "!AMP 11"), Err(CommandError::OutOfRange { .. }));
        assert_matches!(send(&mut fungen, "!FRE 0.5"), Err(CommandError::OutOfRange { .. }));
        assert_matches!(send(&mut fungen, "!WVF 4"), Err(CommandError::InvalidArgument(_)));
        assert_matches!(send(&mut fungen, "?DOU 0"), Err(CommandError::InvalidArgument(_)));
        assert_matches!(send(&mut fungen, "!TES 4 1"), Err(CommandError::InvalidArgument(_)));
        assert_matches!(send(&mut fungen, "!AMP"), Err(CommandError::ArgumentCount { .. }));
        assert_eq!(value(&mut fungen, "?AMP"), "0");
    }

    #[test]
    fn actions_and_unknown_commands() {
        let mut fungen = fungen();
        assert_eq!(send(&mut fungen, "!CAL").unwrap(), Reply::Ok);
        assert_eq!(send(&mut fungen, "!TES 2 10").unwrap(), Reply::Ok);
        assert_matches!(send(&mut fungen, "?CAL"), Err(CommandError::Unknown(_)));
        assert_matches!(send(&mut fungen, "!DIN 1 1"), Err(CommandError::Unknown(_)));
    }

    #[test]
    fn digital_inputs_follow_the_seed() {
        let mut a = fungen();
        let mut b = fungen();
        for line in 1..=8 {
            let query = format!("?DIN {line}");
            assert_eq!(value(&mut a, &query), value(&mut b, &query));
        }
    }
}
