//! Instrument abstraction shared by every simulator

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::error::CommandError;
use crate::protocol::{Command, Reply};

/// A simulated message-based instrument.
///
/// Implementors only see parsed commands; framing, encoding and connection
/// handling live in [`crate::server`].
pub trait Instrument: Send + 'static {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Identification string returned by `?IDN`
    fn idn(&self) -> &'static str;

    /// Execute an instrument-specific command
    fn handle(&mut self, command: &Command) -> Result<Reply, CommandError>;

    /// Execute any command, answering `?IDN` before delegating to
    /// [`Instrument::handle`]
    fn respond(&mut self, command: &Command) -> Result<Reply, CommandError> {
        if command.is_query("IDN") {
            command.expect_args(0)?;
            return Ok(Reply::Value(self.idn().to_string()));
        }
        self.handle(command)
    }
}

/// Random source for simulated noise, reproducible when seeded
pub fn rng_from_seed(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Reject `value` unless it lies within `min..=max`
pub fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, CommandError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(CommandError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

/// Parse a `0`/`1` flag argument
pub fn parse_flag(command: &Command, index: usize) -> Result<bool, CommandError> {
    match command.arg::<u8>(index)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(CommandError::InvalidArgument(command.args[index].clone())),
    }
}

/// Parse a channel argument and turn it into an index into a
/// `count`-element array whose first channel is numbered `first`
pub fn parse_channel(
    command: &Command,
    index: usize,
    first: usize,
    count: usize,
) -> Result<usize, CommandError> {
    let channel: usize = command.arg(index)?;
    if channel < first || channel >= first + count {
        return Err(CommandError::InvalidArgument(command.args[index].clone()));
    }
    Ok(channel - first)
}
