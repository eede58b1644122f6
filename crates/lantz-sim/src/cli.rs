//! Dispatcher command line
//!
//! `lantz-sim <SIMULATOR> [ARGS]...`: the first positional token selects a
//! simulator from the registry; every token after it is collected verbatim
//! for the simulator to parse.

use std::ffi::OsString;

use clap::builder::PossibleValuesParser;
use clap::{CommandFactory, FromArgMatches, Parser};
use lantz_registry::HandlerRegistry;

/// A parsed dispatcher invocation
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "lantz-sim")]
#[command(about = "Run an instrument simulator", long_about = None)]
pub struct Dispatch {
    /// Simulator to run
    #[arg(index = 1, value_name = "SIMULATOR")]
    pub simulator: String,

    /// Arguments forwarded unparsed to the simulator
    #[arg(
        index = 2,
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub pending: Vec<String>,
}

/// Argument definition whose simulator choices are the registry keys
pub fn command(registry: &HandlerRegistry) -> clap::Command {
    let names: Vec<String> = registry.names().map(str::to_string).collect();
    // `mut_arg` re-appends the argument, which would put SIMULATOR after ARGS
    Dispatch::command().mut_args(|arg| {
        if arg.get_id() == "simulator" {
            arg.value_parser(PossibleValuesParser::new(names.clone()))
        } else {
            arg
        }
    })
}

/// Parse `argv` (program name first) against `registry`
pub fn parse_from<I, T>(registry: &HandlerRegistry, argv: I) -> Result<Dispatch, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut command = command(registry);
    let matches = command.try_get_matches_from_mut(argv)?;
    Dispatch::from_arg_matches(&matches).map_err(|e| e.format(&mut command))
}
