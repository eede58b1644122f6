//! Handler invocation

use std::ffi::OsString;
use std::io::Write;

use lantz_registry::HandlerRegistry;
use tracing::info;

use crate::cli::{self, Dispatch};

/// Dispatch failures that are not usage errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The selected name has no handler
    #[error("no simulator named '{0}' is registered")]
    UnknownSimulator(String),
}

/// Runs the handler selected on the command line
#[derive(Debug)]
pub struct Dispatcher {
    registry: HandlerRegistry,
}

impl Dispatcher {
    /// Create a dispatcher over a populated registry
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    /// Parse process arguments against the registry
    pub fn parse_from<I, T>(&self, argv: I) -> Result<Dispatch, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        cli::parse_from(&self.registry, argv)
    }

    /// Write the status line to `out`, then run the selected handler with the
    /// pending arguments and return whatever it returns.
    pub fn run<W: Write>(&self, dispatch: Dispatch, out: &mut W) -> anyhow::Result<()> {
        let Dispatch { simulator, pending } = dispatch;
        let handler = self
            .registry
            .get(&simulator)
            .ok_or_else(|| DispatchError::UnknownSimulator(simulator.clone()))?;

        writeln!(out, "Dispatching {simulator}")?;
        out.flush()?;

        info!(%simulator, args = ?pending, "Dispatching");
        handler.run(pending)
    }
}
