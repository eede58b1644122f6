//! Lantz Simulators - simulated laboratory instruments
//!
//! Message-based instruments (function generator, voltmeter, oscilloscope)
//! served over TCP so that drivers can be developed without hardware.
//!
//! [`registry`] exposes every simulator as a named handler for the
//! `lantz-sim` dispatcher. Each handler parses its own arguments:
//!
//! ```text
//! lantz-sim fungen --port 5678 --seed 1
//! ```

#![forbid(unsafe_code)]

pub mod client;
pub mod config;
pub mod error;
pub mod fungen;
pub mod instrument;
pub mod launch;
pub mod osci;
pub mod protocol;
pub mod server;
pub mod voltmeter;

pub use client::MessageClient;
pub use config::{ServerConfig, SimulatorArgs, SimulatorConfig};
pub use error::{CommandError, Result, SimError};
pub use fungen::FunctionGenerator;
pub use instrument::Instrument;
pub use osci::Oscilloscope;
pub use protocol::{Command, CommandKind, Reply};
pub use server::InstrumentServer;
pub use voltmeter::Voltmeter;

use lantz_registry::HandlerRegistry;

/// Every simulator in this crate, keyed by the name used on the command line
pub fn registry() -> lantz_registry::Result<HandlerRegistry> {
    Ok(HandlerRegistry::builder()
        .register("fungen", fungen::main)?
        .register("voltmeter", voltmeter::main)?
        .register("osci", osci::main)?
        .build())
}
