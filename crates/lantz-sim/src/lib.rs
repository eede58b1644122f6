//! Lantz Sim - simulator dispatcher
//!
//! `lantz-sim <SIMULATOR> [ARGS]...` selects one handler from a
//! [`HandlerRegistry`], prints `Dispatching <SIMULATOR>` and runs the handler
//! with the remaining arguments untouched. The registry is supplied by the
//! caller; the binary uses [`lantz_simulators::registry`].

#![forbid(unsafe_code)]

pub mod cli;
pub mod dispatch;
pub mod logging;

pub use cli::Dispatch;
pub use dispatch::{DispatchError, Dispatcher};
pub use lantz_registry::{Handler, HandlerRegistry};
