//! Lantz Registry - named simulator handlers
//!
//! A [`HandlerRegistry`] maps a simulator name to something that can be run
//! with the command-line arguments left over after the name was consumed.
//! Registries are populated once through a [`RegistryBuilder`] and are
//! read-only afterwards.

#![forbid(unsafe_code)]

mod error;
mod registry;

pub use error::{RegistryError, Result};
pub use registry::{Handler, HandlerRegistry, RegistryBuilder};
