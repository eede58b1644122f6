//! Simulator configuration
//!
//! Settings come from three layers: built-in defaults, an optional TOML file
//! given with `--config`, and command-line flags. Later layers win.
//!
//! ```toml
//! seed = 42
//!
//! [server]
//! host = "localhost"
//! port = 5678
//! ```

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};

/// Default TCP port for every simulator
pub const DEFAULT_PORT: u16 = 5678;

/// Resolved settings for one simulator run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Seed for simulated noise; fresh entropy when absent
    pub seed: Option<u64>,
    /// Listening socket
    pub server: ServerConfig,
}

/// Listening socket settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Host name or address to bind
    pub host: String,
    /// TCP port to bind
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ServerConfig {
    /// `host:port`, suitable for binding
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SimulatorConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| SimError::config(format!("invalid configuration: {e}")))
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            SimError::config(format!("failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text).map_err(|e| match e {
            SimError::Config { message } => {
                SimError::config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }
}

/// Command-line flags understood by every simulator
#[derive(Debug, Clone, Default, PartialEq, Eq, Parser)]
#[command(about = "Serve a simulated instrument over TCP", long_about = None)]
pub struct SimulatorArgs {
    /// Host name or address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// TCP port to bind
    #[arg(short, long)]
    pub port: Option<u16>,

    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for simulated noise
    #[arg(long)]
    pub seed: Option<u64>,
}

impl SimulatorArgs {
    /// Parse the pending arguments forwarded by the dispatcher.
    ///
    /// `program` becomes the binary name shown in usage and help output.
    pub fn parse_pending(
        program: &str,
        args: Vec<String>,
    ) -> std::result::Result<Self, clap::Error> {
        Self::try_parse_from(std::iter::once(program.to_string()).chain(args))
    }

    /// Merge defaults, the config file and flags, in that order
    pub fn resolve(&self) -> Result<SimulatorConfig> {
        let mut config = match &self.config {
            Some(path) => SimulatorConfig::load(path)?,
            None => SimulatorConfig::default(),
        };

        if let Some(host) = &self.host {
            config.server.host.clone_from(host);
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn args(tokens: &[&str]) -> SimulatorArgs {
        let tokens = tokens.iter().map(|token| token.to_string()).collect();
        SimulatorArgs::parse_pending("fungen", tokens).unwrap()
    }

    #[test]
    fn defaults_without_flags() {
        let config = args(&[]).resolve().unwrap();
        assert_eq!(config, SimulatorConfig::default());
        assert_eq!(config.server.address(), "localhost:5678");
        assert_eq!(config.seed, None);
    }

    #[test]
    fn flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "seed = 9\n\n[server]\nhost = \"0.0.0.0\"\nport = 7000").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let from_file = args(&["--config", &path]).resolve().unwrap();
        assert_eq!(from_file.server.address(), "0.0.0.0:7000");
        assert_eq!(from_file.seed, Some(9));

        let overridden = args(&["-c", &path, "--port", "7001", "--seed", "1"])
            .resolve()
            .unwrap();
        assert_eq!(overridden.server.address(), "0.0.0.0:7001");
        assert_eq!(overridden.seed, Some(1));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = SimulatorConfig::from_toml_str("[server]\nport = 6000\n").unwrap();
        assert_eq!(config.server.host, "localhost");
        assert_eq!(config.server.port, 6000);
    }

    #[test]
    fn bad_files_are_errors() {
        assert_matches!(
            SimulatorConfig::from_toml_str("[server]\nprot = 1\n"),
            Err(SimError::Config { .. })
        );
        assert_matches!(
            args(&["--config", "/nonexistent/lantz-sim.toml"]).resolve(),
            Err(SimError::Config { message }) if message.contains("failed to read")
        );
    }

    #[test]
    fn file_errors_name_the_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = \"high\"").unwrap();

        let message = match SimulatorConfig::load(file.path()) {
            Err(SimError::Config { message }) => message,
            other => panic!("unexpected result {other:?}"),
        };
        assert!(message.starts_with(&file.path().display().to_string()), "{message}");
        assert!(message.contains("invalid configuration"), "{message}");
    }

    #[test]
    fn bad_flags_are_usage_errors() {
        let error = SimulatorArgs::parse_pending("fungen", vec!["--port".into(), "high".into()])
            .unwrap_err();
        assert_eq!(error.kind(), clap::error::ErrorKind::ValueValidation);

        let error = SimulatorArgs::parse_pending("fungen", vec!["--help".into()]).unwrap_err();
        assert_eq!(error.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
