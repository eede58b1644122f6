//! Shared entry point for simulator handlers

use anyhow::Context;
use tracing::info;

use crate::config::{SimulatorArgs, SimulatorConfig};
use crate::instrument::Instrument;
use crate::server::InstrumentServer;

/// Parse `args`, build the instrument and serve it until Ctrl-C.
///
/// Usage errors from `args` are returned as [`clap::Error`] inside the
/// `anyhow::Error` so the caller can print them with clap's own formatting.
pub fn launch<I, F>(program: &'static str, args: Vec<String>, build: F) -> anyhow::Result<()>
where
    I: Instrument,
    F: FnOnce(&SimulatorConfig) -> I,
{
    let args = SimulatorArgs::parse_pending(program, args)?;
    let config = args.resolve()?;
    let instrument = build(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(async move {
        let address = config.server.address();
        let server = InstrumentServer::bind(address.as_str(), instrument)
            .await
            .with_context(|| format!("failed to bind {address}"))?;

        let local = server.local_addr()?;
        info!(simulator = program, address = %local, "Simulator listening, press Ctrl-C to stop");
        server.run_until_ctrl_c().await?;
        Ok::<_, anyhow::Error>(())
    })
}
