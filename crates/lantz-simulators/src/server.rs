//! TCP instrument server
//!
//! Accepts any number of concurrent connections. Every connection talks to the
//! same instrument, so state set by one client is visible to the others.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

use crate::error::{CommandError, Result};
use crate::instrument::Instrument;
use crate::protocol::{encode_reply, Command, MAX_LINE, RECV_TERMINATION};

/// Serves one simulated instrument over TCP
pub struct InstrumentServer<I> {
    listener: TcpListener,
    instrument: Arc<Mutex<I>>,
}

impl<I: Instrument> InstrumentServer<I> {
    /// Bind a listener for `instrument`
    pub async fn bind(addr: impl ToSocketAddrs, instrument: I) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            instrument: Arc::new(Mutex::new(instrument)),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `shutdown` completes
    pub async fn serve<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let name = self.instrument.lock().name();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!(instrument = name, "Shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!(instrument = name, %peer, "Client connected");
                        let instrument = Arc::clone(&self.instrument);
                        tokio::spawn(async move {
                            match handle_connection(stream, instrument).await {
                                Ok(()) => debug!(%peer, "Client disconnected"),
                                Err(e) => warn!(%peer, error = %e, "Connection failed"),
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "Failed to accept connection"),
                },
            }
        }
    }

    /// Serve until the process receives Ctrl-C
    pub async fn run_until_ctrl_c(self) -> Result<()> {
        self.serve(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Cannot listen for Ctrl-C, stopping");
            }
        })
        .await
    }
}

/// Answer request lines until the peer closes the connection.
///
/// A line longer than [`MAX_LINE`] is answered with `ERROR` and the
/// connection is dropped, since the rest of it cannot be framed reliably.
async fn handle_connection<I: Instrument>(
    stream: TcpStream,
    instrument: Arc<Mutex<I>>,
) -> std::io::Result<()> {
    stream.set_nodelay(true)?;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();

    loop {
        line.clear();
        let limit = (MAX_LINE + 1) as u64;
        if (&mut reader).take(limit).read_until(RECV_TERMINATION, &mut line).await? == 0 {
            return Ok(());
        }
        if line.len() > MAX_LINE && line.last() != Some(&RECV_TERMINATION) {
            let error = CommandError::TooLong(MAX_LINE);
            warn!(error = %error, "Dropping connection");
            writer.write_all(&encode_reply(&Err(error))).await?;
            return Ok(());
        }

        let result = match std::str::from_utf8(&line) {
            Ok(text) if text.trim().is_empty() => continue,
            Ok(text) => {
                Command::parse(text).and_then(|command| instrument.lock().respond(&command))
            }
            Err(_) => Err(CommandError::NotAscii),
        };

        if let Err(e) = &result {
            let request = String::from_utf8_lossy(&line);
            warn!(request = %request.trim_end(), error = %e, "Command failed");
        }

        writer.write_all(&encode_reply(&result)).await?;
    }
}
