//! Message-based client
//!
//! The driver side of a simulated instrument session: send a command, read
//! the terminated reply, or read a definite-length block.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::error::{CommandError, Result, SimError};
use crate::protocol::{
    block_length, block_length_width, ERROR_REPLY, RECV_TERMINATION, SEND_TERMINATION,
};

/// A connection to a simulated instrument
pub struct MessageClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl MessageClient {
    /// Open a session
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Send `command` followed by the terminator
    pub async fn write(&mut self, command: &str) -> Result<()> {
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(SEND_TERMINATION).await?;
        Ok(())
    }

    /// Read one reply line without its terminator
    pub async fn read_line(&mut self) -> Result<String> {
        let mut line = Vec::new();
        if self.reader.read_until(RECV_TERMINATION, &mut line).await? == 0 {
            return Err(SimError::ConnectionClosed);
        }
        let text = String::from_utf8(line).map_err(|_| CommandError::NotAscii)?;
        Ok(text.trim_end_matches(&['\r', '\n'][..]).to_string())
    }

    /// Send `command` and return the reply.
    ///
    /// An `ERROR` reply becomes [`SimError::Instrument`].
    pub async fn query(&mut self, command: &str) -> Result<String> {
        self.write(command).await?;
        let reply = self.read_line().await?;
        if reply == ERROR_REPLY {
            return Err(SimError::Instrument {
                command: command.to_string(),
            });
        }
        Ok(reply)
    }

    /// Send `command` and read a `#<D><length><data>` block reply
    pub async fn query_block(&mut self, command: &str) -> Result<Vec<u8>> {
        self.write(command).await?;

        let mut header = [0u8; 2];
        self.reader.read_exact(&mut header).await?;
        if header[1] == RECV_TERMINATION {
            return Err(CommandError::MalformedBlock("missing '#' header").into());
        }
        if header[0] != b'#' {
            // Anything but a block is a textual reply; only ERROR is expected
            let rest = self.read_line().await?;
            let reply = format!("{}{}", String::from_utf8_lossy(&header), rest);
            if reply == ERROR_REPLY {
                return Err(SimError::Instrument {
                    command: command.to_string(),
                });
            }
            return Err(CommandError::MalformedBlock("missing '#' header").into());
        }

        let mut field = vec![0u8; block_length_width(header[1])?];
        self.reader.read_exact(&mut field).await?;
        let mut data = vec![0u8; block_length(&field)?];
        self.reader.read_exact(&mut data).await?;

        let trailer = self.read_line().await?;
        if !trailer.is_empty() {
            return Err(CommandError::MalformedBlock("unexpected bytes after payload").into());
        }
        Ok(data)
    }
}
