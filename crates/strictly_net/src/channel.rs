//! Participant channels: one ordered byte stream per remote participant.

use crate::codec::{ClientMessage, ProtocolError, ServerMessage};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, instrument, trace, warn};

/// Longest line accepted from a participant.
pub const MAX_LINE_BYTES: u64 = 8 * 1024;

/// Send timeout used when none is configured.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_millis(500);

/// Error receiving from a participant.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ChannelError {
    /// The stream closed or failed. Ends the game this channel belongs to.
    #[display("Participant disconnected")]
    Disconnected,

    /// A line arrived but did not decode.
    #[display("Malformed message: {}", _0)]
    Malformed(ProtocolError),
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChannelError::Malformed(e) => Some(e),
            ChannelError::Disconnected => None,
        }
    }
}

impl From<ProtocolError> for ChannelError {
    fn from(err: ProtocolError) -> Self {
        ChannelError::Malformed(err)
    }
}

/// Connection to one participant, as seen by the coordinator.
#[async_trait::async_trait]
pub trait Channel: Send {
    /// Delivers a message if possible.
    ///
    /// Failures are logged and swallowed; a participant that went away is
    /// noticed on the next [`Channel::receive`].
    async fn send(&mut self, message: &ServerMessage);

    /// Waits for the next complete line from the participant.
    async fn receive(&mut self) -> Result<ClientMessage, ChannelError>;

    /// Closes the outbound direction.
    async fn close(&mut self) {}

    /// False once the participant is known to have gone away. Never waits.
    async fn is_connected(&mut self) -> bool {
        true
    }

    /// Remote address or other label for logs.
    fn peer(&self) -> &str;
}

/// Newline-framed channel over any async byte stream.
pub struct LineChannel<R, W> {
    reader: BufReader<R>,
    writer: W,
    peer: String,
    send_timeout: Duration,
}

/// Channel over an accepted TCP connection.
pub type TcpChannel = LineChannel<OwnedReadHalf, OwnedWriteHalf>;

impl<R, W> LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Wraps a reader/writer pair.
    pub fn new(reader: R, writer: W, peer: impl Into<String>, send_timeout: Duration) -> Self {
        Self {
            reader: BufReader::new(reader),
            writer,
            peer: peer.into(),
            send_timeout,
        }
    }
}

impl TcpChannel {
    /// Splits an accepted stream into a channel.
    #[instrument(skip(stream))]
    pub fn from_tcp(stream: TcpStream, send_timeout: Duration) -> Self {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let (reader, writer) = stream.into_split();
        debug!(%peer, "Channel opened");
        Self::new(reader, writer, peer, send_timeout)
    }
}

#[async_trait::async_trait]
impl<R, W> Channel for LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn send(&mut self, message: &ServerMessage) {
        let line = message.encode();
        let writer = &mut self.writer;
        let write = async move {
            writer.write_all(line.as_bytes()).await?;
            writer.flush().await
        };

        let result = tokio::time::timeout(self.send_timeout, write).await;
        match result {
            Ok(Ok(())) => trace!(peer = %self.peer, tag = %message.tag(), "Sent"),
            Ok(Err(e)) => warn!(peer = %self.peer, tag = %message.tag(), error = %e, "Send failed"),
            Err(_) => warn!(
                peer = %self.peer,
                tag = %message.tag(),
                timeout_ms = self.send_timeout.as_millis() as u64,
                "Send timed out"
            ),
        }
    }

    async fn receive(&mut self) -> Result<ClientMessage, ChannelError> {
        let mut buf = Vec::new();
        let read = (&mut self.reader)
            .take(MAX_LINE_BYTES)
            .read_until(b'\n', &mut buf)
            .await;

        match read {
            Ok(0) => {
                debug!(peer = %self.peer, "Stream closed by participant");
                Err(ChannelError::Disconnected)
            }
            Ok(n) if n as u64 == MAX_LINE_BYTES && !buf.ends_with(b"\n") => {
                warn!(peer = %self.peer, limit = MAX_LINE_BYTES, "Line too long, discarding it");
                self.discard_rest_of_line().await?;
                Err(ChannelError::Malformed(ProtocolError::LineTooLong(MAX_LINE_BYTES)))
            }
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                trace!(peer = %self.peer, line = %line.trim_end(), "Received");
                ClientMessage::decode(&line).map_err(ChannelError::from)
            }
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "Read failed, treating as disconnect");
                Err(ChannelError::Disconnected)
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(peer = %self.peer, error = %e, "Shutdown failed");
        }
    }

    async fn is_connected(&mut self) -> bool {
        if !self.reader.buffer().is_empty() {
            return true;
        }
        // Polled once: pending means the peer is alive but quiet.
        match tokio::time::timeout(Duration::ZERO, self.reader.fill_buf()).await {
            Ok(Ok(buf)) => !buf.is_empty(),
            Ok(Err(e)) => {
                debug!(peer = %self.peer, error = %e, "Read failed while probing");
                false
            }
            Err(_) => true,
        }
    }

    fn peer(&self) -> &str {
        &self.peer
    }
}

impl<R, W> LineChannel<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    /// Drops input up to and including the next newline.
    async fn discard_rest_of_line(&mut self) -> Result<(), ChannelError> {
        let mut chunk = Vec::new();
        loop {
            chunk.clear();
            match (&mut self.reader)
                .take(MAX_LINE_BYTES)
                .read_until(b'\n', &mut chunk)
                .await
            {
                // End of stream; the next receive reports it.
                Ok(0) => return Ok(()),
                Ok(_) if chunk.ends_with(b"\n") => return Ok(()),
                Ok(_) => continue,
                Err(e) => {
                    warn!(peer = %self.peer, error = %e, "Read failed, treating as disconnect");
                    return Err(ChannelError::Disconnected);
                }
            }
        }
    }
}
