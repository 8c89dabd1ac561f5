//! Per-stream transport channels.
//!
//! One connection per transmitted stream kind: color on [`COLOR_PORT`], depth
//! on [`DEPTH_PORT`]. A channel never carries another kind's frames.

use depthcast_capture::StreamKind;
use depthcast_frame::{FrameConfig, FrameWriter, WriterStats};
use depthcast_transport::ChannelStream;
use tracing::{debug, info};

use crate::error::RuntimeError;

/// Port of the color channel.
pub const COLOR_PORT: u16 = 3490;

/// Port of the depth channel.
pub const DEPTH_PORT: u16 = 3491;

/// A persistent outbound connection bound to exactly one stream kind.
pub struct TransportChannel {
    kind: StreamKind,
    target: String,
    writer: FrameWriter<ChannelStream>,
}

impl TransportChannel {
    /// Resolve `host:port` and connect to the first address that accepts.
    pub fn connect(
        kind: StreamKind,
        host: &str,
        port: u16,
        framing: FrameConfig,
    ) -> Result<Self, RuntimeError> {
        let stream = depthcast_transport::connect(host, port)
            .map_err(|source| RuntimeError::Connect { kind, source })?;
        let writer = FrameWriter::for_stream(stream, framing)
            .map_err(|source| RuntimeError::Send { kind, source })?;

        let target = format!("{host}:{port}");
        info!(%kind, %target, peer = %writer.get_ref().peer_addr(), "channel connected");
        Ok(Self {
            kind,
            target,
            writer,
        })
    }

    /// Send one `kind` payload in full, followed by the delimiter.
    ///
    /// Returns the wire bytes written. Any failure is final for this channel.
    pub fn send(&mut self, kind: StreamKind, payload: &[u8]) -> Result<usize, RuntimeError> {
        if kind != self.kind {
            return Err(RuntimeError::ChannelMismatch {
                channel: self.kind,
                payload: kind,
            });
        }

        let written = self.writer.send(payload).map_err(|source| RuntimeError::Send {
            kind: self.kind,
            source,
        })?;
        debug!(kind = %self.kind, bytes = written, "frame sent");
        Ok(written)
    }

    /// Shut the connection down and release the socket.
    pub fn close(self) -> Result<WriterStats, RuntimeError> {
        let stats = self.writer.stats();
        let kind = self.kind;
        let stream = self.writer.into_inner();
        stream
            .shutdown()
            .map_err(|source| RuntimeError::Close { kind, source })?;

        info!(
            %kind,
            target = %self.target,
            frames = stats.frames_sent,
            bytes = stats.bytes_sent,
            "channel closed"
        );
        Ok(stats)
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }

    pub fn stats(&self) -> WriterStats {
        self.writer.stats()
    }
}

impl std::fmt::Debug for TransportChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportChannel")
            .field("kind", &self.kind)
            .field("target", &self.target)
            .field("stats", &self.writer.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use depthcast_transport::TcpTransport;

    use super::*;

    fn pair(kind: StreamKind, framing: FrameConfig) -> (TransportChannel, ChannelStream) {
        let listener = TcpTransport::bind("127.0.0.1:0").unwrap();
        let port = listener.port();
        let handle = std::thread::spawn(move || listener.accept().unwrap());
        let channel = TransportChannel::connect(kind, "127.0.0.1", port, framing).unwrap();
        (channel, handle.join().unwrap())
    }

    #[test]
    fn send_writes_payload_and_newline() {
        let (mut channel, mut server) = pair(StreamKind::Color, FrameConfig::default());

        assert_eq!(channel.send(StreamKind::Color, b"rgbrgb").unwrap(), 7);
        channel.close().unwrap();

        let mut received = Vec::new();
        server.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"rgbrgb\n");
    }

    #[test]
    fn send_without_delimiter() {
        let (mut channel, mut server) = pair(StreamKind::Depth, FrameConfig::undelimited());

        assert_eq!(channel.send(StreamKind::Depth, b"dd").unwrap(), 2);
        let stats = channel.close().unwrap();
        assert_eq!(stats.bytes_sent, 2);

        let mut received = Vec::new();
        server.read_to_end(&mut received).unwrap();
        assert_eq!(received, b"dd");
    }

    #[test]
    fn refuses_other_stream_kinds() {
        let (mut channel, _server) = pair(StreamKind::Depth, FrameConfig::default());

        let err = channel.send(StreamKind::Color, b"rgb").unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::ChannelMismatch {
                channel: StreamKind::Depth,
                payload: StreamKind::Color
            }
        ));
        assert_eq!(channel.stats().frames_sent, 0);
    }

    #[test]
    fn connect_failure_names_the_channel() {
        let port = TcpTransport::bind("127.0.0.1:0").unwrap().port();

        let err = TransportChannel::connect(
            StreamKind::Color,
            "127.0.0.1",
            port,
            FrameConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::Connect {
                kind: StreamKind::Color,
                ..
            }
        ));
    }
}
