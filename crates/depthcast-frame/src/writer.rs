use std::io::{ErrorKind, IoSlice, Write};

use depthcast_transport::ChannelStream;
use tracing::trace;

use crate::codec::FrameConfig;
use crate::error::{FrameError, Result};

/// Running totals for a writer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Complete frames written.
    pub frames_sent: u64,
    /// Wire bytes written, delimiters included.
    pub bytes_sent: u64,
}

/// Writes complete frames to any `Write` stream.
///
/// Each `send` either puts the whole frame on the wire or fails. The payload
/// is written straight from the caller's slice and nothing is kept between
/// calls, so a failed send leaves no pending bytes to retry.
pub struct FrameWriter<T> {
    inner: T,
    config: FrameConfig,
    stats: WriterStats,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: FrameConfig) -> Self {
        Self {
            inner,
            config,
            stats: WriterStats::default(),
        }
    }

    /// Encode and send one payload (blocking).
    ///
    /// Returns the number of wire bytes written.
    pub fn send(&mut self, payload: &[u8]) -> Result<usize> {
        let delimiter = self.config.delimiter.map(|byte| [byte]);
        let tail = delimiter.as_ref().map_or(&[][..], |byte| &byte[..]);
        let total = self.config.wire_size(payload.len());

        let mut parts = [IoSlice::new(payload), IoSlice::new(tail)];
        let mut remaining = &mut parts[..];
        let mut offset = 0usize;
        while offset < total {
            match self.inner.write_vectored(remaining) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => {
                    offset += n;
                    IoSlice::advance_slices(&mut remaining, n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()?;

        self.stats.frames_sent += 1;
        self.stats.bytes_sent += total as u64;
        trace!(bytes = total, frames = self.stats.frames_sent, "frame written");
        Ok(total)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Totals since the writer was created.
    pub fn stats(&self) -> WriterStats {
        self.stats
    }
}

impl FrameWriter<ChannelStream> {
    /// Create a frame writer for a connected `ChannelStream`.
    ///
    /// Disables Nagle's algorithm so the trailing delimiter is not held back.
    pub fn for_stream(inner: ChannelStream, config: FrameConfig) -> Result<Self> {
        inner
            .set_nodelay(true)
            .map_err(transport_to_frame_error)?;
        Ok(Self::with_config(inner, config))
    }
}

fn transport_to_frame_error(err: depthcast_transport::TransportError) -> FrameError {
    match err {
        depthcast_transport::TransportError::Io(io)
        | depthcast_transport::TransportError::Accept(io) => FrameError::Io(io),
        depthcast_transport::TransportError::Bind { source, .. }
        | depthcast_transport::TransportError::Connect { source, .. }
        | depthcast_transport::TransportError::Resolve { source, .. } => FrameError::Io(source),
    }
}
