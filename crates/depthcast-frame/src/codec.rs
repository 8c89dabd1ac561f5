use bytes::{Buf, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Default trailing delimiter: ASCII newline.
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// Configuration for the frame codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameConfig {
    /// Byte appended after every payload, or `None` to send bare payloads.
    /// Default: `Some(b'\n')`.
    pub delimiter: Option<u8>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            delimiter: Some(DEFAULT_DELIMITER),
        }
    }
}

impl FrameConfig {
    /// Bare payloads with no trailing delimiter.
    pub fn undelimited() -> Self {
        Self { delimiter: None }
    }

    /// Total wire size of one message carrying `payload_len` bytes.
    pub fn wire_size(&self, payload_len: usize) -> usize {
        payload_len + usize::from(self.delimiter.is_some())
    }
}

/// Encode a frame into the wire format, for receiver-side tests.
///
/// Wire format:
/// ```text
/// ┌─────────────────────────┬──────────────┐
/// │ Payload                 │ Delimiter    │
/// │ (fixed size per stream) │ (1B, "\n")   │
/// └─────────────────────────┴──────────────┘
/// ```
#[cfg(test)]
pub(crate) fn encode_frame(payload: &[u8], delimiter: Option<u8>, dst: &mut BytesMut) {
    use bytes::BufMut;

    dst.reserve(payload.len() + usize::from(delimiter.is_some()));
    dst.put_slice(payload);
    if let Some(byte) = delimiter {
        dst.put_u8(byte);
    }
}

/// Decode one frame of `payload_len` bytes from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes (payload and delimiter) from the buffer.
pub fn decode_frame(
    src: &mut BytesMut,
    payload_len: usize,
    delimiter: Option<u8>,
) -> Result<Option<Bytes>> {
    let total = payload_len + usize::from(delimiter.is_some());
    if src.len() < total {
        return Ok(None); // Need more data
    }

    if let Some(expected) = delimiter {
        let found = src[payload_len];
        if found != expected {
            return Err(FrameError::InvalidDelimiter { expected, found });
        }
    }

    let payload = src.split_to(payload_len).freeze();
    if delimiter.is_some() {
        src.advance(1);
    }

    Ok(Some(payload))
}
