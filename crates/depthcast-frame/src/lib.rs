//! Delimiter framing for fixed-size sensor payloads.
//!
//! Every message on a depthcast channel is the raw payload followed by one
//! delimiter byte (ASCII newline by default):
//! - no magic, no length prefix, no checksum
//! - payload sizes are fixed per stream and known to the receiver out of band
//! - the delimiter can be switched off for receivers that do not expect it
//!
//! Writers never buffer between messages and never retry a failed write.

pub mod codec;
pub mod error;
pub mod reader;
pub mod writer;

pub use codec::{decode_frame, FrameConfig, DEFAULT_DELIMITER};
pub use error::{FrameError, Result};
pub use reader::FrameReader;
pub use writer::{FrameWriter, WriterStats};
