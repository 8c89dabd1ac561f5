//! Blocking TCP transport primitives.
//!
//! Provides the lowest layer of depthcast: name resolution, connect-to-first
//! accepting address, and the [`ChannelStream`] type every higher layer writes
//! to. A listener is included so receivers and tests can bind the other end.
//!
//! There are no timeouts, no reconnects and no buffering here. A failure is
//! reported once and the caller decides what happens next.

pub mod error;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use stream::ChannelStream;
pub use tcp::{connect, resolve, TcpTransport};
