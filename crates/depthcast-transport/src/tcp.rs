use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::stream::ChannelStream;

/// Resolve `host:port` to every candidate socket address, IPv4 and IPv6 alike.
///
/// Literal addresses (including bare IPv6 such as `::1`) resolve without a
/// name lookup. An empty result is reported as a resolution failure.
pub fn resolve(host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let target = format!("{host}:{port}");
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            target: target.clone(),
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(TransportError::Resolve {
            target,
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "name resolved to no addresses",
            ),
        });
    }

    debug!(%target, candidates = addrs.len(), "resolved target");
    Ok(addrs)
}

/// Connect to the first resolved address of `host:port` that accepts (blocking).
///
/// Candidates are tried in resolver order. Each refusal is logged and the next
/// candidate tried; there is no timeout and no retry of a candidate.
pub fn connect(host: &str, port: u16) -> Result<ChannelStream> {
    let addrs = resolve(host, port)?;
    let target = format!("{host}:{port}");

    let mut last_err = None;
    for addr in &addrs {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                info!(%addr, "connected");
                return Ok(ChannelStream::from_tcp(stream, *addr));
            }
            Err(err) => {
                warn!(%addr, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    let source = last_err.unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::NotFound, "no candidate addresses")
    });
    Err(TransportError::connect(&target, addrs.len(), source))
}

/// Listening side of the transport.
///
/// The pipeline itself only ever connects out; receivers and tests bind here.
pub struct TcpTransport {
    listener: TcpListener,
    local: SocketAddr,
}

impl TcpTransport {
    /// Bind and listen on `addr` (e.g. `127.0.0.1:3490`, or port 0 for ephemeral).
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        let local = listener.local_addr().map_err(|source| TransportError::Bind {
            addr: addr.to_string(),
            source,
        })?;

        info!(%local, "listening");
        Ok(Self { listener, local })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<ChannelStream> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        Ok(ChannelStream::from_tcp(stream, peer))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// The bound port.
    pub fn port(&self) -> u16 {
        self.local.port()
    }
}
