//! Server start-up failures.

use std::fmt;
use std::io;
use std::net::SocketAddr;

/// Why [`Server::serve`](crate::Server::serve) could not start.
///
/// Once the server is listening nothing is reported through this type:
/// unroutable requests, handler panics and broken connections all end as a
/// status code or a closed socket, and are logged.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// The listening socket could not be bound to `addr`.
    Bind { addr: SocketAddr, source: io::Error },
    /// The listener was bound but could not report its own address.
    LocalAddr(io::Error),
}

impl Error {
    /// The underlying socket error.
    pub fn io(&self) -> &io::Error {
        match self {
            Self::Bind { source, .. } | Self::LocalAddr(source) => source,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind { addr, source } => write!(f, "cannot bind {addr}: {source}"),
            Self::LocalAddr(source) => write!(f, "cannot read listener address: {source}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.io())
    }
}
