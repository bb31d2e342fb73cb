//! Unified error type.

use std::fmt;
use std::net::AddrParseError;

/// The error type returned by the server's fallible operations.
///
/// Application-level failures are HTTP [`Response`](crate::Response) values,
/// not `Error`s. Middleware such as
/// [`ContextInjector`](crate::middleware::ContextInjector) never produces one
/// either: it hands back whatever the downstream handler returned.
#[derive(Debug)]
pub enum Error {
    /// `Server::bind` was given something that is not `host:port`.
    Addr(AddrParseError),
    /// Binding the listener or reading its local address failed.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Addr(e) => write!(f, "invalid socket address: {e}"),
            Self::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Addr(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<AddrParseError> for Error {
    fn from(e: AddrParseError) -> Self {
        Self::Addr(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}
