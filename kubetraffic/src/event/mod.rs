pub mod decode;

use std::net::Ipv4Addr;

pub use decode::{decode_connection_event, decode_http_event, DecodeError};

/// One record as pulled off a ring buffer, owned for a single loop iteration.
pub type RawRecord = Vec<u8>;

/// Outbound TCP connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionEvent {
    pub destination: Ipv4Addr,
    pub comm: String,
}

/// HTTP request observed on a server socket.
///
/// The raw little-endian address values are kept alongside the display form
/// because the zero check on `daddr` is made against the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequestEvent {
    pub saddr: u32,
    pub daddr: u32,
    pub sport: u16,
    pub dport: u16,
    pub pid: u32,
    pub comm: String,
    pub method: String,
    pub path: String,
}

impl HttpRequestEvent {
    /// Client address as displayed in labels.
    pub fn source_ip(&self) -> Ipv4Addr {
        display_addr(self.saddr)
    }

    pub fn destination_ip(&self) -> Ipv4Addr {
        display_addr(self.daddr)
    }
}

/// Render a stored address most significant byte first.
///
/// The request probe stores addresses little-endian, so this is not the
/// wire order. Label values depend on this exact rendering.
pub fn display_addr(addr: u32) -> Ipv4Addr {
    Ipv4Addr::from(addr)
}
