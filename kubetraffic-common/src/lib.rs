#![cfg_attr(not(test), no_std)]

use core::mem::size_of;

/// Width of the kernel `comm` field.
pub const COMM_LEN: usize = 16;
/// Width of the HTTP method field captured by the request probe.
pub const METHOD_LEN: usize = 8;
/// Width of the HTTP path field; the probe truncates longer paths.
pub const PATH_LEN: usize = 64;

/// Outbound TCP connection, emitted from the `tcp_v4_connect` kprobe.
///
/// `daddr` is written straight from `sk->__sk_common.skc_daddr`, so its
/// bytes are in network order regardless of host endianness.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ConnectEvent {
    /// Destination IPv4 address (network byte order)
    pub daddr: u32,
    /// Process name (comm), null-terminated unless it fills the field
    pub comm: [u8; COMM_LEN],
}

/// Observed HTTP request line, emitted by the L7 probe.
///
/// Numeric fields are stored little-endian by the probe.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HttpEvent {
    /// Client IPv4 address
    pub saddr: u32,
    /// Local IPv4 address, zero when the probe could not recover it
    pub daddr: u32,
    pub sport: u16,
    pub dport: u16,
    pub pid: u32,
    pub comm: [u8; COMM_LEN],
    pub method: [u8; METHOD_LEN],
    /// Request path, depth limited by the probe
    pub path: [u8; PATH_LEN],
}

pub const CONNECT_EVENT_LEN: usize = size_of::<ConnectEvent>();
pub const HTTP_EVENT_LEN: usize = size_of::<HttpEvent>();

const _: () = assert!(CONNECT_EVENT_LEN == 20);
const _: () = assert!(HTTP_EVENT_LEN == 104);

/// Byte offsets of each `HttpEvent` field inside a raw record.
pub mod http_offsets {
    pub const SADDR: usize = 0;
    pub const DADDR: usize = 4;
    pub const SPORT: usize = 8;
    pub const DPORT: usize = 10;
    pub const PID: usize = 12;
    pub const COMM: usize = 16;
    pub const METHOD: usize = 32;
    pub const PATH: usize = 40;
}

/// Byte offsets of each `ConnectEvent` field inside a raw record.
pub mod connect_offsets {
    pub const DADDR: usize = 0;
    pub const COMM: usize = 4;
}

/// Return the bytes of a fixed-width string field up to the first NUL, or
/// the whole field when no terminator is present.
#[inline]
pub fn trim_nul(field: &[u8]) -> &[u8] {
    let nul = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..nul]
}
