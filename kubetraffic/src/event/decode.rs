//! Fixed-layout decoding of the two ring buffer record kinds.
//!
//! Decoding is a pure function of the input bytes. Records shorter than the
//! layout are rejected; trailing bytes past the layout are ignored. No field
//! is range-checked.

use std::net::Ipv4Addr;

use kubetraffic_common::{
    connect_offsets, http_offsets, trim_nul, COMM_LEN, CONNECT_EVENT_LEN, HTTP_EVENT_LEN,
    METHOD_LEN, PATH_LEN,
};
use thiserror::Error;

use super::{ConnectionEvent, HttpRequestEvent};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("short sample ({got} bytes, want {want})")]
    ShortRecord { got: usize, want: usize },
}

/// Decode a 20-byte `ConnectEvent`. The address is read big-endian.
pub fn decode_connection_event(raw: &[u8]) -> Result<ConnectionEvent, DecodeError> {
    let raw = fixed(raw, CONNECT_EVENT_LEN)?;

    let daddr = u32::from_be_bytes(array(raw, connect_offsets::DADDR));
    let comm = field_str(&raw[connect_offsets::COMM..connect_offsets::COMM + COMM_LEN]);

    Ok(ConnectionEvent {
        destination: Ipv4Addr::from(daddr),
        comm,
    })
}

/// Decode a 104-byte `HttpEvent`. Numeric fields are read little-endian.
pub fn decode_http_event(raw: &[u8]) -> Result<HttpRequestEvent, DecodeError> {
    let raw = fixed(raw, HTTP_EVENT_LEN)?;

    use http_offsets::*;
    Ok(HttpRequestEvent {
        saddr: u32::from_le_bytes(array(raw, SADDR)),
        daddr: u32::from_le_bytes(array(raw, DADDR)),
        sport: u16::from_le_bytes(array(raw, SPORT)),
        dport: u16::from_le_bytes(array(raw, DPORT)),
        pid: u32::from_le_bytes(array(raw, PID)),
        comm: field_str(&raw[COMM..COMM + COMM_LEN]),
        method: field_str(&raw[METHOD..METHOD + METHOD_LEN]),
        path: field_str(&raw[PATH..PATH + PATH_LEN]),
    })
}

/// Cut `raw` down to exactly `want` bytes, or fail if it is shorter.
fn fixed(raw: &[u8], want: usize) -> Result<&[u8], DecodeError> {
    raw.get(..want).ok_or(DecodeError::ShortRecord {
        got: raw.len(),
        want,
    })
}

fn array<const N: usize>(raw: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[offset..offset + N]);
    out
}

fn field_str(field: &[u8]) -> String {
    String::from_utf8_lossy(trim_nul(field)).into_owned()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::event::display_addr;

    fn padded<const N: usize>(s: &str) -> [u8; N] {
        let mut out = [0u8; N];
        out[..s.len()].copy_from_slice(s.as_bytes());
        out
    }

    pub(crate) fn connect_record(addr: [u8; 4], comm: &str) -> Vec<u8> {
        let mut raw = Vec::with_capacity(CONNECT_EVENT_LEN);
        raw.extend_from_slice(&addr);
        raw.extend_from_slice(&padded::<COMM_LEN>(comm));
        raw
    }

    pub(crate) struct HttpRecord<'a> {
        pub saddr: u32,
        pub daddr: u32,
        pub sport: u16,
        pub dport: u16,
        pub pid: u32,
        pub comm: &'a str,
        pub method: &'a str,
        pub path: &'a str,
    }

    impl Default for HttpRecord<'_> {
        fn default() -> Self {
            Self {
                saddr: 0x0a00_0001,
                daddr: 0,
                sport: 51234,
                dport: 8080,
                pid: 4242,
                comm: "server",
                method: "GET",
                path: "/api/users",
            }
        }
    }

    impl HttpRecord<'_> {
        pub(crate) fn encode(&self) -> Vec<u8> {
            let mut raw = Vec::with_capacity(HTTP_EVENT_LEN);
            raw.extend_from_slice(&self.saddr.to_le_bytes());
            raw.extend_from_slice(&self.daddr.to_le_bytes());
            raw.extend_from_slice(&self.sport.to_le_bytes());
            raw.extend_from_slice(&self.dport.to_le_bytes());
            raw.extend_from_slice(&self.pid.to_le_bytes());
            raw.extend_from_slice(&padded::<COMM_LEN>(self.comm));
            raw.extend_from_slice(&padded::<METHOD_LEN>(self.method));
            raw.extend_from_slice(&padded::<PATH_LEN>(self.path));
            raw
        }
    }

    #[test]
    fn connection_event_fields() {
        let event = decode_connection_event(&connect_record([10, 0, 0, 5], "myapp")).unwrap();
        assert_eq!(event.destination, Ipv4Addr::new(10, 0, 0, 5));
        assert_eq!(event.comm, "myapp");
    }

    #[test]
    fn connection_comm_without_terminator_uses_full_width() {
        let raw = connect_record([127, 0, 0, 1], "0123456789abcdef");
        let event = decode_connection_event(&raw).unwrap();
        assert_eq!(event.comm, "0123456789abcdef");
    }

    #[test]
    fn connection_comm_stops_at_first_nul() {
        let mut raw = connect_record([127, 0, 0, 1], "ab");
        raw[7] = b'z';
        let event = decode_connection_event(&raw).unwrap();
        assert_eq!(event.comm, "ab");
    }

    #[test]
    fn short_records_are_rejected() {
        for len in [0, 1, 4, 19] {
            let raw = vec![0u8; len];
            assert_eq!(
                decode_connection_event(&raw),
                Err(DecodeError::ShortRecord { got: len, want: 20 })
            );
        }
        for len in [0, 20, 103] {
            let raw = vec![0u8; len];
            assert_eq!(
                decode_http_event(&raw),
                Err(DecodeError::ShortRecord { got: len, want: 104 })
            );
        }
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        let mut raw = connect_record([192, 168, 1, 1], "curl");
        raw.extend_from_slice(b"trailing garbage");
        let event = decode_connection_event(&raw).unwrap();
        assert_eq!(event.destination, Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(event.comm, "curl");
    }

    #[test]
    fn http_event_fields() {
        let raw = HttpRecord {
            daddr: 0x0a00_0063,
            method: "POST",
            path: "/v1/orders?id=7",
            ..Default::default()
        }
        .encode();
        let event = decode_http_event(&raw).unwrap();

        assert_eq!(event.saddr, 0x0a00_0001);
        assert_eq!(event.daddr, 0x0a00_0063);
        assert_eq!(event.sport, 51234);
        assert_eq!(event.dport, 8080);
        assert_eq!(event.pid, 4242);
        assert_eq!(event.comm, "server");
        assert_eq!(event.method, "POST");
        assert_eq!(event.path, "/v1/orders?id=7");
    }

    #[test]
    fn http_addresses_display_big_endian() {
        // Stored LE as 01 00 00 0a, displayed most significant byte first.
        let raw = HttpRecord::default().encode();
        assert_eq!(&raw[0..4], &[0x01, 0x00, 0x00, 0x0a]);
        let event = decode_http_event(&raw).unwrap();
        assert_eq!(event.source_ip().to_string(), "10.0.0.1");
        assert_eq!(event.destination_ip().to_string(), "0.0.0.0");
    }

    #[test]
    fn http_path_fills_whole_field() {
        let long = "/".repeat(PATH_LEN);
        let raw = HttpRecord {
            path: &long,
            ..Default::default()
        }
        .encode();
        let event = decode_http_event(&raw).unwrap();
        assert_eq!(event.path.len(), PATH_LEN);
    }

    #[test]
    fn display_addr_cases() {
        assert_eq!(display_addr(0x7f00_0001).to_string(), "127.0.0.1");
        assert_eq!(display_addr(0xc0a8_0101).to_string(), "192.168.1.1");
        assert_eq!(display_addr(0).to_string(), "0.0.0.0");
    }
}
