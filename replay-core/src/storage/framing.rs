//! Length-prefixed packet framing.
//!
//! ```text
//! repeat:
//!   [4-byte LE payload size]
//!   [payload]
//! ```
//!
//! End of stream is end-of-data on a packet boundary. Anything else that
//! runs out of data mid-packet is a truncated stream.

use std::io::{self, Read, Write};

use crate::models::error::ReplayError;

pub const SIZE_PREFIX_LEN: usize = 4;

/// Largest payload accepted on read. A bigger size prefix means the stream is
/// not framed the way we expect and cannot be resynchronized.
pub const MAX_PACKET_SIZE: usize = 1 << 20;

/// Write one packet. Returns the number of bytes written, prefix included.
pub fn write_packet<W: Write + ?Sized>(writer: &mut W, payload: &[u8]) -> Result<u64, ReplayError> {
    if payload.len() > MAX_PACKET_SIZE {
        return Err(ReplayError::InvalidInput(format!(
            "packet of {} bytes exceeds the {} byte limit",
            payload.len(),
            MAX_PACKET_SIZE
        )));
    }

    let size = (payload.len() as u32).to_le_bytes();
    writer
        .write_all(&size)
        .map_err(|e| ReplayError::StoreIo(format!("write packet size: {}", e)))?;
    writer
        .write_all(payload)
        .map_err(|e| ReplayError::StoreIo(format!("write packet payload: {}", e)))?;

    Ok((SIZE_PREFIX_LEN + payload.len()) as u64)
}

/// Read one packet. `Ok(None)` means the stream ended cleanly on a packet boundary.
pub fn read_packet<R: Read + ?Sized>(reader: &mut R) -> Result<Option<Vec<u8>>, ReplayError> {
    let mut size = [0u8; SIZE_PREFIX_LEN];
    let got = read_full(reader, &mut size)?;
    if got == 0 {
        return Ok(None);
    }
    if got < SIZE_PREFIX_LEN {
        return Err(ReplayError::TruncatedStream {
            expected: SIZE_PREFIX_LEN,
            actual: got,
        });
    }

    let size = u32::from_le_bytes(size) as usize;
    if size > MAX_PACKET_SIZE {
        return Err(ReplayError::DecodeError(format!(
            "packet size {} exceeds the {} byte limit",
            size, MAX_PACKET_SIZE
        )));
    }

    let mut payload = vec![0u8; size];
    let got = read_full(reader, &mut payload)?;
    if got < size {
        return Err(ReplayError::TruncatedStream {
            expected: size,
            actual: got,
        });
    }

    Ok(Some(payload))
}

/// Fill `buf` as far as the reader allows. Returns the count read.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize, ReplayError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ReplayError::StoreIo(format!("read packet: {}", e))),
        }
    }
    Ok(filled)
}
