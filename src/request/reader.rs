use std::io::{ErrorKind, Read};

use log::debug;

use super::types::{RequestBuffer, RequestError, BUFF_SIZE, HEADER_TERMINATOR};

fn contains_terminator(haystack: &[u8]) -> bool {
    haystack
        .windows(HEADER_TERMINATOR.len())
        .any(|w| w == HEADER_TERMINATOR)
}

/// Fills `buffer` from `stream` until the header terminator has been read.
/// Bytes that arrive after the terminator in the same read stay in the buffer.
///
/// Returns the number of bytes read. Running out of space, a disconnect or a
/// read error all mean the request is malformed.
pub fn read_request<R: Read>(
    stream: &mut R,
    buffer: &mut RequestBuffer,
) -> Result<usize, RequestError> {
    loop {
        if buffer.len() >= BUFF_SIZE {
            return Err(RequestError::Malformed("Request head does not fit in the buffer"));
        }

        let n = match stream.read(buffer.spare_mut()) {
            Ok(0) => {
                return Err(RequestError::Malformed(
                    "Peer disconnected before the end of the request head",
                ))
            }
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                debug!(target: "connection", "Reading the request head failed: {err}");
                return Err(RequestError::Malformed("Could not read the request head"));
            }
        };

        // The terminator may straddle two reads
        let search_from = buffer.len().saturating_sub(HEADER_TERMINATOR.len() - 1);
        buffer.advance(n);

        if contains_terminator(&buffer.filled()[search_from..]) {
            return Ok(buffer.len());
        }
    }
}
