use std::{
    io::{Read, Write},
    path::Path,
    str::FromStr,
};

use log::{debug, info, warn};

use crate::request::{self, Method, RequestBuffer, RequestError};

use super::{
    handlers,
    response::{self, Response},
};

/// Reads, validates and executes a single request. The executors write their
/// own success responses; errors are returned for the caller to report.
fn process<S: Read + Write>(
    stream: &mut S,
    buffer: &mut RequestBuffer,
    root: &Path,
) -> Result<Response, RequestError> {
    request::read_request(stream, buffer)?;

    let request = request::parse_request(buffer)?;
    request::validate(&request)?;

    let response = match Method::from_str(request.method())? {
        Method::Get => handlers::get(stream, &request, root),
        Method::Put => handlers::put(stream, &request, root),
    }?;

    info!(
        target: "connection",
        "{0} /{1} -> {response}",
        request.method(),
        request.target()
    );
    Ok(response)
}

/// Handles everything sent over one connection. A failed request gets a
/// best-effort error response; the caller closes the stream afterwards.
pub fn handle_connection<S: Read + Write>(
    stream: &mut S,
    root: &Path,
) -> Result<Response, RequestError> {
    let mut buffer = RequestBuffer::new();
    let outcome = process(stream, &mut buffer, root);

    if let Err(err) = &outcome {
        match err.status() {
            Some(status) => {
                info!(target: "connection", "Request failed -> {status}");
                debug!(target: "connection", "{err}");
                let _ = response::send_error_response(stream, status).inspect_err(|send_err| {
                    warn!(target: "connection", "Could not send {status}: {send_err}")
                });
            }
            None => warn!(target: "connection", "Abandoning connection: {err}"),
        }
    }

    outcome
}
