use std::fs::{File, OpenOptions};
use std::io::{Error as IoError, ErrorKind, Read, Write};
#[cfg(unix)]
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use log::{debug, error, warn};

use crate::request::{ParsedRequest, RequestError, BUFF_SIZE};
use crate::server::response::{self, Response, StatusCode};

// errno values shared by Linux and the BSDs for descriptor table exhaustion
const ENFILE: i32 = 23;
const EMFILE: i32 = 24;

// Operation not supported. ENOSYS, which std also reports as
// `ErrorKind::Unsupported`, must not land here.
#[cfg(any(target_os = "linux", target_os = "android"))]
const EOPNOTSUPP: i32 = 95;
#[cfg(not(any(target_os = "linux", target_os = "android")))]
const EOPNOTSUPP: i32 = 45;

/// Permissions for files created by PUT
#[cfg(unix)]
const CREATED_FILE_MODE: u32 = 0o644;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Access {
    Read,
    Write,
}

/// Maps a failed `open` onto the error reported to the client
fn classify_open_error(err: &IoError, target: &str, access: Access) -> RequestError {
    if matches!(err.raw_os_error(), Some(ENFILE | EMFILE)) {
        return RequestError::ResourceExhausted(format!("no descriptors left to open {target}"));
    }
    if err.raw_os_error() == Some(EOPNOTSUPP) {
        return RequestError::Forbidden(target.to_string());
    }

    match (err.kind(), access) {
        (
            ErrorKind::PermissionDenied | ErrorKind::IsADirectory | ErrorKind::ReadOnlyFilesystem,
            _,
        ) => RequestError::Forbidden(target.to_string()),
        (ErrorKind::OutOfMemory, _) => {
            RequestError::ResourceExhausted(format!("out of memory opening {target}"))
        }
        (ErrorKind::StorageFull | ErrorKind::QuotaExceeded, Access::Write) => {
            RequestError::ResourceExhausted(format!("no space left to write {target}"))
        }
        (ErrorKind::InvalidInput, Access::Write) => {
            RequestError::InvalidArgument(target.to_string())
        }
        _ => RequestError::NotFound(target.to_string()),
    }
}

fn log_open_error(err: &IoError, classified: &RequestError) {
    match classified {
        RequestError::ResourceExhausted(_) => error!(target: "connection", "{classified}: {err}"),
        _ => debug!(target: "connection", "{classified}: {err}"),
    }
}

/// The grammar already rules out nested paths; this keeps the current and
/// parent directory out of reach as well
fn is_dot_segment(target: &str) -> bool {
    matches!(target, "." | "..")
}

/// Checks that `file` is a regular file, returning its size
fn check_regular_file(file: &File, target: &str) -> Result<u64, RequestError> {
    let metadata = file
        .metadata()
        .map_err(|err| RequestError::Internal(format!("could not stat {target}: {err}")))?;

    if !metadata.is_file() {
        return Err(RequestError::Forbidden(target.to_string()));
    }
    Ok(metadata.len())
}

/// Copies exactly `length` bytes from `file` to `stream` in chunks of at most `BUFF_SIZE`
fn stream_file<W: Write>(
    file: &mut File,
    stream: &mut W,
    length: u64,
) -> Result<(), RequestError> {
    let mut chunk = [0u8; BUFF_SIZE];
    let mut sent: u64 = 0;

    while sent < length {
        let wanted = (length - sent).min(BUFF_SIZE as u64) as usize;
        let n = match file.read(&mut chunk[..wanted]) {
            Ok(0) => {
                return Err(RequestError::Transport(IoError::new(
                    ErrorKind::UnexpectedEof,
                    format!("file ended after {sent} of {length} bytes"),
                )))
            }
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(RequestError::Transport(err)),
        };

        stream
            .write_all(&chunk[..n])
            .map_err(RequestError::Transport)?;
        sent += n as u64;
    }

    stream.flush().map_err(RequestError::Transport)
}

/// Serves `target` from `root`. On success the full response has already been written.
pub fn get<W: Write>(
    stream: &mut W,
    request: &ParsedRequest<'_>,
    root: &Path,
) -> Result<Response, RequestError> {
    let target = request.target();

    let mut file = File::open(root.join(target)).map_err(|err| {
        let classified = classify_open_error(&err, target, Access::Read);
        log_open_error(&err, &classified);
        classified
    })?;

    if is_dot_segment(target) {
        return Err(RequestError::Forbidden(target.to_string()));
    }

    let length = check_regular_file(&file, target)?;

    let response = Response::new(StatusCode::OK, length);
    response
        .write_head(stream)
        .map_err(RequestError::Transport)?;

    stream_file(&mut file, stream, length).inspect_err(|err| {
        warn!(target: "connection", "Aborted GET /{target} mid-stream: {err}")
    })?;

    Ok(response)
}

/// Writes `fragment` to `sink`, then copies from `stream` until `content_length`
/// bytes have been written in total. Running short of body bytes or failing to
/// write is an internal error.
fn receive_body<S: Read, F: Write>(
    stream: &mut S,
    sink: &mut F,
    fragment: &[u8],
    content_length: u64,
    target: &str,
) -> Result<(), RequestError> {
    let write_failed =
        |err: IoError| RequestError::Internal(format!("could not write to {target}: {err}"));

    sink.write_all(fragment).map_err(write_failed)?;

    let mut remaining = content_length.saturating_sub(fragment.len() as u64);
    let mut chunk = [0u8; BUFF_SIZE];

    while remaining > 0 {
        let wanted = remaining.min(BUFF_SIZE as u64) as usize;
        let n = match stream.read(&mut chunk[..wanted]) {
            Ok(0) => {
                return Err(RequestError::Internal(format!(
                    "peer closed with {remaining} body bytes outstanding"
                )))
            }
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(RequestError::Internal(format!(
                    "could not read body for {target}: {err}"
                )))
            }
        };

        sink.write_all(&chunk[..n]).map_err(write_failed)?;
        remaining -= n as u64;
    }

    sink.flush().map_err(write_failed)
}

/// Writes the request body to `target` in `root`, replacing any existing contents.
///
/// The body is whatever was buffered with the request head, followed by reads
/// from `stream` until `Content-Length` bytes have been written.
pub fn put<S: Read + Write>(
    stream: &mut S,
    request: &ParsedRequest<'_>,
    root: &Path,
) -> Result<Response, RequestError> {
    let target = request.target();
    let path = root.join(target);

    let status = if path.try_exists().unwrap_or(false) {
        StatusCode::OK
    } else {
        StatusCode::Created
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(CREATED_FILE_MODE);

    let mut file = options.open(&path).map_err(|err| {
        let classified = classify_open_error(&err, target, Access::Write);
        log_open_error(&err, &classified);
        classified
    })?;

    // Opening "." or ".." for writing fails with EISDIR above, so this only
    // guards platforms where that open could succeed
    if is_dot_segment(target) {
        return Err(RequestError::Forbidden(target.to_string()));
    }

    check_regular_file(&file, target)?;

    let content_length = u64::try_from(request.content_length())
        .map_err(|_| RequestError::Malformed("PUT requires a positive Content-Length"))?;
    receive_body(
        stream,
        &mut file,
        request.body_fragment(),
        content_length,
        target,
    )?;

    let body: &[u8] = match status {
        StatusCode::Created => b"Created\n",
        _ => b"OK\n",
    };
    response::send_message(stream, status, body).map_err(RequestError::Transport)?;

    Ok(Response::new(status, body.len() as u64))
}
