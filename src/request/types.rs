use std::{fmt::Display, io::Error as IoError, str::FromStr};

use crate::server::response::StatusCode;

/// Usable bytes in a request buffer. One more byte is reserved for a terminator.
pub const BUFF_SIZE: usize = 8192;
pub const REQUEST_BUFFER_CAPACITY: usize = BUFF_SIZE + 1;

/// Marks the end of the request line and header block
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

pub const SUPPORTED_VERSION: &str = "HTTP/1.1";

/// Raw request bytes, filled once per connection by the request reader.
#[derive(Debug)]
pub struct RequestBuffer {
    bytes: Box<[u8; REQUEST_BUFFER_CAPACITY]>,
    len: usize,
}

impl RequestBuffer {
    pub fn new() -> Self {
        Self {
            bytes: Box::new([0; REQUEST_BUFFER_CAPACITY]),
            len: 0,
        }
    }

    /// The bytes read so far
    pub fn filled(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// The unfilled region available to readers, capped at `BUFF_SIZE`
    pub(crate) fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.bytes[self.len..BUFF_SIZE]
    }

    pub(crate) fn advance(&mut self, n: usize) {
        self.len = (self.len + n).min(BUFF_SIZE);
    }

    pub fn view(&self, span: Span) -> &[u8] {
        &self.filled()[span.start..span.end()]
    }

    /// Views are only created from regex matches over printable ASCII, so they are valid UTF-8
    pub fn view_str(&self, span: Span) -> &str {
        std::str::from_utf8(self.view(span)).unwrap_or_default()
    }
}

impl Default for RequestBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&[u8]> for RequestBuffer {
    fn from(raw: &[u8]) -> Self {
        let mut buffer = Self::new();
        let n = raw.len().min(BUFF_SIZE);
        buffer.spare_mut()[..n].copy_from_slice(&raw[..n]);
        buffer.advance(n);
        buffer
    }
}

/// An offset and length into a `RequestBuffer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Method {
    Get,
    Put,
}

impl FromStr for Method {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "PUT" => Ok(Method::Put),
            other => Err(RequestError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Put => write!(f, "PUT"),
        }
    }
}

/// Positions of the request line fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Span,
    pub target: Span,
    pub version: Span,
    /// Offset just past the CRLF ending the request line
    pub length: usize,
}

/// Result of scanning the header block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HeaderBlock {
    /// Distance from the end of the request line to the start of the body,
    /// including the blank line
    pub length: usize,
    pub content_length: i64,
}

/// A request whose fields are views into the buffer it was parsed from
#[derive(Debug)]
pub struct ParsedRequest<'buf> {
    buffer: &'buf RequestBuffer,
    pub line: RequestLine,
    pub headers: HeaderBlock,
    /// Body bytes that arrived with the header block. Only set for PUT.
    pub body_fragment: Option<Span>,
}

impl<'buf> ParsedRequest<'buf> {
    pub fn new(
        buffer: &'buf RequestBuffer,
        line: RequestLine,
        headers: HeaderBlock,
        body_fragment: Option<Span>,
    ) -> Self {
        Self {
            buffer,
            line,
            headers,
            body_fragment,
        }
    }

    pub fn method(&self) -> &'buf str {
        self.buffer.view_str(self.line.method)
    }

    pub fn target(&self) -> &'buf str {
        self.buffer.view_str(self.line.target)
    }

    pub fn version(&self) -> &'buf str {
        self.buffer.view_str(self.line.version)
    }

    pub fn request_line_length(&self) -> usize {
        self.line.length
    }

    pub fn header_block_length(&self) -> usize {
        self.headers.length
    }

    pub fn content_length(&self) -> i64 {
        self.headers.content_length
    }

    pub fn body_fragment(&self) -> &'buf [u8] {
        self.body_fragment
            .map(|span| self.buffer.view(span))
            .unwrap_or_default()
    }
}

#[derive(Debug)]
pub enum RequestError {
    /// Unparseable request line or header block, or an overflowing request
    Malformed(&'static str),
    UnsupportedVersion(String),
    Forbidden(String),
    NotFound(String),
    InvalidArgument(String),
    ResourceExhausted(String),
    Internal(String),
    UnsupportedMethod(String),
    /// The peer went away or a read/write failed mid-stream
    Transport(IoError),
}

impl RequestError {
    /// The status to report, or `None` when no response can be sent
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Malformed(_) | Self::InvalidArgument(_) => Some(StatusCode::BadRequest),
            Self::UnsupportedVersion(_) => Some(StatusCode::VersionNotSupported),
            Self::Forbidden(_) => Some(StatusCode::Forbidden),
            Self::NotFound(_) => Some(StatusCode::NotFound),
            Self::ResourceExhausted(_) | Self::Internal(_) => {
                Some(StatusCode::InternalServerError)
            }
            Self::UnsupportedMethod(_) => Some(StatusCode::NotImplemented),
            Self::Transport(_) => None,
        }
    }
}

impl Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "Malformed request: {reason}"),
            Self::UnsupportedVersion(version) => write!(f, "Unsupported version \"{version}\""),
            Self::Forbidden(target) => write!(f, "Access to \"{target}\" is forbidden"),
            Self::NotFound(target) => write!(f, "\"{target}\" could not be opened"),
            Self::InvalidArgument(target) => write!(f, "Invalid argument opening \"{target}\""),
            Self::ResourceExhausted(reason) => write!(f, "Out of resources: {reason}"),
            Self::Internal(reason) => write!(f, "Internal error: {reason}"),
            Self::UnsupportedMethod(method) => write!(f, "Method \"{method}\" is not implemented"),
            Self::Transport(err) => write!(f, "Transport failure: {err}"),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(err) => Some(err),
            _ => None,
        }
    }
}
