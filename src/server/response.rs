use std::{
    fmt::Display,
    io::{Result as IoResult, Write},
};

use crate::request::SUPPORTED_VERSION;

/// The statuses this server can emit
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StatusCode {
    OK,
    Created,
    BadRequest,
    Forbidden,
    NotFound,
    InternalServerError,
    NotImplemented,
    VersionNotSupported,
}

impl StatusCode {
    pub fn to_code(&self) -> u16 {
        match self {
            Self::OK => 200,
            Self::Created => 201,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::InternalServerError => 500,
            Self::NotImplemented => 501,
            Self::VersionNotSupported => 505,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            Self::OK => "OK",
            Self::Created => "Created",
            Self::BadRequest => "Bad Request",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not Found",
            Self::InternalServerError => "Internal Server Error",
            Self::NotImplemented => "Not Implemented",
            Self::VersionNotSupported => "Version Not Supported",
        }
    }

    /// Body sent along with the status when no file content is being served
    pub fn message(&self) -> String {
        format!("{}\n", self.reason())
    }
}

impl Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0} {1}", self.to_code(), self.reason())
    }
}

/// The status and the length of the body that follows it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub content_length: u64,
}

impl Response {
    pub fn new(status: StatusCode, content_length: u64) -> Self {
        Self {
            status,
            content_length,
        }
    }

    /// Writes the status line, the Content-Length header and the blank line.
    /// The body itself is written separately by the caller.
    pub fn write_head<W: Write>(&self, stream: &mut W) -> IoResult<()> {
        let head = format!(
            "{SUPPORTED_VERSION} {0}\r\nContent-Length: {1}\r\n\r\n",
            self.status, self.content_length
        );
        stream.write_all(head.as_bytes())
    }
}

impl Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{0} ({1} bytes)", self.status, self.content_length)
    }
}

/// Sends a complete response whose body is a short in-memory message
pub fn send_message<W: Write>(stream: &mut W, status: StatusCode, body: &[u8]) -> IoResult<()> {
    Response::new(status, body.len() as u64).write_head(stream)?;
    stream.write_all(body)?;
    stream.flush()
}

/// Sends `status` with its reason phrase as the body
pub fn send_error_response<W: Write>(stream: &mut W, status: StatusCode) -> IoResult<()> {
    send_message(stream, status, status.message().as_bytes())
}
