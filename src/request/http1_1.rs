use log::debug;
use regex::bytes::Regex;
use std::sync::LazyLock;

use super::types::*;

// See https://www.rfc-editor.org/rfc/rfc9112#name-request-line
// Targets are a single path segment, so no '/' may follow the leading one
static REQUEST_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z]{0,8}) /([a-zA-Z0-9._]{1,63}) (HTTP/[0-9]\.[0-9])\r\n")
        .expect("The request line regex should compile")
});

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([a-zA-Z0-9.-]{1,128}): ([ -~]{0,128})\r\n")
        .expect("The header regex should compile")
});

static BODY_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ -~]*").expect("The body regex should compile"));

static CONTENT_LENGTH: &[u8] = b"Content-Length";

pub fn parse_request_line(buffer: &RequestBuffer) -> Result<RequestLine, RequestError> {
    let captures = REQUEST_LINE
        .captures(buffer.filled())
        .ok_or(RequestError::Malformed("Invalid request line"))?;

    let span = |i: usize| {
        captures
            .get(i)
            .map(|m| Span::new(m.start(), m.len()))
            .unwrap_or_default()
    };
    let version = span(3);

    Ok(RequestLine {
        method: span(1),
        target: span(2),
        version,
        length: version.end() + 2,
    })
}

/// Leading whitespace and a sign are accepted and parsing stops at the first
/// non-digit. Anything unparseable or overflowing is 0.
fn parse_content_length(value: &[u8]) -> i64 {
    let trimmed = value.trim_ascii_start();
    let (sign, digits) = match trimmed.split_first() {
        Some((b'-', rest)) => (-1, rest),
        Some((b'+', rest)) => (1, rest),
        _ => (1, trimmed),
    };

    digits
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .try_fold(0i64, |acc, d| {
            acc.checked_mul(10)?.checked_add(i64::from(d - b'0'))
        })
        .map_or(0, |n| sign * n)
}

/// Scans `KEY: VALUE\r\n` lines starting at `start` until one fails to match,
/// which is taken to be the blank line ending the header block.
pub fn parse_headers(buffer: &RequestBuffer, start: usize) -> HeaderBlock {
    let bytes = buffer.filled();
    let start = start.min(bytes.len());
    let mut pos = start;
    let mut content_length = None;

    while let Some(captures) = HEADER.captures(&bytes[pos..]) {
        let (Some(whole), Some(key), Some(value)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            break;
        };

        if content_length.is_none() && key.as_bytes() == CONTENT_LENGTH {
            content_length = Some(parse_content_length(value.as_bytes()));
        }
        pos += whole.end();
    }

    HeaderBlock {
        length: pos - start + 2,
        content_length: content_length.unwrap_or(0),
    }
}

/// Captures the printable bytes already buffered after the header block.
/// The fragment never extends past `content_length`.
pub fn extract_body_fragment(buffer: &RequestBuffer, offset: usize, content_length: i64) -> Span {
    let bytes = buffer.filled();
    let offset = offset.min(bytes.len());
    let matched = BODY_FRAGMENT
        .find(&bytes[offset..])
        .map_or(0, |m| m.len());
    let limit = usize::try_from(content_length).unwrap_or(0);

    Span::new(offset, matched.min(limit))
}

/// Runs the line parser, header parser and (for PUT) the body fragment extractor
pub fn parse_request(buffer: &RequestBuffer) -> Result<ParsedRequest<'_>, RequestError> {
    let line = parse_request_line(buffer)?;
    let headers = parse_headers(buffer, line.length);

    let body_fragment = (buffer.view(line.method) == b"PUT").then(|| {
        extract_body_fragment(buffer, line.length + headers.length, headers.content_length)
    });

    let request = ParsedRequest::new(buffer, line, headers, body_fragment);
    debug!(
        target: "connection",
        "Parsed {0} /{1} {2} (Content-Length: {3}, {4} body bytes buffered)",
        request.method(),
        request.target(),
        request.version(),
        request.content_length(),
        request.body_fragment().len()
    );
    Ok(request)
}
