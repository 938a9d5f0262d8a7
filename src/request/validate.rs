use log::debug;

use super::types::{ParsedRequest, RequestError, SUPPORTED_VERSION};

/// Checks the version, then that a PUT declares a body.
/// The method itself is checked when the request is dispatched.
pub fn validate(request: &ParsedRequest<'_>) -> Result<(), RequestError> {
    if request.version() != SUPPORTED_VERSION {
        return Err(RequestError::UnsupportedVersion(request.version().to_string()));
    }

    if request.method() == "PUT" && request.content_length() <= 0 {
        debug!(
            target: "connection",
            "Rejecting PUT /{0} with Content-Length {1}",
            request.target(),
            request.content_length()
        );
        return Err(RequestError::Malformed("PUT requires a positive Content-Length"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{parse_request, RequestBuffer};
    use crate::server::response::StatusCode;

    fn check(raw: &str) -> Result<(), RequestError> {
        let buffer = RequestBuffer::from(raw.as_bytes());
        let request = parse_request(&buffer).expect("The request should parse");
        validate(&request)
    }

    #[test]
    fn valid_get() {
        check("GET /a HTTP/1.1\r\n\r\n").expect("A plain GET should be valid");
    }

    #[test]
    fn get_ignores_content_length() {
        check("GET /a HTTP/1.1\r\nContent-Length: -1\r\n\r\n")
            .expect("GET has no body length requirement");
    }

    #[test]
    fn valid_put() {
        check("PUT /a HTTP/1.1\r\nContent-Length: 3\r\n\r\nxyz")
            .expect("PUT with a body should be valid");
    }

    #[test]
    fn wrong_version() {
        for version in ["HTTP/1.0", "HTTP/2.0", "HTTP/0.9"] {
            let err = check(&format!("GET /a {version}\r\n\r\n"))
                .expect_err("Only HTTP/1.1 should be accepted");
            assert_eq!(Some(StatusCode::VersionNotSupported), err.status());
        }
    }

    #[test]
    fn version_checked_before_content_length() {
        let err = check("PUT /a HTTP/1.0\r\n\r\n").expect_err("The request should be rejected");
        assert!(matches!(err, RequestError::UnsupportedVersion(_)));
    }

    #[test]
    fn version_checked_for_unsupported_methods() {
        let err = check("DELETE /a HTTP/1.0\r\n\r\n").expect_err("The request should be rejected");
        assert_eq!(Some(StatusCode::VersionNotSupported), err.status());
    }

    #[test]
    fn put_without_content_length() {
        let err = check("PUT /a HTTP/1.1\r\n\r\n").expect_err("PUT without a body should fail");
        assert_eq!(Some(StatusCode::BadRequest), err.status());
    }

    #[test]
    fn put_with_non_positive_content_length() {
        for length in ["0", "-3", "abc"] {
            let err = check(&format!("PUT /a HTTP/1.1\r\nContent-Length: {length}\r\n\r\n"))
                .expect_err("PUT with an empty body should fail");
            assert_eq!(Some(StatusCode::BadRequest), err.status());
        }
    }

    #[test]
    fn unsupported_method_passes_validation() {
        check("POST /a HTTP/1.1\r\n\r\n")
            .expect("Unsupported methods are rejected by the dispatcher");
    }
}
