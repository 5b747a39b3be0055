//! GNTP response parser.

use crate::command::VERSION;
use crate::error::{Error, Result};
use crate::types::{ErrorCode, Response};

/// Parses a GNTP response from its lines, without the terminating empty line.
///
/// ```text
/// GNTP/1.0 -OK NONE
/// Response-Action: NOTIFY
/// ```
///
/// # Errors
///
/// Returns [`Error::Server`] for an `-ERROR` response and
/// [`Error::Protocol`] if the response is malformed.
pub fn parse_response(lines: &[String]) -> Result<Response> {
    let Some((info, rest)) = lines.split_first() else {
        return Err(Error::Protocol("Empty response".into()));
    };

    let mut parts = info.split_whitespace();
    let (Some(version), Some(directive)) = (parts.next(), parts.next()) else {
        return Err(Error::Protocol(format!("Malformed information line: {info}")));
    };
    if !version.eq_ignore_ascii_case(VERSION) {
        return Err(Error::Protocol(format!("Unsupported version: {version}")));
    }

    let headers = rest
        .iter()
        .map(|line| {
            line.split_once(':')
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| Error::Protocol(format!("Malformed header: {line}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let response = Response {
        action: None,
        headers,
    };

    match directive {
        "-OK" => Ok(Response {
            action: response.header("Response-Action").map(str::to_string),
            ..response
        }),
        "-ERROR" => {
            let code = response
                .header("Error-Code")
                .and_then(|code| code.parse::<u16>().ok())
                .map(ErrorCode::new)
                .ok_or_else(|| Error::Protocol("Missing or invalid Error-Code".into()))?;
            let description = response
                .header("Error-Description")
                .unwrap_or_default()
                .to_string();
            Err(Error::Server { code, description })
        }
        other => Err(Error::Protocol(format!("Unexpected directive: {other}"))),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_ok() {
        let response =
            parse_response(&lines(&["GNTP/1.0 -OK NONE", "Response-Action: REGISTER"])).unwrap();
        assert_eq!(response.action.as_deref(), Some("REGISTER"));
        assert_eq!(response.header("response-action"), Some("REGISTER"));
    }

    #[test]
    fn test_parse_ok_without_headers() {
        let response = parse_response(&lines(&["GNTP/1.0 -OK NONE"])).unwrap();
        assert_eq!(response.action, None);
        assert!(response.headers.is_empty());
    }

    #[test]
    fn test_parse_error() {
        let err = parse_response(&lines(&[
            "GNTP/1.0 -ERROR NONE",
            "Response-Action: NOTIFY",
            "Error-Code: 401",
            "Error-Description: Application not registered",
        ]))
        .unwrap_err();
        match err {
            Error::Server { code, description } => {
                assert_eq!(code, ErrorCode::UNKNOWN_APPLICATION);
                assert_eq!(description, "Application not registered");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_error_without_code() {
        let err = parse_response(&lines(&["GNTP/1.0 -ERROR NONE"])).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_response(&[]).unwrap_err().is_protocol());
    }

    #[test]
    fn test_parse_wrong_protocol() {
        let err = parse_response(&lines(&["HTTP/1.1 200 OK"])).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_parse_unknown_directive() {
        let err = parse_response(&lines(&["GNTP/1.0 -CALLBACK NONE"])).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_parse_bad_header() {
        let err = parse_response(&lines(&["GNTP/1.0 -OK NONE", "garbage"])).unwrap_err();
        assert!(err.is_protocol());
    }
}
