//! Status line tokenizer: `HTTP-version SP status-code [SP reason-phrase]`.

use bytes::Bytes;
use http::{StatusCode, Version};

use crate::ensure;
use crate::protocol::{ParseError, StatusLine};

/// Parses a status line with its terminator already removed.
///
/// The reason phrase may be empty, and the space before it may be missing
/// altogether; both are common with CGI style backends. Reason bytes are
/// `HTAB / SP / VCHAR / obs-text`.
pub fn parse_status_line(line: &[u8]) -> Result<StatusLine, ParseError> {
    let (version, status) = match line.iter().position(|b| *b == b' ') {
        Some(at) => (&line[..at], &line[at + 1..]),
        None => return Err(ParseError::malformed_status_line(format!("missing status code in {:?}", line.escape_ascii().to_string()))),
    };

    let version = match version {
        b"HTTP/1.1" => Version::HTTP_11,
        b"HTTP/1.0" => Version::HTTP_10,
        _ => {
            return Err(ParseError::malformed_status_line(format!(
                "unsupported protocol version {:?}",
                version.escape_ascii().to_string()
            )));
        }
    };

    let invalid_code = || ParseError::malformed_status_line(format!("invalid status code in {:?}", status.escape_ascii().to_string()));
    ensure!(status.len() >= 3 && status[..3].iter().all(u8::is_ascii_digit), invalid_code());
    ensure!(status.len() == 3 || status[3] == b' ', invalid_code());

    let code = StatusCode::from_bytes(&status[..3]).map_err(|e| ParseError::malformed_status_line(format!("{e}: {:?}", status.escape_ascii().to_string())))?;

    let reason = status.get(4..).unwrap_or_default();
    ensure!(
        reason.iter().all(|b| *b == b'\t' || (*b >= 0x20 && *b != 0x7f)),
        ParseError::malformed_status_line("reason phrase contains control characters")
    );

    Ok(StatusLine::new(version, code, Bytes::copy_from_slice(status)))
}
