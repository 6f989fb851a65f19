//! Header line validation and body framing resolution.
//!
//! Header lines are checked one at a time as they arrive, so a malformed line
//! fails the response before the rest of the head is buffered. Once the blank
//! line is seen, [`resolve_body_kind`] decides how the body is delimited
//! following RFC 9112 section 6.3.

use bytes::Bytes;
use http::header::{CONTENT_LENGTH, TRANSFER_ENCODING};
use http::{HeaderName, HeaderValue, StatusCode};
use tracing::debug;

use crate::ensure;
use crate::protocol::{BodyKind, HeaderLine, ParseError};

/// Parses `name ":" OWS value OWS` out of one raw header line.
///
/// The value keeps pointing into `line`, no bytes are copied.
pub fn parse_header_line(line: Bytes) -> Result<HeaderLine, ParseError> {
    // obs-fold, a well known request smuggling vector
    ensure!(!matches!(line.first(), Some(b' ' | b'\t')), ParseError::malformed_headers("obsolete line folding"));

    let colon = line
        .iter()
        .position(|b| *b == b':')
        .ok_or_else(|| ParseError::malformed_headers(format!("missing colon in {:?}", String::from_utf8_lossy(&line))))?;

    let name = &line[..colon];
    ensure!(!name.is_empty(), ParseError::malformed_headers("empty header name"));
    ensure!(
        !matches!(name.last(), Some(b' ' | b'\t')),
        ParseError::malformed_headers(format!("whitespace before colon in {:?}", String::from_utf8_lossy(name)))
    );

    let name = HeaderName::from_bytes(name).map_err(|e| ParseError::malformed_headers(format!("{e}: {:?}", String::from_utf8_lossy(name))))?;

    let value = line.slice_ref(trim_ows(&line[colon + 1..]));
    let value = HeaderValue::from_maybe_shared(value).map_err(|e| ParseError::malformed_headers(format!("{e} for header {name}")))?;

    Ok(HeaderLine::new(line, name, value))
}

fn trim_ows(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|b| !matches!(b, b' ' | b'\t')).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !matches!(b, b' ' | b'\t')).map_or(start, |pos| pos + 1);
    &bytes[start..end]
}

/// Determines how the body following `lines` is delimited.
///
/// # Errors
///
/// Returns `ParseError::MalformedHeaders` if:
/// - Transfer-Encoding and Content-Length are both present, even when they would agree
/// - `chunked` is repeated or is not the final transfer coding
/// - Content-Length is not a non-negative integer, or its values disagree
pub fn resolve_body_kind(code: StatusCode, lines: &[HeaderLine]) -> Result<BodyKind, ParseError> {
    let mut transfer_encoding = false;
    let mut chunked = false;
    let mut content_length: Option<u64> = None;

    for line in lines {
        if *line.name() == TRANSFER_ENCODING {
            transfer_encoding = true;
            for coding in header_str(line)?.split(',') {
                let token = coding.split(';').next().unwrap_or_default().trim();
                ensure!(!token.is_empty(), ParseError::malformed_headers("empty transfer coding"));
                ensure!(!chunked, ParseError::malformed_headers("chunked is not the final transfer coding"));
                chunked = token.eq_ignore_ascii_case("chunked");
            }
        } else if *line.name() == CONTENT_LENGTH {
            for raw in header_str(line)?.split(',') {
                let length = parse_content_length(raw.trim())?;
                match content_length {
                    Some(existing) if existing != length => {
                        return Err(ParseError::malformed_headers(format!("conflicting content-length {existing} and {length}")));
                    }
                    _ => content_length = Some(length),
                }
            }
        }
    }

    ensure!(
        !(transfer_encoding && content_length.is_some()),
        ParseError::malformed_headers("transfer-encoding and content-length both present in headers")
    );

    let kind = if code.is_informational() || code == StatusCode::NO_CONTENT || code == StatusCode::NOT_MODIFIED {
        BodyKind::Empty
    } else if chunked {
        BodyKind::Chunked
    } else if transfer_encoding {
        BodyKind::CloseDelimited
    } else {
        match content_length {
            Some(0) => BodyKind::Empty,
            Some(length) => BodyKind::Length(length),
            None => BodyKind::CloseDelimited,
        }
    };

    debug!(status = code.as_u16(), ?kind, "resolved body framing");
    Ok(kind)
}

fn header_str(line: &HeaderLine) -> Result<&str, ParseError> {
    line.value().to_str().map_err(|e| ParseError::malformed_headers(format!("{e} for header {}", line.name())))
}

fn parse_content_length(value: &str) -> Result<u64, ParseError> {
    ensure!(
        !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()),
        ParseError::malformed_headers(format!("content-length value {value:?} is not a non-negative integer"))
    );
    value.parse::<u64>().map_err(|e| ParseError::malformed_headers(format!("content-length value {value:?}: {e}")))
}
