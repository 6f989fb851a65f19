//! The parsed response head handed to the HTTP/2 layer.
//!
//! A [`ResponseHead`] is built once, when the blank line closing the header
//! block has been seen, and never changes afterwards. Header values share the
//! buffers the lines were received in, so cloning a head is cheap.

use bytes::Bytes;
use http::header::CONNECTION;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, Version};

/// Connection-specific fields that must not be forwarded on an HTTP/2 stream
const HOP_BY_HOP: [&str; 5] = ["connection", "keep-alive", "proxy-connection", "transfer-encoding", "upgrade"];

/// A parsed HTTP/1.x status line.
///
/// The reason phrase may carry obs-text (bytes `0x80..=0xFF`). [`as_bytes`](Self::as_bytes)
/// returns it as received; [`text`](Self::text) and [`reason`](Self::reason) read
/// it as ISO-8859-1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    version: Version,
    code: StatusCode,
    /// everything after the protocol version and its separator, e.g. `200 OK`
    raw: Bytes,
    text: String,
}

impl StatusLine {
    pub(crate) fn new(version: Version, code: StatusCode, raw: Bytes) -> Self {
        let text = raw.iter().copied().map(char::from).collect();
        Self { version, code, raw, text }
    }

    /// Status code and reason exactly as the backend sent them
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The reason phrase, empty when the backend sent none
    pub fn reason(&self) -> &str {
        self.text.get(4..).unwrap_or("")
    }
}

/// One header line exactly as the backend sent it, minus the line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLine {
    raw: Bytes,
    name: HeaderName,
    value: HeaderValue,
}

impl HeaderLine {
    pub(crate) fn new(raw: Bytes, name: HeaderName, value: HeaderValue) -> Self {
        Self { raw, name, value }
    }

    /// The raw line, `Name: value`
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    pub fn name(&self) -> &HeaderName {
        &self.name
    }

    pub fn value(&self) -> &HeaderValue {
        &self.value
    }
}

/// Immutable status line and ordered header lines of one backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: StatusLine,
    lines: Vec<HeaderLine>,
}

impl ResponseHead {
    pub(crate) fn new(status: StatusLine, lines: Vec<HeaderLine>) -> Self {
        Self { status, lines }
    }

    /// The status text after the protocol version, such as `200 OK`
    pub fn status(&self) -> &str {
        self.status.text()
    }

    pub fn status_line(&self) -> &StatusLine {
        &self.status
    }

    pub fn status_code(&self) -> StatusCode {
        self.status.code()
    }

    pub fn reason(&self) -> &str {
        self.status.reason()
    }

    /// The HTTP/1.x version the backend answered with
    pub fn version(&self) -> Version {
        self.status.version()
    }

    /// Header lines in the order they were received
    pub fn lines(&self) -> &[HeaderLine] {
        &self.lines
    }

    /// All values of the header `name`, in received order
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a HeaderValue> + 'a {
        self.lines.iter().filter(move |line| line.name.as_str().eq_ignore_ascii_case(name)).map(HeaderLine::value)
    }

    /// The header block as an HTTP/1.1 [`HeaderMap`], nothing filtered
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(self.lines.len());
        for line in &self.lines {
            headers.append(line.name.clone(), line.value.clone());
        }
        headers
    }

    /// Translates the head into the fields of an HTTP/2 response.
    ///
    /// Connection-specific header fields are dropped, as HTTP/2 forbids them
    /// (RFC 9113 section 8.2.2), together with every field the `Connection`
    /// header nominates.
    pub fn to_http2(&self) -> http::Response<()> {
        let nominated = self.connection_options();

        let mut response = http::Response::new(());
        *response.status_mut() = self.status.code();
        *response.version_mut() = Version::HTTP_2;

        let headers = response.headers_mut();
        headers.reserve(self.lines.len());
        for line in &self.lines {
            let name = line.name.as_str();
            if HOP_BY_HOP.contains(&name) || nominated.iter().any(|option| option.eq_ignore_ascii_case(name)) {
                continue;
            }
            headers.append(line.name.clone(), line.value.clone());
        }
        response
    }

    fn connection_options(&self) -> Vec<String> {
        self.get_all(CONNECTION.as_str())
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .map(str::trim)
            .filter(|option| !option.is_empty())
            .map(str::to_ascii_lowercase)
            .collect()
    }
}
