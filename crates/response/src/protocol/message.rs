use bytes::Bytes;

/// An item handed to the HTTP/2 side of a stream.
///
/// The head always comes first, then zero or more body chunks, then a single
/// [`PayloadItem::Eof`].
#[derive(Debug)]
pub enum Message<T> {
    Header(T),
    Payload(PayloadItem),
}

/// A piece of the decoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadItem {
    /// Body bytes with all transfer framing removed
    Chunk(Bytes),
    /// The body is complete
    Eof,
}

/// How the body of a response is delimited on the wire.
///
/// Decided once, when the header block ends:
/// - Length: relay exactly that many bytes
/// - Chunked: strip chunked transfer framing
/// - CloseDelimited: relay everything until the backend closes
/// - Empty: 1xx, 204, 304 or `Content-Length: 0`
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BodyKind {
    Length(u64),
    Chunked,
    CloseDelimited,
    Empty,
}

impl BodyKind {
    #[inline]
    pub fn is_chunked(&self) -> bool {
        matches!(self, BodyKind::Chunked)
    }

    /// The body length known up front, `None` when only the framing can tell
    #[inline]
    pub fn length(&self) -> Option<u64> {
        match self {
            BodyKind::Length(len) => Some(*len),
            BodyKind::Empty => Some(0),
            BodyKind::Chunked | BodyKind::CloseDelimited => None,
        }
    }
}

impl<T> Message<T> {
    #[inline]
    pub fn is_header(&self) -> bool {
        matches!(self, Message::Header(_))
    }

    /// The body part of this message, `None` for the head
    pub fn into_payload_item(self) -> Option<PayloadItem> {
        match self {
            Message::Payload(item) => Some(item),
            Message::Header(_) => None,
        }
    }
}

impl PayloadItem {
    #[inline]
    pub fn is_eof(&self) -> bool {
        *self == PayloadItem::Eof
    }

    #[inline]
    pub fn is_chunk(&self) -> bool {
        !self.is_eof()
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        if let PayloadItem::Chunk(bytes) = self { Some(bytes) } else { None }
    }

    pub fn into_bytes(self) -> Option<Bytes> {
        if let PayloadItem::Chunk(bytes) = self { Some(bytes) } else { None }
    }
}
