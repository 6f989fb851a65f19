//! Bounds applied while converting a response.
//!
//! Every buffer the converter owns grows only up to one of these limits, so a
//! misbehaving backend can't make a single stream allocate without bound.

/// Default maximum length of one status, header or trailer line
pub const DEFAULT_MAX_LINE_SIZE: usize = 8 * 1024;

/// Default maximum number of header lines in a response head
pub const DEFAULT_MAX_HEADER_NUM: usize = 64;

/// Default maximum size of the status line plus all header lines
pub const DEFAULT_MAX_HEAD_SIZE: usize = 64 * 1024;

/// Default maximum size of a single chunk
pub const DEFAULT_MAX_CHUNK_SIZE: u64 = 16 * 1024 * 1024;

/// Default maximum length of a chunk-size line, extensions included
pub const DEFAULT_MAX_CHUNK_LINE_SIZE: usize = 1024;

/// Limits used by [`H2Response`](crate::response::H2Response) and its decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseLimits {
    pub max_line_size: usize,
    pub max_header_num: usize,
    pub max_head_size: usize,
    pub max_chunk_size: u64,
    pub max_chunk_line_size: usize,
}

impl Default for ResponseLimits {
    fn default() -> Self {
        Self {
            max_line_size: DEFAULT_MAX_LINE_SIZE,
            max_header_num: DEFAULT_MAX_HEADER_NUM,
            max_head_size: DEFAULT_MAX_HEAD_SIZE,
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            max_chunk_line_size: DEFAULT_MAX_CHUNK_LINE_SIZE,
        }
    }
}

impl ResponseLimits {
    #[must_use]
    pub fn with_max_line_size(mut self, max_line_size: usize) -> Self {
        self.max_line_size = max_line_size;
        self
    }

    #[must_use]
    pub fn with_max_header_num(mut self, max_header_num: usize) -> Self {
        self.max_header_num = max_header_num;
        self
    }

    #[must_use]
    pub fn with_max_head_size(mut self, max_head_size: usize) -> Self {
        self.max_head_size = max_head_size;
        self
    }

    #[must_use]
    pub fn with_max_chunk_size(mut self, max_chunk_size: u64) -> Self {
        self.max_chunk_size = max_chunk_size;
        self
    }

    #[must_use]
    pub fn with_max_chunk_line_size(mut self, max_chunk_line_size: usize) -> Self {
        self.max_chunk_line_size = max_chunk_line_size;
        self
    }
}
