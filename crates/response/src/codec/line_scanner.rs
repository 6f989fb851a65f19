//! Incremental scanner for `\n` terminated lines.
//!
//! The status line, every header line and the blank line closing the header
//! block all go through [`LineScanner::scan_line`]. Input may stop anywhere,
//! including between `\r` and `\n`; the unfinished part of a line is kept in a
//! caller-owned buffer until the rest arrives.

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

/// Result of one [`LineScanner::scan_line`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineScan {
    /// A complete line, terminator stripped, and the input bytes used to finish it
    LineFound { line: Bytes, consumed: usize },
    /// No terminator yet; all `consumed` bytes were moved into the line buffer
    NeedMoreData { consumed: usize },
}

impl LineScan {
    /// Number of input bytes used by the scan, whatever its outcome
    #[inline]
    pub fn consumed(&self) -> usize {
        match self {
            LineScan::LineFound { consumed, .. } | LineScan::NeedMoreData { consumed } => *consumed,
        }
    }
}

/// Finds line boundaries in fragmented input while bounding the line length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineScanner {
    max_line_size: usize,
}

impl LineScanner {
    pub fn new(max_line_size: usize) -> Self {
        Self { max_line_size }
    }

    pub fn max_line_size(&self) -> usize {
        self.max_line_size
    }

    /// Scans `input` for the end of the line whose beginning is held in `buffered`.
    ///
    /// The line ends at a bare `\n`; a `\r` right before it is stripped too. When
    /// the whole line is inside `input` it is returned as a slice of `input`
    /// without copying. The raw line, terminator included, may not be longer
    /// than the configured maximum.
    pub fn scan_line(&self, buffered: &mut BytesMut, input: &Bytes) -> Result<LineScan, ParseError> {
        let Some(pos) = input.iter().position(|b| *b == b'\n') else {
            let current_size = buffered.len() + input.len();
            ensure!(current_size <= self.max_line_size, ParseError::line_too_long(current_size, self.max_line_size));
            buffered.extend_from_slice(input);
            trace!(buffered = buffered.len(), "line incomplete, need more data");
            return Ok(LineScan::NeedMoreData { consumed: input.len() });
        };

        let consumed = pos + 1;
        let current_size = buffered.len() + consumed;
        ensure!(current_size <= self.max_line_size, ParseError::line_too_long(current_size, self.max_line_size));

        let mut line = if buffered.is_empty() {
            input.slice(..pos)
        } else {
            buffered.extend_from_slice(&input[..pos]);
            buffered.split().freeze()
        };

        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        trace!(len = line.len(), consumed, "scanned line");
        Ok(LineScan::LineFound { line, consumed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn found(scan: LineScan) -> (Bytes, usize) {
        match scan {
            LineScan::LineFound { line, consumed } => (line, consumed),
            LineScan::NeedMoreData { .. } => panic!("expect a complete line"),
        }
    }

    #[test]
    fn test_whole_line() {
        let scanner = LineScanner::new(64);
        let mut buffered = BytesMut::new();
        let input = Bytes::from_static(b"HTTP/1.1 200 OK\r\nServer: x\r\n");

        let (line, consumed) = found(scanner.scan_line(&mut buffered, &input).unwrap());
        assert_eq!(&line[..], b"HTTP/1.1 200 OK");
        assert_eq!(consumed, 17);
        assert!(buffered.is_empty());
    }

    #[test]
    fn test_bare_lf_and_blank_line() {
        let scanner = LineScanner::new(64);
        let mut buffered = BytesMut::new();

        let (line, consumed) = found(scanner.scan_line(&mut buffered, &Bytes::from_static(b"a: b\nrest")).unwrap());
        assert_eq!(&line[..], b"a: b");
        assert_eq!(consumed, 5);

        let (line, consumed) = found(scanner.scan_line(&mut buffered, &Bytes::from_static(b"\r\n")).unwrap());
        assert!(line.is_empty());
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_line_split_between_cr_and_lf() {
        let scanner = LineScanner::new(64);
        let mut buffered = BytesMut::new();

        let scan = scanner.scan_line(&mut buffered, &Bytes::from_static(b"Content-Le")).unwrap();
        assert_eq!(scan, LineScan::NeedMoreData { consumed: 10 });

        let scan = scanner.scan_line(&mut buffered, &Bytes::from_static(b"ngth: 5\r")).unwrap();
        assert_eq!(scan.consumed(), 8);

        let (line, consumed) = found(scanner.scan_line(&mut buffered, &Bytes::from_static(b"\nhello")).unwrap());
        assert_eq!(&line[..], b"Content-Length: 5");
        assert_eq!(consumed, 1);
        assert!(buffered.is_empty());
    }

    #[test]
    fn test_partial_line_too_long() {
        let scanner = LineScanner::new(8);
        let mut buffered = BytesMut::new();

        scanner.scan_line(&mut buffered, &Bytes::from_static(b"HTTP/")).unwrap();
        let err = scanner.scan_line(&mut buffered, &Bytes::from_static(b"1.1 2")).unwrap_err();
        assert!(matches!(err, ParseError::LineTooLong { current_size: 10, max_size: 8 }));
    }

    #[test]
    fn test_complete_line_too_long() {
        let scanner = LineScanner::new(8);
        let mut buffered = BytesMut::new();

        let err = scanner.scan_line(&mut buffered, &Bytes::from_static(b"123456789\r\n")).unwrap_err();
        assert!(matches!(err, ParseError::LineTooLong { current_size: 11, max_size: 8 }));
    }
}
