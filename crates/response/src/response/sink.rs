//! Destinations for decoded body bytes.

use std::collections::VecDeque;

use bytes::{Bytes, BytesMut};

/// Receives body spans as [`H2Response::advance`](crate::response::H2Response::advance)
/// strips the transfer framing off them.
///
/// Spans are handed over by value. They usually share the buffer the backend
/// bytes arrived in, so keeping them around keeps that buffer alive.
pub trait BodySink {
    fn push_body(&mut self, bytes: Bytes);
}

impl BodySink for Vec<Bytes> {
    fn push_body(&mut self, bytes: Bytes) {
        self.push(bytes);
    }
}

impl BodySink for VecDeque<Bytes> {
    fn push_body(&mut self, bytes: Bytes) {
        self.push_back(bytes);
    }
}

/// Copies every span into one contiguous buffer.
impl BodySink for BytesMut {
    fn push_body(&mut self, bytes: Bytes) {
        self.extend_from_slice(&bytes);
    }
}
