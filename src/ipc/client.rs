//! Blocking caller-side transport over a framed byte stream.
//!
//! Frames that start with `;` are replies (success or parse-error marker).
//! Anything else read while waiting for a reply is a push notification and
//! is stashed until the caller drains it.
//!
//! A failed read leaves the stream at an unknown offset, so the transport
//! marks itself broken and answers every later request with `None` rather
//! than pairing a request with some other request's reply.

use std::collections::VecDeque;
use std::io::{Read, Write};

use crate::error::GlueError;
use crate::ipc::codec::{read_frame, write_frame, DEFAULT_MAX_FRAME_LENGTH};
use crate::protocol::Transport;

pub struct StreamTransport<R: Read, W: Write> {
    reader: R,
    writer: W,
    max_frame_length: usize,
    pushes: VecDeque<String>,
    broken: bool,
}

impl<R: Read, W: Write> StreamTransport<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            pushes: VecDeque::new(),
            broken: false,
        }
    }

    pub fn with_max_frame_length(mut self, max: usize) -> Self {
        self.max_frame_length = max;
        self
    }

    /// Number of stashed push notifications.
    pub fn pending_pushes(&self) -> usize {
        self.pushes.len()
    }

    /// True once a read or write failure has desynchronized the stream.
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: Read, W: Write> Transport for StreamTransport<R, W> {
    fn send(&mut self, request: &str) -> Option<String> {
        if self.broken {
            log::warn!("Dropping request on a broken stream");
            return None;
        }
        match write_frame(&mut self.writer, request) {
            Ok(()) => {}
            // rejected before any byte was written
            Err(GlueError::Frame(e)) => {
                log::warn!("Failed to send request: {}", e);
                return None;
            }
            Err(e) => {
                log::warn!("Failed to send request: {}", e);
                self.broken = true;
                return None;
            }
        }
        loop {
            match read_frame(&mut self.reader, self.max_frame_length) {
                Ok(Some(frame)) if frame.starts_with(';') => return Some(frame),
                Ok(Some(frame)) => {
                    log::debug!("Stashing push notification while awaiting reply");
                    self.pushes.push_back(frame);
                }
                Ok(None) => {
                    log::warn!("Peer closed the stream before replying");
                    self.broken = true;
                    return None;
                }
                Err(e) => {
                    log::warn!("Failed to read reply: {}", e);
                    self.broken = true;
                    return None;
                }
            }
        }
    }

    fn drain_notifications(&mut self) -> Vec<String> {
        self.pushes.drain(..).collect()
    }
}
