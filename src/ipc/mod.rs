//! IPC layer - framed byte streams for the glue protocol
//!
//! This module provides:
//! - Length-prefixed text frame codec
//! - Async server hosting a responder with interleaved pushes
//! - Blocking stream transport for callers

pub mod client;
pub mod codec;
pub mod server;

pub use client::StreamTransport;
pub use codec::{
    DEFAULT_MAX_FRAME_LENGTH, GlueFrameCodec, decode_frame, encode_frame, read_frame, write_frame,
};
pub use server::{ChannelSink, GlueServer, GlueServerConfig, ServeStats};
