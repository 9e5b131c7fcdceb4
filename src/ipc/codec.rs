//! Length-prefixed framing for glue messages.
//!
//! Provides a tokio codec plus blocking helpers for the same wire format.

use std::io::{Read, Write};

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{GlueError, Result};

/// Default upper bound on a single frame's payload.
pub const DEFAULT_MAX_FRAME_LENGTH: usize = 16 * 1024 * 1024;

fn too_large(length: usize, max: usize) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        format!("Message too large: {} > {}", length, max),
    )
}

/// Length-prefixed text codec.
///
/// Messages are framed as:
/// - 4 bytes: message length (big-endian u32)
/// - N bytes: UTF-8 message text
#[derive(Debug, Clone)]
pub struct GlueFrameCodec {
    max_length: usize,
}

impl GlueFrameCodec {
    /// Create a new codec with default max length (16 MB).
    pub fn new() -> Self {
        Self {
            max_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }

    pub fn with_max_length(max_length: usize) -> Self {
        Self { max_length }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl Default for GlueFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for GlueFrameCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> std::result::Result<Option<Self::Item>, Self::Error> {
        // Need at least 4 bytes for the length prefix
        if src.len() < 4 {
            return Ok(None);
        }

        let length = u32::from_be_bytes([src[0], src[1], src[2], src[3]]) as usize;
        if length > self.max_length {
            return Err(too_large(length, self.max_length));
        }

        if src.len() < 4 + length {
            src.reserve(4 + length - src.len());
            return Ok(None);
        }

        src.advance(4);
        let data = src.split_to(length);

        String::from_utf8(data.to_vec()).map(Some).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, format!("UTF-8 error: {}", e))
        })
    }
}

impl Encoder<String> for GlueFrameCodec {
    type Error = std::io::Error;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> std::result::Result<(), Self::Error> {
        let length = item.len();
        if length > self.max_length {
            return Err(too_large(length, self.max_length));
        }

        dst.reserve(4 + length);
        dst.put_u32(length as u32);
        dst.put_slice(item.as_bytes());
        Ok(())
    }
}

/// Encode one message into a standalone frame.
pub fn encode_frame(text: &str) -> Result<Vec<u8>> {
    let length = u32::try_from(text.len())
        .map_err(|_| GlueError::Frame(format!("Message too large: {} bytes", text.len())))?;
    let mut result = Vec::with_capacity(4 + text.len());
    result.extend_from_slice(&length.to_be_bytes());
    result.extend_from_slice(text.as_bytes());
    Ok(result)
}

/// Decode the first frame in `data`.
pub fn decode_frame(data: &[u8]) -> Result<String> {
    if data.len() < 4 {
        return Err(GlueError::Frame("Message too short".into()));
    }

    let length = u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if data.len() < 4 + length {
        return Err(GlueError::Frame("Incomplete message".into()));
    }

    String::from_utf8(data[4..4 + length].to_vec())
        .map_err(|e| GlueError::Frame(format!("UTF-8 error: {}", e)))
}

/// Blocking read of one frame. `Ok(None)` on a clean end of stream.
pub fn read_frame<R: Read>(reader: &mut R, max_length: usize) -> Result<Option<String>> {
    let mut prefix = [0u8; 4];
    match reader.read_exact(&mut prefix) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let length = u32::from_be_bytes(prefix) as usize;
    if length > max_length {
        return Err(GlueError::Frame(format!(
            "Message too large: {} > {}",
            length, max_length
        )));
    }

    let mut data = vec![0u8; length];
    reader.read_exact(&mut data)?;
    String::from_utf8(data).map(Some).map_err(|e| GlueError::Frame(format!("UTF-8 error: {}", e)))
}

/// Blocking write of one frame, flushed.
pub fn write_frame<W: Write>(writer: &mut W, text: &str) -> Result<()> {
    writer.write_all(&encode_frame(text)?)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_codec_new() {
        let codec = GlueFrameCodec::new();
        assert_eq!(codec.max_length(), 16 * 1024 * 1024);
    }

    #[test]
    fn test_codec_with_max_length() {
        let codec = GlueFrameCodec::with_max_length(1024);
        assert_eq!(codec.clone().max_length(), 1024);
    }

    #[test]
    fn test_codec_encode_decode() {
        let mut codec = GlueFrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(r#"(3 "Color")"#.to_string(), &mut buf).unwrap();
        assert_eq!(&buf[..4], &[0, 0, 0, 11]);
        let decoded = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(decoded, r#"(3 "Color")"#);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_codec_partial_message() {
        let mut codec = GlueFrameCodec::new();
        let mut buf = BytesMut::from(&[0u8, 0][..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_codec_incomplete_body() {
        let mut codec = GlueFrameCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u32(100);
        buf.put_slice(&[b'('; 10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_codec_message_too_large_decode() {
        let mut codec = GlueFrameCodec::with_max_length(10);
        let mut buf = BytesMut::new();
        buf.put_u32(100);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_codec_message_too_large_encode() {
        let mut codec = GlueFrameCodec::with_max_length(10);
        let mut buf = BytesMut::new();
        let result = codec.encode("(12 \"a very long proc name\" (7))".to_string(), &mut buf);
        assert!(result.is_err());
    }

    #[test]
    fn test_codec_invalid_utf8() {
        let mut codec = GlueFrameCodec::new();
        let mut buf = BytesMut::new();
        buf.put_u32(2);
        buf.put_slice(&[0xff, 0xfe]);
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn test_codec_multiple_messages() {
        let mut codec = GlueFrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode("(7)".to_string(), &mut buf).unwrap();
        codec.encode("(9)".to_string(), &mut buf).unwrap();
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "(7)");
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap(), "(9)");
        assert!(codec.decode(&mut buf).unwrap().is_none());
    }

    #[test]
    fn test_encode_decode_frame() {
        let encoded = encode_frame(";gsl-glue-return\n\"Object\"").unwrap();
        let length = u32::from_be_bytes([encoded[0], encoded[1], encoded[2], encoded[3]]) as usize;
        assert_eq!(encoded.len(), 4 + length);
        assert_eq!(decode_frame(&encoded).unwrap(), ";gsl-glue-return\n\"Object\"");
    }

    #[test]
    fn test_decode_frame_too_short() {
        assert!(matches!(decode_frame(&[0, 1, 2]), Err(GlueError::Frame(_))));
    }

    #[test]
    fn test_decode_frame_incomplete() {
        let mut data = vec![0, 0, 0, 100];
        data.extend_from_slice(&[0u8; 10]);
        assert!(decode_frame(&data).is_err());
    }

    #[test]
    fn test_read_write_frames() {
        let mut out = Vec::new();
        write_frame(&mut out, "(7)").unwrap();
        write_frame(&mut out, "(4 \"äöü\")").unwrap();

        let mut reader = Cursor::new(out);
        assert_eq!(read_frame(&mut reader, 1024).unwrap().as_deref(), Some("(7)"));
        assert_eq!(
            read_frame(&mut reader, 1024).unwrap().as_deref(),
            Some("(4 \"äöü\")")
        );
        assert_eq!(read_frame(&mut reader, 1024).unwrap(), None);
    }

    #[test]
    fn test_read_frame_too_large() {
        let mut reader = Cursor::new(vec![0, 0, 1, 0]);
        assert!(matches!(read_frame(&mut reader, 16), Err(GlueError::Frame(_))));
    }

    #[test]
    fn test_read_frame_truncated_body() {
        let mut reader = Cursor::new(vec![0, 0, 0, 8, b'(']);
        assert!(matches!(read_frame(&mut reader, 1024), Err(GlueError::Io(_))));
    }
}
