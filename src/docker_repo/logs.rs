// Decoder for Docker's multiplexed log stream.
//
// Each frame is an 8-byte header followed by the payload:
//   byte 0     stream tag (0 stdin, 1 stdout, 2 stderr)
//   bytes 1-3  zero
//   bytes 4-7  payload length, big-endian u32
// Payloads may contain any bytes, newlines included, so the header length is the
// only reliable boundary.

use super::ContainerRuntime;
use crate::error::RuntimeError;
use bytes::{BufMut, BytesMut};

pub const HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdin,
    Stdout,
    Stderr,
}

impl StreamKind {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(StreamKind::Stdin),
            1 => Some(StreamKind::Stdout),
            2 => Some(StreamKind::Stderr),
            _ => None,
        }
    }

    fn tag(self) -> u8 {
        match self {
            StreamKind::Stdin => 0,
            StreamKind::Stdout => 1,
            StreamKind::Stderr => 2,
        }
    }
}

/// A decoded chunk of output. `stream` is `None` for bytes that were not framed
/// (TTY containers, or a trailing remainder too short to hold a header).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFrame<'a> {
    pub stream: Option<StreamKind>,
    pub payload: &'a [u8],
}

/// Iterates the frames of a raw log buffer in order.
pub struct FrameReader<'a> {
    buf: &'a [u8],
}

impl<'a> FrameReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }
}

impl<'a> Iterator for FrameReader<'a> {
    type Item = LogFrame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buf.is_empty() {
            return None;
        }
        let Some(stream) = parse_header(self.buf) else {
            let rest = std::mem::take(&mut self.buf);
            return Some(LogFrame {
                stream: None,
                payload: rest,
            });
        };
        let declared = u32::from_be_bytes([self.buf[4], self.buf[5], self.buf[6], self.buf[7]]);
        let body = &self.buf[HEADER_LEN..];
        // A truncated final frame still yields what arrived.
        let len = (declared as usize).min(body.len());
        let (payload, rest) = body.split_at(len);
        self.buf = rest;
        Some(LogFrame {
            stream: Some(stream),
            payload,
        })
    }
}

fn parse_header(buf: &[u8]) -> Option<StreamKind> {
    if buf.len() < HEADER_LEN || buf[1..4] != [0, 0, 0] {
        return None;
    }
    StreamKind::from_tag(buf[0])
}

/// Append one frame in the runtime's wire format.
pub fn encode_frame(stream: StreamKind, payload: &[u8], out: &mut BytesMut) {
    out.reserve(HEADER_LEN + payload.len());
    out.put_u8(stream.tag());
    out.put_slice(&[0, 0, 0]);
    out.put_u32(payload.len() as u32);
    out.put_slice(payload);
}

/// Decode a raw log buffer into its non-blank lines, in order. Every frame
/// boundary ends a line.
pub fn decode_lines(raw: &[u8]) -> Vec<String> {
    let mut text = Vec::with_capacity(raw.len());
    for frame in FrameReader::new(raw) {
        text.extend_from_slice(frame.payload);
        if frame.stream.is_some() && !frame.payload.ends_with(b"\n") {
            text.push(b'\n');
        }
    }
    String::from_utf8_lossy(&text)
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode a raw log buffer into newline-joined text.
pub fn decode_text(raw: &[u8]) -> String {
    decode_lines(raw).join("\n")
}

/// Fetch the last `tail` log lines of a container as clean text.
pub async fn container_logs(
    runtime: &dyn ContainerRuntime,
    id: &str,
    tail: usize,
) -> Result<String, RuntimeError> {
    let raw = runtime.logs(id, tail).await?;
    Ok(decode_text(&raw))
}
