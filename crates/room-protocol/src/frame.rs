//! Frame types and classification.
//!
//! Binary frames carry raw little-endian signed 16-bit mono PCM in chunks of
//! [`AUDIO_CHUNK_BYTES`]. Two single-byte binary values are reserved for the
//! keepalive exchange and never treated as audio.

use crate::codec::{decode_control, encode_control, ControlMessage};
use bytes::{Bytes, BytesMut};

/// Keepalive probe byte (`'9'`).
pub const KEEPALIVE_PROBE: u8 = 0x39;

/// Keepalive acknowledgment byte (`'A'`).
pub const KEEPALIVE_ACK: u8 = 0x41;

/// Samples per captured audio chunk.
pub const AUDIO_CHUNK_SAMPLES: usize = 2048;

/// Bytes per sample (signed 16-bit).
pub const AUDIO_SAMPLE_BYTES: usize = 2;

/// Bytes per audio chunk on the wire.
pub const AUDIO_CHUNK_BYTES: usize = AUDIO_CHUNK_SAMPLES * AUDIO_SAMPLE_BYTES;

/// A frame as carried by the transport, before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireFrame {
    /// UTF-8 text frame
    Text(String),
    /// Binary frame
    Binary(Bytes),
}

impl WireFrame {
    /// The single-byte keepalive probe.
    #[must_use]
    pub fn probe() -> Self {
        Self::Binary(Bytes::from_static(&[KEEPALIVE_PROBE]))
    }

    /// The single-byte keepalive acknowledgment.
    #[must_use]
    pub fn ack() -> Self {
        Self::Binary(Bytes::from_static(&[KEEPALIVE_ACK]))
    }

    /// A text control frame built from an action and its arguments.
    pub fn control<I, S>(action: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Text(encode_control(action, args))
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Binary(data) => data.len(),
        }
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Text control request
    Control(ControlMessage),
    /// Audio chunk
    Audio(Bytes),
    /// Keepalive probe from the peer
    KeepaliveProbe,
    /// Keepalive acknowledgment from the peer
    KeepaliveAck,
}

impl Frame {
    /// Classify a wire frame.
    ///
    /// Any binary frame that is not exactly one reserved byte is audio.
    #[must_use]
    pub fn classify(wire: WireFrame) -> Self {
        match wire {
            WireFrame::Text(text) => Self::Control(decode_control(&text)),
            WireFrame::Binary(data) => match data.as_ref() {
                [KEEPALIVE_PROBE] => Self::KeepaliveProbe,
                [KEEPALIVE_ACK] => Self::KeepaliveAck,
                _ => Self::Audio(data),
            },
        }
    }
}

/// Re-segment a recorded buffer into wire-sized audio chunks.
///
/// A trailing partial chunk is zero-padded to [`AUDIO_CHUNK_BYTES`]. An empty
/// buffer yields no chunks.
#[must_use]
pub fn chunk_audio(buffer: &[u8]) -> Vec<Bytes> {
    buffer
        .chunks(AUDIO_CHUNK_BYTES)
        .map(|chunk| {
            let mut out = BytesMut::with_capacity(AUDIO_CHUNK_BYTES);
            out.extend_from_slice(chunk);
            out.resize(AUDIO_CHUNK_BYTES, 0);
            out.freeze()
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_size_contract() {
        assert_eq!(AUDIO_CHUNK_BYTES, 4096);
    }

    #[test]
    fn test_classify_keepalive_bytes() {
        assert_eq!(Frame::classify(WireFrame::probe()), Frame::KeepaliveProbe);
        assert_eq!(Frame::classify(WireFrame::ack()), Frame::KeepaliveAck);
    }

    #[test]
    fn test_classify_other_binary_as_audio() {
        let single = Bytes::from_static(&[0x00]);
        assert_eq!(
            Frame::classify(WireFrame::Binary(single.clone())),
            Frame::Audio(single)
        );

        let chunk = Bytes::from(vec![KEEPALIVE_PROBE; AUDIO_CHUNK_BYTES]);
        assert_eq!(
            Frame::classify(WireFrame::Binary(chunk.clone())),
            Frame::Audio(chunk)
        );
    }

    #[test]
    fn test_classify_text() {
        let frame = Frame::classify(WireFrame::Text("ROOM.JOIN$/$abc".to_string()));
        assert_eq!(frame, Frame::Control(ControlMessage::new("ROOM.JOIN", "abc")));
    }

    #[test]
    fn test_chunk_audio_pads_tail() {
        let mut buffer = vec![7u8; AUDIO_CHUNK_BYTES];
        buffer.extend_from_slice(&[1, 2, 3]);

        let chunks = chunk_audio(&buffer);
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.len() == AUDIO_CHUNK_BYTES));
        assert!(chunks[0].iter().all(|b| *b == 7));
        assert_eq!(&chunks[1][..3], &[1, 2, 3]);
        assert!(chunks[1][3..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_chunk_audio_empty() {
        assert!(chunk_audio(&[]).is_empty());
    }

    #[test]
    fn test_control_frame_builder() {
        let frame = WireFrame::control("ROOM.DELETE", ["r1"]);
        assert_eq!(frame, WireFrame::Text("ROOM.DELETE$/$r1".to_string()));
        assert_eq!(frame.len(), 16);
        assert!(!frame.is_empty());
    }
}
