//! PCM audio fixtures.

use bytes::Bytes;
use room_protocol::frame::AUDIO_CHUNK_BYTES;

/// One full-size audio chunk filled with `fill`.
#[must_use]
pub fn pcm_chunk(fill: u8) -> Bytes {
    Bytes::from(vec![fill; AUDIO_CHUNK_BYTES])
}

/// `len` bytes of a repeating 0..=250 ramp, so misordered or truncated
/// copies are detectable.
#[must_use]
pub fn pcm_ramp(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
