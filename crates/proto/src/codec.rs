//! Length-delimited JSON framing.
//!
//! Each frame is a 4-byte big-endian length prefix followed by one
//! JSON message. Framing is handled by `tokio-util`'s
//! [`LengthDelimitedCodec`]; this module pins the frame-size bound and
//! provides the encode/decode helpers used on both sides.

use bytes::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

/// Upper bound on a single frame. Large scan batches fit comfortably;
/// anything bigger indicates a desynchronized or hostile peer.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

/// Wrap a connected stream in the wire framing.
pub fn framed(stream: TcpStream) -> Framed<TcpStream, LengthDelimitedCodec> {
    let codec = LengthDelimitedCodec::builder()
        .max_frame_length(MAX_FRAME_LEN)
        .new_codec();
    Framed::new(stream, codec)
}

/// Serialize one message into a frame payload.
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes, serde_json::Error> {
    serde_json::to_vec(message).map(Bytes::from)
}

/// Deserialize one frame payload.
pub fn decode<T: DeserializeOwned>(frame: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(frame)
}
