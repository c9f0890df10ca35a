//! Wire protocol for the RPC service.
//!
//! Every message is one length-delimited frame (4-byte big-endian length,
//! then payload). Payloads are `bitcode`-encoded [`RequestFrame`] and
//! [`ResponseFrame`] values; argument and result bodies are nested
//! `bitcode` blobs so the frame layer stays independent of method types.
//!
//! ```text
//! client                                 server
//!   │ ── RequestFrame{seq, method, body} ──▶ │
//!   │ ◀── ResponseFrame{seq, method, error | body} ── │
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitcode::{Decode, Encode};
use bytes::Bytes;
use serde::de::{IgnoredAny, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::rpc::error::CallError;

/// Fully qualified name of the multiply method.
pub const MULTIPLY_METHOD: &str = "Calculator.Multiply";

/// Arguments of `Calculator.Multiply`.
///
/// JSON keys follow the public HTTP surface (`A`, `B`). Decoding matches
/// keys case-insensitively, lets a repeated key overwrite the earlier one,
/// treats `null` or a missing key as zero and ignores unknown keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Encode, Decode, Serialize)]
pub struct CallArguments {
    #[serde(rename = "A")]
    pub a: i64,
    #[serde(rename = "B")]
    pub b: i64,
}

impl<'de> Deserialize<'de> for CallArguments {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CallArgumentsVisitor)
    }
}

struct CallArgumentsVisitor;

impl<'de> Visitor<'de> for CallArgumentsVisitor {
    type Value = CallArguments;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object with integer fields A and B")
    }

    fn visit_map<M>(self, mut map: M) -> Result<CallArguments, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut args = CallArguments::default();
        while let Some(key) = map.next_key::<String>()? {
            let slot = if key.eq_ignore_ascii_case("a") {
                &mut args.a
            } else if key.eq_ignore_ascii_case("b") {
                &mut args.b
            } else {
                map.next_value::<IgnoredAny>()?;
                continue;
            };
            if let Some(value) = map.next_value::<Option<i64>>()? {
                *slot = value;
            }
        }
        Ok(args)
    }
}

impl CallArguments {
    pub fn new(a: i64, b: i64) -> Self {
        Self { a, b }
    }
}

/// Result of `Calculator.Multiply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
pub struct CallResult {
    pub result: i64,
}

/// A single call on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct RequestFrame {
    pub seq: u64,
    pub service_method: String,
    /// Encoded arguments. Empty means the caller sent no argument value.
    pub body: Vec<u8>,
}

/// Reply to a [`RequestFrame`].
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode)]
pub struct ResponseFrame {
    pub seq: u64,
    pub service_method: String,
    pub error: Option<String>,
    pub body: Vec<u8>,
}

impl ResponseFrame {
    pub fn ok(seq: u64, service_method: String, body: Vec<u8>) -> Self {
        Self {
            seq,
            service_method,
            error: None,
            body,
        }
    }

    pub fn err(seq: u64, service_method: String, error: impl ToString) -> Self {
        Self {
            seq,
            service_method,
            error: Some(error.to_string()),
            body: Vec::new(),
        }
    }
}

/// Framed transport over any byte stream.
pub type FrameTransport<T> = Framed<T, LengthDelimitedCodec>;

/// Wrap a stream with the length-delimited codec.
pub fn framed<T>(io: T, max_frame_bytes: usize) -> FrameTransport<T>
where
    T: AsyncRead + AsyncWrite,
{
    let codec = LengthDelimitedCodec::builder()
        .length_field_length(4)
        .big_endian()
        .max_frame_length(max_frame_bytes)
        .new_codec();
    Framed::new(io, codec)
}

pub fn encode_frame<T: Encode>(frame: &T) -> Bytes {
    Bytes::from(bitcode::encode(frame))
}

pub fn decode_frame<T>(bytes: &[u8]) -> Result<T, CallError>
where
    T: for<'de> Decode<'de>,
{
    bitcode::decode(bytes).map_err(|e| CallError::Protocol(e.to_string()))
}

/// Global counter for request sequence numbers.
static SEQ_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Allocate the next request sequence number.
pub fn next_seq() -> u64 {
    SEQ_COUNTER.fetch_add(1, Ordering::Relaxed)
}
