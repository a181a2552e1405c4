//! Envelope framing and payload codec.
//!
//! A frame is a header plus an opaque encoded payload, in one of two
//! layouts:
//!
//! ```text
//! Classic:       [ postcard(MessageHeader) | payload bytes ]
//! SizePrefixed:  [ u16 LE header length | postcard(MessageHeader) | payload bytes ]
//! ```
//!
//! Both carry the same five header fields. Outbound frames use the
//! layout fixed at build time; inbound frames are tried against the
//! configured layout first with the other as a fallback, so a peer on
//! the opposite layout still gets through during bring-up. This module
//! is the only place that knows which layout is in use.
//!
//! Frames never exceed `MAX_MESSAGE_SIZE`; payloads never exceed
//! `MESSAGE_PAYLOAD_MAX`. Both limits are enforced here, on both
//! directions.

use serde::{Deserialize, Serialize};

use crate::config::{HeaderFormat, MAX_MESSAGE_SIZE, MESSAGE_PAYLOAD_MAX};
use crate::error::ErrorCode;
use crate::wire::types::{MessageHeader, MessageType};

/// Worst-case encoded header: five u32 varints.
const HEADER_SCRATCH: usize = 32;

// ── Payload codec ─────────────────────────────────────────────

/// Encode one payload struct into `out`, returning the encoded length.
pub fn encode_payload<T: Serialize>(msg: &T, out: &mut [u8]) -> Result<usize, ErrorCode> {
    postcard::to_slice(msg, out)
        .map(|used| used.len())
        .map_err(|_| ErrorCode::EncodingFailed)
}

/// Decode one payload struct from its encoded bytes.
pub fn decode_payload<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T, ErrorCode> {
    postcard::from_bytes(bytes).map_err(|_| ErrorCode::DecodingFailed)
}

// ── Envelope framing ──────────────────────────────────────────

/// The framing adapter. Holds the build-time header layout choice.
#[derive(Debug, Clone, Copy)]
pub struct Framing {
    format: HeaderFormat,
}

impl Default for Framing {
    fn default() -> Self {
        Self::new(HeaderFormat::default())
    }
}

impl Framing {
    pub fn new(format: HeaderFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> HeaderFormat {
        self.format
    }

    /// Split a frame into its header and payload bytes.
    pub fn decode_envelope<'a>(
        &self,
        frame: &'a [u8],
    ) -> Result<(MessageHeader, &'a [u8]), ErrorCode> {
        if frame.is_empty() || frame.len() > MAX_MESSAGE_SIZE {
            return Err(ErrorCode::DecodingFailed);
        }
        let (header, payload) = match decode_in_format(frame, self.format) {
            Ok(parts) => parts,
            // Fallback to the other layout, gated on the header naming
            // a known message type so garbage cannot masquerade.
            Err(_) => {
                let (header, payload) = decode_in_format(frame, self.format.other())?;
                if MessageType::from_u32(header.message_type).is_none() {
                    return Err(ErrorCode::DecodingFailed);
                }
                (header, payload)
            }
        };
        if payload.len() > MESSAGE_PAYLOAD_MAX {
            return Err(ErrorCode::DecodingFailed);
        }
        Ok((header, payload))
    }

    /// Assemble a frame from a header and already-encoded payload.
    pub fn encode_envelope(
        &self,
        header: &MessageHeader,
        payload: &[u8],
        out: &mut [u8],
    ) -> Result<usize, ErrorCode> {
        if payload.len() > MESSAGE_PAYLOAD_MAX {
            return Err(ErrorCode::EncodingFailed);
        }
        let mut hbuf = [0u8; HEADER_SCRATCH];
        let hlen = encode_payload(header, &mut hbuf)?;

        let (prefix, total) = match self.format {
            HeaderFormat::Classic => (0, hlen + payload.len()),
            HeaderFormat::SizePrefixed => (2, 2 + hlen + payload.len()),
        };
        if total > MAX_MESSAGE_SIZE {
            return Err(ErrorCode::EncodingFailed);
        }
        if total > out.len() {
            return Err(ErrorCode::BufferTooSmall);
        }
        if prefix == 2 {
            out[..2].copy_from_slice(&(hlen as u16).to_le_bytes());
        }
        out[prefix..prefix + hlen].copy_from_slice(&hbuf[..hlen]);
        out[prefix + hlen..total].copy_from_slice(payload);
        Ok(total)
    }

    /// Encode a typed message straight into a frame buffer.
    pub fn encode_message<T: Serialize>(
        &self,
        header: &MessageHeader,
        msg: &T,
        out: &mut [u8],
    ) -> Result<usize, ErrorCode> {
        let mut pbuf = [0u8; MESSAGE_PAYLOAD_MAX];
        let plen = encode_payload(msg, &mut pbuf)?;
        self.encode_envelope(header, &pbuf[..plen], out)
    }
}

impl HeaderFormat {
    const fn other(self) -> Self {
        match self {
            Self::Classic => Self::SizePrefixed,
            Self::SizePrefixed => Self::Classic,
        }
    }
}

fn decode_in_format(
    frame: &[u8],
    format: HeaderFormat,
) -> Result<(MessageHeader, &[u8]), ErrorCode> {
    match format {
        HeaderFormat::Classic => postcard::take_from_bytes::<MessageHeader>(frame)
            .map_err(|_| ErrorCode::DecodingFailed),
        HeaderFormat::SizePrefixed => {
            if frame.len() < 2 {
                return Err(ErrorCode::DecodingFailed);
            }
            let hlen = u16::from_le_bytes([frame[0], frame[1]]) as usize;
            let rest = &frame[2..];
            if hlen == 0 || hlen > rest.len() {
                return Err(ErrorCode::DecodingFailed);
            }
            let (header, leftover) = postcard::take_from_bytes::<MessageHeader>(&rest[..hlen])
                .map_err(|_| ErrorCode::DecodingFailed)?;
            // The prefix must cover exactly the header, nothing more.
            if !leftover.is_empty() {
                return Err(ErrorCode::DecodingFailed);
            }
            Ok((header, &rest[hlen..]))
        }
    }
}
