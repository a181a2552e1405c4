//! Error currency of the Reach stack.
//!
//! One enum carries both the wire-visible result codes (encoded as `i32`
//! in `result` fields and `ERROR_REPORT` messages) and the internal flow
//! sentinels the dispatcher steers by (`NoData`, `NoResponse`,
//! `Incomplete`). All variants are `Copy` so handler results move through
//! the engine without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Wire-visible result codes
// ---------------------------------------------------------------------------

/// Result codes shared with the client.
///
/// The numeric values are part of the wire contract; `Abort` and
/// `Timeout` live in the reserved range above 1000. `Incomplete` is
/// never encoded: it is the internal "call me again next tick" yield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Operation succeeded.
    NoError,
    /// Nothing to report; the dispatcher tries again later.
    NoData,
    ReadFailed,
    WriteFailed,
    /// Returned by defaulted capability methods the application did not
    /// override.
    NotImplemented,
    PermissionDenied,
    BufferTooSmall,
    InvalidParameter,
    ChecksumMismatch,
    DecodingFailed,
    EncodingFailed,
    InvalidState,
    /// The handler ran but no response frame should be sent.
    NoResponse,
    /// Unknown or inaccessible file ID.
    BadFile,
    /// File-transfer message arrived out of sequence.
    PacketCountErr,
    ChallengeFailed,
    /// A fixed-capacity table (e.g. notification slots) is full.
    NoResource,
    /// A requested object ID does not exist.
    InvalidId,
    /// Operation cancelled.
    Abort,
    /// File-transfer watchdog expired.
    Timeout,
    /// Internal soft yield: re-invoke the same handler next tick without
    /// consuming a new prompt. `NoData` means nothing pending at all.
    Incomplete,
}

impl ErrorCode {
    /// Wire encoding of this code.
    pub const fn as_i32(self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::NoData => 1,
            Self::ReadFailed => 2,
            Self::WriteFailed => 3,
            Self::NotImplemented => 4,
            Self::PermissionDenied => 7,
            Self::BufferTooSmall => 8,
            Self::InvalidParameter => 9,
            Self::ChecksumMismatch => 10,
            Self::DecodingFailed => 11,
            Self::EncodingFailed => 12,
            Self::InvalidState => 13,
            Self::NoResponse => 14,
            Self::BadFile => 15,
            Self::PacketCountErr => 16,
            Self::ChallengeFailed => 17,
            Self::NoResource => 19,
            Self::InvalidId => 20,
            Self::Abort => 1000,
            Self::Timeout => 1001,
            Self::Incomplete => -1,
        }
    }

    /// Decode a wire result code. Unrecognised values collapse to
    /// `InvalidParameter` rather than widening the enum.
    pub const fn from_i32(raw: i32) -> Self {
        match raw {
            0 => Self::NoError,
            1 => Self::NoData,
            2 => Self::ReadFailed,
            3 => Self::WriteFailed,
            4 => Self::NotImplemented,
            7 => Self::PermissionDenied,
            8 => Self::BufferTooSmall,
            9 => Self::InvalidParameter,
            10 => Self::ChecksumMismatch,
            11 => Self::DecodingFailed,
            12 => Self::EncodingFailed,
            13 => Self::InvalidState,
            14 => Self::NoResponse,
            15 => Self::BadFile,
            16 => Self::PacketCountErr,
            17 => Self::ChallengeFailed,
            19 => Self::NoResource,
            20 => Self::InvalidId,
            1000 => Self::Abort,
            1001 => Self::Timeout,
            _ => Self::InvalidParameter,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoError => write!(f, "no error"),
            Self::NoData => write!(f, "no data"),
            Self::ReadFailed => write!(f, "read failed"),
            Self::WriteFailed => write!(f, "write failed"),
            Self::NotImplemented => write!(f, "not implemented"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
            Self::DecodingFailed => write!(f, "decoding failed"),
            Self::EncodingFailed => write!(f, "encoding failed"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::NoResponse => write!(f, "no response"),
            Self::BadFile => write!(f, "bad file"),
            Self::PacketCountErr => write!(f, "packet count error"),
            Self::ChallengeFailed => write!(f, "challenge failed"),
            Self::NoResource => write!(f, "no resource"),
            Self::InvalidId => write!(f, "invalid ID"),
            Self::Abort => write!(f, "aborted"),
            Self::Timeout => write!(f, "timed out"),
            Self::Incomplete => write!(f, "incomplete"),
        }
    }
}

impl From<ErrorCode> for i32 {
    fn from(code: ErrorCode) -> Self {
        code.as_i32()
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Stack-wide `Result` alias; handlers and capability methods use it.
pub type Result<T> = core::result::Result<T, ErrorCode>;
