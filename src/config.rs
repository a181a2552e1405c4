//! Link sizing table and build-time stack configuration.
//!
//! Every buffer capacity in the stack derives from the constants here.
//! The defaults dimension the stack for a BLE link with a 244-byte MTU;
//! retuning them for another transport is legal, but the resulting
//! [`crate::wire::sizes::SizesDescriptor`] must then be republished to
//! clients through the device-info response.

/// Largest frame the stack will emit or accept, in bytes (the link MTU).
pub const MAX_MESSAGE_SIZE: usize = 244;

/// Largest encoded payload inside a message envelope.
pub const MESSAGE_PAYLOAD_MAX: usize = 208;

/// Size of the "big data" buffer: file packet data, error strings,
/// CLI text, stream data, ping echo.
pub const BIG_DATA_BUFFER_LEN: usize = 194;

/// Bytes of file payload carried per `TRANSFER_DATA` message.
pub const BYTES_PER_FILE_PACKET: usize = BIG_DATA_BUFFER_LEN;

/// Parameter IDs accepted in one request list.
pub const COUNT_PARAM_IDS: usize = 32;

/// Parameter descriptors packed per discover response.
pub const COUNT_PARAM_DESC_IN_RESPONSE: usize = 2;

/// Parameter values packed per read response or notification. Also the
/// file/stream descriptor count per discover response.
pub const COUNT_MEDIUM_STRUCTS: usize = 4;

/// Extended-info keys per response and notification configs per message.
pub const COUNT_SMALL_STRUCTS: usize = 8;

/// Command descriptors packed per discover response.
pub const COUNT_COMMANDS_IN_RESPONSE: usize = 2;

/// Notification slots kept by the scheduler.
pub const NUM_SUPPORTED_PARAM_NOTIFY: usize = 8;

/// Longest device/command description string.
pub const LONG_STRING_LEN: usize = 48;

/// Longest parameter-info description string.
pub const PARAM_INFO_DESCRIPTION_LEN: usize = 32;

/// Medium strings: names of parameters, files, commands, streams.
pub const MEDIUM_STRING_LEN: usize = 24;

/// Short strings: units labels, version strings, enum key names.
pub const SHORT_STRING_LEN: usize = 16;

/// Byte capacity of string- and bytes-typed parameter values.
pub const NUM_PARAM_BYTES: usize = 32;

/// Highest legal parameter ID (15 bits).
pub const MAX_PARAM_ID: u32 = 32767;

/// Default data frames between file-transfer acknowledgements when
/// neither the client nor the file capability states a preference.
pub const DEFAULT_ACK_RATE: u32 = 10;

// ---------------------------------------------------------------------------
// Protocol and stack versions
// ---------------------------------------------------------------------------

/// Semantic version of the wire protocol this stack speaks.
pub const PROTOCOL_VERSION: (u8, u8, u8) = (0, 2, 2);

/// Semantic version of this stack implementation.
pub const STACK_VERSION: (u8, u8, u8) = (0, 3, 0);

// ---------------------------------------------------------------------------
// Header layout selection
// ---------------------------------------------------------------------------

/// On-wire header layout. Both carry the same five semantic fields; the
/// build (via the `openpv-header` feature) decides which one outbound
/// frames use. Inbound frames may arrive in either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderFormat {
    /// Single envelope struct holding header and payload together.
    Classic,
    /// OpenPV-compatible: a little-endian `u16` header length, the
    /// encoded header, then the raw payload bytes.
    SizePrefixed,
}

impl Default for HeaderFormat {
    fn default() -> Self {
        if cfg!(feature = "openpv-header") {
            Self::SizePrefixed
        } else {
            Self::Classic
        }
    }
}
