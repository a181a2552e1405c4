//! Port traits, the boundary between the protocol stack and the host
//! application.
//!
//! ```text
//!   Link adapter ──▶ LinkPort ──▶ ReachStack ──▶ capability ports ──▶ app
//! ```
//!
//! The stack consumes these traits via generics, so it never touches
//! the transport or the application's data directly. Every capability
//! method has a default that reports the operation as unsupported (or
//! an empty cursor), so an application implements only the services it
//! advertises. A device that exposes nothing but ping still satisfies
//! every trait bound.
//!
//! Cursor discipline: the `*_discover_reset` / `*_discover_next` pairs
//! form a single iterator owned by the application. The stack resets it
//! at the start of a discovery transaction and then advances it across
//! ticks, so implementations must keep the cursor valid between calls.

use heapless::Vec;

use crate::config::NUM_SUPPORTED_PARAM_NOTIFY;
use crate::error::{ErrorCode, Result};
use crate::wire::codec::encode_payload;
use crate::wire::types::{
    CommandInfo, ConnectionDescription, DeviceInfoRequest, DeviceInfoResponse, FileInfo,
    ParamExInfoResponse, ParamInfo, ParamNotifyConfig, ParamValueRecord, ServiceId, StreamData,
    StreamInfo, TimeGetResponse, TimeSetRequest, WifiConnectionRequest, WifiConnectionResponse,
};

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: transport ↔ stack)
// ───────────────────────────────────────────────────────────────

/// The packet transport beneath the stack.
pub trait LinkPort {
    /// Hand one fully staged frame to the transport.
    fn send_coded_response(&mut self, frame: &[u8]) -> Result<()>;

    /// Pull the next inbound frame into `buf`, returning its length.
    ///
    /// Returns [`ErrorCode::NoData`] when nothing is pending. Adapters
    /// that push frames in from an interrupt context instead use
    /// [`ReachStack::store_coded_prompt`](crate::ReachStack::store_coded_prompt)
    /// and keep this default.
    fn get_coded_prompt(&mut self, buf: &mut [u8]) -> Result<usize> {
        let _ = buf;
        Err(ErrorCode::NoData)
    }

    /// Link RSSI in dBm, echoed in ping responses. 0 when unknown.
    fn signal_strength(&mut self) -> i32 {
        0
    }
}

// ───────────────────────────────────────────────────────────────
// Device port (identity and access control)
// ───────────────────────────────────────────────────────────────

/// Device identity and challenge-key policy.
pub trait DevicePort {
    /// Fill in the identity fields of a device info response: name,
    /// manufacturer, description, firmware version, and the services
    /// bitmask. The stack overrides `protocol_version`,
    /// `parameter_metadata_hash`, and `sizes_struct` afterwards.
    fn device_info(&mut self, request: &DeviceInfoRequest) -> Result<DeviceInfoResponse> {
        let _ = request;
        Err(ErrorCode::NotImplemented)
    }

    /// Inspect the challenge key presented with a device info request.
    /// The application decides what it unlocks.
    fn configure_access_control(&mut self, request: &DeviceInfoRequest) {
        let _ = request;
    }

    /// Whether the most recently presented challenge key unlocks gated
    /// services. Devices without a challenge leave the default.
    fn challenge_key_is_valid(&self) -> bool {
        true
    }

    /// Forget any previously presented challenge key.
    fn invalidate_challenge_key(&mut self) {}

    /// Fine-grained access check for one service, optionally scoped to
    /// a single object ID within it.
    fn access_granted(&self, service: ServiceId, id: Option<u32>) -> bool {
        let _ = (service, id);
        true
    }
}

// ───────────────────────────────────────────────────────────────
// CLI port
// ───────────────────────────────────────────────────────────────

/// Remote command-line entry point.
pub trait CliPort {
    /// Process one line sent by the client. Output goes back through
    /// [`ReachStack::send_cli_notification`](crate::ReachStack::send_cli_notification),
    /// not through a reply to this call.
    fn cli_enter(&mut self, line: &str) -> Result<()> {
        let _ = line;
        Err(ErrorCode::NotImplemented)
    }
}

// ───────────────────────────────────────────────────────────────
// Parameter port (repository of typed parameters)
// ───────────────────────────────────────────────────────────────

/// The parameter repository.
pub trait ParamPort {
    /// Number of parameters visible to the current client.
    fn parameter_count(&mut self) -> usize {
        0
    }

    /// Position the discovery cursor at `pid`, or at the first
    /// parameter whose ID is greater when `pid` is absent.
    fn parameter_discover_reset(&mut self, pid: u32) -> Result<()> {
        let _ = pid;
        Ok(())
    }

    /// Yield the descriptor under the cursor and advance it.
    /// [`ErrorCode::NoData`] when the cursor is exhausted.
    fn parameter_discover_next(&mut self) -> Result<ParamInfo> {
        Err(ErrorCode::NoData)
    }

    /// Number of extended-info objects for `pid`, or for the whole
    /// repository when `pid` is `None`.
    fn parameter_ex_count(&mut self, pid: Option<u32>) -> usize {
        let _ = pid;
        0
    }

    fn parameter_ex_discover_reset(&mut self, pid: Option<u32>) -> Result<()> {
        let _ = pid;
        Ok(())
    }

    fn parameter_ex_discover_next(&mut self) -> Result<ParamExInfoResponse> {
        Err(ErrorCode::NoData)
    }

    /// Read one parameter. The record carries the value, its wire type
    /// tag, and the application's timestamp.
    fn parameter_read(&mut self, pid: u32) -> Result<ParamValueRecord> {
        let _ = pid;
        Err(ErrorCode::NotImplemented)
    }

    /// Write one parameter. Type identity is checked by the
    /// application; a tag mismatch is [`ErrorCode::InvalidParameter`].
    fn parameter_write(&mut self, value: &ParamValueRecord) -> Result<()> {
        let _ = value;
        Err(ErrorCode::NotImplemented)
    }

    /// Hash of the full descriptor table, advertised in device info so
    /// clients know when to drop cached discovery results.
    ///
    /// The default folds the encoded form of every descriptor through
    /// FNV-1a using the discovery cursor, which it resets. Applications
    /// with many parameters usually precompute this.
    fn compute_parameter_hash(&mut self) -> u32 {
        const FNV_OFFSET: u32 = 0x811c_9dc5;
        const FNV_PRIME: u32 = 0x0100_0193;
        let mut hash = FNV_OFFSET;
        let mut scratch = [0u8; 192];
        if self.parameter_discover_reset(0).is_err() {
            return hash;
        }
        while let Ok(info) = self.parameter_discover_next() {
            if let Ok(len) = encode_payload(&info, &mut scratch) {
                for byte in &scratch[..len] {
                    hash = (hash ^ u32::from(*byte)).wrapping_mul(FNV_PRIME);
                }
            }
        }
        hash
    }

    /// Notification configs to install at startup, before any client
    /// enables its own.
    fn parameter_notification_init(&mut self) -> Vec<ParamNotifyConfig, NUM_SUPPORTED_PARAM_NOTIFY> {
        Vec::new()
    }
}

// ───────────────────────────────────────────────────────────────
// Command port
// ───────────────────────────────────────────────────────────────

/// Named, argumentless remote commands.
pub trait CommandPort {
    fn command_count(&mut self) -> usize {
        0
    }

    fn command_discover_reset(&mut self, cid: u32) -> Result<()> {
        let _ = cid;
        Ok(())
    }

    fn command_discover_next(&mut self) -> Result<CommandInfo> {
        Err(ErrorCode::NoData)
    }

    /// Run one command to completion. Long-running work should return
    /// quickly and report progress through a parameter or the CLI.
    fn command_execute(&mut self, cid: u32) -> Result<()> {
        let _ = cid;
        Err(ErrorCode::NotImplemented)
    }
}

// ───────────────────────────────────────────────────────────────
// File port (bulk storage behind the transfer engine)
// ───────────────────────────────────────────────────────────────

/// Files readable or writable through the windowed transfer engine.
pub trait FilePort {
    fn file_count(&mut self) -> usize {
        0
    }

    fn file_discover_reset(&mut self, fid: u32) -> Result<()> {
        let _ = fid;
        Ok(())
    }

    fn file_discover_next(&mut self) -> Result<FileInfo> {
        Err(ErrorCode::NoData)
    }

    /// Descriptor for one file ID. [`ErrorCode::BadFile`] when the ID
    /// names nothing.
    fn file_get_description(&mut self, fid: u32) -> Result<FileInfo> {
        let _ = fid;
        Err(ErrorCode::BadFile)
    }

    /// Ack rate this file prefers, overriding the client's request.
    /// `None` accepts whatever the client asked for.
    fn file_preferred_ack_rate(&mut self, fid: u32, is_write: bool) -> Option<u32> {
        let _ = (fid, is_write);
        None
    }

    /// Copy file bytes at `offset` into `out`, returning the count. A
    /// short count near the end of the file is normal.
    fn file_read(&mut self, fid: u32, offset: usize, out: &mut [u8]) -> Result<usize> {
        let _ = (fid, offset, out);
        Err(ErrorCode::NotImplemented)
    }

    /// Store `data` at `offset`. Offsets arrive in order within a
    /// transfer; rewinds only happen after a reported retry.
    fn file_write(&mut self, fid: u32, offset: usize, data: &[u8]) -> Result<()> {
        let _ = (fid, offset, data);
        Err(ErrorCode::NotImplemented)
    }

    /// Erase one file. May return [`ErrorCode::Incomplete`] to be
    /// called again on the next tick while the flash erase runs.
    fn file_erase(&mut self, fid: u32) -> Result<()> {
        let _ = fid;
        Err(ErrorCode::NotImplemented)
    }

    /// Called once before the first write of an inbound transfer, with
    /// the announced offset and length.
    fn file_prepare_to_write(&mut self, fid: u32, offset: usize, bytes: usize) -> Result<()> {
        let _ = (fid, offset, bytes);
        Ok(())
    }

    /// Called when a transfer leaves the engine for any reason, with
    /// the final result code.
    fn file_transfer_complete(&mut self, fid: u32, result: ErrorCode) {
        let _ = (fid, result);
    }
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Wall-clock access for devices with a settable RTC.
pub trait TimePort {
    fn time_get(&mut self) -> Result<TimeGetResponse> {
        Err(ErrorCode::NotImplemented)
    }

    fn time_set(&mut self, request: &TimeSetRequest) -> Result<()> {
        let _ = request;
        Err(ErrorCode::NotImplemented)
    }
}

// ───────────────────────────────────────────────────────────────
// Wi-Fi port
// ───────────────────────────────────────────────────────────────

/// Access-point discovery and connection management.
pub trait WifiPort {
    /// Kick off (or refresh) a scan. Discovery reads the cursor after
    /// this returns, so implementations usually scan synchronously or
    /// serve a cached list.
    fn wifi_discover_begin(&mut self) -> Result<()> {
        Err(ErrorCode::NotImplemented)
    }

    /// Number of access points the last scan found.
    fn wifi_count(&mut self) -> usize {
        0
    }

    fn wifi_discover_reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn wifi_discover_next(&mut self) -> Result<ConnectionDescription> {
        Err(ErrorCode::NoData)
    }

    /// Connect, disconnect, or update stored credentials.
    fn wifi_connect(&mut self, request: &WifiConnectionRequest) -> Result<WifiConnectionResponse> {
        let _ = request;
        Err(ErrorCode::NotImplemented)
    }
}

// ───────────────────────────────────────────────────────────────
// Stream port
// ───────────────────────────────────────────────────────────────

/// Unacknowledged data pipes multiplexed over the link.
pub trait StreamPort {
    fn stream_count(&mut self) -> usize {
        0
    }

    fn stream_discover_reset(&mut self, sid: u32) -> Result<()> {
        let _ = sid;
        Ok(())
    }

    fn stream_discover_next(&mut self) -> Result<StreamInfo> {
        Err(ErrorCode::NoData)
    }

    fn stream_get_description(&mut self, sid: u32) -> Result<StreamInfo> {
        let _ = sid;
        Err(ErrorCode::InvalidParameter)
    }

    fn stream_open(&mut self, sid: u32) -> Result<()> {
        let _ = sid;
        Err(ErrorCode::NotImplemented)
    }

    fn stream_close(&mut self, sid: u32) -> Result<()> {
        let _ = sid;
        Ok(())
    }

    /// Pull the next outbound frame of an open device-to-client
    /// stream. [`ErrorCode::NoData`] when the pipe is dry.
    fn stream_read(&mut self, sid: u32) -> Result<StreamData> {
        let _ = sid;
        Err(ErrorCode::NoData)
    }

    /// Accept one inbound frame of an open client-to-device stream.
    fn stream_write(&mut self, data: &StreamData) -> Result<()> {
        let _ = data;
        Err(ErrorCode::NotImplemented)
    }
}

// ───────────────────────────────────────────────────────────────
// Aggregate application bound
// ───────────────────────────────────────────────────────────────

/// Everything the stack asks of the host application, as one bound.
///
/// Blanket-implemented, so any type implementing the capability ports
/// (even just their defaults) is a `ReachApp`.
pub trait ReachApp:
    DevicePort + CliPort + ParamPort + CommandPort + FilePort + TimePort + WifiPort + StreamPort
{
}

impl<T> ReachApp for T where
    T: DevicePort + CliPort + ParamPort + CommandPort + FilePort + TimePort + WifiPort + StreamPort
{
}
