//! File service: discovery, erase, and the transfer state machine.
//!
//! One transfer at a time, either direction, moving file bytes in
//! packets of up to `BYTES_PER_FILE_PACKET`. Reads stream out as a
//! continued transaction paused every `ack_rate` frames until the
//! client acknowledges; writes stream in with the same windowing and
//! are acknowledged by the device. Both directions carry a 1-based
//! `message_number` (reads count across the whole transfer, writes
//! restart at each window), an optional RFC 1071 checksum over the
//! packet payload, and a `retry_offset` that tells the other side
//! where to resume after an error.
//!
//! A per-transfer watchdog re-arms on every sign of progress and
//! aborts the transfer when the client goes quiet.

use core::fmt::Write as _;

use log::{info, warn};

use crate::config::{BYTES_PER_FILE_PACKET, COUNT_MEDIUM_STRUCTS, DEFAULT_ACK_RATE};
use crate::error::{ErrorCode, Result};
use crate::ports::FilePort;
use crate::wire::types::{
    AccessLevel, BigString, DiscoverFilesResponse, FileEraseRequest, FileEraseResponse,
    FileTransferData, FileTransferDataNotification, FileTransferRequest, FileTransferResponse,
    TransferDirection,
};

/// Internet checksum (RFC 1071) over `data`: big-endian 16-bit word
/// sum with an odd trailing byte padded low, carries folded, result
/// complemented.
pub fn rfc1071_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut words = data.chunks_exact(2);
    for word in &mut words {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [odd] = words.remainder() {
        sum += u32::from(u16::from_be_bytes([*odd, 0]));
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

fn packet_checksum(data: &[u8]) -> i32 {
    i32::from(rfc1071_checksum(data))
}

// ── Discovery and erase ───────────────────────────────────────

/// First frame of DISCOVER_FILES.
pub fn handle_discover_files(
    app: &mut impl FilePort,
) -> Result<(DiscoverFilesResponse, u32)> {
    app.file_discover_reset(0)?;
    let total = app.file_count();
    let frames = (total.div_ceil(COUNT_MEDIUM_STRUCTS)) as u32;
    let first = produce_files_batch(app);
    Ok((first, frames.saturating_sub(1)))
}

/// One DISCOVER_FILES frame worth of descriptions.
pub fn produce_files_batch(app: &mut impl FilePort) -> DiscoverFilesResponse {
    let mut response = DiscoverFilesResponse::default();
    while !response.file_infos.is_full() {
        let Ok(info) = app.file_discover_next() else {
            break;
        };
        let _ = response.file_infos.push(info);
    }
    response
}

/// ERASE_FILE. `Incomplete` propagates so the dispatcher can re-invoke
/// the erase on later ticks; the response waits until it resolves.
/// Other failures answer in-band.
pub fn handle_erase(req: &FileEraseRequest, app: &mut impl FilePort) -> Result<FileEraseResponse> {
    match app.file_erase(req.file_id) {
        Ok(()) => {
            info!("file {} erased", req.file_id);
            Ok(FileEraseResponse {
                result: 0,
                file_id: req.file_id,
                result_message: None,
            })
        }
        Err(ErrorCode::Incomplete) => Err(ErrorCode::Incomplete),
        Err(code) => {
            let mut message = BigString::new();
            let _ = write!(message, "erase: {}", code);
            Ok(FileEraseResponse {
                result: code.as_i32(),
                file_id: req.file_id,
                result_message: Some(message),
            })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferState {
    #[default]
    Idle,
    Init,
    Data,
    Complete,
}

/// What the init handler asks of the engine besides the response.
#[derive(Debug, Clone, PartialEq)]
pub struct InitOutcome {
    pub response: FileTransferResponse,
    /// Data frames the engine will produce for a read; 0 for writes
    /// and degenerate transfers.
    pub read_frames: u32,
}

/// Engine directive after a read-side acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadAck {
    /// Window reopened; keep producing.
    Continue,
    /// Client asked for a rewind; this many frames are owed again.
    Rewind(u32),
    /// Transfer done; drop the continued record.
    Finished,
}

#[derive(Debug, Default)]
pub struct FileTransfer {
    state: TransferState,
    direction: Option<TransferDirection>,
    file_id: u32,
    transfer_id: u32,
    base_offset: u32,
    transfer_length: u32,
    bytes_moved: u32,
    message_number: u32,
    ack_rate: u32,
    messages_since_ack: u32,
    require_checksum: bool,
    /// Last offset known good, where a retry resumes.
    retry_offset: u32,
    timeout_in_ms: u32,
    watchdog_deadline: Option<u32>,
}

impl FileTransfer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state != TransferState::Idle
    }

    pub fn file_id(&self) -> u32 {
        self.file_id
    }

    pub fn transfer_id(&self) -> u32 {
        self.transfer_id
    }

    /// Whether the read producer may emit another frame now.
    pub fn window_open(&self) -> bool {
        matches!(self.state, TransferState::Init | TransferState::Data)
            && self.messages_since_ack < self.ack_rate
    }

    // ── Init ──────────────────────────────────────────────────

    pub fn handle_init(
        &mut self,
        req: &FileTransferRequest,
        now: u32,
        app: &mut impl FilePort,
    ) -> Result<InitOutcome> {
        if self.is_active() {
            return Err(ErrorCode::InvalidState);
        }
        let desc = app.file_get_description(req.file_id)?;
        let is_write = req.read_write == TransferDirection::Write;
        let readable = matches!(desc.access, AccessLevel::Read | AccessLevel::ReadWrite);
        let writable = matches!(desc.access, AccessLevel::Write | AccessLevel::ReadWrite);
        if (is_write && !writable) || (!is_write && !readable) {
            return Err(ErrorCode::PermissionDenied);
        }

        let length = if is_write {
            if desc.maximum_size_bytes != 0
                && req.request_offset.saturating_add(req.transfer_length) > desc.maximum_size_bytes
            {
                return Err(ErrorCode::InvalidParameter);
            }
            req.transfer_length
        } else {
            // A read never runs past the end of the file.
            let available = desc.current_size_bytes.saturating_sub(req.request_offset);
            req.transfer_length.min(available)
        };

        let num_frames = length.div_ceil(BYTES_PER_FILE_PACKET as u32);
        let requested = req.requested_ack_rate.unwrap_or(0);
        let preferred = app.file_preferred_ack_rate(req.file_id, is_write);
        let mut ack_rate = preferred.unwrap_or(requested);
        if ack_rate == 0 {
            ack_rate = DEFAULT_ACK_RATE;
        }
        if num_frames != 0 {
            ack_rate = ack_rate.clamp(1, num_frames);
        }
        let mut result_message = None;
        if let Some(rate) = preferred {
            if rate != requested {
                let mut message = BigString::new();
                let _ = write!(message, "Using preferred ack rate of {}", rate);
                result_message = Some(message);
            }
        }

        let response = FileTransferResponse {
            result: 0,
            transfer_id: req.transfer_id,
            ack_rate,
            transfer_length: length,
            result_message,
        };

        if length == 0 {
            // Nothing to move; acknowledge and stay idle.
            return Ok(InitOutcome {
                response,
                read_frames: 0,
            });
        }
        if is_write {
            app.file_prepare_to_write(
                req.file_id,
                req.request_offset as usize,
                length as usize,
            )?;
        }

        self.state = TransferState::Init;
        self.direction = Some(req.read_write);
        self.file_id = req.file_id;
        self.transfer_id = req.transfer_id;
        self.base_offset = req.request_offset;
        self.transfer_length = length;
        self.bytes_moved = 0;
        self.message_number = 0;
        self.ack_rate = ack_rate;
        self.messages_since_ack = 0;
        self.require_checksum = req.require_checksum;
        self.retry_offset = req.request_offset;
        self.timeout_in_ms = req.timeout_in_ms;
        self.watchdog_deadline = None;
        self.stroke_watchdog(now);

        info!(
            "file {} transfer {} init: {:?}, {} bytes @ {}, ack rate {}",
            self.file_id, self.transfer_id, req.read_write, length, self.base_offset, ack_rate
        );
        Ok(InitOutcome {
            response,
            read_frames: if is_write { 0 } else { num_frames },
        })
    }

    // ── Read data plane (device → client) ─────────────────────

    /// Fill the next outbound data packet. Callers check
    /// [`window_open`](Self::window_open) first.
    pub fn produce_read_frame(
        &mut self,
        now: u32,
        app: &mut impl FilePort,
    ) -> Result<FileTransferData> {
        if self.direction != Some(TransferDirection::Read) || !self.window_open() {
            return Err(ErrorCode::InvalidState);
        }
        let offset = self.base_offset + self.bytes_moved;
        let want = (self.transfer_length - self.bytes_moved).min(BYTES_PER_FILE_PACKET as u32);
        if want == 0 {
            return Err(ErrorCode::NoData);
        }

        let mut buf = [0u8; BYTES_PER_FILE_PACKET];
        let got = match app.file_read(self.file_id, offset as usize, &mut buf[..want as usize]) {
            Ok(0) | Err(ErrorCode::NoData) => {
                self.abort(ErrorCode::ReadFailed, app);
                return Err(ErrorCode::ReadFailed);
            }
            Ok(n) => n,
            Err(code) => {
                self.abort(code, app);
                return Err(code);
            }
        };

        self.state = TransferState::Data;
        self.message_number += 1;
        self.bytes_moved += got as u32;
        self.messages_since_ack += 1;
        self.stroke_watchdog(now);
        if self.bytes_moved >= self.transfer_length {
            self.state = TransferState::Complete;
        }

        let payload = &buf[..got];
        Ok(FileTransferData {
            result: 0,
            transfer_id: self.transfer_id,
            message_number: self.message_number,
            // Slice length is bounded by the buffer, push cannot fail.
            message_data: heapless::Vec::from_slice(payload)
                .map_err(|_| ErrorCode::EncodingFailed)?,
            checksum: self.require_checksum.then(|| packet_checksum(payload)),
        })
    }

    /// Apply the client's acknowledgement of a read window.
    pub fn handle_read_ack(
        &mut self,
        note: &FileTransferDataNotification,
        now: u32,
        app: &mut impl FilePort,
    ) -> Result<ReadAck> {
        if self.direction != Some(TransferDirection::Read) || !self.is_active() {
            // Stray ack, e.g. after a watchdog abort. Ignore quietly.
            return Err(ErrorCode::NoResponse);
        }
        if note.is_complete {
            info!("file {} transfer {} complete", self.file_id, self.transfer_id);
            self.finish(ErrorCode::NoError, app);
            return Ok(ReadAck::Finished);
        }
        if note.result != 0 {
            let resume = note.retry_offset.clamp(self.base_offset, self.end_offset());
            self.bytes_moved = resume - self.base_offset;
            self.messages_since_ack = 0;
            self.state = TransferState::Data;
            self.stroke_watchdog(now);
            let frames_left =
                (self.transfer_length - self.bytes_moved).div_ceil(BYTES_PER_FILE_PACKET as u32);
            warn!(
                "file {} transfer {}: client retry from offset {}",
                self.file_id, self.transfer_id, resume
            );
            return Ok(ReadAck::Rewind(frames_left));
        }
        self.messages_since_ack = 0;
        self.stroke_watchdog(now);
        Ok(ReadAck::Continue)
    }

    // ── Write data plane (client → device) ────────────────────

    /// Accept one inbound data packet. `Ok(None)` means mid-window,
    /// nothing to send back.
    pub fn handle_write_data(
        &mut self,
        data: &FileTransferData,
        now: u32,
        app: &mut impl FilePort,
    ) -> Result<Option<FileTransferDataNotification>> {
        if self.direction != Some(TransferDirection::Write) || !self.is_active() {
            return Err(ErrorCode::InvalidState);
        }
        self.state = TransferState::Data;
        self.stroke_watchdog(now);

        let expected = self.message_number + 1;
        if data.message_number != expected {
            warn!(
                "file {} transfer {}: expected message {} got {}",
                self.file_id, self.transfer_id, expected, data.message_number
            );
            return Ok(Some(self.retry_notification(ErrorCode::PacketCountErr)));
        }
        if self.require_checksum {
            let valid = data
                .checksum
                .is_some_and(|sum| sum == packet_checksum(&data.message_data));
            if !valid {
                warn!(
                    "file {} transfer {}: checksum mismatch on message {}",
                    self.file_id, self.transfer_id, data.message_number
                );
                return Ok(Some(self.retry_notification(ErrorCode::ChecksumMismatch)));
            }
        }

        let offset = self.base_offset + self.bytes_moved;
        if let Err(code) = app.file_write(self.file_id, offset as usize, &data.message_data) {
            self.abort(code, app);
            return Err(code);
        }
        self.bytes_moved += data.message_data.len() as u32;
        self.message_number += 1;
        self.messages_since_ack += 1;
        self.retry_offset = self.base_offset + self.bytes_moved;

        if self.bytes_moved >= self.transfer_length {
            info!("file {} transfer {} complete", self.file_id, self.transfer_id);
            let note = FileTransferDataNotification {
                result: 0,
                result_message: None,
                is_complete: true,
                transfer_id: self.transfer_id,
                retry_offset: self.retry_offset,
            };
            self.finish(ErrorCode::NoError, app);
            return Ok(Some(note));
        }
        if self.messages_since_ack >= self.ack_rate {
            // Window boundary; numbering restarts with the next window.
            self.messages_since_ack = 0;
            self.message_number = 0;
            return Ok(Some(FileTransferDataNotification {
                result: 0,
                result_message: None,
                is_complete: false,
                transfer_id: self.transfer_id,
                retry_offset: self.retry_offset,
            }));
        }
        Ok(None)
    }

    /// Ask the client to resend from the last good offset. The window
    /// restarts so the retry arrives as message 1.
    fn retry_notification(&mut self, code: ErrorCode) -> FileTransferDataNotification {
        self.bytes_moved = self.retry_offset - self.base_offset;
        self.message_number = 0;
        self.messages_since_ack = 0;
        let mut message = BigString::new();
        let _ = write!(message, "{}", code);
        FileTransferDataNotification {
            result: code.as_i32(),
            result_message: Some(message),
            is_complete: false,
            transfer_id: self.transfer_id,
            retry_offset: self.retry_offset,
        }
    }

    // ── Watchdog and teardown ─────────────────────────────────

    fn stroke_watchdog(&mut self, now: u32) {
        if self.timeout_in_ms != 0 {
            self.watchdog_deadline = Some(now.wrapping_add(self.timeout_in_ms));
        }
    }

    pub fn watchdog_expired(&self, now: u32) -> bool {
        self.is_active()
            && self
                .watchdog_deadline
                .is_some_and(|deadline| now.wrapping_sub(deadline) as i32 >= 0)
    }

    /// Tear down an active transfer with `code`, telling the file
    /// capability. Returns the file ID when something was torn down.
    pub fn abort(&mut self, code: ErrorCode, app: &mut impl FilePort) -> Option<u32> {
        if !self.is_active() {
            return None;
        }
        warn!(
            "file {} transfer {} aborted: {}",
            self.file_id, self.transfer_id, code
        );
        let fid = self.file_id;
        self.finish(code, app);
        Some(fid)
    }

    fn finish(&mut self, code: ErrorCode, app: &mut impl FilePort) {
        app.file_transfer_complete(self.file_id, code);
        *self = Self::default();
    }

    /// Drop all state without touching the application, for link-down.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn end_offset(&self) -> u32 {
        self.base_offset + self.transfer_length
    }
}
