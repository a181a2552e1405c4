//! The dispatcher at the centre of the stack.
//!
//! [`ReachStack`] owns every piece of per-session state: the staged
//! prompt and response frames, the live continued transaction, the
//! parameter cursor, the notification table, the file-transfer state
//! machine, and the open-stream set. All work happens inside
//! [`process`](ReachStack::process), which the host calls from its
//! main loop; nothing here blocks and at most one outbound frame
//! leaves per call.
//!
//! Each tick walks a fixed ladder:
//!
//! 1. a pending erase gets another chance to resolve;
//! 2. a live continued transaction emits its next frame (file reads
//!    only while the ack window is open);
//! 3. otherwise one prompt is pulled and dispatched, gated and decoded
//!    here, handled by the service modules;
//! 4. on quiet ticks a stashed error report, a due parameter
//!    notification, or one frame of an open stream goes out instead;
//! 5. the transfer watchdog is checked last, whatever else happened.
//!
//! Responses leave through [`LinkPort::send_coded_response`]; when the
//! transport refuses, the frame stays staged so a poll-model host can
//! collect it with [`get_coded_response_buffer`](ReachStack::get_coded_response_buffer).

use core::fmt::Write as _;

use log::{info, warn};
use serde::Serialize;

use crate::config::{MAX_MESSAGE_SIZE, PROTOCOL_VERSION, STACK_VERSION};
use crate::error::{ErrorCode, Result};
use crate::ports::{LinkPort, ParamPort, ReachApp};
use crate::stack::access;
use crate::stack::commands;
use crate::stack::continued::{starts_continued, ContinuedKind, ContinuedTransaction};
use crate::stack::device;
use crate::stack::notify::NotifyTable;
use crate::stack::params::{self, ParamCursor};
use crate::stack::streams::{self, OpenStreams};
use crate::stack::time;
use crate::stack::transfer::{self, FileTransfer, ReadAck};
use crate::stack::wifi;
use crate::wire::codec::{decode_payload, Framing};
use crate::wire::types::{
    BigString, CliData, DeviceInfoRequest, DiscoverCommands, DiscoverFiles, DiscoverNotifications,
    DiscoverStreams, DiscoverWifiRequest, ErrorReport, FileEraseRequest, FileTransferData,
    FileTransferDataNotification, FileTransferRequest, MessageHeader, MessageType,
    ParamDisableNotifications, ParamEnableNotifications, ParameterInfoRequest, ParameterRead,
    ParameterWrite, PingRequest, SendCommand, ServiceId, ShortString, StreamClose, StreamData,
    StreamOpen, TimeGetRequest, TimeSetRequest, WifiConnectionRequest,
};

/// One staged frame. The length doubles as the occupancy flag.
#[derive(Debug)]
struct FrameSlot {
    buf: [u8; MAX_MESSAGE_SIZE],
    len: usize,
}

impl FrameSlot {
    const fn new() -> Self {
        Self {
            buf: [0; MAX_MESSAGE_SIZE],
            len: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn clear(&mut self) {
        self.len = 0;
    }
}

/// An erase still running at the file capability, with the header its
/// eventual response must echo.
#[derive(Debug, Clone, Copy)]
struct PendingErase {
    file_id: u32,
    reply_to: MessageHeader,
}

/// The device-side protocol stack. One instance per link.
pub struct ReachStack {
    framing: Framing,
    connected: bool,
    ticks: u32,
    prompt: FrameSlot,
    response: FrameSlot,
    continued: Option<ContinuedTransaction>,
    param_cursor: ParamCursor,
    notify: NotifyTable,
    transfer: FileTransfer,
    streams: OpenStreams,
    pending_error: Option<ErrorReport>,
    pending_erase: Option<PendingErase>,
}

impl Default for ReachStack {
    fn default() -> Self {
        Self::new()
    }
}

impl ReachStack {
    pub fn new() -> Self {
        Self {
            framing: Framing::default(),
            connected: false,
            ticks: 0,
            prompt: FrameSlot::new(),
            response: FrameSlot::new(),
            continued: None,
            param_cursor: ParamCursor::default(),
            notify: NotifyTable::new(),
            transfer: FileTransfer::new(),
            streams: OpenStreams::new(),
            pending_error: None,
            pending_erase: None,
        }
    }

    /// Drop all session state. The link starts disconnected.
    pub fn init(&mut self) {
        *self = Self::new();
    }

    // ── Main loop entry ───────────────────────────────────────

    /// Advance the stack by one tick. `ticks` is the host's
    /// milliseconds-ish monotonic counter; wrap-around is fine.
    pub fn process(&mut self, ticks: u32, link: &mut impl LinkPort, app: &mut impl ReachApp) {
        self.ticks = ticks;
        if !self.connected {
            return;
        }
        let mut sent_this_tick = false;

        if self.step_pending_erase(link, app) {
            sent_this_tick = true;
        }

        if !sent_this_tick && self.step_continued(link, app) {
            sent_this_tick = true;
        }

        let mut dispatched = false;
        if !sent_this_tick {
            let mut frame = [0u8; MAX_MESSAGE_SIZE];
            if let Some(len) = self.pull_prompt(link, &mut frame) {
                dispatched = true;
                if self.dispatch(&frame[..len], link, app) {
                    sent_this_tick = true;
                }
            }
        }

        if !sent_this_tick && !dispatched {
            // Quiet tick; device-initiated traffic gets its turn. None
            // of it touches the response slot.
            if self.flush_pending_error(link) {
                sent_this_tick = true;
            } else if let Some(batch) = self.notify.poll(ticks, app) {
                sent_this_tick =
                    self.send_async(link, MessageType::ParameterNotification, &batch);
            } else if let Some(data) = self.streams.poll_next(app) {
                sent_this_tick =
                    self.send_async(link, MessageType::StreamDataNotification, &data);
            }
        }

        // The watchdog runs whatever else the tick did.
        if self.transfer.watchdog_expired(ticks) {
            self.transfer.abort(ErrorCode::Timeout, app);
            if self
                .continued
                .is_some_and(|cont| cont.kind() == ContinuedKind::FileReadData)
            {
                self.continued = None;
            }
            self.queue_error(ErrorCode::Timeout, "file transfer timed out");
            if !sent_this_tick {
                self.flush_pending_error(link);
            }
        }
    }

    // ── Link lifecycle ────────────────────────────────────────

    /// Tell the stack the transport came up or went down. Down tears
    /// down everything in flight; up starts from a clean slate and
    /// re-arms the device-initiated notification defaults.
    pub fn set_comm_link_connected(&mut self, connected: bool, app: &mut impl ReachApp) {
        if connected == self.connected {
            return;
        }
        self.connected = connected;
        if connected {
            info!("comm link up");
            self.reset_session(app);
            self.notify.install_defaults(self.ticks, app);
        } else {
            info!("comm link down");
            self.transfer.abort(ErrorCode::Abort, app);
            self.reset_session(app);
            app.invalidate_challenge_key();
        }
    }

    pub fn get_comm_link_connected(&self) -> bool {
        self.connected
    }

    pub fn get_current_ticks(&self) -> u32 {
        self.ticks
    }

    fn reset_session(&mut self, app: &mut impl ReachApp) {
        self.prompt.clear();
        self.response.clear();
        self.continued = None;
        self.param_cursor = ParamCursor::default();
        self.notify.clear();
        self.transfer.reset();
        self.streams.close_all(app);
        self.pending_error = None;
        self.pending_erase = None;
    }

    // ── Host-facing frame slots ───────────────────────────────

    /// Push one inbound frame for the next `process` call. Transports
    /// that deliver frames from callbacks use this instead of
    /// [`LinkPort::get_coded_prompt`].
    pub fn store_coded_prompt(&mut self, frame: &[u8]) -> Result<()> {
        if frame.is_empty() {
            return Err(ErrorCode::InvalidParameter);
        }
        if frame.len() > MAX_MESSAGE_SIZE {
            return Err(ErrorCode::BufferTooSmall);
        }
        if !self.prompt.is_empty() {
            return Err(ErrorCode::NoResource);
        }
        self.prompt.buf[..frame.len()].copy_from_slice(frame);
        self.prompt.len = frame.len();
        Ok(())
    }

    /// Collect a response the transport could not take when it was
    /// staged. The stored length zeroes on a successful read.
    pub fn get_coded_response_buffer(&mut self, out: &mut [u8]) -> Result<usize> {
        if self.response.is_empty() {
            return Err(ErrorCode::NoData);
        }
        if out.len() < self.response.len {
            return Err(ErrorCode::BufferTooSmall);
        }
        let len = self.response.len;
        out[..len].copy_from_slice(&self.response.buf[..len]);
        self.response.clear();
        Ok(len)
    }

    // ── Device-initiated traffic ──────────────────────────────

    /// Stage an asynchronous error report. It leaves on the next quiet
    /// tick, never between the frames of a continued transaction.
    pub fn report_error(&mut self, code: ErrorCode, message: &str) {
        self.queue_error(code, message);
    }

    /// Push one line of console output to the client.
    pub fn send_cli_notification(&mut self, link: &mut impl LinkPort, text: &str) -> Result<()> {
        if !self.connected {
            return Err(ErrorCode::InvalidState);
        }
        let data = CliData {
            message_data: BigString::try_from(text).map_err(|_| ErrorCode::BufferTooSmall)?,
        };
        self.send_direct(link, MessageType::CliNotification, &data)
    }

    /// Push one frame of an open device-to-client stream outside the
    /// polling rotation.
    pub fn send_stream_notification(
        &mut self,
        link: &mut impl LinkPort,
        data: &StreamData,
    ) -> Result<()> {
        if !self.connected || !self.streams.is_open(data.stream_id) {
            return Err(ErrorCode::InvalidState);
        }
        self.send_direct(link, MessageType::StreamDataNotification, data)
    }

    /// Re-arm the device-initiated notification defaults from the
    /// parameter capability.
    pub fn init_param_notifications(&mut self, app: &mut impl ParamPort) {
        self.notify.install_defaults(self.ticks, app);
    }

    /// Drop every active parameter notification.
    pub fn clear_param_notifications(&mut self) {
        self.notify.clear();
    }

    // ── Version surfaces ──────────────────────────────────────

    /// Version of this stack implementation.
    pub fn stack_version() -> ShortString {
        version_string(STACK_VERSION)
    }

    /// Version of the wire protocol it speaks.
    pub fn protocol_version() -> ShortString {
        version_string(PROTOCOL_VERSION)
    }

    // ── Tick steps ────────────────────────────────────────────

    /// Re-invoke an erase that yielded `Incomplete`. True when its
    /// response finally left.
    fn step_pending_erase(&mut self, link: &mut impl LinkPort, app: &mut impl ReachApp) -> bool {
        let Some(pending) = self.pending_erase else {
            return false;
        };
        let req = FileEraseRequest {
            file_id: pending.file_id,
        };
        match transfer::handle_erase(&req, app) {
            Ok(response) => {
                self.pending_erase = None;
                self.send_reply(link, &pending.reply_to, MessageType::EraseFile, 0, &response)
            }
            Err(_) => false,
        }
    }

    /// Emit the next frame of the live continued transaction, if its
    /// window allows one. True when a frame left.
    fn step_continued(&mut self, link: &mut impl LinkPort, app: &mut impl ReachApp) -> bool {
        let Some(mut cont) = self.continued else {
            return false;
        };
        if cont.kind() == ContinuedKind::FileReadData && !self.transfer.window_open() {
            return false;
        }

        let sent = match cont.kind() {
            ContinuedKind::DiscoverParameters => {
                let batch = params::produce_discover_batch(&mut self.param_cursor, app);
                let remaining = cont.step();
                let header = cont.frame_header(remaining);
                self.send_frame(link, &header, &batch)
            }
            ContinuedKind::ReadParameters => {
                let batch = params::produce_read_batch(&mut self.param_cursor, app);
                let remaining = cont.step();
                let header = cont.frame_header(remaining);
                self.send_frame(link, &header, &batch)
            }
            ContinuedKind::DiscoverCommands => {
                let batch = commands::produce_commands_batch(app);
                let remaining = cont.step();
                let header = cont.frame_header(remaining);
                self.send_frame(link, &header, &batch)
            }
            ContinuedKind::DiscoverFiles => {
                let batch = transfer::produce_files_batch(app);
                let remaining = cont.step();
                let header = cont.frame_header(remaining);
                self.send_frame(link, &header, &batch)
            }
            ContinuedKind::DiscoverStreams => {
                let batch = streams::produce_streams_batch(app);
                let remaining = cont.step();
                let header = cont.frame_header(remaining);
                self.send_frame(link, &header, &batch)
            }
            ContinuedKind::DiscoverParamEx => {
                match params::produce_ex_next(&mut self.param_cursor, app) {
                    Ok(object) => {
                        let remaining = cont.step();
                        let header = cont.frame_header(remaining);
                        self.send_frame(link, &header, &object)
                    }
                    Err(code) => {
                        warn!("extended discovery ended early: {}", code);
                        self.continued = None;
                        return false;
                    }
                }
            }
            ContinuedKind::DiscoverWifi => match wifi::produce_wifi_next(app) {
                Ok(object) => {
                    let remaining = cont.step();
                    let header = cont.frame_header(remaining);
                    self.send_frame(link, &header, &object)
                }
                Err(code) => {
                    warn!("wifi discovery ended early: {}", code);
                    self.continued = None;
                    return false;
                }
            },
            ContinuedKind::FileReadData => {
                match self.transfer.produce_read_frame(self.ticks, app) {
                    Ok(data) => {
                        let remaining = cont.step();
                        let header = cont.frame_header(remaining);
                        self.send_frame(link, &header, &data)
                    }
                    Err(code) => {
                        // The producer already tore the transfer down.
                        self.continued = None;
                        self.queue_error(code, "file read failed");
                        return false;
                    }
                }
            }
        };

        // A drained file read keeps its record: the client may still
        // reject the final window, and the rewind needs the transaction
        // identity. The record leaves with the closing ack instead.
        self.continued = if cont.is_done() && cont.kind() != ContinuedKind::FileReadData {
            None
        } else {
            Some(cont)
        };
        sent
    }

    /// Take the stored prompt, or pull one from the link.
    fn pull_prompt(&mut self, link: &mut impl LinkPort, frame: &mut [u8]) -> Option<usize> {
        if !self.prompt.is_empty() {
            let len = self.prompt.len;
            frame[..len].copy_from_slice(&self.prompt.buf[..len]);
            self.prompt.clear();
            return Some(len);
        }
        match link.get_coded_prompt(frame) {
            Ok(0) | Err(ErrorCode::NoData) => None,
            Ok(len) => Some(len),
            Err(code) => {
                warn!("prompt pull failed: {}", code);
                None
            }
        }
    }

    // ── Internal dispatch ─────────────────────────────────────

    /// Decode, gate, and handle one prompt. True when a frame left (or
    /// was at least staged) in response.
    fn dispatch(&mut self, frame: &[u8], link: &mut impl LinkPort, app: &mut impl ReachApp) -> bool {
        let (header, payload) = match self.framing.decode_envelope(frame) {
            Ok(parsed) => parsed,
            Err(code) => {
                // No trustworthy header to address a report with.
                warn!("dropping undecodable {}-byte frame: {}", frame.len(), code);
                return false;
            }
        };
        let Some(mtype) = MessageType::from_u32(header.message_type) else {
            return self.send_report(
                link,
                &header,
                ErrorCode::NotImplemented,
                "unsupported message type",
            );
        };

        if let Err(code) = access::check_message(app, mtype) {
            return self.send_report(link, &header, code, "access denied");
        }
        if starts_continued(mtype) && (self.continued.is_some() || self.transfer.is_active()) {
            return self.send_report(
                link,
                &header,
                ErrorCode::InvalidState,
                "a continued transaction is already live",
            );
        }

        match mtype {
            MessageType::Ping => {
                let Some(req) = self.decode_or_report::<PingRequest>(link, &header, payload) else {
                    return true;
                };
                let pong = device::handle_ping(&req, link);
                self.send_reply(link, &header, MessageType::Ping, 0, &pong)
            }

            MessageType::GetDeviceInfo => {
                let Some(req) = self.decode_or_report::<DeviceInfoRequest>(link, &header, payload)
                else {
                    return true;
                };
                info!("device info requested, client v{}", req.client_protocol_version.as_str());
                match device::handle_get_device_info(&req, app) {
                    Ok(i) => self.send_reply(link, &header, MessageType::GetDeviceInfo, 0, &i),
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::DiscoverParameters => {
                let Some(req) =
                    self.decode_or_report::<ParameterInfoRequest>(link, &header, payload)
                else {
                    return true;
                };
                match params::handle_discover(&req, &mut self.param_cursor, app) {
                    Ok((first, frames)) => {
                        self.continued = ContinuedTransaction::open(
                            ContinuedKind::DiscoverParameters,
                            frames,
                            &header,
                        );
                        self.send_reply(
                            link,
                            &header,
                            MessageType::DiscoverParameters,
                            frames,
                            &first,
                        )
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::DiscoverParamEx => {
                let Some(req) =
                    self.decode_or_report::<ParameterInfoRequest>(link, &header, payload)
                else {
                    return true;
                };
                match params::handle_discover_ex(&req, &mut self.param_cursor, app) {
                    Ok((first, frames)) => {
                        self.continued = ContinuedTransaction::open(
                            ContinuedKind::DiscoverParamEx,
                            frames,
                            &header,
                        );
                        self.send_reply(link, &header, MessageType::DiscoverParamEx, frames, &first)
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::ReadParameters => {
                let Some(req) = self.decode_or_report::<ParameterRead>(link, &header, payload)
                else {
                    return true;
                };
                match params::handle_read(&req, &mut self.param_cursor, app) {
                    Ok((first, frames)) => {
                        self.continued = ContinuedTransaction::open(
                            ContinuedKind::ReadParameters,
                            frames,
                            &header,
                        );
                        self.send_reply(link, &header, MessageType::ReadParameters, frames, &first)
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::WriteParameters => {
                let Some(req) = self.decode_or_report::<ParameterWrite>(link, &header, payload)
                else {
                    return true;
                };
                match params::handle_write(&req, app) {
                    Ok(resp) => self.send_reply(link, &header, MessageType::WriteParameters, 0, &resp),
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::ParamEnableNotify => {
                let Some(req) =
                    self.decode_or_report::<ParamEnableNotifications>(link, &header, payload)
                else {
                    return true;
                };
                let resp =
                    params::handle_enable_notifications(&req, &mut self.notify, self.ticks, app);
                self.send_reply(link, &header, MessageType::ParamEnableNotify, 0, &resp)
            }

            MessageType::ParamDisableNotify => {
                let Some(req) =
                    self.decode_or_report::<ParamDisableNotifications>(link, &header, payload)
                else {
                    return true;
                };
                let resp = params::handle_disable_notifications(&req, &mut self.notify);
                self.send_reply(link, &header, MessageType::ParamDisableNotify, 0, &resp)
            }

            MessageType::DiscoverNotifications => {
                let Some(req) =
                    self.decode_or_report::<DiscoverNotifications>(link, &header, payload)
                else {
                    return true;
                };
                let resp = params::handle_discover_notifications(&req, &self.notify);
                self.send_reply(link, &header, MessageType::DiscoverNotifications, 0, &resp)
            }

            MessageType::DiscoverFiles => {
                let Some(_req) = self.decode_or_report::<DiscoverFiles>(link, &header, payload)
                else {
                    return true;
                };
                match transfer::handle_discover_files(app) {
                    Ok((first, frames)) => {
                        self.continued = ContinuedTransaction::open(
                            ContinuedKind::DiscoverFiles,
                            frames,
                            &header,
                        );
                        self.send_reply(link, &header, MessageType::DiscoverFiles, frames, &first)
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::TransferInit => {
                let Some(req) =
                    self.decode_or_report::<FileTransferRequest>(link, &header, payload)
                else {
                    return true;
                };
                if let Err(code) = access::check(app, ServiceId::Files, Some(req.file_id)) {
                    return self.send_report(link, &header, code, "file access denied");
                }
                match self.transfer.handle_init(&req, self.ticks, app) {
                    Ok(outcome) => {
                        self.continued = ContinuedTransaction::open(
                            ContinuedKind::FileReadData,
                            outcome.read_frames,
                            &header,
                        );
                        self.send_reply(
                            link,
                            &header,
                            MessageType::TransferInit,
                            0,
                            &outcome.response,
                        )
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::TransferData => {
                let Some(data) = self.decode_or_report::<FileTransferData>(link, &header, payload)
                else {
                    return true;
                };
                match self.transfer.handle_write_data(&data, self.ticks, app) {
                    Ok(Some(note)) => self.send_reply(
                        link,
                        &header,
                        MessageType::TransferDataNotification,
                        0,
                        &note,
                    ),
                    Ok(None) => false,
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::TransferDataNotification => {
                let Some(note) =
                    self.decode_or_report::<FileTransferDataNotification>(link, &header, payload)
                else {
                    return true;
                };
                match self.transfer.handle_read_ack(&note, self.ticks, app) {
                    Ok(ReadAck::Continue) => false,
                    Ok(ReadAck::Rewind(frames)) => {
                        if let Some(cont) = &mut self.continued {
                            cont.rewind_to(frames);
                        }
                        false
                    }
                    Ok(ReadAck::Finished) => {
                        self.continued = None;
                        false
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::EraseFile => {
                let Some(req) = self.decode_or_report::<FileEraseRequest>(link, &header, payload)
                else {
                    return true;
                };
                if let Err(code) = access::check(app, ServiceId::Files, Some(req.file_id)) {
                    return self.send_report(link, &header, code, "file access denied");
                }
                match transfer::handle_erase(&req, app) {
                    Ok(resp) => self.send_reply(link, &header, MessageType::EraseFile, 0, &resp),
                    Err(ErrorCode::Incomplete) => {
                        self.pending_erase = Some(PendingErase {
                            file_id: req.file_id,
                            reply_to: header,
                        });
                        false
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::DiscoverCommands => {
                let Some(_req) = self.decode_or_report::<DiscoverCommands>(link, &header, payload)
                else {
                    return true;
                };
                match commands::handle_discover_commands(app) {
                    Ok((first, frames)) => {
                        self.continued = ContinuedTransaction::open(
                            ContinuedKind::DiscoverCommands,
                            frames,
                            &header,
                        );
                        self.send_reply(
                            link,
                            &header,
                            MessageType::DiscoverCommands,
                            frames,
                            &first,
                        )
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::SendCommand => {
                let Some(req) = self.decode_or_report::<SendCommand>(link, &header, payload)
                else {
                    return true;
                };
                if let Err(code) = access::check(app, ServiceId::Commands, Some(req.command_id)) {
                    return self.send_report(link, &header, code, "command access denied");
                }
                match commands::handle_send_command(&req, app) {
                    Ok(resp) => self.send_reply(link, &header, MessageType::SendCommand, 0, &resp),
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::CliNotification => {
                let Some(data) = self.decode_or_report::<CliData>(link, &header, payload) else {
                    return true;
                };
                match commands::handle_cli_line(&data, app) {
                    Ok(()) => false,
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::DiscoverStreams => {
                let Some(_req) = self.decode_or_report::<DiscoverStreams>(link, &header, payload)
                else {
                    return true;
                };
                match streams::handle_discover_streams(app) {
                    Ok((first, frames)) => {
                        self.continued = ContinuedTransaction::open(
                            ContinuedKind::DiscoverStreams,
                            frames,
                            &header,
                        );
                        self.send_reply(link, &header, MessageType::DiscoverStreams, frames, &first)
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::OpenStream => {
                let Some(req) = self.decode_or_report::<StreamOpen>(link, &header, payload) else {
                    return true;
                };
                if let Err(code) = access::check(app, ServiceId::Streams, Some(req.stream_id)) {
                    return self.send_report(link, &header, code, "stream access denied");
                }
                let resp = self.streams.open(&req, app);
                self.send_reply(link, &header, MessageType::OpenStream, 0, &resp)
            }

            MessageType::CloseStream => {
                let Some(req) = self.decode_or_report::<StreamClose>(link, &header, payload) else {
                    return true;
                };
                let resp = self.streams.close(&req, app);
                self.send_reply(link, &header, MessageType::CloseStream, 0, &resp)
            }

            MessageType::StreamDataNotification => {
                let Some(data) = self.decode_or_report::<StreamData>(link, &header, payload) else {
                    return true;
                };
                match self.streams.handle_inbound(&data, app) {
                    Ok(()) => false,
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::SetTime => {
                let Some(req) = self.decode_or_report::<TimeSetRequest>(link, &header, payload)
                else {
                    return true;
                };
                match time::handle_set_time(&req, app) {
                    Ok(resp) => self.send_reply(link, &header, MessageType::SetTime, 0, &resp),
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::GetTime => {
                let Some(_req) = self.decode_or_report::<TimeGetRequest>(link, &header, payload)
                else {
                    return true;
                };
                match time::handle_get_time(app) {
                    Ok(resp) => self.send_reply(link, &header, MessageType::GetTime, 0, &resp),
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::DiscoverWifi => {
                let Some(_req) =
                    self.decode_or_report::<DiscoverWifiRequest>(link, &header, payload)
                else {
                    return true;
                };
                match wifi::handle_discover_wifi(app) {
                    Ok((first, frames)) => {
                        self.continued = ContinuedTransaction::open(
                            ContinuedKind::DiscoverWifi,
                            frames,
                            &header,
                        );
                        self.send_reply(link, &header, MessageType::DiscoverWifi, frames, &first)
                    }
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::WifiConnect => {
                let Some(req) =
                    self.decode_or_report::<WifiConnectionRequest>(link, &header, payload)
                else {
                    return true;
                };
                match wifi::handle_wifi_connect(&req, app) {
                    Ok(resp) => self.send_reply(link, &header, MessageType::WifiConnect, 0, &resp),
                    Err(code) => self.handler_report(link, &header, mtype, code),
                }
            }

            MessageType::ErrorReport => {
                // The client telling us about its problem; log and move on.
                if let Ok(report) = decode_payload::<ErrorReport>(payload) {
                    warn!(
                        "client error {}: {}",
                        report.result,
                        report.result_message.as_str()
                    );
                }
                false
            }

            // Outbound-only type; a client must never send it.
            MessageType::ParameterNotification => {
                self.send_report(link, &header, ErrorCode::InvalidState, "not a prompt type")
            }
        }
    }

    // ── Frame assembly ────────────────────────────────────────

    /// Encode `msg` under `header`, stage it, and offer it to the
    /// link. The stage survives a send failure for later polling.
    fn send_frame<T: Serialize>(
        &mut self,
        link: &mut impl LinkPort,
        header: &MessageHeader,
        msg: &T,
    ) -> bool {
        let len = match self
            .framing
            .encode_message(header, msg, &mut self.response.buf)
        {
            Ok(len) => len,
            Err(code) => {
                warn!("encode failed for type {}: {}", header.message_type, code);
                self.queue_error(code, "response encoding failed");
                return false;
            }
        };
        self.response.len = len;
        match link.send_coded_response(&self.response.buf[..len]) {
            Ok(()) => self.response.clear(),
            Err(code) => {
                warn!("link refused {}-byte response: {}; staged for polling", len, code);
            }
        }
        true
    }

    /// Response to a prompt: echoes its routing fields.
    fn send_reply<T: Serialize>(
        &mut self,
        link: &mut impl LinkPort,
        prompt: &MessageHeader,
        reply_type: MessageType,
        remaining_objects: u32,
        msg: &T,
    ) -> bool {
        let header = MessageHeader {
            message_type: reply_type.as_u32(),
            endpoint_id: prompt.endpoint_id,
            client_id: prompt.client_id,
            remaining_objects,
            transaction_id: prompt.transaction_id,
        };
        self.send_frame(link, &header, msg)
    }

    /// Device-initiated frame with zeroed routing fields, sent outside
    /// the response slot.
    fn send_direct<T: Serialize>(
        &mut self,
        link: &mut impl LinkPort,
        mtype: MessageType,
        msg: &T,
    ) -> Result<()> {
        let header = MessageHeader::new(mtype);
        let mut buf = [0u8; MAX_MESSAGE_SIZE];
        let len = self.framing.encode_message(&header, msg, &mut buf)?;
        link.send_coded_response(&buf[..len])
    }

    /// Quiet-tick notification. A refused frame is telemetry, not
    /// state; it is logged and dropped.
    fn send_async<T: Serialize>(
        &mut self,
        link: &mut impl LinkPort,
        mtype: MessageType,
        msg: &T,
    ) -> bool {
        match self.send_direct(link, mtype, msg) {
            Ok(()) => true,
            Err(code) => {
                warn!("{} dropped: {}", mtype, code);
                false
            }
        }
    }

    // ── Error reporting ───────────────────────────────────────

    /// Immediate ERROR_REPORT answering `prompt`.
    fn send_report(
        &mut self,
        link: &mut impl LinkPort,
        prompt: &MessageHeader,
        code: ErrorCode,
        context: &str,
    ) -> bool {
        warn!("type {} refused: {} ({})", prompt.message_type, code, context);
        let mut message = BigString::new();
        let _ = write!(message, "{}: {}", context, code);
        let report = ErrorReport {
            result: code.as_i32(),
            result_message: message,
        };
        self.send_reply(link, prompt, MessageType::ErrorReport, 0, &report)
    }

    /// Handler verdict to wire policy: silence for the flow sentinels,
    /// an ERROR_REPORT for everything else.
    fn handler_report(
        &mut self,
        link: &mut impl LinkPort,
        prompt: &MessageHeader,
        mtype: MessageType,
        code: ErrorCode,
    ) -> bool {
        match code {
            ErrorCode::NoResponse | ErrorCode::NoData => false,
            code => {
                warn!("{} failed: {}", mtype, code);
                let mut message = BigString::new();
                let _ = write!(message, "{} failed: {}", mtype, code);
                let report = ErrorReport {
                    result: code.as_i32(),
                    result_message: message,
                };
                self.send_reply(link, prompt, MessageType::ErrorReport, 0, &report)
            }
        }
    }

    fn decode_or_report<'de, T: serde::Deserialize<'de>>(
        &mut self,
        link: &mut impl LinkPort,
        header: &MessageHeader,
        payload: &'de [u8],
    ) -> Option<T> {
        match decode_payload::<T>(payload) {
            Ok(msg) => Some(msg),
            Err(code) => {
                self.send_report(link, header, code, "payload decode failed");
                None
            }
        }
    }

    fn queue_error(&mut self, code: ErrorCode, message: &str) {
        if self.pending_error.is_some() {
            warn!("pending error report overwritten");
        }
        let mut text = BigString::new();
        let _ = write!(text, "{}", message);
        self.pending_error = Some(ErrorReport {
            result: code.as_i32(),
            result_message: text,
        });
    }

    /// True when a stashed report left on this tick. A refused send
    /// keeps the report queued for the next quiet tick.
    fn flush_pending_error(&mut self, link: &mut impl LinkPort) -> bool {
        let Some(report) = self.pending_error.take() else {
            return false;
        };
        match self.send_direct(link, MessageType::ErrorReport, &report) {
            Ok(()) => true,
            Err(code) => {
                warn!("error report deferred: {}", code);
                self.pending_error = Some(report);
                false
            }
        }
    }
}

fn version_string((major, minor, patch): (u8, u8, u8)) -> ShortString {
    let mut version = ShortString::new();
    let _ = write!(version, "{}.{}.{}", major, minor, patch);
    version
}
