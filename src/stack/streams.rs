//! Stream service: discovery, open/close bookkeeping, and the data
//! planes in both directions.
//!
//! Outbound (device-to-client) streams are polled round-robin on quiet
//! ticks so one chatty stream cannot starve the others. Inbound frames
//! route straight to the capability and generate no response.

use core::fmt::Write as _;

use heapless::Vec;

use crate::config::{COUNT_MEDIUM_STRUCTS, COUNT_SMALL_STRUCTS};
use crate::error::{ErrorCode, Result};
use crate::ports::StreamPort;
use crate::stack::transfer::rfc1071_checksum;
use crate::wire::types::{
    BigString, DiscoverStreamsResponse, StreamClose, StreamData, StreamOpen, StreamResponse,
};

/// First frame of DISCOVER_STREAMS.
pub fn handle_discover_streams(
    app: &mut impl StreamPort,
) -> Result<(DiscoverStreamsResponse, u32)> {
    app.stream_discover_reset(0)?;
    let total = app.stream_count();
    let frames = (total.div_ceil(COUNT_MEDIUM_STRUCTS)) as u32;
    let first = produce_streams_batch(app);
    Ok((first, frames.saturating_sub(1)))
}

/// One DISCOVER_STREAMS frame worth of descriptors.
pub fn produce_streams_batch(app: &mut impl StreamPort) -> DiscoverStreamsResponse {
    let mut response = DiscoverStreamsResponse::default();
    while !response.streams.is_full() {
        let Ok(info) = app.stream_discover_next() else {
            break;
        };
        let _ = response.streams.push(info);
    }
    response
}

/// The set of currently open streams plus the round-robin position of
/// the outbound poller.
#[derive(Debug, Default)]
pub struct OpenStreams {
    ids: Vec<u32, COUNT_SMALL_STRUCTS>,
    poll_at: usize,
}

impl OpenStreams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, stream_id: u32) -> bool {
        self.ids.contains(&stream_id)
    }

    pub fn open_count(&self) -> usize {
        self.ids.len()
    }

    /// OPEN_STREAM. Unknown IDs and driver refusals answer in-band;
    /// reopening an already open stream is a no-op success.
    pub fn open(&mut self, req: &StreamOpen, app: &mut impl StreamPort) -> StreamResponse {
        let id = req.stream_id;
        if self.is_open(id) {
            return stream_ok(id);
        }
        if let Err(code) = app.stream_get_description(id) {
            return stream_err(id, code, "unknown stream");
        }
        if self.ids.is_full() {
            return stream_err(id, ErrorCode::NoResource, "open limit reached");
        }
        match app.stream_open(id) {
            Ok(()) => {
                let _ = self.ids.push(id);
                log::info!("stream {} opened", id);
                stream_ok(id)
            }
            Err(code) => stream_err(id, code, "open refused"),
        }
    }

    /// CLOSE_STREAM. Closing a stream that is not open still succeeds.
    pub fn close(&mut self, req: &StreamClose, app: &mut impl StreamPort) -> StreamResponse {
        let id = req.stream_id;
        if let Some(at) = self.ids.iter().position(|open| *open == id) {
            self.ids.swap_remove(at);
            if let Err(code) = app.stream_close(id) {
                return stream_err(id, code, "close failed");
            }
            log::info!("stream {} closed", id);
        }
        stream_ok(id)
    }

    /// Link-down path: every open stream is closed at the capability
    /// and the set empties.
    pub fn close_all(&mut self, app: &mut impl StreamPort) {
        for id in &self.ids {
            let _ = app.stream_close(*id);
        }
        self.ids.clear();
        self.poll_at = 0;
    }

    /// One round-robin pass over the open streams; the first with data
    /// pending wins the tick.
    pub fn poll_next(&mut self, app: &mut impl StreamPort) -> Option<StreamData> {
        let count = self.ids.len();
        for step in 0..count {
            let at = (self.poll_at + step) % count;
            let id = self.ids[at];
            match app.stream_read(id) {
                Ok(data) => {
                    self.poll_at = (at + 1) % count;
                    return Some(data);
                }
                Err(ErrorCode::NoData) => {}
                Err(code) => {
                    log::warn!("stream {} read failed: {}", id, code);
                }
            }
        }
        None
    }

    /// Inbound STREAM_DATA_NOTIFICATION. Validates the stream is open
    /// and the checksum when one rides along, then hands the frame to
    /// the capability. No response either way.
    pub fn handle_inbound(&self, data: &StreamData, app: &mut impl StreamPort) -> Result<()> {
        if !self.is_open(data.stream_id) {
            return Err(ErrorCode::InvalidState);
        }
        if let Some(claimed) = data.checksum {
            let computed = i32::from(rfc1071_checksum(&data.message_data));
            if claimed != computed {
                return Err(ErrorCode::ChecksumMismatch);
            }
        }
        app.stream_write(data)
    }
}

fn stream_ok(stream_id: u32) -> StreamResponse {
    StreamResponse {
        stream_id,
        result: 0,
        result_message: None,
    }
}

fn stream_err(stream_id: u32, code: ErrorCode, what: &str) -> StreamResponse {
    let mut message = BigString::new();
    let _ = write!(message, "{}: {}", what, code);
    StreamResponse {
        stream_id,
        result: code.as_i32(),
        result_message: Some(message),
    }
}
