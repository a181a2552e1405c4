//! Continued-transaction record.
//!
//! A multi-frame response occupies this record for its whole life. The
//! count stored here is the number of frames the engine still has to
//! emit; each emitted frame carries the count after itself in
//! `remaining_objects`, so the client sees a strict countdown ending
//! at zero. Only one record exists, which is what serialises
//! multi-frame operations against each other.

use crate::wire::types::{MessageHeader, MessageType};

/// Which producer refills the payload on each engine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinuedKind {
    DiscoverParameters,
    DiscoverParamEx,
    ReadParameters,
    DiscoverCommands,
    DiscoverFiles,
    DiscoverStreams,
    DiscoverWifi,
    /// Outbound file data, additionally paused by ack windowing.
    FileReadData,
}

impl ContinuedKind {
    /// Wire type carried by the frames of this transaction.
    pub const fn message_type(self) -> MessageType {
        match self {
            Self::DiscoverParameters => MessageType::DiscoverParameters,
            Self::DiscoverParamEx => MessageType::DiscoverParamEx,
            Self::ReadParameters => MessageType::ReadParameters,
            Self::DiscoverCommands => MessageType::DiscoverCommands,
            Self::DiscoverFiles => MessageType::DiscoverFiles,
            Self::DiscoverStreams => MessageType::DiscoverStreams,
            Self::DiscoverWifi => MessageType::DiscoverWifi,
            Self::FileReadData => MessageType::TransferData,
        }
    }
}

/// True for prompts that would occupy the record themselves. While a
/// record is live these are refused rather than queued.
pub const fn starts_continued(mtype: MessageType) -> bool {
    matches!(
        mtype,
        MessageType::DiscoverParameters
            | MessageType::DiscoverParamEx
            | MessageType::ReadParameters
            | MessageType::DiscoverCommands
            | MessageType::DiscoverFiles
            | MessageType::DiscoverStreams
            | MessageType::DiscoverWifi
            | MessageType::TransferInit
    )
}

/// The live record. Exists only while frames remain.
#[derive(Debug, Clone, Copy)]
pub struct ContinuedTransaction {
    kind: ContinuedKind,
    /// Frames the engine still owes. Strictly decreasing.
    frames_left: u32,
    transaction_id: u32,
    endpoint_id: u32,
    client_id: u32,
}

impl ContinuedTransaction {
    /// Open a record owing `frames_left` engine-produced frames. The
    /// header identifies the transaction every frame must echo.
    pub fn open(kind: ContinuedKind, frames_left: u32, request: &MessageHeader) -> Option<Self> {
        if frames_left == 0 {
            return None;
        }
        Some(Self {
            kind,
            frames_left,
            transaction_id: request.transaction_id,
            endpoint_id: request.endpoint_id,
            client_id: request.client_id,
        })
    }

    pub fn kind(&self) -> ContinuedKind {
        self.kind
    }

    pub fn frames_left(&self) -> u32 {
        self.frames_left
    }

    /// Account one emitted frame and return the value its header must
    /// carry in `remaining_objects`.
    pub fn step(&mut self) -> u32 {
        self.frames_left = self.frames_left.saturating_sub(1);
        self.frames_left
    }

    /// Retry support for windowed file reads: restate how many frames
    /// are still owed after a rewind.
    pub fn rewind_to(&mut self, frames_left: u32) {
        self.frames_left = frames_left;
    }

    pub fn is_done(&self) -> bool {
        self.frames_left == 0
    }

    /// Header for the next frame of this transaction.
    pub fn frame_header(&self, remaining_objects: u32) -> MessageHeader {
        MessageHeader {
            message_type: self.kind.message_type().as_u32(),
            endpoint_id: self.endpoint_id,
            client_id: self.client_id,
            remaining_objects,
            transaction_id: self.transaction_id,
        }
    }
}
