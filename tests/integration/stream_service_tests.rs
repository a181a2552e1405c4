//! Stream service: discovery, open/close bookkeeping, outbound
//! polling on quiet ticks, and inbound validation.

use reach_device::stack::transfer::rfc1071_checksum;
use reach_device::wire::types::{
    BigBytes, DiscoverStreams, DiscoverStreamsResponse, ErrorReport, MessageHeader, MessageType,
    StreamClose, StreamData, StreamDirection, StreamOpen, StreamResponse,
};
use reach_device::{ErrorCode, ReachStack};

use crate::mock_device::{connected_stack, decode_frame, prompt, MockLink};

fn stream_frame(sid: u32, roll: u32, payload: &[u8], with_checksum: bool) -> StreamData {
    StreamData {
        stream_id: sid,
        roll_count: roll,
        message_data: BigBytes::from_slice(payload).unwrap(),
        checksum: with_checksum.then(|| i32::from(rfc1071_checksum(payload))),
    }
}

// ── Discovery ─────────────────────────────────────────────────

#[test]
fn discover_streams_lists_both_directions() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::DiscoverStreams, 2, &DiscoverStreams {}));
    stack.process(1, &mut link, &mut app);
    stack.process(2, &mut link, &mut app);

    assert_eq!(link.sent.len(), 1, "two descriptors fit one frame");
    let (header, list): (MessageHeader, DiscoverStreamsResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::DiscoverStreams.as_u32());
    assert_eq!(header.remaining_objects, 0);
    assert_eq!(list.streams.len(), 2);
    assert_eq!(list.streams[0].stream_id, 6);
    assert_eq!(list.streams[0].direction, StreamDirection::DeviceToClient);
    assert_eq!(list.streams[1].stream_id, 7);
    assert_eq!(list.streams[1].direction, StreamDirection::ClientToDevice);
}

// ── Open and close ────────────────────────────────────────────

#[test]
fn open_records_once_and_reopen_is_a_no_op() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::OpenStream, 3, &StreamOpen { stream_id: 6 }));
    stack.process(1, &mut link, &mut app);
    link.push_prompt(prompt(MessageType::OpenStream, 4, &StreamOpen { stream_id: 6 }));
    stack.process(2, &mut link, &mut app);

    for frame in &link.sent {
        let (header, response): (MessageHeader, StreamResponse) = decode_frame(frame);
        assert_eq!(header.message_type, MessageType::OpenStream.as_u32());
        assert_eq!(response.result, 0);
        assert_eq!(response.stream_id, 6);
    }
    assert_eq!(app.opened_streams, vec![6], "the capability saw one open");
}

#[test]
fn open_of_an_unknown_stream_answers_in_band() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::OpenStream, 5, &StreamOpen { stream_id: 99 }));
    stack.process(1, &mut link, &mut app);

    let (_, response): (MessageHeader, StreamResponse) = decode_frame(&link.sent[0]);
    assert_eq!(response.result, ErrorCode::InvalidParameter.as_i32());
    let message = response.result_message.expect("refusals carry a message");
    assert!(message.as_str().contains("unknown stream"));
    assert!(app.opened_streams.is_empty());
}

#[test]
fn close_is_idempotent() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::OpenStream, 6, &StreamOpen { stream_id: 6 }));
    stack.process(1, &mut link, &mut app);
    link.push_prompt(prompt(MessageType::CloseStream, 7, &StreamClose { stream_id: 6 }));
    stack.process(2, &mut link, &mut app);
    link.push_prompt(prompt(MessageType::CloseStream, 8, &StreamClose { stream_id: 6 }));
    stack.process(3, &mut link, &mut app);

    let (_, first): (MessageHeader, StreamResponse) = decode_frame(&link.sent[1]);
    let (_, second): (MessageHeader, StreamResponse) = decode_frame(&link.sent[2]);
    assert_eq!(first.result, 0);
    assert_eq!(second.result, 0, "closing a closed stream still succeeds");
    assert_eq!(app.closed_streams, vec![6], "the capability saw one close");
}

// ── Outbound data ─────────────────────────────────────────────

#[test]
fn quiet_ticks_drain_an_open_stream() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::OpenStream, 9, &StreamOpen { stream_id: 6 }));
    stack.process(1, &mut link, &mut app);
    app.stream_outbox.push_back(stream_frame(6, 1, b"first", false));
    app.stream_outbox.push_back(stream_frame(6, 2, b"second", false));

    stack.process(2, &mut link, &mut app);
    stack.process(3, &mut link, &mut app);
    stack.process(4, &mut link, &mut app);

    assert_eq!(link.sent.len(), 3, "one data frame per quiet tick, then quiet");
    let (header, first): (MessageHeader, StreamData) = decode_frame(&link.sent[1]);
    assert_eq!(
        header.message_type,
        MessageType::StreamDataNotification.as_u32()
    );
    assert_eq!(header.transaction_id, 0, "device-initiated, no transaction");
    assert_eq!(first.roll_count, 1);
    assert_eq!(&first.message_data[..], b"first");
    let (_, second): (MessageHeader, StreamData) = decode_frame(&link.sent[2]);
    assert_eq!(second.roll_count, 2);
}

#[test]
fn unopened_streams_are_never_polled() {
    let (mut stack, mut link, mut app) = connected_stack();
    app.stream_outbox.push_back(stream_frame(6, 1, b"pending", false));

    stack.process(1, &mut link, &mut app);
    stack.process(2, &mut link, &mut app);

    assert!(link.sent.is_empty(), "closed streams hold their data");
}

#[test]
fn send_stream_notification_respects_open_state() {
    let (mut stack, mut link, mut app) = connected_stack();

    let frame = stream_frame(6, 7, b"out-of-band", false);
    assert_eq!(
        stack.send_stream_notification(&mut link, &frame),
        Err(ErrorCode::InvalidState),
        "the stream is not open yet"
    );

    link.push_prompt(prompt(MessageType::OpenStream, 10, &StreamOpen { stream_id: 6 }));
    stack.process(1, &mut link, &mut app);
    stack.send_stream_notification(&mut link, &frame).unwrap();

    let (header, sent): (MessageHeader, StreamData) = decode_frame(&link.sent[1]);
    assert_eq!(
        header.message_type,
        MessageType::StreamDataNotification.as_u32()
    );
    assert_eq!(sent.roll_count, 7);
}

#[test]
fn stream_notification_requires_a_connection() {
    let mut link = MockLink::new();
    let mut stack = ReachStack::new();

    let frame = stream_frame(6, 1, b"nope", false);
    assert_eq!(
        stack.send_stream_notification(&mut link, &frame),
        Err(ErrorCode::InvalidState)
    );
}

// ── Inbound data ──────────────────────────────────────────────

#[test]
fn inbound_data_requires_an_open_stream() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::StreamDataNotification,
        11,
        &stream_frame(7, 1, b"early", false),
    ));
    stack.process(1, &mut link, &mut app);

    let (header, report): (MessageHeader, ErrorReport) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::ErrorReport.as_u32());
    assert_eq!(report.result, ErrorCode::InvalidState.as_i32());
    assert!(app.stream_inbox.is_empty());
}

#[test]
fn inbound_data_lands_silently_once_open() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::OpenStream, 12, &StreamOpen { stream_id: 7 }));
    stack.process(1, &mut link, &mut app);
    link.push_prompt(prompt(
        MessageType::StreamDataNotification,
        13,
        &stream_frame(7, 1, b"ingest me", true),
    ));
    stack.process(2, &mut link, &mut app);

    assert_eq!(link.sent.len(), 1, "only the open was answered");
    assert_eq!(app.stream_inbox.len(), 1);
    assert_eq!(&app.stream_inbox[0].message_data[..], b"ingest me");
}

#[test]
fn inbound_checksum_mismatch_is_reported() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::OpenStream, 14, &StreamOpen { stream_id: 7 }));
    stack.process(1, &mut link, &mut app);

    let mut bad = stream_frame(7, 1, b"tampered", true);
    bad.checksum = bad.checksum.map(|sum| sum ^ 1);
    link.push_prompt(prompt(MessageType::StreamDataNotification, 15, &bad));
    stack.process(2, &mut link, &mut app);

    let (_, report): (MessageHeader, ErrorReport) = decode_frame(&link.sent[1]);
    assert_eq!(report.result, ErrorCode::ChecksumMismatch.as_i32());
    assert!(app.stream_inbox.is_empty(), "bad frames never reach the app");
}
