//! Parameter discovery, reads, and writes through the dispatcher,
//! including the continued-transaction countdown.

use reach_device::wire::types::{
    ErrorReport, MessageHeader, MessageType, ParamExInfoResponse, ParamValue, ParamValueRecord,
    ParameterInfoRequest, ParameterInfoResponse, ParameterRead, ParameterReadResponse,
    ParameterWrite, ParameterWriteResponse,
};
use reach_device::ErrorCode;

use crate::mock_device::{connected_stack, decode_frame, prompt};

fn id_list(ids: &[u32]) -> heapless::Vec<u32, 32> {
    let mut list = heapless::Vec::new();
    for id in ids {
        list.push(*id).unwrap();
    }
    list
}

fn write_record(pid: u32, value: u32) -> ParamValueRecord {
    ParamValueRecord {
        parameter_id: pid,
        timestamp: 0,
        result: 0,
        value: ParamValue::Uint32(value),
    }
}

// ── Discovery ─────────────────────────────────────────────────

#[test]
fn discover_all_parameters_counts_down_across_frames() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::DiscoverParameters,
        14,
        &ParameterInfoRequest::default(),
    ));
    for tick in 1..=4 {
        stack.process(tick, &mut link, &mut app);
    }

    assert_eq!(link.sent.len(), 3, "five descriptors pack into three frames");
    let mut seen_ids = Vec::new();
    for (frame, expected_remaining) in link.sent.iter().zip([2u32, 1, 0]) {
        let (header, batch): (MessageHeader, ParameterInfoResponse) = decode_frame(frame);
        assert_eq!(header.message_type, MessageType::DiscoverParameters.as_u32());
        assert_eq!(header.transaction_id, 14, "all frames share the transaction");
        assert_eq!(header.remaining_objects, expected_remaining);
        seen_ids.extend(batch.parameter_infos.iter().map(|info| info.id));
    }
    assert_eq!(seen_ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn discover_list_skips_unknown_ids() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::DiscoverParameters,
        15,
        &ParameterInfoRequest {
            parameter_ids: id_list(&[2, 99, 4]),
        },
    ));
    stack.process(1, &mut link, &mut app);
    stack.process(2, &mut link, &mut app);

    // The frame budget is taken from the request length, so the
    // skipped ID leaves a trailing empty frame.
    assert_eq!(link.sent.len(), 2);
    let (header, first): (MessageHeader, ParameterInfoResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.remaining_objects, 1);
    let ids: Vec<u32> = first.parameter_infos.iter().map(|info| info.id).collect();
    assert_eq!(ids, vec![2, 4], "the unknown PID is silently dropped");
    let (header, rest): (MessageHeader, ParameterInfoResponse) = decode_frame(&link.sent[1]);
    assert_eq!(header.remaining_objects, 0);
    assert!(rest.parameter_infos.is_empty());
}

#[test]
fn discover_ex_serves_one_key_set_per_frame() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::DiscoverParamEx,
        16,
        &ParameterInfoRequest::default(),
    ));
    stack.process(1, &mut link, &mut app);
    stack.process(2, &mut link, &mut app);

    assert_eq!(link.sent.len(), 2);
    let (header, first): (MessageHeader, ParamExInfoResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::DiscoverParamEx.as_u32());
    assert_eq!(header.remaining_objects, 1);
    assert_eq!(first.associated_pid, 4);
    assert_eq!(first.keys.len(), 2);
    assert_eq!(first.keys[0].name.as_str(), "off");
    let (header, second): (MessageHeader, ParamExInfoResponse) = decode_frame(&link.sent[1]);
    assert_eq!(header.remaining_objects, 0);
    assert_eq!(second.associated_pid, 5);
}

#[test]
fn discover_ex_scoped_to_one_pid() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::DiscoverParamEx,
        17,
        &ParameterInfoRequest {
            parameter_ids: id_list(&[5]),
        },
    ));
    stack.process(1, &mut link, &mut app);

    assert_eq!(link.sent.len(), 1);
    let (header, only): (MessageHeader, ParamExInfoResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.remaining_objects, 0);
    assert_eq!(only.associated_pid, 5);
}

// ── Read ──────────────────────────────────────────────────────

#[test]
fn read_all_packs_four_values_per_frame() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::ReadParameters, 18, &ParameterRead::default()));
    stack.process(1, &mut link, &mut app);
    stack.process(2, &mut link, &mut app);

    assert_eq!(link.sent.len(), 2);
    let (header, first): (MessageHeader, ParameterReadResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::ReadParameters.as_u32());
    assert_eq!(header.remaining_objects, 1);
    let values: Vec<u32> = first
        .values
        .iter()
        .map(|record| match record.value {
            ParamValue::Uint32(v) => v,
            _ => panic!("mock serves u32 values"),
        })
        .collect();
    assert_eq!(values, vec![10, 20, 30, 40]);
    let (header, second): (MessageHeader, ParameterReadResponse) = decode_frame(&link.sent[1]);
    assert_eq!(header.remaining_objects, 0);
    assert_eq!(second.values.len(), 1);
    assert_eq!(second.values[0].parameter_id, 5);
}

#[test]
fn explicit_read_marks_unknown_slots_in_band() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::ReadParameters,
        19,
        &ParameterRead {
            parameter_ids: id_list(&[1, 88]),
        },
    ));
    stack.process(1, &mut link, &mut app);

    let (header, batch): (MessageHeader, ParameterReadResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.remaining_objects, 0);
    assert_eq!(batch.values.len(), 2, "the failed slot still occupies a record");
    assert_eq!(batch.values[0].parameter_id, 1);
    assert_eq!(batch.values[0].result, 0);
    assert_eq!(batch.values[1].parameter_id, 88);
    assert_eq!(batch.values[1].result, ErrorCode::InvalidId.as_i32());
}

// ── Write ─────────────────────────────────────────────────────

#[test]
fn write_applies_values_and_reports_the_first_failure() {
    let (mut stack, mut link, mut app) = connected_stack();

    let mut request = ParameterWrite::default();
    request.values.push(write_record(1, 111)).unwrap();
    request.values.push(write_record(99, 7)).unwrap();
    link.push_prompt(prompt(MessageType::WriteParameters, 20, &request));
    stack.process(1, &mut link, &mut app);

    let (header, response): (MessageHeader, ParameterWriteResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::WriteParameters.as_u32());
    assert_eq!(header.transaction_id, 20);
    assert_eq!(response.result, ErrorCode::InvalidId.as_i32());
    assert_eq!(app.param_values[0], 111, "the good slot was still applied");
}

#[test]
fn empty_write_reports_invalid_parameter() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::WriteParameters,
        21,
        &ParameterWrite::default(),
    ));
    stack.process(1, &mut link, &mut app);

    let (header, report): (MessageHeader, ErrorReport) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::ErrorReport.as_u32());
    assert_eq!(report.result, ErrorCode::InvalidParameter.as_i32());
}
