//! Parameter notification scheduling end to end: enable, emit on a
//! quiet tick, heartbeat, disable, and the startup defaults.

use reach_device::wire::types::{
    DiscoverNotifications, DiscoverNotificationsResponse, MessageHeader, MessageType,
    ParamDisableNotifications, ParamEnableNotifications, ParamNotifyConfig,
    ParamNotifyConfigResponse, ParamValue, ParameterNotification,
};
use reach_device::{ErrorCode, ReachStack};

use crate::mock_device::{connected_stack, decode_frame, prompt, MockApp, MockLink};

fn config(pid: u32, min: u32, max: u32, delta: f32) -> ParamNotifyConfig {
    ParamNotifyConfig {
        parameter_id: pid,
        minimum_notification_period: min,
        maximum_notification_period: max,
        minimum_delta: delta,
    }
}

fn enable_request(configs: &[ParamNotifyConfig]) -> ParamEnableNotifications {
    let mut request = ParamEnableNotifications::default();
    for entry in configs {
        request.configs.push(*entry).unwrap();
    }
    request
}

// ── Delta and minimum period ──────────────────────────────────

#[test]
fn change_beyond_delta_emits_on_a_quiet_tick() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::ParamEnableNotify,
        5,
        &enable_request(&[config(2, 10, 0, 5.0)]),
    ));
    stack.process(1, &mut link, &mut app);
    let (_, ack): (MessageHeader, ParamNotifyConfigResponse) = decode_frame(&link.sent[0]);
    assert_eq!(ack.result, 0);

    // No change yet, nothing to say.
    stack.process(5, &mut link, &mut app);
    assert_eq!(link.sent.len(), 1);

    // A big change still waits out the minimum period.
    app.param_values[1] = 40;
    stack.process(8, &mut link, &mut app);
    assert_eq!(link.sent.len(), 1, "the minimum period muzzles the change");

    stack.process(11, &mut link, &mut app);
    assert_eq!(link.sent.len(), 2);
    let (header, batch): (MessageHeader, ParameterNotification) = decode_frame(&link.sent[1]);
    assert_eq!(
        header.message_type,
        MessageType::ParameterNotification.as_u32()
    );
    assert_eq!(header.transaction_id, 0, "device-initiated, no transaction");
    assert_eq!(header.client_id, 0);
    assert_eq!(batch.values.len(), 1);
    assert_eq!(batch.values[0].parameter_id, 2);
    assert_eq!(batch.values[0].value, ParamValue::Uint32(40));

    // The frame left through the link, not the response slot.
    let mut out = [0u8; 256];
    assert_eq!(
        stack.get_coded_response_buffer(&mut out),
        Err(ErrorCode::NoData)
    );

    // Stable value, no further traffic.
    stack.process(40, &mut link, &mut app);
    assert_eq!(link.sent.len(), 2);
}

#[test]
fn small_changes_below_delta_stay_quiet() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::ParamEnableNotify,
        6,
        &enable_request(&[config(1, 0, 0, 50.0)]),
    ));
    stack.process(1, &mut link, &mut app);

    app.param_values[0] = 30;
    stack.process(10, &mut link, &mut app);
    assert_eq!(link.sent.len(), 1, "a 20-count move is under the 50 delta");

    app.param_values[0] = 90;
    stack.process(20, &mut link, &mut app);
    assert_eq!(link.sent.len(), 2, "the 80-count move from baseline trips it");
}

// ── Heartbeat ─────────────────────────────────────────────────

#[test]
fn heartbeat_fires_at_max_period_without_change() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::ParamEnableNotify,
        7,
        &enable_request(&[config(1, 0, 50, 1e9)]),
    ));
    stack.process(1, &mut link, &mut app);

    stack.process(31, &mut link, &mut app);
    assert_eq!(link.sent.len(), 1, "not yet");

    stack.process(51, &mut link, &mut app);
    assert_eq!(link.sent.len(), 2);
    let (_, beat): (MessageHeader, ParameterNotification) = decode_frame(&link.sent[1]);
    assert_eq!(beat.values[0].value, ParamValue::Uint32(10), "unchanged value");

    stack.process(101, &mut link, &mut app);
    assert_eq!(link.sent.len(), 3, "the heartbeat keeps its cadence");
}

#[test]
fn startup_defaults_arm_on_connect() {
    let mut app = MockApp::new();
    app.startup_notifications.push(config(1, 0, 30, 1e9));
    let mut link = MockLink::new();
    let mut stack = ReachStack::new();
    stack.set_comm_link_connected(true, &mut app);

    stack.process(29, &mut link, &mut app);
    assert!(link.sent.is_empty());

    stack.process(30, &mut link, &mut app);
    assert_eq!(link.sent.len(), 1);
    let (header, beat): (MessageHeader, ParameterNotification) = decode_frame(&link.sent[0]);
    assert_eq!(
        header.message_type,
        MessageType::ParameterNotification.as_u32()
    );
    assert_eq!(beat.values[0].parameter_id, 1);
}

// ── Enable and disable edges ──────────────────────────────────

#[test]
fn enable_rejects_unknown_pid_and_keeps_earlier_slots() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::ParamEnableNotify,
        8,
        &enable_request(&[config(1, 0, 0, 1.0), config(99, 0, 0, 1.0)]),
    ));
    stack.process(1, &mut link, &mut app);

    let (_, ack): (MessageHeader, ParamNotifyConfigResponse) = decode_frame(&link.sent[0]);
    assert_eq!(ack.result, ErrorCode::InvalidParameter.as_i32());
    let message = ack.result_message.expect("rejections name the pid");
    assert!(message.as_str().contains("99"), "message was: {message}");

    // The slot enabled before the rejection is still active.
    link.push_prompt(prompt(
        MessageType::DiscoverNotifications,
        9,
        &DiscoverNotifications::default(),
    ));
    stack.process(2, &mut link, &mut app);
    let (_, active): (MessageHeader, DiscoverNotificationsResponse) = decode_frame(&link.sent[1]);
    assert_eq!(active.configs.len(), 1);
    assert_eq!(active.configs[0].parameter_id, 1);
}

#[test]
fn disable_stops_traffic_and_is_idempotent() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::ParamEnableNotify,
        10,
        &enable_request(&[config(2, 0, 0, 5.0)]),
    ));
    stack.process(1, &mut link, &mut app);

    app.param_values[1] = 100;
    stack.process(2, &mut link, &mut app);
    assert_eq!(link.sent.len(), 2, "the change was reported");

    let mut disable = ParamDisableNotifications::default();
    disable.parameter_ids.push(2).unwrap();
    link.push_prompt(prompt(MessageType::ParamDisableNotify, 11, &disable));
    stack.process(3, &mut link, &mut app);
    let (_, ack): (MessageHeader, ParamNotifyConfigResponse) = decode_frame(&link.sent[2]);
    assert_eq!(ack.result, 0);

    app.param_values[1] = 200;
    stack.process(10, &mut link, &mut app);
    assert_eq!(link.sent.len(), 3, "disabled parameters stay quiet");

    // Disabling again is not an error.
    link.push_prompt(prompt(MessageType::ParamDisableNotify, 12, &disable));
    stack.process(11, &mut link, &mut app);
    let (_, ack): (MessageHeader, ParamNotifyConfigResponse) = decode_frame(&link.sent[3]);
    assert_eq!(ack.result, 0);
}

#[test]
fn discover_notifications_lists_active_policies() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::ParamEnableNotify,
        13,
        &enable_request(&[config(1, 5, 60, 2.5), config(3, 0, 0, 1.0)]),
    ));
    stack.process(1, &mut link, &mut app);

    link.push_prompt(prompt(
        MessageType::DiscoverNotifications,
        14,
        &DiscoverNotifications::default(),
    ));
    stack.process(2, &mut link, &mut app);

    let (header, active): (MessageHeader, DiscoverNotificationsResponse) =
        decode_frame(&link.sent[1]);
    assert_eq!(
        header.message_type,
        MessageType::DiscoverNotifications.as_u32()
    );
    let pids: Vec<u32> = active.configs.iter().map(|c| c.parameter_id).collect();
    assert_eq!(pids, vec![1, 3]);
    assert_eq!(active.configs[0].maximum_notification_period, 60);
    assert!((active.configs[0].minimum_delta - 2.5).abs() < f32::EPSILON);
}
