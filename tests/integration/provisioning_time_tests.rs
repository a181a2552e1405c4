//! Wi-Fi provisioning and the time service through the dispatcher.

use reach_device::wire::types::{
    DiscoverWifiRequest, DiscoverWifiResponse, MessageHeader, MessageType, TimeGetRequest,
    TimeGetResponse, TimeSetRequest, TimeSetResponse, WifiConnectionRequest,
    WifiConnectionResponse, WifiSecurity,
};
use reach_device::ErrorCode;

use crate::mock_device::{connected_stack, decode_frame, prompt};

fn connect_request(ssid: &str, disconnect: bool) -> WifiConnectionRequest {
    WifiConnectionRequest {
        ssid: ssid.try_into().unwrap(),
        password: Some("hunter2-hunter2".try_into().unwrap()),
        autoconnect: true,
        disconnect,
    }
}

// ── Wi-Fi discovery ───────────────────────────────────────────

#[test]
fn wifi_discovery_walks_the_scan_list() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::DiscoverWifi, 2, &DiscoverWifiRequest {}));
    stack.process(1, &mut link, &mut app);
    stack.process(2, &mut link, &mut app);
    stack.process(3, &mut link, &mut app);

    assert_eq!(app.scans_begun, 1, "discovery kicked off one scan");
    assert_eq!(link.sent.len(), 2, "one access point per frame");

    let (header, first): (MessageHeader, DiscoverWifiResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::DiscoverWifi.as_u32());
    assert_eq!(header.remaining_objects, 1);
    assert_eq!(first.result, 0);
    let ap = first.access_point.expect("first frame carries an AP");
    assert_eq!(ap.ssid.as_str(), "lab-net");
    assert_eq!(ap.security, WifiSecurity::Wpa2);
    assert!(ap.is_connected);

    let (header, second): (MessageHeader, DiscoverWifiResponse) = decode_frame(&link.sent[1]);
    assert_eq!(header.remaining_objects, 0);
    assert_eq!(second.access_point.unwrap().ssid.as_str(), "guest");
}

#[test]
fn empty_scan_list_answers_no_data_in_band() {
    let (mut stack, mut link, mut app) = connected_stack();
    app.scan_list.clear();

    link.push_prompt(prompt(MessageType::DiscoverWifi, 3, &DiscoverWifiRequest {}));
    stack.process(1, &mut link, &mut app);
    stack.process(2, &mut link, &mut app);

    assert_eq!(link.sent.len(), 1, "an empty list is a single frame, not an error");
    let (header, only): (MessageHeader, DiscoverWifiResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.remaining_objects, 0);
    assert_eq!(only.result, ErrorCode::NoData.as_i32());
    assert!(only.access_point.is_none());
}

// ── Wi-Fi connect ─────────────────────────────────────────────

#[test]
fn wifi_connect_round_trip() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::WifiConnect,
        4,
        &connect_request("lab-net", false),
    ));
    stack.process(1, &mut link, &mut app);

    let (header, response): (MessageHeader, WifiConnectionResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::WifiConnect.as_u32());
    assert_eq!(response.result, 0);
    assert_eq!(response.signal_strength, Some(-48));
    assert_eq!(app.connect_requests, vec![("lab-net".to_string(), false)]);
}

#[test]
fn wifi_connect_to_an_unknown_ssid_reports_in_band() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::WifiConnect,
        5,
        &connect_request("nowhere", false),
    ));
    stack.process(1, &mut link, &mut app);

    let (_, response): (MessageHeader, WifiConnectionResponse) = decode_frame(&link.sent[0]);
    assert_eq!(response.result, ErrorCode::InvalidParameter.as_i32());
    let message = response.result_message.expect("driver refusals are explained");
    assert!(message.as_str().contains("nowhere"), "message was: {message}");
}

#[test]
fn disconnect_does_not_need_a_known_ssid() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::WifiConnect, 6, &connect_request("", true)));
    stack.process(1, &mut link, &mut app);

    let (_, response): (MessageHeader, WifiConnectionResponse) = decode_frame(&link.sent[0]);
    assert_eq!(response.result, 0);
    assert_eq!(app.connect_requests, vec![(String::new(), true)]);
}

// ── Time ──────────────────────────────────────────────────────

#[test]
fn get_time_reports_the_device_clock() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(MessageType::GetTime, 7, &TimeGetRequest {}));
    stack.process(1, &mut link, &mut app);

    let (header, response): (MessageHeader, TimeGetResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::GetTime.as_u32());
    assert_eq!(response.result, 0);
    assert_eq!(response.seconds_utc, 1_700_000_000);
    assert_eq!(response.timezone, Some(0));
}

#[test]
fn set_then_get_time_round_trip() {
    let (mut stack, mut link, mut app) = connected_stack();

    link.push_prompt(prompt(
        MessageType::SetTime,
        8,
        &TimeSetRequest {
            seconds_utc: 1_756_000_000,
            timezone: Some(-18_000),
        },
    ));
    stack.process(1, &mut link, &mut app);
    let (header, ack): (MessageHeader, TimeSetResponse) = decode_frame(&link.sent[0]);
    assert_eq!(header.message_type, MessageType::SetTime.as_u32());
    assert_eq!(ack.result, 0);
    assert_eq!(app.clock_seconds, 1_756_000_000);

    link.push_prompt(prompt(MessageType::GetTime, 9, &TimeGetRequest {}));
    stack.process(2, &mut link, &mut app);
    let (_, clock): (MessageHeader, TimeGetResponse) = decode_frame(&link.sent[1]);
    assert_eq!(clock.seconds_utc, 1_756_000_000);
    assert_eq!(clock.timezone, Some(-18_000));
}
