//! Fuzz target: full prompt dispatch
//!
//! Feeds arbitrary frames to a connected stack in front of an
//! application that accepts every port default. The engine must never
//! panic, and every frame it emits must respect the MTU.
//!
//! cargo fuzz run fuzz_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use reach_device::config::MAX_MESSAGE_SIZE;
use reach_device::ports::{
    CliPort, CommandPort, DevicePort, FilePort, LinkPort, ParamPort, StreamPort, TimePort,
    WifiPort,
};
use reach_device::{ErrorCode, ReachStack};

struct NullApp;

impl DevicePort for NullApp {}
impl ParamPort for NullApp {}
impl CommandPort for NullApp {}
impl CliPort for NullApp {}
impl FilePort for NullApp {}
impl TimePort for NullApp {}
impl WifiPort for NullApp {}
impl StreamPort for NullApp {}

struct CheckedLink;

impl LinkPort for CheckedLink {
    fn send_coded_response(&mut self, frame: &[u8]) -> Result<(), ErrorCode> {
        assert!(!frame.is_empty(), "emitted an empty frame");
        assert!(frame.len() <= MAX_MESSAGE_SIZE, "emitted an over-MTU frame");
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let mut app = NullApp;
    let mut link = CheckedLink;
    let mut stack = ReachStack::new();
    stack.set_comm_link_connected(true, &mut app);

    if !data.is_empty() && data.len() <= MAX_MESSAGE_SIZE {
        stack
            .store_coded_prompt(data)
            .expect("a sized frame fits the empty prompt slot");
    }
    stack.process(1, &mut link, &mut app);
    stack.process(2, &mut link, &mut app);

    // Teardown must be clean whatever the frame started.
    stack.set_comm_link_connected(false, &mut app);
    stack.process(3, &mut link, &mut app);
});
