//! Fuzz target: typed payload decoding
//!
//! Uses the first byte to pick a request schema, decodes the rest as
//! that schema, and re-encodes whatever was accepted. The bounded
//! heapless fields must keep every decodable value inside a fixed
//! scratch buffer, with no panics on the way.
//!
//! cargo fuzz run fuzz_payload_decode

#![no_main]

use libfuzzer_sys::fuzz_target;
use reach_device::wire::types::{
    DeviceInfoRequest, FileTransferRequest, ParamEnableNotifications, ParameterWrite, StreamData,
    TimeSetRequest, WifiConnectionRequest,
};
use reach_device::wire::{decode_payload, encode_payload};

macro_rules! exercise {
    ($schema:ty, $bytes:expr) => {
        if let Ok(msg) = decode_payload::<$schema>($bytes) {
            let mut scratch = [0u8; 256];
            let len = encode_payload(&msg, &mut scratch)
                .expect("decoded message must re-encode");
            assert!(len <= scratch.len());
        }
    };
}

fuzz_target!(|data: &[u8]| {
    let Some((&selector, payload)) = data.split_first() else {
        return;
    };
    match selector % 7 {
        0 => exercise!(FileTransferRequest, payload),
        1 => exercise!(ParameterWrite, payload),
        2 => exercise!(DeviceInfoRequest, payload),
        3 => exercise!(ParamEnableNotifications, payload),
        4 => exercise!(WifiConnectionRequest, payload),
        5 => exercise!(StreamData, payload),
        _ => exercise!(TimeSetRequest, payload),
    }
});
