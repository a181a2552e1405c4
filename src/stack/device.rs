//! Device info and ping handlers.
//!
//! GET_DEVICE_INFO is the session opener: it carries the challenge key
//! to the application, rejects clients speaking an incompatible
//! protocol major, and returns the identity struct with the fields the
//! stack owns filled in over whatever the application supplied.

use core::fmt::Write as _;

use crate::config::PROTOCOL_VERSION;
use crate::error::{ErrorCode, Result};
use crate::ports::{DevicePort, LinkPort, ParamPort};
use crate::wire::sizes::SizesDescriptor;
use crate::wire::types::{DeviceInfoRequest, DeviceInfoResponse, PingRequest, PingResponse};

pub fn handle_get_device_info(
    req: &DeviceInfoRequest,
    app: &mut (impl DevicePort + ParamPort),
) -> Result<DeviceInfoResponse> {
    // The challenge key is judged before anything else so the
    // application's answer already reflects the new access level.
    app.configure_access_control(req);
    check_client_version(&req.client_protocol_version)?;

    let mut info = app.device_info(req)?;
    info.protocol_version.clear();
    let (major, minor, patch) = PROTOCOL_VERSION;
    let _ = write!(info.protocol_version, "{}.{}.{}", major, minor, patch);
    info.parameter_metadata_hash = app.compute_parameter_hash();
    info.sizes_struct = SizesDescriptor::for_this_build().pack();
    Ok(info)
}

/// Clients may announce their protocol version; a different major is
/// incompatible. An empty string skips the check.
fn check_client_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Ok(());
    }
    let major = version.split('.').next().and_then(|m| m.parse::<u8>().ok());
    match major {
        Some(m) if m == PROTOCOL_VERSION.0 => Ok(()),
        _ => Err(ErrorCode::InvalidState),
    }
}

pub fn handle_ping(req: &PingRequest, link: &mut impl LinkPort) -> PingResponse {
    PingResponse {
        echo_data: req.echo_data.clone(),
        signal_strength: link.signal_strength(),
    }
}
