//! Access gate.
//!
//! Before a handler runs, the prompt's message type is mapped to the
//! service it belongs to and the pair `(service, object)` is put to
//! the application. A valid challenge key bypasses the per-pair check
//! entirely; without one, the application's policy decides. Ping,
//! device info, and error reports are never gated, so a client can
//! always identify the device and learn what a denial means.

use crate::error::{ErrorCode, Result};
use crate::ports::DevicePort;
use crate::wire::types::{MessageType, ServiceId};

/// Service a message type is accounted to, `None` for the ungated
/// core messages.
pub const fn service_for(mtype: MessageType) -> Option<ServiceId> {
    match mtype {
        MessageType::ErrorReport | MessageType::Ping | MessageType::GetDeviceInfo => None,
        MessageType::DiscoverParameters
        | MessageType::DiscoverParamEx
        | MessageType::ReadParameters
        | MessageType::WriteParameters
        | MessageType::ParameterNotification
        | MessageType::DiscoverNotifications
        | MessageType::ParamEnableNotify
        | MessageType::ParamDisableNotify => Some(ServiceId::Parameters),
        MessageType::DiscoverFiles
        | MessageType::TransferInit
        | MessageType::TransferData
        | MessageType::TransferDataNotification
        | MessageType::EraseFile => Some(ServiceId::Files),
        MessageType::DiscoverCommands | MessageType::SendCommand => Some(ServiceId::Commands),
        MessageType::CliNotification => Some(ServiceId::Cli),
        MessageType::DiscoverStreams
        | MessageType::OpenStream
        | MessageType::CloseStream
        | MessageType::StreamDataNotification => Some(ServiceId::Streams),
        MessageType::SetTime | MessageType::GetTime => Some(ServiceId::Time),
        MessageType::DiscoverWifi | MessageType::WifiConnect => Some(ServiceId::Wifi),
    }
}

/// Evaluate the gate for one service/object pair.
pub fn check(app: &impl DevicePort, service: ServiceId, id: Option<u32>) -> Result<()> {
    if app.challenge_key_is_valid() || app.access_granted(service, id) {
        Ok(())
    } else {
        Err(ErrorCode::ChallengeFailed)
    }
}

/// Gate an inbound prompt by its message type alone. Handlers with a
/// concrete object ID re-check once the payload is decoded.
pub fn check_message(app: &impl DevicePort, mtype: MessageType) -> Result<()> {
    match service_for(mtype) {
        Some(service) => check(app, service, None),
        None => Ok(()),
    }
}
