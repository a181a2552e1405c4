//! Wi-Fi provisioning handlers. Discovery walks the scan list one
//! access point per response message; connect hands the credentials to
//! the driver and echoes its verdict.

use core::fmt::Write as _;

use crate::error::{ErrorCode, Result};
use crate::ports::WifiPort;
use crate::wire::types::{
    BigString, DiscoverWifiResponse, WifiConnectionRequest, WifiConnectionResponse,
};

/// First frame of DISCOVER_WIFI. An empty scan list is answered with a
/// single NO_DATA frame, not an error report.
pub fn handle_discover_wifi(
    app: &mut impl WifiPort,
) -> Result<(DiscoverWifiResponse, u32)> {
    app.wifi_discover_begin()?;
    let total = app.wifi_count();
    if total == 0 {
        return Ok((
            DiscoverWifiResponse {
                result: ErrorCode::NoData.as_i32(),
                access_point: None,
            },
            0,
        ));
    }
    app.wifi_discover_reset()?;
    let first = produce_wifi_next(app)?;
    Ok((first, (total as u32).saturating_sub(1)))
}

/// Next access point off the scan cursor.
pub fn produce_wifi_next(app: &mut impl WifiPort) -> Result<DiscoverWifiResponse> {
    let access_point = app.wifi_discover_next()?;
    Ok(DiscoverWifiResponse {
        result: 0,
        access_point: Some(access_point),
    })
}

/// WIFI_CONNECT, also used for disconnect when the request says so.
/// Driver failures are in-band.
pub fn handle_wifi_connect(
    req: &WifiConnectionRequest,
    app: &mut impl WifiPort,
) -> Result<WifiConnectionResponse> {
    match app.wifi_connect(req) {
        Ok(response) => Ok(response),
        Err(code) => {
            let mut message = BigString::new();
            let _ = write!(message, "wifi {}: {}", req.ssid.as_str(), code);
            Ok(WifiConnectionResponse {
                result: code.as_i32(),
                signal_strength: None,
                result_message: Some(message),
            })
        }
    }
}
