//! Time service handlers. Clock failures come back in the response
//! result field rather than an error report; the client asked a
//! question and gets its answer either way.

use core::fmt::Write as _;

use crate::error::Result;
use crate::ports::TimePort;
use crate::wire::types::{BigString, TimeGetResponse, TimeSetRequest, TimeSetResponse};

pub fn handle_get_time(app: &mut impl TimePort) -> Result<TimeGetResponse> {
    match app.time_get() {
        Ok(response) => Ok(response),
        Err(code) => Ok(TimeGetResponse {
            result: code.as_i32(),
            seconds_utc: 0,
            timezone: None,
        }),
    }
}

pub fn handle_set_time(req: &TimeSetRequest, app: &mut impl TimePort) -> Result<TimeSetResponse> {
    match app.time_set(req) {
        Ok(()) => Ok(TimeSetResponse {
            result: 0,
            result_message: None,
        }),
        Err(code) => {
            let mut message = BigString::new();
            let _ = write!(message, "set time: {}", code);
            Ok(TimeSetResponse {
                result: code.as_i32(),
                result_message: Some(message),
            })
        }
    }
}
