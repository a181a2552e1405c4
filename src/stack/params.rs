//! Parameter service handlers.
//!
//! Discovery and reads batch a few objects per frame and continue
//! across ticks; the cursor lives here so the engine can keep asking
//! for the next batch. A request may scope the operation to an
//! explicit PID list or, with an empty list, to the whole repository.

use core::fmt::Write as _;

use heapless::Vec;

use crate::config::{COUNT_MEDIUM_STRUCTS, COUNT_PARAM_DESC_IN_RESPONSE, COUNT_PARAM_IDS};
use crate::error::{ErrorCode, Result};
use crate::ports::ParamPort;
use crate::stack::notify::NotifyTable;
use crate::wire::types::{
    BigString, DiscoverNotifications, DiscoverNotificationsResponse, ParamExInfoResponse,
    ParamNotifyConfigResponse, ParamValue, ParamValueRecord, ParamDisableNotifications,
    ParamEnableNotifications, ParameterInfoRequest, ParameterInfoResponse, ParameterRead,
    ParameterReadResponse, ParameterWrite, ParameterWriteResponse,
};

/// Iteration scope of a live parameter transaction: an explicit PID
/// list walked by index, or the repository's own discovery cursor.
#[derive(Debug, Default)]
pub struct ParamCursor {
    ids: Vec<u32, COUNT_PARAM_IDS>,
    index: usize,
    all_mode: bool,
    /// List-mode extended discovery: whether the per-PID cursor for
    /// `ids[index]` has been reset yet.
    entered: bool,
}

impl ParamCursor {
    fn begin_all(&mut self) {
        self.ids.clear();
        self.index = 0;
        self.all_mode = true;
        self.entered = false;
    }

    fn begin_ids(&mut self, ids: &Vec<u32, COUNT_PARAM_IDS>) {
        self.ids = ids.clone();
        self.index = 0;
        self.all_mode = false;
        self.entered = false;
    }

    fn next_id(&mut self) -> Option<u32> {
        let id = self.ids.get(self.index).copied();
        self.index += 1;
        id
    }
}

// ── Discovery ─────────────────────────────────────────────────

/// First frame of DISCOVER_PARAMETERS. Returns the response and how
/// many further frames the engine owes.
pub fn handle_discover(
    req: &ParameterInfoRequest,
    cursor: &mut ParamCursor,
    app: &mut impl ParamPort,
) -> Result<(ParameterInfoResponse, u32)> {
    let total = if req.parameter_ids.is_empty() {
        cursor.begin_all();
        app.parameter_discover_reset(0)?;
        app.parameter_count()
    } else {
        cursor.begin_ids(&req.parameter_ids);
        req.parameter_ids.len()
    };
    let frames = frames_for(total, COUNT_PARAM_DESC_IN_RESPONSE);
    let first = produce_discover_batch(cursor, app);
    Ok((first, frames.saturating_sub(1)))
}

/// One DISCOVER_PARAMETERS frame worth of descriptors.
pub fn produce_discover_batch(
    cursor: &mut ParamCursor,
    app: &mut impl ParamPort,
) -> ParameterInfoResponse {
    let mut response = ParameterInfoResponse::default();
    while !response.parameter_infos.is_full() {
        if cursor.all_mode {
            let Ok(info) = app.parameter_discover_next() else {
                break;
            };
            let _ = response.parameter_infos.push(info);
        } else {
            let Some(id) = cursor.next_id() else {
                break;
            };
            // Unknown IDs in a discovery list are skipped.
            if app.parameter_discover_reset(id).is_err() {
                continue;
            }
            match app.parameter_discover_next() {
                Ok(info) if info.id == id => {
                    let _ = response.parameter_infos.push(info);
                }
                _ => {}
            }
        }
    }
    response
}

// ── Extended discovery ────────────────────────────────────────

/// First frame of DISCOVER_PARAM_EX; one object per frame.
pub fn handle_discover_ex(
    req: &ParameterInfoRequest,
    cursor: &mut ParamCursor,
    app: &mut impl ParamPort,
) -> Result<(ParamExInfoResponse, u32)> {
    let total = if req.parameter_ids.is_empty() {
        cursor.begin_all();
        app.parameter_ex_discover_reset(None)?;
        app.parameter_ex_count(None)
    } else {
        cursor.begin_ids(&req.parameter_ids);
        req.parameter_ids
            .iter()
            .map(|id| app.parameter_ex_count(Some(*id)))
            .sum()
    };
    let first = produce_ex_next(cursor, app)?;
    Ok((first, (total as u32).saturating_sub(1)))
}

/// Next extended-info object, crossing PID boundaries in list mode.
pub fn produce_ex_next(
    cursor: &mut ParamCursor,
    app: &mut impl ParamPort,
) -> Result<ParamExInfoResponse> {
    if cursor.all_mode {
        return app.parameter_ex_discover_next();
    }
    loop {
        if !cursor.entered {
            let Some(id) = cursor.ids.get(cursor.index).copied() else {
                return Err(ErrorCode::NoData);
            };
            app.parameter_ex_discover_reset(Some(id))?;
            cursor.entered = true;
        }
        match app.parameter_ex_discover_next() {
            Ok(info) => return Ok(info),
            Err(ErrorCode::NoData) => {
                cursor.index += 1;
                cursor.entered = false;
            }
            Err(code) => return Err(code),
        }
    }
}

// ── Read ──────────────────────────────────────────────────────

/// First frame of READ_PARAMETERS. Empty list reads everything.
pub fn handle_read(
    req: &ParameterRead,
    cursor: &mut ParamCursor,
    app: &mut impl ParamPort,
) -> Result<(ParameterReadResponse, u32)> {
    let total = if req.parameter_ids.is_empty() {
        cursor.begin_all();
        app.parameter_discover_reset(0)?;
        app.parameter_count()
    } else {
        cursor.begin_ids(&req.parameter_ids);
        req.parameter_ids.len()
    };
    let frames = frames_for(total, COUNT_MEDIUM_STRUCTS);
    let first = produce_read_batch(cursor, app);
    Ok((first, frames.saturating_sub(1)))
}

/// One READ_PARAMETERS frame worth of values.
pub fn produce_read_batch(
    cursor: &mut ParamCursor,
    app: &mut impl ParamPort,
) -> ParameterReadResponse {
    let mut response = ParameterReadResponse::default();
    while !response.values.is_full() {
        if cursor.all_mode {
            let Ok(info) = app.parameter_discover_next() else {
                break;
            };
            // Unreadable parameters are skipped in an all-read.
            if let Ok(record) = app.parameter_read(info.id) {
                let _ = response.values.push(record);
            }
        } else {
            let Some(id) = cursor.next_id() else {
                break;
            };
            let record = app.parameter_read(id).unwrap_or_else(|code| ParamValueRecord {
                parameter_id: id,
                timestamp: 0,
                result: code.as_i32(),
                value: ParamValue::Uint32(0),
            });
            let _ = response.values.push(record);
        }
    }
    response
}

// ── Write ─────────────────────────────────────────────────────

/// WRITE_PARAMETERS: every value is attempted; the response carries
/// the first failure.
pub fn handle_write(
    req: &ParameterWrite,
    app: &mut impl ParamPort,
) -> Result<ParameterWriteResponse> {
    if req.values.is_empty() {
        return Err(ErrorCode::InvalidParameter);
    }
    let mut first_failure = ErrorCode::NoError;
    for value in &req.values {
        if let Err(code) = app.parameter_write(value) {
            if first_failure == ErrorCode::NoError {
                first_failure = code;
            }
        }
    }
    Ok(ParameterWriteResponse {
        result: first_failure.as_i32(),
    })
}

// ── Notification configuration ────────────────────────────────

pub fn handle_enable_notifications(
    req: &ParamEnableNotifications,
    table: &mut NotifyTable,
    now: u32,
    app: &mut impl ParamPort,
) -> ParamNotifyConfigResponse {
    match table.enable(&req.configs, req.disable_all_first, now, app) {
        Ok(()) => ParamNotifyConfigResponse {
            result: 0,
            result_message: None,
        },
        Err(rejection) => {
            let mut message = BigString::new();
            let _ = write!(message, "pid {}: {}", rejection.pid, rejection.code);
            ParamNotifyConfigResponse {
                result: rejection.code.as_i32(),
                result_message: Some(message),
            }
        }
    }
}

pub fn handle_disable_notifications(
    req: &ParamDisableNotifications,
    table: &mut NotifyTable,
) -> ParamNotifyConfigResponse {
    table.disable(&req.parameter_ids);
    ParamNotifyConfigResponse {
        result: 0,
        result_message: None,
    }
}

pub fn handle_discover_notifications(
    req: &DiscoverNotifications,
    table: &NotifyTable,
) -> DiscoverNotificationsResponse {
    let mut response = DiscoverNotificationsResponse::default();
    table.active_configs(&req.parameter_ids, &mut response.configs);
    response
}

fn frames_for(total: usize, per_frame: usize) -> u32 {
    (total.div_ceil(per_frame)) as u32
}
