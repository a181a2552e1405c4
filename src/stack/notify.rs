//! Parameter notification table and scheduler.
//!
//! Each enabled parameter occupies one slot holding its policy and the
//! tick and value of the last emission. Polling reads the live value
//! through the repository and emits when the heartbeat period lapses
//! or a significant change has settled for at least the minimum
//! period. Due slots are batched, at most `COUNT_MEDIUM_STRUCTS` to a
//! frame, so one chatty tick costs one frame.

use log::{info, warn};

use crate::config::NUM_SUPPORTED_PARAM_NOTIFY;
use crate::error::ErrorCode;
use crate::ports::ParamPort;
use crate::wire::types::{ParamNotifyConfig, ParamValue, ParameterNotification};

#[derive(Debug, Clone)]
struct NotifySlot {
    config: ParamNotifyConfig,
    last_emit_tick: u32,
    last_value: Option<ParamValue>,
}

/// Rejection from [`NotifyTable::enable`], carrying the offending PID
/// for the response message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyRejection {
    pub code: ErrorCode,
    pub pid: u32,
}

#[derive(Debug, Default)]
pub struct NotifyTable {
    slots: [Option<NotifySlot>; NUM_SUPPORTED_PARAM_NOTIFY],
}

impl NotifyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the application's startup configs. Invalid entries are
    /// logged and skipped rather than failing init.
    pub fn install_defaults(&mut self, now: u32, app: &mut impl ParamPort) {
        for config in app.parameter_notification_init() {
            if let Err(rejection) = self.enable_one(config, now, app) {
                warn!(
                    "startup notification for pid {} rejected: {}",
                    rejection.pid, rejection.code
                );
            }
        }
    }

    /// Apply one enable request. Stops at the first rejected config so
    /// the client learns exactly which entry failed.
    pub fn enable(
        &mut self,
        configs: &[ParamNotifyConfig],
        disable_all_first: bool,
        now: u32,
        app: &mut impl ParamPort,
    ) -> Result<(), NotifyRejection> {
        if disable_all_first {
            self.clear();
        }
        for config in configs {
            self.enable_one(*config, now, app)?;
        }
        Ok(())
    }

    fn enable_one(
        &mut self,
        config: ParamNotifyConfig,
        now: u32,
        app: &mut impl ParamPort,
    ) -> Result<(), NotifyRejection> {
        let pid = config.parameter_id;
        let baseline = match app.parameter_read(pid) {
            Ok(record) => Some(record.value),
            Err(_) => {
                return Err(NotifyRejection {
                    code: ErrorCode::InvalidParameter,
                    pid,
                });
            }
        };

        // Re-enabling an active PID updates its policy in place.
        if let Some(slot) = self.slot_for_mut(pid) {
            slot.config = config;
            return Ok(());
        }

        let Some(free) = self.slots.iter_mut().find(|slot| slot.is_none()) else {
            return Err(NotifyRejection {
                code: ErrorCode::NoResource,
                pid,
            });
        };
        *free = Some(NotifySlot {
            config,
            last_emit_tick: now,
            last_value: baseline,
        });
        info!("notifications enabled for pid {}", pid);
        Ok(())
    }

    /// Disable the listed PIDs. Unknown PIDs are ignored.
    pub fn disable(&mut self, pids: &[u32]) {
        for slot in self.slots.iter_mut() {
            if let Some(active) = slot {
                if pids.contains(&active.config.parameter_id) {
                    *slot = None;
                }
            }
        }
    }

    /// Drop every slot. Runs on link-down and on `disable_all_first`.
    pub fn clear(&mut self) {
        self.slots = Default::default();
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// Active configs, optionally filtered to the requested PIDs.
    pub fn active_configs(
        &self,
        filter: &[u32],
        out: &mut heapless::Vec<ParamNotifyConfig, NUM_SUPPORTED_PARAM_NOTIFY>,
    ) {
        for slot in self.slots.iter().flatten() {
            let pid = slot.config.parameter_id;
            if filter.is_empty() || filter.contains(&pid) {
                // Capacity matches the table, cannot overflow.
                let _ = out.push(slot.config);
            }
        }
    }

    /// Evaluate every slot at `now` and batch the due ones.
    pub fn poll(&mut self, now: u32, app: &mut impl ParamPort) -> Option<ParameterNotification> {
        let mut notification = ParameterNotification::default();
        for slot in self.slots.iter_mut().flatten() {
            if notification.values.is_full() {
                break;
            }
            let Ok(record) = app.parameter_read(slot.config.parameter_id) else {
                continue;
            };
            if slot_is_due(slot, now, &record.value) {
                slot.last_emit_tick = now;
                slot.last_value = Some(record.value.clone());
                let _ = notification.values.push(record);
            }
        }
        if notification.values.is_empty() {
            None
        } else {
            Some(notification)
        }
    }
}

impl NotifyTable {
    fn slot_for_mut(&mut self, pid: u32) -> Option<&mut NotifySlot> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|slot| slot.config.parameter_id == pid)
    }
}

fn slot_is_due(slot: &NotifySlot, now: u32, value: &ParamValue) -> bool {
    let elapsed = now.wrapping_sub(slot.last_emit_tick);
    let max_period = slot.config.maximum_notification_period;
    if max_period != 0 && elapsed >= max_period {
        return true;
    }
    if elapsed < slot.config.minimum_notification_period {
        return false;
    }
    match &slot.last_value {
        Some(last) => exceeds_delta(last, value, slot.config.minimum_delta),
        None => true,
    }
}

/// Change significance by wire type. Numeric families compare against
/// `min_delta`; discrete and opaque types notify on any change.
fn exceeds_delta(old: &ParamValue, new: &ParamValue, min_delta: f32) -> bool {
    let delta = f64::from(min_delta);
    match (old, new) {
        (ParamValue::Uint32(a), ParamValue::Uint32(b)) => u32::abs_diff(*a, *b) as f64 >= delta,
        (ParamValue::Int32(a), ParamValue::Int32(b)) => i32::abs_diff(*a, *b) as f64 >= delta,
        (ParamValue::Float32(a), ParamValue::Float32(b)) => {
            (f64::from(*a) - f64::from(*b)).abs() >= delta
        }
        (ParamValue::Uint64(a), ParamValue::Uint64(b)) => u64::abs_diff(*a, *b) as f64 >= delta,
        (ParamValue::Int64(a), ParamValue::Int64(b)) => i64::abs_diff(*a, *b) as f64 >= delta,
        (ParamValue::Float64(a), ParamValue::Float64(b)) => (a - b).abs() >= delta,
        (ParamValue::Enumeration(a), ParamValue::Enumeration(b)) => {
            u32::abs_diff(*a, *b) as f64 >= delta
        }
        (ParamValue::Bitfield(a), ParamValue::Bitfield(b)) => u64::abs_diff(*a, *b) as f64 >= delta,
        (a, b) => a != b,
    }
}
