//! Trade-lock scheduling.
//!
//! Rules implemented:
//! - an item unlocks at local midnight, `lock_days` calendar days after the
//!   local day it was purchased on
//! - local days follow the IANA rules of the policy zone (America/Los_Angeles
//!   by default), so the unlock date carries its own UTC offset
//! - the countdown is whole days plus the remaining whole hours
//! - missing or unparseable purchase dates mean "no lock"

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::{America::Los_Angeles, Tz};
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_LOCK_DAYS: u32 = 8;

const SECONDS_PER_HOUR: i64 = 60 * 60;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;
const GAP_SCAN_STEP_MINUTES: i64 = 15;
const GAP_SCAN_MAX_STEPS: i64 = 4 * 24;

const UTC_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];
const LOCAL_DATETIME_FORMATS: [&str; 2] = ["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
const LOCAL_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub lock_days: u32,
    pub time_zone: Tz,
}

impl Default for LockPolicy {
    fn default() -> Self {
        Self {
            lock_days: DEFAULT_LOCK_DAYS,
            time_zone: Los_Angeles,
        }
    }
}

impl LockPolicy {
    pub fn new(lock_days: u32, time_zone: Tz) -> Result<Self, UnlockError> {
        if lock_days == 0 {
            return Err(UnlockError::ZeroLockDays);
        }
        Ok(Self {
            lock_days,
            time_zone,
        })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UnlockError {
    #[error("invalid lock policy: lock_days must be >= 1")]
    ZeroLockDays,
}

/// Time left until an item becomes tradeable. `hours` is always below 24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Countdown {
    pub days: u32,
    pub hours: u32,
}

impl Countdown {
    fn from_remaining_seconds(remaining: i64) -> Self {
        let remaining = remaining.max(0);
        let days = remaining / SECONDS_PER_DAY;
        let hours = (remaining % SECONDS_PER_DAY) / SECONDS_PER_HOUR;
        Self {
            days: u32::try_from(days).unwrap_or(u32::MAX),
            hours: hours as u32,
        }
    }
}

/// Derived trade-lock state of one item at one evaluation instant.
///
/// `unlock_at` is present iff a purchase instant was known. `countdown` is
/// present iff the item is still locked, so "just unlocked" and "no data"
/// stay distinguishable from a zero countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LockState {
    pub unlock_at: Option<DateTime<Utc>>,
    pub countdown: Option<Countdown>,
}

impl LockState {
    pub const NO_LOCK: LockState = LockState {
        unlock_at: None,
        countdown: None,
    };

    pub fn is_locked(&self) -> bool {
        self.countdown.is_some()
    }
}

/// Returns the instant of 00:00 local time on the calendar day `instant`
/// falls on in `tz`.
pub fn local_midnight(instant: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = instant.with_timezone(&tz);
    match midnight_on(local.date_naive(), tz) {
        Some(midnight) => midnight,
        None => instant - (local.naive_local() - local.date_naive().and_time(NaiveTime::MIN)),
    }
}

pub fn unlock_instant(purchase: DateTime<Utc>, policy: &LockPolicy) -> Option<DateTime<Utc>> {
    let purchase_date = purchase.with_timezone(&policy.time_zone).date_naive();
    let unlock_date = purchase_date.checked_add_days(Days::new(u64::from(policy.lock_days)))?;
    midnight_on(unlock_date, policy.time_zone)
}

pub fn compute_lock_state(
    purchase: Option<DateTime<Utc>>,
    policy: &LockPolicy,
    now: DateTime<Utc>,
) -> LockState {
    let Some(purchase) = purchase else {
        return LockState::NO_LOCK;
    };

    let Some(unlock_at) = unlock_instant(purchase, policy) else {
        debug!(
            component = "unlock",
            event = "unlock.calendar_overflow",
            purchase = %purchase,
            lock_days = policy.lock_days
        );
        return LockState::NO_LOCK;
    };

    let countdown = (unlock_at > now)
        .then(|| Countdown::from_remaining_seconds((unlock_at - now).num_seconds()));

    LockState {
        unlock_at: Some(unlock_at),
        countdown,
    }
}

/// Same as [`compute_lock_state`] for a raw purchase cell. Anything that does
/// not parse is treated as "no lock".
pub fn compute_lock_state_raw(
    purchase: Option<&str>,
    policy: &LockPolicy,
    now: DateTime<Utc>,
) -> LockState {
    let Some(raw) = purchase.filter(|raw| !raw.trim().is_empty()) else {
        return LockState::NO_LOCK;
    };

    match parse_purchase_instant(raw, policy.time_zone) {
        Some(instant) => compute_lock_state(Some(instant), policy, now),
        None => {
            debug!(
                component = "unlock",
                event = "unlock.purchase.unparseable",
                raw
            );
            LockState::NO_LOCK
        }
    }
}

pub fn parse_purchase_instant(raw: &str, tz: Tz) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in UTC_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc());
        }
    }

    for format in LOCAL_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return resolve_local(naive, tz);
        }
    }

    for format in LOCAL_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return midnight_on(date, tz);
        }
    }

    trimmed.parse::<i64>().ok().and_then(from_epoch)
}

pub fn format_lock_status(state: &LockState) -> String {
    match state.countdown {
        Some(Countdown { days, hours }) => {
            format!("Trade locked for {days} days {hours} hours")
        }
        None => "Unlocked".to_string(),
    }
}

fn midnight_on(date: NaiveDate, tz: Tz) -> Option<DateTime<Utc>> {
    resolve_local(date.and_time(NaiveTime::MIN), tz)
}

// Ambiguous wall-clock times resolve to the earlier instant; times inside a
// DST gap resolve to the first wall-clock time after the gap.
fn resolve_local(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    for step in 0..=GAP_SCAN_MAX_STEPS {
        let candidate = naive + chrono::Duration::minutes(step * GAP_SCAN_STEP_MINUTES);
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
            LocalResult::None => continue,
        }
    }
    None
}

fn from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.abs() >= EPOCH_MILLIS_THRESHOLD {
        DateTime::from_timestamp_millis(value)
    } else {
        DateTime::from_timestamp(value, 0)
    }
}
