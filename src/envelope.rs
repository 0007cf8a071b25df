use std::net::Ipv4Addr;

use serde_json::{json, Map, Value};

use crate::commands::Action;
use crate::error::RectError;

const MAX_INTERVAL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Unit for schedule intervals and PWM periods.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    pub(crate) fn suffix(self) -> &'static str {
        match self {
            Self::Seconds => "s",
            Self::Minutes => "m",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }

    fn seconds(self) -> u64 {
        match self {
            Self::Seconds => 1,
            Self::Minutes => 60,
            Self::Hours => 3_600,
            Self::Days => 86_400,
        }
    }
}

/// A repeat interval for scheduled events, capped at 7 days.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Interval {
    value: u32,
    unit: TimeUnit,
}

impl Interval {
    /// Creates an interval of `value` units. Zero-length intervals and
    /// intervals longer than 7 days are rejected.
    pub fn new(value: u32, unit: TimeUnit) -> Result<Self, RectError> {
        if value == 0 {
            return Err(RectError::invalid_parameter(
                "schedule interval must be positive",
            ));
        }

        if u64::from(value) * unit.seconds() > MAX_INTERVAL_SECONDS {
            return Err(RectError::invalid_parameter(format!(
                "schedule interval {value}{} exceeds the 7 day maximum",
                unit.suffix()
            )));
        }

        Ok(Self { value, unit })
    }

    fn encode(&self) -> String {
        format!("{}{}", self.value, self.unit.suffix())
    }
}

/// A calendar date and time, validated on construction.
///
/// Formats as `YYYY/MM/DD HH/MM/SS` in schedule fields; also supplies the
/// field values for RTC write actions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DateTime {
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Result<Self, RectError> {
        if !(1..=12).contains(&month) {
            return Err(RectError::invalid_parameter(format!(
                "month must be within 1..=12, got {month}"
            )));
        }

        let month_days = days_in_month(year, month);
        if !(1..=month_days).contains(&day) {
            return Err(RectError::invalid_parameter(format!(
                "day must be within 1..={month_days} for {year}/{month:02}, got {day}"
            )));
        }

        if hour > 23 {
            return Err(RectError::invalid_parameter(format!(
                "hour must be within 0..=23, got {hour}"
            )));
        }

        if minute > 59 || second > 59 {
            return Err(RectError::invalid_parameter(format!(
                "minute and second must be within 0..=59, got {minute}/{second}"
            )));
        }

        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    fn encode(&self) -> String {
        format!(
            "{:04}/{:02}/{:02} {:02}/{:02}/{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Timing specification for a scheduled event: exactly one of a repeat
/// interval, a start time, or an end time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Schedule {
    Interval(Interval),
    Start(DateTime),
    End(DateTime),
}

/// Edge condition for pin-state-triggered events.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Trigger {
    Change,
    Falling,
    Rising,
}

impl Trigger {
    fn wire_name(self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::Falling => "falling",
            Self::Rising => "rising",
        }
    }
}

/// Destination the board delivers asynchronous results to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReturnTarget {
    kind: &'static str,
    address: String,
}

impl ReturnTarget {
    /// Deliver results to a TCP socket at the given IPv4 address and port.
    pub fn tcp(address: [u8; 4], port: u16) -> Self {
        Self {
            kind: "tcp",
            address: format!("{}:{port}", Ipv4Addr::from(address)),
        }
    }

    /// Deliver results to a UDP socket at the given IPv4 address and port.
    pub fn udp(address: [u8; 4], port: u16) -> Self {
        Self {
            kind: "udp",
            address: format!("{}:{port}", Ipv4Addr::from(address)),
        }
    }

    /// Deliver results to a named file on the board's storage.
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            kind: "file",
            address: name.into(),
        }
    }

    pub(crate) fn wire_fields(&self) -> Vec<Value> {
        vec![json!(self.kind), json!(self.address)]
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum EventKind {
    Now,
    Schedule(Schedule),
    PinState { pin: u32, trigger: Trigger },
}

impl EventKind {
    fn wire_name(&self) -> &'static str {
        match self {
            Self::Now => "now",
            Self::Schedule(_) => "schedule",
            Self::PinState { .. } => "pinstate",
        }
    }
}

/// The request envelope around a sequence of actions.
///
/// The timing mode is fixed at construction; actions are appended in
/// execution order. [`Event::serialize`] re-derives the payload from the
/// current state on every call, so it can be called repeatedly and always
/// reflects the latest appended actions.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    kind: EventKind,
    actions: Vec<Action>,
    return_target: Option<ReturnTarget>,
}

impl Event {
    /// An event the board executes immediately on receipt.
    pub fn now() -> Self {
        Self::with_kind(EventKind::Now)
    }

    /// An event the board executes on the given schedule.
    pub fn schedule(schedule: Schedule) -> Self {
        Self::with_kind(EventKind::Schedule(schedule))
    }

    /// An event the board executes when `pin` sees the given edge.
    pub fn pin_state(pin: u32, trigger: Trigger) -> Self {
        Self::with_kind(EventKind::PinState { pin, trigger })
    }

    fn with_kind(kind: EventKind) -> Self {
        Self {
            kind,
            actions: Vec::new(),
            return_target: None,
        }
    }

    /// Appends an action; the board executes actions in insertion order.
    pub fn add_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Attaches the asynchronous-result destination. At most one return
    /// target may be attached per event.
    pub fn set_return(&mut self, target: ReturnTarget) -> Result<(), RectError> {
        if self.return_target.is_some() {
            return Err(RectError::invalid_parameter(
                "a return target is already attached to this event",
            ));
        }

        self.return_target = Some(target);
        Ok(())
    }

    /// Number of actions currently attached.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Serializes the envelope to the JSON request body.
    pub fn serialize(&self) -> String {
        let mut object = Map::new();
        object.insert("event".to_string(), json!(self.kind.wire_name()));

        let actions = self
            .actions
            .iter()
            .map(|action| Value::Array(action.wire_fields()))
            .collect();
        object.insert("actions".to_string(), Value::Array(actions));

        match &self.kind {
            EventKind::Now => {}
            EventKind::Schedule(Schedule::Interval(interval)) => {
                object.insert("interval".to_string(), json!(interval.encode()));
            }
            EventKind::Schedule(Schedule::Start(start)) => {
                object.insert("start".to_string(), json!(start.encode()));
            }
            EventKind::Schedule(Schedule::End(end)) => {
                object.insert("end".to_string(), json!(end.encode()));
            }
            EventKind::PinState { pin, trigger } => {
                object.insert("pin".to_string(), json!(pin));
                object.insert("trigger".to_string(), json!(trigger.wire_name()));
            }
        }

        if let Some(target) = &self.return_target {
            object.insert("return".to_string(), Value::Array(target.wire_fields()));
        }

        Value::Object(object).to_string()
    }
}
