use crate::time_of_day::TimeOfDay;
use serde::{Deserialize, Serialize};

/// Upper bound on the number of slots an interval may produce in one day
pub const MAX_INTERVAL_SLOTS_PER_DAY: usize = 48;

/// Secondary cadence of a `Reminder`: fire every `minutes` inside the
/// `[start_time, end_time)` window of each day the reminder is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderInterval {
    pub minutes: u32,
    pub start_time: TimeOfDay,
    pub end_time: TimeOfDay,
}

impl ReminderInterval {
    pub fn slots(&self) -> IntervalSlots {
        expand_interval(self.start_time, self.end_time, self.minutes)
    }
}

/// The ordered slots `start, start + step, ...` strictly before `end`.
///
/// The value is `Copy`, so iterating it never consumes it and the same
/// expansion can be walked any number of times.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSlots {
    start: u32,
    end: u32,
    step: u32,
}

/// Expands a time of day window into the slots of a single day.
/// A window where `start >= end`, or a zero step, yields no slots.
pub fn expand_interval(start: TimeOfDay, end: TimeOfDay, step_minutes: u32) -> IntervalSlots {
    let start = start.minutes_of_day();
    let end = end.minutes_of_day();
    if step_minutes == 0 || start >= end {
        return IntervalSlots {
            start: end,
            end,
            step: 1,
        };
    }
    IntervalSlots {
        start,
        end,
        step: step_minutes,
    }
}

impl IntervalSlots {
    pub fn len(&self) -> usize {
        if self.start >= self.end {
            return 0;
        }
        ((self.end - self.start + self.step - 1) / self.step) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> IntervalSlotsIter {
        IntervalSlotsIter {
            next: self.start,
            end: self.end,
            step: self.step,
        }
    }

    pub fn first(&self) -> Option<TimeOfDay> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<TimeOfDay> {
        if self.is_empty() {
            return None;
        }
        TimeOfDay::from_minutes(self.start + (self.len() as u32 - 1) * self.step)
    }
}

impl IntoIterator for IntervalSlots {
    type Item = TimeOfDay;
    type IntoIter = IntervalSlotsIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone)]
pub struct IntervalSlotsIter {
    next: u32,
    end: u32,
    step: u32,
}

impl Iterator for IntervalSlotsIter {
    type Item = TimeOfDay;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let slot = TimeOfDay::from_minutes(self.next);
        self.next = self.next.saturating_add(self.step);
        slot
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next >= self.end {
            0
        } else {
            ((self.end - self.next + self.step - 1) / self.step) as usize
        };
        (remaining, Some(remaining))
    }
}
