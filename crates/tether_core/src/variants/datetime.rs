//! Calendar accessors and comparisons for instant properties
//!
//! Everything here is read-only. `add` and `subtract` return a new instant
//! and leave the property unchanged. The nullable form never fails: accessors
//! return `None` and comparisons return `false` while the value is absent.

use crate::property::Property;
use chrono::{DateTime, Datelike, TimeDelta, Timelike, Utc, Weekday};
use std::cmp::Ordering;

impl Property<DateTime<Utc>> {
    pub fn year(&self) -> i32 {
        self.value().year()
    }

    /// Month of the year, 1-based
    pub fn month(&self) -> u32 {
        self.value().month()
    }

    pub fn day(&self) -> u32 {
        self.value().day()
    }

    pub fn hour(&self) -> u32 {
        self.value().hour()
    }

    pub fn minute(&self) -> u32 {
        self.value().minute()
    }

    pub fn second(&self) -> u32 {
        self.value().second()
    }

    pub fn millisecond(&self) -> u32 {
        self.value().timestamp_subsec_millis()
    }

    /// Microseconds past the millisecond, 0..1000
    pub fn microsecond(&self) -> u32 {
        self.value().timestamp_subsec_micros() % 1000
    }

    pub fn weekday(&self) -> Weekday {
        self.value().weekday()
    }

    pub fn millis_since_epoch(&self) -> i64 {
        self.value().timestamp_millis()
    }

    pub fn is_before(&self, other: &DateTime<Utc>) -> bool {
        self.value() < *other
    }

    pub fn is_after(&self, other: &DateTime<Utc>) -> bool {
        self.value() > *other
    }

    pub fn is_at_same_moment_as(&self, other: &DateTime<Utc>) -> bool {
        self.value() == *other
    }

    pub fn compare_to(&self, other: &DateTime<Utc>) -> Ordering {
        self.value().cmp(other)
    }

    /// `self - other`
    pub fn difference(&self, other: &DateTime<Utc>) -> TimeDelta {
        self.value().signed_duration_since(*other)
    }

    /// The instant `delta` later; `None` if out of range
    pub fn add(&self, delta: TimeDelta) -> Option<DateTime<Utc>> {
        self.value().checked_add_signed(delta)
    }

    /// The instant `delta` earlier; `None` if out of range
    pub fn subtract(&self, delta: TimeDelta) -> Option<DateTime<Utc>> {
        self.value().checked_sub_signed(delta)
    }
}

impl Property<Option<DateTime<Utc>>> {
    fn read<R>(&self, f: impl FnOnce(DateTime<Utc>) -> R) -> Option<R> {
        self.value().map(f)
    }

    pub fn is_null(&self) -> bool {
        self.value().is_none()
    }

    pub fn year(&self) -> Option<i32> {
        self.read(|at| at.year())
    }

    pub fn month(&self) -> Option<u32> {
        self.read(|at| at.month())
    }

    pub fn day(&self) -> Option<u32> {
        self.read(|at| at.day())
    }

    pub fn hour(&self) -> Option<u32> {
        self.read(|at| at.hour())
    }

    pub fn minute(&self) -> Option<u32> {
        self.read(|at| at.minute())
    }

    pub fn second(&self) -> Option<u32> {
        self.read(|at| at.second())
    }

    pub fn millisecond(&self) -> Option<u32> {
        self.read(|at| at.timestamp_subsec_millis())
    }

    pub fn microsecond(&self) -> Option<u32> {
        self.read(|at| at.timestamp_subsec_micros() % 1000)
    }

    pub fn weekday(&self) -> Option<Weekday> {
        self.read(|at| at.weekday())
    }

    pub fn millis_since_epoch(&self) -> Option<i64> {
        self.read(|at| at.timestamp_millis())
    }

    /// False when absent
    pub fn is_before(&self, other: &DateTime<Utc>) -> bool {
        self.read(|at| at < *other).unwrap_or(false)
    }

    /// False when absent
    pub fn is_after(&self, other: &DateTime<Utc>) -> bool {
        self.read(|at| at > *other).unwrap_or(false)
    }

    /// False when absent
    pub fn is_at_same_moment_as(&self, other: &DateTime<Utc>) -> bool {
        self.read(|at| at == *other).unwrap_or(false)
    }

    pub fn compare_to(&self, other: &DateTime<Utc>) -> Option<Ordering> {
        self.read(|at| at.cmp(other))
    }

    pub fn difference(&self, other: &DateTime<Utc>) -> Option<TimeDelta> {
        self.read(|at| at.signed_duration_since(*other))
    }

    pub fn add(&self, delta: TimeDelta) -> Option<DateTime<Utc>> {
        self.value().and_then(|at| at.checked_add_signed(delta))
    }

    pub fn subtract(&self, delta: TimeDelta) -> Option<DateTime<Utc>> {
        self.value().and_then(|at| at.checked_sub_signed(delta))
    }
}
