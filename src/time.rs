use crate::buffer::ByteBuffer;
use serde::{Deserialize, Serialize};
use static_assertions::const_assert_eq;
use std::cell::Cell;
use std::time::Instant;

/// Ticks per second of the desktop clock (`CLOCKS_PER_SEC` on POSIX hosts).
pub const DEFAULT_TICK_FREQUENCY: u64 = 1_000_000;
/// Ticks per second of a millisecond counter (embedded hosts).
pub const MILLISECOND_TICK_FREQUENCY: u64 = 1_000;
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Encoded size of a [`TimeDatum`]: date, seconds of day, elapsed milliseconds.
pub const TIME_DATUM_SIZE: usize =
    core::mem::size_of::<u16>() + core::mem::size_of::<f64>() + core::mem::size_of::<u32>();
const_assert_eq!(TIME_DATUM_SIZE, 14);

const EPOCH_YEAR: i32 = 1970;
const DAYS_PER_YEAR_APPROX: u32 = 365;
const MONTH_LENGTHS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Source of monotonic ticks.
pub trait TickClock {
    fn ticks(&self) -> u64;

    fn frequency(&self) -> u64;

    /// Largest value the counter reaches before wrapping to zero.
    fn max_tick(&self) -> u64 {
        u64::from(u32::MAX)
    }
}

impl<T: TickClock + ?Sized> TickClock for &T {
    fn ticks(&self) -> u64 {
        (**self).ticks()
    }

    fn frequency(&self) -> u64 {
        (**self).frequency()
    }

    fn max_tick(&self) -> u64 {
        (**self).max_tick()
    }
}

/// Millisecond counter since construction, wrapping at `u32::MAX` like the
/// `millis()` counter of the logger hardware.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TickClock for MonotonicClock {
    fn ticks(&self) -> u64 {
        (self.start.elapsed().as_millis() as u64) & u64::from(u32::MAX)
    }

    fn frequency(&self) -> u64 {
        MILLISECOND_TICK_FREQUENCY
    }
}

/// Clock whose counter is set explicitly; used by simulations and tests.
#[derive(Debug, Clone)]
pub struct ManualClock {
    tick: Cell<u64>,
    frequency: u64,
    max_tick: u64,
}

impl ManualClock {
    pub fn new(frequency: u64) -> Self {
        Self::with_max_tick(frequency, u64::from(u32::MAX))
    }

    pub fn with_max_tick(frequency: u64, max_tick: u64) -> Self {
        Self {
            tick: Cell::new(0),
            frequency,
            max_tick,
        }
    }

    pub fn set(&self, tick: u64) {
        self.tick.set(tick);
    }

    /// Advance the counter, wrapping past `max_tick` as the hardware would.
    pub fn advance(&self, ticks: u64) {
        let span = self.max_tick as u128 + 1;
        let next = (self.tick.get() as u128 + ticks as u128) % span;
        self.tick.set(next as u64);
    }
}

impl TickClock for ManualClock {
    fn ticks(&self) -> u64 {
        self.tick.get()
    }

    fn frequency(&self) -> u64 {
        self.frequency
    }

    fn max_tick(&self) -> u64 {
        self.max_tick
    }
}

pub fn ticks_to_seconds(ticks: u64, frequency: u64) -> f64 {
    ticks as f64 / frequency as f64
}

pub fn ticks_to_milliseconds(ticks: u64, frequency: u64) -> f64 {
    ticks as f64 * (1000.0 / frequency as f64)
}

/// One point in time: real-time estimate plus the raw tick sample it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeDatum {
    /// Days since 1970-01-01.
    pub date: u16,
    /// Seconds since midnight; negative when no real time is known.
    pub seconds: f64,
    pub elapsed_ticks: u64,
    pub tick_frequency: u64,
}

impl TimeDatum {
    /// Datum with no real-time estimate, carrying only an elapsed-time stamp
    /// already expressed in milliseconds.
    pub fn invalid(elapsed_ms: u32) -> Self {
        Self {
            date: 0,
            seconds: -1.0,
            elapsed_ticks: u64::from(elapsed_ms),
            tick_frequency: MILLISECOND_TICK_FREQUENCY,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.seconds >= 0.0
    }

    pub fn elapsed_ms(&self) -> u32 {
        ticks_to_milliseconds(self.elapsed_ticks, self.tick_frequency) as u32
    }

    pub fn serialise(&self, target: &mut ByteBuffer) {
        target.push_u16(self.date);
        target.push_f64(self.seconds);
        target.push_u32(self.elapsed_ms());
    }

    pub fn printable(&self) -> String {
        format!("T: {} days, {} s", self.date, self.seconds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ReferencePoint {
    date: u16,
    seconds: f64,
    anchor: u64,
}

impl ReferencePoint {
    fn advanced_by(&self, offset: f64) -> (u16, f64) {
        let mut date = self.date;
        let mut seconds = self.seconds + offset;
        while seconds >= SECONDS_PER_DAY {
            date = date.wrapping_add(1);
            seconds -= SECONDS_PER_DAY;
        }
        while seconds < 0.0 {
            date = date.wrapping_sub(1);
            seconds += SECONDS_PER_DAY;
        }
        (date, seconds)
    }
}

/// Real-time reference anchored to a tick counter.
#[derive(Debug, Clone)]
pub struct TimeReference<C: TickClock> {
    clock: C,
    reference: Option<ReferencePoint>,
}

impl<C: TickClock> TimeReference<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, reference: None }
    }

    pub fn is_valid(&self) -> bool {
        self.reference.is_some()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Record a known date and time, anchored to the tick counter as read on
    /// entry.
    pub fn update(&mut self, date: u16, seconds: f64) {
        let anchor = self.clock.ticks();
        self.update_with_anchor(date, seconds, anchor);
    }

    /// Record a known date and time against a tick sample the caller took when
    /// the observation arrived.
    pub fn update_with_anchor(&mut self, date: u16, seconds: f64, anchor: u64) {
        self.reference = Some(ReferencePoint { date, seconds, anchor });
        tracing::debug!("Time reference updated: {}", self.printable());
    }

    /// Project the reference forward to the current tick.
    pub fn now(&self) -> TimeDatum {
        self.at(self.clock.ticks())
    }

    /// Project the reference forward to a tick sampled earlier, such as the
    /// arrival time of a bus message.
    pub fn at(&self, current: u64) -> TimeDatum {
        let frequency = self.clock.frequency();
        let Some(reference) = self.reference else {
            return TimeDatum {
                date: 0,
                seconds: -1.0,
                elapsed_ticks: current,
                tick_frequency: frequency,
            };
        };

        // A tick behind the anchor means the counter wrapped
        let span = u128::from(self.clock.max_tick()) + 1;
        let elapsed = (u128::from(current) + span - u128::from(reference.anchor) % span) % span;
        let (date, seconds) = reference.advanced_by(ticks_to_seconds(elapsed as u64, frequency));

        TimeDatum {
            date,
            seconds,
            elapsed_ticks: current,
            tick_frequency: frequency,
        }
    }

    /// Reference date and time moved by `offset` seconds, which may be
    /// negative. `None` until the first update.
    pub fn offset_by(&self, offset: f64) -> Option<(u16, f64)> {
        self.reference.map(|reference| reference.advanced_by(offset))
    }

    /// The reference observation itself.
    pub fn datum(&self) -> TimeDatum {
        let frequency = self.clock.frequency();
        match self.reference {
            Some(reference) => TimeDatum {
                date: reference.date,
                seconds: reference.seconds,
                elapsed_ticks: reference.anchor,
                tick_frequency: frequency,
            },
            None => TimeDatum {
                date: 0,
                seconds: -1.0,
                elapsed_ticks: 0,
                tick_frequency: frequency,
            },
        }
    }

    pub fn printable(&self) -> String {
        match self.reference {
            Some(reference) => format!(
                "R: {} days, {}s, at counter {} ticks since boot",
                reference.date, reference.seconds, reference.anchor
            ),
            None => "R: no reference".to_string(),
        }
    }
}

/// Broken-out calendar time driven by a tick count.
///
/// Years are 365 days long; leap days are not modelled. This is good enough to
/// produce plausible simulated timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComponentDateTime {
    pub tick_count: u64,
    pub year: i32,
    /// Zero-based day within the year.
    pub day_of_year: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: f64,
    tick_frequency: u64,
}

impl ComponentDateTime {
    pub fn new(year: i32, tick_frequency: u64) -> Self {
        Self {
            tick_count: 0,
            year,
            day_of_year: 0,
            hour: 0,
            minute: 0,
            second: 0.0,
            tick_frequency,
        }
    }

    pub fn tick_frequency(&self) -> u64 {
        self.tick_frequency
    }

    /// Move the calendar forward to `new_tick`. The calendar never runs
    /// backwards: a tick earlier than the last one only re-bases the count.
    pub fn update(&mut self, new_tick: u64) {
        let delta = new_tick.saturating_sub(self.tick_count);
        self.second += ticks_to_seconds(delta, self.tick_frequency);

        while self.second >= 60.0 {
            self.second -= 60.0;
            self.minute += 1;
            if self.minute >= 60 {
                self.minute = 0;
                self.hour += 1;
                if self.hour >= 24 {
                    self.hour = 0;
                    self.day_of_year += 1;
                    if self.day_of_year >= DAYS_PER_YEAR_APPROX {
                        self.day_of_year = 0;
                        self.year += 1;
                    }
                }
            }
        }
        self.tick_count = new_tick;
    }

    pub fn days_since_epoch(&self) -> u16 {
        let year_days = (f64::from(self.year - EPOCH_YEAR) * 365.25).floor() as u32;
        (self.day_of_year + year_days) as u16
    }

    pub fn seconds_in_day(&self) -> f64 {
        self.second + f64::from(self.minute) * 60.0 + f64::from(self.hour) * 3600.0
    }

    pub fn time_datum(&self) -> TimeDatum {
        TimeDatum {
            date: self.days_since_epoch(),
            seconds: self.seconds_in_day(),
            elapsed_ticks: self.tick_count,
            tick_frequency: self.tick_frequency,
        }
    }

    /// Calendar month (1-12) and day of month (1-31) for the current day of year,
    /// using the Gregorian leap-year rule.
    pub fn month_day(&self) -> (u32, u32) {
        month_day(self.year, self.day_of_year)
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Convert a zero-based day of year into (month, day), both one-based.
pub fn month_day(year: i32, day_of_year: u32) -> (u32, u32) {
    let mut day = day_of_year + 1;
    for (index, &length) in MONTH_LENGTHS.iter().enumerate() {
        let length = if index == 1 && is_leap_year(year) { length + 1 } else { length };
        if day <= length {
            return (index as u32 + 1, day);
        }
        day -= length;
    }
    (12, 31)
}
