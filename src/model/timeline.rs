use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};

use super::filter::TickUnit;

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Upper bound on generated ticks; denser requests are thinned out.
pub const MAX_TICKS: usize = 400;
/// Ranges needing more unit steps than this fall back to a coarser unit.
const MAX_STEPS: i64 = 20_000;

/// Manages the visible viewport of the timeline.
#[derive(Debug, Clone)]
pub struct TimelineViewport {
    /// Leftmost time in milliseconds.
    pub start: i64,
    /// Rightmost time in milliseconds.
    pub end: i64,
    /// Pixels per hour (controls zoom level).
    pub pixels_per_hour: f32,
}

impl Default for TimelineViewport {
    fn default() -> Self {
        Self {
            start: 0,
            end: 24 * MS_PER_HOUR as i64,
            pixels_per_hour: 40.0,
        }
    }
}

impl TimelineViewport {
    pub const MIN_PIXELS_PER_HOUR: f32 = 0.01;
    pub const MAX_PIXELS_PER_HOUR: f32 = 6000.0;

    /// Frame `[start, end]` so it spans `width` pixels.
    pub fn fit(&mut self, start: i64, end: i64, width: f32) {
        let span = (end - start).max(60_000);
        let pad = span / 50;
        self.start = start - pad;
        self.end = end + pad;
        let hours = (self.end - self.start) as f64 / MS_PER_HOUR;
        self.pixels_per_hour = ((width.max(1.0) as f64 / hours) as f32)
            .clamp(Self::MIN_PIXELS_PER_HOUR, Self::MAX_PIXELS_PER_HOUR);
    }

    /// Convert a time to an x-pixel offset from the viewport start.
    pub fn time_to_x(&self, ms: i64) -> f32 {
        ((ms - self.start) as f64 / MS_PER_HOUR) as f32 * self.pixels_per_hour
    }

    /// Convert an x-pixel offset back to a time.
    pub fn x_to_time(&self, x: f32) -> i64 {
        self.start + ((x / self.pixels_per_hour) as f64 * MS_PER_HOUR).round() as i64
    }

    pub fn zoom_in(&mut self) {
        self.pixels_per_hour = (self.pixels_per_hour * 1.2).min(Self::MAX_PIXELS_PER_HOUR);
    }

    pub fn zoom_out(&mut self) {
        self.pixels_per_hour = (self.pixels_per_hour / 1.2).max(Self::MIN_PIXELS_PER_HOUR);
    }

    /// Zoom while keeping the time under pixel offset `x` in place.
    pub fn zoom_at(&mut self, x: f32, zoom_in: bool) {
        let anchor = self.x_to_time(x);
        if zoom_in {
            self.zoom_in();
        } else {
            self.zoom_out();
        }
        self.start = anchor - ((x / self.pixels_per_hour) as f64 * MS_PER_HOUR).round() as i64;
    }

    /// Shift the view by a pixel delta; positive moves towards earlier times.
    pub fn pan(&mut self, dx: f32) {
        let delta = ((dx / self.pixels_per_hour) as f64 * MS_PER_HOUR).round() as i64;
        self.start -= delta;
        self.end -= delta;
    }
}

/// Tick positions (ms) inside `[start, end]`, aligned to `unit` boundaries and
/// keeping every `every`-th one counted from the start of the enclosing
/// period (hour of day, day of month, month of year, ...).
pub fn tick_times(start: i64, end: i64, unit: TickUnit, every: u32) -> Vec<i64> {
    let (Some(first), Some(last)) = (to_datetime(start), to_datetime(end)) else {
        return Vec::new();
    };

    let mut unit = unit;
    let mut every = every.max(1);
    while (end - start) / approx_unit_ms(unit) > MAX_STEPS && unit != TickUnit::Years {
        unit = coarser(unit);
        every = 1;
    }

    let mut ticks = Vec::new();
    let mut cursor = floor_to_unit(first, unit);
    while cursor <= last {
        if cursor >= first && unit_number(cursor, unit) % every == 0 {
            ticks.push(cursor.and_utc().timestamp_millis());
        }
        cursor = match step(cursor, unit) {
            Some(next) => next,
            None => break,
        };
    }

    if ticks.len() > MAX_TICKS {
        let stride = ticks.len().div_ceil(MAX_TICKS);
        ticks = ticks.into_iter().step_by(stride).collect();
    }
    ticks
}

/// Render a tick label. An empty format yields an empty label.
pub fn format_tick(ms: i64, format: &str) -> String {
    if format.is_empty() {
        return String::new();
    }
    to_datetime(ms)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_default()
}

/// `YYYY-MM-DD HH:MM:SS` rendering used by tooltips and exports.
pub fn format_timestamp(ms: i64) -> String {
    to_datetime(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn to_datetime(ms: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc())
}

fn approx_unit_ms(unit: TickUnit) -> i64 {
    match unit {
        TickUnit::Minutes => 60_000,
        TickUnit::Hours => 3_600_000,
        TickUnit::Days => 86_400_000,
        TickUnit::Months => 30 * 86_400_000,
        TickUnit::Years => 365 * 86_400_000,
    }
}

fn coarser(unit: TickUnit) -> TickUnit {
    match unit {
        TickUnit::Minutes => TickUnit::Hours,
        TickUnit::Hours => TickUnit::Days,
        TickUnit::Days => TickUnit::Months,
        TickUnit::Months | TickUnit::Years => TickUnit::Years,
    }
}

fn floor_to_unit(dt: NaiveDateTime, unit: TickUnit) -> NaiveDateTime {
    let date = dt.date();
    let floored = match unit {
        TickUnit::Minutes => date.and_hms_opt(dt.hour(), dt.minute(), 0),
        TickUnit::Hours => date.and_hms_opt(dt.hour(), 0, 0),
        TickUnit::Days => date.and_hms_opt(0, 0, 0),
        TickUnit::Months => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0)),
        TickUnit::Years => {
            NaiveDate::from_ymd_opt(date.year(), 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    };
    floored.unwrap_or(dt)
}

fn step(dt: NaiveDateTime, unit: TickUnit) -> Option<NaiveDateTime> {
    match unit {
        TickUnit::Minutes => dt.checked_add_signed(Duration::minutes(1)),
        TickUnit::Hours => dt.checked_add_signed(Duration::hours(1)),
        TickUnit::Days => dt.checked_add_signed(Duration::days(1)),
        TickUnit::Months => {
            let (y, m) = if dt.month() == 12 {
                (dt.year() + 1, 1)
            } else {
                (dt.year(), dt.month() + 1)
            };
            NaiveDate::from_ymd_opt(y, m, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        TickUnit::Years => {
            NaiveDate::from_ymd_opt(dt.year() + 1, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    }
}

fn unit_number(dt: NaiveDateTime, unit: TickUnit) -> u32 {
    match unit {
        TickUnit::Minutes => dt.minute(),
        TickUnit::Hours => dt.hour(),
        TickUnit::Days => dt.day() - 1,
        TickUnit::Months => dt.month0(),
        TickUnit::Years => dt.year().unsigned_abs(),
    }
}
