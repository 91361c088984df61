//! crates/saju_core/src/pillars.rs
//!
//! Four-pillar (사주) derivation from a birth input. Pure functions of their
//! input; no side effects.
//!
//! Uses the standard sexagenary cycle rules rather than calendar-number
//! modulo arithmetic: the year pillar changes at 입춘, month pillars follow
//! the twelve solar-term (절기) boundaries, the day pillar is indexed off the
//! Julian day number, and the hour pillar maps the twelve double-hours.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike};

use crate::calendar::{lunar_to_solar, CalendarError, LunarDate};
use crate::domain::{BirthInput, FourPillars, Pillar};

/// Day of month on which each solar month's 절기 falls, January first
/// (소한 Jan 6, 입춘 Feb 4, ... 대설 Dec 7). Mean dates; true boundaries can
/// shift by one day.
const JIE_DAYS: [u32; 12] = [6, 4, 6, 5, 6, 6, 7, 8, 8, 8, 7, 7];

/// JDN of 1970-01-01 minus its sexagenary day index (1970-01-01 is 신사,
/// index 17 with 0 = 갑자).
const DAY_CYCLE_OFFSET: i64 = 11;

fn julian_day_number(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) + 1_721_425
}

/// Sexagenary index (0 = 갑자) of a calendar day.
fn day_cycle_index(date: NaiveDate) -> u8 {
    ((julian_day_number(date) - DAY_CYCLE_OFFSET).rem_euclid(60)) as u8
}

/// The saju year: solar years roll over at 입춘, not January 1st.
fn saju_year(date: NaiveDate) -> i32 {
    if date.month() < 2 || (date.month() == 2 && date.day() < JIE_DAYS[1]) {
        date.year() - 1
    } else {
        date.year()
    }
}

fn year_pillar(date: NaiveDate) -> Pillar {
    let year = saju_year(date);
    Pillar::new(
        (year - 4).rem_euclid(10) as u8,
        (year - 4).rem_euclid(12) as u8,
    )
}

/// The saju month number, 1 = 인월 (starts at 입춘) through 12 = 축월.
fn saju_month(date: NaiveDate) -> u32 {
    let month = date.month();
    let anchor = if date.day() >= JIE_DAYS[(month - 1) as usize] {
        month
    } else if month == 1 {
        12
    } else {
        month - 1
    };
    (anchor + 10) % 12 + 1
}

/// Month stems follow the five-tigers rule: the 인월 stem is fixed by the
/// year stem (갑/기 -> 병인, 을/경 -> 무인, ...).
fn month_pillar(date: NaiveDate) -> Pillar {
    let n = saju_month(date);
    let year_stem = year_pillar(date).stem as u32;
    let stem = ((year_stem % 5) * 2 + n + 1) % 10;
    let branch = (n + 1) % 12;
    Pillar::new(stem as u8, branch as u8)
}

fn day_pillar(date: NaiveDate) -> Pillar {
    let index = day_cycle_index(date);
    Pillar::new(index % 10, index % 12)
}

/// Double-hour slot, 0 = 자시 (23:00–01:00, wraps midnight).
fn hour_slot(time: NaiveTime) -> u32 {
    (time.hour() + 1) / 2 % 12
}

/// Hour stems follow the five-rats rule keyed off the day stem.
fn hour_pillar(day_stem: u8, time: NaiveTime) -> Pillar {
    let slot = hour_slot(time);
    let stem = ((u32::from(day_stem) % 5) * 2 + slot) % 10;
    Pillar::new(stem as u8, slot as u8)
}

/// Derives the four pillars for a birth input.
///
/// Lunar birth dates are normalized to solar first, which fails with
/// `CalendarError` outside the supported range. An unknown birth time is
/// substituted with noon and flagged via `hour_assumed`.
pub fn four_pillars(input: &BirthInput) -> Result<FourPillars, CalendarError> {
    let solar_date = if input.is_lunar {
        lunar_to_solar(&LunarDate {
            year: input.birth_date.year(),
            month: input.birth_date.month(),
            day: input.birth_date.day(),
            is_leap_month: false,
        })?
    } else {
        input.birth_date
    };

    let (time, hour_assumed) = match input.birth_time {
        Some(t) => (t, false),
        None => (
            NaiveTime::from_hms_opt(12, 0, 0).expect("static noon time"),
            true,
        ),
    };

    // 자시 starts at 23:00, so the last hour of the calendar day already
    // belongs to the next sexagenary day.
    let day_date = if time.hour() >= 23 {
        solar_date + Duration::days(1)
    } else {
        solar_date
    };

    let day = day_pillar(day_date);

    Ok(FourPillars {
        year: year_pillar(solar_date),
        month: month_pillar(solar_date),
        day,
        hour: hour_pillar(day.stem, time),
        hour_assumed,
    })
}
