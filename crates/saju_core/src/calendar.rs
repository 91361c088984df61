//! crates/saju_core/src/calendar.rs
//!
//! Solar/lunar calendar conversion and sexagenary year labels.
//!
//! Conversion walks a pre-validated month-length table covering the lunar
//! years 1900–2099 (the same data the packaged calendar libraries embed).
//! Leap months are read from the table, never derived astronomically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{BRANCHES, STEMS, ZODIAC_ANIMALS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The date falls outside the supported 1900–2099 lunar range. Callers
    /// surface this as a validation error and never retry.
    #[error("달력 지원 범위(1900~2099)를 벗어났습니다: {0}")]
    OutOfRange(String),
    #[error("유효하지 않은 음력 날짜입니다: {0}")]
    InvalidLunarDate(String),
}

/// A lunar calendar date. `is_leap_month` marks dates inside an intercalary
/// (윤달) month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub is_leap_month: bool,
}

const FIRST_LUNAR_YEAR: i32 = 1900;
const LAST_LUNAR_YEAR: i32 = 2099;

/// Bit-packed month lengths per lunar year. Low nibble is the leap month
/// number (0 = none); bit `0x10000 >> m` is set when month `m` has 30 days;
/// bit 0x10000 is set when the leap month has 30 days.
#[rustfmt::skip]
static LUNAR_TABLE: [u32; 200] = [
    // 1900-1909
    0x04bd8, 0x04ae0, 0x0a570, 0x054d5, 0x0d260, 0x0d950, 0x16554, 0x056a0, 0x09ad0, 0x055d2,
    // 1910-1919
    0x04ae0, 0x0a5b6, 0x0a4d0, 0x0d250, 0x1d255, 0x0b540, 0x0d6a0, 0x0ada2, 0x095b0, 0x14977,
    // 1920-1929
    0x04970, 0x0a4b0, 0x0b4b5, 0x06a50, 0x06d40, 0x1ab54, 0x02b60, 0x09570, 0x052f2, 0x04970,
    // 1930-1939
    0x06566, 0x0d4a0, 0x0ea50, 0x06e95, 0x05ad0, 0x02b60, 0x186e3, 0x092e0, 0x1c8d7, 0x0c950,
    // 1940-1949
    0x0d4a0, 0x1d8a6, 0x0b550, 0x056a0, 0x1a5b4, 0x025d0, 0x092d0, 0x0d2b2, 0x0a950, 0x0b557,
    // 1950-1959
    0x06ca0, 0x0b550, 0x15355, 0x04da0, 0x0a5b0, 0x14573, 0x052b0, 0x0a9a8, 0x0e950, 0x06aa0,
    // 1960-1969
    0x0aea6, 0x0ab50, 0x04b60, 0x0aae4, 0x0a570, 0x05260, 0x0f263, 0x0d950, 0x05b57, 0x056a0,
    // 1970-1979
    0x096d0, 0x04dd5, 0x04ad0, 0x0a4d0, 0x0d4d4, 0x0d250, 0x0d558, 0x0b540, 0x0b6a0, 0x195a6,
    // 1980-1989
    0x095b0, 0x049b0, 0x0a974, 0x0a4b0, 0x0b27a, 0x06a50, 0x06d40, 0x0af46, 0x0ab60, 0x09570,
    // 1990-1999
    0x04af5, 0x04970, 0x064b0, 0x074a3, 0x0ea50, 0x06b58, 0x055c0, 0x0ab60, 0x096d5, 0x092e0,
    // 2000-2009
    0x0c960, 0x0d954, 0x0d4a0, 0x0da50, 0x07552, 0x056a0, 0x0abb7, 0x025d0, 0x092d0, 0x0cab5,
    // 2010-2019
    0x0a950, 0x0b4a0, 0x0baa4, 0x0ad50, 0x055d9, 0x04ba0, 0x0a5b0, 0x15176, 0x052b0, 0x0a930,
    // 2020-2029
    0x07954, 0x06aa0, 0x0ad50, 0x05b52, 0x04b60, 0x0a6e6, 0x0a4e0, 0x0d260, 0x0ea65, 0x0d530,
    // 2030-2039
    0x05aa0, 0x076a3, 0x096d0, 0x04afb, 0x04ad0, 0x0a4d0, 0x1d0b6, 0x0d250, 0x0d520, 0x0dd45,
    // 2040-2049
    0x0b5a0, 0x056d0, 0x055b2, 0x049b0, 0x0a577, 0x0a4b0, 0x0aa50, 0x1b255, 0x06d20, 0x0ada0,
    // 2050-2059
    0x14b63, 0x09370, 0x049f8, 0x04970, 0x064b0, 0x168a6, 0x0ea50, 0x06b20, 0x1a6c4, 0x0aae0,
    // 2060-2069
    0x092e0, 0x0d2e3, 0x0c960, 0x0d557, 0x0d4a0, 0x0da50, 0x05d55, 0x056a0, 0x0a6d0, 0x055d4,
    // 2070-2079
    0x052d0, 0x0a9b8, 0x0a950, 0x0b4a0, 0x0b6a6, 0x0ad50, 0x055a0, 0x0aba4, 0x0a5b0, 0x052b0,
    // 2080-2089
    0x0b273, 0x06930, 0x07337, 0x06aa0, 0x0ad50, 0x14b55, 0x04b60, 0x0a570, 0x054e4, 0x0d160,
    // 2090-2099
    0x0e968, 0x0d520, 0x0daa0, 0x16aa6, 0x056d0, 0x04ae0, 0x0a9d4, 0x0a2d0, 0x0d150, 0x0f252,
];

/// Solar date of lunar 1900-01-01, the table origin.
fn lunar_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 31).expect("static epoch date")
}

fn table_entry(year: i32) -> u32 {
    LUNAR_TABLE[(year - FIRST_LUNAR_YEAR) as usize]
}

/// The leap month number of a lunar year, 0 when the year has none.
fn leap_month(year: i32) -> u32 {
    table_entry(year) & 0xf
}

fn leap_month_days(year: i32) -> i64 {
    if leap_month(year) == 0 {
        0
    } else if table_entry(year) & 0x10000 != 0 {
        30
    } else {
        29
    }
}

/// Length of regular lunar month `month` (1..=12) in `year`.
fn month_days(year: i32, month: u32) -> i64 {
    if table_entry(year) & (0x10000 >> month) != 0 {
        30
    } else {
        29
    }
}

/// Total days in a lunar year, leap month included.
fn lunar_year_days(year: i32) -> i64 {
    let mut days = 0;
    for month in 1..=12 {
        days += month_days(year, month);
    }
    days + leap_month_days(year)
}

/// Converts a solar (Gregorian) date to its lunar equivalent.
pub fn solar_to_lunar(date: NaiveDate) -> Result<LunarDate, CalendarError> {
    let mut offset = date.signed_duration_since(lunar_epoch()).num_days();
    if offset < 0 {
        return Err(CalendarError::OutOfRange(date.to_string()));
    }

    let mut year = FIRST_LUNAR_YEAR;
    loop {
        if year > LAST_LUNAR_YEAR {
            return Err(CalendarError::OutOfRange(date.to_string()));
        }
        let days = lunar_year_days(year);
        if offset < days {
            break;
        }
        offset -= days;
        year += 1;
    }

    // Month order within a year: 1..L, leap L, L+1..12.
    let leap = leap_month(year);
    let mut month = 1u32;
    let mut in_leap = false;
    loop {
        let len = if in_leap {
            leap_month_days(year)
        } else {
            month_days(year, month)
        };
        if offset < len {
            break;
        }
        offset -= len;
        if !in_leap && month == leap {
            in_leap = true;
        } else {
            in_leap = false;
            month += 1;
        }
    }

    Ok(LunarDate {
        year,
        month,
        day: offset as u32 + 1,
        is_leap_month: in_leap,
    })
}

/// Converts a lunar date back to the solar (Gregorian) calendar.
pub fn lunar_to_solar(lunar: &LunarDate) -> Result<NaiveDate, CalendarError> {
    if lunar.year < FIRST_LUNAR_YEAR || lunar.year > LAST_LUNAR_YEAR {
        return Err(CalendarError::OutOfRange(format!("{}년", lunar.year)));
    }
    if lunar.month < 1 || lunar.month > 12 {
        return Err(CalendarError::InvalidLunarDate(format!(
            "{}월",
            lunar.month
        )));
    }

    let leap = leap_month(lunar.year);
    if lunar.is_leap_month && leap != lunar.month {
        return Err(CalendarError::InvalidLunarDate(format!(
            "{}년에는 윤{}월이 없습니다",
            lunar.year, lunar.month
        )));
    }

    let len = if lunar.is_leap_month {
        leap_month_days(lunar.year)
    } else {
        month_days(lunar.year, lunar.month)
    };
    if lunar.day < 1 || i64::from(lunar.day) > len {
        return Err(CalendarError::InvalidLunarDate(format!(
            "{}월 {}일",
            lunar.month, lunar.day
        )));
    }

    let mut offset: i64 = 0;
    for year in FIRST_LUNAR_YEAR..lunar.year {
        offset += lunar_year_days(year);
    }
    for month in 1..lunar.month {
        offset += month_days(lunar.year, month);
    }
    // The leap month sits after its regular month.
    if leap != 0 && (leap < lunar.month || lunar.is_leap_month) {
        if lunar.is_leap_month {
            offset += month_days(lunar.year, lunar.month);
        } else {
            offset += leap_month_days(lunar.year);
        }
    }
    offset += i64::from(lunar.day) - 1;

    Ok(lunar_epoch() + chrono::Duration::days(offset))
}

/// The sexagenary label of a calendar year, e.g. 1984 = 갑자년 (쥐).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SexagenaryYear {
    pub stem: u8,
    pub branch: u8,
    pub animal: &'static str,
}

impl SexagenaryYear {
    pub fn label(&self) -> String {
        format!(
            "{}{}",
            STEMS[self.stem as usize], BRANCHES[self.branch as usize]
        )
    }
}

/// Derives the stem/branch/zodiac label of a year. The cycle is anchored so
/// that 1984 is 갑자 (stem 0, branch 0).
pub fn sexagenary_year(year: i32) -> SexagenaryYear {
    let stem = (year - 4).rem_euclid(10) as u8;
    let branch = (year - 4).rem_euclid(12) as u8;
    SexagenaryYear {
        stem,
        branch,
        animal: ZODIAC_ANIMALS[branch as usize],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn epoch_maps_to_lunar_new_year_1900() {
        let lunar = solar_to_lunar(d(1900, 1, 31)).unwrap();
        assert_eq!(
            lunar,
            LunarDate {
                year: 1900,
                month: 1,
                day: 1,
                is_leap_month: false
            }
        );
    }

    #[test]
    fn round_trip_is_identity_across_supported_range() {
        // Sample with a stride that is coprime with month lengths.
        let mut date = d(1900, 2, 14);
        let end = d(2099, 1, 1);
        while date < end {
            let lunar = solar_to_lunar(date).unwrap();
            assert_eq!(lunar_to_solar(&lunar).unwrap(), date, "at {date}");
            date = date + chrono::Duration::days(97);
        }
    }

    #[test]
    fn round_trip_covers_leap_months() {
        // 2023 has a leap 2nd month; sweep the whole lunar year day by day.
        assert_eq!(leap_month(2023), 2);
        let start = lunar_to_solar(&LunarDate {
            year: 2023,
            month: 1,
            day: 1,
            is_leap_month: false,
        })
        .unwrap();
        for i in 0..lunar_year_days(2023) {
            let date = start + chrono::Duration::days(i);
            let lunar = solar_to_lunar(date).unwrap();
            assert_eq!(lunar.year, 2023);
            assert_eq!(lunar_to_solar(&lunar).unwrap(), date);
        }
    }

    #[test]
    fn dates_before_epoch_are_out_of_range() {
        assert!(matches!(
            solar_to_lunar(d(1900, 1, 30)),
            Err(CalendarError::OutOfRange(_))
        ));
        assert!(matches!(
            solar_to_lunar(d(1899, 12, 31)),
            Err(CalendarError::OutOfRange(_))
        ));
    }

    #[test]
    fn dates_past_the_table_are_out_of_range() {
        assert!(matches!(
            solar_to_lunar(d(2101, 6, 1)),
            Err(CalendarError::OutOfRange(_))
        ));
    }

    #[test]
    fn rejects_leap_month_in_year_without_one() {
        // 2022 has no leap month.
        assert_eq!(leap_month(2022), 0);
        let result = lunar_to_solar(&LunarDate {
            year: 2022,
            month: 5,
            day: 1,
            is_leap_month: true,
        });
        assert!(matches!(result, Err(CalendarError::InvalidLunarDate(_))));
    }

    #[test]
    fn rejects_day_past_month_length() {
        let lunar = solar_to_lunar(d(1990, 5, 15)).unwrap();
        let bad = LunarDate {
            day: 31,
            ..lunar
        };
        assert!(matches!(
            lunar_to_solar(&bad),
            Err(CalendarError::InvalidLunarDate(_))
        ));
    }

    #[test]
    fn month_lengths_are_29_or_30() {
        for year in FIRST_LUNAR_YEAR..=LAST_LUNAR_YEAR {
            for month in 1..=12 {
                let len = month_days(year, month);
                assert!(len == 29 || len == 30);
            }
            let leap_len = leap_month_days(year);
            assert!(leap_len == 0 || leap_len == 29 || leap_len == 30);
        }
    }

    #[test]
    fn known_leap_months() {
        assert_eq!(leap_month(1984), 10);
        assert_eq!(leap_month(2017), 6);
        assert_eq!(leap_month(2020), 4);
        assert_eq!(leap_month(2025), 6);
    }

    #[test]
    fn sexagenary_year_labels() {
        let y1984 = sexagenary_year(1984);
        assert_eq!((y1984.stem, y1984.branch), (0, 0));
        assert_eq!(y1984.label(), "갑자");
        assert_eq!(y1984.animal, "쥐");

        let y2024 = sexagenary_year(2024);
        assert_eq!(y2024.label(), "갑진");
        assert_eq!(y2024.animal, "용");
    }
}
