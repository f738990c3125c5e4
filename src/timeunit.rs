//! Time units: containment, date conversion and expression generation.
//!
//! A time unit is either a single part (`month`, `utchours`, ...) or a
//! composite formed by concatenating parts in canonical order
//! (`yearmonthdate`, `utchoursminutes`, ...). All containment checks go
//! through [`contains_time_unit`], which never mistakes the tail of
//! `milliseconds` for `seconds`.

use crate::error::TimeUnitError;
use crate::util::datum_ref;
use ahash::AHashMap;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Single time unit parts, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeUnitPart {
    Year,
    Quarter,
    Month,
    Day,
    Date,
    Hours,
    Minutes,
    Seconds,
    Milliseconds,
}

impl TimeUnitPart {
    pub const ALL: [TimeUnitPart; 9] = [
        TimeUnitPart::Year,
        TimeUnitPart::Quarter,
        TimeUnitPart::Month,
        TimeUnitPart::Day,
        TimeUnitPart::Date,
        TimeUnitPart::Hours,
        TimeUnitPart::Minutes,
        TimeUnitPart::Seconds,
        TimeUnitPart::Milliseconds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeUnitPart::Year => "year",
            TimeUnitPart::Quarter => "quarter",
            TimeUnitPart::Month => "month",
            TimeUnitPart::Day => "day",
            TimeUnitPart::Date => "date",
            TimeUnitPart::Hours => "hours",
            TimeUnitPart::Minutes => "minutes",
            TimeUnitPart::Seconds => "seconds",
            TimeUnitPart::Milliseconds => "milliseconds",
        }
    }
}

const LOCAL_SINGLE: [&str; 9] = [
    "year",
    "quarter",
    "month",
    "day",
    "date",
    "hours",
    "minutes",
    "seconds",
    "milliseconds",
];

const LOCAL_MULTI: [&str; 13] = [
    "yearquarter",
    "yearquartermonth",
    "yearmonth",
    "yearmonthdate",
    "yearmonthdatehours",
    "yearmonthdatehoursminutes",
    "yearmonthdatehoursminutesseconds",
    "quartermonth",
    "monthdate",
    "hoursminutes",
    "hoursminutesseconds",
    "minutesseconds",
    "secondsmilliseconds",
];

fn is_known_unit(unit: &str) -> bool {
    let local = unit.strip_prefix("utc").unwrap_or(unit);
    LOCAL_SINGLE.contains(&local) || LOCAL_MULTI.contains(&local)
}

/// Returns true if `full_time_unit` contains `time_unit`.
///
/// `seconds` only matches as its own token, never as the suffix of
/// `milliseconds`.
pub fn contains_time_unit(full_time_unit: &str, time_unit: &str) -> bool {
    match full_time_unit.find(time_unit) {
        None => false,
        Some(index) => {
            time_unit != TimeUnitPart::Seconds.as_str()
                || index == 0
                || full_time_unit.as_bytes()[index - 1] != b'i'
        }
    }
}

/// Rewrites composite units that contain the weekday part to use the
/// day-of-month part instead.
pub fn normalize(time_unit: &str) -> String {
    if time_unit != "day" && time_unit != "utcday" && time_unit.contains("day") {
        let replaced = time_unit.replacen("day", "date", 1);
        warn!(
            "Time unit \"{}\" is not supported. We are replacing it with {}.",
            time_unit, replaced
        );
        replaced
    } else {
        time_unit.to_string()
    }
}

/// A validated, normalized time unit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeUnit(String);

impl TryFrom<String> for TimeUnit {
    type Error = TimeUnitError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let normalized = normalize(&value);
        if is_known_unit(&normalized) {
            Ok(TimeUnit(normalized))
        } else {
            Err(TimeUnitError::Unknown(value))
        }
    }
}

impl FromStr for TimeUnit {
    type Err = TimeUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeUnit::try_from(s.to_string())
    }
}

impl From<TimeUnit> for String {
    fn from(value: TimeUnit) -> Self {
        value.0
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TimeUnit {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_utc(&self) -> bool {
        self.0.starts_with("utc")
    }

    pub fn contains(&self, part: TimeUnitPart) -> bool {
        contains_time_unit(&self.0, part.as_str())
    }

    /// Contained parts, in canonical order regardless of how the unit is spelled.
    pub fn parts(&self) -> impl Iterator<Item = TimeUnitPart> + '_ {
        TimeUnitPart::ALL.into_iter().filter(|p| self.contains(*p))
    }

    /// Keeps only the components of `date` relevant to this unit, e.g.
    /// `yearmonth` of `2000-12-04 07:58:14` is `2000-12-01 00:00:00`.
    /// Components not covered by the unit come from 1900-01-01 00:00:00.
    pub fn convert(&self, date: &NaiveDateTime) -> Result<NaiveDateTime, TimeUnitError> {
        let (mut year, mut month0, mut day_of_month) = (1900, 0, 1);
        let (mut hours, mut minutes, mut seconds, mut millis) = (0, 0, 0, 0);

        for part in self.parts() {
            match part {
                TimeUnitPart::Day => return Err(TimeUnitError::ContainsDay(self.0.clone())),
                // First month of the quarter, e.g. may (4) -> april (3)
                TimeUnitPart::Quarter => month0 = (date.month0() / 3) * 3,
                TimeUnitPart::Year => year = date.year(),
                TimeUnitPart::Month => month0 = date.month0(),
                TimeUnitPart::Date => day_of_month = date.day(),
                TimeUnitPart::Hours => hours = date.hour(),
                TimeUnitPart::Minutes => minutes = date.minute(),
                TimeUnitPart::Seconds => seconds = date.second(),
                TimeUnitPart::Milliseconds => millis = (date.nanosecond() / 1_000_000).min(999),
            }
        }

        // Day-of-month is added onto the first of the month so an overflowing
        // date rolls into the next month.
        NaiveDate::from_ymd_opt(year, month0 + 1, 1)
            .and_then(|d| d.checked_add_days(Days::new(u64::from(day_of_month - 1))))
            .and_then(|d| d.and_hms_milli_opt(hours, minutes, seconds, millis))
            .ok_or_else(|| TimeUnitError::OutOfRange(date.to_string()))
    }

    /// Date construction expression that truncates `datum[field]` to this unit.
    pub fn field_expr(&self, field: &str) -> String {
        let field_ref = datum_ref(field);
        let utc = if self.is_utc() { "utc" } else { "" };

        let parts: AHashMap<TimeUnitPart, String> = self
            .parts()
            .map(|part| {
                let expr = match part {
                    // Quarters start at zero (0, 3, 6, 9)
                    TimeUnitPart::Quarter => format!("({}quarter({})-1)", utc, field_ref),
                    other => format!("{}{}({})", utc, other.as_str(), field_ref),
                };
                (part, expr)
            })
            .collect();
        date_time_expr(&parts)
    }
}

fn date_time_expr(parts: &AHashMap<TimeUnitPart, String>) -> String {
    let get = |part| parts.get(&part).cloned();
    let mut units = Vec::with_capacity(7);

    // 2006-01-01 is a Sunday, so a weekday offset lands on the right day.
    units.push(get(TimeUnitPart::Year).unwrap_or_else(|| {
        if parts.contains_key(&TimeUnitPart::Day) {
            "2006".to_string()
        } else {
            "0".to_string()
        }
    }));
    units.push(match (get(TimeUnitPart::Month), get(TimeUnitPart::Quarter)) {
        (Some(month), _) => month,
        (None, Some(quarter)) => format!("{}*3", quarter),
        (None, None) => "0".to_string(),
    });
    units.push(match (get(TimeUnitPart::Date), get(TimeUnitPart::Day)) {
        (Some(date), _) => date,
        (None, Some(day)) => format!("{}+1", day),
        (None, None) => "1".to_string(),
    });
    for part in [
        TimeUnitPart::Hours,
        TimeUnitPart::Minutes,
        TimeUnitPart::Seconds,
        TimeUnitPart::Milliseconds,
    ] {
        units.push(get(part).unwrap_or_else(|| "0".to_string()));
    }

    format!("datetime({})", units.join(", "))
}

/// Label expression for a time unit applied to an already-truncated field
/// expression. Returns `None` when there is no unit or nothing to format.
///
/// `short_time_labels` picks abbreviated month, weekday and year tokens
/// (months are short unless it is explicitly `false`). `utcFormat` is only
/// used for UTC scales, since UTC units are already shifted by the time unit
/// transform.
pub fn format_expression(
    time_unit: Option<&TimeUnit>,
    field: &str,
    short_time_labels: Option<bool>,
    is_utc_scale: bool,
) -> Option<String> {
    let unit = time_unit?;
    let short = short_time_labels.unwrap_or(false);
    let has_year = unit.contains(TimeUnitPart::Year);

    let mut expression = String::new();
    if unit.contains(TimeUnitPart::Quarter) {
        expression = format!("'Q' + quarter({})", field);
    }

    let mut date_components = Vec::new();
    if unit.contains(TimeUnitPart::Month) {
        date_components.push(if short_time_labels != Some(false) {
            "%b".to_string()
        } else {
            "%B".to_string()
        });
    }
    if unit.contains(TimeUnitPart::Day) {
        date_components.push(if short { "%a" } else { "%A" }.to_string());
    } else if unit.contains(TimeUnitPart::Date) {
        date_components.push(format!("%d{}", if has_year { "," } else { "" }));
    }
    if has_year {
        date_components.push(if short { "%y" } else { "%Y" }.to_string());
    }

    let time_components: Vec<&str> = [
        (TimeUnitPart::Hours, "%H"),
        (TimeUnitPart::Minutes, "%M"),
        (TimeUnitPart::Seconds, "%S"),
        (TimeUnitPart::Milliseconds, "%L"),
    ]
    .into_iter()
    .filter(|(part, _)| unit.contains(*part))
    .map(|(_, token)| token)
    .collect();

    let mut date_time_components = Vec::new();
    if !date_components.is_empty() {
        date_time_components.push(date_components.join(" "));
    }
    if !time_components.is_empty() {
        date_time_components.push(time_components.join(":"));
    }

    if !date_time_components.is_empty() {
        if !expression.is_empty() {
            expression.push_str(" + ' ' + ");
        }
        let function = if is_utc_scale { "utcFormat" } else { "timeFormat" };
        expression.push_str(&format!(
            "{}({}, '{}')",
            function,
            field,
            date_time_components.join(" ")
        ));
    }

    if expression.is_empty() {
        None
    } else {
        Some(expression)
    }
}

/// The finest calendar interval present in a unit, for nicing time scales.
pub fn smallest_unit(time_unit: Option<&TimeUnit>) -> Option<&'static str> {
    let unit = time_unit?;
    if unit.contains(TimeUnitPart::Seconds) {
        Some("second")
    } else if unit.contains(TimeUnitPart::Minutes) {
        Some("minute")
    } else if unit.contains(TimeUnitPart::Hours) {
        Some("hour")
    } else if unit.contains(TimeUnitPart::Day) || unit.contains(TimeUnitPart::Date) {
        Some("day")
    } else if unit.contains(TimeUnitPart::Month) {
        Some("month")
    } else if unit.contains(TimeUnitPart::Year) {
        Some("year")
    } else {
        None
    }
}
