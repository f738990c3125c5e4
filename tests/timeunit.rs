//! Tests for time unit parsing, containment, date truncation and expressions.
use chrono::NaiveDate;
use proptest::prelude::*;
use rstest::rstest;
use sakuzu::prelude::*;
use sakuzu::timeunit::{contains_time_unit, format_expression, smallest_unit};
use sakuzu::util::var_name;

fn unit(s: &str) -> TimeUnit {
    s.parse().expect("Invalid time unit")
}

const KNOWN_UNITS: [&str; 20] = [
    "year",
    "quarter",
    "month",
    "date",
    "hours",
    "minutes",
    "seconds",
    "milliseconds",
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
    "secondsmilliseconds",
];

#[rstest]
#[case("yearmonthdate", "month", true)]
#[case("yearmonthdate", "date", true)]
#[case("yearmonthdate", "hours", false)]
#[case("yearmonthdate", "day", false)]
#[case("milliseconds", "seconds", false)]
#[case("secondsmilliseconds", "seconds", true)]
#[case("secondsmilliseconds", "milliseconds", true)]
#[case("hoursminutesseconds", "seconds", true)]
#[case("utcyearmonth", "year", true)]
#[case("day", "day", true)]
fn test_contains_time_unit(#[case] full: &str, #[case] part: &str, #[case] expected: bool) {
    assert_eq!(contains_time_unit(full, part), expected);
}

#[rstest]
#[case("yearmonthdate", Some("day"))]
#[case("yearmonth", Some("month"))]
#[case("hoursminutes", Some("minute"))]
#[case("secondsmilliseconds", Some("second"))]
#[case("year", Some("year"))]
#[case("quarter", None)]
#[case("milliseconds", None)]
fn test_smallest_unit(#[case] time_unit: &str, #[case] expected: Option<&str>) {
    assert_eq!(smallest_unit(Some(&unit(time_unit))), expected);
}

#[test]
fn test_smallest_unit_without_time_unit() {
    assert_eq!(smallest_unit(None), None);
}

#[test]
fn test_parse_normalizes_weekday_composites() {
    assert_eq!(unit("yearmonthday").as_str(), "yearmonthdate");
    assert_eq!(unit("day").as_str(), "day");
    assert_eq!(unit("utcday").as_str(), "utcday");
    assert_eq!(unit("utcyearmonthday").as_str(), "utcyearmonthdate");
}

#[test]
fn test_parse_rejects_unknown_units() {
    let result = "fortnight".parse::<TimeUnit>();
    assert_eq!(result, Err(TimeUnitError::Unknown("fortnight".to_string())));

    let from_json: std::result::Result<TimeUnit, _> = serde_json::from_value(serde_json::json!("weekly"));
    assert!(from_json.is_err());
}

#[test]
fn test_convert_keeps_only_unit_components() {
    let date = NaiveDate::from_ymd_opt(2000, 12, 4)
        .and_then(|d| d.and_hms_milli_opt(7, 58, 14, 123))
        .expect("Invalid date");

    let cases = [
        ("yearmonth", (2000, 12, 1), (0, 0, 0, 0)),
        ("yearmonthdate", (2000, 12, 4), (0, 0, 0, 0)),
        ("hoursminutes", (1900, 1, 1), (7, 58, 0, 0)),
        ("secondsmilliseconds", (1900, 1, 1), (0, 0, 14, 123)),
        ("quarter", (1900, 10, 1), (0, 0, 0, 0)),
    ];
    for (time_unit, (y, m, d), (h, min, s, ms)) in cases {
        let expected = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_milli_opt(h, min, s, ms))
            .expect("Invalid expected date");
        assert_eq!(
            unit(time_unit).convert(&date).expect("Conversion failed"),
            expected,
            "time unit {}",
            time_unit
        );
    }
}

#[test]
fn test_convert_quarter_starts_at_first_month() {
    let may = NaiveDate::from_ymd_opt(2000, 5, 17)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("Invalid date");
    let april = NaiveDate::from_ymd_opt(2000, 4, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("Invalid date");
    assert_eq!(unit("yearquarter").convert(&may), Ok(april));
}

#[test]
fn test_convert_rejects_weekday_units() {
    let date = NaiveDate::from_ymd_opt(2000, 12, 4)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .expect("Invalid date");
    assert_eq!(
        unit("day").convert(&date),
        Err(TimeUnitError::ContainsDay("day".to_string()))
    );
}

#[rstest]
#[case("month", r#"datetime(0, month(datum["f"]), 1, 0, 0, 0, 0)"#)]
#[case("quarter", r#"datetime(0, (quarter(datum["f"])-1)*3, 1, 0, 0, 0, 0)"#)]
#[case("day", r#"datetime(2006, 0, day(datum["f"])+1, 0, 0, 0, 0)"#)]
#[case(
    "utcyearmonth",
    r#"datetime(utcyear(datum["f"]), utcmonth(datum["f"]), 1, 0, 0, 0, 0)"#
)]
#[case(
    "hoursminutes",
    r#"datetime(0, 0, 1, hours(datum["f"]), minutes(datum["f"]), 0, 0)"#
)]
fn test_field_expr(#[case] time_unit: &str, #[case] expected: &str) {
    assert_eq!(unit(time_unit).field_expr("f"), expected);
}

#[rstest]
#[case("month", false, Some("timeFormat(datum.x, '%b')"))]
#[case("yearmonthdate", false, Some("timeFormat(datum.x, '%b %d, %Y')"))]
#[case("yearquarter", false, Some("'Q' + quarter(datum.x) + ' ' + timeFormat(datum.x, '%Y')"))]
#[case("hoursminutes", true, Some("utcFormat(datum.x, '%H:%M')"))]
fn test_format_expression(#[case] time_unit: &str, #[case] utc: bool, #[case] expected: Option<&str>) {
    let unit = unit(time_unit);
    assert_eq!(
        format_expression(Some(&unit), "datum.x", None, utc).as_deref(),
        expected
    );
}

#[test]
fn test_format_expression_long_names() {
    let unit = unit("yearmonth");
    assert_eq!(
        format_expression(Some(&unit), "datum.x", Some(false), false).as_deref(),
        Some("timeFormat(datum.x, '%B %Y')")
    );
    assert_eq!(format_expression(None, "datum.x", None, false), None);
}

const PARTS: [&str; 8] = [
    "year",
    "quarter",
    "month",
    "date",
    "hours",
    "minutes",
    "seconds",
    "milliseconds",
];

proptest! {
    #[test]
    fn test_containment_over_canonical_compositions(mask in 1u8..=u8::MAX) {
        let included: Vec<&str> = PARTS
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, part)| *part)
            .collect();
        let composite = included.concat();
        for part in PARTS {
            prop_assert_eq!(
                contains_time_unit(&composite, part),
                included.contains(&part),
                "{} in {}", part, composite
            );
        }
    }

    #[test]
    fn test_field_expr_has_seven_arguments(time_unit in proptest::sample::select(KNOWN_UNITS.to_vec()), utc in any::<bool>()) {
        let name = if utc { format!("utc{}", time_unit) } else { time_unit.to_string() };
        let unit = unit(&name);
        let expr = unit.field_expr("f");

        let args = expr
            .strip_prefix("datetime(")
            .and_then(|rest| rest.strip_suffix(')'))
            .expect("Not a datetime expression");
        prop_assert_eq!(args.split(", ").count(), 7);

        // A month part supersedes the quarter part.
        let parts = unit.parts().count();
        let shadowed = usize::from(time_unit.contains("quarter") && time_unit.contains("month"));
        prop_assert_eq!(expr.matches(r#"datum["f"]"#).count(), parts - shadowed);
    }

    #[test]
    fn test_var_name_alphabet(s in "\\PC*") {
        let name = var_name(&s);
        prop_assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'));
        prop_assert!(!name.starts_with(|c: char| c.is_ascii_digit()));
        let prefixed = usize::from(s.starts_with(|c: char| c.is_ascii_digit()));
        prop_assert_eq!(name.chars().count(), s.chars().count() + prefixed);
    }
}
