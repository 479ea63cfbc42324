//! Recurrence rule normalization (RFC 5545 §3.3.10, §3.8.5.3).
//!
//! Recurrence rules reach this crate in four shapes: built part by part,
//! as raw `FREQ=...;...` rule text, or as one of the two object shapes of the
//! third-party [`rrule`] crate. All of them are funneled into one canonical
//! [`RecurrenceRule`]: the foreign shapes are asked for their own textual
//! serialization and that text goes through the single parser. One
//! parser/encoder pair therefore defines the canonical form, rather than
//! N-to-1 converters each with their own idea of rule-part semantics.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::trace;
use serde::{Deserialize, Serialize};

use crate::document::Property;
use crate::error::{Error, FeedResult};

/// Recurrence frequency. The one mandatory rule part.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Frequency {
    Secondly,
    Minutely,
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Returns the RFC 5545 name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Secondly => "SECONDLY",
            Self::Minutely => "MINUTELY",
            Self::Hourly => "HOURLY",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "SECONDLY" => Self::Secondly,
            "MINUTELY" => Self::Minutely,
            "HOURLY" => Self::Hourly,
            "DAILY" => Self::Daily,
            "WEEKLY" => Self::Weekly,
            "MONTHLY" => Self::Monthly,
            "YEARLY" => Self::Yearly,
            other => return Err(Error::InvalidFrequency(other.to_string())),
        })
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Day of the week, by its two-letter RFC 5545 code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl Weekday {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sunday => "SU",
            Self::Monday => "MO",
            Self::Tuesday => "TU",
            Self::Wednesday => "WE",
            Self::Thursday => "TH",
            Self::Friday => "FR",
            Self::Saturday => "SA",
        }
    }

    /// Parses a two-letter code (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "SU" => Self::Sunday,
            "MO" => Self::Monday,
            "TU" => Self::Tuesday,
            "WE" => Self::Wednesday,
            "TH" => Self::Thursday,
            "FR" => Self::Friday,
            "SA" => Self::Saturday,
            _ => return None,
        })
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A BYDAY entry: a weekday with an optional occurrence ordinal.
///
/// `TU` is every Tuesday, `+1TU` the first Tuesday of the period, `-3TH` the
/// third Thursday counted from the end. Ordinals always render with an
/// explicit sign; a bare weekday renders as the two-letter code alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayNum {
    /// Occurrence within the period (never 0); negative counts from the end.
    pub ordinal: Option<i8>,
    pub weekday: Weekday,
}

impl WeekdayNum {
    /// A weekday entry with no ordinal.
    pub const fn every(weekday: Weekday) -> Self {
        Self {
            ordinal: None,
            weekday,
        }
    }

    /// A weekday entry with an ordinal, e.g. `nth(-1, Friday)` for the last Friday.
    pub const fn nth(ordinal: i8, weekday: Weekday) -> Self {
        Self {
            ordinal: Some(ordinal),
            weekday,
        }
    }

    /// Parses `[[+|-]n]WD` tokens. A leading `+` does not change the meaning.
    pub fn parse(s: &str) -> Option<Self> {
        if !s.is_ascii() || s.len() < 2 {
            return None;
        }
        let (ordinal_part, day_part) = s.split_at(s.len() - 2);
        let weekday = Weekday::parse(day_part)?;
        if ordinal_part.is_empty() {
            return Some(Self::every(weekday));
        }
        let ordinal: i8 = ordinal_part.parse().ok()?;
        if ordinal == 0 {
            return None;
        }
        Some(Self::nth(ordinal, weekday))
    }
}

impl fmt::Display for WeekdayNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(n) = self.ordinal {
            write!(f, "{:+}", n)?;
        }
        write!(f, "{}", self.weekday)
    }
}

/// UNTIL boundary: either a date or an absolute (UTC) date-time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Until {
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl Until {
    fn parse(s: &str) -> FeedResult<Self> {
        if s.len() == 8 {
            return NaiveDate::parse_from_str(s, "%Y%m%d")
                .map(Self::Date)
                .map_err(|_| Error::MalformedRuleText(format!("invalid UNTIL value '{s}'")));
        }
        // Some serializers leave the `Z` off; treat those as UTC as well.
        NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%SZ")
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S"))
            .map(|naive| Self::DateTime(naive.and_utc()))
            .map_err(|_| Error::MalformedRuleText(format!("invalid UNTIL value '{s}'")))
    }
}

impl fmt::Display for Until {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d.format("%Y%m%d")),
            Self::DateTime(dt) => write!(f, "{}", dt.format("%Y%m%dT%H%M%SZ")),
        }
    }
}

/// A rule object that can render its library's canonical rule-text serialization.
///
/// This is the seam the foreign-object adapters share: any type that can print
/// itself in rule-text form can be normalized by [`RecurrenceRule::from_foreign`].
pub trait RuleText {
    fn rule_text(&self) -> String;
}

/// The `rrule` crate's builder shape: a frequency plus selector lists, some of
/// which admit a signed ordinal prefix (`NWeekday::Nth`). Serializes as a bare
/// single-line rule.
impl RuleText for rrule::RRule<rrule::Unvalidated> {
    fn rule_text(&self) -> String {
        self.to_string()
    }
}

/// The `rrule` crate's validated set shape, with its own multi-line
/// serialization convention (`DTSTART:...` line, then `RRULE:`-prefixed lines).
impl RuleText for rrule::RRuleSet {
    fn rule_text(&self) -> String {
        self.to_string()
    }
}

/// The canonical recurrence rule: one typed slot per RFC 5545 rule part.
///
/// A part is present only if it was explicitly supplied (`None` / empty list
/// means absent, which is not the same thing as zero). List parts always carry
/// list cardinality: textual inputs are order-insensitive and repeatable, so
/// the parser produces lists even for single values, and the builder stores
/// lists too. Values are copied verbatim; range checking is the caller's
/// responsibility.
///
/// Instances are built fresh per normalization call and never mutated after
/// being attached to a component.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub freq: Frequency,
    pub count: Option<u32>,
    pub interval: Option<u32>,
    pub by_second: Vec<u8>,
    pub by_minute: Vec<u8>,
    pub by_hour: Vec<u8>,
    pub by_day: Vec<WeekdayNum>,
    pub by_monthday: Vec<i8>,
    pub by_yearday: Vec<i16>,
    pub by_weekno: Vec<i8>,
    pub by_month: Vec<u8>,
    pub by_setpos: Vec<i16>,
    pub wkst: Option<Weekday>,
    pub until: Option<Until>,
}

impl RecurrenceRule {
    /// Creates a rule with the mandatory frequency and no other parts.
    pub fn new(freq: Frequency) -> Self {
        Self {
            freq,
            count: None,
            interval: None,
            by_second: Vec::new(),
            by_minute: Vec::new(),
            by_hour: Vec::new(),
            by_day: Vec::new(),
            by_monthday: Vec::new(),
            by_yearday: Vec::new(),
            by_weekno: Vec::new(),
            by_month: Vec::new(),
            by_setpos: Vec::new(),
            wkst: None,
            until: None,
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    pub fn with_by_second(mut self, seconds: Vec<u8>) -> Self {
        self.by_second = seconds;
        self
    }

    pub fn with_by_minute(mut self, minutes: Vec<u8>) -> Self {
        self.by_minute = minutes;
        self
    }

    pub fn with_by_hour(mut self, hours: Vec<u8>) -> Self {
        self.by_hour = hours;
        self
    }

    pub fn with_by_day(mut self, days: Vec<WeekdayNum>) -> Self {
        self.by_day = days;
        self
    }

    pub fn with_by_monthday(mut self, monthdays: Vec<i8>) -> Self {
        self.by_monthday = monthdays;
        self
    }

    pub fn with_by_yearday(mut self, yeardays: Vec<i16>) -> Self {
        self.by_yearday = yeardays;
        self
    }

    pub fn with_by_weekno(mut self, weeknos: Vec<i8>) -> Self {
        self.by_weekno = weeknos;
        self
    }

    pub fn with_by_month(mut self, months: Vec<u8>) -> Self {
        self.by_month = months;
        self
    }

    pub fn with_by_setpos(mut self, setpos: Vec<i16>) -> Self {
        self.by_setpos = setpos;
        self
    }

    pub fn with_wkst(mut self, wkst: Weekday) -> Self {
        self.wkst = Some(wkst);
        self
    }

    pub fn with_until(mut self, until: Until) -> Self {
        self.until = Some(until);
        self
    }

    /// Parses semicolon-separated `NAME=value[,value...]` rule text.
    ///
    /// Every value is parsed to its typed form. Numeric values may carry a
    /// leading `+`, which is stripped (`BYMONTHDAY=+4` equals `BYMONTHDAY=4`;
    /// only `-4` changes the meaning). An unrecognized part name or a value
    /// that does not parse fails with [`Error::MalformedRuleText`]; a bad
    /// frequency fails with [`Error::InvalidFrequency`]. If a part appears
    /// twice, the last occurrence wins.
    pub fn from_rule_text(text: &str) -> FeedResult<Self> {
        let mut parts = Vec::new();
        for part in text.trim().split(';').filter(|p| !p.is_empty()) {
            let (name, values) = part.split_once('=').ok_or_else(|| {
                Error::MalformedRuleText(format!("rule part '{part}' has no '=' separator"))
            })?;
            parts.push((name.to_ascii_uppercase(), values));
        }

        // FREQ is the one mandatory part, and the struct is built around it.
        let mut freq = None;
        for (name, values) in &parts {
            if name == "FREQ" {
                freq = Some(values.parse()?);
            }
        }
        let mut rule = match freq {
            Some(freq) => Self::new(freq),
            None => {
                return Err(Error::MalformedRuleText(
                    "rule text has no FREQ part".to_string(),
                ))
            }
        };

        for (name, values) in parts {
            match name.as_str() {
                "FREQ" => {}
                "COUNT" => rule.count = Some(parse_int("COUNT", values)?),
                "INTERVAL" => rule.interval = Some(parse_int("INTERVAL", values)?),
                "BYSECOND" => rule.by_second = parse_int_list("BYSECOND", values)?,
                "BYMINUTE" => rule.by_minute = parse_int_list("BYMINUTE", values)?,
                "BYHOUR" => rule.by_hour = parse_int_list("BYHOUR", values)?,
                "BYDAY" => rule.by_day = parse_day_list(values)?,
                "BYMONTHDAY" => rule.by_monthday = parse_int_list("BYMONTHDAY", values)?,
                "BYYEARDAY" => rule.by_yearday = parse_int_list("BYYEARDAY", values)?,
                "BYWEEKNO" => rule.by_weekno = parse_int_list("BYWEEKNO", values)?,
                "BYMONTH" => rule.by_month = parse_int_list("BYMONTH", values)?,
                "BYSETPOS" => rule.by_setpos = parse_int_list("BYSETPOS", values)?,
                "WKST" => {
                    rule.wkst = Some(Weekday::parse(values).ok_or_else(|| {
                        Error::MalformedRuleText(format!("invalid WKST value '{values}'"))
                    })?)
                }
                "UNTIL" => rule.until = Some(Until::parse(values)?),
                other => {
                    return Err(Error::MalformedRuleText(format!(
                        "unknown rule part '{other}'"
                    )))
                }
            }
        }

        Ok(rule)
    }

    /// Normalizes a third-party rule object.
    ///
    /// The object is asked for its own canonical serialization; lines that are
    /// not rule text (`DTSTART`, exception dates) are skipped, a leading
    /// `RRULE:` component-name prefix is stripped, and the remainder goes
    /// through [`RecurrenceRule::from_rule_text`].
    pub fn from_foreign(rule: &impl RuleText) -> FeedResult<Self> {
        let text = rule.rule_text();
        trace!("normalizing foreign rule serialization: {}", text);

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with("DTSTART")
                || line.starts_with("EXDATE")
                || line.starts_with("RDATE")
            {
                continue;
            }
            let line = line.strip_prefix("RRULE:").unwrap_or(line);
            return Self::from_rule_text(line);
        }

        Err(Error::MalformedRuleText(
            "foreign rule serialized to no rule text".to_string(),
        ))
    }

    /// Renders this rule as a property (RRULE or EXRULE) carrying the encoded text.
    pub fn to_property(&self, name: &str) -> Property {
        Property::new(name, self.to_string())
    }
}

impl fmt::Display for RecurrenceRule {
    /// Encodes the rule back to `PART=value[,value...]` text, FREQ first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = vec![format!("FREQ={}", self.freq)];

        if let Some(count) = self.count {
            parts.push(format!("COUNT={count}"));
        }
        if let Some(interval) = self.interval {
            parts.push(format!("INTERVAL={interval}"));
        }
        push_list(&mut parts, "BYSECOND", &self.by_second);
        push_list(&mut parts, "BYMINUTE", &self.by_minute);
        push_list(&mut parts, "BYHOUR", &self.by_hour);
        push_list(&mut parts, "BYDAY", &self.by_day);
        push_list(&mut parts, "BYMONTHDAY", &self.by_monthday);
        push_list(&mut parts, "BYYEARDAY", &self.by_yearday);
        push_list(&mut parts, "BYWEEKNO", &self.by_weekno);
        push_list(&mut parts, "BYMONTH", &self.by_month);
        push_list(&mut parts, "BYSETPOS", &self.by_setpos);
        if let Some(wkst) = self.wkst {
            parts.push(format!("WKST={wkst}"));
        }
        if let Some(ref until) = self.until {
            parts.push(format!("UNTIL={until}"));
        }

        write!(f, "{}", parts.join(";"))
    }
}

impl FromStr for RecurrenceRule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_rule_text(s)
    }
}

fn push_list<T: ToString>(parts: &mut Vec<String>, name: &str, values: &[T]) {
    if !values.is_empty() {
        let rendered: Vec<String> = values.iter().map(ToString::to_string).collect();
        parts.push(format!("{name}={}", rendered.join(",")));
    }
}

fn parse_int<T: FromStr>(part: &str, value: &str) -> FeedResult<T> {
    // Integer FromStr accepts a leading '+', which normalizes `+4` to `4`
    // uniformly across every entry point.
    value
        .trim()
        .parse()
        .map_err(|_| Error::MalformedRuleText(format!("invalid {part} value '{value}'")))
}

fn parse_int_list<T: FromStr>(part: &str, values: &str) -> FeedResult<Vec<T>> {
    values.split(',').map(|v| parse_int(part, v)).collect()
}

fn parse_day_list(values: &str) -> FeedResult<Vec<WeekdayNum>> {
    values
        .split(',')
        .map(|v| {
            WeekdayNum::parse(v.trim())
                .ok_or_else(|| Error::MalformedRuleText(format!("invalid BYDAY value '{v}'")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn display_basic() {
        let rule = RecurrenceRule::new(Frequency::Daily).with_count(10);
        assert_eq!(rule.to_string(), "FREQ=DAILY;COUNT=10");
    }

    #[test]
    fn display_weekly_byday() {
        let rule = RecurrenceRule::new(Frequency::Weekly).with_by_day(vec![
            WeekdayNum::every(Weekday::Monday),
            WeekdayNum::every(Weekday::Wednesday),
            WeekdayNum::every(Weekday::Friday),
        ]);
        assert_eq!(rule.to_string(), "FREQ=WEEKLY;BYDAY=MO,WE,FR");
    }

    #[test]
    fn ordinal_days_render_with_explicit_sign() {
        let rule = RecurrenceRule::new(Frequency::Monthly).with_by_day(vec![
            WeekdayNum::nth(1, Weekday::Tuesday),
            WeekdayNum::nth(-3, Weekday::Thursday),
        ]);
        assert_eq!(rule.to_string(), "FREQ=MONTHLY;BYDAY=+1TU,-3TH");
    }

    #[test]
    fn builder_round_trips_through_text() {
        let rule = RecurrenceRule::new(Frequency::Yearly)
            .with_interval(2)
            .with_by_month(vec![1, 7])
            .with_by_day(vec![WeekdayNum::nth(-1, Weekday::Sunday)])
            .with_wkst(Weekday::Monday)
            .with_until(Until::DateTime(
                Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            ));

        let reparsed = RecurrenceRule::from_rule_text(&rule.to_string()).unwrap();
        assert_eq!(reparsed, rule);
    }

    #[test]
    fn parse_weekly_rule_text() {
        let rule = RecurrenceRule::from_rule_text("FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,TU").unwrap();
        assert_eq!(rule.freq, Frequency::Weekly);
        assert_eq!(rule.interval, Some(2));
        assert_eq!(
            rule.by_day,
            vec![
                WeekdayNum::every(Weekday::Monday),
                WeekdayNum::every(Weekday::Tuesday)
            ]
        );
        assert_eq!(rule.count, None);
    }

    #[test]
    fn positive_monthday_sign_is_normalized() {
        let plus = RecurrenceRule::from_rule_text("FREQ=MONTHLY;BYMONTHDAY=+4").unwrap();
        let bare = RecurrenceRule::from_rule_text("FREQ=MONTHLY;BYMONTHDAY=4").unwrap();
        let minus = RecurrenceRule::from_rule_text("FREQ=MONTHLY;BYMONTHDAY=-4").unwrap();

        assert_eq!(plus, bare);
        assert_ne!(minus, plus);
        assert_eq!(minus.by_monthday, vec![-4]);
    }

    #[test]
    fn until_date_and_datetime_forms() {
        let date_rule = RecurrenceRule::from_rule_text("FREQ=DAILY;UNTIL=20240115").unwrap();
        assert_eq!(
            date_rule.until,
            Some(Until::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
        );

        let dt_rule = RecurrenceRule::from_rule_text("FREQ=DAILY;UNTIL=20240115T103000Z").unwrap();
        assert_eq!(
            dt_rule.until,
            Some(Until::DateTime(
                Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap()
            ))
        );
        assert_eq!(dt_rule.to_string(), "FREQ=DAILY;UNTIL=20240115T103000Z");
    }

    #[test]
    fn unknown_part_is_malformed() {
        let err = RecurrenceRule::from_rule_text("FREQ=DAILY;BOGUS=1").unwrap_err();
        assert!(matches!(err, Error::MalformedRuleText(_)));
    }

    #[test]
    fn non_integer_count_is_malformed() {
        let err = RecurrenceRule::from_rule_text("FREQ=DAILY;COUNT=soon").unwrap_err();
        assert!(matches!(err, Error::MalformedRuleText(_)));
    }

    #[test]
    fn missing_freq_is_malformed() {
        let err = RecurrenceRule::from_rule_text("COUNT=3").unwrap_err();
        assert!(matches!(err, Error::MalformedRuleText(_)));
    }

    #[test]
    fn bad_frequency_is_invalid_frequency() {
        let err = RecurrenceRule::from_rule_text("FREQ=FORTNIGHTLY").unwrap_err();
        assert_eq!(err, Error::InvalidFrequency("FORTNIGHTLY".to_string()));
    }

    #[test]
    fn byday_accepts_signed_and_bare_tokens() {
        let rule =
            RecurrenceRule::from_rule_text("FREQ=MONTHLY;BYDAY=+1TU,-3TH,su").unwrap();
        assert_eq!(
            rule.by_day,
            vec![
                WeekdayNum::nth(1, Weekday::Tuesday),
                WeekdayNum::nth(-3, Weekday::Thursday),
                WeekdayNum::every(Weekday::Sunday),
            ]
        );
        // a zero ordinal is never valid
        assert!(RecurrenceRule::from_rule_text("FREQ=MONTHLY;BYDAY=0TU").is_err());
    }

    #[test]
    fn foreign_rrule_object_normalizes() {
        let foreign = rrule::RRule::new(rrule::Frequency::Weekly)
            .count(5)
            .by_weekday(vec![rrule::NWeekday::Every(chrono::Weekday::Mon)]);

        let rule = RecurrenceRule::from_foreign(&foreign).unwrap();
        assert_eq!(rule.freq, Frequency::Weekly);
        assert_eq!(rule.count, Some(5));
        assert_eq!(rule.by_day, vec![WeekdayNum::every(Weekday::Monday)]);
    }

    #[test]
    fn foreign_rule_set_prefixes_are_stripped() {
        let set: rrule::RRuleSet = "DTSTART:20260101T100000Z\nRRULE:FREQ=DAILY;COUNT=5"
            .parse()
            .unwrap();

        let rule = RecurrenceRule::from_foreign(&set).unwrap();
        assert_eq!(rule.freq, Frequency::Daily);
        assert_eq!(rule.count, Some(5));
    }

    #[test]
    fn foreign_shapes_agree_on_equivalent_rules() {
        // The set shape normalizes by inferring BYHOUR/BYMINUTE/BYSECOND from
        // DTSTART, so give the builder shape the same selectors explicitly.
        let builder_shape = rrule::RRule::new(rrule::Frequency::Daily)
            .count(5)
            .by_hour(vec![10])
            .by_minute(vec![0])
            .by_second(vec![0]);
        let set_shape: rrule::RRuleSet = "DTSTART:20260101T100000Z\nRRULE:FREQ=DAILY;COUNT=5"
            .parse()
            .unwrap();

        assert_eq!(
            RecurrenceRule::from_foreign(&builder_shape).unwrap(),
            RecurrenceRule::from_foreign(&set_shape).unwrap()
        );
    }
}
