//! Timestamp values for calendar properties.
//!
//! RFC 5545 knows four flavors of date/time: a date without a time, a UTC
//! date-time, a "floating" local date-time, and a date-time qualified by a
//! named timezone. Which flavor a value carries decides how the property is
//! rendered (`VALUE=DATE` / `Z` suffix / `TZID` parameter / nothing).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::document::Property;

/// A timestamp as supplied by the caller for DTSTART, DTEND, DUE and friends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalDateTime {
    /// An all-day date, emitted with a `VALUE=DATE` parameter.
    Date(NaiveDate),
    /// Floating local time: no timezone attached, interpreted in the viewer's
    /// local zone. Emitted with neither `Z` suffix nor `TZID` parameter.
    Floating(NaiveDateTime),
    /// An instant in UTC, emitted with the `Z` suffix.
    Utc(DateTime<Utc>),
    /// A local time in a named timezone, emitted with a `TZID` parameter equal
    /// to the zone's identifier.
    Zoned { datetime: NaiveDateTime, tzid: Tz },
}

impl CalDateTime {
    /// Builds a zoned timestamp from a local date-time and a named zone.
    pub fn zoned(datetime: NaiveDateTime, tzid: Tz) -> Self {
        Self::Zoned { datetime, tzid }
    }

    /// Renders this timestamp as a property with the given name, attaching the
    /// `TZID` or `VALUE=DATE` parameter the flavor calls for.
    pub fn to_property(&self, name: &str) -> Property {
        match self {
            Self::Date(date) => {
                Property::new(name, date.format("%Y%m%d").to_string()).param("VALUE", "DATE")
            }
            Self::Floating(dt) => Property::new(name, dt.format("%Y%m%dT%H%M%S").to_string()),
            Self::Utc(dt) => Property::new(name, dt.format("%Y%m%dT%H%M%SZ").to_string()),
            Self::Zoned { datetime, tzid } => {
                Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string())
                    .param("TZID", tzid.name())
            }
        }
    }
}

impl From<DateTime<Utc>> for CalDateTime {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::Utc(dt)
    }
}

impl From<NaiveDateTime> for CalDateTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Floating(dt)
    }
}

impl From<NaiveDate> for CalDateTime {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<Tz>> for CalDateTime {
    fn from(dt: DateTime<Tz>) -> Self {
        Self::Zoned {
            datetime: dt.naive_local(),
            tzid: dt.timezone(),
        }
    }
}
