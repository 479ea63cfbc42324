//! Calendar items: the loosely-populated attribute bags a feed is built from.
//!
//! An [`Item`] carries every attribute the field-mapping tables know about,
//! all of them optional. Whatever is left unset simply contributes nothing to
//! the generated component; there is no placeholder output for absent fields.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::datetime::CalDateTime;
use crate::document::{Alarm, ComponentKind, Params, Property};
use crate::recurrence::RecurrenceRule;

/// Event/to-do status (RFC 5545 §3.8.1.11).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Confirmed,
    Tentative,
    Cancelled,
    NeedsAction,
    Completed,
    InProcess,
}

impl Status {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "CONFIRMED",
            Self::Tentative => "TENTATIVE",
            Self::Cancelled => "CANCELLED",
            Self::NeedsAction => "NEEDS-ACTION",
            Self::Completed => "COMPLETED",
            Self::InProcess => "IN-PROCESS",
        }
    }
}

/// Whether the entry blocks time on a free/busy view (RFC 5545 §3.8.2.7).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transparency {
    Opaque,
    Transparent,
}

impl Transparency {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Opaque => "OPAQUE",
            Self::Transparent => "TRANSPARENT",
        }
    }
}

/// A geographic position in floating-point degrees, emitted as `"lat;lon"`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub(crate) fn to_property(self, name: &str) -> Property {
        Property::new(name, format!("{};{}", self.lat, self.lon))
    }
}

/// An attendee: a mailbox address plus an ordered parameter map.
///
/// At assembly time the parameters are laid over a set of defaults
/// (`CUTYPE=INDIVIDUAL`, `ROLE=REQ-PARTICIPANT`, `RSVP=TRUE`); a supplied
/// parameter wins over its default on name collision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    pub params: Params,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            params: Params::new(),
        }
    }

    /// Adds a parameter, builder-style.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(name, value);
        self
    }

    pub(crate) fn to_property(&self, name: &str) -> Property {
        let mut params: Params = [
            ("CUTYPE", "INDIVIDUAL"),
            ("ROLE", "REQ-PARTICIPANT"),
            ("RSVP", "TRUE"),
        ]
        .into_iter()
        .collect();
        for (n, v) in self.params.iter() {
            params.set(n, v);
        }

        let mut prop = Property::new(name, format!("mailto:{}", self.email));
        for (n, v) in params.iter() {
            prop = prop.param(n, v);
        }
        prop
    }
}

/// The organizer: a mailbox address plus an ordered parameter map, with no
/// default parameters. A bare address is a valid organizer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organizer {
    pub email: String,
    pub params: Params,
}

impl Organizer {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            params: Params::new(),
        }
    }

    /// Adds a parameter, builder-style.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(name, value);
        self
    }

    pub(crate) fn to_property(&self, name: &str) -> Property {
        let mut prop = Property::new(name, format!("mailto:{}", self.email));
        for (n, v) in self.params.iter() {
            prop = prop.param(n, v);
        }
        prop
    }
}

impl From<&str> for Organizer {
    /// A bare address makes a parameter-less organizer.
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Organizer {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

/// One calendar item (event or task) in attribute-bag form.
///
/// The mapping engine reads these fields through the tables in
/// [`crate::mapping`]; the `completed`/`percent_complete`/`priority`/`due`
/// rows only apply to [`ComponentKind::Task`] items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub kind: ComponentKind,
    pub unique_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_datetime: Option<CalDateTime>,
    pub end_datetime: Option<CalDateTime>,
    pub updateddate: Option<CalDateTime>,
    pub created: Option<CalDateTime>,
    pub timestamp: Option<CalDateTime>,
    pub transparency: Option<Transparency>,
    pub location: Option<String>,
    pub geolocation: Option<GeoPoint>,
    pub link: Option<Url>,
    pub organizer: Option<Organizer>,
    pub categories: Vec<String>,
    pub rrule: Vec<RecurrenceRule>,
    pub exrule: Vec<RecurrenceRule>,
    pub rdate: Vec<CalDateTime>,
    pub exdate: Vec<CalDateTime>,
    pub status: Option<Status>,
    pub attendees: Vec<Attendee>,
    pub alarms: Vec<Alarm>,
    pub completed: Option<CalDateTime>,
    pub percent_complete: Option<u8>,
    pub priority: Option<u8>,
    pub due: Option<CalDateTime>,
}

impl Item {
    /// An empty event item.
    pub fn event() -> Self {
        Self {
            kind: ComponentKind::Event,
            ..Self::default()
        }
    }

    /// An empty task item.
    pub fn task() -> Self {
        Self {
            kind: ComponentKind::Task,
            ..Self::default()
        }
    }
}
