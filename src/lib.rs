//! This crate turns loosely-typed calendar data into iCalendar (RFC 5545) documents.
//!
//! A [`Feed`] holds optional document-level metadata and an ordered sequence of
//! [`Item`]s (events or to-do tasks). Building the feed runs every item through
//! a declarative field-mapping table (see the [`mapping`] module) and produces a
//! [`CalendarDocument`]: the logical property/component tree. Serialization to
//! actual iCalendar text (line folding, CRLF handling) is delegated to the
//! [`icalendar`] encoder crate.
//!
//! Recurrence rules can be supplied in four shapes (built part by part, as raw
//! rule text, or as either of the [`rrule`] crate's two object shapes) and are
//! all normalized into one canonical [`RecurrenceRule`] (see the [`recurrence`]
//! module).

pub mod error;
pub use error::{Error, FeedResult};

pub mod datetime;
pub use datetime::CalDateTime;

pub mod recurrence;
pub use recurrence::{Frequency, RecurrenceRule, RuleText, Until, Weekday, WeekdayNum};

pub mod document;
pub use document::{Alarm, CalendarDocument, Component, ComponentKind, Params, Property};

pub mod item;
pub use item::{Attendee, GeoPoint, Item, Organizer, Status, Transparency};

pub mod mapping;

pub mod feed;
pub use feed::Feed;

/// The media type an HTTP layer should serve generated documents with.
pub const MIME_TYPE: &str = "text/calendar; charset=utf8";
