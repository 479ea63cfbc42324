//! Feed assembly: document-level metadata plus the item sequence, turned into
//! a [`CalendarDocument`].
//!
//! The document assembler is deliberately thin: metadata fields go through the
//! same optional, table-driven attachment rule as item fields, and each item is
//! handed to [`assemble`] in input order. The build is a pure transform; it
//! either fully succeeds or fails on the first malformed field.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::document::{CalendarDocument, Component, Property};
use crate::error::FeedResult;
use crate::item::Item;
use crate::mapping::map_fields;

/// Document-level metadata fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedField {
    ProductId,
    Method,
    Title,
    Description,
    Timezone,
    Ttl,
}

/// Document-level mapping table: generic metadata field → calendar property.
pub const DOCUMENT_FIELD_MAP: &[(FeedField, &str)] = &[
    (FeedField::ProductId, "PRODID"),
    (FeedField::Method, "METHOD"),
    (FeedField::Title, "X-WR-CALNAME"),
    (FeedField::Description, "X-WR-CALDESC"),
    (FeedField::Timezone, "X-WR-TIMEZONE"),
    (FeedField::Ttl, "X-PUBLISHED-TTL"),
];

/// Builds one component from one item: runs the mapping table for the item's
/// variant and attaches the mapped properties and alarm sub-components to a
/// fresh [`Component`]. The item itself is never mutated.
pub fn assemble(item: &Item) -> FeedResult<Component> {
    let mapped = map_fields(item)?;
    let mut component = Component::new(item.kind);
    for property in mapped.properties {
        component.push_property(property);
    }
    for alarm in mapped.alarms {
        component.add_alarm(alarm);
    }
    Ok(component)
}

/// A calendar feed: optional document metadata and an ordered item sequence.
///
/// ```
/// use ical_feed::{Feed, Item};
/// use chrono::{TimeZone, Utc};
///
/// let mut feed = Feed::new();
/// feed.title = Some("My Events".to_string());
/// let mut item = Item::event();
/// item.title = Some("Hello".to_string());
/// item.start_datetime = Some(Utc.with_ymd_and_hms(2012, 5, 6, 10, 0, 0).unwrap().into());
/// feed.items.push(item);
/// let ics = feed.to_ical().unwrap();
/// assert!(ics.contains("SUMMARY:Hello"));
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub product_id: Option<String>,
    pub method: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub timezone: Option<String>,
    pub ttl: Option<String>,
    pub items: Vec<Item>,
}

impl Feed {
    pub fn new() -> Self {
        Self::default()
    }

    /// The metadata accessor behind [`DOCUMENT_FIELD_MAP`].
    fn field_value(&self, field: FeedField) -> Option<&str> {
        match field {
            FeedField::ProductId => self.product_id.as_deref(),
            FeedField::Method => self.method.as_deref(),
            FeedField::Title => self.title.as_deref(),
            FeedField::Description => self.description.as_deref(),
            FeedField::Timezone => self.timezone.as_deref(),
            FeedField::Ttl => self.ttl.as_deref(),
        }
    }

    /// Builds the logical document: supplied metadata properties, then one
    /// component per item, in input order.
    pub fn build(&self) -> FeedResult<CalendarDocument> {
        debug!("building calendar document from {} item(s)", self.items.len());

        let mut document = CalendarDocument::new();
        for (field, property) in DOCUMENT_FIELD_MAP {
            if let Some(value) = self.field_value(*field) {
                document.push_property(Property::new(*property, value));
            }
        }
        for item in &self.items {
            document.push_component(assemble(item)?);
        }
        Ok(document)
    }

    /// Builds the document and serializes it through the external encoder.
    pub fn to_ical(&self) -> FeedResult<String> {
        Ok(self.build()?.to_ical())
    }
}
