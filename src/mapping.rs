//! The field-mapping engine: a declarative table that turns item attributes
//! into component properties.
//!
//! Each table entry names a generic item field, the component property it maps
//! to, and its multiplicity. The engine walks the table in order, asks the
//! item for each field's value, and renders whatever is present. Absent fields
//! contribute nothing. Events and tasks share one table; tasks get four extra
//! rows appended.

use serde::{Deserialize, Serialize};

use crate::document::{Alarm, ComponentKind, Property};
use crate::error::{Error, FeedResult};
use crate::item::{Attendee, GeoPoint, Item, Organizer};
use crate::datetime::CalDateTime;
use crate::recurrence::RecurrenceRule;

/// Identifies one generic item field, the closed set of names the tables know.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemField {
    UniqueId,
    Title,
    Description,
    StartDatetime,
    EndDatetime,
    UpdatedDate,
    Created,
    Timestamp,
    Transparency,
    Location,
    Geolocation,
    Link,
    Organizer,
    Categories,
    RRule,
    ExRule,
    RDate,
    ExDate,
    Status,
    Attendee,
    Alarms,
    Completed,
    PercentComplete,
    Priority,
    Due,
}

impl ItemField {
    /// The generic field name, as callers know it.
    pub const fn name(self) -> &'static str {
        match self {
            Self::UniqueId => "unique_id",
            Self::Title => "title",
            Self::Description => "description",
            Self::StartDatetime => "start_datetime",
            Self::EndDatetime => "end_datetime",
            Self::UpdatedDate => "updateddate",
            Self::Created => "created",
            Self::Timestamp => "timestamp",
            Self::Transparency => "transparency",
            Self::Location => "location",
            Self::Geolocation => "geolocation",
            Self::Link => "link",
            Self::Organizer => "organizer",
            Self::Categories => "categories",
            Self::RRule => "rrule",
            Self::ExRule => "exrule",
            Self::RDate => "rdate",
            Self::ExDate => "exdate",
            Self::Status => "status",
            Self::Attendee => "attendee",
            Self::Alarms => "valarm",
            Self::Completed => "completed",
            Self::PercentComplete => "percent_complete",
            Self::Priority => "priority",
            Self::Due => "due",
        }
    }
}

/// How many property occurrences a field produces, and of what kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Multiplicity {
    /// One occurrence of one property.
    Scalar,
    /// A list of values, each becoming one occurrence of the same property.
    RepeatableFlat,
    /// A list of values, each becoming one nested sub-component.
    RepeatableSubComponent,
    /// Recurrence rules: each encodes to one occurrence of a rule property.
    RuleValued,
}

impl Multiplicity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Scalar => "scalar",
            Self::RepeatableFlat => "repeatable-flat",
            Self::RepeatableSubComponent => "repeatable-subcomponent",
            Self::RuleValued => "rule-valued",
        }
    }
}

/// One row of a mapping table.
#[derive(Clone, Copy, Debug)]
pub struct FieldMapping {
    pub field: ItemField,
    pub property: &'static str,
    pub multiplicity: Multiplicity,
}

const fn row(field: ItemField, property: &'static str, multiplicity: Multiplicity) -> FieldMapping {
    FieldMapping {
        field,
        property,
        multiplicity,
    }
}

/// Rows shared by events and tasks, in output order.
pub const COMPONENT_FIELD_MAP: &[FieldMapping] = &[
    row(ItemField::UniqueId, "UID", Multiplicity::Scalar),
    row(ItemField::Title, "SUMMARY", Multiplicity::Scalar),
    row(ItemField::Description, "DESCRIPTION", Multiplicity::Scalar),
    row(ItemField::StartDatetime, "DTSTART", Multiplicity::Scalar),
    row(ItemField::EndDatetime, "DTEND", Multiplicity::Scalar),
    row(ItemField::UpdatedDate, "LAST-MODIFIED", Multiplicity::Scalar),
    row(ItemField::Created, "CREATED", Multiplicity::Scalar),
    row(ItemField::Timestamp, "DTSTAMP", Multiplicity::Scalar),
    row(ItemField::Transparency, "TRANSP", Multiplicity::Scalar),
    row(ItemField::Location, "LOCATION", Multiplicity::Scalar),
    row(ItemField::Geolocation, "GEO", Multiplicity::Scalar),
    row(ItemField::Link, "URL", Multiplicity::Scalar),
    row(ItemField::Organizer, "ORGANIZER", Multiplicity::Scalar),
    row(ItemField::Categories, "CATEGORIES", Multiplicity::Scalar),
    row(ItemField::RRule, "RRULE", Multiplicity::RuleValued),
    row(ItemField::ExRule, "EXRULE", Multiplicity::RuleValued),
    row(ItemField::RDate, "RDATE", Multiplicity::RepeatableFlat),
    row(ItemField::ExDate, "EXDATE", Multiplicity::RepeatableFlat),
    row(ItemField::Status, "STATUS", Multiplicity::Scalar),
    row(ItemField::Attendee, "ATTENDEE", Multiplicity::RepeatableFlat),
    row(ItemField::Alarms, "VALARM", Multiplicity::RepeatableSubComponent),
];

/// Task-only rows, appended after the shared table for `VTODO` items.
pub const TASK_FIELD_MAP: &[FieldMapping] = &[
    row(ItemField::Completed, "COMPLETED", Multiplicity::Scalar),
    row(
        ItemField::PercentComplete,
        "PERCENT-COMPLETE",
        Multiplicity::Scalar,
    ),
    row(ItemField::Priority, "PRIORITY", Multiplicity::Scalar),
    row(ItemField::Due, "DUE", Multiplicity::Scalar),
];

/// The applicable table for a component variant.
pub fn field_map(kind: ComponentKind) -> impl Iterator<Item = &'static FieldMapping> {
    let task_rows = match kind {
        ComponentKind::Event => &[][..],
        ComponentKind::Task => TASK_FIELD_MAP,
    };
    COMPONENT_FIELD_MAP.iter().chain(task_rows.iter())
}

/// A field value as handed to the engine by the item lookup: one variant per
/// value family, so the engine can check it against the declared multiplicity.
#[derive(Clone, Debug)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Timestamp(&'a CalDateTime),
    Int(u32),
    Url(&'a url::Url),
    Geo(GeoPoint),
    Organizer(&'a Organizer),
    TextList(&'a [String]),
    Timestamps(&'a [CalDateTime]),
    Attendees(&'a [Attendee]),
    Rules(&'a [RecurrenceRule]),
    Alarms(&'a [Alarm]),
}

impl FieldValue<'_> {
    /// The value family, for multiplicity-mismatch errors.
    pub const fn shape(&self) -> &'static str {
        match self {
            Self::Text(_)
            | Self::Timestamp(_)
            | Self::Int(_)
            | Self::Url(_)
            | Self::Geo(_)
            | Self::Organizer(_)
            | Self::TextList(_) => "scalar",
            Self::Timestamps(_) | Self::Attendees(_) => "list",
            Self::Rules(_) => "rule-list",
            Self::Alarms(_) => "subcomponent-list",
        }
    }
}

fn non_empty<T>(values: &[T]) -> Option<&[T]> {
    if values.is_empty() {
        None
    } else {
        Some(values)
    }
}

/// The typed accessor behind the tables: returns the item's value for a field,
/// or `None` when the field was not supplied (empty lists count as absent).
pub fn field_value<'a>(item: &'a Item, field: ItemField) -> Option<FieldValue<'a>> {
    match field {
        ItemField::UniqueId => item.unique_id.as_deref().map(FieldValue::Text),
        ItemField::Title => item.title.as_deref().map(FieldValue::Text),
        ItemField::Description => item.description.as_deref().map(FieldValue::Text),
        ItemField::StartDatetime => item.start_datetime.as_ref().map(FieldValue::Timestamp),
        ItemField::EndDatetime => item.end_datetime.as_ref().map(FieldValue::Timestamp),
        ItemField::UpdatedDate => item.updateddate.as_ref().map(FieldValue::Timestamp),
        ItemField::Created => item.created.as_ref().map(FieldValue::Timestamp),
        ItemField::Timestamp => item.timestamp.as_ref().map(FieldValue::Timestamp),
        ItemField::Transparency => item
            .transparency
            .map(|t| FieldValue::Text(t.as_str())),
        ItemField::Location => item.location.as_deref().map(FieldValue::Text),
        ItemField::Geolocation => item.geolocation.map(FieldValue::Geo),
        ItemField::Link => item.link.as_ref().map(FieldValue::Url),
        ItemField::Organizer => item.organizer.as_ref().map(FieldValue::Organizer),
        ItemField::Categories => non_empty(&item.categories).map(FieldValue::TextList),
        ItemField::RRule => non_empty(&item.rrule).map(FieldValue::Rules),
        ItemField::ExRule => non_empty(&item.exrule).map(FieldValue::Rules),
        ItemField::RDate => non_empty(&item.rdate).map(FieldValue::Timestamps),
        ItemField::ExDate => non_empty(&item.exdate).map(FieldValue::Timestamps),
        ItemField::Status => item.status.map(|s| FieldValue::Text(s.as_str())),
        ItemField::Attendee => non_empty(&item.attendees).map(FieldValue::Attendees),
        ItemField::Alarms => non_empty(&item.alarms).map(FieldValue::Alarms),
        ItemField::Completed => item.completed.as_ref().map(FieldValue::Timestamp),
        ItemField::PercentComplete => item.percent_complete.map(|p| FieldValue::Int(p.into())),
        ItemField::Priority => item.priority.map(|p| FieldValue::Int(p.into())),
        ItemField::Due => item.due.as_ref().map(FieldValue::Timestamp),
    }
}

/// What a table walk produces: properties to attach, plus alarm sub-components.
#[derive(Debug, Default)]
pub struct MappedFields {
    pub properties: Vec<Property>,
    pub alarms: Vec<Alarm>,
}

/// Runs the mapping table for the item's variant over the item's fields.
///
/// Fails with [`Error::UnsupportedMultiplicity`] if a table row's multiplicity
/// does not fit the shape of the value the lookup returned; given correct
/// tables this is unreachable.
pub fn map_fields(item: &Item) -> FeedResult<MappedFields> {
    let mut mapped = MappedFields::default();

    for entry in field_map(item.kind) {
        let value = match field_value(item, entry.field) {
            Some(value) => value,
            None => continue,
        };

        match (entry.multiplicity, value) {
            (Multiplicity::Scalar, FieldValue::Text(text)) => {
                mapped.properties.push(Property::new(entry.property, text));
            }
            (Multiplicity::Scalar, FieldValue::Timestamp(ts)) => {
                mapped.properties.push(ts.to_property(entry.property));
            }
            (Multiplicity::Scalar, FieldValue::Int(n)) => {
                mapped
                    .properties
                    .push(Property::new(entry.property, n.to_string()));
            }
            (Multiplicity::Scalar, FieldValue::Url(url)) => {
                mapped
                    .properties
                    .push(Property::new(entry.property, url.as_str()));
            }
            (Multiplicity::Scalar, FieldValue::Geo(geo)) => {
                mapped.properties.push(geo.to_property(entry.property));
            }
            (Multiplicity::Scalar, FieldValue::Organizer(organizer)) => {
                mapped.properties.push(organizer.to_property(entry.property));
            }
            (Multiplicity::Scalar, FieldValue::TextList(texts)) => {
                mapped
                    .properties
                    .push(Property::new(entry.property, texts.join(",")));
            }
            (Multiplicity::RepeatableFlat, FieldValue::Attendees(attendees)) => {
                for attendee in attendees {
                    mapped.properties.push(attendee.to_property(entry.property));
                }
            }
            (Multiplicity::RepeatableFlat, FieldValue::Timestamps(timestamps)) => {
                for ts in timestamps {
                    mapped.properties.push(ts.to_property(entry.property));
                }
            }
            (Multiplicity::RuleValued, FieldValue::Rules(rules)) => {
                for rule in rules {
                    mapped.properties.push(rule.to_property(entry.property));
                }
            }
            (Multiplicity::RepeatableSubComponent, FieldValue::Alarms(alarms)) => {
                mapped.alarms.extend(alarms.iter().cloned());
            }
            (multiplicity, value) => {
                return Err(Error::UnsupportedMultiplicity {
                    field: entry.field.name(),
                    multiplicity: multiplicity.as_str(),
                    shape: value.shape(),
                });
            }
        }
    }

    Ok(mapped)
}
