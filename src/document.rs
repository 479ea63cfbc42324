//! The logical property/component tree that a feed build produces.
//!
//! This module owns the in-memory document shape only. Turning it into RFC 5545
//! text (line folding, escaping, CRLF handling) is the job of the external
//! [`icalendar`] encoder, which [`CalendarDocument::to_ical`] hands the tree to.

use serde::{Deserialize, Serialize};

use icalendar::{Component as IcalComponent, EventLike};

/// An order-preserving parameter map (parameter name → value).
///
/// iCalendar parameter order is not semantically meaningful, but preserving
/// insertion order keeps the generated output deterministic, which matters for
/// snapshot tests. Setting an existing name overwrites its value in place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a parameter, overwriting in place if the name is already present.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut params = Params::new();
        for (n, v) in iter {
            params.set(n, v);
        }
        params
    }
}

/// One property of a component or of the document itself: a name, a value
/// already rendered to its text form, and an ordered parameter map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    name: String,
    value: String,
    params: Params,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            params: Params::new(),
        }
    }

    /// Adds a parameter, builder-style.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.set(name, value);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// A `VALARM` sub-component: an ordered bag of properties, attached to a parent
/// [`Component`] and never to the document directly.
///
/// This is also the shape callers supply alarms in. The assembler copies the
/// bag verbatim, there is no field-mapping indirection for alarms.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alarm {
    properties: Vec<Property>,
}

impl Alarm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a name/value property, builder-style.
    pub fn property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.push(Property::new(name, value));
        self
    }

    pub fn push(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }
}

/// The component variant: an event (`VEVENT`) or a to-do task (`VTODO`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentKind {
    #[default]
    Event,
    Task,
}

impl ComponentKind {
    /// Returns the iCalendar component name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "VEVENT",
            Self::Task => "VTODO",
        }
    }
}

/// One calendar entry within a document.
///
/// A component holds its mapped properties in insertion order, plus any alarm
/// sub-components. A component with no properties at all is valid output.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    kind: ComponentKind,
    properties: Vec<Property>,
    alarms: Vec<Alarm>,
}

impl Component {
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
            alarms: Vec::new(),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn push_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn add_alarm(&mut self, alarm: Alarm) {
        self.alarms.push(alarm);
    }

    /// Returns the first property with the given name, if any.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns every property with the given name, in insertion order.
    pub fn properties_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Property> {
        self.properties.iter().filter(move |p| p.name == name)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn alarms(&self) -> &[Alarm] {
        &self.alarms
    }
}

/// The root container: document-level properties and an ordered component
/// sequence. Input order is output order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDocument {
    properties: Vec<Property>,
    components: Vec<Component>,
}

impl CalendarDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn push_component(&mut self, component: Component) {
        self.components.push(component);
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Serializes the document through the external `icalendar` encoder.
    ///
    /// `VERSION:2.0` and `CALSCALE:GREGORIAN` are fixed by the encoder; every
    /// other line comes from this tree.
    pub fn to_ical(&self) -> String {
        let mut cal = icalendar::Calendar::new();

        for prop in &self.properties {
            cal.append_property(to_ical_property(prop));
        }

        for component in &self.components {
            match component.kind {
                ComponentKind::Event => {
                    let mut event = icalendar::Event::new();
                    fill_component(&mut event, component);
                    cal.push(event.done());
                }
                ComponentKind::Task => {
                    let mut todo = icalendar::Todo::new();
                    fill_component(&mut todo, component);
                    cal.push(todo.done());
                }
            }
        }

        self.tidy_output(&cal.done().to_string())
    }

    /// Clean up the encoder's output:
    /// - drop the crate's fabricated default `PRODID`; the document's own
    ///   `PRODID` property, when supplied, is the only one that may appear,
    /// - drop the `UID` and `DTSTAMP` lines the encoder fabricates for
    ///   components that do not carry them, so absent fields stay absent and
    ///   alarm bags stay exactly what the caller supplied.
    fn tidy_output(&self, ics: &str) -> String {
        let mut result = String::with_capacity(ics.len());
        let mut components = self.components.iter();
        let mut current: Option<&Component> = None;
        let mut in_valarm = false;

        for line in ics.lines() {
            if line.starts_with("PRODID:ICALENDAR-RS") {
                continue;
            }

            match line {
                "BEGIN:VEVENT" | "BEGIN:VTODO" => current = components.next(),
                "END:VEVENT" | "END:VTODO" => current = None,
                "BEGIN:VALARM" => in_valarm = true,
                "END:VALARM" => in_valarm = false,
                _ => {}
            }

            let fabricated = if in_valarm {
                line.starts_with("UID:") || line.starts_with("DTSTAMP:")
            } else if let Some(component) = current {
                (line.starts_with("UID:") && component.property("UID").is_none())
                    || (line.starts_with("DTSTAMP:") && component.property("DTSTAMP").is_none())
            } else {
                false
            };
            if fabricated {
                continue;
            }

            result.push_str(line);
            result.push_str("\r\n");
        }

        result
    }
}

fn to_ical_property(property: &Property) -> icalendar::Property {
    let mut out = icalendar::Property::new(property.name(), property.value());
    for (name, value) in property.params.iter() {
        out.add_parameter(name, value);
    }
    out
}

fn fill_component<C: IcalComponent + EventLike>(target: &mut C, component: &Component) {
    // Repeated names (ATTENDEE, RRULE, RDATE...) go through the multi-property
    // path, which keeps every occurrence in insertion order. UID and DTSTAMP
    // must sit in the encoder's singular map instead, since that map is what
    // it consults before fabricating default values for them.
    for prop in &component.properties {
        match prop.name() {
            "UID" | "DTSTAMP" => {
                target.append_property(to_ical_property(prop));
            }
            _ => {
                target.append_multi_property(to_ical_property(prop));
            }
        }
    }
    for alarm in &component.alarms {
        // The encoder only exposes alarm construction through the action
        // shorthands. Seed one and clear the seeded properties, then append
        // the caller's bag untouched.
        let mut out = icalendar::Alarm::audio(chrono::Duration::zero());
        out.remove_property("ACTION");
        out.remove_property("TRIGGER");
        for prop in alarm.properties() {
            out.append_multi_property(to_ical_property(prop));
        }
        target.alarm(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_keep_insertion_order() {
        let mut params = Params::new();
        params.set("ROLE", "CHAIR");
        params.set("CN", "Ada");
        params.set("RSVP", "TRUE");

        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["ROLE", "CN", "RSVP"]);
    }

    #[test]
    fn params_set_overwrites_in_place() {
        let mut params = Params::new();
        params.set("ROLE", "REQ-PARTICIPANT");
        params.set("RSVP", "TRUE");
        params.set("ROLE", "CHAIR");

        assert_eq!(params.get("ROLE"), Some("CHAIR"));
        let names: Vec<&str> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["ROLE", "RSVP"]);
    }

    #[test]
    fn empty_component_is_valid() {
        let mut doc = CalendarDocument::new();
        doc.push_component(Component::new(ComponentKind::Event));

        assert_eq!(doc.components().len(), 1);
        assert!(doc.components()[0].properties().is_empty());

        let ics = doc.to_ical();
        assert!(ics.contains("BEGIN:VEVENT"));
        assert!(ics.contains("END:VEVENT"));
        // no fabricated placeholders for fields that were never supplied
        assert!(!ics.contains("UID:"));
        assert!(!ics.contains("DTSTAMP:"));
    }

    #[test]
    fn document_keeps_component_order() {
        let mut doc = CalendarDocument::new();
        for uid in ["first", "second", "third"] {
            let mut component = Component::new(ComponentKind::Event);
            component.push_property(Property::new("UID", uid));
            doc.push_component(component);
        }

        let uids: Vec<&str> = doc
            .components()
            .iter()
            .map(|c| c.property("UID").unwrap().value())
            .collect();
        assert_eq!(uids, ["first", "second", "third"]);

        let ics = doc.to_ical();
        let first = ics.find("UID:first").unwrap();
        let second = ics.find("UID:second").unwrap();
        let third = ics.find("UID:third").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn alarm_lines_stay_verbatim() {
        let mut component = Component::new(ComponentKind::Event);
        component.add_alarm(
            Alarm::new()
                .property("ACTION", "DISPLAY")
                .property("TRIGGER", "-PT30M")
                .property("DESCRIPTION", "Reminder"),
        );
        let mut doc = CalendarDocument::new();
        doc.push_component(component);

        let ics = doc.to_ical();
        let valarm: &str = ics
            .split("BEGIN:VALARM")
            .nth(1)
            .unwrap()
            .split("END:VALARM")
            .next()
            .unwrap();
        // the supplied bag, nothing more, nothing less
        let lines: Vec<&str> = valarm.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(
            lines,
            ["ACTION:DISPLAY", "TRIGGER:-PT30M", "DESCRIPTION:Reminder"]
        );
    }

    #[test]
    fn fabricated_prodid_is_stripped() {
        let mut doc = CalendarDocument::new();
        doc.push_component(Component::new(ComponentKind::Event));
        assert!(!doc.to_ical().contains("PRODID"));

        let mut doc = CalendarDocument::new();
        doc.push_property(Property::new("PRODID", "-//Tests//EN"));
        let ics = doc.to_ical();
        assert!(ics.contains("PRODID:-//Tests//EN"));
        assert_eq!(ics.matches("PRODID").count(), 1);
    }
}
