//! Device events that are turned into indexable documents.
//!
//! Every event carries the common [`DeviceEvent`] header (identifier, tokens,
//! timestamps and metadata) and one of three payloads: measurements, a
//! location fix or an alert. [`AnyDeviceEvent`] is the tagged form used when
//! events arrive as JSON, e.g. one per line from an ingestion pipeline.
//!
//! Scalar fields are optional on purpose: the input may omit them, and the
//! mapper reports a missing required field as a
//! [`MappingError`](crate::MappingError) instead of failing at parse time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

use crate::document::IndexableDocument;
use crate::mapper;

/// Fields shared by every kind of device event.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceEvent {
    /// Unique identifier of the event.
    pub id: Option<String>,
    /// Token of the device assignment that produced the event.
    pub assignment_token: Option<String>,
    /// Token of the site the assignment belongs to.
    pub site_token: Option<String>,
    /// When the event happened on the device.
    #[serde(default, with = "time::serde::iso8601::option")]
    pub event_date: Option<OffsetDateTime>,
    /// When the event reached the system.
    #[serde(default, with = "time::serde::iso8601::option")]
    pub received_date: Option<OffsetDateTime>,
    /// Free-form annotations. Names are not required to be unique.
    pub metadata: Option<Vec<MetadataEntry>>,
}

/// A name/value annotation attached to an event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MetadataEntry {
    pub name: String,
    pub value: String,
}

impl MetadataEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A named numeric sensor reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MeasurementEntry {
    pub name: String,
    pub value: f64,
}

impl MeasurementEntry {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A batch of sensor readings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceMeasurements {
    #[serde(flatten)]
    pub event: DeviceEvent,
    /// Readings in the order the device reported them.
    pub measurements: Option<Vec<MeasurementEntry>>,
}

/// A location fix.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceLocation {
    #[serde(flatten)]
    pub event: DeviceEvent,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub elevation: Option<f64>,
}

/// An alert raised by a device or by the system on its behalf.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeviceAlert {
    #[serde(flatten)]
    pub event: DeviceEvent,
    /// Alert category, e.g. "engine.overheat".
    /// Raw identifier so that code and JSON name match 1:1.
    pub r#type: Option<String>,
    /// Human readable alert text.
    pub message: Option<String>,
    pub level: Option<AlertLevel>,
    pub source: Option<AlertSource>,
}

/// Severity of a [`DeviceAlert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Info,
    Warning,
    Error,
    Critical,
}

impl AlertLevel {
    /// Enumeration name as written to the index.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "Info",
            Self::Warning => "Warning",
            Self::Error => "Error",
            Self::Critical => "Critical",
        }
    }
}

/// Originator of a [`DeviceAlert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertSource {
    /// Raised by the device itself.
    Device,
    /// Raised by server-side processing.
    System,
}

impl AlertSource {
    /// Enumeration name as written to the index.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Device => "Device",
            Self::System => "System",
        }
    }
}

/// The three kinds of device events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Measurements,
    Location,
    Alert,
}

impl EventKind {
    /// Canonical lowercase label, matching the `event_type` JSON tag.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Measurements => "measurements",
            Self::Location => "location",
            Self::Alert => "alert",
        }
    }
}

macro_rules! display_and_parse {
    ($ty:ident, $label:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ParseVariantError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s == $ty::$variant.as_str() {
                        return Ok($ty::$variant);
                    }
                )+
                Err(ParseVariantError {
                    what: $label,
                    value: s.to_string(),
                })
            }
        }
    };
}

display_and_parse!(AlertLevel, "alert level", [Info, Warning, Error, Critical]);
display_and_parse!(AlertSource, "alert source", [Device, System]);
display_and_parse!(EventKind, "event kind", [Measurements, Location, Alert]);

/// Error returned when parsing an unknown enumeration name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseVariantError {
    what: &'static str,
    value: String,
}

impl fmt::Display for ParseVariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.what, self.value)
    }
}

impl std::error::Error for ParseVariantError {}

/// Access to the common header of an event variant.
///
/// The common-field mapping is written once against this trait and reused by
/// every variant.
pub trait DeviceEventFields {
    /// Kind reported in mapping errors.
    const KIND: EventKind;

    fn event(&self) -> &DeviceEvent;
}

impl DeviceEventFields for DeviceMeasurements {
    const KIND: EventKind = EventKind::Measurements;

    fn event(&self) -> &DeviceEvent {
        &self.event
    }
}

impl DeviceEventFields for DeviceLocation {
    const KIND: EventKind = EventKind::Location;

    fn event(&self) -> &DeviceEvent {
        &self.event
    }
}

impl DeviceEventFields for DeviceAlert {
    const KIND: EventKind = EventKind::Alert;

    fn event(&self) -> &DeviceEvent {
        &self.event
    }
}

/// Any device event, tagged by `event_type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event_type", rename_all = "lowercase")]
pub enum AnyDeviceEvent {
    Measurements(DeviceMeasurements),
    Location(DeviceLocation),
    Alert(DeviceAlert),
}

impl AnyDeviceEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Measurements(_) => EventKind::Measurements,
            Self::Location(_) => EventKind::Location,
            Self::Alert(_) => EventKind::Alert,
        }
    }

    /// The common header, whatever the variant.
    pub fn event(&self) -> &DeviceEvent {
        match self {
            Self::Measurements(e) => e.event(),
            Self::Location(e) => e.event(),
            Self::Alert(e) => e.event(),
        }
    }

    /// Maps the event with the operation matching its variant.
    pub fn to_document(&self) -> crate::Result<IndexableDocument> {
        match self {
            Self::Measurements(e) => mapper::map_measurements(e),
            Self::Location(e) => mapper::map_location(e),
            Self::Alert(e) => mapper::map_alert(e),
        }
    }
}

impl From<DeviceMeasurements> for AnyDeviceEvent {
    fn from(e: DeviceMeasurements) -> Self {
        Self::Measurements(e)
    }
}

impl From<DeviceLocation> for AnyDeviceEvent {
    fn from(e: DeviceLocation) -> Self {
        Self::Location(e)
    }
}

impl From<DeviceAlert> for AnyDeviceEvent {
    fn from(e: DeviceAlert) -> Self {
        Self::Alert(e)
    }
}
