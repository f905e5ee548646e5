//! Event Document Mapper.
//!
//! Turns device events into [`IndexableDocument`]s. Every document starts
//! with the common event fields, followed by the variant's own fields:
//!
//! | Variant | Extra fields |
//! |---------|--------------|
//! | measurements | `measurement_<name>` per entry |
//! | location | `location` ("<lat>, <lon>"), `elevation` |
//! | alert | `alert_type`, `alert_message`, `alert_level`, `alert_source` |
//!
//! Mapping is pure and stateless; calls can run concurrently on independent
//! inputs. A missing required field fails the whole call and no document is
//! returned.

use crate::document::IndexableDocument;
use crate::error::{MappingError, Result};
#[cfg(feature = "telemetry")]
use crate::event::EventKind;
use crate::event::{DeviceAlert, DeviceEventFields, DeviceLocation, DeviceMeasurements};
use crate::fields;

/// Maps a measurements event: common fields, then one field per reading in
/// input order. Duplicate reading names produce duplicate fields.
pub fn map_measurements(event: &DeviceMeasurements) -> Result<IndexableDocument> {
    let mut document = IndexableDocument::new();
    map_common_fields(event, &mut document)?;
    for entry in event.measurements.iter().flatten() {
        document.add_field(fields::measurement_field(&entry.name), entry.value);
    }
    #[cfg(feature = "telemetry")]
    tracing::trace!(
        kind = %EventKind::Measurements,
        id = event.event.id.as_deref().unwrap_or_default(),
        fields = document.len(),
        "mapped device event"
    );
    Ok(document)
}

/// Maps a location event: common fields, then `location` as
/// `"<latitude>, <longitude>"` and the raw `elevation`.
pub fn map_location(event: &DeviceLocation) -> Result<IndexableDocument> {
    let latitude = require::<DeviceLocation, _>("latitude", event.latitude)?;
    let longitude = require::<DeviceLocation, _>("longitude", event.longitude)?;
    let elevation = require::<DeviceLocation, _>("elevation", event.elevation)?;

    let mut document = IndexableDocument::new();
    map_common_fields(event, &mut document)?;
    document.add_field(
        fields::LOCATION,
        format!("{}, {}", decimal(latitude), decimal(longitude)),
    );
    document.add_field(fields::ELEVATION, elevation);
    #[cfg(feature = "telemetry")]
    tracing::trace!(
        kind = %EventKind::Location,
        id = event.event.id.as_deref().unwrap_or_default(),
        fields = document.len(),
        "mapped device event"
    );
    Ok(document)
}

/// Maps an alert event: common fields, then type, message and the names of
/// the level and source enumerations.
pub fn map_alert(event: &DeviceAlert) -> Result<IndexableDocument> {
    let alert_type = require::<DeviceAlert, _>("type", event.r#type.as_deref())?;
    let message = require::<DeviceAlert, _>("message", event.message.as_deref())?;
    let level = require::<DeviceAlert, _>("level", event.level)?;
    let source = require::<DeviceAlert, _>("source", event.source)?;

    let mut document = IndexableDocument::new();
    map_common_fields(event, &mut document)?;
    document.add_field(fields::ALERT_TYPE, alert_type);
    document.add_field(fields::ALERT_MESSAGE, message);
    document.add_field(fields::ALERT_LEVEL, level.as_str());
    document.add_field(fields::ALERT_SOURCE, source.as_str());
    #[cfg(feature = "telemetry")]
    tracing::trace!(
        kind = %EventKind::Alert,
        id = event.event.id.as_deref().unwrap_or_default(),
        fields = document.len(),
        "mapped device event"
    );
    Ok(document)
}

/// Writes identifier, tokens and timestamps, then one `metadata_<name>` field
/// per metadata entry in input order. An absent metadata list adds nothing.
pub(crate) fn map_common_fields<E: DeviceEventFields>(
    event: &E,
    document: &mut IndexableDocument,
) -> Result<()> {
    let common = event.event();
    let id = require::<E, _>("id", common.id.as_deref())?;
    let assignment_token = require::<E, _>("assignment_token", common.assignment_token.as_deref())?;
    let site_token = require::<E, _>("site_token", common.site_token.as_deref())?;
    let event_date = require::<E, _>("event_date", common.event_date)?;
    let received_date = require::<E, _>("received_date", common.received_date)?;

    document.add_field(fields::EVENT_ID, id);
    document.add_field(fields::ASSIGNMENT_TOKEN, assignment_token);
    document.add_field(fields::SITE_TOKEN, site_token);
    document.add_field(fields::EVENT_DATE, event_date);
    document.add_field(fields::RECEIVED_DATE, received_date);

    for entry in common.metadata.iter().flatten() {
        document.add_field(fields::metadata_field(&entry.name), entry.value.as_str());
    }
    Ok(())
}

fn require<E: DeviceEventFields, T>(field: &'static str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| {
        #[cfg(feature = "telemetry")]
        tracing::debug!(kind = %E::KIND, field, "device event is missing a required field");
        MappingError::MissingField {
            kind: E::KIND,
            field,
        }
    })
}

/// Shortest decimal rendering that round-trips; whole numbers keep `.0`.
fn decimal(value: f64) -> String {
    format!("{value:?}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::FieldValue;
    use crate::event::{
        AlertLevel, AlertSource, DeviceEvent, EventKind, MeasurementEntry, MetadataEntry,
    };
    use time::macros::datetime;

    fn header(metadata: Option<Vec<MetadataEntry>>) -> DeviceEvent {
        DeviceEvent {
            id: Some("evt-1".into()),
            assignment_token: Some("asn-7".into()),
            site_token: Some("site-3".into()),
            event_date: Some(datetime!(2024-05-01 10:00:00 UTC)),
            received_date: Some(datetime!(2024-05-01 10:00:01 UTC)),
            metadata,
        }
    }

    fn text<'a>(doc: &'a IndexableDocument, name: &str) -> Option<&'a str> {
        doc.get(name).and_then(FieldValue::as_str)
    }

    #[test]
    fn measurements_emit_common_fields_then_readings() {
        let event = DeviceMeasurements {
            event: header(Some(vec![MetadataEntry::new("zone", "A")])),
            measurements: Some(vec![MeasurementEntry::new("temp", 21.5)]),
        };

        let doc = map_measurements(&event).expect("mapping should succeed");

        assert_eq!(
            doc.field_names().collect::<Vec<_>>(),
            vec![
                "event_id",
                "assignment_token",
                "site_token",
                "event_date",
                "received_date",
                "metadata_zone",
                "measurement_temp",
            ]
        );
        assert_eq!(text(&doc, "event_id"), Some("evt-1"));
        assert_eq!(text(&doc, "assignment_token"), Some("asn-7"));
        assert_eq!(text(&doc, "site_token"), Some("site-3"));
        assert_eq!(
            doc.get("event_date").and_then(FieldValue::as_date),
            Some(datetime!(2024-05-01 10:00:00 UTC))
        );
        assert_eq!(
            doc.get("received_date").and_then(FieldValue::as_date),
            Some(datetime!(2024-05-01 10:00:01 UTC))
        );
        assert_eq!(text(&doc, "metadata_zone"), Some("A"));
        assert_eq!(doc.get("measurement_temp").and_then(FieldValue::as_f64), Some(21.5));
    }

    #[test]
    fn duplicate_measurement_names_are_not_merged() {
        let event = DeviceMeasurements {
            event: header(None),
            measurements: Some(vec![
                MeasurementEntry::new("temp", 20.0),
                MeasurementEntry::new("rpm", 900.0),
                MeasurementEntry::new("temp", 22.0),
            ]),
        };

        let doc = map_measurements(&event).expect("mapping should succeed");

        assert_eq!(doc.len(), 5 + 3);
        let temps: Vec<f64> = doc
            .get_all("measurement_temp")
            .filter_map(FieldValue::as_f64)
            .collect();
        assert_eq!(temps, vec![20.0, 22.0]);
    }

    #[test]
    fn absent_lists_add_no_fields() {
        let event = DeviceMeasurements {
            event: header(None),
            measurements: None,
        };

        let doc = map_measurements(&event).expect("mapping should succeed");

        assert_eq!(doc.len(), 5);
        assert!(doc.field_names().all(|n| !n.starts_with(fields::META_PREFIX)));
    }

    #[test]
    fn location_is_joined_without_rounding() {
        let event = DeviceLocation {
            event: header(None),
            latitude: Some(40.0),
            longitude: Some(-75.0),
            elevation: Some(12.3),
        };

        let doc = map_location(&event).expect("mapping should succeed");

        assert_eq!(text(&doc, "location"), Some("40.0, -75.0"));
        assert_eq!(doc.get("elevation").and_then(FieldValue::as_f64), Some(12.3));
        assert_eq!(doc.len(), 7);
    }

    #[test]
    fn location_keeps_full_precision() {
        let event = DeviceLocation {
            event: header(None),
            latitude: Some(33.755_787_231_453_4),
            longitude: Some(-84.388_798_123),
            elevation: Some(0.0),
        };

        let doc = map_location(&event).expect("mapping should succeed");

        assert_eq!(
            text(&doc, "location"),
            Some("33.7557872314534, -84.388798123")
        );
    }

    #[test]
    fn alert_writes_enum_names() {
        let event = DeviceAlert {
            event: header(Some(vec![MetadataEntry::new("fw", "1.2")])),
            r#type: Some("engine.overheat".into()),
            message: Some("Engine temperature above limit".into()),
            level: Some(AlertLevel::Critical),
            source: Some(AlertSource::System),
        };

        let doc = map_alert(&event).expect("mapping should succeed");

        assert_eq!(text(&doc, "alert_type"), Some("engine.overheat"));
        assert_eq!(
            text(&doc, "alert_message"),
            Some("Engine temperature above limit")
        );
        assert_eq!(text(&doc, "alert_level"), Some("Critical"));
        assert_eq!(text(&doc, "alert_source"), Some("System"));
        assert_eq!(text(&doc, "metadata_fw"), Some("1.2"));
        assert_eq!(doc.len(), 5 + 1 + 4);
    }

    #[test]
    fn duplicate_metadata_names_produce_one_field_each() {
        let event = DeviceLocation {
            event: header(Some(vec![
                MetadataEntry::new("tag", "a"),
                MetadataEntry::new("tag", "b"),
            ])),
            latitude: Some(1.0),
            longitude: Some(2.0),
            elevation: Some(3.0),
        };

        let doc = map_location(&event).expect("mapping should succeed");

        let tags: Vec<&str> = doc
            .get_all("metadata_tag")
            .filter_map(FieldValue::as_str)
            .collect();
        assert_eq!(tags, vec!["a", "b"]);
    }

    #[test]
    fn missing_common_field_is_reported() {
        let mut common = header(None);
        common.site_token = None;
        let event = DeviceMeasurements {
            event: common,
            measurements: Some(vec![MeasurementEntry::new("temp", 1.0)]),
        };

        let err = map_measurements(&event).unwrap_err();

        assert_eq!(
            err,
            MappingError::MissingField {
                kind: EventKind::Measurements,
                field: "site_token",
            }
        );
        assert_eq!(
            err.to_string(),
            "measurements event is missing required field `site_token`"
        );
    }

    #[test]
    fn missing_variant_fields_are_reported() {
        let location = DeviceLocation {
            event: header(None),
            latitude: Some(1.0),
            longitude: None,
            elevation: Some(3.0),
        };
        assert_eq!(
            map_location(&location),
            Err(MappingError::MissingField {
                kind: EventKind::Location,
                field: "longitude",
            })
        );

        let alert = DeviceAlert {
            event: header(None),
            r#type: Some("t".into()),
            message: Some("m".into()),
            level: None,
            source: Some(AlertSource::Device),
        };
        assert_eq!(
            map_alert(&alert),
            Err(MappingError::MissingField {
                kind: EventKind::Alert,
                field: "level",
            })
        );
    }
}
