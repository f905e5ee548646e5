#![warn(clippy::unwrap_used, clippy::expect_used)]

//! Maps device events (measurements, locations, alerts) to flat documents
//! for a search index.
//!
//! ```
//! use eventdex_core::{map_location, DeviceEvent, DeviceLocation};
//! use time::OffsetDateTime;
//!
//! let now = OffsetDateTime::now_utc();
//! let event = DeviceLocation {
//!     event: DeviceEvent {
//!         id: Some("evt-1".into()),
//!         assignment_token: Some("asn-1".into()),
//!         site_token: Some("site-1".into()),
//!         event_date: Some(now),
//!         received_date: Some(now),
//!         metadata: None,
//!     },
//!     latitude: Some(40.0),
//!     longitude: Some(-75.0),
//!     elevation: Some(12.3),
//! };
//!
//! let doc = map_location(&event)?;
//! assert_eq!(doc.get("location").and_then(|v| v.as_str()), Some("40.0, -75.0"));
//! # Ok::<(), eventdex_core::MappingError>(())
//! ```

pub mod document;
mod error;
pub mod event;
pub mod fields;
mod mapper;

pub use document::{FieldValue, IndexField, IndexableDocument};
pub use error::{MappingError, Result};
pub use event::{
    AlertLevel, AlertSource, AnyDeviceEvent, DeviceAlert, DeviceEvent, DeviceEventFields,
    DeviceLocation, DeviceMeasurements, EventKind, MeasurementEntry, MetadataEntry,
    ParseVariantError,
};
pub use mapper::{map_alert, map_location, map_measurements};
