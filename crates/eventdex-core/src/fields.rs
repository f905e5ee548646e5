//! Field names written into indexable documents.
//!
//! These names are the contract with the index schema and must match it
//! byte for byte.

pub const EVENT_ID: &str = "event_id";
pub const ASSIGNMENT_TOKEN: &str = "assignment_token";
pub const SITE_TOKEN: &str = "site_token";
pub const EVENT_DATE: &str = "event_date";
pub const RECEIVED_DATE: &str = "received_date";

pub const LOCATION: &str = "location";
pub const ELEVATION: &str = "elevation";

pub const ALERT_TYPE: &str = "alert_type";
pub const ALERT_MESSAGE: &str = "alert_message";
pub const ALERT_LEVEL: &str = "alert_level";
pub const ALERT_SOURCE: &str = "alert_source";

/// Prepended to the name of every metadata entry.
pub const META_PREFIX: &str = "metadata_";
/// Prepended to the name of every measurement entry.
pub const MEASUREMENT_PREFIX: &str = "measurement_";

/// Field name for a metadata entry called `name`.
#[must_use]
pub fn metadata_field(name: &str) -> String {
    format!("{META_PREFIX}{name}")
}

/// Field name for a measurement entry called `name`.
#[must_use]
pub fn measurement_field(name: &str) -> String {
    format!("{MEASUREMENT_PREFIX}{name}")
}
