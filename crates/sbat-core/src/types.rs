//! Domain types shared across the watcher
//!
//! Wire types follow the SBAT availability API exactly (camelCase, `from`/`till`
//! timestamps as local naive strings). Only the `from` date of a [`Slot`] is
//! interpreted by the core; every other field is carried through untouched.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// A physical exam center: immutable (id, name) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Center {
    /// API-side partition id
    pub id: i64,
    /// Human-readable name, also the de-duplication label
    pub name: String,
}

impl Center {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// The five East-Flanders exam centers, in fixed query order.
    pub fn registry() -> Vec<Center> {
        vec![
            Center::new(7, "Brakel"),
            Center::new(10, "Sint-Niklaas"),
            Center::new(1, "St-Denijs"),
            Center::new(9, "Erembodegem"),
            Center::new(8, "Eeklo"),
        ]
    }
}

/// One bookable exam appointment as returned by the availability endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: i64,

    /// Start timestamp, e.g. "2024-08-30T10:15:00". The calendar-date prefix
    /// is the only part the core interprets.
    #[serde(rename = "from", default)]
    pub starts_at: Option<String>,

    /// End timestamp, passed through
    #[serde(rename = "till", default)]
    pub ends_at: Option<String>,

    #[serde(default)]
    pub exam_type: Option<String>,

    #[serde(default)]
    pub exam_center_id: Option<i64>,

    #[serde(default)]
    pub day_schedule_id: Option<i64>,

    #[serde(default)]
    pub driving_school: Option<serde_json::Value>,

    #[serde(default)]
    pub examinee: Option<serde_json::Value>,

    #[serde(default)]
    pub is_public: Option<bool>,

    #[serde(default)]
    pub types_blob: Option<String>,

    #[serde(default)]
    pub exam_types_blob: Option<String>,
}

impl Slot {
    /// Create a slot with only the fields the core interprets set.
    pub fn new(id: i64, starts_at: impl Into<String>) -> Self {
        Self {
            id,
            starts_at: Some(starts_at.into()),
            ends_at: None,
            exam_type: None,
            exam_center_id: None,
            day_schedule_id: None,
            driving_school: None,
            examinee: None,
            is_public: None,
            types_blob: None,
            exam_types_blob: None,
        }
    }

    /// Calendar date of the slot, or `None` if the `from` field is missing
    /// or malformed. Dateless slots are excluded from change detection but
    /// never fail a cycle.
    pub fn date(&self) -> Option<NaiveDate> {
        let starts_at = self.starts_at.as_deref()?;
        let prefix = starts_at.get(..10)?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    }
}

/// De-duplication unit: multiple time-of-day slots on the same date at the
/// same center collapse to one key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub center: String,
    pub date: NaiveDate,
}

impl SlotKey {
    pub fn new(center: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            center: center.into(),
            date,
        }
    }
}

/// Shared availability query template. `startDate` is deliberately absent:
/// it is recomputed for every request so a long-running process never drifts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryTemplate {
    #[serde(default = "default_license_type")]
    pub license_type: String,

    #[serde(default = "default_exam_type")]
    pub exam_type: String,

    /// Civil calendar used to compute "tomorrow". The exam authority's
    /// jurisdiction, not the host's local time.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
}

impl QueryTemplate {
    /// Build the wire payload for one center, with `startDate` computed fresh.
    pub fn query_for(&self, center_id: i64) -> SlotQuery {
        self.query_for_at(Utc::now(), center_id)
    }

    /// As [`Self::query_for`], with an explicit clock for testing.
    pub fn query_for_at(&self, now: DateTime<Utc>, center_id: i64) -> SlotQuery {
        let tomorrow = (now.with_timezone(&self.timezone) + chrono::Duration::days(1)).date_naive();
        SlotQuery {
            license_type: self.license_type.clone(),
            exam_type: self.exam_type.clone(),
            start_date: format!("{}T00:00", tomorrow.format("%Y-%m-%d")),
            exam_center_id: center_id,
        }
    }
}

impl Default for QueryTemplate {
    fn default() -> Self {
        Self {
            license_type: default_license_type(),
            exam_type: default_exam_type(),
            timezone: default_timezone(),
        }
    }
}

fn default_license_type() -> String {
    "B".to_string()
}

fn default_exam_type() -> String {
    "E2".to_string()
}

fn default_timezone() -> Tz {
    chrono_tz::Europe::Brussels
}

/// Concrete availability request body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotQuery {
    pub license_type: String,
    pub exam_type: String,
    /// `<YYYY-MM-DD>T00:00`, tomorrow on the service's civil calendar
    pub start_date: String,
    pub exam_center_id: i64,
}

/// Operator credentials for the identity endpoint
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Custom Debug implementation that hides the password
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn slot_date_truncates_to_calendar_date() {
        let slot = Slot::new(316276, "2024-08-30T10:15:00");
        assert_eq!(
            slot.date(),
            Some(NaiveDate::from_ymd_opt(2024, 8, 30).unwrap())
        );
    }

    #[test]
    fn slot_without_usable_date_yields_none() {
        let mut slot = Slot::new(1, "not-a-date");
        assert_eq!(slot.date(), None);

        slot.starts_at = None;
        assert_eq!(slot.date(), None);

        slot.starts_at = Some("2024".to_string());
        assert_eq!(slot.date(), None);
    }

    #[test]
    fn slot_deserializes_wire_format() {
        let json = r#"{
            "id": 316276,
            "typesBlob": "[\"B\"]",
            "examTypesBlob": "[\"E2\"]",
            "examType": "E2",
            "from": "2024-08-30T10:15:00",
            "till": "2024-08-30T11:10:00",
            "dayScheduleId": 135,
            "examCenterId": 7,
            "drivingSchool": null,
            "examinee": null,
            "isPublic": true
        }"#;

        let slot: Slot = serde_json::from_str(json).unwrap();
        assert_eq!(slot.id, 316276);
        assert_eq!(slot.exam_center_id, Some(7));
        assert_eq!(slot.is_public, Some(true));
        assert_eq!(
            slot.date(),
            Some(NaiveDate::from_ymd_opt(2024, 8, 30).unwrap())
        );
    }

    #[test]
    fn query_uses_brussels_civil_tomorrow() {
        let template = QueryTemplate::default();

        // 23:30 UTC on Aug 29 is already Aug 30, 01:30 in Brussels (CEST),
        // so "tomorrow" is Aug 31 even though UTC still says Aug 29.
        let now = Utc.with_ymd_and_hms(2024, 8, 29, 23, 30, 0).unwrap();
        let query = template.query_for_at(now, 7);

        assert_eq!(query.start_date, "2024-08-31T00:00");
        assert_eq!(query.exam_center_id, 7);
        assert_eq!(query.license_type, "B");
        assert_eq!(query.exam_type, "E2");
    }

    #[test]
    fn query_serializes_camel_case() {
        let template = QueryTemplate::default();
        let now = Utc.with_ymd_and_hms(2024, 8, 29, 12, 0, 0).unwrap();
        let query = template.query_for_at(now, 10);

        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "licenseType": "B",
                "examType": "E2",
                "startDate": "2024-08-30T00:00",
                "examCenterId": 10,
            })
        );
    }

    #[test]
    fn registry_has_five_fixed_centers() {
        let centers = Center::registry();
        assert_eq!(centers.len(), 5);
        assert_eq!(centers[0], Center::new(7, "Brakel"));
        assert_eq!(centers[4], Center::new(8, "Eeklo"));
    }

    #[test]
    fn password_not_exposed_in_debug() {
        let credentials = Credentials::new("user", "hunter2");
        let debug_str = format!("{:?}", credentials);
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("user"));
    }
}
