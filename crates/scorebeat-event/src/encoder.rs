//! Result document encoding
//!
//! One event is published to three date-partitioned indexes:
//! - `results-admin-YYYY.MM.DD`: full document for administrators
//! - `results-<group>-YYYY.MM.DD`: full document for the owning group
//! - `results-all-YYYY.MM.DD`: reduced document for the public scoreboard
//!
//! Every document carries the timestamp both as RFC 3339 text and as Unix
//! epoch seconds, and `passed` both as a bool and as 0/1, so dashboards can
//! aggregate numerically.

use crate::event::Event;
use chrono::{Datelike, SecondsFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Date layout used in index names (Elastic "index-YYYY.MM.DD" convention)
pub const INDEX_DATE_FORMAT: &str = "%Y.%m.%d";

/// Why an event could not be encoded
///
/// Unlike probe failures these are always returned to the caller: a
/// malformed document must not be shipped.
#[derive(Error, Debug)]
pub enum EncodingError {
    #[error("failed to format timestamp as string: year {year} is outside 0..=9999")]
    Timestamp { year: i32 },

    #[error("failed to marshal event to JSON: score_weight {0} is not a finite number")]
    NonFiniteScoreWeight(f64),

    #[error("failed to marshal event to JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fields shared by every audience
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericDocument {
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub check_type: String,
    pub group: String,
    pub score_weight: f64,
    pub passed: bool,
    pub passed_int: u8,
    pub epoch: i64,
}

/// Generic fields plus the failure message and details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullDocument {
    #[serde(flatten)]
    pub common: GenericDocument,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

/// A document and the index it belongs in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    pub index: String,
    pub body: Vec<u8>,
}

/// Full document for the admin index
pub fn admin(e: &Event) -> Result<EncodedDocument, EncodingError> {
    let body = serde_json::to_vec(&full_document(e)?)?;
    Ok(EncodedDocument {
        index: format!("results-admin-{}", index_date(e)),
        body,
    })
}

/// Full document for the owning group's index
// TODO: drop message/details here if groups should only see the generic fields
pub fn team(e: &Event) -> Result<EncodedDocument, EncodingError> {
    let doc = admin(e)?;
    Ok(EncodedDocument {
        index: format!("results-{}-{}", e.group, index_date(e)),
        body: doc.body,
    })
}

/// Reduced document for the shared scoreboard index
pub fn generic(e: &Event) -> Result<EncodedDocument, EncodingError> {
    let body = serde_json::to_vec(&generic_document(e)?)?;
    Ok(EncodedDocument {
        index: format!("results-all-{}", index_date(e)),
        body,
    })
}

/// Encode an event for every audience, in admin, team, generic order
pub fn encode_all(e: &Event) -> Result<[EncodedDocument; 3], EncodingError> {
    Ok([admin(e)?, team(e)?, generic(e)?])
}

fn generic_document(e: &Event) -> Result<GenericDocument, EncodingError> {
    if !e.score_weight.is_finite() {
        return Err(EncodingError::NonFiniteScoreWeight(e.score_weight));
    }

    Ok(GenericDocument {
        timestamp: timestamp_text(e)?,
        id: e.id.clone(),
        name: e.name.clone(),
        check_type: e.check_type.clone(),
        group: e.group.clone(),
        score_weight: e.score_weight,
        passed: e.passed,
        passed_int: u8::from(e.passed),
        epoch: e.timestamp.timestamp(),
    })
}

fn full_document(e: &Event) -> Result<FullDocument, EncodingError> {
    Ok(FullDocument {
        common: generic_document(e)?,
        message: e.message.clone(),
        details: e
            .details
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    })
}

/// RFC 3339 text with trailing fraction zeros trimmed; only four-digit years
/// are representable
fn timestamp_text(e: &Event) -> Result<String, EncodingError> {
    let year = e.timestamp.year();
    if !(0..=9999).contains(&year) {
        return Err(EncodingError::Timestamp { year });
    }

    let text = e.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let Some((seconds, fraction)) = text.strip_suffix('Z').and_then(|t| t.split_once('.'))
    else {
        return Ok(text);
    };
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        Ok(format!("{}Z", seconds))
    } else {
        Ok(format!("{}.{}Z", seconds, fraction))
    }
}

fn index_date(e: &Event) -> String {
    e.timestamp.format(INDEX_DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::Value;
    use std::collections::HashMap;

    fn event_at(timestamp: DateTime<Utc>, passed: bool) -> Event {
        let mut details = HashMap::new();
        details.insert(String::from("expected"), String::from("pong"));
        details.insert(String::from("received"), String::from("pang"));

        Event {
            timestamp,
            id: String::from("web01-tcp-blue1"),
            name: String::from("Web01 TCP"),
            check_type: String::from("tcp"),
            group: String::from("blue1"),
            score_weight: 1.5,
            passed,
            message: String::from("Incorrect data received"),
            details,
        }
    }

    fn may_14() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 14, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_index_names() {
        let event = event_at(may_14(), true);

        assert_eq!(admin(&event).unwrap().index, "results-admin-2020.05.14");
        assert_eq!(team(&event).unwrap().index, "results-blue1-2020.05.14");
        assert_eq!(generic(&event).unwrap().index, "results-all-2020.05.14");
    }

    #[test]
    fn test_distinct_dates_give_distinct_indexes() {
        let today = event_at(may_14(), true);
        let tomorrow = event_at(Utc.with_ymd_and_hms(2020, 5, 15, 0, 0, 0).unwrap(), true);
        let later_today = event_at(Utc.with_ymd_and_hms(2020, 5, 14, 23, 59, 59).unwrap(), false);

        assert_ne!(admin(&today).unwrap().index, admin(&tomorrow).unwrap().index);
        assert_eq!(team(&today).unwrap().index, team(&later_today).unwrap().index);
    }

    #[test]
    fn test_admin_document_fields() {
        let event = event_at(may_14(), false);
        let doc: Value = serde_json::from_slice(&admin(&event).unwrap().body).unwrap();

        assert_eq!(doc["@timestamp"], "2020-05-14T10:00:00Z");
        assert_eq!(doc["id"], "web01-tcp-blue1");
        assert_eq!(doc["name"], "Web01 TCP");
        assert_eq!(doc["type"], "tcp");
        assert_eq!(doc["group"], "blue1");
        assert_eq!(doc["score_weight"], 1.5);
        assert_eq!(doc["passed"], false);
        assert_eq!(doc["passed_int"], 0);
        assert_eq!(doc["epoch"], 1589450400);
        assert_eq!(doc["message"], "Incorrect data received");
        assert_eq!(doc["details"]["received"], "pang");
    }

    #[test]
    fn test_team_body_matches_admin() {
        let event = event_at(may_14(), false);
        assert_eq!(team(&event).unwrap().body, admin(&event).unwrap().body);
    }

    #[test]
    fn test_generic_differs_only_in_message_and_details() {
        let event = event_at(may_14(), true);

        let mut full: Value = serde_json::from_slice(&admin(&event).unwrap().body).unwrap();
        let reduced: Value = serde_json::from_slice(&generic(&event).unwrap().body).unwrap();

        assert!(reduced.get("message").is_none());
        assert!(reduced.get("details").is_none());

        let full = full.as_object_mut().unwrap();
        full.remove("message");
        full.remove("details");
        assert_eq!(&Value::Object(full.clone()), &reduced);
    }

    #[test]
    fn test_generic_round_trip() {
        for passed in [true, false] {
            let event = event_at(may_14(), passed);
            let doc: GenericDocument =
                serde_json::from_slice(&generic(&event).unwrap().body).unwrap();

            assert_eq!(doc.epoch, event.timestamp.timestamp());
            assert_eq!(doc.passed, passed);
            assert_eq!(doc.passed_int == 1, passed);
        }
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let event = event_at(may_14(), false);
        let copy = event.clone();
        assert_eq!(encode_all(&event).unwrap(), encode_all(&copy).unwrap());
    }

    #[test]
    fn test_subsecond_timestamp() {
        let ts = may_14() + chrono::Duration::milliseconds(250);
        let doc: Value = serde_json::from_slice(&generic(&event_at(ts, true)).unwrap().body).unwrap();
        assert_eq!(doc["@timestamp"], "2020-05-14T10:00:00.25Z");
        assert_eq!(doc["epoch"], 1589450400);

        let ts = may_14() + chrono::Duration::nanoseconds(1_000_500);
        let doc: Value = serde_json::from_slice(&admin(&event_at(ts, true)).unwrap().body).unwrap();
        assert_eq!(doc["@timestamp"], "2020-05-14T10:00:00.0010005Z");

        let doc: Value =
            serde_json::from_slice(&admin(&event_at(may_14(), true)).unwrap().body).unwrap();
        assert_eq!(doc["@timestamp"], "2020-05-14T10:00:00Z");
    }

    #[test]
    fn test_year_out_of_range_fails() {
        let event = event_at(Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap(), true);

        assert!(matches!(
            admin(&event),
            Err(EncodingError::Timestamp { year: 10000 })
        ));
        assert!(team(&event).is_err());
        assert!(generic(&event).is_err());
    }

    #[test]
    fn test_non_finite_score_weight_fails() {
        let mut event = event_at(may_14(), true);
        event.score_weight = f64::NAN;

        let err = generic(&event).unwrap_err();
        assert!(matches!(err, EncodingError::NonFiniteScoreWeight(_)));
        assert!(encode_all(&event).is_err());
    }
}
