//! Core record types for formrelay.
//!
//! A [`Record`] is the decoded content of one submitted form. An [`Entry`]
//! pairs a record with the timestamp under which it is stored.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Format of entry timestamps: local time with microsecond precision.
///
/// Fixed width, so lexicographic order of keys is chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Decoded form fields from one submission, in the order they were sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, String>);

impl Record {
    /// Create an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value under the same name.
    ///
    /// A replaced field keeps its original position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Look up a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the record has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

/// A record keyed by the moment it was decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Timestamp key, formatted with [`TIMESTAMP_FORMAT`].
    pub timestamp: String,

    /// The decoded form fields.
    pub record: Record,
}

impl Entry {
    /// Create an entry stamped with the current local time.
    #[must_use]
    pub fn now(record: Record) -> Self {
        Self::at(Local::now(), record)
    }

    /// Create an entry stamped with the given time.
    #[must_use]
    pub fn at(time: DateTime<Local>, record: Record) -> Self {
        Self::new(format_timestamp(time), record)
    }

    /// Create an entry with an explicit timestamp key.
    #[must_use]
    pub fn new(timestamp: impl Into<String>, record: Record) -> Self {
        Self {
            timestamp: timestamp.into(),
            record,
        }
    }
}

/// Format a time as an entry key.
#[must_use]
pub fn format_timestamp(time: DateTime<Local>) -> String {
    time.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_insert_and_get() {
        let mut record = Record::new();
        record.insert("name", "Ann");

        assert_eq!(record.get("name"), Some("Ann"));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_record_insert_overwrites() {
        let mut record = Record::new();
        record.insert("a", "1");
        record.insert("a", "2");

        assert_eq!(record.get("a"), Some("2"));
        assert_eq!(record.len(), 1);
    }

    #[test]
    fn test_record_is_empty() {
        assert!(Record::new().is_empty());
        let record: Record = [("k", "v")].into_iter().collect();
        assert!(!record.is_empty());
    }

    #[test]
    fn test_record_serializes_as_plain_object() {
        let record: Record = [("b", "2"), ("a", "1")].into_iter().collect();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json, serde_json::json!({"a": "1", "b": "2"}));
    }

    #[test]
    fn test_record_keeps_submission_order() {
        let record: Record = [("username", "Ann"), ("message", "Hi")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"username":"Ann","message":"Hi"}"#
        );
    }

    #[test]
    fn test_record_overwrite_keeps_position() {
        let record: Record = [("a", "1"), ("b", "2"), ("a", "3")].into_iter().collect();
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"a":"3","b":"2"}"#
        );
    }

    #[test]
    fn test_format_timestamp() {
        let time = Local
            .with_ymd_and_hms(2024, 1, 15, 10, 30, 45)
            .unwrap()
            + chrono::Duration::microseconds(123_456);
        assert_eq!(format_timestamp(time), "2024-01-15 10:30:45.123456");
    }

    #[test]
    fn test_format_timestamp_keeps_zero_micros() {
        let time = Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 45).unwrap();
        assert_eq!(format_timestamp(time), "2024-01-15 10:30:45.000000");
    }

    #[test]
    fn test_entry_now_has_fixed_width_key() {
        let entry = Entry::now(Record::new());
        assert_eq!(entry.timestamp.len(), "2024-01-15 10:30:45.123456".len());
    }

    #[test]
    fn test_entry_new() {
        let record: Record = [("a", "1")].into_iter().collect();
        let entry = Entry::new("T1", record.clone());
        assert_eq!(entry.timestamp, "T1");
        assert_eq!(entry.record, record);
    }
}
