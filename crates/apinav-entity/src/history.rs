//! Request history entries and the saved API list.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use apinav_core::types::id::HistoryId;

/// Group label for entries sent on the current day.
pub const TODAY: &str = "Today";
/// Group label for entries sent on the previous day.
pub const YESTERDAY: &str = "Yesterday";
/// Group label for entries without a timestamp.
pub const UNDATED: &str = "Undated";

/// One sent request. The history list is kept newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    /// Entry identifier.
    pub id: HistoryId,
    /// HTTP method.
    #[serde(default)]
    pub method: String,
    /// Target URL.
    #[serde(default)]
    pub url: String,
    /// When the request was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Everything else the sender recorded (headers, body, auth…).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HistoryEntry {
    /// Create an entry stamped at `timestamp`.
    pub fn new(
        id: HistoryId,
        method: impl Into<String>,
        url: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            method: method.into(),
            url: url.into(),
            timestamp: Some(timestamp),
            extra: Map::new(),
        }
    }

    /// Day label relative to `now`: `Today`, `Yesterday`, `Mar 4`, or
    /// `Mar 4, 2023` for other years. Dates are taken in `now`'s time zone.
    pub fn day_label<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> String {
        let Some(timestamp) = self.timestamp else {
            return UNDATED.to_string();
        };
        let today = now.date_naive();
        let day = timestamp.with_timezone(&now.timezone()).date_naive();
        if day == today {
            TODAY.to_string()
        } else if today.pred_opt() == Some(day) {
            YESTERDAY.to_string()
        } else if day.year() == today.year() {
            day.format("%b %-d").to_string()
        } else {
            day.format("%b %-d, %Y").to_string()
        }
    }
}

/// History entries sharing a day label, in list order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryGroup {
    /// Day label.
    pub label: String,
    /// Entries of that day.
    pub entries: Vec<HistoryEntry>,
}

/// Group `entries` by [`HistoryEntry::day_label`]. Groups appear in the
/// order their first entry does.
pub fn group_by_day<Tz: TimeZone>(entries: &[HistoryEntry], now: &DateTime<Tz>) -> Vec<HistoryGroup> {
    let mut groups: Vec<HistoryGroup> = Vec::new();
    for entry in entries {
        let label = entry.day_label(now);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => group.entries.push(entry.clone()),
            None => groups.push(HistoryGroup {
                label,
                entries: vec![entry.clone()],
            }),
        }
    }
    groups
}

/// A named API with a version tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEntry {
    /// API name.
    pub name: String,
    /// Version tag.
    #[serde(default = "default_api_version")]
    pub version: String,
}

/// Version given to an API added without one.
pub fn default_api_version() -> String {
    "v1.0".to_string()
}
