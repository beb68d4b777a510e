//! Monitor snapshot records and the store key namespace.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key of the singleton overall-activity snapshot.
pub const OVERALL_KEY: &str = "mal-overall";

/// Prefix of per-title snapshot keys.
pub const ANIME_KEY_PREFIX: &str = "anime-";

/// Store key for a monitored anime id, taken as-is from the request path.
pub fn anime_key(anime_id: &str) -> String {
    format!("{}{}", ANIME_KEY_PREFIX, anime_id)
}

/// ISO-8601 timestamp with millisecond precision, e.g. `2024-02-15T10:00:00.000Z`.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body accepted by `POST /api/sync`.
///
/// Only a JSON object is accepted. Field values are never type-checked, and unknown fields
/// are dropped when the snapshot is built.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SyncRequest {
    body: Map<String, Value>,
}

impl From<Map<String, Value>> for SyncRequest {
    fn from(body: Map<String, Value>) -> Self {
        Self { body }
    }
}

impl SyncRequest {
    /// Store key this request writes to; `mal-overall` unless `key` is a non-empty string
    /// or a non-zero number.
    pub fn target_key(&self) -> String {
        match self.body.get("key").filter(|key| is_truthy(key)) {
            Some(Value::String(key)) => key.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => OVERALL_KEY.to_string(),
        }
    }

    /// Build the full replacement snapshot, stamping `now` when no timestamp was sent.
    pub fn into_snapshot(mut self, now: DateTime<Utc>) -> MonitorSnapshot {
        let mut take = |field: &str| self.body.remove(field).filter(|value| !value.is_null());

        let last_updated = take("lastUpdated")
            .filter(is_truthy)
            .unwrap_or_else(|| Value::String(timestamp(now)));

        MonitorSnapshot {
            monitor_name: take("monitorName"),
            anime_id: take("animeId"),
            anime_name: take("animeName"),
            activity_level: take("activityLevel"),
            weebcast_status: take("weebcastStatus"),
            metrics: take("metrics"),
            trending_anime: take("trendingAnime"),
            seasonal_anime: take("seasonalAnime"),
            current_season: take("currentSeason"),
            last_updated,
        }
    }
}

/// Persisted snapshot for the overall site or one monitored title.
///
/// Every field is opaque and stored exactly as the producer sent it; absent and `null`
/// fields are left out of the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitor_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anime_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anime_name: Option<Value>,
    /// Label such as "High"; producers may send other shapes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weebcast_status: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trending_anime: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_anime: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_season: Option<Value>,
    /// When the producer observed this state, usually an ISO-8601 string.
    pub last_updated: Value,
}

/// Body served by `/api/activity` before any overall snapshot exists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPlaceholder {
    pub activity_level: &'static str,
    pub weebcast_status: &'static str,
    pub last_updated: Option<String>,
}

impl Default for ActivityPlaceholder {
    fn default() -> Self {
        Self {
            activity_level: "Unknown",
            weebcast_status: "No data available yet",
            last_updated: None,
        }
    }
}

/// Field of a stored snapshot, or `None` when it is missing or holds an empty-ish scalar
/// (`null`, `false`, `0`, `""`). Lists and objects always count, even when empty.
pub fn present_field<'a>(snapshot: &'a Value, field: &str) -> Option<&'a Value> {
    snapshot.get(field).filter(|value| is_truthy(value))
}

/// `false` for `null`, `false`, `0` and `""`; everything else, empty lists included, is set.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
