//! Raw backend payloads.
//!
//! Every field is optional and deserialized leniently: a value of the wrong
//! JSON type reads as missing instead of failing the whole document. The
//! mapper decides what each missing value becomes.
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// `GET /api/accounts/{accountId}` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccountPayload {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub display_name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub username: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub bio: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub avatar_url: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub email: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub timezone: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub pronouns: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub focus_roles: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient_list")]
    pub preferred_genres: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub security: Option<SecurityPayload>,
    #[serde(deserialize_with = "lenient_list")]
    pub devices: Option<Vec<DevicePayload>>,
    #[serde(deserialize_with = "lenient_list")]
    pub notifications: Option<Vec<NotificationPayload>>,
    #[serde(deserialize_with = "lenient_list")]
    pub integrations: Option<Vec<IntegrationPayload>>,
    #[serde(deserialize_with = "lenient_list")]
    pub recommendations: Option<Vec<RecommendationPayload>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SecurityPayload {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub two_factor_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub passkey_enabled: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub passkey_label: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub backup_codes_remaining: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub last_password_change: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub login_alerts: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DevicePayload {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub label: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub last_active: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub trusted: Option<bool>,
}

/// Notification preferences carry both a row `id` and a stable `key`; the
/// key is what the rest of the system addresses them by.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPayload {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub key: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub cadence: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub email: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub push: Option<bool>,
    #[serde(deserialize_with = "lenient")]
    pub sms: Option<bool>,
}

/// Integration record; also the body of connect/disconnect responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationPayload {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub service: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub plan: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub scopes: Option<Vec<String>>,
    #[serde(deserialize_with = "lenient")]
    pub connected_at: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub last_sync: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationPayload {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub confidence: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub source_service: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub signals: Option<Vec<String>>,
}

/// `POST .../recommendations/refresh` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshAck {
    pub status: String,
    pub message: String,
}

/// Reads any JSON value and keeps it only if it converts to `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Reads a JSON array, skipping elements that do not convert to `T`.
///
/// Anything other than an array reads as `None`, letting the mapper pick the
/// fallback list.
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };

    let total = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();

    if kept.len() < total {
        tracing::debug!(
            skipped = total - kept.len(),
            total,
            "Skipped malformed list elements in account payload"
        );
    }

    Ok(Some(kept))
}
