use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Account Snapshot
// ============================================================================

/// Canonical account snapshot held by the store.
///
/// Replaced wholesale on every applied reload. Local mutators edit a copy and
/// publish it as a new snapshot, so readers always see a consistent value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountState {
    pub profile: Profile,
    pub security: SecuritySettings,
    pub notifications: Vec<NotificationPreference>,
    pub integrations: Vec<Integration>,
    pub recommendations: Vec<Recommendation>,
}

impl AccountState {
    pub fn device(&self, id: &str) -> Option<&DeviceSession> {
        self.security.devices.iter().find(|d| d.id == id)
    }

    pub fn notification(&self, id: &str) -> Option<&NotificationPreference> {
        self.notifications.iter().find(|n| n.id == id)
    }

    pub fn integration(&self, service: IntegrationService) -> Option<&Integration> {
        self.integrations.iter().find(|i| i.id == service)
    }
}

// ============================================================================
// Profile
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub display_name: String,
    pub username: String,
    pub bio: String,
    pub avatar_url: String,
    pub email: String,
    pub timezone: String,
    pub pronouns: String,
    /// Set-like: order preserved, no duplicates.
    pub focus_roles: Vec<String>,
    /// Set-like: order preserved, no duplicates.
    pub preferred_genres: Vec<String>,
}

/// Partial profile edit. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub email: Option<String>,
    pub timezone: Option<String>,
    pub pronouns: Option<String>,
    pub focus_roles: Option<Vec<String>>,
    pub preferred_genres: Option<Vec<String>>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Security
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    pub two_factor_enabled: bool,
    pub passkey_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passkey_label: Option<String>,
    pub backup_codes_remaining: u32,
    pub last_password_change: DateTime<Utc>,
    pub login_alerts: bool,
    /// Device `id` is unique within the list.
    pub devices: Vec<DeviceSession>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSession {
    pub id: String,
    pub label: String,
    pub location: String,
    pub last_active: DateTime<Utc>,
    pub trusted: bool,
}

// ============================================================================
// Notifications
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cadence {
    Realtime,
    Daily,
    Weekly,
}

impl Cadence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cadence::Realtime => "realtime",
            Cadence::Daily => "daily",
            Cadence::Weekly => "weekly",
        }
    }
}

impl FromStr for Cadence {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "realtime" => Ok(Cadence::Realtime),
            "daily" => Ok(Cadence::Daily),
            "weekly" => Ok(Cadence::Weekly),
            other => Err(UnknownVariant::new("cadence", other)),
        }
    }
}

impl fmt::Display for Cadence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NotificationChannels {
    pub email: bool,
    pub push: bool,
    pub sms: bool,
}

impl NotificationChannels {
    pub fn get(&self, channel: Channel) -> bool {
        match channel {
            Channel::Email => self.email,
            Channel::Push => self.push,
            Channel::Sms => self.sms,
        }
    }

    pub fn set(&mut self, channel: Channel, enabled: bool) {
        match channel {
            Channel::Email => self.email = enabled,
            Channel::Push => self.push = enabled,
            Channel::Sms => self.sms = enabled,
        }
    }
}

/// Delivery channel key within [`NotificationChannels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Email,
    Push,
    Sms,
}

impl FromStr for Channel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "email" => Ok(Channel::Email),
            "push" => Ok(Channel::Push),
            "sms" => Ok(Channel::Sms),
            other => Err(UnknownVariant::new("channel", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cadence: Cadence,
    pub channels: NotificationChannels,
}

// ============================================================================
// Integrations
// ============================================================================

/// Streaming services the account can connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationService {
    Spotify,
    Youtube,
}

impl IntegrationService {
    pub const ALL: [IntegrationService; 2] = [IntegrationService::Spotify, IntegrationService::Youtube];

    /// Path segment and wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationService::Spotify => "spotify",
            IntegrationService::Youtube => "youtube",
        }
    }

    /// Human-readable label shown next to the connection.
    pub fn label(&self) -> &'static str {
        match self {
            IntegrationService::Spotify => "Spotify",
            IntegrationService::Youtube => "YouTube Music",
        }
    }
}

impl FromStr for IntegrationService {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "spotify" => Ok(IntegrationService::Spotify),
            "youtube" => Ok(IntegrationService::Youtube),
            other => Err(UnknownVariant::new("integration service", other)),
        }
    }
}

impl fmt::Display for IntegrationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationStatus {
    Connected,
    Disconnected,
    ActionRequired,
}

impl FromStr for IntegrationStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "connected" => Ok(IntegrationStatus::Connected),
            "disconnected" => Ok(IntegrationStatus::Disconnected),
            "action_required" => Ok(IntegrationStatus::ActionRequired),
            other => Err(UnknownVariant::new("integration status", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub id: IntegrationService,
    pub title: String,
    pub status: IntegrationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    pub scopes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

// ============================================================================
// Recommendations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Always within `0.0..=1.0`.
    pub confidence: f64,
    pub source: IntegrationService,
    pub signals: Vec<String>,
}

// ============================================================================
// Parse Errors
// ============================================================================

/// A string did not name any variant of the expected enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
