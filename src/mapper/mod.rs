//! Translation of raw backend payloads into [`AccountState`].
//!
//! Mapping never fails. Blank or missing values fall back to the seeded
//! account record, malformed entries are dropped, and every such decision is
//! reported as a [`MappingIssue`] so callers can log or surface it.

mod payload;

pub use payload::{
    AccountPayload, DevicePayload, IntegrationPayload, NotificationPayload,
    RecommendationPayload, RefreshAck, SecurityPayload,
};

use crate::account::{
    fallback_account, AccountState, Cadence, DeviceSession, Integration, IntegrationService,
    IntegrationStatus, NotificationChannels, NotificationPreference, Profile, Recommendation,
    SecuritySettings,
};
use crate::util::{clamp, dedupe_preserving_order, non_blank, string_or};
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use thiserror::Error;

/// Status used when the backend reports a value outside the known set.
const FALLBACK_STATUS: IntegrationStatus = IntegrationStatus::Disconnected;

// ============================================================================
// Issues
// ============================================================================

/// A value the mapper had to replace or an entry it had to drop.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MappingIssue {
    #[error("Unknown integration service '{0}'")]
    UnknownService(String),

    #[error("Integration entry has no service")]
    MissingService,

    /// Connect/disconnect answered for a different service than requested.
    #[error("Requested {requested} but backend answered for {received}")]
    ServiceMismatch {
        requested: IntegrationService,
        received: IntegrationService,
    },

    #[error("Duplicate integration for {0}, keeping the first")]
    DuplicateIntegration(IntegrationService),

    #[error("{entity} entry has no id, dropped")]
    MissingId { entity: &'static str },

    #[error("Duplicate {entity} id '{id}', keeping the first")]
    DuplicateId { entity: &'static str, id: String },

    #[error("Unknown cadence '{value}' on notification '{id}'")]
    UnknownCadence { id: String, value: String },

    #[error("Unknown status '{value}' on integration {service}")]
    UnknownStatus {
        service: IntegrationService,
        value: String,
    },

    #[error("Recommendation '{id}' has unknown source '{value}', dropped")]
    UnknownSource { id: String, value: String },

    #[error("Invalid timestamp '{value}' for {field}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("Confidence {value} on recommendation '{id}' outside 0..=1, clamped")]
    ConfidenceOutOfRange { id: String, value: f64 },
}

/// Mapping result: the complete state plus whatever had to be patched up.
#[derive(Debug, Clone)]
pub struct Mapped {
    pub state: AccountState,
    pub issues: Vec<MappingIssue>,
}

// ============================================================================
// Public Entry Points
// ============================================================================

/// Maps a full account payload into a fully-populated [`AccountState`].
pub fn map_account(payload: AccountPayload) -> Mapped {
    let mut mapper = Mapper::new();
    let state = mapper.account(payload);
    Mapped {
        state,
        issues: mapper.issues,
    }
}

/// Maps a single integration record, as returned by connect/disconnect.
///
/// Unknown or missing services are an error here since the record cannot be
/// placed anywhere. Recoverable issues are logged.
pub fn map_integration(payload: IntegrationPayload) -> Result<Integration, MappingIssue> {
    let mut mapper = Mapper::new();
    let service = mapper.service(payload.service.as_deref())?;
    let integration = mapper.integration_for(service, payload);
    for issue in &mapper.issues {
        tracing::warn!(issue = %issue, "Patched integration response");
    }
    Ok(integration)
}

// ============================================================================
// Mapper
// ============================================================================

struct Mapper {
    fallback: &'static AccountState,
    issues: Vec<MappingIssue>,
}

impl Mapper {
    fn new() -> Self {
        Self {
            fallback: fallback_account(),
            issues: Vec::new(),
        }
    }

    fn account(&mut self, payload: AccountPayload) -> AccountState {
        let base = self.fallback;
        let security = self.security(payload.security, payload.devices.unwrap_or_default());
        let notifications = self.notifications(payload.notifications.unwrap_or_default());
        let integrations = self.integrations(payload.integrations.unwrap_or_default());
        let recommendations = self.recommendations(payload.recommendations.unwrap_or_default());
        let profile = Profile {
            display_name: string_or(payload.display_name, &base.profile.display_name),
            username: string_or(payload.username, &base.profile.username),
            bio: string_or(payload.bio, &base.profile.bio),
            avatar_url: string_or(payload.avatar_url, &base.profile.avatar_url),
            email: string_or(payload.email, &base.profile.email),
            timezone: string_or(payload.timezone, &base.profile.timezone),
            pronouns: string_or(payload.pronouns, &base.profile.pronouns),
            focus_roles: dedupe_preserving_order(
                payload
                    .focus_roles
                    .unwrap_or_else(|| base.profile.focus_roles.clone()),
            ),
            preferred_genres: dedupe_preserving_order(
                payload
                    .preferred_genres
                    .unwrap_or_else(|| base.profile.preferred_genres.clone()),
            ),
        };

        AccountState {
            profile,
            security,
            notifications,
            integrations,
            recommendations,
        }
    }

    fn security(
        &mut self,
        security: Option<SecurityPayload>,
        devices: Vec<DevicePayload>,
    ) -> SecuritySettings {
        let base = self.fallback;
        let fallback = &base.security;
        let security = security.unwrap_or_default();
        let last_password_change = self.timestamp(
            "security.lastPasswordChange",
            security.last_password_change,
            fallback.last_password_change,
        );

        SecuritySettings {
            two_factor_enabled: security
                .two_factor_enabled
                .unwrap_or(fallback.two_factor_enabled),
            passkey_enabled: security.passkey_enabled.unwrap_or(fallback.passkey_enabled),
            passkey_label: non_blank(security.passkey_label.as_deref())
                .map(str::to_string)
                .or_else(|| fallback.passkey_label.clone()),
            backup_codes_remaining: security
                .backup_codes_remaining
                .unwrap_or(fallback.backup_codes_remaining),
            last_password_change,
            login_alerts: security.login_alerts.unwrap_or(fallback.login_alerts),
            devices: self.devices(devices),
        }
    }

    fn devices(&mut self, devices: Vec<DevicePayload>) -> Vec<DeviceSession> {
        let base = self.fallback;
        let fallback = base.security.devices.first();
        let fallback_label = fallback.map_or("Session", |d| d.label.as_str());
        let fallback_location = fallback.map_or("Unknown location", |d| d.location.as_str());
        let fallback_active = fallback.map_or(DateTime::UNIX_EPOCH, |d| d.last_active);

        let mut seen = HashSet::new();
        let mut mapped = Vec::with_capacity(devices.len());
        for device in devices {
            let Some(id) = self.entity_id("device", device.id, &mut seen) else {
                continue;
            };
            let last_active =
                self.timestamp("device.lastActive", device.last_active, fallback_active);
            mapped.push(DeviceSession {
                id,
                label: string_or(device.label, fallback_label),
                location: string_or(device.location, fallback_location),
                last_active,
                trusted: device.trusted.unwrap_or(false),
            });
        }
        mapped
    }

    fn notifications(&mut self, prefs: Vec<NotificationPayload>) -> Vec<NotificationPreference> {
        let base = self.fallback;
        let fallback = base.notifications.first();
        let fallback_title = fallback.map_or("Notification", |n| n.title.as_str());
        let fallback_description = fallback.map_or("", |n| n.description.as_str());
        let fallback_cadence = fallback.map_or(Cadence::Realtime, |n| n.cadence);

        let mut seen = HashSet::new();
        let mut mapped = Vec::with_capacity(prefs.len());
        for pref in prefs {
            let key = non_blank(pref.key.as_deref())
                .map(str::to_string)
                .or(pref.id);
            let Some(id) = self.entity_id("notification", key, &mut seen) else {
                continue;
            };
            let cadence = match pref.cadence.as_deref().map(str::parse::<Cadence>) {
                Some(Ok(cadence)) => cadence,
                Some(Err(err)) => {
                    self.issues.push(MappingIssue::UnknownCadence {
                        id: id.clone(),
                        value: err.value,
                    });
                    fallback_cadence
                }
                None => fallback_cadence,
            };
            mapped.push(NotificationPreference {
                title: string_or(pref.title, fallback_title),
                description: string_or(pref.description, fallback_description),
                cadence,
                channels: NotificationChannels {
                    email: pref.email.unwrap_or(false),
                    push: pref.push.unwrap_or(false),
                    sms: pref.sms.unwrap_or(false),
                },
                id,
            });
        }
        mapped
    }

    fn integrations(&mut self, integrations: Vec<IntegrationPayload>) -> Vec<Integration> {
        let mut seen = HashSet::new();
        let mut mapped = Vec::with_capacity(IntegrationService::ALL.len());
        for payload in integrations {
            let service = match self.service(payload.service.as_deref()) {
                Ok(service) => service,
                Err(issue) => {
                    self.issues.push(issue);
                    continue;
                }
            };
            if !seen.insert(service) {
                self.issues.push(MappingIssue::DuplicateIntegration(service));
                continue;
            }
            mapped.push(self.integration_for(service, payload));
        }
        mapped
    }

    fn integration_for(
        &mut self,
        service: IntegrationService,
        payload: IntegrationPayload,
    ) -> Integration {
        let status = match payload.status.as_deref().map(str::parse::<IntegrationStatus>) {
            Some(Ok(status)) => status,
            Some(Err(err)) => {
                self.issues.push(MappingIssue::UnknownStatus {
                    service,
                    value: err.value,
                });
                FALLBACK_STATUS
            }
            None => FALLBACK_STATUS,
        };

        Integration {
            id: service,
            title: service.label().to_string(),
            status,
            plan: non_blank(payload.plan.as_deref()).map(str::to_string),
            scopes: payload.scopes.unwrap_or_default(),
            connected_at: self.optional_timestamp("integration.connectedAt", payload.connected_at),
            last_sync: self.optional_timestamp("integration.lastSync", payload.last_sync),
        }
    }

    fn recommendations(&mut self, recs: Vec<RecommendationPayload>) -> Vec<Recommendation> {
        let base = self.fallback;
        let fallback = base.recommendations.first();
        let fallback_title = fallback.map_or("Recommendation", |r| r.title.as_str());
        let fallback_description = fallback.map_or("Recommendation", |r| r.description.as_str());

        let mut seen = HashSet::new();
        let mut mapped = Vec::with_capacity(recs.len());
        for rec in recs {
            let Some(id) = self.entity_id("recommendation", rec.id, &mut seen) else {
                continue;
            };
            let source = match rec
                .source_service
                .as_deref()
                .map(str::parse::<IntegrationService>)
            {
                Some(Ok(source)) => source,
                Some(Err(err)) => {
                    self.issues.push(MappingIssue::UnknownSource {
                        id,
                        value: err.value,
                    });
                    continue;
                }
                None => {
                    self.issues.push(MappingIssue::UnknownSource {
                        id,
                        value: String::new(),
                    });
                    continue;
                }
            };

            let raw = rec.confidence.unwrap_or(0.0);
            let confidence = clamp(raw, 0.0, 1.0).unwrap_or(0.0);
            if confidence != raw {
                self.issues.push(MappingIssue::ConfidenceOutOfRange {
                    id: id.clone(),
                    value: raw,
                });
            }

            mapped.push(Recommendation {
                title: string_or(rec.title, fallback_title),
                description: string_or(rec.description, fallback_description),
                confidence,
                source,
                signals: rec.signals.unwrap_or_default(),
                id,
            });
        }
        mapped
    }

    // ------------------------------------------------------------------------
    // Field helpers
    // ------------------------------------------------------------------------

    fn service(&self, raw: Option<&str>) -> Result<IntegrationService, MappingIssue> {
        let raw = non_blank(raw).ok_or(MappingIssue::MissingService)?;
        raw.parse::<IntegrationService>()
            .map_err(|err| MappingIssue::UnknownService(err.value))
    }

    /// Accepts a non-blank id not seen before in this list.
    fn entity_id(
        &mut self,
        entity: &'static str,
        raw: Option<String>,
        seen: &mut HashSet<String>,
    ) -> Option<String> {
        let Some(id) = raw.filter(|id| !id.trim().is_empty()) else {
            self.issues.push(MappingIssue::MissingId { entity });
            return None;
        };
        if !seen.insert(id.clone()) {
            self.issues.push(MappingIssue::DuplicateId { entity, id });
            return None;
        }
        Some(id)
    }

    fn timestamp(
        &mut self,
        field: &'static str,
        raw: Option<String>,
        fallback: DateTime<Utc>,
    ) -> DateTime<Utc> {
        self.optional_timestamp(field, raw).unwrap_or(fallback)
    }

    fn optional_timestamp(
        &mut self,
        field: &'static str,
        raw: Option<String>,
    ) -> Option<DateTime<Utc>> {
        let raw = raw.filter(|v| !v.trim().is_empty())?;
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(_) => {
                self.issues
                    .push(MappingIssue::InvalidTimestamp { field, value: raw });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::default_account_state;
    use pretty_assertions::assert_eq;

    fn parse(json: &str) -> Mapped {
        map_account(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn test_empty_payload_maps_to_fallback_profile_and_security() {
        let mapped = parse("{}");
        let defaults = default_account_state();
        assert_eq!(mapped.state.profile, defaults.profile);
        assert_eq!(
            mapped.state.security.last_password_change,
            defaults.security.last_password_change
        );
        assert_eq!(mapped.state.security.passkey_label, defaults.security.passkey_label);
        assert!(mapped.state.security.devices.is_empty());
        assert!(mapped.state.notifications.is_empty());
        assert!(mapped.issues.is_empty());
    }

    #[test]
    fn test_whitespace_strings_fall_back() {
        let mapped = parse(r#"{"displayName": "   ", "bio": "", "email": "new@pulse.fm"}"#);
        let fallback = fallback_account();
        assert_eq!(mapped.state.profile.display_name, fallback.profile.display_name);
        assert_eq!(mapped.state.profile.bio, fallback.profile.bio);
        assert_eq!(mapped.state.profile.email, "new@pulse.fm");
    }

    #[test]
    fn test_explicit_empty_profile_list_is_kept() {
        let mapped = parse(r#"{"focusRoles": [], "preferredGenres": ["Dub", "Dub", "Ambient"]}"#);
        assert!(mapped.state.profile.focus_roles.is_empty());
        assert_eq!(mapped.state.profile.preferred_genres, vec!["Dub", "Ambient"]);
    }

    #[test]
    fn test_null_scopes_become_empty() {
        let mapped = parse(
            r#"{"integrations": [{"service": "spotify", "status": "connected", "scopes": null}]}"#,
        );
        assert_eq!(mapped.state.integrations.len(), 1);
        let spotify = &mapped.state.integrations[0];
        assert_eq!(spotify.id, IntegrationService::Spotify);
        assert_eq!(spotify.title, "Spotify");
        assert_eq!(spotify.status, IntegrationStatus::Connected);
        assert!(spotify.scopes.is_empty());
        assert!(spotify.plan.is_none());
    }

    #[test]
    fn test_unknown_service_dropped_with_issue() {
        let mapped = parse(
            r#"{"integrations": [
                {"service": "custom", "status": "connected"},
                {"service": "youtube", "status": "action_required"}
            ]}"#,
        );
        assert_eq!(mapped.state.integrations.len(), 1);
        assert_eq!(mapped.state.integrations[0].title, "YouTube Music");
        assert_eq!(
            mapped.issues,
            vec![MappingIssue::UnknownService("custom".into())]
        );
    }

    #[test]
    fn test_duplicate_service_keeps_first() {
        let mapped = parse(
            r#"{"integrations": [
                {"service": "spotify", "status": "connected"},
                {"service": "spotify", "status": "disconnected"}
            ]}"#,
        );
        assert_eq!(mapped.state.integrations.len(), 1);
        assert_eq!(
            mapped.state.integrations[0].status,
            IntegrationStatus::Connected
        );
        assert!(matches!(
            mapped.issues[0],
            MappingIssue::DuplicateIntegration(IntegrationService::Spotify)
        ));
    }

    #[test]
    fn test_unknown_status_falls_back() {
        let mapped = parse(r#"{"integrations": [{"service": "youtube", "status": "paused"}]}"#);
        assert_eq!(
            mapped.state.integrations[0].status,
            IntegrationStatus::Disconnected
        );
        assert_eq!(mapped.issues.len(), 1);
    }

    #[test]
    fn test_device_defaults() {
        let mapped = parse(
            r#"{"devices": [{"id": "ipad", "label": null, "location": " ", "lastActive": null, "trusted": true}]}"#,
        );
        let fallback = &fallback_account().security.devices[0];
        let device = &mapped.state.security.devices[0];
        assert_eq!(device.id, "ipad");
        assert_eq!(device.label, fallback.label);
        assert_eq!(device.location, fallback.location);
        assert_eq!(device.last_active, fallback.last_active);
        assert!(device.trusted);
    }

    #[test]
    fn test_device_duplicate_and_missing_ids_dropped() {
        let mapped = parse(
            r#"{"devices": [{"id": "a"}, {"id": "a", "label": "Second"}, {"label": "No id"}]}"#,
        );
        assert_eq!(mapped.state.security.devices.len(), 1);
        assert_eq!(mapped.issues.len(), 2);
    }

    #[test]
    fn test_device_timestamp_parsed() {
        let mapped = parse(r#"{"devices": [{"id": "a", "lastActive": "2025-10-01T12:30:00+02:00"}]}"#);
        assert_eq!(
            mapped.state.security.devices[0].last_active.to_rfc3339(),
            "2025-10-01T10:30:00+00:00"
        );
    }

    #[test]
    fn test_invalid_timestamp_reported() {
        let mapped = parse(r#"{"security": {"lastPasswordChange": "last tuesday"}}"#);
        assert_eq!(
            mapped.state.security.last_password_change,
            fallback_account().security.last_password_change
        );
        assert!(matches!(
            mapped.issues[0],
            MappingIssue::InvalidTimestamp { field: "security.lastPasswordChange", .. }
        ));
    }

    #[test]
    fn test_notification_uses_key_as_id() {
        let mapped = parse(
            r#"{"notifications": [{"id": "row-17", "key": "digest", "title": "Digest", "description": null,
                "cadence": "weekly", "email": true, "push": false, "sms": true}]}"#,
        );
        let pref = &mapped.state.notifications[0];
        assert_eq!(pref.id, "digest");
        assert_eq!(pref.cadence, Cadence::Weekly);
        assert_eq!(pref.description, fallback_account().notifications[0].description);
        assert!(pref.channels.email && pref.channels.sms && !pref.channels.push);
    }

    #[test]
    fn test_notification_unknown_cadence() {
        let mapped = parse(r#"{"notifications": [{"key": "x", "cadence": "hourly"}]}"#);
        assert_eq!(mapped.state.notifications[0].cadence, Cadence::Realtime);
        assert!(matches!(
            &mapped.issues[0],
            MappingIssue::UnknownCadence { value, .. } if value == "hourly"
        ));
    }

    #[test]
    fn test_recommendation_mapping() {
        let mapped = parse(
            r#"{"recommendations": [
                {"id": "r1", "title": "Blend", "description": null, "confidence": 1.4,
                 "sourceService": "spotify", "signals": null},
                {"id": "r2", "title": "Other", "confidence": 0.3, "sourceService": "custom"}
            ]}"#,
        );
        assert_eq!(mapped.state.recommendations.len(), 1);
        let rec = &mapped.state.recommendations[0];
        assert_eq!(rec.confidence, 1.0);
        assert!(rec.signals.is_empty());
        assert_eq!(rec.description, fallback_account().recommendations[0].description);
        assert_eq!(mapped.issues.len(), 2);
    }

    #[test]
    fn test_map_integration_rejects_unknown_service() {
        let payload: IntegrationPayload =
            serde_json::from_str(r#"{"service": "custom", "status": "connected"}"#).unwrap();
        assert_eq!(
            map_integration(payload).unwrap_err(),
            MappingIssue::UnknownService("custom".into())
        );
    }

    #[test]
    fn test_map_integration_success() {
        let payload: IntegrationPayload = serde_json::from_str(
            r#"{"service": "youtube", "status": "connected", "plan": "Family",
                "connectedAt": "2025-12-02T09:00:00Z", "scopes": ["ytm.playlist.read"]}"#,
        )
        .unwrap();
        let integration = map_integration(payload).unwrap();
        assert_eq!(integration.id, IntegrationService::Youtube);
        assert_eq!(integration.plan.as_deref(), Some("Family"));
        assert!(integration.connected_at.is_some());
        assert!(integration.last_sync.is_none());
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let json = r#"{"devices": [{"id": "a", "lastActive": null}], "integrations": [{"service": "spotify"}]}"#;
        assert_eq!(parse(json).state, parse(json).state);
    }
}
