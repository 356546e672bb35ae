//! Seeded account record.
//!
//! Serves two purposes: the snapshot shown before the first hydration
//! completes, and the fallback source for every field the backend leaves
//! null or blank.
use super::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::OnceLock;

/// Number of backup codes available right after a rotation.
pub const ROTATED_BACKUP_CODES: u32 = 10;

static DEFAULT_ACCOUNT: OnceLock<AccountState> = OnceLock::new();

/// Shared reference to the seeded account record.
pub fn fallback_account() -> &'static AccountState {
    DEFAULT_ACCOUNT.get_or_init(build_default_account)
}

/// Owned copy of the seeded account record.
pub fn default_account_state() -> AccountState {
    fallback_account().clone()
}

fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or(DateTime::UNIX_EPOCH)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn build_default_account() -> AccountState {
    AccountState {
        profile: Profile {
            display_name: "Maya Lumen".to_string(),
            username: "maya.lumen".to_string(),
            bio: "Designing adaptive listening rooms and leading the Pulse recommender squad."
                .to_string(),
            avatar_url: "https://images.unsplash.com/photo-1521572267360-ee0c2909d518?auto=format&fit=crop&w=240&q=80"
                .to_string(),
            email: "maya.lumen@mukulasoft.com".to_string(),
            timezone: "America/Los_Angeles".to_string(),
            pronouns: "she/her".to_string(),
            focus_roles: strings(&["Identity platform lead", "Pulse recommender research"]),
            preferred_genres: strings(&["Downtempo", "Organic house", "Indietronica"]),
        },
        security: SecuritySettings {
            two_factor_enabled: true,
            passkey_enabled: true,
            passkey_label: Some("MukulaSoft IdP · Studio MBP".to_string()),
            backup_codes_remaining: 6,
            last_password_change: utc(2025, 8, 14, 8, 12),
            login_alerts: true,
            devices: vec![
                DeviceSession {
                    id: "primary-mbp".to_string(),
                    label: "MacBook Pro · Studio".to_string(),
                    location: "Los Angeles, US".to_string(),
                    last_active: utc(2025, 12, 1, 8, 0),
                    trusted: true,
                },
                DeviceSession {
                    id: "pixel-9".to_string(),
                    label: "Pixel 9 Pro".to_string(),
                    location: "Silver Lake, US".to_string(),
                    last_active: utc(2025, 11, 29, 13, 40),
                    trusted: true,
                },
                DeviceSession {
                    id: "hotel-lobby".to_string(),
                    label: "Venue kiosk".to_string(),
                    location: "Berlin, DE".to_string(),
                    last_active: utc(2025, 11, 20, 19, 22),
                    trusted: false,
                },
            ],
        },
        notifications: vec![
            NotificationPreference {
                id: "account_activity".to_string(),
                title: "Account & security".to_string(),
                description: "Logins, recovery attempts, and policy alerts.".to_string(),
                cadence: Cadence::Realtime,
                channels: NotificationChannels {
                    email: true,
                    push: true,
                    sms: false,
                },
            },
            NotificationPreference {
                id: "recommender_reports".to_string(),
                title: "Recommender performance".to_string(),
                description: "Daily signal diffs and playlist delivery summaries.".to_string(),
                cadence: Cadence::Daily,
                channels: NotificationChannels {
                    email: true,
                    push: false,
                    sms: false,
                },
            },
            NotificationPreference {
                id: "collaboration".to_string(),
                title: "Team collaboration".to_string(),
                description: "Mentions, approvals, and shared workspace updates.".to_string(),
                cadence: Cadence::Realtime,
                channels: NotificationChannels {
                    email: false,
                    push: true,
                    sms: false,
                },
            },
            NotificationPreference {
                id: "digest".to_string(),
                title: "Weekly identity digest".to_string(),
                description: "Sunday briefing with profile metrics and trust posture.".to_string(),
                cadence: Cadence::Weekly,
                channels: NotificationChannels {
                    email: true,
                    push: false,
                    sms: false,
                },
            },
        ],
        integrations: vec![
            Integration {
                id: IntegrationService::Spotify,
                title: IntegrationService::Spotify.label().to_string(),
                status: IntegrationStatus::Connected,
                plan: Some("Premium Artist".to_string()),
                scopes: strings(&[
                    "user-library-read",
                    "playlist-modify-private",
                    "user-read-recently-played",
                ]),
                connected_at: Some(utc(2025, 7, 2, 10, 0)),
                last_sync: Some(utc(2025, 12, 1, 6, 45)),
            },
            Integration {
                id: IntegrationService::Youtube,
                title: IntegrationService::Youtube.label().to_string(),
                status: IntegrationStatus::ActionRequired,
                plan: None,
                scopes: strings(&["ytm.playlist.read", "ytm.analytics.readonly"]),
                connected_at: None,
                last_sync: Some(utc(2025, 11, 27, 18, 10)),
            },
        ],
        recommendations: vec![
            Recommendation {
                id: "rec-1".to_string(),
                title: "Sunday Evening Blend".to_string(),
                description: "Downtempo set tuned to 92 BPM with spotlight transitions for ambient choreography blocks.".to_string(),
                confidence: 0.84,
                source: IntegrationService::Spotify,
                signals: strings(&["recent_mixes", "liked_artists", "heart_rate_windows"]),
            },
            Recommendation {
                id: "rec-2".to_string(),
                title: "Creator QA Sprint".to_string(),
                description: "Crossfade indie-electronica queue to pilot the new stories to playlist feedback loop.".to_string(),
                confidence: 0.73,
                source: IntegrationService::Youtube,
                signals: strings(&["collab_room_activity", "playlist_comments"]),
            },
            Recommendation {
                id: "rec-3".to_string(),
                title: "Late Night Signal Scan".to_string(),
                description: "Curate 3 contrast-heavy mixes for the recommender benchmark w/ neurodivergent testers.".to_string(),
                confidence: 0.69,
                source: IntegrationService::Spotify,
                signals: strings(&["team_shared_links", "energy_curve_gaps"]),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_default_timestamps_parse() {
        let account = fallback_account();
        assert_eq!(
            account.security.last_password_change.to_rfc3339(),
            "2025-08-14T08:12:00+00:00"
        );
        assert!(account
            .security
            .devices
            .iter()
            .all(|d| d.last_active != DateTime::UNIX_EPOCH));
    }

    #[test]
    fn test_default_ids_unique() {
        let account = fallback_account();
        let devices: HashSet<_> = account.security.devices.iter().map(|d| &d.id).collect();
        assert_eq!(devices.len(), account.security.devices.len());
        let prefs: HashSet<_> = account.notifications.iter().map(|n| &n.id).collect();
        assert_eq!(prefs.len(), account.notifications.len());
        let services: HashSet<_> = account.integrations.iter().map(|i| i.id).collect();
        assert_eq!(services.len(), account.integrations.len());
    }

    #[test]
    fn test_default_seed_shape() {
        let account = default_account_state();
        assert_eq!(account.security.backup_codes_remaining, 6);
        assert_eq!(account.notifications.len(), 4);
        assert_eq!(account.integrations.len(), 2);
        assert_eq!(account.recommendations.len(), 3);
    }
}
