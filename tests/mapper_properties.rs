//! Property tests for the account mapper.
//!
//! Whatever the backend sends, mapping must produce a complete account whose
//! integration ids are unique and known, whose confidences stay in range and
//! whose blank strings are replaced by the seeded values.

use proptest::prelude::*;
use pulse_account::account::{fallback_account, IntegrationService};
use pulse_account::mapper::{
    map_account, AccountPayload, IntegrationPayload, NotificationPayload, RecommendationPayload,
};
use serde_json::Value;
use std::collections::HashSet;

fn service_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("spotify".to_string())),
        Just(Some("youtube".to_string())),
        Just(Some(String::new())),
        "[a-z]{1,10}".prop_map(Some),
    ]
}

fn integration_strategy() -> impl Strategy<Value = IntegrationPayload> {
    (
        service_strategy(),
        prop::option::of("[a-z_]{0,16}"),
        prop::option::of(prop::collection::vec("[a-z.]{1,12}", 0..4)),
    )
        .prop_map(|(service, status, scopes)| IntegrationPayload {
            service,
            status,
            scopes,
            ..Default::default()
        })
}

fn blank_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![Just(None), "[ \t\n]{0,6}".prop_map(Some)]
}

/// Arbitrary JSON leaves and shallow containers.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(2, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map("[a-zA-Z]{1,12}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn integration_ids_are_unique_and_known(
        integrations in prop::collection::vec(integration_strategy(), 0..8),
    ) {
        let mapped = map_account(AccountPayload {
            integrations: Some(integrations),
            ..Default::default()
        });

        let ids: Vec<IntegrationService> =
            mapped.state.integrations.iter().map(|i| i.id).collect();
        let unique: HashSet<_> = ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), ids.len());
        for integration in &mapped.state.integrations {
            prop_assert!(IntegrationService::ALL.contains(&integration.id));
            prop_assert_eq!(integration.title.as_str(), integration.id.label());
        }
    }

    #[test]
    fn blank_profile_strings_fall_back(
        display_name in blank_strategy(),
        username in blank_strategy(),
        email in blank_strategy(),
    ) {
        let mapped = map_account(AccountPayload {
            display_name,
            username,
            email,
            ..Default::default()
        });
        let base = &fallback_account().profile;
        prop_assert_eq!(&mapped.state.profile.display_name, &base.display_name);
        prop_assert_eq!(&mapped.state.profile.username, &base.username);
        prop_assert_eq!(&mapped.state.profile.email, &base.email);
    }

    #[test]
    fn confidence_always_in_unit_range(
        confidences in prop::collection::vec(any::<f64>(), 0..6),
    ) {
        let recommendations = confidences
            .iter()
            .enumerate()
            .map(|(i, c)| RecommendationPayload {
                id: Some(format!("rec-{i}")),
                confidence: Some(*c),
                source_service: Some("spotify".to_string()),
                ..Default::default()
            })
            .collect();
        let mapped = map_account(AccountPayload {
            recommendations: Some(recommendations),
            ..Default::default()
        });

        prop_assert_eq!(mapped.state.recommendations.len(), confidences.len());
        for rec in &mapped.state.recommendations {
            prop_assert!((0.0..=1.0).contains(&rec.confidence));
        }
    }

    #[test]
    fn notification_ids_are_unique(
        keys in prop::collection::vec(prop::option::of("[a-c]{0,2}"), 0..8),
    ) {
        let notifications = keys
            .into_iter()
            .map(|key| NotificationPayload { key, ..Default::default() })
            .collect();
        let mapped = map_account(AccountPayload {
            notifications: Some(notifications),
            ..Default::default()
        });

        let mut seen = HashSet::new();
        for pref in &mapped.state.notifications {
            prop_assert!(!pref.id.trim().is_empty());
            prop_assert!(seen.insert(pref.id.clone()));
        }
    }

    #[test]
    fn arbitrary_json_always_maps(
        display_name in prop::option::of(json_strategy()),
        focus_roles in prop::option::of(json_strategy()),
        security in prop::option::of(json_strategy()),
        devices in prop::option::of(json_strategy()),
        notifications in prop::option::of(json_strategy()),
        integrations in prop::option::of(json_strategy()),
        recommendations in prop::option::of(json_strategy()),
    ) {
        let fields = [
            ("displayName", display_name),
            ("focusRoles", focus_roles),
            ("security", security),
            ("devices", devices),
            ("notifications", notifications),
            ("integrations", integrations),
            ("recommendations", recommendations),
        ];
        let body: serde_json::Map<String, Value> = fields
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
            .collect();

        let payload: AccountPayload = serde_json::from_value(Value::Object(body)).unwrap();
        let first = map_account(payload.clone());
        let second = map_account(payload);

        prop_assert_eq!(&first.state, &second.state);
        prop_assert!(!first.state.profile.display_name.trim().is_empty());
        prop_assert!(!first.state.profile.timezone.is_empty());
    }
}
