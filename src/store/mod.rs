//! Account state container.
//!
//! [`AccountStore`] is the single source of truth for account data. It
//! publishes an [`AccountSnapshot`] through a `tokio::sync::watch` channel;
//! every operation replaces the snapshot in one step, so subscribers never see
//! a half-applied change.
//!
//! Two consistency policies coexist:
//!
//! - **Local edits** (profile, security toggles, notification settings) are
//!   applied immediately and never sent to the backend. The next applied
//!   reload replaces them with server state.
//! - **Remote mutations** (integrations, recommendation refresh) call the
//!   backend and then refetch the whole account to reconcile.
//!
//! Loads are sequenced: each takes a generation number and a response is only
//! applied if no newer load started since.

mod hydration;

pub use hydration::{Hydration, HydrationStatus, LoadMode};

use crate::account::{
    default_account_state, AccountState, Cadence, Channel, Integration, IntegrationService,
    ProfileUpdate, ROTATED_BACKUP_CODES,
};
use crate::config::Config;
use crate::mapper::RefreshAck;
use crate::transport::{fetch_account_state, AccountTransport, HttpTransport, TransportError};
use crate::util::dedupe_preserving_order;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("No device session with id '{0}'")]
    UnknownDevice(String),

    #[error("No notification preference with id '{0}'")]
    UnknownNotification(String),

    #[error("Passkey label must not be blank")]
    BlankPasskeyLabel,
}

// ============================================================================
// Snapshot
// ============================================================================

/// What consumers observe: the account plus its load status.
///
/// Cloning is cheap; the account is shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountSnapshot {
    pub account: Arc<AccountState>,
    pub hydration: Hydration,
}

impl Default for AccountSnapshot {
    fn default() -> Self {
        Self {
            account: Arc::new(default_account_state()),
            hydration: Hydration::default(),
        }
    }
}

/// Whether a load's response was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load started before this one finished; its response was dropped.
    Superseded,
}

// ============================================================================
// Store
// ============================================================================

pub struct AccountStore {
    transport: Arc<dyn AccountTransport>,
    account_id: String,
    snapshot: watch::Sender<AccountSnapshot>,
    generation: AtomicU64,
}

impl AccountStore {
    /// Creates a store showing the seeded account in `Loading` state.
    ///
    /// Call [`AccountStore::hydrate`] to fetch real data.
    pub fn new(transport: Arc<dyn AccountTransport>, account_id: impl Into<String>) -> Self {
        let (snapshot, _) = watch::channel(AccountSnapshot::default());
        Self {
            transport,
            account_id: account_id.into(),
            snapshot,
            generation: AtomicU64::new(0),
        }
    }

    /// Creates a store backed by [`HttpTransport`].
    pub fn from_config(config: &Config) -> Result<Self, TransportError> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(Arc::new(transport), config.account_id.clone()))
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> AccountSnapshot {
        self.snapshot.borrow().clone()
    }

    pub fn account(&self) -> Arc<AccountState> {
        Arc::clone(&self.snapshot.borrow().account)
    }

    pub fn hydration(&self) -> Hydration {
        self.snapshot.borrow().hydration.clone()
    }

    /// Receiver notified after every published change.
    pub fn subscribe(&self) -> watch::Receiver<AccountSnapshot> {
        self.snapshot.subscribe()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Mount-time hydration.
    pub async fn hydrate(&self) -> Result<LoadOutcome, StoreError> {
        self.load(LoadMode::Initial).await
    }

    /// Re-runs full hydration.
    ///
    /// On failure the previous account stays in place, `last_updated` is kept,
    /// and the status moves to `Error` with the failure message.
    pub async fn reload_account(&self) -> Result<LoadOutcome, StoreError> {
        self.load(LoadMode::Initial).await
    }

    /// Fetches, maps and publishes the account.
    ///
    /// The generation is taken under the channel lock together with the
    /// in-flight status, so a later load always begins after this one and a
    /// superseded load can never leave a stale `Loading` behind.
    ///
    /// # Returns
    ///
    /// [`LoadOutcome::Superseded`] when a newer load started while this one was
    /// in flight; nothing is published in that case.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Transport`] - The fetch failed; the status is now `Error`
    ///   and the previous account is still published
    async fn load(&self, mode: LoadMode) -> Result<LoadOutcome, StoreError> {
        let mut generation = 0;
        self.snapshot.send_modify(|snap| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            snap.hydration.begin(mode);
        });
        tracing::debug!(account_id = %self.account_id, generation, ?mode, "Loading account");

        let result = fetch_account_state(self.transport.as_ref(), &self.account_id).await;

        // Check and apply under the channel lock so a newer load cannot slip in between.
        let mut applied = false;
        let mut failure = None;
        self.snapshot.send_if_modified(|snap| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            applied = true;
            match result {
                Ok(mapped) => {
                    for issue in &mapped.issues {
                        tracing::warn!(account_id = %self.account_id, issue = %issue, "Patched account payload");
                    }
                    snap.account = Arc::new(mapped.state);
                    snap.hydration.succeed(Utc::now());
                }
                Err(err) => {
                    snap.hydration.fail(err.to_string());
                    failure = Some(err);
                }
            }
            true
        });

        if !applied {
            tracing::debug!(generation, "Discarding superseded account response");
            return Ok(LoadOutcome::Superseded);
        }

        match failure {
            Some(err) => {
                tracing::warn!(account_id = %self.account_id, error = %err, ?mode, "Account load failed");
                Err(err.into())
            }
            None => {
                tracing::info!(account_id = %self.account_id, generation, "Account hydrated");
                Ok(LoadOutcome::Applied)
            }
        }
    }

    // ========================================================================
    // Remote Mutations
    // ========================================================================

    /// Connects a streaming service, then refetches the account.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Transport`] - The connect call failed (the refetch still
    ///   ran), or it succeeded and the refetch failed
    pub async fn connect_integration(
        &self,
        service: IntegrationService,
    ) -> Result<Integration, StoreError> {
        let result = self
            .transport
            .connect_integration(&self.account_id, service)
            .await;
        self.reconcile(result).await
    }

    /// Disconnects a streaming service, then refetches the account.
    pub async fn disconnect_integration(
        &self,
        service: IntegrationService,
    ) -> Result<Integration, StoreError> {
        let result = self
            .transport
            .disconnect_integration(&self.account_id, service)
            .await;
        self.reconcile(result).await
    }

    /// Queues a backend recommendation refresh, then refetches the account.
    pub async fn refresh_recommendations(&self) -> Result<RefreshAck, StoreError> {
        let result = self
            .transport
            .queue_recommendation_refresh(&self.account_id)
            .await;
        if let Ok(ack) = &result {
            tracing::info!(status = %ack.status, message = %ack.message, "Recommendation refresh queued");
        }
        self.reconcile(result).await
    }

    /// Refetches after a remote mutation, whether or not it succeeded.
    ///
    /// A failed mutation does not touch the hydration status; its error is
    /// returned to the caller. A failed refetch follows the usual load rules.
    async fn reconcile<T>(&self, mutation: Result<T, TransportError>) -> Result<T, StoreError> {
        if let Err(err) = &mutation {
            tracing::warn!(
                account_id = %self.account_id,
                operation = ?err.operation(),
                error = %err,
                "Remote mutation failed, reconciling with backend"
            );
        }

        let refetch = self.load(LoadMode::Refetch).await;
        let value = mutation?;
        refetch?;
        Ok(value)
    }

    // ========================================================================
    // Local Edits
    // ========================================================================

    /// Applies an edit that cannot fail and publishes the result.
    fn edit_with<F>(&self, edit: F)
    where
        F: FnOnce(&mut AccountState),
    {
        self.snapshot
            .send_modify(|snap| edit(Arc::make_mut(&mut snap.account)));
    }

    /// Applies `edit` to a copy-on-write account and publishes it if it succeeds.
    ///
    /// Edits must validate before mutating so a failure leaves state untouched.
    fn edit<F>(&self, edit: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut AccountState) -> Result<(), StoreError>,
    {
        let mut result = Ok(());
        self.snapshot.send_if_modified(|snap| {
            result = edit(Arc::make_mut(&mut snap.account));
            result.is_ok()
        });
        result
    }

    /// Merges the provided profile fields.
    ///
    /// `None` fields are left alone; list fields are de-duplicated in order.
    /// An empty update publishes nothing.
    pub fn update_profile(&self, update: ProfileUpdate) {
        if update.is_empty() {
            return;
        }
        self.edit_with(|account| {
            let profile = &mut account.profile;
            let fields = [
                (&mut profile.display_name, update.display_name),
                (&mut profile.username, update.username),
                (&mut profile.bio, update.bio),
                (&mut profile.avatar_url, update.avatar_url),
                (&mut profile.email, update.email),
                (&mut profile.timezone, update.timezone),
                (&mut profile.pronouns, update.pronouns),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    *field = value;
                }
            }
            if let Some(roles) = update.focus_roles {
                profile.focus_roles = dedupe_preserving_order(roles);
            }
            if let Some(genres) = update.preferred_genres {
                profile.preferred_genres = dedupe_preserving_order(genres);
            }
        });
    }

    pub fn set_two_factor(&self, enabled: bool) {
        self.edit_with(|account| account.security.two_factor_enabled = enabled);
    }

    pub fn toggle_login_alerts(&self, enabled: bool) {
        self.edit_with(|account| account.security.login_alerts = enabled);
    }

    /// Issues a fresh set of backup codes.
    pub fn rotate_backup_codes(&self) {
        self.edit_with(|account| {
            account.security.backup_codes_remaining = ROTATED_BACKUP_CODES;
        });
    }

    /// Marks a passkey as registered under `label` (trimmed).
    ///
    /// # Errors
    ///
    /// - [`StoreError::BlankPasskeyLabel`] - `label` is empty after trimming
    pub fn register_passkey(&self, label: &str) -> Result<(), StoreError> {
        let label = label.trim();
        if label.is_empty() {
            return Err(StoreError::BlankPasskeyLabel);
        }
        self.edit(|account| {
            account.security.passkey_enabled = true;
            account.security.passkey_label = Some(label.to_string());
            Ok(())
        })
    }

    /// Marks a device session as trusted or untrusted.
    ///
    /// # Arguments
    ///
    /// * `device_id` - Id of a session in `security.devices`
    /// * `trusted` - New trust flag
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownDevice`] - No session has that id; nothing is published
    pub fn set_device_trust(&self, device_id: &str, trusted: bool) -> Result<(), StoreError> {
        self.edit(|account| {
            let device = account
                .security
                .devices
                .iter_mut()
                .find(|d| d.id == device_id)
                .ok_or_else(|| StoreError::UnknownDevice(device_id.to_string()))?;
            device.trusted = trusted;
            Ok(())
        })
    }

    /// Turns one delivery channel of a notification preference on or off.
    ///
    /// # Errors
    ///
    /// - [`StoreError::UnknownNotification`] - No preference has that id
    pub fn update_notification_channel(
        &self,
        preference_id: &str,
        channel: Channel,
        enabled: bool,
    ) -> Result<(), StoreError> {
        self.edit(|account| {
            let pref = account
                .notifications
                .iter_mut()
                .find(|n| n.id == preference_id)
                .ok_or_else(|| StoreError::UnknownNotification(preference_id.to_string()))?;
            pref.channels.set(channel, enabled);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// - [`StoreError::UnknownNotification`] - No preference has that id
    pub fn update_notification_cadence(
        &self,
        preference_id: &str,
        cadence: Cadence,
    ) -> Result<(), StoreError> {
        self.edit(|account| {
            let pref = account
                .notifications
                .iter_mut()
                .find(|n| n.id == preference_id)
                .ok_or_else(|| StoreError::UnknownNotification(preference_id.to_string()))?;
            pref.cadence = cadence;
            Ok(())
        })
    }
}
