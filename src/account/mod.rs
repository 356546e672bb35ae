//! Strongly-typed account model.
//!
//! - [`types`]: the snapshot shape exposed to consumers
//! - [`defaults`]: the seeded record used before hydration and as mapper fallback

mod defaults;
mod types;

pub use defaults::{default_account_state, fallback_account, ROTATED_BACKUP_CODES};
pub use types::{
    AccountState, Cadence, Channel, DeviceSession, Integration, IntegrationService,
    IntegrationStatus, NotificationChannels, NotificationPreference, Profile, ProfileUpdate,
    Recommendation, SecuritySettings, UnknownVariant,
};
