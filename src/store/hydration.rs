use chrono::{DateTime, Utc};
use serde::Serialize;

/// Where the store is in its load cycle.
///
/// ```text
/// Loading ──ok──▶ Ready ──refetch──▶ Refreshing ──ok──▶ Ready
///    │                                   │
///    └──err──▶ Error ◀────────err────────┘
///               │
///               └──reload──▶ Loading
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HydrationStatus {
    Loading,
    Refreshing,
    Ready,
    Error,
}

/// How a load was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    /// Mount-time hydration or an explicit reload.
    Initial,
    /// Reconciliation after a remote mutation.
    Refetch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hydration {
    pub status: HydrationStatus,
    /// Message of the last failed load, cleared when a new load starts.
    pub error: Option<String>,
    /// When a load last succeeded. Survives failures.
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for Hydration {
    fn default() -> Self {
        Self {
            status: HydrationStatus::Loading,
            error: None,
            last_updated: None,
        }
    }
}

impl Hydration {
    pub fn is_ready(&self) -> bool {
        self.status == HydrationStatus::Ready
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self.status,
            HydrationStatus::Loading | HydrationStatus::Refreshing
        )
    }

    /// Enters the in-flight state for a new load.
    ///
    /// A refetch only shows as `Refreshing` on top of data that loaded; while
    /// the first load is outstanding, or after a failure, it reads as `Loading`.
    pub(crate) fn begin(&mut self, mode: LoadMode) {
        self.status = match (mode, self.status) {
            (LoadMode::Initial, _) => HydrationStatus::Loading,
            (LoadMode::Refetch, HydrationStatus::Ready | HydrationStatus::Refreshing) => {
                HydrationStatus::Refreshing
            }
            (LoadMode::Refetch, HydrationStatus::Loading | HydrationStatus::Error) => {
                HydrationStatus::Loading
            }
        };
        self.error = None;
    }

    pub(crate) fn succeed(&mut self, at: DateTime<Utc>) {
        self.status = HydrationStatus::Ready;
        self.error = None;
        self.last_updated = Some(at);
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.status = HydrationStatus::Error;
        self.error = Some(message);
    }
}
