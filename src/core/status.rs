//! Install status state machine.
//!
//! ```text
//! UNINSTALLED ──► INSTALLING ──► LIVE
//!                   │   ▲          │
//!                   ▼   └──────────┘
//!                 ERROR ──► INSTALLING
//! ```

use crate::entities::InstallStatus;

impl InstallStatus {
    /// Whether the pipeline may move from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Uninstalled | Self::Live | Self::Error, Self::Installing)
                | (Self::Installing, Self::Live | Self::Error)
        )
    }
}
