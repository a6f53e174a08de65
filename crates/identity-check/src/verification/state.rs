//! In-memory verdict of the last validation.

use serde::Serialize;

/// Cached result of the last completed validation. Never persisted; a new session starts
/// `Unchecked`.
///
/// Transitions: `Unchecked -> Valid | Invalid` when a validation completes,
/// `Valid | Invalid -> Unchecked` on reset. Reads never transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum VerificationState {
    #[default]
    Unchecked,
    Valid,
    Invalid,
}

impl VerificationState {
    /// Whether a validation has completed since the last reset.
    pub fn checked(self) -> bool {
        !matches!(self, Self::Unchecked)
    }

    /// Whether the email is allowed. Only `Valid` counts, so an unchecked state is never valid.
    pub fn valid(self) -> bool {
        matches!(self, Self::Valid)
    }
}
