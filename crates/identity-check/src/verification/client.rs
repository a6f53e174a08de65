//! The verification client: cached verdicts, stored identity, usage beacons.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use super::error::VerificationError;
use super::state::VerificationState;
use super::store::{FileStore, IdentityStore};
use super::transport::{HttpTransport, Transport};
use super::wire::{CheckRequest, CheckResult, UsageEvent};
use crate::config::VerificationConfig;
use crate::ignore_poison::IgnorePoison;

const MSG_NOT_REGISTERED: &str = "User not registered";
const MSG_ACCOUNT_DISABLED: &str = "Account disabled";
const MSG_SUCCEEDED: &str = "Verification succeeded";

/// Result of one validation, ready for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub valid: bool,
    pub message: String,
}

impl ValidationOutcome {
    fn valid(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            message: message.into(),
        }
    }

    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

/// Check if a string is shaped like an email address (`local@domain.tld`).
///
/// Shape check only. Whether the address is registered is up to the service.
pub fn is_plausible_email(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

/// Verification client owned by the host session.
///
/// Cloning is cheap and every clone shares the same verdict, store and transport, so a clone can
/// be moved into spawned tasks.
pub struct IdentityClient<T: Transport = HttpTransport, S: IdentityStore = FileStore> {
    inner: Arc<ClientInner<T, S>>,
}

struct ClientInner<T, S> {
    config: VerificationConfig,
    transport: T,
    store: S,
    state: Mutex<VerificationState>,
    // FIFO async lock: overlapping validations run one at a time, in invocation order
    validation_turn: tokio::sync::Mutex<()>,
}

impl<T: Transport, S: IdentityStore> Clone for IdentityClient<T, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: IdentityStore> IdentityClient<HttpTransport, S> {
    /// Client talking HTTP to `config.base_url`.
    pub fn with_http(config: VerificationConfig, store: S) -> Result<Self, VerificationError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::new(config, transport, store))
    }
}

impl<T: Transport, S: IdentityStore> IdentityClient<T, S> {
    pub fn new(config: VerificationConfig, transport: T, store: S) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                config,
                transport,
                store,
                state: Mutex::new(VerificationState::Unchecked),
                validation_turn: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.inner.config
    }

    /// Returns the persisted email, or an empty string if none is stored.
    pub fn stored_email(&self) -> String {
        match self.inner.store.load_email() {
            Ok(email) => email.unwrap_or_default(),
            Err(e) => {
                log::warn!("Couldn't read stored email: {e}");
                String::new()
            }
        }
    }

    /// Overwrites the persisted email. No format check happens here.
    pub fn set_stored_email(&self, email: &str) {
        if let Err(e) = self.inner.store.save_email(email) {
            log::warn!("Couldn't persist email: {e}");
        }
    }

    fn forget_stored_email(&self) {
        if let Err(e) = self.inner.store.delete_email() {
            log::warn!("Couldn't delete stored email: {e}");
        }
    }

    /// Current verdict. Never does I/O.
    pub fn state(&self) -> VerificationState {
        *self.inner.state.lock_ignore_poison()
    }

    /// True only if the last completed validation since the last reset succeeded.
    pub fn is_valid(&self) -> bool {
        self.state().valid()
    }

    /// Drops the cached verdict so nobody reads a stale "valid" while a new check is in flight.
    pub fn reset_validation(&self) {
        *self.inner.state.lock_ignore_poison() = VerificationState::Unchecked;
    }

    fn settle(&self, outcome: &ValidationOutcome) {
        let state = if outcome.valid {
            VerificationState::Valid
        } else {
            VerificationState::Invalid
        };
        *self.inner.state.lock_ignore_poison() = state;
    }

    /// Asks the service whether `email` is registered and not blacklisted, and caches the verdict.
    ///
    /// Fails closed: any transport or parse failure yields an invalid outcome whose message
    /// carries the failure detail. Unknown, blacklisted and failed checks all delete the stored
    /// email; a successful check leaves it alone (callers persist on success). Never retries.
    pub async fn validate(&self, email: &str) -> ValidationOutcome {
        let _turn = self.inner.validation_turn.lock().await;
        self.run_check(email).await
    }

    /// Like [`Self::validate`], but drops the cached verdict once this call's turn starts. A check
    /// queued ahead of it therefore settles first and can't leave a stale "valid" behind.
    async fn validate_fresh(&self, email: &str) -> ValidationOutcome {
        let _turn = self.inner.validation_turn.lock().await;
        self.reset_validation();
        self.run_check(email).await
    }

    // Caller holds the validation turn
    async fn run_check(&self, email: &str) -> ValidationOutcome {
        let outcome = match self.check(email).await {
            Ok(result) => self.apply_check_result(email, result),
            Err(e) => {
                match &e {
                    VerificationError::MalformedResponse(_) => {
                        log::warn!("Verification for {email}: malformed response from server: {e}")
                    }
                    _ => log::warn!("Verification for {email} failed: {e}"),
                }
                self.forget_stored_email();
                ValidationOutcome::invalid(format!("Verification failed: {e}"))
            }
        };

        self.settle(&outcome);
        outcome
    }

    fn apply_check_result(&self, email: &str, result: CheckResult) -> ValidationOutcome {
        match (result.exists, result.is_blacklisted) {
            (false, _) => {
                log::info!("Verification for {email}: not registered");
                self.forget_stored_email();
                ValidationOutcome::invalid(MSG_NOT_REGISTERED)
            }
            (true, true) => {
                log::info!("Verification for {email}: account disabled");
                self.forget_stored_email();
                ValidationOutcome::invalid(MSG_ACCOUNT_DISABLED)
            }
            (true, false) => {
                log::info!("Verification for {email}: succeeded");
                ValidationOutcome::valid(MSG_SUCCEEDED)
            }
        }
    }

    async fn check(&self, email: &str) -> Result<CheckResult, VerificationError> {
        let body = self.post(&self.inner.config.check_url(), &CheckRequest { email }).await?;
        serde_json::from_str::<CheckResult>(&body).map_err(|e| VerificationError::MalformedResponse(e.to_string()))
    }

    /// Posts `payload` and bounds the whole exchange by the configured timeout, whatever the
    /// transport does on its own.
    async fn post(&self, url: &str, payload: &impl Serialize) -> Result<String, VerificationError> {
        let body = serde_json::to_value(payload).map_err(|e| VerificationError::InvalidInput(e.to_string()))?;
        tokio::time::timeout(self.inner.config.timeout, self.inner.transport.post_json(url, &body))
            .await
            .map_err(|_| VerificationError::Timeout)?
    }

    /// Sends a usage beacon for `email`.
    ///
    /// Returns false without touching the network if the email is empty or malformed, and false
    /// if the request fails. Any successful response counts, its body is ignored. Errors are
    /// logged, never returned.
    pub async fn record_usage_async(&self, email: &str) -> bool {
        let email = email.trim();
        if !is_plausible_email(email) {
            let e = VerificationError::InvalidInput(if email.is_empty() {
                "email is empty".to_string()
            } else {
                format!("'{email}' is not an email address")
            });
            log::warn!("Usage not recorded: {e}");
            return false;
        }
        self.send_usage(email).await
    }

    async fn send_usage(&self, email: &str) -> bool {
        match self.post(&self.inner.config.usage_url(), &UsageEvent { email }).await {
            Ok(_) => {
                log::debug!("Usage recorded for {email}");
                true
            }
            Err(e) => {
                log::warn!("Usage recording for {email} failed: {e}");
                false
            }
        }
    }

    /// Fire-and-forget usage beacon: runs [`Self::record_usage_async`] as a detached task.
    /// The outcome is only logged, and a failed beacon is never retried.
    pub fn record_usage(&self, email: &str) {
        let Ok(handle) = Handle::try_current() else {
            log::warn!("Usage not recorded for {email}: no async runtime");
            return;
        };
        let client = self.clone();
        let email = email.to_string();
        // Detached: the JoinHandle is dropped
        drop(handle.spawn(async move {
            client.record_usage_async(&email).await;
        }));
    }

    /// Beacon for an email the service has just confirmed, so the local shape check is skipped.
    fn record_confirmed_usage(&self, email: &str) {
        let Ok(handle) = Handle::try_current() else {
            log::warn!("Usage not recorded for {email}: no async runtime");
            return;
        };
        let client = self.clone();
        let email = email.to_string();
        drop(handle.spawn(async move {
            client.send_usage(&email).await;
        }));
    }

    /// Startup hook: if an email is stored, validates it once in the background.
    ///
    /// The host decides when its startup is over by choosing when to call this. The task only
    /// yields once before its first request, so work the host is still doing on the same runtime
    /// gets a head start but isn't waited for. Its outcome is only logged. Returns `None` when nothing is stored (or there is no
    /// runtime); dropping the handle detaches the task.
    pub fn spawn_startup_check(&self) -> Option<JoinHandle<()>> {
        let email = self.stored_email();
        if email.is_empty() {
            log::debug!("No stored email, skipping startup verification");
            return None;
        }
        let Ok(handle) = Handle::try_current() else {
            log::warn!("Startup verification skipped: no async runtime");
            return None;
        };

        let client = self.clone();
        Some(handle.spawn(async move {
            tokio::task::yield_now().await;
            let outcome = client.validate(&email).await;
            if outcome.valid {
                log::info!("Startup verification for {email}: {}", outcome.message);
            } else {
                log::warn!("Startup verification for {email}: {}", outcome.message);
            }
        }))
    }

    /// Register-button flow: validate `email` from scratch, and on success persist it and send a
    /// usage beacon.
    ///
    /// The cached verdict is reset when this check's turn starts, after any check already in
    /// flight. The beacon goes out for any address the service accepted, even one that
    /// [`is_plausible_email`] would reject.
    pub async fn submit(&self, email: &str) -> ValidationOutcome {
        let email = email.trim();
        let outcome = self.validate_fresh(email).await;
        if outcome.valid {
            self.set_stored_email(email);
            self.record_confirmed_usage(email);
        }
        outcome
    }
}
