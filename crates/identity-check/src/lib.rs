// Deny unused code to catch dead code early
#![deny(unused)]
// Warn on unused dependencies to catch feature/cfg mismatches
#![warn(unused_crate_dependencies)]
// Warn on redundant path prefixes (e.g., std::time::Duration when Duration is imported)
#![warn(unused_qualifications)]
// Use log::* macros instead of println!/eprintln!, the host picks the log backend
#![deny(clippy::print_stdout, clippy::print_stderr)]

//! Email allow-list verification for host applications.
//!
//! The host owns one [`IdentityClient`] per session. The client asks the remote service whether
//! an email is registered and not blacklisted, caches the verdict in memory, persists the email
//! (never the verdict) in per-user preferences, and sends fire-and-forget usage beacons.

pub mod config;
mod ignore_poison;
pub mod verification;

pub use config::VerificationConfig;
pub use verification::{
    CheckResult, FileStore, HttpTransport, IdentityClient, IdentityStore, MemoryStore, StoreError, Transport,
    ValidationOutcome, VerificationError, VerificationState, is_plausible_email,
};
