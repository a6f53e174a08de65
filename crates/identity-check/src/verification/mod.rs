//! Email verification against the remote allow-list.
//!
//! The client asks the check endpoint whether an email is registered and not blacklisted, keeps
//! the verdict in memory only, and stores the email itself through an [`IdentityStore`].
//! Usage beacons go to a second endpoint and are fire-and-forget.

mod client;
mod error;
mod state;
mod store;
mod transport;
mod wire;


pub use client::{IdentityClient, ValidationOutcome, is_plausible_email};
pub use error::VerificationError;
pub use state::VerificationState;
pub use store::{FileStore, IdentityStore, MemoryStore, STORE_KEY_EMAIL, StoreError};
pub use transport::{HttpTransport, Transport};
pub use wire::CheckResult;
