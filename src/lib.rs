//! # Gardisto (Client Session Guard)
//!
//! `gardisto` owns client-side authentication state for applications that
//! talk to a backend issuing access/refresh token pairs. It validates the
//! stored bearer token against the backend on load and on navigation, and
//! produces routing decisions based on validation and verification status.
//!
//! ## Session lifecycle
//!
//! A session is created on bootstrap (token presence probe) or on explicit
//! login/registration/OTP success, and destroyed on logout, on a
//! token-invalidation response, or when another writer removes the token
//! from shared storage. `is_authenticated` implies a stored access token
//! existed at the time it was last validated; tokens are not proactively
//! renewed.
//!
//! ## Failing closed
//!
//! A validation that cannot reach the backend routes exactly like an
//! invalid token: to the login view, never into the protected app. The two
//! outcomes stay distinguishable ([`errors::TokenValidity`]) — rejection
//! clears stored tokens, unreachability keeps them for a later retry.
//!
//! ## One probe at a time
//!
//! All validation funnels through a single in-flight slot. Overlapping
//! triggers (mount plus a storage event, rapid navigations) attach to the
//! running probe and observe its outcome instead of racing it.

mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod session;
pub mod storage;
pub mod types;

pub use client::{AuthClient, LoginOutcome};
pub use config::ClientConfig;
pub use errors::{ApiError, TokenValidity};
pub use session::{
    guards, LoginFlow, Session, SessionEvent, SessionGuard, SessionPhase, SessionStore,
    SignedOutReason,
};
pub use storage::{MemoryTokenStore, StorageEvent, TokenStore};
pub use types::{TokenPair, User};
