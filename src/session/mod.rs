//! Session guard: the single source of truth for "is this client
//! authenticated, and as whom". It bootstraps from stored tokens,
//! funnels every token validation through a single in-flight slot,
//! applies fail-closed teardown on rejection, and keeps the observable
//! session state in step with storage.
//!
//! Validation doubles as the profile fetch: the backend has no dedicated
//! validation endpoint, so validity is inferred from `GET /profile/me`.

pub mod guards;
pub mod state;

use std::sync::{Arc, Mutex};

use secrecy::SecretString;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::client::{AuthClient, LoginOutcome};
use crate::config::ClientConfig;
use crate::errors::{ApiError, TokenValidity};
use crate::storage::{TokenStore, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use crate::types::{LoginRequest, RegisterRequest, User, VerifyAccountRequest, VerifyOtpRequest};

pub use state::{Session, SessionEvent, SessionPhase, SessionStore, SignedOutReason};

/// Result of [`SessionGuard::login`]: either a signed-in session, or an MFA
/// challenge that must be answered with [`SessionGuard::verify_otp`].
#[derive(Debug)]
pub enum LoginFlow {
    Complete(User),
    MfaRequired { login_code: String },
}

/// Client-side authentication state machine over an [`AuthClient`], a
/// [`TokenStore`], and a [`SessionStore`].
pub struct SessionGuard {
    client: AuthClient,
    store: Arc<dyn TokenStore>,
    state: SessionStore,
    /// Single-slot in-flight validation. Concurrent callers subscribe to
    /// the outcome of the running probe instead of starting a second one.
    inflight: Mutex<Option<broadcast::Sender<TokenValidity>>>,
}

enum Flight {
    Lead(broadcast::Sender<TokenValidity>),
    Join(broadcast::Receiver<TokenValidity>),
}

/// Clears the in-flight slot when the leading validation finishes or is
/// cancelled, so joiners never wait on a flight that no longer exists.
struct SlotClear<'a>(&'a Mutex<Option<broadcast::Sender<TokenValidity>>>);

impl Drop for SlotClear<'_> {
    fn drop(&mut self) {
        *self.0.lock().unwrap_or_else(|err| err.into_inner()) = None;
    }
}

impl SessionGuard {
    /// Builds a guard from config and a token store; fails on an invalid
    /// API base URL.
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        Ok(Self {
            client: AuthClient::new(&config)?,
            store,
            state: SessionStore::new(),
            inflight: Mutex::new(None),
        })
    }

    /// Current session snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.state.state()
    }

    /// Subscribes to session state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// The underlying session store, for embedders that drive transitions
    /// from their own flows.
    #[must_use]
    pub fn session_store(&self) -> &SessionStore {
        &self.state
    }

    /// The underlying API client, for pass-through calls (password reset,
    /// MFA settings) that do not change session state.
    #[must_use]
    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    /// Cheap local check used by route guards before any network activity.
    #[must_use]
    pub fn has_access_token(&self) -> bool {
        self.store.get(ACCESS_TOKEN_KEY).is_some()
    }

    /// Determines the initial session state from persisted tokens.
    ///
    /// With no stored access token this settles to unauthenticated without
    /// touching the network. Otherwise it runs (or joins) the shared
    /// validation probe.
    pub async fn bootstrap(&self) -> TokenValidity {
        if !self.has_access_token() {
            self.state
                .transition(SessionEvent::SignedOut(SignedOutReason::NoCredentials));
            return TokenValidity::Invalid;
        }
        self.validate().await
    }

    /// Probes the stored access token, returning the typed outcome.
    ///
    /// At most one probe is in flight at a time; concurrent callers attach
    /// to the running one and receive the same outcome. State and storage
    /// effects are applied by the leading caller before the outcome is
    /// shared.
    pub async fn validate(&self) -> TokenValidity {
        let flight = {
            let mut slot = self.inflight.lock().unwrap_or_else(|err| err.into_inner());
            match slot.as_ref() {
                Some(tx) => Flight::Join(tx.subscribe()),
                None => {
                    let (tx, _) = broadcast::channel(1);
                    *slot = Some(tx.clone());
                    Flight::Lead(tx)
                }
            }
        };

        match flight {
            Flight::Join(mut rx) => rx.recv().await.unwrap_or(TokenValidity::NetworkError),
            Flight::Lead(tx) => {
                let clear = SlotClear(&self.inflight);
                let outcome = self.probe().await;
                drop(clear);
                let _ = tx.send(outcome);
                outcome
            }
        }
    }

    /// Explicit re-validation entry point for route guards.
    ///
    /// An invalid token gets the same teardown as logout, minus the server
    /// revoke call. Network failure counts as not valid (fail closed).
    pub async fn check_token_validity(&self) -> bool {
        if !self.has_access_token() {
            self.state
                .transition(SessionEvent::SignedOut(SignedOutReason::NoCredentials));
            return false;
        }
        self.validate().await.is_valid()
    }

    /// Authenticates with credentials. MFA-enabled accounts receive a
    /// challenge and no tokens; everyone else is signed in directly.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginFlow, ApiError> {
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.client.login(&request).await? {
            LoginOutcome::MfaChallenge { login_code } => Ok(LoginFlow::MfaRequired { login_code }),
            LoginOutcome::Tokens(pair) => {
                self.store.put_tokens(&pair);
                let user = self.complete_sign_in(&pair.access_token).await?;
                Ok(LoginFlow::Complete(user))
            }
        }
    }

    /// Completes an MFA login with the challenge code and a TOTP.
    pub async fn verify_otp(&self, login_code: &str, otp: &str) -> Result<User, ApiError> {
        let request = VerifyOtpRequest {
            login_code: login_code.to_string(),
            otp: otp.to_string(),
        };
        let pair = self.client.verify_otp(&request).await?;
        self.store.put_tokens(&pair);
        self.complete_sign_in(&pair.access_token).await
    }

    /// Registers an account and signs it in with the issued tokens. The
    /// fresh account is unverified, so route guards will steer it to the
    /// verification view.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        let pair = self.client.register(request).await?;
        self.store.put_tokens(&pair);
        self.complete_sign_in(&pair.access_token).await
    }

    /// Signs out. The server-side revoke is best effort; local tokens are
    /// cleared and the session reset no matter what the backend says.
    pub async fn logout(&self) {
        if let Some(refresh) = self.store.get(REFRESH_TOKEN_KEY) {
            if let Err(err) = self.client.revoke_token(&refresh).await {
                // The user must never be stuck unable to log out.
                warn!("refresh token revoke failed: {err}");
            }
        }
        self.store.clear_tokens();
        self.state
            .transition(SessionEvent::SignedOut(SignedOutReason::LoggedOut));
    }

    /// Explicitly exchanges the stored refresh token for a new pair.
    /// Nothing calls this automatically; there is no rotation loop.
    pub async fn refresh_tokens(&self) -> Result<(), ApiError> {
        let Some(refresh) = self.store.get(REFRESH_TOKEN_KEY) else {
            return Err(ApiError::Config("No refresh token is stored.".to_string()));
        };
        let pair = self.client.refresh_token(&refresh).await?;
        self.store.put_tokens(&pair);
        Ok(())
    }

    /// Re-fetches the profile of an authenticated session.
    ///
    /// A rejected token tears the session down; a transport failure leaves
    /// the session and stored tokens untouched and surfaces the error.
    pub async fn refresh_user(&self) -> Result<(), ApiError> {
        let access = self.require_access_token()?;
        match self.client.fetch_profile(&access).await {
            Ok(user) => {
                self.state.transition(SessionEvent::ProfileLoaded(user));
                Ok(())
            }
            Err(err) => {
                if err.is_auth_rejection() {
                    self.teardown(SignedOutReason::SessionExpired);
                }
                Err(err)
            }
        }
    }

    /// Confirms the account email, then refreshes the profile so routing
    /// sees the verified flag without waiting for the next validation.
    pub async fn verify_account(&self, verification_code: &str) -> Result<(), ApiError> {
        let access = self.require_access_token()?;
        let request = VerifyAccountRequest {
            verification_code: verification_code.to_string(),
        };
        self.client.verify_account(&access, &request).await?;
        self.refresh_user().await
    }

    /// Requests a fresh verification code for the signed-in account.
    pub async fn resend_verification_code(&self) -> Result<(), ApiError> {
        let access = self.require_access_token()?;
        self.client.resend_verification_code(&access).await
    }

    /// Reacts to a token-store change made by another writer: collapse
    /// locally when the access token is gone, re-validate when it is
    /// present and no probe is already running.
    pub async fn handle_storage_change(&self) {
        if !self.has_access_token() {
            debug!("access token removed externally; signing out locally");
            self.state
                .transition(SessionEvent::SignedOut(SignedOutReason::NoCredentials));
            return;
        }
        let probing = self
            .inflight
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .is_some();
        if probing {
            return;
        }
        let _ = self.validate().await;
    }

    /// Drives [`Self::handle_storage_change`] from the store's change
    /// stream in a background task, keeping this session in step with
    /// sibling writers for the lifetime of the guard.
    pub fn spawn_storage_sync(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let guard = self;
        let mut events = guard.store.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(_event) => guard.handle_storage_change().await,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// Runs the actual validation probe and applies its outcome.
    async fn probe(&self) -> TokenValidity {
        let Some(access) = self.store.get(ACCESS_TOKEN_KEY) else {
            self.state
                .transition(SessionEvent::SignedOut(SignedOutReason::NoCredentials));
            return TokenValidity::Invalid;
        };
        match self.client.fetch_profile(&access).await {
            Ok(user) => {
                self.state.transition(SessionEvent::SignedIn(user));
                TokenValidity::Valid
            }
            Err(err) if err.is_auth_rejection() => {
                debug!("stored token rejected: {err}");
                self.teardown(SignedOutReason::SessionExpired);
                TokenValidity::Invalid
            }
            Err(err) => {
                warn!("token validation did not reach the backend: {err}");
                self.state
                    .transition(SessionEvent::SignedOut(SignedOutReason::BackendUnreachable));
                TokenValidity::NetworkError
            }
        }
    }

    /// Profile fetch for a just-stored token pair (login, OTP, signup).
    async fn complete_sign_in(&self, access: &SecretString) -> Result<User, ApiError> {
        match self.client.fetch_profile(access).await {
            Ok(user) => {
                self.state.transition(SessionEvent::SignedIn(user.clone()));
                Ok(user)
            }
            Err(err) => {
                if err.is_auth_rejection() {
                    self.teardown(SignedOutReason::SessionExpired);
                } else {
                    self.state
                        .transition(SessionEvent::SignedOut(SignedOutReason::BackendUnreachable));
                }
                Err(err)
            }
        }
    }

    /// The logout teardown minus the revoke call.
    fn teardown(&self, reason: SignedOutReason) {
        self.store.clear_tokens();
        self.state.transition(SessionEvent::SignedOut(reason));
    }

    fn require_access_token(&self) -> Result<SecretString, ApiError> {
        self.store
            .get(ACCESS_TOKEN_KEY)
            .ok_or_else(|| ApiError::Config("No access token is stored.".to_string()))
    }
}
