//! Client wrappers for the backend auth API. These helpers centralize
//! request plumbing and keep token material inside secrets, preventing
//! leakage into route or session code.

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;

use crate::api::Http;
use crate::config::ClientConfig;
use crate::errors::ApiError;
use crate::types::{
    ChangePasswordRequest, DisableMfaRequest, EnableMfaRequest, ForgotPasswordRequest,
    LoginPayload, LoginRequest, OtpProvisioning, ProfilePayload, RegisterPayload, RegisterRequest,
    ResetPasswordRequest, TokenPair, TokenPairPayload, User, VerifyAccountRequest,
    VerifyOtpRequest,
};

/// Result of a credential login: either a full token pair, or an MFA
/// challenge that must be answered with `verify_otp` before tokens are
/// issued.
#[derive(Debug)]
pub enum LoginOutcome {
    Tokens(TokenPair),
    MfaChallenge { login_code: String },
}

/// Thin async client for the backend auth endpoints.
pub struct AuthClient {
    http: Http,
}

impl AuthClient {
    /// Builds the client from config; fails on a missing or invalid base URL.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        Ok(Self {
            http: Http::new(config)?,
        })
    }

    /// Requests tokens with email/password credentials.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, ApiError> {
        let payload: LoginPayload = self
            .http
            .post_json("/tokens/request", request, None)
            .await?
            .into_data()?;

        match (payload.access_token, payload.refresh_token) {
            (Some(access_token), Some(refresh_token)) => {
                Ok(LoginOutcome::Tokens(TokenPair::from(TokenPairPayload {
                    access_token,
                    refresh_token,
                })))
            }
            _ => {
                let login_code = payload.login_code.ok_or_else(|| {
                    ApiError::Parse("login response carried neither tokens nor login code".to_string())
                })?;
                Ok(LoginOutcome::MfaChallenge { login_code })
            }
        }
    }

    /// Exchanges a login code and TOTP for a token pair.
    pub async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<TokenPair, ApiError> {
        let payload: TokenPairPayload = self
            .http
            .post_json("/tokens/verify-otp", request, None)
            .await?
            .into_data()?;
        Ok(TokenPair::from(payload))
    }

    /// Exchanges a refresh token for a new token pair. Not called
    /// automatically anywhere; rotation is an explicit operation.
    pub async fn refresh_token(&self, refresh_token: &SecretString) -> Result<TokenPair, ApiError> {
        let body = json!({ "refresh_token": refresh_token.expose_secret() });
        let payload: TokenPairPayload = self
            .http
            .post_json("/tokens/refresh", &body, None)
            .await?
            .into_data()?;
        Ok(TokenPair::from(payload))
    }

    /// Revokes a refresh token server-side.
    pub async fn revoke_token(&self, refresh_token: &SecretString) -> Result<(), ApiError> {
        let body = json!({ "refresh_token": refresh_token.expose_secret() });
        self.http
            .post_json::<_, serde_json::Value>("/tokens/revoke", &body, None)
            .await?
            .into_unit()
    }

    /// Fetches the profile of the token's owner.
    ///
    /// This is also the de facto token validity probe: there is no dedicated
    /// validation endpoint, validity is inferred from whether this succeeds.
    pub async fn fetch_profile(&self, access_token: &SecretString) -> Result<User, ApiError> {
        let payload: ProfilePayload = self
            .http
            .get_json("/profile/me", Some(access_token))
            .await?
            .into_data()?;
        Ok(User::from(payload))
    }

    /// Registers a new account; the backend issues a token pair immediately.
    pub async fn register(&self, request: &RegisterRequest) -> Result<TokenPair, ApiError> {
        let payload: RegisterPayload = self
            .http
            .post_json("/users/register", request, None)
            .await?
            .into_data()?;
        Ok(TokenPair::from(payload.tokens))
    }

    /// Confirms the account email with the emailed verification code.
    pub async fn verify_account(
        &self,
        access_token: &SecretString,
        request: &VerifyAccountRequest,
    ) -> Result<(), ApiError> {
        self.http
            .post_json::<_, serde_json::Value>("/users/verify-account", request, Some(access_token))
            .await?
            .into_unit()
    }

    /// Requests a fresh verification code for the signed-in account.
    pub async fn resend_verification_code(
        &self,
        access_token: &SecretString,
    ) -> Result<(), ApiError> {
        self.http
            .post_empty::<serde_json::Value>("/users/resend-verification-code", Some(access_token))
            .await?
            .into_unit()
    }

    /// Starts the password reset flow for an email address.
    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<(), ApiError> {
        self.http
            .post_json::<_, serde_json::Value>("/users/forgot-password", request, None)
            .await?
            .into_unit()
    }

    /// Completes the password reset flow with the emailed reset code.
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> Result<(), ApiError> {
        self.http
            .post_json::<_, serde_json::Value>("/users/reset-password", request, None)
            .await?
            .into_unit()
    }

    /// Provisions a TOTP secret for MFA enrollment.
    pub async fn generate_otp(
        &self,
        access_token: &SecretString,
    ) -> Result<OtpProvisioning, ApiError> {
        self.http
            .post_empty("/settings/mfa/generate-otp", Some(access_token))
            .await?
            .into_data()
    }

    /// Turns MFA on after the user proves possession of the TOTP secret.
    pub async fn enable_mfa(
        &self,
        access_token: &SecretString,
        request: &EnableMfaRequest,
    ) -> Result<(), ApiError> {
        self.http
            .post_json::<_, serde_json::Value>("/settings/mfa/enable", request, Some(access_token))
            .await?
            .into_unit()
    }

    /// Turns MFA off; requires the account password.
    pub async fn disable_mfa(
        &self,
        access_token: &SecretString,
        request: &DisableMfaRequest,
    ) -> Result<(), ApiError> {
        self.http
            .post_json::<_, serde_json::Value>("/settings/mfa/disable", request, Some(access_token))
            .await?
            .into_unit()
    }

    /// Changes the account password for the signed-in user.
    pub async fn change_password(
        &self,
        access_token: &SecretString,
        request: &ChangePasswordRequest,
    ) -> Result<(), ApiError> {
        self.http
            .post_json::<_, serde_json::Value>(
                "/settings/change-password",
                request,
                Some(access_token),
            )
            .await?
            .into_unit()
    }
}
