//! Wire types for the backend API. Every response is wrapped in a
//! `{status, message, data}` envelope; payload structs below mirror the
//! backend field names. Token material is wrapped in [`SecretString`] as
//! soon as it leaves the wire and must never be logged.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

/// Response envelope used by every backend endpoint.
///
/// `status` is `"success"` or `"error"`; a 2xx answer can still carry an
/// error envelope, so callers go through [`ApiEnvelope::into_data`] or
/// [`ApiEnvelope::into_unit`] instead of reading fields directly.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiEnvelope<T> {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiEnvelope<T> {
    /// Unwraps a successful envelope that must carry a payload.
    pub fn into_data(self) -> Result<T, ApiError> {
        if self.status != "success" {
            return Err(ApiError::Backend(
                self.message.unwrap_or_else(|| "request failed".to_string()),
            ));
        }
        self.data
            .ok_or_else(|| ApiError::Parse("response envelope missing data".to_string()))
    }

    /// Unwraps a successful envelope whose payload, if any, is irrelevant.
    pub fn into_unit(self) -> Result<(), ApiError> {
        if self.status == "success" {
            Ok(())
        } else {
            Err(ApiError::Backend(
                self.message.unwrap_or_else(|| "request failed".to_string()),
            ))
        }
    }
}

/// Access/refresh token pair as issued by the backend.
#[derive(Clone)]
pub struct TokenPair {
    pub access_token: SecretString,
    pub refresh_token: SecretString,
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"***")
            .field("refresh_token", &"***")
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UsageLimit {
    pub limit: i64,
    pub used: i64,
}

/// Authenticated user snapshot assembled from the profile payload.
/// Immutable between profile fetches.
#[derive(Clone, Debug, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_mfa_enabled: bool,
    pub is_verified: bool,
    pub role: Role,
    pub limit: UsageLimit,
}

/// Raw `GET /profile/me` payload. The backend splits the account across
/// `user`/`profile`/`role`/`limit` sections; [`User`] flattens them.
#[derive(Debug, Deserialize)]
pub struct ProfilePayload {
    pub user: ProfileUserSection,
    pub profile: ProfileNameSection,
    pub role: Role,
    pub limit: UsageLimit,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUserSection {
    pub id: String,
    pub email: String,
    pub is_mfa_enabled: bool,
    pub is_verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProfileNameSection {
    pub first_name: String,
    pub last_name: String,
}

impl From<ProfilePayload> for User {
    fn from(payload: ProfilePayload) -> Self {
        Self {
            id: payload.user.id,
            email: payload.user.email,
            first_name: payload.profile.first_name,
            last_name: payload.profile.last_name,
            is_mfa_enabled: payload.user.is_mfa_enabled,
            is_verified: payload.user.is_verified,
            role: payload.role,
            limit: payload.limit,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Raw `POST /tokens/request` payload. MFA-enabled accounts get a login
/// code instead of tokens; [`crate::client::LoginOutcome`] makes the split
/// explicit.
#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub is_mfa_enabled: bool,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub login_code: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerifyOtpRequest {
    pub login_code: String,
    pub otp: String,
}

/// Token pair as it appears on the wire before being wrapped in secrets.
#[derive(Debug, Deserialize)]
pub struct TokenPairPayload {
    pub access_token: String,
    pub refresh_token: String,
}

impl From<TokenPairPayload> for TokenPair {
    fn from(payload: TokenPairPayload) -> Self {
        Self {
            access_token: SecretString::from(payload.access_token),
            refresh_token: SecretString::from(payload.refresh_token),
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct RegisterRequest {
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Raw `POST /users/register` payload; only the issued tokens matter to the
/// session guard, the rest is profile echo.
#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub tokens: TokenPairPayload,
}

#[derive(Clone, Debug, Serialize)]
pub struct VerifyAccountRequest {
    pub verification_code: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub reset_code: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}

/// TOTP provisioning material from `POST /settings/mfa/generate-otp`.
#[derive(Debug, Deserialize)]
pub struct OtpProvisioning {
    pub otp_secret: String,
    pub qr_code: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct EnableMfaRequest {
    pub otp: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct DisableMfaRequest {
    pub password: String,
}
