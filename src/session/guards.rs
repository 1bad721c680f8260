//! Route guards: render-time gates that turn session state into routing
//! decisions. Decisions are returned as data; performing the navigation
//! and showing notices is the embedding UI's job. These are UX-only
//! guards; real access control must live on the API.

use tracing::debug;

use crate::session::{SessionGuard, SessionPhase};

/// Notice shown when a stored token no longer validates.
pub const SESSION_EXPIRED_NOTICE: &str = "Your session has expired. Please login again.";
/// Notice shown when an unverified account reaches a protected view.
pub const VERIFY_EMAIL_NOTICE: &str = "Please verify your email address to continue.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// Toast-style message accompanying a redirect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: &'static str,
}

/// Outcome of gating a protected view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteDecision {
    /// Render the protected children.
    Render,
    /// Session state is still loading; render a blocking placeholder and
    /// make no navigation decision.
    Pending,
    RedirectToLogin { notice: Option<Notice> },
    RedirectToVerifyEmail { notice: Notice },
}

/// Outcome of gating an auth view (login, signup).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthRouteDecision {
    Render,
    Pending,
    /// Already signed in; go back to the app instead of showing the form.
    RedirectToApp,
}

/// Gates a protected view on the current session snapshot.
///
/// The token-presence check is local and runs before anything else, so a
/// signed-out client is redirected without a network round-trip.
#[must_use]
pub fn protected_route(guard: &SessionGuard) -> RouteDecision {
    let session = guard.session();
    if session.is_loading() {
        return RouteDecision::Pending;
    }
    if !guard.has_access_token() {
        return RouteDecision::RedirectToLogin { notice: None };
    }
    match session.phase() {
        SessionPhase::Authenticated(user) if !user.is_verified => {
            debug!("unverified account routed to verification");
            RouteDecision::RedirectToVerifyEmail {
                notice: Notice {
                    level: NoticeLevel::Warning,
                    message: VERIFY_EMAIL_NOTICE,
                },
            }
        }
        SessionPhase::Authenticated(_) => RouteDecision::Render,
        _ => {
            debug!("token present but session not authenticated");
            RouteDecision::RedirectToLogin {
                notice: Some(Notice {
                    level: NoticeLevel::Error,
                    message: SESSION_EXPIRED_NOTICE,
                }),
            }
        }
    }
}

/// Stricter variant that re-validates the token on every navigation, so a
/// token revoked server-side mid-session is caught on the next path
/// change. Poll-on-navigate, not push invalidation; a validation that
/// cannot reach the backend redirects to login (fail closed, never open).
pub async fn protected_route_strict(guard: &SessionGuard) -> RouteDecision {
    match protected_route(guard) {
        RouteDecision::Render => {
            if guard.check_token_validity().await {
                // Validation refreshed the snapshot; re-apply the ladder in
                // case the verified flag changed server-side.
                protected_route(guard)
            } else {
                RouteDecision::RedirectToLogin {
                    notice: Some(Notice {
                        level: NoticeLevel::Error,
                        message: SESSION_EXPIRED_NOTICE,
                    }),
                }
            }
        }
        decision => decision,
    }
}

/// Gates auth views: a signed-in user is sent back to the app instead of
/// seeing the login or signup form again.
#[must_use]
pub fn auth_route(guard: &SessionGuard) -> AuthRouteDecision {
    let session = guard.session();
    if session.is_loading() {
        return AuthRouteDecision::Pending;
    }
    if session.is_authenticated() {
        AuthRouteDecision::RedirectToApp
    } else {
        AuthRouteDecision::Render
    }
}
