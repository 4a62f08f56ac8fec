//! Auth events emitted by the remote service and the state they reconcile to.
//!
//! Every state change in the session store goes through [`reconcile`]; the
//! store never inspects event kinds beyond what that function does.

use crate::domain::{Principal, Session};

/// Auth lifecycle notification delivered by the auth gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    /// Result of reading the stored session: the one-time restore at startup,
    /// or a re-read after the event stream lagged.
    Restored(Option<Session>),
    /// A password sign-in (or auto-confirmed sign-up) produced a session.
    SignedIn(Session),
    /// The session was invalidated on request.
    SignedOut,
    /// The access token was exchanged for a fresh one.
    TokenRefreshed(Session),
    /// The session ran out and could not be refreshed.
    SessionExpired,
}

impl AuthEvent {
    /// Session carried by the event, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Restored(session) => session.as_ref(),
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut | Self::SessionExpired => None,
        }
    }

    /// Short label for log lines.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Restored(_) => "restored",
            Self::SignedIn(_) => "signed_in",
            Self::SignedOut => "signed_out",
            Self::TokenRefreshed(_) => "token_refreshed",
            Self::SessionExpired => "session_expired",
        }
    }
}

/// Who is logged in, as far as the client knows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AuthState {
    /// The first session check has not completed yet.
    #[default]
    Initializing,
    /// No valid principal.
    Anonymous,
    /// A valid principal with its live session.
    Authenticated(Session),
}

impl AuthState {
    /// Whether the first session check is still pending.
    pub fn is_initializing(&self) -> bool {
        matches!(self, Self::Initializing)
    }

    /// Whether a principal is present.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// The live session, if authenticated.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Initializing | Self::Anonymous => None,
        }
    }

    /// The current principal, if authenticated.
    pub fn principal(&self) -> Option<&Principal> {
        self.session().map(|session| &session.principal)
    }

    /// Short label for log lines.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Initializing => "initializing",
            Self::Anonymous => "anonymous",
            Self::Authenticated(_) => "authenticated",
        }
    }
}

/// Apply `event` to the current state.
///
/// Presence of a session means authenticated, absence means anonymous. The
/// previous state only matters in that nothing ever leads back to
/// [`AuthState::Initializing`].
pub fn reconcile(_current: &AuthState, event: &AuthEvent) -> AuthState {
    match event.session() {
        Some(session) => AuthState::Authenticated(session.clone()),
        None => AuthState::Anonymous,
    }
}
