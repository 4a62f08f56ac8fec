//! Navigation guard: allow or redirect based on the session state.

use serde::Serialize;

use crate::domain::AuthState;
use crate::domain::routes::{HOME_PATH, LOGIN_PATH, NavigationTarget, post_login_destination};

/// Outcome of guarding one navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    /// Render the target.
    Allow,
    /// The first session check is pending; render a loading indicator.
    ShowLoading,
    /// Send the user to the login form, remembering where they were going.
    RedirectToLogin {
        /// Originally requested path, query and fragment included.
        return_to: String,
    },
    /// Send an authenticated user to the landing route.
    RedirectToHome,
}

impl GuardDecision {
    /// Path the router should navigate to, if the decision is a redirect.
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            Self::RedirectToLogin { .. } => Some(LOGIN_PATH),
            Self::RedirectToHome => Some(HOME_PATH),
            Self::Allow | Self::ShowLoading => None,
        }
    }
}

/// Decide what happens when `state` navigates to `target`.
///
/// Never redirects while the state is still initializing, so a restored
/// session is not bounced to the login form on startup.
pub fn evaluate(state: &AuthState, target: &NavigationTarget) -> GuardDecision {
    match state {
        AuthState::Initializing => GuardDecision::ShowLoading,
        AuthState::Anonymous if target.requires_auth() => GuardDecision::RedirectToLogin {
            return_to: target.requested().to_owned(),
        },
        AuthState::Authenticated(_) if target.is_auth_page() => GuardDecision::RedirectToHome,
        AuthState::Anonymous | AuthState::Authenticated(_) => GuardDecision::Allow,
    }
}

/// [`evaluate`] followed by the router's own alias: an allowed `/` forwards
/// to `/home`.
pub fn guard(state: &AuthState, target: &NavigationTarget) -> GuardDecision {
    match (evaluate(state, target), target.route().redirect()) {
        (GuardDecision::Allow, Some(_)) => GuardDecision::RedirectToHome,
        (decision, _) => decision,
    }
}

/// Destination after sign-in for a decision that sent the user to login.
pub fn resume_after_login(decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::RedirectToLogin { return_to } => {
            post_login_destination(Some(return_to.as_str()))
        }
        GuardDecision::Allow | GuardDecision::ShowLoading | GuardDecision::RedirectToHome => {
            post_login_destination(None)
        }
    }
}
