//! Session store: the single source of truth for who is logged in.
//!
//! The store owns one listener task. It subscribes to the gateway's auth
//! events, performs the one-time session restore, and then feeds every event
//! through [`reconcile`]. That task is the only writer of the state; the
//! operations below talk to the gateway and report back to the caller, but
//! never touch the state themselves. A successful [`SessionStore::sign_in`]
//! therefore means "credentials accepted"; the login becomes visible once the
//! `SignedIn` event has been applied (see [`SessionStore::wait_for`]).

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::ports::{AuthEventReceiver, AuthGateway, AuthGatewayError, SignUpOutcome};
use crate::domain::{
    AuthAction, AuthEvent, AuthFailure, AuthState, Email, Principal, SignInCredentials,
    SignUpCredentials, reconcile,
};

/// The listener task stopped before the awaited state was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("session store listener stopped")]
pub struct ListenerStopped;

/// Owns the listener task; aborting it drops the event subscription.
#[derive(Debug)]
struct SubscriptionGuard {
    handle: Option<JoinHandle<()>>,
}

impl SubscriptionGuard {
    async fn release(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            // Cancellation is the expected outcome; a panic was already logged.
            if let Err(error) = handle.await {
                if error.is_panic() {
                    warn!(%error, "session listener panicked");
                }
            }
        }
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Process-wide authentication state container.
///
/// Construct it once with [`SessionStore::start`] and pass it (or an `Arc`
/// of it) to whatever needs it.
#[derive(Debug)]
pub struct SessionStore<G> {
    gateway: Arc<G>,
    state: watch::Receiver<AuthState>,
    subscription: SubscriptionGuard,
}

impl<G> SessionStore<G>
where
    G: AuthGateway + 'static,
{
    /// Enter `Initializing`, subscribe to auth events, and start the restore.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(gateway: Arc<G>) -> Self {
        let (writer, state) = watch::channel(AuthState::Initializing);
        // Subscribe before restoring so no event emitted meanwhile is lost.
        let events = gateway.subscribe();
        let handle = tokio::spawn(listen(Arc::clone(&gateway), events, writer));
        Self {
            gateway,
            state,
            subscription: SubscriptionGuard {
                handle: Some(handle),
            },
        }
    }

    /// Snapshot of the current state.
    pub fn current(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Current principal, if authenticated.
    pub fn principal(&self) -> Option<Principal> {
        self.state.borrow().principal().cloned()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.clone()
    }

    /// Wait until `predicate` holds for the current state.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerStopped`] if the listener ends first.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&AuthState) -> bool,
    ) -> Result<AuthState, ListenerStopped> {
        let mut state = self.state.clone();
        let reached = state
            .wait_for(predicate)
            .await
            .map_err(|_| ListenerStopped)?;
        Ok(reached.clone())
    }

    /// Wait for the first session check to complete.
    ///
    /// # Errors
    ///
    /// Returns [`ListenerStopped`] if the listener ends first.
    pub async fn wait_until_initialized(&self) -> Result<AuthState, ListenerStopped> {
        self.wait_for(|state| !state.is_initializing()).await
    }

    /// Send credentials to the service.
    ///
    /// Blank fields are rejected without a request. On success the state
    /// changes only when the resulting `SignedIn` event arrives.
    ///
    /// # Errors
    ///
    /// Returns a classified [`AuthFailure`]; nothing is retried.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthFailure> {
        let credentials = SignInCredentials::try_from_parts(email, password)?;
        self.gateway
            .sign_in_with_password(&credentials)
            .await
            .map_err(|error| classify(AuthAction::SignIn, error))
    }

    /// Register a new account.
    ///
    /// Success does not mean logged in: the service may require the email to
    /// be confirmed first, reported as [`SignUpOutcome::ConfirmationPending`].
    ///
    /// # Errors
    ///
    /// Returns a validation failure without a request for blank fields,
    /// mismatched passwords, or passwords that are too short.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<SignUpOutcome, AuthFailure> {
        let credentials = SignUpCredentials::try_from_parts(email, password, confirmation)?;
        self.gateway
            .sign_up(&credentials)
            .await
            .map_err(|error| classify(AuthAction::SignUp, error))
    }

    /// Ask the service to invalidate the session.
    ///
    /// # Errors
    ///
    /// On failure the state is left as it was and the error is returned.
    pub async fn sign_out(&self) -> Result<(), AuthFailure> {
        self.gateway
            .sign_out()
            .await
            .map_err(|error| classify(AuthAction::SignOut, error))
    }

    /// Request a password reset email. Never affects the state.
    ///
    /// # Errors
    ///
    /// Returns a validation failure for a blank email, or the service failure.
    pub async fn reset_password(&self, email: &str) -> Result<(), AuthFailure> {
        let email = Email::for_reset(email)?;
        self.gateway
            .reset_password_for_email(&email)
            .await
            .map_err(|error| classify(AuthAction::ResetPassword, error))
    }

    /// Stop the listener and release the event subscription.
    pub async fn shutdown(mut self) {
        self.subscription.release().await;
        info!("session store stopped");
    }
}

fn classify(action: AuthAction, error: AuthGatewayError) -> AuthFailure {
    warn!(action = ?action, %error, "auth request failed");
    match error {
        AuthGatewayError::InvalidCredentials => AuthFailure::InvalidCredentials,
        AuthGatewayError::EmailNotConfirmed => AuthFailure::EmailNotConfirmed,
        AuthGatewayError::Rejected { message } => AuthFailure::service(action, message),
        other @ (AuthGatewayError::Transport { .. } | AuthGatewayError::Decode { .. }) => {
            AuthFailure::service(action, other.to_string())
        }
    }
}

async fn listen<G>(gateway: Arc<G>, mut events: AuthEventReceiver, writer: watch::Sender<AuthState>)
where
    G: AuthGateway,
{
    let restored = read_session(gateway.as_ref()).await;
    apply(&writer, &AuthEvent::Restored(restored));

    loop {
        match events.recv().await {
            Ok(event) => apply(&writer, &event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "auth events lagged; re-reading session");
                let restored = read_session(gateway.as_ref()).await;
                apply(&writer, &AuthEvent::Restored(restored));
            }
            Err(RecvError::Closed) => {
                warn!("auth event stream closed; session state is now frozen");
                break;
            }
        }
    }
}

async fn read_session<G>(gateway: &G) -> Option<crate::domain::Session>
where
    G: AuthGateway + ?Sized,
{
    match gateway.get_session().await {
        Ok(session) => session,
        Err(error) => {
            warn!(%error, "session restore failed; continuing as anonymous");
            None
        }
    }
}

fn apply(writer: &watch::Sender<AuthState>, event: &AuthEvent) {
    writer.send_modify(|current| {
        let next = reconcile(current, event);
        debug!(
            event = event.kind(),
            from = current.label(),
            to = next.label(),
            "auth state reconciled"
        );
        *current = next;
    });
}
