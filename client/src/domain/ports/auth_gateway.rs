//! Driven port for the remote authentication service.
//!
//! The session store only ever talks to this trait. Outbound adapters own the
//! transport, the SDK-side session cell, and the event broadcaster; the
//! domain only sees validated inputs, sessions, and [`AuthEvent`]s.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::define_port_error;
use crate::domain::{
    AuthEvent, Email, Principal, SecretToken, Session, SignInCredentials, SignUpCredentials,
};

/// Receiving half of the auth-event stream.
pub type AuthEventReceiver = broadcast::Receiver<AuthEvent>;

/// Buffered events per subscriber before a slow listener starts lagging.
pub const AUTH_EVENT_BUFFER: usize = 32;

define_port_error! {
    /// Errors surfaced by auth gateway adapters.
    pub enum AuthGatewayError {
        /// Email/password pair was refused.
        InvalidCredentials => "invalid login credentials",
        /// Account exists but the email is unconfirmed.
        EmailNotConfirmed => "email not confirmed",
        /// The service answered with an error of its own.
        Rejected { message: String } => "{message}",
        /// The request never produced a response.
        Transport { message: String } => "auth service unreachable: {message}",
        /// The service answered with something that could not be decoded.
        Decode { message: String } => "auth service response decode failed: {message}",
    }
}

/// What a successful registration produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpOutcome {
    /// The service sent a confirmation email; nobody is signed in yet.
    ConfirmationPending,
    /// The service confirmed immediately and a `SignedIn` event follows.
    SignedIn,
}

/// Port for password authentication and session restore.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for a session.
    ///
    /// On success the adapter emits [`AuthEvent::SignedIn`]; callers must
    /// observe that event rather than treat the return value as a login.
    async fn sign_in_with_password(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<(), AuthGatewayError>;

    /// Register a new account.
    async fn sign_up(
        &self,
        credentials: &SignUpCredentials,
    ) -> Result<SignUpOutcome, AuthGatewayError>;

    /// Invalidate the current session; emits [`AuthEvent::SignedOut`] on success.
    async fn sign_out(&self) -> Result<(), AuthGatewayError>;

    /// Ask the service to email a password reset link.
    async fn reset_password_for_email(&self, email: &Email) -> Result<(), AuthGatewayError>;

    /// Return the session the adapter currently holds, if still usable.
    async fn get_session(&self) -> Result<Option<Session>, AuthGatewayError>;

    /// Subscribe to auth events emitted from now on.
    fn subscribe(&self) -> AuthEventReceiver;
}

#[derive(Debug)]
struct FixtureAccount {
    id: Uuid,
    password: Zeroizing<String>,
    confirmed: bool,
}

/// In-memory auth service used by tests and offline demos.
///
/// Accounts live in a map keyed by email. Every trait call counts as one
/// "network call" so callers can assert that validation short-circuits.
#[derive(Debug)]
pub struct FixtureAuthGateway {
    accounts: Mutex<HashMap<String, FixtureAccount>>,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    calls: AtomicUsize,
    auto_confirm: bool,
}

impl Default for FixtureAuthGateway {
    fn default() -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_BUFFER);
        Self {
            accounts: Mutex::new(HashMap::new()),
            session: Mutex::new(None),
            events,
            calls: AtomicUsize::new(0),
            auto_confirm: false,
        }
    }
}

impl FixtureAuthGateway {
    /// Create an empty gateway; sign-ups require confirmation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Confirm new accounts immediately and sign them in.
    #[must_use]
    pub fn auto_confirming(mut self) -> Self {
        self.auto_confirm = true;
        self
    }

    /// Seed a confirmed account.
    #[must_use]
    pub fn with_account(self, email: &str, password: &str) -> Self {
        self.seed(email, password, true)
    }

    /// Seed an account whose email was never confirmed.
    #[must_use]
    pub fn with_unconfirmed_account(self, email: &str, password: &str) -> Self {
        self.seed(email, password, false)
    }

    fn seed(mut self, email: &str, password: &str, confirmed: bool) -> Self {
        self.accounts.get_mut().insert(
            email.to_owned(),
            FixtureAccount {
                id: Uuid::new_v4(),
                password: Zeroizing::new(password.to_owned()),
                confirmed,
            },
        );
        self
    }

    /// Start with a stored session for `email`, as if restored from storage.
    #[must_use]
    pub fn with_stored_session(mut self, email: &str) -> Self {
        let id = self
            .accounts
            .get_mut()
            .get(email)
            .map_or_else(Uuid::new_v4, |account| account.id);
        *self.session.get_mut() = Some(Self::issue_session(id, email));
        self
    }

    /// Number of trait calls that reached the fake service.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Drop the stored session and announce the expiry, as the SDK would.
    pub async fn expire_session(&self) {
        self.session.lock().await.take();
        self.emit(AuthEvent::SessionExpired);
    }

    /// Rotate the stored session's tokens and announce the refresh.
    pub async fn refresh_session(&self) -> Option<Session> {
        let mut guard = self.session.lock().await;
        let current = guard.as_ref()?;
        let refreshed = Self::issue_session(
            current.principal.id,
            current.principal.email.as_deref().unwrap_or_default(),
        );
        *guard = Some(refreshed.clone());
        drop(guard);
        self.emit(AuthEvent::TokenRefreshed(refreshed.clone()));
        Some(refreshed)
    }

    fn issue_session(id: Uuid, email: &str) -> Session {
        Session {
            access_token: SecretToken::new(format!("fixture-access-{}", Uuid::new_v4())),
            refresh_token: SecretToken::new(format!("fixture-refresh-{}", Uuid::new_v4())),
            expires_at: Utc::now() + Duration::hours(1),
            principal: Principal {
                id,
                email: Some(email.to_owned()),
                metadata: serde_json::json!({}),
            },
        }
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AuthGateway for FixtureAuthGateway {
    async fn sign_in_with_password(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<(), AuthGatewayError> {
        self.record_call();
        let session = {
            let accounts = self.accounts.lock().await;
            let account = accounts
                .get(credentials.email().as_str())
                .filter(|account| account.password.as_str() == credentials.password())
                .ok_or_else(AuthGatewayError::invalid_credentials)?;
            if !account.confirmed {
                return Err(AuthGatewayError::email_not_confirmed());
            }
            Self::issue_session(account.id, credentials.email().as_str())
        };
        *self.session.lock().await = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session));
        Ok(())
    }

    async fn sign_up(
        &self,
        credentials: &SignUpCredentials,
    ) -> Result<SignUpOutcome, AuthGatewayError> {
        self.record_call();
        let email = credentials.email().as_str();
        let id = {
            let mut accounts = self.accounts.lock().await;
            if accounts.contains_key(email) {
                return Err(AuthGatewayError::rejected("User already registered"));
            }
            let id = Uuid::new_v4();
            accounts.insert(
                email.to_owned(),
                FixtureAccount {
                    id,
                    password: Zeroizing::new(credentials.password().to_owned()),
                    confirmed: self.auto_confirm,
                },
            );
            id
        };
        if !self.auto_confirm {
            return Ok(SignUpOutcome::ConfirmationPending);
        }
        let session = Self::issue_session(id, email);
        *self.session.lock().await = Some(session.clone());
        self.emit(AuthEvent::SignedIn(session));
        Ok(SignUpOutcome::SignedIn)
    }

    async fn sign_out(&self) -> Result<(), AuthGatewayError> {
        self.record_call();
        self.session.lock().await.take();
        self.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn reset_password_for_email(&self, _email: &Email) -> Result<(), AuthGatewayError> {
        self.record_call();
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthGatewayError> {
        self.record_call();
        Ok(self.session.lock().await.clone())
    }

    fn subscribe(&self) -> AuthEventReceiver {
        self.events.subscribe()
    }
}
