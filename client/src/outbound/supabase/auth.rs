//! GoTrue-backed [`AuthGateway`] adapter.
//!
//! Owns the adapter-side session cell and emits the auth events the session
//! store reconciles. A successful sign-in only stores the session and emits
//! `SignedIn`; the store decides what that means.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use super::client::{RawResponse, SupabaseClient, body_preview};
use super::dto::{
    ErrorBodyDto, PasswordGrantDto, RecoverDto, RefreshGrantDto, SessionDto, SignUpResponseDto,
};
use crate::domain::ports::{AuthEventReceiver, AuthGateway, AuthGatewayError, SignUpOutcome};
use crate::domain::{AuthEvent, Email, Session, SignInCredentials, SignUpCredentials};

const INVALID_CREDENTIALS_CODE: &str = "invalid_credentials";
const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid login credentials";
const EMAIL_NOT_CONFIRMED_CODE: &str = "email_not_confirmed";
const EMAIL_NOT_CONFIRMED_MESSAGE: &str = "Email not confirmed";

/// Auth gateway talking to `<project>/auth/v1`.
#[derive(Debug, Clone)]
pub struct SupabaseAuthGateway {
    client: SupabaseClient,
}

impl SupabaseAuthGateway {
    pub(super) fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthGatewayError> {
        self.client
            .base()
            .join(&format!("auth/v1/{path}"))
            .map_err(|error| AuthGatewayError::transport(error.to_string()))
    }

    async fn post_anon<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<RawResponse, AuthGatewayError> {
        let url = self.endpoint(path)?;
        let request = self.client.anon_request(Method::POST, url).json(body);
        self.client
            .execute(request)
            .await
            .map_err(map_transport_error)
    }

    fn decode_session(&self, body: &[u8]) -> Result<Session, AuthGatewayError> {
        let dto: SessionDto = serde_json::from_slice(body).map_err(|error| {
            AuthGatewayError::decode(format!("invalid session payload: {error}"))
        })?;
        dto.into_session(self.client.now())
            .map_err(AuthGatewayError::decode)
    }

    async fn establish(&self, session: Session) {
        self.client.replace_session(Some(session.clone())).await;
        self.client.emit(AuthEvent::SignedIn(session));
    }

    /// Exchange the refresh token once; `Ok(None)` means the session is gone.
    async fn refresh(&self, stale: &Session) -> Result<Option<Session>, AuthGatewayError> {
        let grant = RefreshGrantDto {
            refresh_token: stale.refresh_token.expose(),
        };
        let response = self.post_anon("token?grant_type=refresh_token", &grant).await?;
        if !response.status.is_success() {
            let error = map_status_error(response.status, &response.body);
            warn!(%error, "session refresh rejected; signing out locally");
            self.client.replace_session(None).await;
            self.client.emit(AuthEvent::SessionExpired);
            return Ok(None);
        }
        let session = self.decode_session(&response.body)?;
        self.client.replace_session(Some(session.clone())).await;
        self.client.emit(AuthEvent::TokenRefreshed(session.clone()));
        Ok(Some(session))
    }
}

#[async_trait]
impl AuthGateway for SupabaseAuthGateway {
    async fn sign_in_with_password(
        &self,
        credentials: &SignInCredentials,
    ) -> Result<(), AuthGatewayError> {
        let grant = PasswordGrantDto {
            email: credentials.email().as_str(),
            password: credentials.password(),
        };
        let response = self.post_anon("token?grant_type=password", &grant).await?;
        if !response.status.is_success() {
            return Err(map_status_error(response.status, &response.body));
        }
        let session = self.decode_session(&response.body)?;
        debug!(user_id = %session.principal.id, "password sign-in accepted");
        self.establish(session).await;
        Ok(())
    }

    async fn sign_up(
        &self,
        credentials: &SignUpCredentials,
    ) -> Result<SignUpOutcome, AuthGatewayError> {
        let body = PasswordGrantDto {
            email: credentials.email().as_str(),
            password: credentials.password(),
        };
        let response = self.post_anon("signup", &body).await?;
        if !response.status.is_success() {
            return Err(map_status_error(response.status, &response.body));
        }
        let decoded: SignUpResponseDto = serde_json::from_slice(&response.body).map_err(|error| {
            AuthGatewayError::decode(format!("invalid sign-up payload: {error}"))
        })?;
        match decoded {
            SignUpResponseDto::User(user) => {
                debug!(user_id = %user.id, "sign-up awaiting email confirmation");
                Ok(SignUpOutcome::ConfirmationPending)
            }
            SignUpResponseDto::Session(dto) => {
                let session = dto
                    .into_session(self.client.now())
                    .map_err(AuthGatewayError::decode)?;
                self.establish(session).await;
                Ok(SignUpOutcome::SignedIn)
            }
        }
    }

    async fn sign_out(&self) -> Result<(), AuthGatewayError> {
        if let Some(session) = self.client.session().await {
            let url = self.endpoint("logout")?;
            let request =
                self.client
                    .request_as(Method::POST, url, session.access_token.expose());
            let response = self
                .client
                .execute(request)
                .await
                .map_err(map_transport_error)?;
            // An already invalid token still ends the local session.
            let already_gone = matches!(
                response.status,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND
            );
            if !response.status.is_success() && !already_gone {
                return Err(map_status_error(response.status, &response.body));
            }
        }
        self.client.replace_session(None).await;
        self.client.emit(AuthEvent::SignedOut);
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &Email) -> Result<(), AuthGatewayError> {
        let body = RecoverDto {
            email: email.as_str(),
        };
        let response = self.post_anon("recover", &body).await?;
        if !response.status.is_success() {
            return Err(map_status_error(response.status, &response.body));
        }
        Ok(())
    }

    async fn get_session(&self) -> Result<Option<Session>, AuthGatewayError> {
        let Some(session) = self.client.session().await else {
            return Ok(None);
        };
        if !session.is_expired_at(self.client.now()) {
            return Ok(Some(session));
        }
        debug!(user_id = %session.principal.id, "stored session expired; refreshing");
        self.refresh(&session).await
    }

    fn subscribe(&self) -> AuthEventReceiver {
        self.client.subscribe()
    }
}

fn map_transport_error(error: reqwest::Error) -> AuthGatewayError {
    AuthGatewayError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AuthGatewayError {
    let parsed = ErrorBodyDto::parse(body).unwrap_or_default();
    let code = parsed.code();
    let message = parsed.message().map_or_else(
        || {
            let preview = body_preview(body);
            if preview.is_empty() {
                format!("status {}", status.as_u16())
            } else {
                preview
            }
        },
        str::to_owned,
    );

    if code == Some(INVALID_CREDENTIALS_CODE)
        || message.eq_ignore_ascii_case(INVALID_CREDENTIALS_MESSAGE)
    {
        AuthGatewayError::invalid_credentials()
    } else if code == Some(EMAIL_NOT_CONFIRMED_CODE)
        || message.eq_ignore_ascii_case(EMAIL_NOT_CONFIRMED_MESSAGE)
    {
        AuthGatewayError::email_not_confirmed()
    } else {
        AuthGatewayError::rejected(message)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for non-network auth error mapping.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::modern_code(
        br#"{"code":400,"error_code":"invalid_credentials","msg":"Invalid login credentials"}"#.as_slice(),
        AuthGatewayError::InvalidCredentials
    )]
    #[case::legacy_grant(
        br#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#.as_slice(),
        AuthGatewayError::InvalidCredentials
    )]
    #[case::unconfirmed(
        br#"{"error_code":"email_not_confirmed","msg":"Email not confirmed"}"#.as_slice(),
        AuthGatewayError::EmailNotConfirmed
    )]
    #[case::other(
        br#"{"msg":"User already registered"}"#.as_slice(),
        AuthGatewayError::Rejected { message: "User already registered".to_owned() }
    )]
    #[case::empty(
        b"".as_slice(),
        AuthGatewayError::Rejected { message: "status 400".to_owned() }
    )]
    fn status_errors_are_classified(#[case] body: &[u8], #[case] expected: AuthGatewayError) {
        assert_eq!(map_status_error(StatusCode::BAD_REQUEST, body), expected);
    }

    #[test]
    fn non_json_bodies_are_previewed() {
        let error = map_status_error(StatusCode::BAD_GATEWAY, b"<html>\n  upstream down </html>");
        assert_eq!(
            error,
            AuthGatewayError::rejected("<html> upstream down </html>")
        );
    }
}
