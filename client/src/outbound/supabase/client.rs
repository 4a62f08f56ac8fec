//! Shared HTTP plumbing for the Supabase adapters.
//!
//! One [`SupabaseClient`] owns the reqwest client, the project URL and key,
//! the adapter-held session, and the auth event broadcaster. The port
//! adapters are cheap views over it, so a category request automatically
//! carries the access token of whoever signed in through the auth adapter.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use tokio::sync::{RwLock, broadcast};
use url::Url;
use zeroize::Zeroizing;

use super::auth::SupabaseAuthGateway;
use super::category_repository::SupabaseCategoryRepository;
use super::config::SupabaseSettings;
use super::probe::SupabaseConnectionProbe;
use crate::domain::ports::AUTH_EVENT_BUFFER;
use crate::domain::{AuthEvent, Session};

/// Errors raised while building the client.
#[derive(Debug, thiserror::Error)]
pub enum SupabaseSetupError {
    /// The project URL could not be parsed.
    #[error("invalid Supabase URL '{url}': {source}")]
    InvalidUrl {
        /// Offending value.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// A completed HTTP exchange with its body read.
#[derive(Debug)]
pub(super) struct RawResponse {
    pub(super) status: StatusCode,
    pub(super) headers: HeaderMap,
    pub(super) body: Vec<u8>,
}

struct ClientInner {
    http: Client,
    base: Url,
    anon_key: Zeroizing<String>,
    placeholder: bool,
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    clock: Arc<dyn Clock>,
}

/// Connection to one Supabase project.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base", &self.inner.base.as_str())
            .field("placeholder", &self.inner.placeholder)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Build a client using the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`SupabaseSetupError`] when the URL does not parse or the HTTP
    /// client cannot be built.
    pub fn new(settings: &SupabaseSettings) -> Result<Self, SupabaseSetupError> {
        Self::with_clock(settings, Arc::new(DefaultClock))
    }

    /// Build a client that reads "now" from `clock` for expiry checks.
    ///
    /// # Errors
    ///
    /// See [`SupabaseClient::new`].
    pub fn with_clock(
        settings: &SupabaseSettings,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, SupabaseSetupError> {
        let mut base =
            Url::parse(settings.url()).map_err(|source| SupabaseSetupError::InvalidUrl {
                url: settings.url().to_owned(),
                source,
            })?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http = Client::builder().timeout(settings.timeout()).build()?;
        let (events, _) = broadcast::channel(AUTH_EVENT_BUFFER);
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base,
                anon_key: Zeroizing::new(settings.anon_key().to_owned()),
                placeholder: settings.is_placeholder(),
                session: RwLock::new(None),
                events,
                clock,
            }),
        })
    }

    /// Auth gateway adapter.
    pub fn auth(&self) -> SupabaseAuthGateway {
        SupabaseAuthGateway::new(self.clone())
    }

    /// Category repository adapter.
    pub fn categories(&self) -> SupabaseCategoryRepository {
        SupabaseCategoryRepository::new(self.clone())
    }

    /// Connectivity probe adapter.
    pub fn probe(&self) -> SupabaseConnectionProbe {
        SupabaseConnectionProbe::new(self.clone())
    }

    pub(super) fn base(&self) -> &Url {
        &self.inner.base
    }

    pub(super) fn is_placeholder(&self) -> bool {
        self.inner.placeholder
    }

    pub(super) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.inner.clock.utc()
    }

    pub(super) async fn session(&self) -> Option<Session> {
        self.inner.session.read().await.clone()
    }

    pub(super) async fn replace_session(&self, session: Option<Session>) {
        *self.inner.session.write().await = session;
    }

    pub(super) fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.inner.events.subscribe()
    }

    pub(super) fn emit(&self, event: AuthEvent) {
        tracing::debug!(event = event.kind(), "auth event emitted");
        // Nobody listening yet is fine.
        let _ = self.inner.events.send(event);
    }

    /// Request with `apikey` set and the anon key as bearer.
    pub(super) fn anon_request(&self, method: Method, url: Url) -> RequestBuilder {
        self.request_as(method, url, self.inner.anon_key.as_str())
    }

    /// Request authorised as the signed-in user, or anonymously.
    pub(super) async fn user_request(&self, method: Method, url: Url) -> RequestBuilder {
        match self.inner.session.read().await.as_ref() {
            Some(session) => self.request_as(method, url, session.access_token.expose()),
            None => self.anon_request(method, url),
        }
    }

    /// Request with `apikey` set and `token` as bearer.
    pub(super) fn request_as(&self, method: Method, url: Url, token: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, url)
            .header("apikey", self.inner.anon_key.as_str())
            .header(AUTHORIZATION, bearer(token))
    }

    pub(super) async fn execute(
        &self,
        request: RequestBuilder,
    ) -> Result<RawResponse, reqwest::Error> {
        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn bearer(token: &str) -> HeaderValue {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .unwrap_or_else(|_| HeaderValue::from_static("Bearer"));
    value.set_sensitive(true);
    value
}

/// Collapse whitespace and cap a body for error messages.
pub(super) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
