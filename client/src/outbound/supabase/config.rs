//! Environment-driven connection settings for the Supabase adapters.
//!
//! Missing or unusable values never abort startup: each one falls back to a
//! placeholder with a warning, and the settings remember that they are not
//! usable so the connection check can say "not configured" without a request.

use std::fmt;
use std::time::Duration;

use mockable::Env;
use tracing::warn;
use url::Url;
use zeroize::Zeroizing;

/// Project URL, e.g. `https://abc.supabase.co`.
pub const URL_ENV: &str = "SUPABASE_URL";
/// Public anon key sent as `apikey`.
pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
/// Per-request timeout in whole seconds.
pub const TIMEOUT_ENV: &str = "SUPABASE_TIMEOUT_SECS";

/// URL used when none is configured.
pub const PLACEHOLDER_URL: &str = "https://placeholder.supabase.co";
/// Key used when none is configured.
pub const PLACEHOLDER_KEY: &str = "placeholder-key";
/// Timeout used when none is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Connection settings for one Supabase project.
#[derive(Clone)]
pub struct SupabaseSettings {
    url: String,
    anon_key: Zeroizing<String>,
    timeout: Duration,
    configured: bool,
}

impl fmt::Debug for SupabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SupabaseSettings")
            .field("url", &self.url)
            .field("anon_key", &"**redacted**")
            .field("timeout", &self.timeout)
            .field("configured", &self.configured)
            .finish()
    }
}

impl SupabaseSettings {
    /// Explicit settings, treated as configured.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            anon_key: Zeroizing::new(anon_key.into()),
            timeout,
            configured: true,
        }
    }

    /// Read settings from `env`, falling back to placeholders.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mockable::MockEnv;
    /// use storefront::outbound::supabase::SupabaseSettings;
    ///
    /// let mut env = MockEnv::new();
    /// env.expect_string().returning(|_| None);
    ///
    /// let settings = SupabaseSettings::from_env(&env);
    /// assert!(settings.is_placeholder());
    /// assert!(!settings.has_valid_config());
    /// ```
    pub fn from_env<E: Env>(env: &E) -> Self {
        let url = url_from_env(env);
        let anon_key = anon_key_from_env(env);
        let configured = url.is_some() && anon_key.is_some();
        Self {
            url: url.unwrap_or_else(|| PLACEHOLDER_URL.to_owned()),
            anon_key: Zeroizing::new(anon_key.unwrap_or_else(|| PLACEHOLDER_KEY.to_owned())),
            timeout: timeout_from_env(env),
            configured,
        }
    }

    /// Project base URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Public anon key.
    pub fn anon_key(&self) -> &str {
        self.anon_key.as_str()
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Both URL and key came from configuration.
    pub fn has_valid_config(&self) -> bool {
        self.configured
    }

    /// Either value is a placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.url.contains("placeholder") || self.anon_key.contains("placeholder")
    }
}

fn url_from_env<E: Env>(env: &E) -> Option<String> {
    let Some(raw) = non_blank(env, URL_ENV) else {
        warn!("{URL_ENV} not set; using placeholder project URL");
        return None;
    };
    match Url::parse(&raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            Some(url.as_str().trim_end_matches('/').to_owned())
        }
        Ok(_) | Err(_) => {
            warn!(value = %raw, "invalid {URL_ENV}; using placeholder project URL");
            None
        }
    }
}

fn anon_key_from_env<E: Env>(env: &E) -> Option<String> {
    let key = non_blank(env, ANON_KEY_ENV);
    if key.is_none() {
        warn!("{ANON_KEY_ENV} not set; using placeholder key");
    }
    key
}

fn timeout_from_env<E: Env>(env: &E) -> Duration {
    let secs = match non_blank(env, TIMEOUT_ENV) {
        None => DEFAULT_TIMEOUT_SECS,
        Some(raw) => match raw.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            Ok(_) | Err(_) => {
                warn!(value = %raw, "invalid {TIMEOUT_ENV}; using default");
                DEFAULT_TIMEOUT_SECS
            }
        },
    };
    Duration::from_secs(secs)
}

fn non_blank<E: Env>(env: &E, name: &str) -> Option<String> {
    env.string(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}
