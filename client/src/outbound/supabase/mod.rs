//! Supabase adapters: GoTrue auth, PostgREST categories, and the connection probe.
//!
//! All three share one [`SupabaseClient`], so the session established by the
//! auth gateway authorises the repository's requests.

mod auth;
mod category_repository;
mod client;
mod config;
mod dto;
mod probe;
mod query;

pub use auth::SupabaseAuthGateway;
pub use category_repository::SupabaseCategoryRepository;
pub use client::{SupabaseClient, SupabaseSetupError};
pub use config::{
    ANON_KEY_ENV, DEFAULT_TIMEOUT_SECS, PLACEHOLDER_KEY, PLACEHOLDER_URL, SupabaseSettings,
    TIMEOUT_ENV, URL_ENV,
};
pub use probe::SupabaseConnectionProbe;
