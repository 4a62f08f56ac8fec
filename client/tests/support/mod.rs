//! Shared fixtures for the Supabase adapter integration tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;
use serde_json::{Value, json};
use storefront::outbound::supabase::{SupabaseClient, SupabaseSettings};
use wiremock::MockServer;

pub const ANON_KEY: &str = "anon-key";
pub const USER_ID: &str = "8f0e7a51-3c3c-4c55-9a5e-111111111111";
pub const BUSINESS_ID: &str = "0b5c3f1e-2a2a-4b4b-8c8c-222222222222";

/// Clock tests move forward by hand.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid start instant"));
        Self(Mutex::new(start))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Client pointed at `server` reading time from `clock`.
pub fn client(server: &MockServer, clock: Arc<MutableClock>) -> SupabaseClient {
    let settings = SupabaseSettings::new(server.uri(), ANON_KEY, Duration::from_secs(5));
    SupabaseClient::with_clock(&settings, clock).expect("client builds")
}

pub fn user_json(email: &str) -> Value {
    json!({
        "id": USER_ID,
        "aud": "authenticated",
        "email": email,
        "user_metadata": {}
    })
}

/// Token grant answer whose access token expires `expires_in` seconds later.
pub fn session_json(access: &str, refresh: &str, expires_in: i64) -> Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": expires_in,
        "refresh_token": refresh,
        "user": user_json("a@b.com")
    })
}

pub fn category_json(id: &str, name: &str, description: Option<&str>) -> Value {
    json!({
        "id": id,
        "business_id": BUSINESS_ID,
        "name": name,
        "description": description,
        "created_at": "2024-05-01T12:00:00+00:00"
    })
}
