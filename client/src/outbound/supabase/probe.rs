//! Startup connectivity check against the `categories` table.

use async_trait::async_trait;
use reqwest::Method;
use tracing::{info, warn};

use super::category_repository::{map_status_error, map_transport_error};
use super::client::SupabaseClient;
use super::query::TableQuery;
use crate::domain::ports::{CategoryRepositoryError, ConnectionProbe, ConnectionStatus};

/// Issues a head-only exact count; a "no rows" answer still proves reachability.
#[derive(Debug, Clone)]
pub struct SupabaseConnectionProbe {
    client: SupabaseClient,
}

impl SupabaseConnectionProbe {
    pub(super) fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn head_count(&self) -> Result<(), CategoryRepositoryError> {
        let url = TableQuery::table("categories")
            .select("*")
            .url(self.client.base())
            .map_err(|error| CategoryRepositoryError::transport(error.to_string()))?;
        let request = self
            .client
            .anon_request(Method::HEAD, url)
            .header("Prefer", "count=exact");
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|error| map_transport_error(&error))?;
        if response.status.is_success() {
            Ok(())
        } else {
            Err(map_status_error(response.status, &response.body))
        }
    }
}

#[async_trait]
impl ConnectionProbe for SupabaseConnectionProbe {
    async fn check_connection(&self) -> ConnectionStatus {
        if self.client.is_placeholder() {
            warn!("Supabase is not configured; skipping connection check");
            return ConnectionStatus::NotConfigured;
        }
        match self.head_count().await {
            Ok(()) | Err(CategoryRepositoryError::NotFound { .. }) => {
                info!("Supabase connection verified");
                ConnectionStatus::Connected
            }
            Err(error) => {
                warn!(%error, "Supabase connection check failed");
                ConnectionStatus::Unreachable {
                    message: error.to_string(),
                }
            }
        }
    }
}
