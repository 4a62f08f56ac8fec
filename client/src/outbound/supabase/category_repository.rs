//! PostgREST-backed [`CategoryRepository`] adapter for the `categories` table.
//!
//! Each operation is one request authorised as the signed-in user. Failures
//! are logged once here and returned as [`CategoryRepositoryError`] values;
//! nothing is retried.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_RANGE};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::client::{RawResponse, SupabaseClient, body_preview};
use super::dto::{CategoryPatchDto, CategoryRowDto, ErrorBodyDto, NewCategoryDto};
use super::query::{NO_ROWS_CODE, SINGLE_OBJECT, TableQuery, total_from_content_range};
use crate::domain::ports::{CategoryRepository, CategoryRepositoryError, RepositoryResult};
use crate::domain::{
    BusinessId, Category, CategoryId, CategoryList, CategoryUpdate, NewCategory,
};

const TABLE: &str = "categories";
const PREFER: &str = "Prefer";
const COUNT_EXACT: &str = "count=exact";
const RETURN_REPRESENTATION: &str = "return=representation";

/// Category repository over `<project>/rest/v1/categories`.
#[derive(Debug, Clone)]
pub struct SupabaseCategoryRepository {
    client: SupabaseClient,
}

impl SupabaseCategoryRepository {
    pub(super) fn new(client: SupabaseClient) -> Self {
        Self { client }
    }

    async fn request(
        &self,
        operation: &'static str,
        method: Method,
        query: &TableQuery,
    ) -> RepositoryResult<RequestBuilder> {
        let url = query.url(self.client.base()).map_err(|error| {
            log_failure(
                operation,
                CategoryRepositoryError::transport(format!("invalid request URL: {error}")),
            )
        })?;
        Ok(self.client.user_request(method, url).await)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> RepositoryResult<RawResponse> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|error| log_failure(operation, map_transport_error(&error)))?;
        if response.status.is_success() {
            debug!(operation, status = response.status.as_u16(), "category request succeeded");
            Ok(response)
        } else {
            Err(log_failure(
                operation,
                map_status_error(response.status, &response.body),
            ))
        }
    }

    async fn list_query(
        &self,
        operation: &'static str,
        query: TableQuery,
    ) -> RepositoryResult<CategoryList> {
        let request = self
            .request(operation, Method::GET, &query)
            .await?
            .header(PREFER, COUNT_EXACT);
        let response = self.send(operation, request).await?;
        let rows: Vec<CategoryRowDto> = decode(operation, &response.body)?;
        Ok(CategoryList {
            items: rows.into_iter().map(Category::from).collect(),
            count: content_range_total(&response),
        })
    }
}

#[async_trait]
impl CategoryRepository for SupabaseCategoryRepository {
    async fn list(&self, business_id: BusinessId) -> RepositoryResult<CategoryList> {
        let query = TableQuery::table(TABLE)
            .select("*")
            .eq("business_id", business_id)
            .order_asc("name");
        self.list_query("list", query).await
    }

    async fn get(&self, id: CategoryId) -> RepositoryResult<Category> {
        let query = TableQuery::table(TABLE).select("*").eq("id", id);
        let request = self
            .request("get", Method::GET, &query)
            .await?
            .header(ACCEPT, SINGLE_OBJECT);
        let response = self.send("get", request).await?;
        decode::<CategoryRowDto>("get", &response.body).map(Category::from)
    }

    async fn search_by_name(
        &self,
        business_id: BusinessId,
        term: &str,
    ) -> RepositoryResult<CategoryList> {
        let query = TableQuery::table(TABLE)
            .select("*")
            .eq("business_id", business_id)
            .ilike_contains("name", term)
            .order_asc("name");
        self.list_query("search", query).await
    }

    async fn create(&self, category: &NewCategory) -> RepositoryResult<Category> {
        let query = TableQuery::table(TABLE).select("*");
        let request = self
            .request("create", Method::POST, &query)
            .await?
            .header(PREFER, RETURN_REPRESENTATION)
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&[NewCategoryDto::from(category)]);
        let response = self.send("create", request).await?;
        decode::<CategoryRowDto>("create", &response.body).map(Category::from)
    }

    async fn create_many(&self, categories: &[NewCategory]) -> RepositoryResult<Vec<Category>> {
        if categories.is_empty() {
            return Ok(Vec::new());
        }
        let body: Vec<NewCategoryDto<'_>> = categories.iter().map(NewCategoryDto::from).collect();
        let query = TableQuery::table(TABLE).select("*");
        let request = self
            .request("create_many", Method::POST, &query)
            .await?
            .header(PREFER, RETURN_REPRESENTATION)
            .json(&body);
        let response = self.send("create_many", request).await?;
        let rows: Vec<CategoryRowDto> = decode("create_many", &response.body)?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn update(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> RepositoryResult<Category> {
        let query = TableQuery::table(TABLE).eq("id", id).select("*");
        let request = self
            .request("update", Method::PATCH, &query)
            .await?
            .header(PREFER, RETURN_REPRESENTATION)
            .header(ACCEPT, SINGLE_OBJECT)
            .json(&CategoryPatchDto::from(update));
        let response = self.send("update", request).await?;
        decode::<CategoryRowDto>("update", &response.body).map(Category::from)
    }

    async fn delete(&self, id: CategoryId) -> RepositoryResult<()> {
        let query = TableQuery::table(TABLE).eq("id", id);
        let request = self.request("delete", Method::DELETE, &query).await?;
        self.send("delete", request).await?;
        Ok(())
    }

    async fn count(&self, business_id: BusinessId) -> RepositoryResult<u64> {
        let query = TableQuery::table(TABLE)
            .select("*")
            .eq("business_id", business_id);
        let request = self
            .request("count", Method::HEAD, &query)
            .await?
            .header(PREFER, COUNT_EXACT);
        let response = self.send("count", request).await?;
        Ok(content_range_total(&response).unwrap_or(0))
    }
}

fn content_range_total(response: &RawResponse) -> Option<u64> {
    total_from_content_range(
        response
            .headers
            .get(CONTENT_RANGE)
            .and_then(|value| value.to_str().ok()),
    )
}

fn decode<T: DeserializeOwned>(operation: &'static str, body: &[u8]) -> RepositoryResult<T> {
    serde_json::from_slice(body).map_err(|error| {
        log_failure(
            operation,
            CategoryRepositoryError::decode(format!(
                "{error} (body: {})",
                body_preview(body)
            )),
        )
    })
}

fn log_failure(operation: &'static str, error: CategoryRepositoryError) -> CategoryRepositoryError {
    warn!(operation, %error, "category request failed");
    error
}

pub(super) fn map_transport_error(error: &reqwest::Error) -> CategoryRepositoryError {
    if error.is_timeout() {
        CategoryRepositoryError::timeout(error.to_string())
    } else {
        CategoryRepositoryError::transport(error.to_string())
    }
}

pub(super) fn map_status_error(status: StatusCode, body: &[u8]) -> CategoryRepositoryError {
    let parsed = ErrorBodyDto::parse(body).unwrap_or_default();
    let message = parsed.message().map_or_else(
        || {
            let preview = body_preview(body);
            if preview.is_empty() {
                format!("status {}", status.as_u16())
            } else {
                format!("status {}: {preview}", status.as_u16())
            }
        },
        str::to_owned,
    );

    if parsed.code() == Some(NO_ROWS_CODE) || status == StatusCode::NOT_ACCEPTABLE {
        return CategoryRepositoryError::not_found(message);
    }
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            CategoryRepositoryError::unauthorized(message)
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            CategoryRepositoryError::timeout(message)
        }
        status if status.is_client_error() => CategoryRepositoryError::rejected(message),
        _ => CategoryRepositoryError::transport(message),
    }
}
