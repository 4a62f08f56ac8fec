//! Port abstraction for category repositories and their errors.
//!
//! Every operation maps to exactly one remote call and resolves to a
//! [`RepositoryResult`]: the data on success, a human-readable failure
//! otherwise. Adapters never panic on remote failures and never retry.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::define_port_error;
use crate::domain::{
    BusinessId, Category, CategoryId, CategoryList, CategoryUpdate, DomainError, NewCategory,
};

define_port_error! {
    /// Failures raised by category repository adapters.
    pub enum CategoryRepositoryError {
        /// No row matched a single-row request.
        NotFound { message: String } => "{message}",
        /// The service refused the request (bad filter, policy, constraint).
        Rejected { message: String } => "{message}",
        /// The caller is not allowed to see or change the rows.
        Unauthorized { message: String } => "{message}",
        /// The request did not complete in time.
        Timeout { message: String } => "request timed out: {message}",
        /// The request never produced a response.
        Transport { message: String } => "service unreachable: {message}",
        /// The response body could not be decoded.
        Decode { message: String } => "unexpected response: {message}",
    }
}

/// Uniform success/failure shape for repository operations.
pub type RepositoryResult<T> = Result<T, CategoryRepositoryError>;

impl From<CategoryRepositoryError> for DomainError {
    fn from(value: CategoryRepositoryError) -> Self {
        let message = value.to_string();
        match value {
            CategoryRepositoryError::NotFound { .. } => Self::not_found(message),
            CategoryRepositoryError::Unauthorized { .. } => Self::authentication(message),
            CategoryRepositoryError::Rejected { .. }
            | CategoryRepositoryError::Timeout { .. }
            | CategoryRepositoryError::Transport { .. }
            | CategoryRepositoryError::Decode { .. } => Self::service(message),
        }
    }
}

/// Port for category persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories of a business ordered by name, with the exact count.
    async fn list(&self, business_id: BusinessId) -> RepositoryResult<CategoryList>;

    /// One category by id.
    async fn get(&self, id: CategoryId) -> RepositoryResult<Category>;

    /// Categories of a business whose name contains `term`, case-insensitively.
    async fn search_by_name(
        &self,
        business_id: BusinessId,
        term: &str,
    ) -> RepositoryResult<CategoryList>;

    /// Insert one category and return the stored row.
    async fn create(&self, category: &NewCategory) -> RepositoryResult<Category>;

    /// Insert several categories in a single request.
    async fn create_many(&self, categories: &[NewCategory]) -> RepositoryResult<Vec<Category>>;

    /// Apply `update` to one category and return the stored row.
    async fn update(&self, id: CategoryId, update: &CategoryUpdate)
    -> RepositoryResult<Category>;

    /// Delete one category.
    async fn delete(&self, id: CategoryId) -> RepositoryResult<()>;

    /// Number of categories of a business.
    async fn count(&self, business_id: BusinessId) -> RepositoryResult<u64>;
}

/// In-memory repository used by tests and offline demos.
///
/// Behaves like the remote table: ids and timestamps are assigned on insert,
/// lists are ordered by name, and each trait call counts as one request.
#[derive(Debug, Default)]
pub struct FixtureCategoryRepository {
    rows: Mutex<Vec<Category>>,
    calls: AtomicUsize,
}

impl FixtureCategoryRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of trait calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn materialise(category: &NewCategory) -> Category {
        Category {
            id: CategoryId::from_uuid(Uuid::new_v4()),
            business_id: category.business_id(),
            name: category.name().to_owned(),
            description: category.description().map(str::to_owned),
            created_at: Utc::now(),
        }
    }

    fn missing(id: CategoryId) -> CategoryRepositoryError {
        CategoryRepositoryError::not_found(format!("category {id} not found"))
    }

    async fn select(&self, business_id: BusinessId, term: Option<&str>) -> CategoryList {
        let needle = term.map(str::to_lowercase);
        let mut items: Vec<Category> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|row| row.business_id == business_id)
            .filter(|row| {
                needle
                    .as_deref()
                    .is_none_or(|needle| row.name.to_lowercase().contains(needle))
            })
            .cloned()
            .collect();
        items.sort_by(|left, right| left.name.cmp(&right.name));
        let count = Some(items.len() as u64);
        CategoryList { items, count }
    }
}

#[async_trait]
impl CategoryRepository for FixtureCategoryRepository {
    async fn list(&self, business_id: BusinessId) -> RepositoryResult<CategoryList> {
        self.record_call();
        Ok(self.select(business_id, None).await)
    }

    async fn get(&self, id: CategoryId) -> RepositoryResult<Category> {
        self.record_call();
        self.rows
            .lock()
            .await
            .iter()
            .find(|row| row.id == id)
            .cloned()
            .ok_or_else(|| Self::missing(id))
    }

    async fn search_by_name(
        &self,
        business_id: BusinessId,
        term: &str,
    ) -> RepositoryResult<CategoryList> {
        self.record_call();
        Ok(self.select(business_id, Some(term)).await)
    }

    async fn create(&self, category: &NewCategory) -> RepositoryResult<Category> {
        self.record_call();
        let row = Self::materialise(category);
        self.rows.lock().await.push(row.clone());
        Ok(row)
    }

    async fn create_many(&self, categories: &[NewCategory]) -> RepositoryResult<Vec<Category>> {
        self.record_call();
        let rows: Vec<Category> = categories.iter().map(Self::materialise).collect();
        self.rows.lock().await.extend(rows.iter().cloned());
        Ok(rows)
    }

    async fn update(
        &self,
        id: CategoryId,
        update: &CategoryUpdate,
    ) -> RepositoryResult<Category> {
        self.record_call();
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| Self::missing(id))?;
        if let Some(name) = update.name() {
            name.clone_into(&mut row.name);
        }
        if let Some(description) = update.description() {
            row.description = description.map(str::to_owned);
        }
        Ok(row.clone())
    }

    async fn delete(&self, id: CategoryId) -> RepositoryResult<()> {
        self.record_call();
        // Deleting a missing row is not an error for the remote table either.
        self.rows.lock().await.retain(|row| row.id != id);
        Ok(())
    }

    async fn count(&self, business_id: BusinessId) -> RepositoryResult<u64> {
        self.record_call();
        Ok(self.select(business_id, None).await.items.len() as u64)
    }
}
