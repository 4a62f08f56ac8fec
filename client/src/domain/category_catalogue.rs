//! Category list view-model bound to one business.
//!
//! Mirrors what the category screen needs: the rows, loading flags, and the
//! last error. Every mutation re-fetches the list once it completes, so the
//! latest completed response is what the view shows. After
//! [`CategoryCatalogue::unmount`] results still in flight are dropped instead
//! of applied.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::ports::{CategoryRepository, RepositoryResult};
use crate::domain::{
    BusinessId, BusinessKind, Category, CategoryId, CategoryList, CategoryUpdate, DomainError,
    NewCategory,
};

/// What the category screen renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueSnapshot {
    /// Rows of the last completed list or search.
    pub categories: Vec<Category>,
    /// A list or search is in flight.
    pub loading: bool,
    /// A create (single, batch, or defaults) is in flight.
    pub is_creating: bool,
    /// Last failure, until cleared or replaced.
    pub error: Option<DomainError>,
}

/// One entry of a batch create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    /// Category name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
}

#[derive(Debug)]
struct Shared<R> {
    repository: Arc<R>,
    business_id: BusinessId,
    mounted: AtomicBool,
    state: watch::Sender<CatalogueSnapshot>,
}

/// Cloneable handle; clones share state and the mounted flag.
#[derive(Debug)]
pub struct CategoryCatalogue<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for CategoryCatalogue<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Busy {
    Creating,
    Saving,
}

impl<R> CategoryCatalogue<R>
where
    R: CategoryRepository,
{
    /// Mount a catalogue for `business_id`. Nothing is fetched until [`load`].
    ///
    /// [`load`]: Self::load
    pub fn new(repository: Arc<R>, business_id: BusinessId) -> Self {
        let (state, _) = watch::channel(CatalogueSnapshot::default());
        Self {
            shared: Arc::new(Shared {
                repository,
                business_id,
                mounted: AtomicBool::new(true),
                state,
            }),
        }
    }

    /// Business the catalogue is bound to.
    pub fn business_id(&self) -> BusinessId {
        self.shared.business_id
    }

    /// Copy of the current view state.
    pub fn snapshot(&self) -> CatalogueSnapshot {
        self.shared.state.borrow().clone()
    }

    /// Receiver notified whenever the view state changes.
    pub fn subscribe(&self) -> watch::Receiver<CatalogueSnapshot> {
        self.shared.state.subscribe()
    }

    /// Whether results are still being applied.
    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::Acquire)
    }

    /// Stop applying results. Calls already in flight still complete.
    pub fn unmount(&self) {
        self.shared.mounted.store(false, Ordering::Release);
        debug!(business_id = %self.shared.business_id, "category catalogue unmounted");
    }

    /// Fetch all categories of the business.
    ///
    /// On failure the rows are cleared and the error recorded.
    pub async fn load(&self) {
        self.begin_fetch("load");
        let result = self.shared.repository.list(self.shared.business_id).await;
        self.finish_fetch("load", result);
    }

    /// Same as [`load`](Self::load).
    pub async fn refresh(&self) {
        self.load().await;
    }

    /// Replace the rows with those whose name contains `term`.
    ///
    /// A blank term loads the full list.
    pub async fn search(&self, term: &str) {
        let term = term.trim();
        if term.is_empty() {
            self.load().await;
            return;
        }
        self.begin_fetch("search");
        let result = self
            .shared
            .repository
            .search_by_name(self.shared.business_id, term)
            .await;
        self.finish_fetch("search", result);
    }

    /// Create one category, then reload. Returns whether it was created.
    pub async fn create(&self, name: &str, description: Option<&str>) -> bool {
        let new = match NewCategory::new(self.shared.business_id, name, description) {
            Ok(new) => new,
            Err(error) => return self.reject("create", error.into()),
        };
        self.mutate("create", Busy::Creating, self.shared.repository.create(&new))
            .await
    }

    /// Create several categories in one request, then reload.
    pub async fn create_many(&self, drafts: &[CategoryDraft]) -> bool {
        let batch: Result<Vec<NewCategory>, _> = drafts
            .iter()
            .map(|draft| {
                NewCategory::new(
                    self.shared.business_id,
                    &draft.name,
                    draft.description.as_deref(),
                )
            })
            .collect();
        match batch {
            Ok(batch) => self.create_batch("create_many", &batch).await,
            Err(error) => self.reject("create_many", error.into()),
        }
    }

    /// Create the starter set for `kind`, then reload.
    pub async fn create_defaults(&self, kind: BusinessKind) -> bool {
        match kind.starter_categories(self.shared.business_id) {
            Ok(batch) => self.create_batch("create_defaults", &batch).await,
            Err(error) => self.reject("create_defaults", error.into()),
        }
    }

    /// Change one category, then reload.
    pub async fn update(
        &self,
        id: CategoryId,
        name: Option<&str>,
        description: Option<Option<&str>>,
    ) -> bool {
        let update = match CategoryUpdate::new(name, description) {
            Ok(update) => update,
            Err(error) => return self.reject("update", error.into()),
        };
        self.mutate("update", Busy::Saving, self.shared.repository.update(id, &update))
            .await
    }

    /// Delete one category, then reload.
    pub async fn delete(&self, id: CategoryId) -> bool {
        self.mutate("delete", Busy::Saving, self.shared.repository.delete(id))
            .await
    }

    /// Forget the last error.
    pub fn clear_error(&self) {
        self.apply("clear_error", |state| state.error = None);
    }

    async fn create_batch(&self, operation: &'static str, batch: &[NewCategory]) -> bool {
        self.mutate(
            operation,
            Busy::Creating,
            self.shared.repository.create_many(batch),
        )
        .await
    }

    async fn mutate<T>(
        &self,
        operation: &'static str,
        busy: Busy,
        call: impl Future<Output = RepositoryResult<T>>,
    ) -> bool {
        self.apply(operation, |state| {
            state.is_creating = busy == Busy::Creating;
            state.error = None;
        });
        match call.await {
            Ok(_) => {
                if self.is_mounted() {
                    self.load().await;
                }
                self.apply(operation, |state| state.is_creating = false);
                true
            }
            Err(error) => {
                warn!(
                    operation,
                    business_id = %self.shared.business_id,
                    %error,
                    "category mutation failed"
                );
                let error = DomainError::from(error);
                self.apply(operation, |state| {
                    state.is_creating = false;
                    state.error = Some(error);
                });
                false
            }
        }
    }

    fn reject(&self, operation: &'static str, error: DomainError) -> bool {
        debug!(operation, %error, "category input rejected");
        self.apply(operation, |state| state.error = Some(error));
        false
    }

    fn begin_fetch(&self, operation: &'static str) {
        self.apply(operation, |state| {
            state.loading = true;
            state.error = None;
        });
    }

    fn finish_fetch(&self, operation: &'static str, result: RepositoryResult<CategoryList>) {
        let outcome = result.map(|list| list.items).map_err(|error| {
            warn!(
                operation,
                business_id = %self.shared.business_id,
                %error,
                "category fetch failed"
            );
            DomainError::from(error)
        });
        self.apply(operation, |state| {
            state.loading = false;
            match outcome {
                Ok(rows) => state.categories = rows,
                Err(error) => {
                    state.categories.clear();
                    state.error = Some(error);
                }
            }
        });
    }

    fn apply(&self, operation: &'static str, change: impl FnOnce(&mut CatalogueSnapshot)) {
        if !self.is_mounted() {
            debug!(operation, "catalogue unmounted; discarding result");
            return;
        }
        self.shared.state.send_modify(change);
    }
}
