//! Domain primitives, services, and ports.
//!
//! Purpose: hold the client's behaviour independent of any transport. The
//! session store, route guard, and category catalogue only talk to the
//! outside world through the traits in [`ports`].
//!
//! Public surface:
//! - DomainError / ErrorCode: failure payload shown by forms and views.
//! - Auth inputs (`SignInCredentials`, `SignUpCredentials`, `Email`) and the
//!   classified `AuthFailure`.
//! - `Session`, `Principal`, `AuthEvent`, `AuthState`, and `reconcile`.
//! - `SessionStore`: the single authentication state container.
//! - `routes` and `route_guard`: navigation surface and its guard.
//! - `Category` and its payloads, `BusinessKind` starter sets, and the
//!   `CategoryCatalogue` view-model.

pub mod auth;
pub mod auth_events;
pub mod category;
pub mod category_catalogue;
pub mod category_defaults;
pub mod error;
pub mod ports;
pub mod route_guard;
pub mod routes;
pub mod session;
pub mod session_store;

pub use self::auth::{
    AuthAction, AuthFailure, CredentialsValidationError, Email, PASSWORD_MIN_LEN,
    SignInCredentials, SignUpCredentials,
};
pub use self::auth_events::{AuthEvent, AuthState, reconcile};
pub use self::category::{
    BusinessId, Category, CategoryId, CategoryList, CategoryUpdate, CategoryValidationError,
    NewCategory,
};
pub use self::category_catalogue::{CatalogueSnapshot, CategoryCatalogue, CategoryDraft};
pub use self::category_defaults::{BusinessKind, UnknownBusinessKind};
pub use self::error::{DomainError, ErrorCode};
pub use self::route_guard::{GuardDecision, evaluate, guard};
pub use self::routes::{AppRoute, NavigationTarget};
pub use self::session::{Principal, SecretToken, Session};
pub use self::session_store::{ListenerStopped, SessionStore};
