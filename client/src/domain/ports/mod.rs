//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_gateway;
mod category_repository;
mod connection_probe;

#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{
    AUTH_EVENT_BUFFER, AuthEventReceiver, AuthGateway, AuthGatewayError, FixtureAuthGateway,
    SignUpOutcome,
};
#[cfg(test)]
pub use category_repository::MockCategoryRepository;
pub use category_repository::{
    CategoryRepository, CategoryRepositoryError, FixtureCategoryRepository, RepositoryResult,
};
#[cfg(test)]
pub use connection_probe::MockConnectionProbe;
pub use connection_probe::{ConnectionProbe, ConnectionStatus};
