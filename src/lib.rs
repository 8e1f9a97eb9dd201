//! # accounts-subgraph
//!
//! Apollo Federation subgraph owning the `User` entity.
//!
//! ## Features
//!
//! - **Catalog** - Immutable in-memory users and product ids
//! - **Query Resolvers** - `me`, `user(id)`, `users`, `recommendedProducts`
//! - **Federation** - Entity reference resolution for `User` and `Product`
//! - **Fault Injection** - Percentage-based synthetic resolver failures
//! - **HTTP** - Axum handler serving the federated schema
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use accounts_subgraph::{build_schema, Catalog, ErrorInjector, RecommendationPolicy};
//!
//! # async fn example() -> accounts_subgraph::Result<()> {
//! let catalog = Arc::new(Catalog::seeded()?);
//! let schema = build_schema(catalog, RecommendationPolicy::CatalogOrder, ErrorInjector::disabled());
//! let response = schema.execute("{ me { id name } }").await;
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod fault;
pub mod federation;
pub mod http;
pub mod model;
pub mod resolvers;
pub mod schema;
pub mod telemetry;

pub use catalog::{Catalog, RecommendationPolicy};
pub use config::{LogFormat, Settings};
pub use fault::ErrorInjector;
pub use federation::{AccountsEntityResolver, Entity, EntityKey, EntityResolver, Representation};
pub use http::{graphql_handler, router};
pub use model::{Product, User};
pub use resolvers::QueryResolver;
pub use schema::{build_schema, AccountsSchema, Query};
pub use telemetry::{Telemetry, TelemetryConfig};

use async_graphql::ErrorExtensions;
use thiserror::Error;

/// Accounts subgraph errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AccountsError {
    #[error("{typename} not found: {id}")]
    ReferenceNotFound { typename: &'static str, id: String },

    #[error("Invalid entity representation: {0}")]
    InvalidRepresentation(String),

    #[error("Representation of {typename} is missing key field '{field}'")]
    MissingKeyField {
        typename: String,
        field: &'static str,
    },

    #[error("Unknown entity typename: {0}")]
    UnknownTypename(String),

    #[error("Catalog must contain at least one user")]
    EmptyCatalog,

    #[error("Duplicate {kind} id in catalog: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("{0}")]
    Injected(String),

    #[error("Invalid recommendation policy: {0}")]
    InvalidPolicy(String),
}

impl AccountsError {
    /// Machine-readable code placed in the GraphQL error extensions
    pub fn code(&self) -> &'static str {
        match self {
            Self::ReferenceNotFound { .. } => "REFERENCE_NOT_FOUND",
            Self::InvalidRepresentation(_)
            | Self::MissingKeyField { .. }
            | Self::UnknownTypename(_) => "BAD_REPRESENTATION",
            Self::Injected(_) => "SERVICE_ERROR",
            Self::EmptyCatalog | Self::DuplicateId { .. } | Self::InvalidPolicy(_) => {
                "INTERNAL_SERVER_ERROR"
            }
        }
    }
}

impl ErrorExtensions for AccountsError {
    fn extend(&self) -> async_graphql::Error {
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code().to_string());
            match self {
                Self::ReferenceNotFound { typename, id } => {
                    e.set("typename", typename.to_string());
                    e.set("id", id.clone());
                }
                Self::Injected(_) => e.set("injected", true),
                _ => {}
            }
        })
    }
}

/// Result type for accounts operations
pub type Result<T> = std::result::Result<T, AccountsError>;
