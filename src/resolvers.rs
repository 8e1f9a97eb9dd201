//! Root query resolvers backed by the catalog

use std::sync::Arc;

use crate::catalog::{Catalog, RecommendationPolicy};
use crate::model::{Product, User};

/// Number of products returned by `recommendedProducts`
pub const RECOMMENDATION_COUNT: usize = 3;

#[derive(Debug, Clone)]
pub struct QueryResolver {
    catalog: Arc<Catalog>,
    policy: RecommendationPolicy,
}

impl QueryResolver {
    pub fn new(catalog: Arc<Catalog>, policy: RecommendationPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn me(&self) -> &User {
        self.catalog.first_user()
    }

    /// Look up a user; an unknown id is `None`, not an error
    pub fn user(&self, id: &str) -> Option<&User> {
        let user = self.catalog.find_user_by_id(id);
        if user.is_none() {
            tracing::debug!(id, "user not found");
        }
        user
    }

    pub fn users(&self) -> &[User] {
        self.catalog.list_users()
    }

    pub fn recommended_products(&self) -> Vec<Product> {
        self.catalog
            .recommended_products(RECOMMENDATION_COUNT, self.policy)
    }
}
