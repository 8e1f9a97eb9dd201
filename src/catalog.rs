//! Read-only catalog of users and product ids
//!
//! Built once at startup and shared behind an `Arc`. Nothing writes to it
//! afterwards, so lookups need no locking.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;

use crate::model::{Product, User};
use crate::{AccountsError, Result};

const SEED_USERS: [(&str, &str, &str, &str); 5] = [
    ("1", "Alice Johnson", "alice_j", "alice@example.com"),
    ("2", "Bob Smith", "bob_s", "bob@example.com"),
    ("3", "Charlie Brown", "charlie_b", "charlie@example.com"),
    ("4", "Diana Prince", "diana_p", "diana@example.com"),
    ("5", "Eve Wilson", "eve_w", "eve@example.com"),
];

const SEED_PRODUCT_IDS: [&str; 5] = ["1", "2", "3", "4", "5"];

/// How `recommended_products` picks from the product catalog
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecommendationPolicy {
    /// First N products in catalog order
    #[default]
    CatalogOrder,
    /// Uniform sample without replacement, in no particular order
    Shuffled,
}

impl FromStr for RecommendationPolicy {
    type Err = AccountsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "catalog-order" => Ok(Self::CatalogOrder),
            "shuffled" => Ok(Self::Shuffled),
            other => Err(AccountsError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for RecommendationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CatalogOrder => f.write_str("catalog-order"),
            Self::Shuffled => f.write_str("shuffled"),
        }
    }
}

/// In-memory catalog of users and products
#[derive(Debug)]
pub struct Catalog {
    users: Vec<User>,
    user_index: HashMap<String, usize>,
    products: Vec<Product>,
    product_index: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog, rejecting an empty user list and duplicate ids
    pub fn new(users: Vec<User>, products: Vec<Product>) -> Result<Self> {
        if users.is_empty() {
            return Err(AccountsError::EmptyCatalog);
        }

        let user_index = index_by_id("User", users.iter().map(|u| u.id.as_str()))?;
        let product_index = index_by_id("Product", products.iter().map(|p| p.id.as_str()))?;

        Ok(Self {
            users,
            user_index,
            products,
            product_index,
        })
    }

    /// The fixed seed catalog served by the subgraph
    pub fn seeded() -> Result<Self> {
        let users = SEED_USERS
            .iter()
            .map(|(id, name, username, email)| User::new(*id, *name, *username, *email))
            .collect();
        let products = SEED_PRODUCT_IDS.iter().map(|id| Product::new(*id)).collect();

        Self::new(users, products)
    }

    /// All users in insertion order
    pub fn list_users(&self) -> &[User] {
        &self.users
    }

    pub fn find_user_by_id(&self, id: &str) -> Option<&User> {
        self.user_index.get(id).map(|&idx| &self.users[idx])
    }

    /// The designated current user: the first record in the catalog
    pub fn first_user(&self) -> &User {
        // non-empty by construction
        &self.users[0]
    }

    pub fn find_product_by_id(&self, id: &str) -> Option<&Product> {
        self.product_index.get(id).map(|&idx| &self.products[idx])
    }

    pub fn list_products(&self) -> &[Product] {
        &self.products
    }

    /// Up to `count` products, never padded
    pub fn recommended_products(&self, count: usize, policy: RecommendationPolicy) -> Vec<Product> {
        match policy {
            RecommendationPolicy::CatalogOrder => {
                self.products.iter().take(count).cloned().collect()
            }
            RecommendationPolicy::Shuffled => self
                .products
                .choose_multiple(&mut rand::thread_rng(), count)
                .cloned()
                .collect(),
        }
    }
}

fn index_by_id<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<HashMap<String, usize>> {
    let mut index = HashMap::new();
    for (idx, id) in ids.enumerate() {
        if index.insert(id.to_string(), idx).is_some() {
            return Err(AccountsError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(index)
}
