//! Account entities exposed by this subgraph

use async_graphql::{Object, ID};

/// Registered user, keyed by `id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        username: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            username: username.into(),
            email: email.into(),
        }
    }
}

#[Object]
impl User {
    async fn id(&self) -> ID {
        ID(self.id.clone())
    }

    async fn name(&self) -> &str {
        &self.name
    }

    async fn username(&self) -> &str {
        &self.username
    }

    async fn email(&self) -> &str {
        &self.email
    }
}

/// Product stub
///
/// Only the key is owned here; the products subgraph contributes the rest
/// of the fields at the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub id: String,
}

impl Product {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[Object]
impl Product {
    async fn id(&self) -> ID {
        ID(self.id.clone())
    }
}
