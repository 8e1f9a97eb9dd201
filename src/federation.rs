//! Apollo Federation entity resolution
//!
//! A failed reference is a hard error here, unlike the `user(id)` root
//! field: the gateway only sends a representation because another subgraph
//! claimed the entity exists.

use std::sync::Arc;

use async_graphql::{Scalar, ScalarType, Union};
use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::Catalog;
use crate::model::{Product, User};
use crate::{AccountsError, Result};

pub const USER_TYPENAME: &str = "User";
pub const PRODUCT_TYPENAME: &str = "Product";

const KEY_FIELD: &str = "id";

/// Typed key of an entity owned by this subgraph
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKey {
    User { id: String },
    Product { id: String },
}

impl EntityKey {
    pub fn typename(&self) -> &'static str {
        match self {
            Self::User { .. } => USER_TYPENAME,
            Self::Product { .. } => PRODUCT_TYPENAME,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::User { id } | Self::Product { id } => id,
        }
    }
}

/// Entity representation sent by the gateway in `_entities`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    key: EntityKey,
}

impl Representation {
    pub fn user(id: impl Into<String>) -> Self {
        Self {
            key: EntityKey::User { id: id.into() },
        }
    }

    pub fn product(id: impl Into<String>) -> Self {
        Self {
            key: EntityKey::Product { id: id.into() },
        }
    }

    /// Decode a `{ "__typename": ..., "id": ... }` object
    ///
    /// Fields other than the key are ignored. Integer ids are accepted
    /// the same way GraphQL coerces them into `ID`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| {
            AccountsError::InvalidRepresentation("expected an object".to_string())
        })?;

        let typename = map
            .get("__typename")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                AccountsError::InvalidRepresentation("missing __typename".to_string())
            })?;

        let id = match map.get(KEY_FIELD) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) if n.is_i64() || n.is_u64() => n.to_string(),
            _ => {
                return Err(AccountsError::MissingKeyField {
                    typename: typename.to_string(),
                    field: KEY_FIELD,
                })
            }
        };

        let key = match typename {
            USER_TYPENAME => EntityKey::User { id },
            PRODUCT_TYPENAME => EntityKey::Product { id },
            other => return Err(AccountsError::UnknownTypename(other.to_string())),
        };

        Ok(Self { key })
    }

    pub fn key(&self) -> &EntityKey {
        &self.key
    }

    pub fn typename(&self) -> &'static str {
        self.key.typename()
    }
}

impl TryFrom<&Value> for Representation {
    type Error = AccountsError;

    fn try_from(value: &Value) -> Result<Self> {
        Self::from_value(value)
    }
}

/// `_Any` scalar carrying one raw representation
///
/// Accepts any JSON value so that a malformed representation fails only its
/// own slot in `_entities`, not the whole request.
#[derive(Debug, Clone, PartialEq)]
pub struct AnyRepresentation(pub Value);

#[Scalar(name = "_Any")]
impl ScalarType for AnyRepresentation {
    fn parse(value: async_graphql::Value) -> async_graphql::InputValueResult<Self> {
        Ok(AnyRepresentation(
            value
                .into_json()
                .map_err(|e| format!("Invalid representation: {}", e))?,
        ))
    }

    fn to_value(&self) -> async_graphql::Value {
        async_graphql::Value::from_json(self.0.clone()).unwrap_or(async_graphql::Value::Null)
    }
}

/// Fully resolved entity, exposed as the federation `_Entity` union
#[derive(Union, Debug, Clone, PartialEq, Eq)]
#[graphql(name = "_Entity")]
pub enum Entity {
    User(User),
    Product(Product),
}

/// Entity resolver trait for Apollo Federation
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Resolve entity by representation
    async fn resolve_reference(&self, representation: &Representation) -> Result<Entity>;
}

/// Reference resolver for the entities owned by the accounts subgraph
#[derive(Debug, Clone)]
pub struct AccountsEntityResolver {
    catalog: Arc<Catalog>,
}

impl AccountsEntityResolver {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Resolve a `User` reference, failing when the id is unknown
    pub fn resolve_user_reference(&self, id: &str) -> Result<User> {
        match self.catalog.find_user_by_id(id) {
            Some(user) => Ok(user.clone()),
            None => {
                tracing::warn!(typename = USER_TYPENAME, id, "unresolvable entity reference");
                Err(AccountsError::ReferenceNotFound {
                    typename: USER_TYPENAME,
                    id: id.to_string(),
                })
            }
        }
    }

    /// Resolve a `Product` reference, failing when the id is unknown
    pub fn resolve_product_reference(&self, id: &str) -> Result<Product> {
        match self.catalog.find_product_by_id(id) {
            Some(product) => Ok(product.clone()),
            None => {
                tracing::warn!(typename = PRODUCT_TYPENAME, id, "unresolvable entity reference");
                Err(AccountsError::ReferenceNotFound {
                    typename: PRODUCT_TYPENAME,
                    id: id.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl EntityResolver for AccountsEntityResolver {
    async fn resolve_reference(&self, representation: &Representation) -> Result<Entity> {
        match representation.key() {
            EntityKey::User { id } => self.resolve_user_reference(id).map(Entity::User),
            EntityKey::Product { id } => self.resolve_product_reference(id).map(Entity::Product),
        }
    }
}

/// Decode and resolve a batch of representations, one outcome per slot
pub async fn resolve_representations<R>(
    resolver: &R,
    representations: &[AnyRepresentation],
) -> Vec<Result<Entity>>
where
    R: EntityResolver + ?Sized,
{
    let mut outcomes = Vec::with_capacity(representations.len());
    for raw in representations {
        let outcome = match Representation::from_value(&raw.0) {
            Ok(representation) => resolver.resolve_reference(&representation).await,
            Err(err) => {
                tracing::warn!(error = %err, "rejected entity representation");
                Err(err)
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}
