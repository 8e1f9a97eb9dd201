//! Federated schema: binds root fields and federation fields to resolvers
//!
//! `_entities` and `_service` are served here rather than by the engine's
//! built-in federation support, so every representation is decoded by
//! [`Representation`](crate::federation::Representation) and a failed
//! reference nulls only its own slot.

use std::sync::Arc;

use async_graphql::{
    Context, EmptyMutation, EmptySubscription, ErrorExtensions, Object, PathSegment, Result,
    Schema, SimpleObject, ID,
};

use crate::catalog::{Catalog, RecommendationPolicy};
use crate::fault::ErrorInjector;
use crate::federation::{resolve_representations, AccountsEntityResolver, AnyRepresentation, Entity};
use crate::model::{Product, User};
use crate::resolvers::QueryResolver;

/// Federation contract composed by the gateway
pub const SUBGRAPH_SDL: &str = include_str!("../schema/accounts.graphql");

pub type AccountsSchema = Schema<Query, EmptyMutation, EmptySubscription>;

/// Federation `_Service` type
#[derive(SimpleObject, Debug, Clone)]
#[graphql(name = "_Service")]
pub struct ServiceDefinition {
    pub sdl: String,
}

pub struct Query;

#[Object]
impl Query {
    /// The current user
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        inject(ctx, "Failed to fetch current user")?;
        Ok(ctx.data::<QueryResolver>()?.me().clone())
    }

    /// Look up a user by id; null when no such user exists
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<Option<User>> {
        inject(ctx, "Failed to fetch user")?;
        Ok(ctx.data::<QueryResolver>()?.user(&id).cloned())
    }

    async fn users(&self, ctx: &Context<'_>) -> Result<Vec<User>> {
        inject(ctx, "Failed to fetch users")?;
        Ok(ctx.data::<QueryResolver>()?.users().to_vec())
    }

    async fn recommended_products(&self, ctx: &Context<'_>) -> Result<Vec<Product>> {
        inject(ctx, "Failed to fetch recommended products")?;
        Ok(ctx.data::<QueryResolver>()?.recommended_products())
    }

    /// Resolve entity representations; each failed slot is null with its own error
    #[graphql(name = "_entities")]
    async fn entities(
        &self,
        ctx: &Context<'_>,
        representations: Vec<AnyRepresentation>,
    ) -> Result<Vec<Option<Entity>>> {
        let resolver = ctx.data::<AccountsEntityResolver>()?;
        let field = ctx.item.node.response_key().node.to_string();

        let outcomes = resolve_representations(resolver, &representations).await;
        let mut entities = Vec::with_capacity(outcomes.len());
        for (idx, outcome) in outcomes.into_iter().enumerate() {
            match outcome {
                Ok(entity) => entities.push(Some(entity)),
                Err(err) => {
                    let mut error = err.extend().into_server_error(ctx.item.pos);
                    error.path = vec![PathSegment::Field(field.clone()), PathSegment::Index(idx)];
                    ctx.add_error(error);
                    entities.push(None);
                }
            }
        }
        Ok(entities)
    }

    #[graphql(name = "_service")]
    async fn service(&self) -> ServiceDefinition {
        ServiceDefinition {
            sdl: SUBGRAPH_SDL.to_string(),
        }
    }
}

fn inject(ctx: &Context<'_>, message: &str) -> Result<()> {
    ctx.data::<ErrorInjector>()?
        .check(message)
        .map_err(|err| err.extend())
}

/// Build the federated schema over a shared catalog
pub fn build_schema(
    catalog: Arc<Catalog>,
    recommendations: RecommendationPolicy,
    faults: ErrorInjector,
) -> AccountsSchema {
    Schema::build(Query, EmptyMutation, EmptySubscription)
        .data(QueryResolver::new(catalog.clone(), recommendations))
        .data(AccountsEntityResolver::new(catalog))
        .data(faults)
        .finish()
}

/// Federation SDL for composition tooling
pub fn federation_sdl() -> &'static str {
    SUBGRAPH_SDL
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::{Request, Variables};
    use serde_json::{json, Value};

    const ENTITIES_QUERY: &str = r#"
        query($representations: [_Any!]!) {
            _entities(representations: $representations) {
                __typename
                ... on User { id name username email }
                ... on Product { id }
            }
        }
    "#;

    fn schema() -> AccountsSchema {
        schema_with_faults(ErrorInjector::disabled())
    }

    fn schema_with_faults(faults: ErrorInjector) -> AccountsSchema {
        build_schema(
            Arc::new(Catalog::seeded().unwrap()),
            RecommendationPolicy::CatalogOrder,
            faults,
        )
    }

    async fn execute(schema: &AccountsSchema, request: impl Into<Request>) -> (Value, Value) {
        let response = schema.execute(request).await;
        let errors = serde_json::to_value(&response.errors).unwrap();
        (response.data.into_json().unwrap(), errors)
    }

    async fn entities(schema: &AccountsSchema, representations: Value) -> (Value, Value) {
        let request = Request::new(ENTITIES_QUERY)
            .variables(Variables::from_json(json!({ "representations": representations })));
        execute(schema, request).await
    }

    #[tokio::test]
    async fn test_me() {
        let (data, errors) = execute(&schema(), "{ me { id name } }").await;
        assert_eq!(errors, json!([]));
        assert_eq!(data, json!({"me": {"id": "1", "name": "Alice Johnson"}}));
    }

    #[tokio::test]
    async fn test_user_hit() {
        let (data, errors) = execute(
            &schema(),
            r#"{ user(id: "3") { id name username email } }"#,
        )
        .await;
        assert_eq!(errors, json!([]));
        assert_eq!(
            data,
            json!({"user": {
                "id": "3",
                "name": "Charlie Brown",
                "username": "charlie_b",
                "email": "charlie@example.com"
            }})
        );
    }

    #[tokio::test]
    async fn test_user_miss_is_null_not_error() {
        let (data, errors) = execute(&schema(), r#"{ user(id: "9") { id } }"#).await;
        assert_eq!(errors, json!([]));
        assert_eq!(data, json!({"user": null}));
    }

    #[tokio::test]
    async fn test_users_in_seed_order() {
        let (data, _) = execute(&schema(), "{ users { id } }").await;
        let ids: Vec<&str> = data["users"]
            .as_array()
            .unwrap()
            .iter()
            .map(|u| u["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    }

    #[tokio::test]
    async fn test_recommended_products() {
        let schema = schema();
        let (first, _) = execute(&schema, "{ recommendedProducts { id } }").await;
        assert_eq!(
            first,
            json!({"recommendedProducts": [{"id": "1"}, {"id": "2"}, {"id": "3"}]})
        );

        let (second, _) = execute(&schema, "{ recommendedProducts { id } }").await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_resolve_user_entity() {
        let (data, errors) =
            entities(&schema(), json!([{"__typename": "User", "id": "2"}])).await;
        assert_eq!(errors, json!([]));
        assert_eq!(
            data,
            json!({"_entities": [{
                "__typename": "User",
                "id": "2",
                "name": "Bob Smith",
                "username": "bob_s",
                "email": "bob@example.com"
            }]})
        );
    }

    #[tokio::test]
    async fn test_resolve_product_entity() {
        let (data, errors) =
            entities(&schema(), json!([{"__typename": "Product", "id": "5"}])).await;
        assert_eq!(errors, json!([]));
        assert_eq!(
            data,
            json!({"_entities": [{"__typename": "Product", "id": "5"}]})
        );
    }

    #[tokio::test]
    async fn test_unknown_reference_nulls_only_its_slot() {
        let (data, errors) = entities(
            &schema(),
            json!([
                {"__typename": "User", "id": "1"},
                {"__typename": "User", "id": "9"}
            ]),
        )
        .await;

        assert_eq!(data["_entities"][0]["name"], "Alice Johnson");
        assert_eq!(data["_entities"][1], Value::Null);

        let errors = errors.as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0]["message"], "User not found: 9");
        assert_eq!(errors[0]["path"], json!(["_entities", 1]));
        assert_eq!(errors[0]["extensions"]["code"], "REFERENCE_NOT_FOUND");
        assert_eq!(errors[0]["extensions"]["typename"], "User");
        assert_eq!(errors[0]["extensions"]["id"], "9");
    }

    #[tokio::test]
    async fn test_failed_reference_keeps_sibling_root_fields() {
        let request = Request::new(
            r#"
            query($representations: [_Any!]!) {
                me { id }
                _entities(representations: $representations) { ... on User { id } }
            }
            "#,
        )
        .variables(Variables::from_json(json!({
            "representations": [{"__typename": "User", "id": "9"}]
        })));

        let (data, errors) = execute(&schema(), request).await;
        assert_eq!(data, json!({"me": {"id": "1"}, "_entities": [null]}));
        assert_eq!(errors.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_representations_get_typed_errors() {
        let (data, errors) = entities(
            &schema(),
            json!([
                {"__typename": "User"},
                {"__typename": "Review", "id": "1"},
                {"id": "1"},
                {"__typename": "User", "id": "2"}
            ]),
        )
        .await;

        assert_eq!(
            data["_entities"],
            json!([null, null, null, {
                "__typename": "User",
                "id": "2",
                "name": "Bob Smith",
                "username": "bob_s",
                "email": "bob@example.com"
            }])
        );

        let errors = errors.as_array().unwrap();
        assert_eq!(errors.len(), 3);
        for (idx, error) in errors.iter().enumerate() {
            assert_eq!(error["extensions"]["code"], "BAD_REPRESENTATION");
            assert_eq!(error["path"], json!(["_entities", idx]));
        }
        assert_eq!(
            errors[0]["message"],
            "Representation of User is missing key field 'id'"
        );
        assert_eq!(errors[1]["message"], "Unknown entity typename: Review");
        assert_eq!(
            errors[2]["message"],
            "Invalid entity representation: missing __typename"
        );
    }

    #[tokio::test]
    async fn test_injected_faults_hit_root_fields_only() {
        let schema = schema_with_faults(ErrorInjector::new(100.0));

        let (_, errors) = execute(&schema, "{ me { id } }").await;
        assert_eq!(errors[0]["message"], "Failed to fetch current user");
        assert_eq!(errors[0]["extensions"]["code"], "SERVICE_ERROR");
        assert_eq!(errors[0]["extensions"]["injected"], true);

        let (data, errors) =
            entities(&schema, json!([{"__typename": "User", "id": "4"}])).await;
        assert_eq!(errors, json!([]));
        assert_eq!(data["_entities"][0]["name"], "Diana Prince");
    }

    #[tokio::test]
    async fn test_service_sdl_is_the_contract() {
        let (data, errors) = execute(&schema(), "{ _service { sdl } }").await;
        assert_eq!(errors, json!([]));
        assert_eq!(data["_service"]["sdl"], SUBGRAPH_SDL);

        assert!(SUBGRAPH_SDL.contains("type User @key(fields: \"id\")"));
        assert!(SUBGRAPH_SDL.contains("type Product @key(fields: \"id\")"));
        assert_eq!(federation_sdl(), SUBGRAPH_SDL);
    }

    #[tokio::test]
    async fn test_contract_matches_served_schema() {
        let (data, _) = execute(
            &schema(),
            r#"{
                root: __type(name: "Query") { fields { name } }
                entity: __type(name: "_Entity") { possibleTypes { name } }
            }"#,
        )
        .await;

        let fields: Vec<&str> = data["root"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap())
            .collect();
        for field in ["me", "user", "users", "recommendedProducts", "_entities", "_service"] {
            assert!(fields.contains(&field), "missing root field {}", field);
        }
        for field in fields.iter().filter(|f| !f.starts_with('_')) {
            assert!(SUBGRAPH_SDL.contains(&format!("  {}", field)), "{} not in contract", field);
        }

        let mut members: Vec<&str> = data["entity"]["possibleTypes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        members.sort_unstable();
        assert_eq!(members, vec!["Product", "User"]);
    }
}
