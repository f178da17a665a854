//! Demo API served by the `webapi-router` binary.
//!
//! - `/subscriptions` - POST answers `{"data":{"test":"topp"}}`, forced to 418
//!   by a route-level [`StatusOverride`]
//! - `/items` - GET lists items (`?limit=N`), POST creates one
//! - `/items/{id}` - GET, PUT and DELETE on a single numeric id

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use crate::dispatcher::{Reply, WebApi};
use crate::middleware::{Middleware, StatusOverride, TracingMiddleware};
use crate::resource::{
    Capabilities, Resource, SupportsDelete, SupportsGet, SupportsPost, SupportsPut,
};
use crate::router::PatternError;
use crate::server::{Envelope, RequestContext};

pub const SUBSCRIPTIONS_PATTERN: &str = "^/subscriptions$";
pub const ITEMS_PATTERN: &str = "^/items$";
pub const ITEM_PATTERN: &str = r"^/items/(?P<id>\d+)$";

pub struct Subscription;

impl SupportsPost for Subscription {
    fn post(&self, _ctx: &RequestContext) -> Reply {
        let mut data = BTreeMap::new();
        data.insert("test", "topp");
        Reply::ok(data)
    }
}

impl Resource for Subscription {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().post(&self)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Item {
    #[serde(default)]
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub price: f64,
}

#[derive(Debug, Deserialize)]
struct ItemInput {
    name: String,
    #[serde(default)]
    price: f64,
}

/// In-memory item table shared by the `/items` routes
#[derive(Default)]
pub struct ItemStore {
    items: RwLock<BTreeMap<u64, Item>>,
}

fn store_unavailable() -> Reply {
    warn!("Item store lock poisoned");
    Reply::error(500, "item store unavailable")
}

fn decode_input(ctx: &RequestContext) -> Result<ItemInput, Reply> {
    ctx.decode_body::<ItemInput>().map_err(|e| {
        warn!(request_id = %ctx.request_id(), error = %e, "Invalid item body");
        Reply::error(400, e.to_string())
    })
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().map(|items| items.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// `/items`
pub struct ItemCollection {
    store: Arc<ItemStore>,
}

impl SupportsGet for ItemCollection {
    fn get(&self, ctx: &RequestContext) -> Reply {
        let limit = ctx
            .query_param("limit")
            .and_then(|l| l.parse::<usize>().ok())
            .unwrap_or(usize::MAX);
        let Ok(items) = self.store.items.read() else {
            return store_unavailable();
        };
        let list: Vec<Item> = items.values().take(limit).cloned().collect();
        Reply::ok(list)
    }
}

impl SupportsPost for ItemCollection {
    fn post(&self, ctx: &RequestContext) -> Reply {
        let input = match decode_input(ctx) {
            Ok(i) => i,
            Err(reply) => return reply,
        };
        let Ok(mut items) = self.store.items.write() else {
            return store_unavailable();
        };
        let Some(id) = items
            .keys()
            .next_back()
            .map_or(Some(1), |last| last.checked_add(1))
        else {
            warn!(request_id = %ctx.request_id(), "Item id space exhausted");
            return Reply::error(507, "item id space exhausted");
        };
        let item = Item {
            id,
            name: input.name,
            price: input.price,
        };
        items.insert(id, item.clone());
        info!(request_id = %ctx.request_id(), item_id = id, "Item created");
        Reply::created(item)
    }
}

impl Resource for ItemCollection {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().get(&self).post(&self)
    }
}

/// `/items/{id}`
pub struct ItemResource {
    store: Arc<ItemStore>,
}

impl ItemResource {
    fn id(ctx: &RequestContext) -> Result<u64, Reply> {
        ctx.parameter("id")
            .parse()
            .map_err(|_| Reply::error(400, "invalid item id"))
    }
}

impl SupportsGet for ItemResource {
    fn get(&self, ctx: &RequestContext) -> Reply {
        let id = match Self::id(ctx) {
            Ok(id) => id,
            Err(reply) => return reply,
        };
        let Ok(items) = self.store.items.read() else {
            return store_unavailable();
        };
        match items.get(&id) {
            Some(item) => Reply::ok(item.clone()),
            None => Reply::error(404, "item not found"),
        }
    }
}

impl SupportsPut for ItemResource {
    fn put(&self, ctx: &RequestContext) -> Reply {
        let id = match Self::id(ctx) {
            Ok(id) => id,
            Err(reply) => return reply,
        };
        let input = match decode_input(ctx) {
            Ok(i) => i,
            Err(reply) => return reply,
        };
        let Ok(mut items) = self.store.items.write() else {
            return store_unavailable();
        };
        let item = Item {
            id,
            name: input.name,
            price: input.price,
        };
        let status = if items.insert(id, item.clone()).is_some() {
            200
        } else {
            201
        };
        Reply::new(status, Envelope::with_data(item))
    }
}

impl SupportsDelete for ItemResource {
    fn delete(&self, ctx: &RequestContext) -> Reply {
        let id = match Self::id(ctx) {
            Ok(id) => id,
            Err(reply) => return reply,
        };
        let Ok(mut items) = self.store.items.write() else {
            return store_unavailable();
        };
        match items.remove(&id) {
            Some(item) => Reply::ok(item),
            None => Reply::error(404, "item not found"),
        }
    }
}

impl Resource for ItemResource {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Capabilities::new().get(&self).put(&self).delete(&self)
    }
}

/// Build the demo API around `store`.
///
/// # Errors
///
/// Returns [`PatternError`] if a route pattern fails to compile.
pub fn demo_api_with_store(store: Arc<ItemStore>) -> Result<WebApi, PatternError> {
    let mut api = WebApi::new();
    api.apply([Arc::new(TracingMiddleware) as Arc<dyn Middleware>]);

    api.add_with(
        SUBSCRIPTIONS_PATTERN,
        Subscription,
        [Arc::new(StatusOverride(418)) as Arc<dyn Middleware>],
    )?;
    api.add(
        ITEMS_PATTERN,
        ItemCollection {
            store: Arc::clone(&store),
        },
    )?;
    api.add(ITEM_PATTERN, ItemResource { store })?;
    Ok(api)
}

/// Build the demo API with an empty item store.
///
/// # Errors
///
/// Returns [`PatternError`] if a route pattern fails to compile.
pub fn demo_api() -> Result<WebApi, PatternError> {
    demo_api_with_store(Arc::new(ItemStore::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::IncomingRequest;
    use serde_json::{json, Value};

    fn body(resp: &crate::server::ApiResponse) -> Value {
        serde_json::from_slice(&resp.body).unwrap()
    }

    #[test]
    fn test_subscription_is_a_teapot() {
        let api = demo_api().unwrap();
        let resp = api.handle(IncomingRequest::new("POST", "/subscriptions"));
        assert_eq!(resp.status, 418);
        assert_eq!(body(&resp), json!({"data": {"test": "topp"}}));
    }

    #[test]
    fn test_subscription_get_not_allowed() {
        let api = demo_api().unwrap();
        let resp = api.handle(IncomingRequest::new("GET", "/subscriptions"));
        assert_eq!(resp.status, 405);
        assert!(resp.body.is_empty());
    }

    #[test]
    fn test_item_lifecycle() {
        let store = Arc::new(ItemStore::new());
        let api = demo_api_with_store(Arc::clone(&store)).unwrap();

        let resp = api.handle(
            IncomingRequest::new("POST", "/items").with_body(r#"{"name":"widget","price":2.5}"#),
        );
        assert_eq!(resp.status, 201);
        assert_eq!(
            body(&resp),
            json!({"data": {"id": 1, "name": "widget", "price": 2.5}})
        );

        let resp = api.handle(IncomingRequest::new("GET", "/items/1"));
        assert_eq!(resp.status, 200);
        assert_eq!(body(&resp)["data"]["name"], "widget");

        let resp = api.handle(
            IncomingRequest::new("PUT", "/items/1").with_body(r#"{"name":"gadget"}"#),
        );
        assert_eq!(resp.status, 200);

        let resp = api.handle(IncomingRequest::new("DELETE", "/items/1"));
        assert_eq!(resp.status, 200);
        assert_eq!(body(&resp)["data"]["name"], "gadget");
        assert!(store.is_empty());

        let resp = api.handle(IncomingRequest::new("GET", "/items/1"));
        assert_eq!(resp.status, 404);
        assert_eq!(body(&resp), json!({"error": "item not found"}));
    }

    #[test]
    fn test_item_list_limit() {
        let api = demo_api().unwrap();
        for name in ["a", "b", "c"] {
            let resp = api.handle(
                IncomingRequest::new("POST", "/items").with_body(format!(r#"{{"name":"{name}"}}"#)),
            );
            assert_eq!(resp.status, 201);
        }
        let resp = api.handle(IncomingRequest::new("GET", "/items?limit=2"));
        assert_eq!(resp.status, 200);
        assert_eq!(body(&resp)["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_item_bad_body() {
        let api = demo_api().unwrap();
        let resp = api.handle(IncomingRequest::new("POST", "/items").with_body("{not json"));
        assert_eq!(resp.status, 400);
        assert!(body(&resp)["error"].is_string());
    }

    #[test]
    fn test_item_create_after_max_id_is_rejected() {
        let store = Arc::new(ItemStore::new());
        let api = demo_api_with_store(Arc::clone(&store)).unwrap();

        let top = format!("/items/{}", u64::MAX);
        let resp = api.handle(IncomingRequest::new("PUT", top).with_body(r#"{"name":"last"}"#));
        assert_eq!(resp.status, 201);

        let resp =
            api.handle(IncomingRequest::new("POST", "/items").with_body(r#"{"name":"one more"}"#));
        assert_eq!(resp.status, 507);
        assert_eq!(body(&resp), json!({"error": "item id space exhausted"}));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_item_id_must_be_numeric() {
        let api = demo_api().unwrap();
        let resp = api.handle(IncomingRequest::new("GET", "/items/abc"));
        assert_eq!(resp.status, 404);
    }
}
