use serde_json::json;
use webapi_router::demo::demo_api;
use webapi_router::{Capabilities, Envelope, Reply, RequestContext, WebApi};

mod common;
use common::resources::Echo;
use common::test_server::{parse_response, request, send_request, start_api};

#[test]
fn test_teapot_subscription_over_http() {
    let handle = start_api(demo_api().unwrap());
    let addr = handle.addr();

    let resp = request(&addr, "POST", "/subscriptions", Some("{}"));
    handle.stop();

    assert_eq!(resp.status, 418);
    assert_eq!(resp.header("content-type"), Some("application/json"));
    assert_eq!(resp.json(), json!({"data": {"test": "topp"}}));
}

#[test]
fn test_not_found_and_method_not_allowed_have_no_body() {
    let handle = start_api(demo_api().unwrap());
    let addr = handle.addr();

    let missing = request(&addr, "GET", "/nowhere", None);
    let not_allowed = request(&addr, "GET", "/subscriptions", None);
    handle.stop();

    assert_eq!(missing.status, 404);
    assert!(missing.body.is_empty());
    assert_eq!(not_allowed.status, 405);
    assert!(not_allowed.body.is_empty());
    assert!(not_allowed.header("content-type").is_none());
}

#[test]
fn test_item_crud_over_http() {
    let handle = start_api(demo_api().unwrap());
    let addr = handle.addr();

    let created = request(&addr, "POST", "/items", Some(r#"{"name":"lamp","price":12.0}"#));
    let fetched = request(&addr, "GET", "/items/1", None);
    let updated = request(&addr, "PUT", "/items/1", Some(r#"{"name":"desk lamp"}"#));
    let listed = request(&addr, "GET", "/items?limit=10", None);
    let deleted = request(&addr, "DELETE", "/items/1", None);
    let gone = request(&addr, "GET", "/items/1", None);
    handle.stop();

    assert_eq!(created.status, 201);
    assert_eq!(created.json()["data"]["id"], 1);
    assert_eq!(fetched.status, 200);
    assert_eq!(fetched.json()["data"]["name"], "lamp");
    assert_eq!(updated.status, 200);
    assert_eq!(listed.json()["data"][0]["name"], "desk lamp");
    assert_eq!(deleted.status, 200);
    assert_eq!(gone.status, 404);
    assert_eq!(gone.json(), json!({"error": "item not found"}));
}

#[test]
fn test_unsupported_method_over_http() {
    let mut api = WebApi::new();
    api.add(r"^/echo/(?P<id>\d+)$", Echo).unwrap();
    let handle = start_api(api);
    let addr = handle.addr();

    let patch = request(&addr, "PATCH", "/echo/1", Some("{}"));
    let get = request(&addr, "GET", "/echo/1", None);
    handle.stop();

    assert_eq!(patch.status, 405);
    assert_eq!(get.status, 200);
    assert_eq!(get.json(), json!({"data": {"method": "GET", "id": "1"}}));
}

#[test]
fn test_headers_reach_handler() {
    let mut api = WebApi::new();
    api.add(
        "^/whoami$",
        Capabilities::new().on(http::Method::GET, |ctx: &RequestContext| {
            Reply::ok(ctx.header("X-User").unwrap_or("anonymous").to_string())
        }),
    )
    .unwrap();
    let handle = start_api(api);
    let addr = handle.addr();

    let raw = send_request(
        &addr,
        "GET /whoami HTTP/1.1\r\nHost: localhost\r\nx-user: grace\r\n\r\n",
    );
    handle.stop();

    let resp = parse_response(&raw);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.json(), json!({"data": "grace"}));
}

#[test]
fn test_handler_panic_is_500() {
    let mut api = WebApi::new();
    api.add(
        "^/boom$",
        Capabilities::new().on(http::Method::GET, |_ctx: &RequestContext| -> Reply {
            panic!("handler exploded")
        }),
    )
    .unwrap();
    let handle = start_api(api);
    let addr = handle.addr();

    let first = request(&addr, "GET", "/boom", None);
    let second = request(&addr, "GET", "/boom", None);
    handle.stop();

    assert_eq!(first.status, 500);
    assert!(first.body.is_empty());
    assert_eq!(second.status, 500);
}

#[test]
fn test_no_content_reply_has_no_body_on_the_wire() {
    let mut api = WebApi::new();
    api.add(
        "^/sessions$",
        Capabilities::new()
            .on(http::Method::DELETE, |_ctx: &RequestContext| {
                Reply::new(204, Envelope::with_data("logged out"))
            })
            .on(http::Method::GET, |_ctx: &RequestContext| Reply::ok("active")),
    )
    .unwrap();
    let handle = start_api(api);
    let addr = handle.addr();

    // Two requests on one connection: a stray body after the 204 would be read
    // as the start of the second response.
    let raw = send_request(
        &addr,
        "DELETE /sessions HTTP/1.1\r\nHost: localhost\r\n\r\n\
         GET /sessions HTTP/1.1\r\nHost: localhost\r\n\r\n",
    );
    handle.stop();

    let first = parse_response(&raw);
    assert_eq!(first.status, 204);
    assert!(first.header("content-type").is_none());

    let (_, rest) = raw.split_once("\r\n\r\n").unwrap();
    assert!(rest.starts_with("HTTP/1.1 200"), "unexpected bytes after 204: {rest:?}");
    let second = parse_response(rest);
    assert_eq!(second.json(), json!({"data": "active"}));
}

#[test]
fn test_percent_encoded_path_over_http() {
    let mut api = WebApi::new();
    api.add(r"^/users/(?P<id>[^/]+)$", Echo).unwrap();
    let handle = start_api(api);
    let addr = handle.addr();

    let resp = request(&addr, "GET", "/users/J%C3%BCrgen", None);
    handle.stop();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.json(), json!({"data": {"method": "GET", "id": "Jürgen"}}));
}

#[test]
fn test_many_request_headers_accepted() {
    let mut api = WebApi::new();
    api.add(
        "^/proxied$",
        Capabilities::new().on(http::Method::GET, |ctx: &RequestContext| {
            Reply::ok(ctx.header("x-hop-19").unwrap_or("missing").to_string())
        }),
    )
    .unwrap();
    let handle = start_api(api);
    let addr = handle.addr();

    let mut req = String::from("GET /proxied HTTP/1.1\r\nHost: localhost\r\n");
    for i in 0..20 {
        req.push_str(&format!("X-Hop-{i}: gateway-{i}\r\n"));
    }
    req.push_str("\r\n");
    let raw = send_request(&addr, &req);
    handle.stop();

    let resp = parse_response(&raw);
    assert_eq!(resp.status, 200);
    assert_eq!(resp.json(), json!({"data": "gateway-19"}));
}
