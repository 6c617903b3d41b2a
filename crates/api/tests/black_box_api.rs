use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use billing_api::app::{router, services::build_in_memory_services};
use billing_auth::{JwtClaims, Role};
use billing_core::UserId;
use billing_infra::StockWritePolicy;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Same router as prod over seeded in-memory stores, on an ephemeral port.
    async fn spawn() -> Self {
        let services = build_in_memory_services(StockWritePolicy::LastWriteWins, true)
            .await
            .expect("failed to seed services");
        let app = router(Arc::new(services), JWT_SECRET.as_bytes());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    async fn post_bill(&self, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/bills"))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(user_id: i64, username: &str, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: UserId::new(user_id),
        username: username.to_string(),
        roles,
        issued_at: now - ChronoDuration::seconds(5),
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

fn alice() -> String {
    mint_jwt(1, "alice", vec![Role::USER])
}

fn bob() -> String {
    mint_jwt(2, "bob", vec![Role::USER])
}

fn admin() -> String {
    mint_jwt(100, "admin", vec![Role::ADMIN])
}

async fn create_alice_bill(srv: &TestServer) -> i64 {
    let res = srv
        .post_bill(
            &alice(),
            json!({"userId": 1, "items": [{"itemId": 1, "quantity": 1}]}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let res = srv.client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["kind"], "Unauthorized");

    let res = srv.get("/bills", "not-a-jwt").await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn caller_is_derived_from_token() {
    let srv = TestServer::spawn().await;

    let res = srv.get("/whoami", &admin()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["userId"], 100);
    assert_eq!(body["username"], "admin");
    assert_eq!(body["admin"], true);
    assert!(body["roles"].as_array().unwrap().iter().any(|r| r == "ROLE_ADMIN"));
}

#[tokio::test]
async fn request_id_is_echoed_or_generated() {
    let srv = TestServer::spawn().await;

    let res = srv
        .client
        .get(srv.url("/health"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert!(!res.headers()["x-request-id"].is_empty());
}

#[tokio::test]
async fn order_lifecycle_totals_and_stock() {
    let srv = TestServer::spawn().await;
    let token = alice();

    // Seeded: item 1 Notebook 10.00 x5, item 2 Gel Pen 3.50 x2.
    let res = srv
        .post_bill(
            &token,
            json!({"userId": 1, "items": [
                {"itemId": 1, "quantity": 2},
                {"itemId": 2, "quantity": 2}
            ]}),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let bill: Value = res.json().await.unwrap();
    assert_eq!(bill["userId"], 1);
    assert_eq!(bill["totalAmount"], "27.00");
    assert_eq!(bill["items"][0]["unitPrice"], "10.00");
    assert_eq!(bill["items"][0]["subtotal"], "20.00");
    assert_eq!(bill["items"][1]["subtotal"], "7.00");

    let item: Value = srv.get("/items/1", &token).await.json().await.unwrap();
    assert_eq!(item["stock"], 3);
    let item: Value = srv.get("/items/2", &token).await.json().await.unwrap();
    assert_eq!(item["stock"], 0);

    let res = srv
        .post_bill(&token, json!({"userId": 1, "items": [{"itemId": 2, "quantity": 1}]}))
        .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["kind"], "InsufficientStock");
    assert_eq!(err["message"], "Insufficient stock for item: Gel Pen");

    let bills: Value = srv.get("/bills", &token).await.json().await.unwrap();
    assert_eq!(bills.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_orders_are_rejected() {
    let srv = TestServer::spawn().await;
    let token = alice();

    let res = srv.post_bill(&token, json!({"userId": 1, "items": []})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["kind"], "EmptyOrder");

    let res = srv
        .post_bill(&token, json!({"userId": 1, "items": [{"itemId": 1, "quantity": -1}]}))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["kind"], "InvalidQuantity");

    let res = srv
        .post_bill(&token, json!({"userId": 1, "items": [{"itemId": 999, "quantity": 1}]}))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["kind"], "ItemNotFound");

    let res = srv.post_bill(&token, json!({"items": "nope"})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["kind"], "InvalidRequest");
}

#[tokio::test]
async fn bill_visibility_follows_ownership_and_role() {
    let srv = TestServer::spawn().await;
    let id = create_alice_bill(&srv).await;
    let path = format!("/bills/{id}");

    assert_eq!(srv.get(&path, &alice()).await.status(), StatusCode::OK);
    assert_eq!(srv.get(&path, &admin()).await.status(), StatusCode::OK);

    let res = srv.get(&path, &bob()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["kind"], "AccessDenied");

    let res = srv
        .post_bill(&bob(), json!({"userId": 1, "items": [{"itemId": 1, "quantity": 1}]}))
        .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    assert_eq!(srv.get("/bills/user/1", &bob()).await.status(), StatusCode::FORBIDDEN);
    let res = srv.get("/bills/user/1", &admin()).await;
    assert_eq!(res.status(), StatusCode::OK);
    let bills: Value = res.json().await.unwrap();
    assert_eq!(bills.as_array().unwrap().len(), 1);

    let bills: Value = srv.get("/bills", &bob()).await.json().await.unwrap();
    assert!(bills.as_array().unwrap().is_empty());

    assert_eq!(srv.get("/bills/abc", &alice()).await.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_requires_owner_and_removes_the_bill() {
    let srv = TestServer::spawn().await;
    let id = create_alice_bill(&srv).await;
    let path = format!("/bills/{id}");

    let res = srv
        .client
        .delete(srv.url(&path))
        .bearer_auth(bob())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&path))
        .bearer_auth(alice())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.get(&path, &admin()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let err: Value = res.json().await.unwrap();
    assert_eq!(err["kind"], "BillNotFound");
}

#[tokio::test]
async fn print_renders_a_plain_text_receipt() {
    let srv = TestServer::spawn().await;
    let id = create_alice_bill(&srv).await;

    let res = srv.get(&format!("/bills/{id}/print"), &alice()).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(
        res.headers()["content-type"]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );
    let text = res.text().await.unwrap();
    assert!(text.contains(&format!("INVOICE #{id}")));
    assert!(text.contains("Customer: alice"));
    assert!(text.contains("Notebook"));
    assert!(text.contains("TOTAL 10.00"));

    let res = srv.get(&format!("/bills/{id}/print"), &bob()).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn catalog_search_and_featured() {
    let srv = TestServer::spawn().await;

    let page: Value = srv
        .client
        .get(srv.url("/items?category=stationery"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["totalItems"], 2);
    assert_eq!(page["size"], 12);
    assert_eq!(page["items"][0]["name"], "Notebook");

    let page: Value = srv
        .client
        .get(srv.url("/items?q=RUST&size=1&page=0"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["totalItems"], 1);
    assert_eq!(page["items"][0]["price"], "45.00");

    let page: Value = srv
        .client
        .get(srv.url("/items?q=nothing-matches"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["totalItems"], 0);
    assert!(page["items"].as_array().unwrap().is_empty());

    // Featured: in stock only, newest first, four per page. Desk Lamp (id 4) is sold out.
    let page: Value = srv
        .client
        .get(srv.url("/items/featured"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let ids: Vec<i64> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![5, 3, 2, 1]);

    let res = srv.client.get(srv.url("/items/42")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_catalog_queries_get_json_errors() {
    let srv = TestServer::spawn().await;

    for path in ["/items?page=abc", "/items/featured?size=-1"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{path}");
        let ct = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(ct.starts_with("application/json"), "{path}: {ct}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["kind"], "InvalidRequest");
        assert!(body["message"].as_str().unwrap().contains("query string"));
    }
}
