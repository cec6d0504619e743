use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;
use stocktrail_auth::{JwtClaims, Role};
use stocktrail_core::UserId;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = stocktrail_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, sub: UserId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    for path in ["/items", "/changes", "/users"] {
        let res = client
            .get(format!("{}{}", srv.base_url, path))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
    }
}

#[tokio::test]
async fn unauthorized_rejections_carry_the_json_error_body() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    // No token at all.
    let res = client
        .get(format!("{}/items", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
    assert!(body["message"].is_string());

    // A garbage token gets the same shape.
    let res = client
        .get(format!("{}/items", srv.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");

    // The optional-auth categories router also rejects bad tokens with it.
    let res = client
        .get(format!("{}/categories", srv.base_url))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn malformed_json_bodies_report_invalid_body() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new(), vec![]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/items", srv.base_url))
        .bearer_auth(&token)
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{ not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn health_and_discovery_are_public() {
    let srv = TestServer::spawn("test-secret").await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["items"], "/items");
    assert_eq!(body["changes"], "/changes");
}

#[tokio::test]
async fn item_lifecycle_writes_audit_trail() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new(), vec![Role::new("staff")]);
    let client = reqwest::Client::new();

    // Create with quantity 5.
    let res = client
        .post(format!("{}/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Widget", "quantity": 5, "price": "9.99" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: serde_json::Value = res.json().await.unwrap();
    let id = item["id"].as_str().unwrap().to_string();
    assert_eq!(item["quantity"], 5);

    // Drop the quantity to 2.
    let res = client
        .patch(format!("{}/items/{}", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["quantity"], 2);

    // Delete the item.
    let res = client
        .delete(format!("{}/items/{}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = client
        .get(format!("{}/items/{}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // The trail survives the item: three records, newest first.
    let res = client
        .get(format!("{}/changes?item={}", srv.base_url, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let changes: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(changes.len(), 3);

    assert_eq!(changes[0]["change_type"], "DELETE");
    assert_eq!(changes[0]["previous_quantity"], 2);
    assert_eq!(changes[0]["new_quantity"], 0);
    assert_eq!(changes[0]["change_amount"], -2);

    assert_eq!(changes[1]["change_type"], "REMOVE");
    assert_eq!(changes[1]["previous_quantity"], 5);
    assert_eq!(changes[1]["new_quantity"], 2);
    assert_eq!(changes[1]["change_amount"], -3);

    assert_eq!(changes[2]["change_type"], "CREATE");
    assert_eq!(changes[2]["previous_quantity"], 0);
    assert_eq!(changes[2]["new_quantity"], 5);
    assert_eq!(changes[2]["change_amount"], 5);

    for change in &changes {
        assert_eq!(change["item_name"], "Widget");
    }
}

#[tokio::test]
async fn non_staff_only_see_their_own_items() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let owner = mint_jwt(jwt_secret, UserId::new(), vec![]);
    let stranger = mint_jwt(jwt_secret, UserId::new(), vec![]);
    let staff = mint_jwt(jwt_secret, UserId::new(), vec![Role::new("staff")]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/items", srv.base_url))
        .bearer_auth(&owner)
        .json(&json!({ "name": "Private", "quantity": 1, "price": "1.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: serde_json::Value = res.json().await.unwrap();
    let id = item["id"].as_str().unwrap();

    // A foreign id reads as not-found, not forbidden.
    let res = client
        .get(format!("{}/items/{}", srv.base_url, id))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .get(format!("{}/items", srv.base_url))
        .bearer_auth(&stranger)
        .send()
        .await
        .unwrap();
    let items: Vec<serde_json::Value> = res.json().await.unwrap();
    assert!(items.is_empty());

    // Staff see everything.
    let res = client
        .get(format!("{}/items/{}", srv.base_url, id))
        .bearer_auth(&staff)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn categories_read_is_public_but_writes_need_auth() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new(), vec![]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/categories", srv.base_url))
        .json(&json!({ "name": "Tools" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(format!("{}/categories", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Tools" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    // Anonymous read sees the new category.
    let res = client
        .get(format!("{}/categories", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let categories: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0]["name"], "Tools");

    // Duplicate names conflict.
    let res = client
        .post(format!("{}/categories", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Tools" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn user_management_is_admin_only() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let staff = mint_jwt(jwt_secret, UserId::new(), vec![Role::new("staff")]);
    let admin = mint_jwt(jwt_secret, UserId::new(), vec![Role::new("admin")]);
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&staff)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = client
        .post(format!("{}/users", srv.base_url))
        .bearer_auth(&admin)
        .json(&json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "s3cret-pw",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let user: serde_json::Value = res.json().await.unwrap();
    assert_eq!(user["username"], "alice");
    // The hash never leaves the server.
    assert!(user.get("password_hash").is_none());
    assert!(user.get("password").is_none());

    let res = client
        .get(format!("{}/users", srv.base_url))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    let users: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(users.len(), 1);
}

#[tokio::test]
async fn validation_failures_report_fields() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new(), vec![]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "", "quantity": -3, "price": "1.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<String> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap().to_string())
        .collect();
    assert!(fields.contains(&"name".to_string()));
    assert!(fields.contains(&"quantity".to_string()));
}

#[tokio::test]
async fn malformed_ids_are_rejected() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new(), vec![]);
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/items/not-a-uuid", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");
}

#[tokio::test]
async fn low_stock_and_search_views() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new(), vec![Role::new("staff")]);
    let client = reqwest::Client::new();

    for (name, quantity, price) in [
        ("Hammer", 3_i64, "12.50"),
        ("Screwdriver", 40, "4.25"),
        ("Hammer Drill", 7, "129.00"),
    ] {
        let res = client
            .post(format!("{}/items", srv.base_url))
            .bearer_auth(&token)
            .json(&json!({ "name": name, "quantity": quantity, "price": price }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    // Default threshold of 10 catches the two small stocks, name order.
    let res = client
        .get(format!("{}/items/low_stock", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let items: Vec<serde_json::Value> = res.json().await.unwrap();
    let names: Vec<&str> = items.iter().map(|i| i["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["Hammer", "Hammer Drill"]);

    let res = client
        .get(format!("{}/items/low_stock?threshold=5", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let items: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Hammer");

    // Substring search is case-insensitive.
    let res = client
        .get(format!("{}/items/search?q=hammer", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let items: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(items.len(), 2);

    let res = client
        .get(format!(
            "{}/items/search?q=hammer&max_price=50",
            srv.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let items: Vec<serde_json::Value> = res.json().await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["name"], "Hammer");
}

#[tokio::test]
async fn clearing_an_item_category_via_null() {
    let jwt_secret = "test-secret";
    let srv = TestServer::spawn(jwt_secret).await;
    let token = mint_jwt(jwt_secret, UserId::new(), vec![]);
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/categories", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Fasteners" }))
        .send()
        .await
        .unwrap();
    let category: serde_json::Value = res.json().await.unwrap();
    let category_id = category["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Bolt",
            "quantity": 100,
            "price": "0.10",
            "category": category_id,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let item: serde_json::Value = res.json().await.unwrap();
    let id = item["id"].as_str().unwrap();
    assert_eq!(item["category"], category_id);

    // A patch that omits `category` leaves it alone.
    let res = client
        .patch(format!("{}/items/{}", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 90 }))
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    assert_eq!(item["category"], category_id);

    // An explicit null clears it.
    let res = client
        .patch(format!("{}/items/{}", srv.base_url, id))
        .bearer_auth(&token)
        .json(&json!({ "category": null }))
        .send()
        .await
        .unwrap();
    let item: serde_json::Value = res.json().await.unwrap();
    assert!(item["category"].is_null());
}
