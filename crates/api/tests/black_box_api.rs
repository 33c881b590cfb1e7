use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};

use pantry_ai::GroceryAnalyzer;
use pantry_api::app::{AppServices, router};
use pantry_auth::Hs256Jwt;
use pantry_core::UserId;
use pantry_groceries::{GroceryLine, PerishWindow};
use pantry_infra::{OcrEngine, OcrError};
use pantry_receipts::UploadPolicy;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = router(Arc::new(services));
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

    async fn with_doubles() -> Self {
        Self::spawn(
            AppServices::in_memory(JWT_SECRET)
                .with_analyzer(Arc::new(StubAnalyzer))
                .with_ocr(Arc::new(StubOcr))
                .with_upload_dir(scratch_dir()),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, username: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/register"))
            .json(&json!({
                "username": username,
                "email": format!("{username}@example.com"),
                "password": "secretpw",
            }))
            .send()
            .await
            .unwrap()
    }

    /// Register `username` and return a bearer token for it.
    async fn login_as(&self, username: &str) -> String {
        assert_eq!(self.register(username).await.status(), StatusCode::CREATED);
        let res = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({
                "email": format!("{username}@example.com"),
                "password": "secretpw",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["token_type"], "bearer");
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn groceries(&self, token: &str) -> Vec<Value> {
        let res = self
            .client
            .get(self.url("/api/groceries"))
            .bearer_auth(token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        res.json().await.unwrap()
    }

    async fn add_grocery(&self, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/api/groceries"))
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

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("pantry-api-test-{}", UserId::new()))
}

/// Answers like a model that knows milk spoils within a week.
struct StubAnalyzer;

#[async_trait]
impl GroceryAnalyzer for StubAnalyzer {
    async fn parse_receipt(&self, _owner: UserId, ocr_text: &str) -> Vec<GroceryLine> {
        if ocr_text.trim().is_empty() {
            return Vec::new();
        }
        vec![
            GroceryLine::new("Milk").with_perish(PerishWindow::new(3, 7).ok()),
            GroceryLine::new("Bread"),
        ]
    }

    async fn estimate_perishability(&self, names: &[String]) -> Vec<GroceryLine> {
        names
            .iter()
            .filter(|n| n.eq_ignore_ascii_case("milk"))
            .map(|n| GroceryLine::new(n.clone()).with_perish(PerishWindow::new(3, 7).ok()))
            .collect()
    }
}

struct StubOcr;

#[async_trait]
impl OcrEngine for StubOcr {
    async fn extract_text(&self, path: &Path) -> Result<String, OcrError> {
        if !path.exists() {
            return Err(OcrError::FileNotFound(path.display().to_string()));
        }
        Ok("MILK 1L 0.99\nBREAD 1.49".to_string())
    }

    async fn is_available(&self) -> bool {
        true
    }
}

#[tokio::test]
async fn health_and_root_are_public() {
    let server = TestServer::with_doubles().await;

    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["ocr_available"], true);

    let res = server.client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "pantry-api");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let server = TestServer::with_doubles().await;

    let res = server.client.get(server.url("/api/groceries")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Not authenticated");

    let foreign = Hs256Jwt::new(b"some-other-secret", ChronoDuration::minutes(10))
        .issue(UserId::new(), "x@example.com", "intruder", Utc::now())
        .unwrap();
    let res = server
        .client
        .get(server.url("/api/auth/me"))
        .bearer_auth(foreign)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid token");
}

#[tokio::test]
async fn register_login_and_me() {
    let server = TestServer::with_doubles().await;

    let res = server.register("tester").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "User registered");
    assert_eq!(body["user"]["email"], "tester@example.com");

    let res = server.register("tester").await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Email already registered");

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": "tester@example.com", "password": "wrong-password" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "email": " TESTER@example.com ", "password": "secretpw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let token = res.json::<Value>().await.unwrap()["access_token"]
        .as_str()
        .unwrap()
        .to_string();

    let res = server
        .client
        .get(server.url("/api/auth/me"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let me: Value = res.json().await.unwrap();
    assert_eq!(me["username"], "tester");
}

#[tokio::test]
async fn invalid_registration_is_rejected() {
    let server = TestServer::with_doubles().await;
    let res = server
        .client
        .post(server.url("/api/auth/register"))
        .json(&json!({ "username": "ab", "email": "ab@example.com", "password": "secretpw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn adding_the_same_grocery_accumulates_count() {
    let server = TestServer::with_doubles().await;
    let token = server.login_as("tester").await;

    let res = server
        .add_grocery(&token, json!({ "name": "Milk", "min_days": 3, "max_days": 7 }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let first: Value = res.json().await.unwrap();
    assert_eq!(first["count"], 1);

    let res = server.add_grocery(&token, json!({ "name": "  milk " })).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let second: Value = res.json().await.unwrap();
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["count"], 2);
    assert_eq!(second["name"], "Milk");
    assert_eq!(second["min_days"], 3);

    let list = server.groceries(&token).await;
    assert_eq!(list.len(), 1);
}

#[tokio::test]
async fn invalid_grocery_bodies_are_rejected() {
    let server = TestServer::with_doubles().await;
    let token = server.login_as("tester").await;

    let res = server.add_grocery(&token, json!({ "name": "   " })).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Name is required");

    let res = server
        .add_grocery(&token, json!({ "name": "Milk", "min_days": 7, "max_days": 3 }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .add_grocery(&token, json!({ "name": "Milk", "min_days": 3 }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .add_grocery(&token, json!({ "name": "Milk", "count": 4_294_967_296_i64 }))
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "count cannot exceed 4294967295");

    assert!(server.groceries(&token).await.is_empty());
}

#[tokio::test]
async fn decrement_then_remove() {
    let server = TestServer::with_doubles().await;
    let token = server.login_as("tester").await;

    let res = server.add_grocery(&token, json!({ "name": "Eggs", "count": 3 })).await;
    let id = res.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let res = server
        .client
        .delete(server.url(&format!("/api/groceries/{id}?by=2")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(server.groceries(&token).await[0]["count"], 1);

    // Default `by` is 1.
    let res = server
        .client
        .delete(server.url(&format!("/api/groceries/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(server.groceries(&token).await.is_empty());

    let res = server
        .client
        .delete(server.url(&format!("/api/groceries/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Grocery not found");
}

#[tokio::test]
async fn decrement_rejects_bad_input() {
    let server = TestServer::with_doubles().await;
    let token = server.login_as("tester").await;

    let res = server.add_grocery(&token, json!({ "name": "Eggs" })).await;
    let id = res.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    for by in ["0", "-1", "two"] {
        let res = server
            .client
            .delete(server.url(&format!("/api/groceries/{id}?by={by}")))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "by={by}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["detail"], "'by' must be a positive integer");
    }

    let res = server
        .client
        .delete(server.url("/api/groceries/not-an-id"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid grocery id");

    assert_eq!(server.groceries(&token).await[0]["count"], 1);
}

#[tokio::test]
async fn owners_do_not_see_each_others_groceries() {
    let server = TestServer::with_doubles().await;
    let alice = server.login_as("alice").await;
    let bob = server.login_as("bob").await;

    let res = server.add_grocery(&alice, json!({ "name": "Cheese" })).await;
    let id = res.json::<Value>().await.unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    assert!(server.groceries(&bob).await.is_empty());
    let res = server
        .client
        .delete(server.url(&format!("/api/groceries/{id}")))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(server.groceries(&alice).await.len(), 1);
}

#[tokio::test]
async fn analyze_text_extracts_enriches_and_reconciles() {
    let server = TestServer::with_doubles().await;
    let token = server.login_as("tester").await;

    let res = server
        .client
        .post(server.url("/api/receipt/analyze-text"))
        .bearer_auth(&token)
        .json(&json!({ "text": "- 2 x Milk\nBread\n\n3 Apples" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["total_items"], 3);
    assert_eq!(body["items"][0], json!({ "name": "Milk", "count": 2, "min_days": 3, "max_days": 7 }));
    assert_eq!(body["items"][1], json!({ "name": "Bread", "count": 1 }));
    assert_eq!(body["grocery_ids"].as_array().unwrap().len(), 3);

    let list = server.groceries(&token).await;
    let milk = list.iter().find(|g| g["name"] == "Milk").unwrap();
    assert_eq!(milk["count"], 2);
    assert_eq!(milk["max_days"], 7);
}

#[tokio::test]
async fn analyze_text_works_without_a_model() {
    let server = TestServer::spawn(AppServices::in_memory(JWT_SECRET)).await;
    let token = server.login_as("tester").await;

    let res = server
        .client
        .post(server.url("/api/receipt/analyze-text"))
        .bearer_auth(&token)
        .json(&json!({ "text": "Milk 2" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["items"][0], json!({ "name": "Milk", "count": 2 }));
}

#[tokio::test]
async fn upload_runs_ocr_and_records_the_receipt() {
    let server = TestServer::with_doubles().await;
    let token = server.login_as("tester").await;

    let upload = || {
        let part = reqwest::multipart::Part::bytes(vec![0x89, b'P', b'N', b'G'])
            .file_name("receipt.PNG");
        server
            .client
            .post(server.url("/api/receipt/upload"))
            .bearer_auth(&token)
            .multipart(reqwest::multipart::Form::new().part("file", part))
            .send()
    };

    let res = upload().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["total_items"], 2);
    assert_eq!(body["raw_text"], "MILK 1L 0.99\nBREAD 1.49");

    assert_eq!(server.groceries(&token).await.len(), 2);

    // Back-to-back uploads never share a stored file.
    assert_eq!(upload().await.unwrap().status(), StatusCode::OK);

    let res = server
        .client
        .get(server.url("/api/receipts"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let receipts: Vec<Value> = res.json().await.unwrap();
    assert_eq!(receipts.len(), 2);
    for receipt in &receipts {
        assert_eq!(receipt["grocery_items"].as_array().unwrap().len(), 2);
        let file_path = receipt["file_path"].as_str().unwrap();
        assert!(file_path.ends_with(".png"));
        assert!(file_path.contains(receipt["id"].as_str().unwrap()));
        assert!(Path::new(file_path).exists());
    }
    assert_ne!(receipts[0]["file_path"], receipts[1]["file_path"]);
    assert_eq!(server.groceries(&token).await[0]["count"], 2);
}

#[tokio::test]
async fn upload_validates_the_file() {
    let server = TestServer::spawn(
        AppServices::in_memory(JWT_SECRET)
            .with_analyzer(Arc::new(StubAnalyzer))
            .with_ocr(Arc::new(StubOcr))
            .with_upload_policy(UploadPolicy::new(["png"], 1))
            .with_upload_dir(scratch_dir()),
    )
    .await;
    let token = server.login_as("tester").await;

    let upload = |name: &'static str, size: usize| {
        let part = reqwest::multipart::Part::bytes(vec![0u8; size]).file_name(name);
        server
            .client
            .post(server.url("/api/receipt/upload"))
            .bearer_auth(&token)
            .multipart(reqwest::multipart::Form::new().part("file", part))
            .send()
    };

    let res = upload("notes.txt", 10).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = upload("big.png", 1024 * 1024 + 1).await.unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "File too large. Maximum size: 1MB");

    let res = server
        .client
        .post(server.url("/api/receipt/upload"))
        .bearer_auth(&token)
        .multipart(reqwest::multipart::Form::new().text("note", "no file here"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "No file provided");

    assert!(server.groceries(&token).await.is_empty());
}

#[tokio::test]
async fn upload_without_a_model_is_unavailable() {
    let server = TestServer::spawn(
        AppServices::in_memory(JWT_SECRET)
            .with_ocr(Arc::new(StubOcr))
            .with_upload_dir(scratch_dir()),
    )
    .await;
    let token = server.login_as("tester").await;

    let part = reqwest::multipart::Part::bytes(vec![1, 2, 3]).file_name("r.png");
    let res = server
        .client
        .post(server.url("/api/receipt/upload"))
        .bearer_auth(&token)
        .multipart(reqwest::multipart::Form::new().part("file", part))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn recipe_crud_is_owner_scoped() {
    let server = TestServer::with_doubles().await;
    let alice = server.login_as("alice").await;
    let bob = server.login_as("bob").await;

    let res = server
        .client
        .post(server.url("/api/recipes"))
        .bearer_auth(&alice)
        .json(&json!({ "title": "Omelette", "ingredients": ["eggs", "milk"], "steps": ["whisk", "fry"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let recipe: Value = res.json().await.unwrap();
    assert_eq!(recipe["estimated_minutes"], 20);
    assert_eq!(recipe["source"], "manual");
    let id = recipe["id"].as_str().unwrap().to_string();
    let path = format!("/api/recipes/{id}");

    let res = server.client.get(server.url(&path)).bearer_auth(&bob).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Recipe not found");

    let res = server
        .client
        .patch(server.url(&path))
        .bearer_auth(&alice)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "No fields to update");

    let res = server
        .client
        .patch(server.url(&path))
        .bearer_auth(&alice)
        .json(&json!({ "estimated_minutes": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["estimated_minutes"], 10);
    assert_eq!(body["title"], "Omelette");

    let res = server.client.delete(server.url(&path)).bearer_auth(&bob).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = server.client.delete(server.url(&path)).bearer_auth(&alice).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server
        .client
        .get(server.url("/api/recipes/not-a-uuid"))
        .bearer_auth(&alice)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid recipe id");
}
