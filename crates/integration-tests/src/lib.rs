//! Shared fixtures: a fully wired router over the in-memory store, JWT
//! tokens for arbitrary actors, and small JSON request helpers.

use std::sync::Arc;

use api_adapters::{app, AppState, HttpOptions};
use auth_adapters::JwtAuthority;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use chrono::{Duration, Utc};
use domains::{Actor, MediaStorage, Repos, Role};
use secrecy::SecretString;
use serde_json::{json, Value};
use services::Services;
use storage_adapters::{LocalMediaStorage, MemoryStore};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

pub const UPLOAD_LIMIT: usize = 64 * 1024;
pub const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR\0\0\0\x01\0\0\0\x01";
const BOUNDARY: &str = "alumni-hub-test-boundary";

pub struct TestApp {
    router: Router,
    authority: JwtAuthority,
    pub store: Arc<MemoryStore>,
    pub services: Services,
    pub uploads: TempDir,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// Real local media storage rooted in a temp dir.
    pub fn new() -> Self {
        let uploads = TempDir::new().expect("temp dir");
        let media = Arc::new(LocalMediaStorage::new(uploads.path(), UPLOAD_LIMIT));
        Self::with_media(media, uploads)
    }

    pub fn with_media(media: Arc<dyn MediaStorage>, uploads: TempDir) -> Self {
        let store = Arc::new(MemoryStore::new());
        let services = Services::new(Repos::from_store(store.clone()), media);
        let authority =
            JwtAuthority::new(&SecretString::from("integration-secret")).expect("authority");
        let verifier =
            Arc::new(JwtAuthority::new(&SecretString::from("integration-secret")).expect("authority"));
        let router = app(
            AppState::new(services.clone(), verifier),
            HttpOptions {
                uploads_dir: uploads.path().to_path_buf(),
                max_body_bytes: UPLOAD_LIMIT * 2,
            },
        );
        Self {
            router,
            authority,
            store,
            services,
            uploads,
        }
    }

    pub fn token(&self, actor: &Actor) -> String {
        self.authority
            .issue(actor, Duration::hours(1))
            .expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        read_json(self.send(request).await).await
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None, None).await
    }

    pub async fn get_as(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, Some(token), None).await
    }

    /// Sends one file as `multipart/form-data`.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        file_name: &str,
        data: &[u8],
    ) -> (StatusCode, Value) {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .expect("request");
        read_json(self.send(request).await).await
    }

    /// Files currently under the upload root, relative to it.
    pub fn stored_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        let root = self.uploads.path();
        let Ok(categories) = std::fs::read_dir(root) else {
            return files;
        };
        for category in categories.flatten() {
            let Ok(entries) = std::fs::read_dir(category.path()) else {
                continue;
            };
            for entry in entries.flatten() {
                if let Ok(relative) = entry.path().strip_prefix(root) {
                    files.push(relative.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        files.sort();
        files
    }

    /// Creates a school through the API and returns its JSON.
    pub async fn create_school(&self, admin_token: &str, name: &str, admins: &[Uuid]) -> Value {
        let (status, body) = self
            .post("/api/schools", admin_token, school_json(name, admins))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["school"].clone()
    }

    /// Creates the general forum as `admin` and returns its JSON.
    pub async fn create_general_forum(&self, admin: &Actor) -> Value {
        let (status, body) = self
            .post(
                "/api/forums",
                &self.token(admin),
                json!({ "name": "General Discussion", "description": "Open to every alumnus" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["forum"].clone()
    }

    pub async fn create_topic(&self, author: &Actor, forum_id: &str, title: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/topics",
                &self.token(author),
                json!({ "forumId": forum_id, "title": title, "content": "opening words" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["topic"].clone()
    }

    pub async fn create_post(&self, author: &Actor, topic_id: &str, content: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/posts",
                &self.token(author),
                json!({ "topicId": topic_id, "content": content }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["post"].clone()
    }

    pub async fn forum(&self, id: &str) -> Value {
        let (status, body) = self.get(&format!("/api/forums/{id}")).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["forum"].clone()
    }
}

pub async fn read_json(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

pub fn platform_admin() -> Actor {
    Actor::new(Uuid::now_v7(), Role::UsosaAdmin, None)
}

pub fn alumni() -> Actor {
    Actor::new(Uuid::now_v7(), Role::Alumni, None)
}

pub fn alumni_of(school_id: Uuid) -> Actor {
    Actor::new(Uuid::now_v7(), Role::Alumni, Some(school_id))
}

pub fn guest() -> Actor {
    Actor::new(Uuid::now_v7(), Role::Guest, None)
}

pub fn school_json(name: &str, admins: &[Uuid]) -> Value {
    let mut body = json!({
        "name": name,
        "shortName": name.split_whitespace().filter_map(|w| w.chars().next()).collect::<String>(),
        "type": "Federal Government College",
        "gender": "Mixed",
        "location": { "city": "Ibadan", "state": "Oyo", "region": "South West" },
    });
    if !admins.is_empty() {
        body["adminUsers"] = json!(admins);
    }
    body
}

pub fn event_json(visibility: &str, capacity: Option<u32>, fee: f64) -> Value {
    let start = Utc::now() + Duration::days(21);
    json!({
        "title": "Founders' Day Dinner",
        "description": "An evening with old friends",
        "eventType": "Social",
        "startDate": start,
        "endDate": start + Duration::hours(5),
        "location": {
            "venue": "Sheraton",
            "address": "30 Mobolaji Bank Anthony Way",
            "city": "Ikeja",
            "state": "Lagos"
        },
        "capacity": capacity,
        "registrationFee": { "amount": fee },
        "status": "published",
        "visibility": visibility,
    })
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().expect("id").to_string()
}
