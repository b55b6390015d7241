//! Application provides API for interacting with the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod config;
pub mod error;
pub mod extract;

use axum::{extract::DefaultBodyLimit, Extension, Router};
// Used in binary.
use axum_client_ip as _;
use futures as _;
use refinery as _;
use tokio as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    config::Config,
    error::{AsError, Error},
    extract::{Origin, Session},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
#[cfg(not(test))]
pub type Service = service::Service<
    service::infra::Postgres,
    service::infra::storage::Local,
>;

/// [`Service`] with in-memory infrastructure dependencies.
///
/// [`Service`]: service::Service
#[cfg(test)]
pub type Service = service::Service<
    service::infra::database::Memory,
    service::infra::storage::Memory,
>;

/// Builds the HTTP application on top of the provided [`Service`].
///
/// Request bodies are limited to `max_upload_size` bytes.
#[must_use]
pub fn app(service: Service, max_upload_size: usize) -> Router {
    api::router()
        .layer(DefaultBodyLimit::max(max_upload_size))
        .layer(Extension(service))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{body::Body, Router};
    use http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use service::{
        infra::{database, storage},
        task,
    };
    use tower::ServiceExt as _;

    use super::{app, Service};

    const BOUNDARY: &str = "notes-test-boundary";

    fn service() -> Service {
        let config = service::Config::new(
            b"router secret",
            Duration::from_secs(60 * 60),
            task::purge_deleted_notes::Config {
                interval: Duration::from_secs(60 * 60),
                retention: Duration::from_secs(60 * 60),
            },
        )
        .unwrap();
        let (service, _) = Service::new(
            config,
            database::Memory::new(),
            storage::Memory::new(),
        );
        service
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, json)
    }

    fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn authorized(method: Method, uri: &str, token: &str) -> http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::HOST, "notes.test")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
    }

    /// Image part of a [`multipart()`] body.
    struct Image<'a> {
        file_name: &'a str,
        content_type: &'a str,
        data: &'a [u8],
    }

    fn multipart(fields: &[(&str, &str)], image: Option<Image<'_>>) -> Body {
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\n\
                     Content-Disposition: form-data; name=\"{name}\"\r\n\r\n\
                     {value}\r\n",
                )
                .as_bytes(),
            );
        }
        if let Some(Image {
            file_name,
            content_type,
            data,
        }) = image
        {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\n\
                     Content-Disposition: form-data; name=\"image\"; \
                     filename=\"{file_name}\"\r\n\
                     Content-Type: {content_type}\r\n\r\n",
                )
                .as_bytes(),
            );
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        Body::from(body)
    }

    fn with_multipart(req: http::request::Builder, body: Body) -> Request<Body> {
        req.header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(body)
        .unwrap()
    }

    async fn register(app: &Router, email: &str) -> String {
        let (status, json) = send(
            app,
            json_request(
                Method::POST,
                "/auth/register",
                &json!({
                    "name": "Alice",
                    "email": email,
                    "password": "correct horse",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["data"]["token"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn registers_and_logs_in() {
        let app = app(service(), 1024 * 1024);

        let (status, json) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/register",
                &json!({
                    "name": "Alice",
                    "email": "alice@example.com",
                    "password": "correct horse",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(json["status"], "success");
        assert_eq!(json["message"], "User registered successfully");
        assert_eq!(json["data"]["user"]["email"], "alice@example.com");
        assert_eq!(json["data"]["user"]["name"], "Alice");
        assert!(json["data"]["user"].get("password_hash").is_none());
        assert!(json["data"]["token"].is_string());

        let (status, json) = send(
            &app,
            json_request(
                Method::POST,
                "/api/auth/login",
                &json!({
                    "email": "alice@example.com",
                    "password": "correct horse",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Login successful");

        let token = json["data"]["token"].as_str().unwrap();
        let (status, json) = send(
            &app,
            authorized(Method::GET, "/notes", token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["notes"], json!([]));
    }

    #[tokio::test]
    async fn rejects_duplicate_registration() {
        let app = app(service(), 1024 * 1024);
        _ = register(&app, "bob@example.com").await;

        let (status, json) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/register",
                &json!({
                    "name": "Bobby",
                    "email": "bob@example.com",
                    "password": "another one",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "User with this email already exists");
    }

    #[tokio::test]
    async fn rejects_invalid_registration() {
        let app = app(service(), 1024 * 1024);

        let (status, json) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/register",
                &json!({
                    "name": "Carol",
                    "email": "not-an-email",
                    "password": "long enough",
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "INVALID_EMAIL");

        let (status, _) = send(
            &app,
            json_request(Method::POST, "/auth/register", &json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let app = app(service(), 1024 * 1024);
        _ = register(&app, "dave@example.com").await;

        let (wrong_status, wrong) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/login",
                &json!({"email": "dave@example.com", "password": "nope nope"}),
            ),
        )
        .await;
        let (unknown_status, unknown) = send(
            &app,
            json_request(
                Method::POST,
                "/auth/login",
                &json!({"email": "eve@example.com", "password": "nope nope"}),
            ),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong, unknown);
        assert_eq!(wrong["error"], "Invalid credentials");
    }

    #[tokio::test]
    async fn requires_valid_token() {
        let app = app(service(), 1024 * 1024);

        let (status, json) = send(
            &app,
            Request::builder().uri("/notes").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Missing or malformed JWT");

        let (status, json) = send(
            &app,
            authorized(Method::GET, "/notes", "not.a.jwt")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["error"], "Invalid or expired JWT");
    }

    #[tokio::test]
    async fn notes_lifecycle() {
        let service = service();
        let app = app(service.clone(), 1024 * 1024);
        let token = register(&app, "frank@example.com").await;

        let (status, json) = send(
            &app,
            with_multipart(
                authorized(Method::POST, "/notes", &token),
                multipart(
                    &[("title", "Groceries"), ("content", "milk, eggs")],
                    Some(Image {
                        file_name: "list.PNG",
                        content_type: "image/png",
                        data: b"\x89PNG",
                    }),
                ),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        assert_eq!(json["message"], "Note created successfully");
        let note = &json["data"]["note"];
        let id = note["id"].as_str().unwrap().to_owned();
        let url = note["image_url"].as_str().unwrap();
        assert!(url.starts_with("http://notes.test/uploads/"), "{url}");
        assert!(url.ends_with(".png"), "{url}");
        assert_eq!(service.storage().count().await, 1);

        let (status, json) = send(
            &app,
            authorized(Method::GET, &format!("/notes/{id}"), &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["note"]["title"], "Groceries");
        assert_eq!(json["data"]["note"]["content"], "milk, eggs");
        assert_eq!(json["data"]["note"]["image_url"], url);

        let (status, json) = send(
            &app,
            with_multipart(
                authorized(Method::PUT, &format!("/notes/{id}"), &token),
                multipart(&[("content", "bread")], None),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["message"], "Note updated successfully");
        assert_eq!(json["data"]["note"]["title"], "Groceries");
        assert_eq!(json["data"]["note"]["content"], "bread");

        let (status, json) = send(
            &app,
            authorized(Method::DELETE, &format!("/notes/{id}"), &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Note deleted successfully");
        assert!(json.get("data").is_none());
        assert_eq!(service.storage().count().await, 0);

        let (status, json) = send(
            &app,
            authorized(Method::GET, &format!("/notes/{id}"), &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Note not found");
    }

    #[tokio::test]
    async fn notes_are_invisible_to_others() {
        let app = app(service(), 1024 * 1024);
        let alice = register(&app, "alice@example.com").await;
        let bob = register(&app, "bob@example.com").await;

        let (_, json) = send(
            &app,
            with_multipart(
                authorized(Method::POST, "/notes", &alice),
                multipart(&[("title", "Secret")], None),
            ),
        )
        .await;
        let id = json["data"]["note"]["id"].as_str().unwrap().to_owned();
        assert!(json["data"]["note"].get("image_url").is_none());

        for method in [Method::GET, Method::DELETE] {
            let (status, _) = send(
                &app,
                authorized(method, &format!("/notes/{id}"), &bob)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await;
            assert_eq!(status, StatusCode::NOT_FOUND);
        }

        let (status, _) = send(
            &app,
            with_multipart(
                authorized(Method::PUT, &format!("/notes/{id}"), &bob),
                multipart(&[("title", "Mine now")], None),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, json) = send(
            &app,
            authorized(Method::GET, "/notes", &bob)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(json["data"]["notes"], json!([]));

        let (status, json) = send(
            &app,
            authorized(Method::GET, &format!("/notes/{id}"), &alice)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["note"]["title"], "Secret");

        let (status, _) = send(
            &app,
            authorized(Method::GET, "/notes/not-a-uuid", &alice)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn validates_note_form() {
        let service = service();
        let app = app(service.clone(), 1024 * 1024);
        let token = register(&app, "grace@example.com").await;

        let (status, json) = send(
            &app,
            with_multipart(
                authorized(Method::POST, "/notes", &token),
                multipart(&[("title", "   "), ("content", "orphan")], None),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Title is required");

        let (status, json) = send(
            &app,
            with_multipart(
                authorized(Method::POST, "/notes", &token),
                multipart(
                    &[("title", "Readme")],
                    Some(Image {
                        file_name: "readme.png",
                        content_type: "text/plain",
                        data: b"hello",
                    }),
                ),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"],
            "Invalid image type. Only JPEG, PNG, and GIF are allowed",
        );
        assert_eq!(service.storage().count().await, 0);

        let (status, _) = send(
            &app,
            authorized(Method::POST, "/notes", &token)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn rejects_unsupported_image_on_update() {
        let service = service();
        let app = app(service.clone(), 1024 * 1024);
        let token = register(&app, "ivan@example.com").await;

        let (_, json) = send(
            &app,
            with_multipart(
                authorized(Method::POST, "/notes", &token),
                multipart(
                    &[("title", "Photo")],
                    Some(Image {
                        file_name: "photo.jpg",
                        content_type: "image/jpeg",
                        data: b"\xFF\xD8\xFF",
                    }),
                ),
            ),
        )
        .await;
        let id = json["data"]["note"]["id"].as_str().unwrap().to_owned();
        let url = json["data"]["note"]["image_url"].as_str().unwrap().to_owned();

        let (status, json) = send(
            &app,
            with_multipart(
                authorized(Method::PUT, &format!("/notes/{id}"), &token),
                multipart(
                    &[("title", "Renamed")],
                    Some(Image {
                        file_name: "photo.jpg",
                        content_type: "text/plain",
                        data: b"not an image",
                    }),
                ),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"],
            "Invalid image type. Only JPEG, PNG, and GIF are allowed",
        );

        let (status, json) = send(
            &app,
            authorized(Method::GET, &format!("/notes/{id}"), &token)
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["note"]["image_url"], url);
        assert_eq!(json["data"]["note"]["title"], "Photo");
        assert_eq!(service.storage().count().await, 1);
    }

    #[tokio::test]
    async fn oversized_upload_is_too_large() {
        let app = app(service(), 512);
        let token = register(&app, "judy@example.com").await;

        let (status, json) = send(
            &app,
            with_multipart(
                authorized(Method::POST, "/notes", &token),
                multipart(
                    &[("title", "Huge")],
                    Some(Image {
                        file_name: "huge.png",
                        content_type: "image/png",
                        data: &[0; 4096],
                    }),
                ),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE, "{json}");
        assert_eq!(json["status"], "error");
    }

    #[tokio::test]
    async fn replacing_image_releases_previous_one() {
        let service = service();
        let app = app(service.clone(), 1024 * 1024);
        let token = register(&app, "heidi@example.com").await;
        let gif = |name| Image {
            file_name: name,
            content_type: "image/gif",
            data: b"GIF89a",
        };

        let (_, json) = send(
            &app,
            with_multipart(
                authorized(Method::POST, "/notes", &token),
                multipart(&[("title", "Cat")], Some(gif("cat.gif"))),
            ),
        )
        .await;
        let id = json["data"]["note"]["id"].as_str().unwrap().to_owned();
        let old = json["data"]["note"]["image_url"].as_str().unwrap().to_owned();

        let (status, json) = send(
            &app,
            with_multipart(
                authorized(Method::PUT, &format!("/notes/{id}"), &token),
                multipart(&[], Some(gif("dog.gif"))),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "{json}");
        let new = json["data"]["note"]["image_url"].as_str().unwrap();
        assert_ne!(new, old);
        assert_eq!(json["data"]["note"]["title"], "Cat");
        assert_eq!(service.storage().count().await, 1);
    }

    #[tokio::test]
    async fn reports_health() {
        let app = app(service(), 1024);

        let (status, json) = send(
            &app,
            Request::builder().uri("/health").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!({"status": "ok", "message": "Notes API is running"}),
        );

        let (status, json) = send(
            &app,
            Request::builder().uri("/").body(Body::empty()).unwrap(),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["endpoints"]["notes"]["list"], "GET /notes");
    }
}
