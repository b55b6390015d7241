//! HTTP API definitions.

pub mod auth;
pub mod note;
pub mod user;

use std::collections::BTreeMap;

use axum::{
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

pub use self::{note::Note, user::User};

/// Builds the [`Router`] of all the API endpoints.
#[must_use]
pub fn router() -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/notes", get(note::list).post(note::create))
        .route(
            "/notes/:id",
            get(note::get).put(note::update).delete(note::delete),
        );

    Router::new()
        .route("/", get(info))
        .route("/health", get(health))
        .merge(api.clone())
        .nest("/api", api)
}

/// Successful API response.
///
/// Serialized as `{"status": "success", "message"?, "data"?}`.
#[derive(Debug)]
pub struct Reply<T> {
    /// [`http::StatusCode`] of this [`Reply`].
    status_code: http::StatusCode,

    /// Human-readable message of this [`Reply`].
    message: Option<&'static str>,

    /// Payload of this [`Reply`].
    data: Option<T>,
}

impl<T> Reply<T> {
    /// Creates a new `200 OK` [`Reply`] carrying the provided `data`.
    #[must_use]
    pub fn ok(data: T) -> Self {
        Self {
            status_code: http::StatusCode::OK,
            message: None,
            data: Some(data),
        }
    }

    /// Creates a new `201 Created` [`Reply`] carrying the provided `data`.
    #[must_use]
    pub fn created(data: T) -> Self {
        Self {
            status_code: http::StatusCode::CREATED,
            ..Self::ok(data)
        }
    }

    /// Attaches the provided human-readable `message` to this [`Reply`].
    #[must_use]
    pub fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

impl Reply<()> {
    /// Creates a new `200 OK` [`Reply`] carrying only the provided `message`.
    #[must_use]
    pub fn message(message: &'static str) -> Self {
        Self {
            status_code: http::StatusCode::OK,
            message: Some(message),
            data: None,
        }
    }
}

/// Serialized body of a [`Reply`].
#[derive(Serialize)]
struct Envelope<T> {
    /// Always `success`.
    status: &'static str,

    /// [`Reply::message`].
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,

    /// [`Reply::data`].
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        let Self {
            status_code,
            message,
            data,
        } = self;
        (
            status_code,
            Json(Envelope {
                status: "success",
                message,
                data,
            }),
        )
            .into_response()
    }
}

/// Liveness of the server.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Health {
    /// Always `ok`.
    pub status: &'static str,

    /// Human-readable message.
    pub message: &'static str,
}

/// Liveness check handler.
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
pub async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        message: "Notes API is running",
    })
}

/// Description of this API.
#[derive(Clone, Debug, Serialize)]
pub struct Info {
    /// Greeting message.
    pub message: &'static str,

    /// Version of the server.
    pub version: &'static str,

    /// Always `running`.
    pub status: &'static str,

    /// Path of the liveness check.
    pub health: &'static str,

    /// Available endpoints grouped by resource.
    pub endpoints: BTreeMap<&'static str, BTreeMap<&'static str, &'static str>>,
}

/// API description handler.
#[expect(clippy::unused_async, reason = "`async` is required by `axum`")]
pub async fn info() -> Json<Info> {
    let auth = [
        ("register", "POST /auth/register"),
        ("login", "POST /auth/login"),
    ];
    let notes = [
        ("list", "GET /notes"),
        ("get", "GET /notes/{id}"),
        ("create", "POST /notes"),
        ("update", "PUT /notes/{id}"),
        ("delete", "DELETE /notes/{id}"),
    ];

    Json(Info {
        message: "Welcome to Notes API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        health: "/health",
        endpoints: BTreeMap::from([
            ("auth", BTreeMap::from(auth)),
            ("notes", BTreeMap::from(notes)),
        ]),
    })
}
