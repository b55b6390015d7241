//! Authentication endpoints.

use axum::{extract::rejection::JsonRejection, Extension, Json};
use derive_more::Debug;
use secrecy::SecretBox;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::user,
};

use crate::{api, define_error, AsError, Error, Service};

/// Body of a registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Display name of a new user.
    pub name: String,

    /// Email of a new user.
    pub email: String,

    /// Password of a new user.
    #[debug(skip)]
    pub password: String,
}

/// Body of a login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email of the user.
    pub email: String,

    /// Password of the user.
    #[debug(skip)]
    pub password: String,
}

/// Issued session along with its user.
#[derive(Clone, Debug, Serialize)]
pub struct Authenticated {
    /// Bearer token of the issued session.
    pub token: String,

    /// [`api::User`] the session is issued for.
    pub user: api::User,
}

impl From<command::create_user_session::Output> for Authenticated {
    fn from(output: command::create_user_session::Output) -> Self {
        Self {
            token: output.token.to_string(),
            user: output.user.into(),
        }
    }
}

/// Registers a new user and issues a session for it.
///
/// # Errors
///
/// - `400` if the body is malformed or the fields are invalid;
/// - `409` if the email is already registered.
#[tracing::instrument(skip_all, fields(http.handler = "register"))]
pub async fn register(
    Extension(service): Extension<Service>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<api::Reply<Authenticated>, Error> {
    let Json(RegisterRequest {
        name,
        email,
        password,
    }) = payload.map_err(AsError::into_error)?;

    let name =
        user::Name::new(name.trim()).ok_or(ValidationError::InvalidName)?;
    let email = user::Email::new(email).ok_or(ValidationError::InvalidEmail)?;
    let password = user::Password::new(password)
        .ok_or(ValidationError::InvalidPassword)?;

    let user = service
        .execute(command::CreateUser {
            name,
            email,
            password: SecretBox::init_with(move || password),
        })
        .await
        .map_err(AsError::into_error)?;
    tracing::info!(user.id = %user.id, "registered a new user");

    let output = service
        .execute(command::CreateUserSession::ByUserId(user.id))
        .await
        .map_err(AsError::into_error)?;

    Ok(api::Reply::created(output.into())
        .with_message("User registered successfully"))
}

/// Issues a new session for the provided credentials.
///
/// # Errors
///
/// - `400` if the body is malformed;
/// - `401` if the credentials don't match any user.
#[tracing::instrument(skip_all, fields(http.handler = "login"))]
pub async fn login(
    Extension(service): Extension<Service>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<api::Reply<Authenticated>, Error> {
    let Json(LoginRequest { email, password }) =
        payload.map_err(AsError::into_error)?;

    let output = service
        .execute(command::CreateUserSession::ByCredentials {
            email,
            password: SecretBox::init_with(move || {
                user::Password::from(password)
            }),
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(api::Reply::ok(output.into()).with_message("Login successful"))
}

define_error! {
    enum ValidationError {
        #[code = "INVALID_NAME"]
        #[status = BAD_REQUEST]
        #[message = "Name must be 2 to 512 bytes long and not blank"]
        InvalidName,

        #[code = "INVALID_EMAIL"]
        #[status = BAD_REQUEST]
        #[message = "Email is not a valid address"]
        InvalidEmail,

        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "Password must be 6 to 128 bytes long"]
        InvalidPassword,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "User with this email already exists"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
            Self::Hashing(_) => None,
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Invalid credentials"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::ExpirationOutOfRange
            | Self::Hashing(_)
            | Self::JsonWebTokenEncodeError(_)
            | Self::UserNotExists(_) => None,
            Self::WrongCredentials => Some(Error::WrongCredentials.into()),
        }
    }
}
