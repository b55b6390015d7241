//! Request extractors resolving the acting [`Session`] and the client
//! [`Origin`].

use std::convert::Infallible;

use axum::{async_trait, extract::FromRequestParts, RequestPartsExt as _};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use service::{
    command::{self, Command as _},
    domain::user::{self, session},
    infra::storage,
};

use crate::{define_error, AsError, Error, Service};

/// Authorized session of the [`user`] performing the request.
///
/// Extracting it is the only way for a handler to learn who acts, so every
/// [`Note`] access is scoped by [`Session::user_id`].
///
/// [`Note`]: service::domain::Note
#[derive(Clone, Copy, Debug)]
pub struct Session {
    /// ID of the [`user`] this [`Session`] belongs to.
    pub user_id: user::Id,

    /// [`session::ExpirationDateTime`] of this [`Session`].
    pub expires_at: session::ExpirationDateTime,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| Error::internal(&"missing `Service` extension"))?;

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::Malformed)?;

        service
            .execute(command::AuthorizeUserSession {
                token: bearer.token().into(),
            })
            .await
            .map(|s| Self {
                user_id: s.user_id,
                expires_at: s.expires_at,
            })
            .map_err(AsError::into_error)
    }
}

impl AsError for command::authorize_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::JsonWebTokenDecodeError(_) => Some(AuthError::Invalid.into()),
        }
    }
}

define_error! {
    enum AuthError {
        #[code = "MALFORMED_TOKEN"]
        #[status = BAD_REQUEST]
        #[message = "Missing or malformed JWT"]
        Malformed,

        #[code = "INVALID_TOKEN"]
        #[status = UNAUTHORIZED]
        #[message = "Invalid or expired JWT"]
        Invalid,
    }
}

/// Origin the client reached this server at, used for building absolute
/// image URLs.
#[derive(Clone, Debug)]
pub struct Origin(pub storage::Origin);

#[async_trait]
impl<S> FromRequestParts<S> for Origin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        let header = |name: &'static str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let scheme = header("x-forwarded-proto")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .or_else(|| parts.uri.scheme_str())
            .unwrap_or("http")
            .to_ascii_lowercase();
        let host = header("host")
            .or_else(|| parts.uri.authority().map(http::uri::Authority::as_str))
            .unwrap_or("localhost")
            .to_owned();

        Ok(Self(storage::Origin { scheme, host }))
    }
}
