//! [`Command`] for authorizing a [`User`] by a [`Session`] token.

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`User`] by a [`Session`] token.
///
/// Authorization is stateless: a [`session::Token`] is valid as long as its
/// signature matches and it hasn't expired.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db, Fs> Command<AuthorizeUserSession> for Service<Db, Fs> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        let mut validation = Validation::default();
        validation.leeway = 0;

        Ok(jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &validation,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error, including expiration.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        domain::user::{self, Session},
        tests::{service, SECRET},
    };

    use super::{AuthorizeUserSession, Command as _};

    fn token(secret: &[u8], user_id: user::Id, ttl_secs: i64) -> String {
        let now = DateTime::now();
        let expires_at = if ttl_secs >= 0 {
            now.checked_add(Duration::from_secs(ttl_secs.unsigned_abs())).unwrap()
        } else {
            now.checked_sub(Duration::from_secs(ttl_secs.unsigned_abs())).unwrap()
        };
        jsonwebtoken::encode(
            &Header::default(),
            &Session {
                user_id,
                expires_at: expires_at.coerce(),
            },
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let svc = service();
        let id = user::Id::new();

        let session = svc
            .execute(AuthorizeUserSession {
                token: token(SECRET, id, 60).into(),
            })
            .await
            .unwrap();

        assert_eq!(session.user_id, id);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let svc = service();

        let res = svc
            .execute(AuthorizeUserSession {
                token: token(SECRET, user::Id::new(), -5).into(),
            })
            .await;

        assert!(res.is_err(), "expired token accepted");
    }

    #[tokio::test]
    async fn rejects_foreign_secret() {
        let svc = service();

        let res = svc
            .execute(AuthorizeUserSession {
                token: token(b"another secret", user::Id::new(), 60).into(),
            })
            .await;

        assert!(res.is_err(), "token of foreign secret accepted");
    }

    #[tokio::test]
    async fn rejects_garbage_of_any_shape() {
        let svc = service();

        for garbage in ["", "abc", "a.b.c", "...", "Bearer x", "\u{0}\u{ff}"] {
            let res = svc
                .execute(AuthorizeUserSession {
                    token: garbage.into(),
                })
                .await;

            assert!(res.is_err(), "`{garbage}` accepted");
        }
    }
}
