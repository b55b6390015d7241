//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::SecretBox;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{session::Token, Email, Password};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::{verify_password, Command, HashingError};

/// [`Command`] for creating a [`Session`].
#[derive(Debug, From)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials.
    ByCredentials {
        /// Unvalidated [`Email`] of a [`User`].
        ///
        /// A malformed one is treated as wrong credentials.
        email: String,

        /// [`Password`] of a [`User`].
        password: SecretBox<user::Password>,
    },

    /// Create a new [`Session`] by [`User`] ID.
    ByUserId(user::Id),
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`User`] whose [`Session`] has been created.
    pub user: User,

    /// [`DateTime`] when the [`Session`] expires.
    pub expires_at: session::ExpirationDateTime,
}

impl<Db, Fs> Command<CreateUserSession> for Service<Db, Fs>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByCredentials { email, password } => {
                let user = match user::Email::new(email) {
                    Some(email) => self
                        .database()
                        .execute(Select(By::new(&email)))
                        .await
                        .map_err(tracerr::map_from_and_wrap!(=> E))?,
                    None => None,
                };

                // Unknown users are verified against a dummy hash, so they
                // cannot be told apart from wrong passwords by timing.
                let hash = user.as_ref().map(|u| u.password_hash.clone());
                let verified = verify_password(hash, password)
                    .await
                    .map_err(tracerr::from_and_wrap!(=> E))?;

                user.filter(|_| verified)
                    .ok_or(E::WrongCredentials)
                    .map_err(tracerr::wrap!())?
            }
            Cmd::ByUserId(user_id) => self
                .database()
                .execute(Select(By::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
        };

        let expires_at = DateTime::now()
            .checked_add(self.config().session_ttl)
            .ok_or(E::ExpirationOutOfRange)
            .map_err(tracerr::wrap!())?
            .coerce();
        let token = jsonwebtoken::encode::<Session>(
            &jsonwebtoken::Header::default(),
            &Session {
                user_id: user.id,
                expires_at,
            },
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(Output {
            token: token.into(),
            user,
            expires_at,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Verification of the [`Password`] failed.
    #[display("Failed to verify `Password`: {_0}")]
    Hashing(HashingError),

    /// Session expiration doesn't fit into the supported date range.
    #[display("Session expiration is out of range")]
    ExpirationOutOfRange,

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Invalid credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod tests {
    use secrecy::SecretBox;

    use crate::{
        command::CreateUser,
        domain::user::{self, Email, Name},
        infra::{database, storage},
        tests::service,
        Service,
    };

    use super::{Command as _, CreateUserSession, ExecutionError};

    fn password(p: &str) -> SecretBox<user::Password> {
        SecretBox::new(Box::new(user::Password::from(p)))
    }

    async fn registered(
        svc: &Service<database::Memory, storage::Memory>,
    ) -> user::Id {
        svc.execute(CreateUser {
            name: Name::new("Alice").unwrap(),
            email: Email::new("alice@example.com").unwrap(),
            password: password("secret1"),
        })
        .await
        .unwrap()
        .id
    }

    fn by_credentials(email: &str, pass: &str) -> CreateUserSession {
        CreateUserSession::ByCredentials {
            email: email.into(),
            password: password(pass),
        }
    }

    #[tokio::test]
    async fn issues_token_for_valid_credentials() {
        let svc = service();
        let id = registered(&svc).await;

        let out = svc
            .execute(by_credentials("alice@example.com", "secret1"))
            .await
            .unwrap();

        assert_eq!(out.user.id, id);
        assert!(!out.token.to_string().is_empty());
        assert!(out.expires_at > common::DateTime::now().coerce());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_are_indistinguishable() {
        let svc = service();
        drop(registered(&svc).await);

        for (email, pass) in [
            ("alice@example.com", "wrong-password"),
            ("bob@example.com", "secret1"),
            ("not an email", "secret1"),
        ] {
            let err = svc
                .execute(by_credentials(email, pass))
                .await
                .unwrap_err();

            assert!(
                matches!(err.as_ref(), ExecutionError::WrongCredentials),
                "unexpected error for `{email}`: {err}",
            );
            assert_eq!(err.as_ref().to_string(), "Invalid credentials");
        }
    }

    #[tokio::test]
    async fn issues_token_by_user_id() {
        let svc = service();
        let id = registered(&svc).await;

        assert_eq!(
            svc.execute(CreateUserSession::ByUserId(id))
                .await
                .unwrap()
                .user
                .id,
            id,
        );
        assert!(svc
            .execute(CreateUserSession::ByUserId(user::Id::new()))
            .await
            .is_err());
    }
}
