//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_note;
pub mod create_user;
pub mod create_user_session;
pub mod delete_note;
pub mod update_note;

use common::operations::Delete;
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{image, user},
    infra::{
        storage::{self, Cleanup},
        Storage,
    },
};

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, create_note::CreateNote,
    create_user::CreateUser, create_user_session::CreateUserSession,
    delete_note::DeleteNote, update_note::UpdateNote,
};

/// Hashes the provided [`user::Password`] on the blocking thread pool.
///
/// # Errors
///
/// If the hashing fails or its blocking task panics.
async fn hash_password(
    password: SecretBox<user::Password>,
) -> Result<user::PasswordHash, HashingError> {
    task::spawn_blocking(move || {
        user::PasswordHash::new(password.expose_secret())
    })
    .await?
    .map_err(HashingError::Hash)
}

/// Verifies the provided [`user::Password`] against the provided
/// [`user::PasswordHash`] on the blocking thread pool.
///
/// A missing `hash` is substituted with [`user::PasswordHash::dummy()`], so
/// the verification costs the same, but never succeeds.
///
/// # Errors
///
/// If the `hash` is malformed or the blocking task panics.
async fn verify_password(
    hash: Option<user::PasswordHash>,
    password: SecretBox<user::Password>,
) -> Result<bool, HashingError> {
    task::spawn_blocking(move || match hash {
        Some(hash) => hash.verify(password.expose_secret()),
        None => user::PasswordHash::dummy().map_or(Ok(false), |dummy| {
            dummy.verify(password.expose_secret()).map(|_| false)
        }),
    })
    .await?
    .map_err(HashingError::Hash)
}

/// Error of hashing a [`user::Password`] or verifying it.
#[derive(Debug, Display, Error, From)]
pub enum HashingError {
    /// Hashing algorithm error.
    #[display("Password hashing failed: {_0}")]
    #[from(ignore)]
    Hash(#[error(not(source))] user::HashError),

    /// Blocking task running the algorithm failed.
    #[display("Password hashing task failed: {_0}")]
    Join(task::JoinError),
}

/// Releases the image stored under the provided [`image::Key`] (if any) on a
/// best-effort basis.
///
/// Failures are logged and reported as [`Cleanup::Failed`], never returned.
async fn release_image<Fs>(storage: &Fs, key: Option<image::Key>) -> Cleanup
where
    Fs: Storage<Delete<image::Key>, Ok = (), Err = Traced<storage::Error>>,
{
    let Some(key) = key else {
        return Cleanup::Skipped;
    };
    match storage.execute(Delete(key.clone())).await {
        Ok(()) => Cleanup::Removed,
        Err(e) => {
            log::warn!("failed to release `image::Key({key})`: {e}");
            Cleanup::Failed
        }
    }
}
