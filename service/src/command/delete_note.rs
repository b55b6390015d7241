//! [`Command`] for deleting a [`Note`].

use common::operations::{By, Delete, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{image, note, user, Note},
    infra::{database, storage, storage::Cleanup, Database, Storage},
    Service,
};

use super::{release_image, Command};

/// [`Command`] for deleting a [`Note`] of its owner.
///
/// The [`Note`] is only marked as deleted, while its image is released
/// right away.
#[derive(Clone, Copy, Debug)]
pub struct DeleteNote {
    /// ID of the [`Note`] to delete.
    pub id: note::Id,

    /// ID of the [`User`] performing the deletion.
    pub owner_id: user::Id,
}

/// Output of [`DeleteNote`] [`Command`].
#[derive(Clone, Copy, Debug)]
pub struct Output {
    /// [`Cleanup`] of the attached image.
    pub released: Cleanup,
}

impl<Db, Fs> Command<DeleteNote> for Service<Db, Fs>
where
    Db: Database<
            Select<By<Option<Note>, (note::Id, user::Id)>>,
            Ok = Option<Note>,
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Note, (note::Id, user::Id)>>,
            Ok = bool,
            Err = Traced<database::Error>,
        >,
    Fs: Storage<Delete<image::Key>, Ok = (), Err = Traced<storage::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteNote) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteNote { id, owner_id } = cmd;

        let note = self
            .database()
            .execute(Select(By::new((id, owner_id))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotFound(id))
            .map_err(tracerr::wrap!())?;

        let released = release_image(self.storage(), note.image).await;

        let deleted = self
            .database()
            .execute(Delete(By::new((id, owner_id))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !deleted {
            // Deleted concurrently in between.
            return Err(tracerr::new!(E::NotFound(id)));
        }

        Ok(Output { released })
    }
}

/// Error of [`DeleteNote`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Note`] doesn't exist or isn't owned by the [`User`].
    #[display("`Note(id: {_0})` not found")]
    #[from(ignore)]
    NotFound(#[error(not(source))] note::Id),
}
