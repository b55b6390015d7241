//! [`Command`] for creating a new [`Note`].

use common::{
    operations::{Delete, Insert},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::{image, note, user, Note},
    infra::{database, storage, Database, Storage},
    Service,
};

use super::{release_image, Command};

/// [`Command`] for creating a new [`Note`].
#[derive(Debug)]
pub struct CreateNote {
    /// ID of the [`User`] owning the new [`Note`].
    pub owner_id: user::Id,

    /// [`note::Title`] of the new [`Note`].
    pub title: note::Title,

    /// [`note::Content`] of the new [`Note`].
    pub content: note::Content,

    /// [`image::Upload`] to attach to the new [`Note`], if any.
    pub image: Option<image::Upload>,
}

impl<Db, Fs> Command<CreateNote> for Service<Db, Fs>
where
    Db: Database<Insert<Note>, Err = Traced<database::Error>>,
    Fs: Storage<
            Insert<image::Upload>,
            Ok = image::Key,
            Err = Traced<storage::Error>,
        > + Storage<Delete<image::Key>, Ok = (), Err = Traced<storage::Error>>,
{
    type Ok = Note;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateNote) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateNote {
            owner_id,
            title,
            content,
            image,
        } = cmd;

        let image = match image {
            Some(upload) => Some(
                self.storage()
                    .execute(Insert(upload))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?,
            ),
            None => None,
        };

        let now = DateTime::now();
        let note = Note {
            id: note::Id::new(),
            owner_id,
            title,
            content,
            image,
            created_at: now.coerce(),
            updated_at: now.coerce(),
            deleted_at: None,
        };

        let inserted = self.database().execute(Insert(note.clone())).await;
        if inserted.is_err() {
            _ = release_image(self.storage(), note.image.clone()).await;
        }
        inserted
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(note)
    }
}

/// Error of [`CreateNote`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Storage`] error.
    #[display("`Storage` operation failed: {_0}")]
    Storage(storage::Error),
}

#[cfg(test)]
mod tests {
    use crate::{
        domain::{image, note, user},
        tests::service,
    };

    use super::{Command as _, CreateNote};

    #[tokio::test]
    async fn creates_note_without_image() {
        let svc = service();
        let owner_id = user::Id::new();

        let note = svc
            .execute(CreateNote {
                owner_id,
                title: note::Title::new("Groceries").unwrap(),
                content: note::Content::default(),
                image: None,
            })
            .await
            .unwrap();

        assert_eq!(note.owner_id, owner_id);
        assert_eq!(note.title.to_string(), "Groceries");
        assert_eq!(note.content.to_string(), "");
        assert!(note.image.is_none());
        assert!(svc.database().raw_note(note.id).await.is_some());
    }

    #[tokio::test]
    async fn stores_attached_image() {
        let svc = service();

        let note = svc
            .execute(CreateNote {
                owner_id: user::Id::new(),
                title: note::Title::new("Cat").unwrap(),
                content: "Look at it".into(),
                image: Some(
                    image::Upload::new("image/png", Some("cat.png"), vec![7])
                        .unwrap(),
                ),
            })
            .await
            .unwrap();

        let key = note.image.unwrap();
        assert!(key.to_string().ends_with(".png"));
        assert!(svc.storage().contains(&key).await);
    }
}
