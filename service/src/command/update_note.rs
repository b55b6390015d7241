//! [`Command`] for updating an existing [`Note`].

use common::{
    operations::{By, Delete, Insert, Select, Update},
    DateTime,
};
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

/// [`Command`] for updating an existing [`Note`] of its owner.
///
/// Absent fields keep their current values.
#[derive(Debug)]
pub struct UpdateNote {
    /// ID of the [`Note`] to update.
    pub id: note::Id,

    /// ID of the [`User`] performing the update.
    pub owner_id: user::Id,

    /// New [`note::Title`], if any.
    pub title: Option<note::Title>,

    /// New [`note::Content`], if any.
    ///
    /// Empty [`note::Content`] still replaces the current one.
    pub content: Option<note::Content>,

    /// New [`image::Upload`] replacing the current image, if any.
    pub image: Option<image::Upload>,
}

/// Output of [`UpdateNote`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Updated [`Note`].
    pub note: Note,

    /// [`Cleanup`] of the replaced image.
    pub released: Cleanup,
}

impl<Db, Fs> Command<UpdateNote> for Service<Db, Fs>
where
    Db: Database<
            Select<By<Option<Note>, (note::Id, user::Id)>>,
            Ok = Option<Note>,
            Err = Traced<database::Error>,
        > + Database<Update<Note>, Ok = bool, Err = Traced<database::Error>>,
    Fs: Storage<
            Insert<image::Upload>,
            Ok = image::Key,
            Err = Traced<storage::Error>,
        > + Storage<Delete<image::Key>, Ok = (), Err = Traced<storage::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateNote) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateNote {
            id,
            owner_id,
            title,
            content,
            image,
        } = cmd;

        let mut note = self
            .database()
            .execute(Select(By::new((id, owner_id))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::NotFound(id))
            .map_err(tracerr::wrap!())?;

        let (mut released, mut stored) = (Cleanup::Skipped, None);
        if let Some(upload) = image {
            released = release_image(self.storage(), note.image.take()).await;
            let key = self
                .storage()
                .execute(Insert(upload))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            note.image = Some(key.clone());
            stored = Some(key);
        }
        if let Some(title) = title {
            note.title = title;
        }
        if let Some(content) = content {
            note.content = content;
        }
        note.updated_at = DateTime::now().coerce();

        // The note may have been deleted since it was selected.
        let updated = self.database().execute(Update(note.clone())).await;
        if !matches!(updated, Ok(true)) {
            _ = release_image(self.storage(), stored).await;
        }
        updated
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .then_some(())
            .ok_or(E::NotFound(id))
            .map_err(tracerr::wrap!())?;

        Ok(Output { note, released })
    }
}

/// Error of [`UpdateNote`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Note`] doesn't exist or isn't owned by the [`User`].
    #[display("`Note(id: {_0})` not found")]
    #[from(ignore)]
    NotFound(#[error(not(source))] note::Id),

    /// [`Storage`] error.
    #[display("`Storage` operation failed: {_0}")]
    Storage(storage::Error),
}

#[cfg(test)]
mod tests {
    use common::operations::Update;

    use crate::{
        command::{CreateNote, DeleteNote},
        domain::{image, note, user, Note},
        infra::{database, storage, storage::Cleanup},
        tests::service,
        Service,
    };

    use super::{Command as _, ExecutionError, UpdateNote};

    type Svc = Service<database::Memory, storage::Memory>;

    fn png() -> image::Upload {
        image::Upload::new("image/png", Some("a.png"), vec![1, 2]).unwrap()
    }

    async fn create(svc: &Svc, owner_id: user::Id, image: bool) -> Note {
        svc.execute(CreateNote {
            owner_id,
            title: note::Title::new("Original").unwrap(),
            content: "original content".into(),
            image: image.then(png),
        })
        .await
        .unwrap()
    }

    fn update(note: &Note) -> UpdateNote {
        UpdateNote {
            id: note.id,
            owner_id: note.owner_id,
            title: None,
            content: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn content_only_update_keeps_title() {
        let svc = service();
        let note = create(&svc, user::Id::new(), false).await;

        let out = svc
            .execute(UpdateNote {
                content: Some(note::Content::default()),
                ..update(&note)
            })
            .await
            .unwrap();

        assert_eq!(out.note.title.to_string(), "Original");
        assert_eq!(out.note.content.to_string(), "");
        assert_eq!(out.released, Cleanup::Skipped);
        assert!(out.note.updated_at >= note.updated_at);
    }

    #[tokio::test]
    async fn replacing_image_releases_old_one() {
        let svc = service();
        let note = create(&svc, user::Id::new(), true).await;
        let old = note.image.clone().unwrap();

        let out = svc
            .execute(UpdateNote {
                image: Some(png()),
                ..update(&note)
            })
            .await
            .unwrap();

        let new = out.note.image.unwrap();
        assert_ne!(new, old);
        assert_eq!(out.released, Cleanup::Removed);
        assert!(!svc.storage().contains(&old).await);
        assert!(svc.storage().contains(&new).await);
    }

    #[tokio::test]
    async fn failed_release_does_not_fail_update() {
        let svc = service();
        let note = create(&svc, user::Id::new(), true).await;
        svc.storage().fail_deletions(true);

        let out = svc
            .execute(UpdateNote {
                image: Some(png()),
                ..update(&note)
            })
            .await
            .unwrap();

        assert_eq!(out.released, Cleanup::Failed);
        assert_eq!(svc.storage().count().await, 2);
    }

    #[tokio::test]
    async fn foreign_note_is_not_found() {
        let svc = service();
        let note = create(&svc, user::Id::new(), false).await;

        let err = svc
            .execute(UpdateNote {
                owner_id: user::Id::new(),
                title: note::Title::new("Stolen"),
                ..update(&note)
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), ExecutionError::NotFound(id) if *id == note.id),
            "unexpected error: {err}",
        );
        let stored = svc.database().raw_note(note.id).await.unwrap();
        assert_eq!(stored.title.to_string(), "Original");
    }

    #[tokio::test]
    async fn deleted_note_is_not_revived() {
        let svc = service();
        let note = create(&svc, user::Id::new(), false).await;
        _ = svc
            .execute(DeleteNote {
                id: note.id,
                owner_id: note.owner_id,
            })
            .await
            .unwrap();

        let revived = svc
            .database()
            .execute(Update(Note {
                owner_id: user::Id::new(),
                ..note.clone()
            }))
            .await
            .unwrap();

        assert!(!revived);
        let stored = svc.database().raw_note(note.id).await.unwrap();
        assert!(stored.deleted_at.is_some());
        assert_eq!(stored.owner_id, note.owner_id);
    }

    #[tokio::test]
    async fn foreign_owner_cannot_overwrite() {
        let svc = service();
        let note = create(&svc, user::Id::new(), false).await;

        let updated = svc
            .database()
            .execute(Update(Note {
                owner_id: user::Id::new(),
                title: note::Title::new("Stolen").unwrap(),
                ..note.clone()
            }))
            .await
            .unwrap();

        assert!(!updated);
        let stored = svc.database().raw_note(note.id).await.unwrap();
        assert_eq!(stored.title.to_string(), "Original");
        assert_eq!(stored.owner_id, note.owner_id);
    }
}
