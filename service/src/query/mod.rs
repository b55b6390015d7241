//! [`Query`] definition.

pub mod note;
pub mod notes;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`] as is.
///
/// Ownership scoping, if any, is part of the `By` criteria.
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, Fs, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db, Fs>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        command::CreateNote,
        domain::{note, user},
        tests::service,
    };

    use super::{note as single, notes, Query as _};

    #[tokio::test]
    async fn notes_are_scoped_by_owner() {
        let svc = service();
        let (alice, bob) = (user::Id::new(), user::Id::new());
        let mut ids = vec![];
        for (owner_id, title) in [(alice, "A1"), (alice, "A2"), (bob, "B1")] {
            let note = svc
                .execute(CreateNote {
                    owner_id,
                    title: note::Title::new(title).unwrap(),
                    content: note::Content::default(),
                    image: None,
                })
                .await
                .unwrap();
            ids.push(note.id);
        }

        let listed = svc.execute(notes::ByOwner::by(alice)).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|n| n.owner_id == alice));

        assert!(svc
            .execute(single::ById::by((ids[2], bob)))
            .await
            .unwrap()
            .is_some());
        assert!(svc
            .execute(single::ById::by((ids[2], alice)))
            .await
            .unwrap()
            .is_none());
    }
}
