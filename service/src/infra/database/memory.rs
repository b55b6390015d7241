//! In-memory [`Database`] implementation.

use std::{collections::HashMap, sync::Arc};

use common::operations::{By, Commit, Delete, Insert, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::Mutex;
use tracerr::Traced;

use uuid::Uuid;

use crate::{
    domain::{note, user, Note, User},
    infra::{
        database::{self, constraint},
        Database,
    },
};

/// In-memory [`Database`] keeping everything in a shared [`HashMap`]s.
///
/// [`Transact`] returns the same [`Memory`], so every write is visible
/// immediately and [`Commit`] is a no-op.
#[derive(Clone, Debug, Default)]
pub struct Memory(Arc<Mutex<State>>);

/// State of a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Note`]s, including the deleted ones.
    notes: HashMap<note::Id, Note>,
}

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored [`User`]s.
    pub async fn users_count(&self) -> usize {
        self.0.lock().await.users.len()
    }

    /// Returns a stored [`Note`] by its ID, even if it was deleted.
    pub async fn raw_note(&self, id: note::Id) -> Option<Note> {
        self.0.lock().await.notes.get(&id).cloned()
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the provided unique
    /// `constraint`.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        match self {
            Self::UniqueViolation(c) => *c == constraint,
        }
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.lock().await.users.get(&by.into_inner()).cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Email>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .0
            .lock()
            .await
            .users
            .values()
            .find(|u| &u.email == email)
            .cloned())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.0.lock().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(tracerr::new!(database::Error::from(
                Error::UniqueViolation(constraint::USER_EMAIL)
            )));
        }
        drop(state.users.insert(user.id, user));
        Ok(())
    }
}

impl Database<Select<By<Option<Note>, (note::Id, user::Id)>>>
    for Memory
{
    type Ok = Option<Note>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Note>, (note::Id, user::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, owner_id) = by.into_inner();
        Ok(self
            .0
            .lock()
            .await
            .notes
            .get(&id)
            .filter(|n| n.owner_id == owner_id && n.deleted_at.is_none())
            .cloned())
    }
}

impl Database<Select<By<Vec<Note>, user::Id>>> for Memory {
    type Ok = Vec<Note>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Note>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();
        let mut notes = self
            .0
            .lock()
            .await
            .notes
            .values()
            .filter(|n| n.owner_id == owner_id && n.deleted_at.is_none())
            .cloned()
            .collect::<Vec<_>>();
        notes.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| Uuid::from(b.id).cmp(&Uuid::from(a.id)))
        });
        Ok(notes)
    }
}

impl Database<Insert<Note>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(note): Insert<Note>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.0.lock().await.notes.insert(note.id, note));
        Ok(())
    }
}

impl Database<Update<Note>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(note): Update<Note>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.0.lock().await;
        let Some(current) = state.notes.get_mut(&note.id).filter(|n| {
            n.owner_id == note.owner_id && n.deleted_at.is_none()
        }) else {
            return Ok(false);
        };
        let Note {
            title,
            content,
            image,
            updated_at,
            ..
        } = note;
        current.title = title;
        current.content = content;
        current.image = image;
        current.updated_at = updated_at;
        Ok(true)
    }
}

impl Database<Delete<By<Note, (note::Id, user::Id)>>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Note, (note::Id, user::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, owner_id) = by.into_inner();
        let mut state = self.0.lock().await;
        let Some(note) = state
            .notes
            .get_mut(&id)
            .filter(|n| n.owner_id == owner_id && n.deleted_at.is_none())
        else {
            return Ok(false);
        };
        note.deleted_at = Some(note::DeletionDateTime::now());
        Ok(true)
    }
}

impl Database<Delete<By<Note, note::DeletionDateTime>>> for Memory {
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Note, note::DeletionDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();
        let mut state = self.0.lock().await;
        let before = state.notes.len();
        state
            .notes
            .retain(|_, n| n.deleted_at.map_or(true, |at| at > deadline));
        Ok(u64::try_from(before - state.notes.len()).unwrap_or(u64::MAX))
    }
}
