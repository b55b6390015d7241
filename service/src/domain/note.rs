//! [`Note`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::{image, user};

/// Personal note of a [`User`].
#[derive(Clone, Debug)]
pub struct Note {
    /// ID of this [`Note`].
    pub id: Id,

    /// ID of the [`User`] owning this [`Note`].
    pub owner_id: user::Id,

    /// [`Title`] of this [`Note`].
    pub title: Title,

    /// [`Content`] of this [`Note`].
    pub content: Content,

    /// [`image::Key`] of the image attached to this [`Note`], if any.
    pub image: Option<image::Key>,

    /// [`DateTime`] when this [`Note`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Note`] was modified last time.
    pub updated_at: ModificationDateTime,

    /// [`DateTime`] when this [`Note`] was deleted, if it was.
    pub deleted_at: Option<DeletionDateTime>,
}

/// ID of a [`Note`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Title of a [`Note`].
#[derive(AsRef, Clone, Debug, Display, Eq, Into, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Title(String);

impl Title {
    /// Creates a new [`Title`] if the given `title` is not blank.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Option<Self> {
        let title = title.into();
        (!title.trim().is_empty()).then_some(Self(title))
    }
}

/// Text content of a [`Note`].
///
/// May be empty.
#[derive(AsRef, Clone, Debug, Default, Display, Eq, From, Into, PartialEq)]
#[as_ref(str, String)]
#[from(&str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Content(String);

/// [`DateTime`] when a [`Note`] was created.
pub type CreationDateTime = DateTimeOf<(Note, unit::Creation)>;

/// [`DateTime`] when a [`Note`] was modified.
pub type ModificationDateTime = DateTimeOf<(Note, unit::Modification)>;

/// [`DateTime`] when a [`Note`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Note, unit::Deletion)>;
