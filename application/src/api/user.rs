//! [`User`]-related definitions.

use serde::Serialize;
use service::domain::{self, user};

/// Public view of a [`domain::User`].
///
/// Never carries the password hash.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// ID of this [`User`].
    pub id: user::Id,

    /// Email of this [`User`].
    pub email: String,

    /// Display name of this [`User`].
    pub name: String,

    /// [`DateTime`] when this [`User`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: user::CreationDateTime,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        let domain::User {
            id,
            name,
            email,
            password_hash: _,
            created_at,
        } = user;

        Self {
            id,
            email: email.into(),
            name: name.into(),
            created_at,
        }
    }
}
