//! [`Query`] collection related to multiple [`Note`]s.

use common::operations::By;

use crate::domain::{user, Note};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries all the live [`Note`]s of the owner [`user::Id`], the newest
/// first.
pub type ByOwner = DatabaseQuery<By<Vec<Note>, user::Id>>;
