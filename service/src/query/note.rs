//! [`Query`] collection related to a single [`Note`].

use common::operations::By;

use crate::domain::{note, user, Note};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries a live [`Note`] by its [`note::Id`], visible only to its owner
/// [`user::Id`].
pub type ById = DatabaseQuery<By<Option<Note>, (note::Id, user::Id)>>;
