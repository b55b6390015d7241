//! Background [`Task`]s definitions.

mod background;
pub mod purge_deleted_notes;

pub use common::Handler as Task;

pub use self::{
    background::{Background, Failure},
    purge_deleted_notes::PurgeDeletedNotes,
};
