//! Domain definitions.

pub mod image;
pub mod note;
pub mod user;

pub use self::{note::Note, user::User};
