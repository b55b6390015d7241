//! File [`Storage`] of image attachments.

pub mod local;
#[cfg(any(test, feature = "memory"))]
pub mod memory;

use std::io;

use derive_more::{Display, Error as StdError, From};

use crate::domain::image;

#[cfg(any(test, feature = "memory"))]
pub use self::memory::Memory;
pub use self::local::Local;

/// Storage operation.
pub use common::Handler as Storage;

/// Locating of stored images for clients.
pub trait Locate {
    /// Returns the public [`image::Url`] of the image stored under the
    /// provided [`image::Key`], as seen from the provided [`Origin`].
    fn url_for(&self, key: &image::Key, origin: &Origin) -> image::Url;
}

/// Origin a client reaches the server at.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Origin {
    /// URL scheme (`http` or `https`).
    pub scheme: String,

    /// Host, with an optional port.
    pub host: String,
}

impl Origin {
    /// Renders this [`Origin`] together with the provided absolute `path`
    /// into a URL.
    #[must_use]
    pub fn join(&self, path: &str) -> String {
        format!("{}://{}{path}", self.scheme, self.host)
    }
}

/// Outcome of a best-effort release of a stored image.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Cleanup {
    /// There was nothing to release.
    #[display("skipped")]
    Skipped,

    /// The image was removed from the [`Storage`].
    #[display("removed")]
    Removed,

    /// Removing the image failed, so it's left orphaned in the [`Storage`].
    #[display("failed")]
    Failed,
}

/// [`Storage`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// [`Local`] storage I/O error.
    #[display("`Local` storage I/O error: {_0}")]
    Local(io::Error),

    #[cfg(any(test, feature = "memory"))]
    /// [`Memory`] storage error.
    #[display("`Memory` storage error: {_0}")]
    Memory(memory::Error),
}
