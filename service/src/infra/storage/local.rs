//! [`Local`] filesystem [`Storage`] implementation.

use std::{io, path::PathBuf};

use common::operations::{Delete, Insert};
use tracerr::Traced;

use crate::{
    domain::image,
    infra::{
        storage::{self, Locate, Origin},
        Storage,
    },
};

/// [`Storage`] keeping images as plain files in a local directory, served
/// to clients under a public path.
#[derive(Clone, Debug)]
pub struct Local {
    /// Directory the images are stored in.
    root: PathBuf,

    /// Absolute URL path the `root` directory is served under.
    public_path: String,
}

impl Local {
    /// Creates a new [`Local`] storage in the provided `root` directory,
    /// served under the provided `public_path`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_path: &str) -> Self {
        let public_path = public_path.trim_end_matches('/');
        Self {
            root: root.into(),
            public_path: if public_path.starts_with('/') {
                public_path.to_owned()
            } else {
                format!("/{public_path}")
            },
        }
    }

    /// Returns the directory this [`Local`] storage keeps its images in.
    #[must_use]
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Returns the absolute URL path this [`Local`] storage is served under.
    #[must_use]
    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    /// Returns the path of the file stored under the provided
    /// [`image::Key`].
    ///
    /// # Errors
    ///
    /// If the [`image::Key`] isn't a plain file name.
    fn path_of(&self, key: &image::Key) -> io::Result<PathBuf> {
        let name: &str = key.as_ref();
        if name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
        {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("`{name}` is not a plain file name"),
            ));
        }
        Ok(self.root.join(name))
    }
}

impl Locate for Local {
    fn url_for(&self, key: &image::Key, origin: &Origin) -> image::Url {
        origin.join(&format!("{}/{key}", self.public_path)).into()
    }
}

impl Storage<Insert<image::Upload>> for Local {
    type Ok = image::Key;
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Insert(upload): Insert<image::Upload>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = image::Key::generate(&upload.extension);
        let path = self
            .path_of(&key)
            .map_err(tracerr::from_and_wrap!(=> storage::Error))?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(tracerr::from_and_wrap!(=> storage::Error))?;
        tokio::fs::write(&path, &upload.data)
            .await
            .map_err(tracerr::from_and_wrap!(=> storage::Error))?;

        Ok(key)
    }
}

impl Storage<Delete<image::Key>> for Local {
    type Ok = ();
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Delete(key): Delete<image::Key>,
    ) -> Result<Self::Ok, Self::Err> {
        let path = self
            .path_of(&key)
            .map_err(tracerr::from_and_wrap!(=> storage::Error))?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(tracerr::from_and_wrap!(=> storage::Error))
    }
}
