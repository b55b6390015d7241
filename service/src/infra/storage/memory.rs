//! In-memory [`Storage`] implementation.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use common::operations::{Delete, Insert};
use derive_more::{Display, Error as StdError};
use tokio::sync::Mutex;
use tracerr::Traced;

use crate::{
    domain::image,
    infra::{
        storage::{self, Locate, Origin},
        Storage,
    },
};

/// Public path the [`Memory`] storage pretends to serve images under.
pub const PUBLIC_PATH: &str = "/uploads";

/// In-memory [`Storage`] keeping image bytes in a shared [`HashMap`].
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored images.
    files: Arc<Mutex<HashMap<image::Key, Vec<u8>>>>,

    /// Indicator whether [`Delete`]s should fail.
    fail_deletions: Arc<AtomicBool>,
}

impl Memory {
    /// Creates a new empty [`Memory`] storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes all the following [`Delete`]s fail (or succeed again).
    pub fn fail_deletions(&self, fail: bool) {
        self.fail_deletions.store(fail, Ordering::Relaxed);
    }

    /// Checks whether an image is stored under the provided [`image::Key`].
    pub async fn contains(&self, key: &image::Key) -> bool {
        self.files.lock().await.contains_key(key)
    }

    /// Returns the number of stored images.
    pub async fn count(&self) -> usize {
        self.files.lock().await.len()
    }
}

/// [`Memory`] storage error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// Nothing is stored under the requested key.
    #[display("no image is stored under the requested key")]
    NotFound,

    /// Failure was requested via [`Memory::fail_deletions()`].
    #[display("deletion failure was requested")]
    Requested,
}

impl Locate for Memory {
    fn url_for(&self, key: &image::Key, origin: &Origin) -> image::Url {
        origin.join(&format!("{PUBLIC_PATH}/{key}")).into()
    }
}

impl Storage<Insert<image::Upload>> for Memory {
    type Ok = image::Key;
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Insert(upload): Insert<image::Upload>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = image::Key::generate(&upload.extension);
        drop(self.files.lock().await.insert(key.clone(), upload.data));
        Ok(key)
    }
}

impl Storage<Delete<image::Key>> for Memory {
    type Ok = ();
    type Err = Traced<storage::Error>;

    async fn execute(
        &self,
        Delete(key): Delete<image::Key>,
    ) -> Result<Self::Ok, Self::Err> {
        if self.fail_deletions.load(Ordering::Relaxed) {
            return Err(tracerr::new!(storage::Error::from(Error::Requested)));
        }
        self.files
            .lock()
            .await
            .remove(&key)
            .map(drop)
            .ok_or_else(|| tracerr::new!(storage::Error::from(Error::NotFound)))
    }
}
