//! [`PurgeDeletedNotes`] [`Task`].

use std::{error::Error, time};

use common::operations::{By, Delete, Perform, Start};
use derive_more::{Display, Error as StdError};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{note, Note},
    infra::{database, Database},
    Service,
};

use super::Task;

/// Configuration for [`PurgeDeletedNotes`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between purges.
    pub interval: time::Duration,

    /// Duration a deleted [`Note`] is retained for before being purged.
    pub retention: time::Duration,
}

/// [`Task`] for permanently removing [`Note`]s deleted long enough ago.
#[derive(Clone, Copy, Debug)]
pub struct PurgeDeletedNotes<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db, Fs> Task<Start<By<PurgeDeletedNotes<Self>, Config>>>
    for Service<Db, Fs>
where
    PurgeDeletedNotes<Self>: Task<Perform<()>, Ok = u64, Err: Error>,
    Self: Clone,
{
    type Ok = ();
    type Err = ZeroIntervalError;

    async fn execute(
        &self,
        Start(by): Start<By<PurgeDeletedNotes<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let task = PurgeDeletedNotes {
            config: by.into_inner(),
            service: self.clone(),
        };
        if task.config.interval.is_zero() {
            return Err(ZeroIntervalError);
        }

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::info!("purged {n} deleted `Note`s"),
                Err(e) => log::error!("`task::PurgeDeletedNotes` failed: {e}"),
            }
        }
    }
}

impl<Db, Fs> Task<Perform<()>> for PurgeDeletedNotes<Service<Db, Fs>>
where
    Db: Database<
        Delete<By<Note, note::DeletionDateTime>>,
        Ok = u64,
        Err = Traced<database::Error>,
    >,
{
    type Ok = u64;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        // Nothing can be deleted before the earliest representable moment.
        let Some(deadline) =
            note::DeletionDateTime::now().checked_sub(self.config.retention)
        else {
            return Ok(0);
        };
        self.service
            .database()
            .execute(Delete(By::new(deadline)))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of starting [`PurgeDeletedNotes`] with a zero interval.
#[derive(Clone, Copy, Debug, Display, StdError)]
#[display("`PurgeDeletedNotes` interval must not be zero")]
pub struct ZeroIntervalError;

/// Error of [`PurgeDeletedNotes`] execution.
pub type ExecutionError = Traced<database::Error>;
