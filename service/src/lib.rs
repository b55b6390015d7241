//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod task;

use std::time::Duration;

use common::{
    operations::{By, Start},
    DateTime,
};
use derive_more::{Debug, Display, Error};

#[cfg(doc)]
use infra::{Database, Storage};

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Lifetime of a newly created [`domain::user::Session`].
    pub session_ttl: Duration,

    /// [`task::PurgeDeletedNotes`] configuration.
    pub purge_deleted_notes: task::purge_deleted_notes::Config,
}

impl Config {
    /// Creates a new [`Config`] signing [`domain::user::Session`]s with the
    /// provided HMAC `secret`.
    ///
    /// # Errors
    ///
    /// - If the provided `secret` is empty.
    /// - If the [`task::PurgeDeletedNotes`] interval is zero.
    /// - If the `session_ttl` or the retention of deleted [`domain::Note`]s
    ///   doesn't fit into the supported date range.
    pub fn new(
        secret: &[u8],
        session_ttl: Duration,
        purge_deleted_notes: task::purge_deleted_notes::Config,
    ) -> Result<Self, ConfigError> {
        use ConfigError as E;

        let now = DateTime::now();
        if secret.is_empty() {
            return Err(E::EmptySecret);
        }
        if purge_deleted_notes.interval.is_zero() {
            return Err(E::ZeroPurgeInterval);
        }
        if now.checked_add(session_ttl).is_none() {
            return Err(E::SessionTtlOutOfRange);
        }
        if now.checked_sub(purge_deleted_notes.retention).is_none() {
            return Err(E::RetentionOutOfRange);
        }
        Ok(Self {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            session_ttl,
            purge_deleted_notes,
        })
    }
}

/// Error of creating an invalid [`Config`].
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ConfigError {
    /// JWT secret is empty.
    #[display("JWT secret must not be empty")]
    EmptySecret,

    /// [`task::PurgeDeletedNotes`] interval is zero.
    #[display("`PurgeDeletedNotes` interval must not be zero")]
    ZeroPurgeInterval,

    /// Session TTL overflows the supported date range.
    #[display("session TTL is too large")]
    SessionTtlOutOfRange,

    /// Retention of deleted [`domain::Note`]s overflows the supported date
    /// range.
    #[display("retention of deleted notes is too large")]
    RetentionOutOfRange,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db, Fs> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Storage`] of this [`Service`].
    storage: Fs,
}

impl<Db, Fs> Service<Db, Fs> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(
        config: Config,
        database: Db,
        storage: Fs,
    ) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::PurgeDeletedNotes<Self>,
                        task::purge_deleted_notes::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let this = Service {
            config,
            database,
            storage,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("PurgeDeletedNotes", async move {
            svc.execute(Start(By::new(svc.config().purge_deleted_notes)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Storage`] of this [`Service`].
    #[must_use]
    pub fn storage(&self) -> &Fs {
        &self.storage
    }
}

#[cfg(test)]
mod tests {
    //! Shared fixtures of the [`Service`](super::Service) tests.

    use std::time::Duration;

    use crate::{
        infra::{database, storage},
        task, Config, ConfigError, Service,
    };

    /// Secret signing [`Session`]s in tests.
    ///
    /// [`Session`]: crate::domain::user::Session
    pub(crate) const SECRET: &[u8] = b"test secret";

    /// Returns the [`Config`] used in tests.
    pub(crate) fn config() -> Config {
        Config::new(
            SECRET,
            Duration::from_secs(7 * 24 * 60 * 60),
            task::purge_deleted_notes::Config {
                interval: Duration::from_secs(60 * 60),
                retention: Duration::from_secs(30 * 24 * 60 * 60),
            },
        )
        .unwrap()
    }

    /// Returns a [`Service`] on top of empty in-memory infrastructure.
    pub(crate) fn service() -> Service<database::Memory, storage::Memory> {
        Service {
            config: config(),
            database: database::Memory::new(),
            storage: storage::Memory::new(),
        }
    }

    #[test]
    fn rejects_empty_secret() {
        let purge = config().purge_deleted_notes;

        assert!(matches!(
            Config::new(b"", Duration::from_secs(1), purge),
            Err(ConfigError::EmptySecret),
        ));
    }

    #[test]
    fn rejects_unusable_durations() {
        let purge = config().purge_deleted_notes;
        let hour = Duration::from_secs(60 * 60);

        assert!(matches!(
            Config::new(
                SECRET,
                hour,
                task::purge_deleted_notes::Config {
                    interval: Duration::ZERO,
                    ..purge
                },
            ),
            Err(ConfigError::ZeroPurgeInterval),
        ));
        assert!(matches!(
            Config::new(SECRET, Duration::MAX, purge),
            Err(ConfigError::SessionTtlOutOfRange),
        ));
        assert!(matches!(
            Config::new(
                SECRET,
                hour,
                task::purge_deleted_notes::Config {
                    retention: Duration::MAX,
                    ..purge
                },
            ),
            Err(ConfigError::RetentionOutOfRange),
        ));
    }
}
