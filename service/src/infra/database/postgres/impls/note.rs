//! [`Note`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{note, user, Note},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `notes` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, owner_id, title, content, image_key, \
    created_at, updated_at, deleted_at";

/// Builds a [`Note`] out of the provided `notes` table [`Row`].
fn from_row(row: &Row) -> Note {
    Note {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        content: row.get("content"),
        image: row.get("image_key"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<Note>, (note::Id, user::Id)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Note>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Note>, (note::Id, user::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, owner_id) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM notes \
             WHERE id = $1::UUID \
                   AND owner_id = $2::UUID \
                   AND deleted_at IS NULL",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id, &owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Note>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Note>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Note>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let owner_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM notes \
             WHERE owner_id = $1::UUID \
                   AND deleted_at IS NULL \
             ORDER BY created_at DESC, id DESC",
        );
        Ok(self
            .query(sql.as_str(), &[&owner_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Note>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(note): Insert<Note>,
    ) -> Result<Self::Ok, Self::Err> {
        let Note {
            id,
            owner_id,
            title,
            content,
            image,
            created_at,
            updated_at,
            deleted_at,
        } = note;

        const SQL: &str = "\
            INSERT INTO notes (\
                id, owner_id, title, content, image_key, \
                created_at, updated_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::TEXT, $5::VARCHAR, \
                $6::TIMESTAMPTZ, $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &owner_id,
                &title,
                &content,
                &image,
                &created_at,
                &updated_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Note>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(note): Update<Note>,
    ) -> Result<Self::Ok, Self::Err> {
        let Note {
            id,
            owner_id,
            title,
            content,
            image,
            updated_at,
            ..
        } = note;

        // Ownership is part of the filter.
        const SQL: &str = "\
            UPDATE notes \
            SET title = $3::VARCHAR, \
                content = $4::TEXT, \
                image_key = $5::VARCHAR, \
                updated_at = $6::TIMESTAMPTZ \
            WHERE id = $1::UUID \
                  AND owner_id = $2::UUID \
                  AND deleted_at IS NULL";
        Ok(self
            .exec(
                SQL,
                &[&id, &owner_id, &title, &content, &image, &updated_at],
            )
            .await
            .map_err(tracerr::wrap!())?
            > 0)
    }
}

impl<C> Database<Delete<By<Note, (note::Id, user::Id)>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Note, (note::Id, user::Id)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, owner_id) = by.into_inner();

        const SQL: &str = "\
            UPDATE notes \
            SET deleted_at = $3::TIMESTAMPTZ \
            WHERE id = $1::UUID \
                  AND owner_id = $2::UUID \
                  AND deleted_at IS NULL";
        let deleted_at = note::DeletionDateTime::now();
        Ok(self
            .exec(SQL, &[&id, &owner_id, &deleted_at])
            .await
            .map_err(tracerr::wrap!())?
            > 0)
    }
}

impl<C> Database<Delete<By<Note, note::DeletionDateTime>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Note, note::DeletionDateTime>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deadline = by.into_inner();

        const SQL: &str = "\
            DELETE FROM notes \
            WHERE deleted_at IS NOT NULL \
                  AND deleted_at <= $1::TIMESTAMPTZ";
        self.exec(SQL, &[&deadline])
            .await
            .map_err(tracerr::wrap!())
    }
}
