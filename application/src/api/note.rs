//! [`Note`]-related endpoints.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path},
    Extension,
};
use serde::Serialize;
use service::{
    command::{self, Command as _},
    domain::{self, image, note, user},
    infra::storage::{self, Locate},
    query,
};

use crate::{api, define_error, AsError, Error, Origin, Service, Session};

/// [`domain::Note`] as seen by its owner.
#[derive(Clone, Debug, Serialize)]
pub struct Note {
    /// ID of this [`Note`].
    pub id: note::Id,

    /// Title of this [`Note`].
    pub title: String,

    /// Content of this [`Note`].
    pub content: String,

    /// URL of the image attached to this [`Note`], if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<image::Url>,

    /// ID of the user owning this [`Note`].
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Note`] was created.
    ///
    /// [`DateTime`]: common::DateTime
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: note::CreationDateTime,

    /// [`DateTime`] when this [`Note`] was modified last time.
    ///
    /// [`DateTime`]: common::DateTime
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub updated_at: note::ModificationDateTime,
}

impl Note {
    /// Renders the provided [`domain::Note`] for a client reaching the
    /// server at the provided [`storage::Origin`].
    #[must_use]
    pub fn new(
        note: domain::Note,
        storage: &impl Locate,
        origin: &storage::Origin,
    ) -> Self {
        let domain::Note {
            id,
            owner_id,
            title,
            content,
            image,
            created_at,
            updated_at,
            deleted_at: _,
        } = note;

        Self {
            id,
            title: title.into(),
            content: content.into(),
            image_url: image.map(|key| storage.url_for(&key, origin)),
            user_id: owner_id,
            created_at,
            updated_at,
        }
    }
}

/// List of [`Note`]s.
#[derive(Clone, Debug, Serialize)]
pub struct Notes {
    /// [`Note`]s, the newest first.
    pub notes: Vec<Note>,
}

/// Single [`Note`].
#[derive(Clone, Debug, Serialize)]
pub struct Single {
    /// The [`Note`] itself.
    pub note: Note,
}

/// Fields of a [`Note`] submitted as a `multipart/form-data` body.
///
/// Only the first occurrence of every field is taken.
#[derive(Debug, Default)]
struct Form {
    /// `title` field.
    title: Option<String>,

    /// `content` field.
    content: Option<String>,

    /// `image` file field.
    image: Option<image::Upload>,
}

impl Form {
    /// Reads a [`Form`] out of the provided [`Multipart`] body.
    ///
    /// # Errors
    ///
    /// - If the body is malformed.
    /// - If the image has an unsupported content type.
    async fn read(
        multipart: Result<Multipart, MultipartRejection>,
    ) -> Result<Self, Error> {
        let mut multipart = multipart.map_err(AsError::into_error)?;
        let mut form = Self::default();

        while let Some(field) =
            multipart.next_field().await.map_err(AsError::into_error)?
        {
            let name = field.name().map(ToOwned::to_owned);
            match name.as_deref() {
                Some("title") if form.title.is_none() => {
                    form.title =
                        Some(field.text().await.map_err(AsError::into_error)?);
                }
                Some("content") if form.content.is_none() => {
                    form.content =
                        Some(field.text().await.map_err(AsError::into_error)?);
                }
                Some("image") if form.image.is_none() => {
                    let file_name = field.file_name().map(ToOwned::to_owned);
                    let content_type = field
                        .content_type()
                        .map(ToOwned::to_owned)
                        .unwrap_or_default();
                    let data =
                        field.bytes().await.map_err(AsError::into_error)?;

                    // Browsers submit an empty part for an untouched file
                    // input.
                    if data.is_empty()
                        && file_name.as_deref().map_or(true, str::is_empty)
                    {
                        continue;
                    }

                    form.image = Some(
                        image::Upload::new(
                            &content_type,
                            file_name.as_deref(),
                            data.to_vec(),
                        )
                        .map_err(|_| NoteError::UnsupportedImage)?,
                    );
                }
                Some(_) | None => {}
            }
        }

        Ok(form)
    }
}

/// Parses the provided path `id` into a [`note::Id`].
///
/// Unparsable IDs cannot belong to any [`Note`], so they're reported the
/// same way as missing ones.
fn parse_id(id: &str) -> Result<note::Id, Error> {
    id.parse().map_err(|_| NoteError::NotFound.into())
}

/// Lists all the [`Note`]s of the acting user.
///
/// # Errors
///
/// - `400`/`401` if the session token is missing or invalid.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "list_notes", user.id = %session.user_id),
)]
pub async fn list(
    Extension(service): Extension<Service>,
    session: Session,
    Origin(origin): Origin,
) -> Result<api::Reply<Notes>, Error> {
    let notes = service
        .execute(query::notes::ByOwner::by(session.user_id))
        .await
        .map_err(AsError::into_error)?;

    Ok(api::Reply::ok(Notes {
        notes: notes
            .into_iter()
            .map(|n| Note::new(n, service.storage(), &origin))
            .collect(),
    }))
}

/// Returns a single [`Note`] of the acting user.
///
/// # Errors
///
/// - `400`/`401` if the session token is missing or invalid;
/// - `404` if the [`Note`] doesn't exist or belongs to someone else.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "get_note", user.id = %session.user_id, note.id = %id),
)]
pub async fn get(
    Extension(service): Extension<Service>,
    session: Session,
    Origin(origin): Origin,
    Path(id): Path<String>,
) -> Result<api::Reply<Single>, Error> {
    let note_id = parse_id(&id)?;

    let note = service
        .execute(query::note::ById::by((note_id, session.user_id)))
        .await
        .map_err(AsError::into_error)?
        .ok_or(NoteError::NotFound)?;

    Ok(api::Reply::ok(Single {
        note: Note::new(note, service.storage(), &origin),
    }))
}

/// Creates a new [`Note`] owned by the acting user.
///
/// # Errors
///
/// - `400` if the title is blank, the image type is unsupported, or the
///   body is malformed;
/// - `400`/`401` if the session token is missing or invalid.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "create_note", user.id = %session.user_id),
)]
pub async fn create(
    Extension(service): Extension<Service>,
    session: Session,
    Origin(origin): Origin,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<api::Reply<Single>, Error> {
    let Form {
        title,
        content,
        image,
    } = Form::read(multipart).await?;

    let title = title
        .and_then(note::Title::new)
        .ok_or(NoteError::TitleRequired)?;

    let note = service
        .execute(command::CreateNote {
            owner_id: session.user_id,
            title,
            content: content.unwrap_or_default().into(),
            image,
        })
        .await
        .map_err(AsError::into_error)?;
    tracing::info!(note.id = %note.id, "created a note");

    Ok(api::Reply::created(Single {
        note: Note::new(note, service.storage(), &origin),
    })
    .with_message("Note created successfully"))
}

/// Updates a [`Note`] of the acting user.
///
/// Blank or absent title keeps the current one, while a present content
/// always replaces it.
///
/// # Errors
///
/// - `400` if the image type is unsupported or the body is malformed;
/// - `400`/`401` if the session token is missing or invalid;
/// - `404` if the [`Note`] doesn't exist or belongs to someone else.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "update_note", user.id = %session.user_id, note.id = %id),
)]
pub async fn update(
    Extension(service): Extension<Service>,
    session: Session,
    Origin(origin): Origin,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<api::Reply<Single>, Error> {
    let note_id = parse_id(&id)?;
    let Form {
        title,
        content,
        image,
    } = Form::read(multipart).await?;

    let output = service
        .execute(command::UpdateNote {
            id: note_id,
            owner_id: session.user_id,
            title: title.and_then(note::Title::new),
            content: content.map(Into::into),
            image,
        })
        .await
        .map_err(AsError::into_error)?;
    tracing::debug!(released = %output.released, "updated a note");

    Ok(api::Reply::ok(Single {
        note: Note::new(output.note, service.storage(), &origin),
    })
    .with_message("Note updated successfully"))
}

/// Deletes a [`Note`] of the acting user.
///
/// # Errors
///
/// - `400`/`401` if the session token is missing or invalid;
/// - `404` if the [`Note`] doesn't exist or belongs to someone else.
#[tracing::instrument(
    skip_all,
    fields(http.handler = "delete_note", user.id = %session.user_id, note.id = %id),
)]
pub async fn delete(
    Extension(service): Extension<Service>,
    session: Session,
    Path(id): Path<String>,
) -> Result<api::Reply<()>, Error> {
    let note_id = parse_id(&id)?;

    let output = service
        .execute(command::DeleteNote {
            id: note_id,
            owner_id: session.user_id,
        })
        .await
        .map_err(AsError::into_error)?;
    tracing::debug!(released = %output.released, "deleted a note");

    Ok(api::Reply::message("Note deleted successfully"))
}

define_error! {
    enum NoteError {
        #[code = "NOTE_NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Note not found"]
        NotFound,

        #[code = "TITLE_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "Title is required"]
        TitleRequired,

        #[code = "UNSUPPORTED_IMAGE_TYPE"]
        #[status = BAD_REQUEST]
        #[message = "Invalid image type. Only JPEG, PNG, and GIF are allowed"]
        UnsupportedImage,
    }
}

impl AsError for command::create_note::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Storage(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::update_note::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotFound(_) => Some(NoteError::NotFound.into()),
            Self::Storage(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::delete_note::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotFound(_) => Some(NoteError::NotFound.into()),
        }
    }
}

impl AsError for MultipartRejection {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::bad_request(&self.body_text()))
    }
}
