//! Image attachment definitions.

use std::{path::Path, str::FromStr};

use derive_more::{AsRef, Debug, Display, Error, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::Serialize;
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Note;

/// Image uploaded by a client to be attached to a [`Note`].
#[derive(Clone, Debug)]
pub struct Upload {
    /// [`ContentType`] declared for this [`Upload`].
    pub content_type: ContentType,

    /// [`Extension`] to store this [`Upload`] with.
    pub extension: Extension,

    /// Raw bytes of this [`Upload`].
    #[debug(skip)]
    pub data: Vec<u8>,
}

impl Upload {
    /// Creates a new [`Upload`] out of the declared `content_type` and the
    /// original `file_name` (if any).
    ///
    /// The `file_name` is only used for its extension.
    ///
    /// # Errors
    ///
    /// If the `content_type` isn't a supported [`ContentType`].
    pub fn new(
        content_type: &str,
        file_name: Option<&str>,
        data: Vec<u8>,
    ) -> Result<Self, UnsupportedContentType> {
        let content_type = content_type.parse::<ContentType>()?;
        let extension = file_name
            .and_then(Extension::from_file_name)
            .unwrap_or_else(|| content_type.extension());
        Ok(Self {
            content_type,
            extension,
            data,
        })
    }
}

/// Supported content type of an image.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum ContentType {
    /// `image/jpeg` (or the non-standard `image/jpg`).
    #[display("image/jpeg")]
    Jpeg,

    /// `image/png`.
    #[display("image/png")]
    Png,

    /// `image/gif`.
    #[display("image/gif")]
    Gif,
}

impl ContentType {
    /// Returns the default [`Extension`] of this [`ContentType`].
    #[must_use]
    pub fn extension(self) -> Extension {
        Extension(
            match self {
                Self::Jpeg => "jpg",
                Self::Png => "png",
                Self::Gif => "gif",
            }
            .to_owned(),
        )
    }
}

impl FromStr for ContentType {
    type Err = UnsupportedContentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or_default().trim();
        match essence.to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "image/png" => Ok(Self::Png),
            "image/gif" => Ok(Self::Gif),
            _ => Err(UnsupportedContentType(s.to_owned())),
        }
    }
}

/// Content type not being one of the supported [`ContentType`]s.
#[derive(Clone, Debug, Display, Error)]
#[display("unsupported image content type: `{_0}`")]
pub struct UnsupportedContentType(#[error(not(source))] pub String);

/// File extension of a stored image, without a leading dot.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
pub struct Extension(String);

impl Extension {
    /// Extracts an [`Extension`] from the provided `file_name`.
    ///
    /// [`None`] is returned if the `file_name` has no extension, or it isn't
    /// a short ASCII alphanumeric one.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name).extension()?.to_str()?;
        (!ext.is_empty()
            && ext.len() <= 10
            && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| Self(ext.to_ascii_lowercase()))
    }
}

/// Storage key of an image, being a plain file name.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Key(String);

impl Key {
    /// Generates a new unique [`Key`] having the provided [`Extension`].
    #[must_use]
    pub fn generate(extension: &Extension) -> Self {
        Self(format!("{}.{extension}", Uuid::new_v4()))
    }
}

/// Public URL of a stored image.
#[derive(AsRef, Clone, Debug, Display, Eq, From, Into, PartialEq, Serialize)]
#[as_ref(str)]
pub struct Url(String);

#[cfg(test)]
mod tests {
    use super::{ContentType, Extension, Key, Upload};

    #[test]
    fn content_type_is_case_insensitive() {
        assert_eq!("image/JPEG".parse::<ContentType>().unwrap(), ContentType::Jpeg);
        assert_eq!("image/jpg".parse::<ContentType>().unwrap(), ContentType::Jpeg);
        assert_eq!("IMAGE/PNG".parse::<ContentType>().unwrap(), ContentType::Png);
        assert_eq!("image/gif".parse::<ContentType>().unwrap(), ContentType::Gif);
        assert_eq!(
            "image/png; charset=binary".parse::<ContentType>().unwrap(),
            ContentType::Png,
        );
    }

    #[test]
    fn rejects_unsupported_content_types() {
        for ct in ["text/plain", "image/svg+xml", "image/webp", "", "png"] {
            assert!(ct.parse::<ContentType>().is_err(), "accepted `{ct}`");
        }
        assert!(Upload::new("text/plain", Some("a.png"), vec![1]).is_err());
    }

    #[test]
    fn extension_comes_from_file_name_only_if_sane() {
        let ext = |name| Extension::from_file_name(name).map(|e| e.to_string());

        assert_eq!(ext("cat.PNG").as_deref(), Some("png"));
        assert_eq!(ext("archive.tar.gz").as_deref(), Some("gz"));
        assert_eq!(ext("no_extension"), None);
        assert_eq!(ext("../../etc/passwd"), None);
        assert_eq!(ext("evil.p/hp"), None);
        assert_eq!(ext("weird.ph p"), None);
    }

    #[test]
    fn upload_falls_back_to_content_type_extension() {
        let upload = Upload::new("image/gif", Some("../secret"), vec![]).unwrap();
        assert_eq!(upload.extension.to_string(), "gif");

        let upload = Upload::new("image/jpeg", None, vec![]).unwrap();
        assert_eq!(upload.extension.to_string(), "jpg");

        let upload = Upload::new("image/png", Some("photo.jpeg"), vec![]).unwrap();
        assert_eq!(upload.extension.to_string(), "jpeg");
    }

    #[test]
    fn generated_keys_are_unique_file_names() {
        let ext = Extension::from_file_name("a.png").unwrap();
        let (a, b) = (Key::generate(&ext), Key::generate(&ext));

        assert_ne!(a, b);
        assert!(a.to_string().ends_with(".png"));
        assert!(!a.to_string().contains('/'));
    }
}
