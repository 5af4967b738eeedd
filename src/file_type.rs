//! File type classification and preview helpers.
//!
//! Every file is bucketed into a [`FileKind`] by its extension. Browse pages
//! group kinds into [`Category`] listings.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Largest payload rendered inline as a `data:` thumbnail (1 MiB).
pub const MAX_THUMBNAIL_BYTES: usize = 1024 * 1024;

const DOCUMENT_EXTENSIONS: &[&str] = &[
    "pdf", "doc", "docx", "txt", "xls", "xlsx", "csv", "rtf", "ods", "ppt", "odp", "md", "html",
    "htm", "epub", "pages", "fig", "psd", "ai", "indd", "xd", "sketch", "afdesign", "afphoto",
];
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

/// Coarse type of a stored file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Document,
    Image,
    Video,
    Audio,
    Other,
}

impl FileKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Other => "other",
        }
    }

    /// Icon shown when no thumbnail is available.
    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Document => "/assets/icons/file-document.svg",
            Self::Image => "/assets/icons/file-image.svg",
            Self::Video => "/assets/icons/file-video.svg",
            Self::Audio => "/assets/icons/file-audio.svg",
            Self::Other => "/assets/icons/file-other.svg",
        }
    }
}

/// Split a file name into its kind and lowercase extension.
///
/// Names without a dot have an empty extension and classify as
/// [`FileKind::Other`].
pub fn classify(name: &str) -> (FileKind, String) {
    let extension = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    };

    let ext = extension.as_str();
    let kind = if DOCUMENT_EXTENSIONS.contains(&ext) {
        FileKind::Document
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        FileKind::Image
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        FileKind::Video
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        FileKind::Audio
    } else {
        FileKind::Other
    };

    (kind, extension)
}

/// Inline preview URL for image payloads small enough to embed.
pub fn thumbnail_data_url(name: &str, kind: FileKind, payload: &[u8]) -> Option<String> {
    if kind != FileKind::Image || payload.is_empty() || payload.len() > MAX_THUMBNAIL_BYTES {
        return None;
    }
    let mime = mime_guess::from_path(name).first_or_octet_stream();
    let encoded = base64::engine::general_purpose::STANDARD.encode(payload);
    Some(format!("data:{mime};base64,{encoded}"))
}

/// Browse page grouping of file kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Documents,
    Images,
    Media,
    Others,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Documents,
        Category::Images,
        Category::Media,
        Category::Others,
    ];

    /// Parse the URL segment of a browse page.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "documents" => Some(Self::Documents),
            "images" => Some(Self::Images),
            "media" => Some(Self::Media),
            "others" => Some(Self::Others),
            _ => None,
        }
    }

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            Self::Documents => "documents",
            Self::Images => "images",
            Self::Media => "media",
            Self::Others => "others",
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Media => "Media",
            Self::Others => "Others",
        }
    }

    /// Browse page path.
    #[must_use]
    pub fn href(self) -> &'static str {
        match self {
            Self::Documents => "/documents",
            Self::Images => "/images",
            Self::Media => "/media",
            Self::Others => "/others",
        }
    }

    #[must_use]
    pub fn icon(self) -> &'static str {
        match self {
            Self::Documents => "/assets/icons/documents.svg",
            Self::Images => "/assets/icons/images.svg",
            Self::Media => "/assets/icons/video.svg",
            Self::Others => "/assets/icons/others.svg",
        }
    }

    #[must_use]
    pub fn kinds(self) -> &'static [FileKind] {
        match self {
            Self::Documents => &[FileKind::Document],
            Self::Images => &[FileKind::Image],
            Self::Media => &[FileKind::Video, FileKind::Audio],
            Self::Others => &[FileKind::Other],
        }
    }
}
