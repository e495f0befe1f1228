use aws_lambda_events::event::s3::S3EventRecord;
use image::ImageFormat;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use strum::Display;

/// An object in the upload bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectRef {
    pub bucket: String,
    pub key: String,
}

impl ObjectRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Resolve the object named by an S3 notification record.
    ///
    /// Keys arrive form-encoded in notifications, so they are decoded here.
    /// Returns `None` when the record lacks a bucket name or an object key.
    pub fn from_event_record(record: &S3EventRecord) -> Option<Self> {
        let bucket = record.s3.bucket.name.as_deref()?;
        let key = record.s3.object.key.as_deref()?;
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self::new(bucket, decode_key(key)))
    }

    pub fn kind(&self) -> FileKind {
        FileKind::from_key(&self.key)
    }
}

/// Decode an object key as it appears in S3 event notifications.
///
/// `+` stands for a space and everything else is percent-encoded.
pub fn decode_key(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Kind of uploaded document, judged by the key's extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Image,
    Other,
}

impl FileKind {
    pub fn from_key(key: &str) -> Self {
        let name = key.rsplit('/').next().unwrap_or(key);
        let Some((_, ext)) = name.rsplit_once('.') else {
            return FileKind::Other;
        };

        if ext.eq_ignore_ascii_case("pdf") {
            return FileKind::Pdf;
        }

        match ImageFormat::from_extension(ext) {
            Some(ImageFormat::Jpeg | ImageFormat::Png | ImageFormat::Tiff) => FileKind::Image,
            _ => FileKind::Other,
        }
    }
}
