use std::path::PathBuf;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::{debug, info};

use chirp_types::limits::IMAGE_MAX_BYTES;

use crate::AppState;
use crate::error::ApiError;

/// Formats accepted as cheep attachments, recognised by magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext {
            "png" => Some(Self::Png),
            "jpg" => Some(Self::Jpeg),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Content-addressed image storage.
///
/// Each image is stored once at `{dir}/{sha256}.{ext}`; posting the same
/// image twice reuses the file.
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Image storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Store already validated bytes and return the file name.
    pub async fn save(&self, bytes: &[u8], format: ImageFormat) -> Result<String> {
        let digest = hex::encode(Sha256::digest(bytes));
        let name = format!("{}.{}", digest, format.extension());
        let path = self.dir.join(&name);

        if fs::try_exists(&path).await? {
            debug!("Image {} already stored", name);
        } else {
            fs::write(&path, bytes).await?;
            info!("Stored image {} ({} bytes)", name, bytes.len());
        }
        Ok(name)
    }

    /// Read a stored image. Names that could not have come from `save`
    /// are treated as missing, which also rules out path traversal.
    pub async fn open(&self, name: &str) -> Result<Option<(Vec<u8>, ImageFormat)>> {
        let Some(format) = parse_name(name) else {
            return Ok(None);
        };
        match fs::read(self.dir.join(name)).await {
            Ok(bytes) => Ok(Some((bytes, format))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn parse_name(name: &str) -> Option<ImageFormat> {
    let (digest, ext) = name.split_once('.')?;
    if digest.len() != 64 || !digest.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
        return None;
    }
    ImageFormat::from_extension(ext)
}

/// Decode a base64 upload and check its size and format.
pub fn decode_upload(encoded: &str) -> Result<(Vec<u8>, ImageFormat), ApiError> {
    // base64 inflates by 4/3; reject obviously oversized payloads before decoding
    if encoded.len() / 4 * 3 > IMAGE_MAX_BYTES + 3 {
        return Err(ApiError::PayloadTooLarge { max: IMAGE_MAX_BYTES });
    }
    let bytes = B64
        .decode(encoded.trim())
        .map_err(|_| ApiError::BadRequest("image is not valid base64".into()))?;
    if bytes.len() > IMAGE_MAX_BYTES {
        return Err(ApiError::PayloadTooLarge { max: IMAGE_MAX_BYTES });
    }
    let format = ImageFormat::sniff(&bytes)
        .ok_or_else(|| ApiError::BadRequest("image must be PNG, JPEG, GIF or WebP".into()))?;
    Ok((bytes, format))
}

/// GET /images/{name}
pub async fn serve_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (bytes, format) = state
        .images
        .open(&name)
        .await?
        .ok_or(ApiError::NotFound("image"))?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type()),
            (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
        ],
        bytes,
    ))
}
