//! Image upload endpoints

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};
use crate::fetch::{Fetch, FilePart};
use crate::http::HttpClient;
use crate::types::Envelope;

/// Extensions the backend stores
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Stored image; `url` is relative to the API base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub url: String,
    pub filename: String,
}

/// An image to upload
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    /// Wrap file contents under the given name
    pub fn new(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            bytes,
        }
    }

    fn into_part(self, field: &str) -> Result<FilePart> {
        let extension = image_extension(&self.file_name).ok_or_else(|| {
            Error::invalid_input(format!("unsupported image type: {}", self.file_name))
        })?;
        Ok(FilePart {
            field: field.to_string(),
            content_type: Some(mime_for(&extension).to_string()),
            file_name: self.file_name,
            bytes: self.bytes,
        })
    }
}

fn image_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| ALLOWED_IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

fn mime_for(extension: &str) -> &'static str {
    match extension {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Whether the backend would accept a file with this name
pub fn is_allowed_image(file_name: &str) -> bool {
    image_extension(file_name).is_some()
}

/// Client for `/upload`
#[derive(Debug, Clone)]
pub struct UploadApi {
    http: HttpClient,
}

impl UploadApi {
    /// Create a new upload API
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Upload a single image
    pub async fn upload_image(&self, image: ImageFile) -> Result<Envelope<UploadedFile>> {
        let part = image.into_part("file")?;
        self.http
            .send(Fetch::post("/upload/image").multipart(vec![part]))
            .await
    }

    /// Upload several images in one request
    pub async fn upload_images(&self, images: Vec<ImageFile>) -> Result<Envelope<Vec<UploadedFile>>> {
        if images.is_empty() {
            return Err(Error::invalid_input("no images to upload"));
        }
        let parts = images
            .into_iter()
            .map(|image| image.into_part("files"))
            .collect::<Result<Vec<_>>>()?;
        self.http
            .send(Fetch::post("/upload/images").multipart(parts))
            .await
    }
}
