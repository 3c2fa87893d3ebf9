use crate::error::ImageFetchError;
use log::{debug, info};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::future::Future;
use std::path::{Path, PathBuf};

/// Raw bytes behind an image reference plus the MIME type they came with.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// A named, typed file ready to attach to a multipart submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl FetchedImage {
    /// `"{name}.{subtype}"`, e.g. `Leo` + `image/jpeg` gives `Leo.jpeg`.
    pub fn file_name(&self, name: &str) -> String {
        let subtype = self
            .mime_type
            .strip_prefix("image/")
            .unwrap_or(&self.mime_type);
        format!("{}.{}", name, subtype)
    }

    pub fn into_file(self, name: &str) -> ImageFile {
        ImageFile {
            file_name: self.file_name(name),
            mime_type: self.mime_type,
            bytes: self.bytes,
        }
    }
}

/// Anything that can turn an image reference into bytes.
pub trait ImageSource {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedImage, ImageFetchError>>;
}

/// Fetches hosted images over HTTP and local previews from disk.
pub struct HttpImageSource {
    client: Client,
}

impl HttpImageSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_remote(&self, url: Url) -> Result<FetchedImage, ImageFetchError> {
        debug!("Requesting image {}", url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let mime_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(essence)
            .unwrap_or_default();
        let bytes = response.bytes().await?.to_vec();

        info!("Fetched {} bytes ({}) from {}", bytes.len(), mime_type, url);
        checked(FetchedImage { bytes, mime_type })
    }

    async fn fetch_local(&self, path: PathBuf) -> Result<FetchedImage, ImageFetchError> {
        debug!("Reading image preview {}", path.display());
        let mime_type = mime_for_path(&path).unwrap_or_default().to_string();
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| ImageFetchError::Io {
                path: path.clone(),
                source,
            })?;

        info!("Read {} bytes ({}) from {}", bytes.len(), mime_type, path.display());
        checked(FetchedImage { bytes, mime_type })
    }
}

impl ImageSource for HttpImageSource {
    /// Accepts `http(s)://` and `file://` URLs, or a plain filesystem path.
    async fn fetch(&self, location: &str) -> Result<FetchedImage, ImageFetchError> {
        let unsupported = || ImageFetchError::UnsupportedUrl(location.to_string());
        match Url::parse(location) {
            Ok(url) => match url.scheme() {
                "http" | "https" => self.fetch_remote(url).await,
                "file" => {
                    let path = url.to_file_path().map_err(|_| unsupported())?;
                    self.fetch_local(path).await
                }
                _ => Err(unsupported()),
            },
            Err(_) if !location.is_empty() => self.fetch_local(PathBuf::from(location)).await,
            Err(_) => Err(unsupported()),
        }
    }
}

fn checked(image: FetchedImage) -> Result<FetchedImage, ImageFetchError> {
    if image.mime_type.starts_with("image/") {
        Ok(image)
    } else {
        Err(ImageFetchError::NotAnImage {
            mime: image.mime_type,
        })
    }
}

/// Strip parameters from a content type: `image/png; q=1` becomes `image/png`.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}
