use std::path::PathBuf;
use thiserror::Error;

/// Failure while retrieving the bytes behind an image reference.
#[derive(Error, Debug)]
pub enum ImageFetchError {
    #[error("image request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image server returned {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("could not read image file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("resource is not an image (content type {mime:?})")]
    NotAnImage { mime: String },
    #[error("unsupported image location: {0}")]
    UnsupportedUrl(String),
}

/// Failure while submitting a record or a deletion to the content server.
#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server rejected the request: {0}")]
    Rejected(String),
}

/// Precondition violations, raised before any request is issued.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("update requires a record id")]
    MissingId,
    #[error("record has no image source")]
    EmptyImageSource,
    #[error("unknown record field: {0}")]
    UnknownField(String),
    #[error("records that were never saved cannot be deleted")]
    DeleteUnavailable,
    #[error("no deletion is awaiting confirmation")]
    NothingToConfirm,
    #[error("another save or delete is still in progress")]
    Busy,
    #[error("this editor has already saved or deleted its record")]
    Finished,
}

#[derive(Error, Debug)]
pub enum EditorError {
    #[error(transparent)]
    ImageFetch(#[from] ImageFetchError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
