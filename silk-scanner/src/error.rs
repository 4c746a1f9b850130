use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Malformed URL '{url}': {source}")]
    MalformedUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Fetch of {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Fetch of {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: BoxError,
    },

    #[error("Cannot build markup view of {url}: {source}")]
    MalformedMarkup {
        url: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("{operation} requires a markup page, but {url} has content type '{content_type}'")]
    InvalidUsage {
        operation: &'static str,
        url: String,
        content_type: String,
    },

    #[error("{0}")]
    Collaborator(#[source] BoxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Coarse classification of a [`ScanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedUrl,
    FetchFailure,
    StructuralParseFailure,
    CollaboratorFailure,
    InvalidUsage,
}

impl ScanError {
    pub fn malformed_url(url: impl Into<String>, source: url::ParseError) -> Self {
        ScanError::MalformedUrl {
            url: url.into(),
            source,
        }
    }

    /// Wraps a transport failure raised by a custom downloader.
    pub fn fetch(url: impl Into<String>, source: impl Into<BoxError>) -> Self {
        ScanError::Fetch {
            url: url.into(),
            source: source.into(),
        }
    }

    /// Wraps an arbitrary failure raised by a spider or a pipeline.
    pub fn collaborator(source: impl Into<BoxError>) -> Self {
        ScanError::Collaborator(source.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::MalformedUrl { .. } => ErrorKind::MalformedUrl,
            ScanError::HttpStatus { .. } | ScanError::HttpError(_) | ScanError::Fetch { .. } => {
                ErrorKind::FetchFailure
            }
            ScanError::MalformedMarkup { .. } => ErrorKind::StructuralParseFailure,
            ScanError::InvalidUsage { .. } => ErrorKind::InvalidUsage,
            ScanError::Collaborator(_) | ScanError::IoError(_) => ErrorKind::CollaboratorFailure,
        }
    }

    /// A defect is a programming error in the caller, never a condition to retry.
    pub fn is_defect(&self) -> bool {
        self.kind() == ErrorKind::InvalidUsage
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
