use std::path::PathBuf;

use image::ImageFormat;
use thiserror::Error;

/// Failures of the document composer.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The page range expression selected no pages of the source.
    #[error("no valid pages selected")]
    EmptySelection,

    /// A source could not be loaded or its pages could not be enumerated.
    #[error("failed to process {input}: {reason}")]
    Unprocessable { input: String, reason: String },

    /// Every candidate page or image was skipped.
    #[error("nothing to compose: {0}")]
    NoOutput(String),

    /// Encoding a generated content stream failed.
    #[error("failed to build PDF content: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to serialise composed document: {0}")]
    Serialize(#[source] std::io::Error),
}

impl ComposeError {
    pub(crate) fn unprocessable(input: impl Into<String>, reason: impl ToString) -> Self {
        ComposeError::Unprocessable {
            input: input.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure is caused by the request's inputs rather than by
    /// the composer itself.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ComposeError::EmptySelection
                | ComposeError::Unprocessable { .. }
                | ComposeError::NoOutput(_)
        )
    }
}

/// Why an image was not rendered onto a page.
#[derive(Debug, Error)]
pub enum UnsupportedImage {
    #[error("unrecognised image data")]
    Unrecognised,

    #[error("unsupported image format {0:?}, only JPEG and PNG can be embedded")]
    Format(ImageFormat),

    #[error("image has no pixels")]
    Empty,

    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Rejections raised while reading and validating a request, before any
/// document is composed.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("no input files provided")]
    NoFiles,

    #[error("at least {min} files are required, got {got}")]
    TooFewFiles { min: usize, got: usize },

    #[error("too many files: at most {max} allowed, got {got}")]
    TooManyFiles { max: usize, got: usize },

    #[error("{name} is {size} bytes, exceeding the {limit} byte limit")]
    FileTooLarge { name: String, size: u64, limit: u64 },

    #[error("page ranges required, e.g. \"1-3,5,7-9\"")]
    MissingPageRanges,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to list directory: {0}")]
    Walk(#[from] walkdir::Error),
}
