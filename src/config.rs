use clap::Args;

pub const DEFAULT_MAX_PDF_SIZE: u64 = 100 * 1024 * 1024;
pub const DEFAULT_MAX_IMAGE_SIZE: u64 = 50 * 1024 * 1024;
pub const DEFAULT_MAX_MERGE_FILES: usize = 20;
pub const DEFAULT_MAX_IMAGES: usize = 50;

/// Upper bounds applied to every request before any document is composed.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum size of a PDF input, in bytes
    #[arg(long, global = true, env = "PAGEWRIGHT_MAX_PDF_SIZE", default_value_t = DEFAULT_MAX_PDF_SIZE)]
    pub max_pdf_size: u64,

    /// Maximum size of an image input, in bytes
    #[arg(long, global = true, env = "PAGEWRIGHT_MAX_IMAGE_SIZE", default_value_t = DEFAULT_MAX_IMAGE_SIZE)]
    pub max_image_size: u64,

    /// Maximum number of PDFs in one merge
    #[arg(long, global = true, env = "PAGEWRIGHT_MAX_MERGE_FILES", default_value_t = DEFAULT_MAX_MERGE_FILES)]
    pub max_merge_files: usize,

    /// Maximum number of images in one conversion
    #[arg(long, global = true, env = "PAGEWRIGHT_MAX_IMAGES", default_value_t = DEFAULT_MAX_IMAGES)]
    pub max_images: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_pdf_size: DEFAULT_MAX_PDF_SIZE,
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            max_merge_files: DEFAULT_MAX_MERGE_FILES,
            max_images: DEFAULT_MAX_IMAGES,
        }
    }
}
