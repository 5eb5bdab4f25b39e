//! Reading and validating requests at the boundary, before anything reaches
//! the composer.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::config::Limits;
use crate::error::{ComposeError, RequestError};
use crate::page_range;
use crate::pdf::{
    compose_from_concatenation, compose_from_images, compose_from_selection, Composition,
    DocumentInput, ImageInput, SourceDocument,
};

pub const PDF_EXTENSIONS: &[&str] = &["pdf"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

const MIN_MERGE_FILES: usize = 2;

/// Replace each directory in `paths` by the files directly inside it whose
/// extension is one of `extensions`, sorted by file name. Paths naming files
/// are kept as given, whatever their extension.
pub fn expand_paths<P: AsRef<Path>>(
    paths: &[P],
    extensions: &[&str],
) -> Result<Vec<PathBuf>, RequestError> {
    let mut expanded = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if !path.is_dir() {
            expanded.push(path.to_path_buf());
            continue;
        }

        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                expanded.push(entry.into_path());
            }
        }
    }
    Ok(expanded)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Read `path` once its size, taken from the file system, is known to be
/// within `limit`. The input is named by the path as given, so inputs that
/// share a file name in different directories stay distinguishable.
fn read_file(path: &Path, limit: u64) -> Result<(String, Vec<u8>), RequestError> {
    let read_error = |source| RequestError::Read {
        path: path.to_path_buf(),
        source,
    };
    let name = path.display().to_string();
    let size = std::fs::metadata(path).map_err(read_error)?.len();
    check_size(&name, size, limit)?;

    let bytes = std::fs::read(path).map_err(read_error)?;
    // the file may have grown since it was measured
    check_size(&name, bytes.len() as u64, limit)?;
    debug!(name = %name, bytes = bytes.len(), "input read");
    Ok((name, bytes))
}

/// Read a single PDF, applying the PDF size limit.
pub fn read_pdf(path: &Path, limits: &Limits) -> Result<DocumentInput, RequestError> {
    let (name, bytes) = read_file(path, limits.max_pdf_size)?;
    Ok(DocumentInput::new(name, bytes))
}

fn check_count(got: usize, max: usize) -> Result<(), RequestError> {
    if got > max {
        return Err(RequestError::TooManyFiles { max, got });
    }
    Ok(())
}

fn check_size(name: &str, size: u64, limit: u64) -> Result<(), RequestError> {
    if size > limit {
        return Err(RequestError::FileTooLarge {
            name: name.to_string(),
            size,
            limit,
        });
    }
    Ok(())
}

/// Select pages of one PDF.
#[derive(Debug)]
pub struct SplitRequest {
    pub file: DocumentInput,
    pub page_ranges: Option<String>,
}

impl SplitRequest {
    pub fn from_path(
        path: impl AsRef<Path>,
        page_ranges: Option<String>,
        limits: &Limits,
    ) -> Result<Self, RequestError> {
        Ok(SplitRequest {
            file: read_pdf(path.as_ref(), limits)?,
            page_ranges,
        })
    }

    pub fn validate(self, limits: &Limits) -> Result<SplitJob, RequestError> {
        let page_ranges = self.page_ranges.ok_or(RequestError::MissingPageRanges)?;
        check_size(&self.file.name, self.file.bytes.len() as u64, limits.max_pdf_size)?;
        Ok(SplitJob {
            file: self.file,
            page_ranges,
        })
    }
}

#[derive(Debug)]
pub struct SplitJob {
    pub file: DocumentInput,
    pub page_ranges: String,
}

impl SplitJob {
    pub fn run(&self) -> Result<Composition, ComposeError> {
        let source = SourceDocument::load(&self.file)?;
        let pages = page_range::resolve(&self.page_ranges, source.page_count());
        debug!(selected = ?pages.as_slice(), "page ranges resolved");
        compose_from_selection(&source, &pages)
    }

    /// "split-pages-1-3_5.pdf" for ranges "1-3,5".
    pub fn default_output_name(&self) -> String {
        let ranges: String = self
            .page_ranges
            .chars()
            .filter_map(|c| match c {
                ',' => Some('_'),
                c if c.is_ascii_alphanumeric() || c == '-' => Some(c),
                _ => None,
            })
            .collect();
        format!("split-pages-{}.pdf", ranges)
    }
}

/// Concatenate several PDFs.
#[derive(Debug)]
pub struct MergeRequest {
    pub files: Vec<DocumentInput>,
}

impl MergeRequest {
    /// Read the PDFs named by `paths`. The file count and every file size
    /// are checked before anything is read.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], limits: &Limits) -> Result<Self, RequestError> {
        let paths = expand_paths(paths, PDF_EXTENSIONS)?;
        check_count(paths.len(), limits.max_merge_files)?;
        let files = paths
            .iter()
            .map(|path| read_pdf(path, limits))
            .collect::<Result<_, _>>()?;
        Ok(MergeRequest { files })
    }

    pub fn validate(self, limits: &Limits) -> Result<MergeJob, RequestError> {
        let got = self.files.len();
        if got == 0 {
            return Err(RequestError::NoFiles);
        }
        if got < MIN_MERGE_FILES {
            return Err(RequestError::TooFewFiles {
                min: MIN_MERGE_FILES,
                got,
            });
        }
        check_count(got, limits.max_merge_files)?;
        for file in &self.files {
            check_size(&file.name, file.bytes.len() as u64, limits.max_pdf_size)?;
        }
        Ok(MergeJob { files: self.files })
    }
}

#[derive(Debug)]
pub struct MergeJob {
    pub files: Vec<DocumentInput>,
}

impl MergeJob {
    pub fn run(&self) -> Result<Composition, ComposeError> {
        compose_from_concatenation(&self.files)
    }

    pub fn default_output_name(&self) -> String {
        "merged.pdf".to_string()
    }
}

/// Render images as pages of a new PDF.
#[derive(Debug)]
pub struct ImagesRequest {
    pub images: Vec<ImageInput>,
}

impl ImagesRequest {
    /// Read the images named by `paths`. The image count and every file size
    /// are checked before anything is read.
    pub fn from_paths<P: AsRef<Path>>(paths: &[P], limits: &Limits) -> Result<Self, RequestError> {
        let paths = expand_paths(paths, IMAGE_EXTENSIONS)?;
        check_count(paths.len(), limits.max_images)?;
        let images = paths
            .iter()
            .map(|path| {
                read_file(path, limits.max_image_size)
                    .map(|(name, bytes)| ImageInput::new(name, bytes))
            })
            .collect::<Result<_, _>>()?;
        Ok(ImagesRequest { images })
    }

    pub fn validate(self, limits: &Limits) -> Result<ImagesJob, RequestError> {
        let got = self.images.len();
        if got == 0 {
            return Err(RequestError::NoFiles);
        }
        check_count(got, limits.max_images)?;
        for image in &self.images {
            check_size(&image.name, image.bytes.len() as u64, limits.max_image_size)?;
        }
        Ok(ImagesJob {
            images: self.images,
        })
    }
}

#[derive(Debug)]
pub struct ImagesJob {
    pub images: Vec<ImageInput>,
}

impl ImagesJob {
    pub fn run(&self) -> Result<Composition, ComposeError> {
        compose_from_images(&self.images)
    }

    pub fn default_output_name(&self) -> String {
        "images.pdf".to_string()
    }
}

/// `name` next to the first input, or in the current directory.
pub fn default_output_path(first_input: Option<&Path>, name: &str) -> PathBuf {
    first_input
        .and_then(Path::parent)
        .map(|dir| dir.join(name))
        .unwrap_or_else(|| PathBuf::from(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures;
    use crate::pdf::raster::samples;
    use std::fs;

    fn pdf_input(name: &str, pages: u32) -> DocumentInput {
        DocumentInput::new(name, fixtures::pdf_bytes("P", pages))
    }

    #[test]
    fn test_expand_directory_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.pdf"), b"b").unwrap();
        fs::write(dir.path().join("a.PDF"), b"a").unwrap();
        fs::write(dir.path().join("notes.txt"), b"n").unwrap();
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();
        let explicit = dir.path().join("notes.txt");

        let paths = expand_paths(&[dir.path().to_path_buf(), explicit.clone()], PDF_EXTENSIONS)
            .unwrap();
        assert_eq!(
            paths,
            vec![dir.path().join("a.PDF"), dir.path().join("b.pdf"), explicit]
        );
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SplitRequest::from_path(
            dir.path().join("nope.pdf"),
            Some("1".into()),
            &Limits::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RequestError::Read { .. }));
    }

    #[test]
    fn test_split_requires_ranges() {
        let request = SplitRequest {
            file: pdf_input("a.pdf", 2),
            page_ranges: None,
        };
        assert!(matches!(
            request.validate(&Limits::default()),
            Err(RequestError::MissingPageRanges)
        ));
    }

    #[test]
    fn test_split_empty_ranges_reach_composer() {
        let job = SplitRequest {
            file: pdf_input("a.pdf", 2),
            page_ranges: Some(String::new()),
        }
        .validate(&Limits::default())
        .unwrap();
        assert!(matches!(job.run(), Err(ComposeError::EmptySelection)));
    }

    #[test]
    fn test_split_job_runs() {
        let job = SplitRequest {
            file: pdf_input("a.pdf", 10),
            page_ranges: Some("1-3,5,7-9".into()),
        }
        .validate(&Limits::default())
        .unwrap();
        let composition = job.run().unwrap();
        assert_eq!(composition.report.total_pages, 7);
        assert_eq!(composition.report.source_pages, Some(10));
        assert_eq!(job.default_output_name(), "split-pages-1-3_5_7-9.pdf");
    }

    #[test]
    fn test_output_name_strips_unsafe_characters() {
        let job = SplitJob {
            file: pdf_input("a.pdf", 1),
            page_ranges: " 1 - 2 , ../3".into(),
        };
        assert_eq!(job.default_output_name(), "split-pages-1-2_3.pdf");
    }

    #[test]
    fn test_merge_file_counts() {
        let limits = Limits::default();
        assert!(matches!(
            MergeRequest { files: vec![] }.validate(&limits),
            Err(RequestError::NoFiles)
        ));
        assert!(matches!(
            MergeRequest {
                files: vec![pdf_input("a.pdf", 1)]
            }
            .validate(&limits),
            Err(RequestError::TooFewFiles { min: 2, got: 1 })
        ));

        let files = (0..21).map(|i| pdf_input(&format!("{i}.pdf"), 1)).collect();
        assert!(matches!(
            MergeRequest { files }.validate(&limits),
            Err(RequestError::TooManyFiles { max: 20, got: 21 })
        ));
    }

    #[test]
    fn test_size_limits() {
        let limits = Limits {
            max_pdf_size: 16,
            max_image_size: 16,
            ..Limits::default()
        };
        let err = MergeRequest {
            files: vec![pdf_input("a.pdf", 1), pdf_input("b.pdf", 1)],
        }
        .validate(&limits)
        .unwrap_err();
        match err {
            RequestError::FileTooLarge { name, limit, .. } => {
                assert_eq!(name, "a.pdf");
                assert_eq!(limit, 16);
            }
            other => panic!("unexpected error: {}", other),
        }

        let images = vec![ImageInput::new("big.png", samples::png(32, 32))];
        assert!(matches!(
            ImagesRequest { images }.validate(&limits),
            Err(RequestError::FileTooLarge { .. })
        ));
    }

    #[test]
    fn test_images_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("2.png"), samples::png(20, 10)).unwrap();
        fs::write(dir.path().join("1.jpg"), samples::jpeg(8, 8)).unwrap();
        fs::write(dir.path().join("readme.md"), b"# images").unwrap();

        let limits = Limits::default();
        let job = ImagesRequest::from_paths(&[dir.path()], &limits)
            .unwrap()
            .validate(&limits)
            .unwrap();
        let names: Vec<&str> = job.images.iter().map(|i| i.name.as_str()).collect();
        let expected = [dir.path().join("1.jpg"), dir.path().join("2.png")];
        assert_eq!(
            names,
            expected.iter().map(|p| p.to_str().unwrap()).collect::<Vec<_>>()
        );
        assert_eq!(job.run().unwrap().report.total_pages, 2);
    }

    #[test]
    fn test_too_many_images() {
        let limits = Limits {
            max_images: 1,
            ..Limits::default()
        };
        let images = vec![
            ImageInput::new("a.png", samples::png(1, 1)),
            ImageInput::new("b.png", samples::png(1, 1)),
        ];
        assert!(matches!(
            ImagesRequest { images }.validate(&limits),
            Err(RequestError::TooManyFiles { max: 1, got: 2 })
        ));
    }

    #[test]
    fn test_oversized_file_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let huge = dir.path().join("huge.pdf");
        // sparse: large on paper, no blocks on disk
        fs::File::create(&huge)
            .unwrap()
            .set_len(8 * 1024 * 1024 * 1024)
            .unwrap();

        let err = SplitRequest::from_path(&huge, Some("1".into()), &Limits::default())
            .unwrap_err();
        match err {
            RequestError::FileTooLarge { name, size, limit } => {
                assert_eq!(name, huge.display().to_string());
                assert_eq!(size, 8 * 1024 * 1024 * 1024);
                assert_eq!(limit, Limits::default().max_pdf_size);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_file_count_checked_before_reading() {
        let limits = Limits {
            max_merge_files: 3,
            max_images: 3,
            ..Limits::default()
        };
        // none of these exist, so reading any of them would fail first
        let paths: Vec<PathBuf> = (0..4).map(|i| PathBuf::from(format!("missing-{i}.pdf"))).collect();
        assert!(matches!(
            MergeRequest::from_paths(&paths, &limits),
            Err(RequestError::TooManyFiles { max: 3, got: 4 })
        ));
        assert!(matches!(
            ImagesRequest::from_paths(&paths, &limits),
            Err(RequestError::TooManyFiles { max: 3, got: 4 })
        ));
    }

    #[test]
    fn test_inputs_named_by_path() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["a", "b"] {
            fs::create_dir(dir.path().join(sub)).unwrap();
            fs::write(dir.path().join(sub).join("x.pdf"), fixtures::pdf_bytes("X", 1)).unwrap();
        }
        let paths = [dir.path().join("a/x.pdf"), dir.path().join("b/x.pdf")];
        let request = MergeRequest::from_paths(&paths, &Limits::default()).unwrap();
        let names: Vec<String> = request.files.iter().map(|f| f.name.clone()).collect();
        assert_eq!(
            names,
            paths.iter().map(|p| p.display().to_string()).collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Some(Path::new("docs/in.pdf")), "merged.pdf"),
            PathBuf::from("docs/merged.pdf")
        );
        assert_eq!(
            default_output_path(None, "merged.pdf"),
            PathBuf::from("merged.pdf")
        );
    }
}
