use crate::config::Limits;
use crate::request::{default_output_path, ImagesRequest};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn run<P: AsRef<Path>>(inputs: &[P], output: Option<PathBuf>, limits: &Limits) -> Result<()> {
    let job = ImagesRequest::from_paths(inputs, limits)?.validate(limits)?;
    let first = inputs.first().map(|p| p.as_ref());
    let output = output.unwrap_or_else(|| default_output_path(first, &job.default_output_name()));

    let report = super::write_output(job.run()?, &output)?;

    println!(
        "Converted {} of {} image(s) into {} ({} pages)",
        report.sources() - report.skipped_count(),
        report.sources(),
        output.display(),
        report.total_pages
    );
    if report.is_partial() {
        super::print_skipped(&report);
    }

    Ok(())
}
