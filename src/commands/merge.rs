use crate::config::Limits;
use crate::request::{default_output_path, MergeRequest};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn run<P: AsRef<Path>>(inputs: &[P], output: Option<PathBuf>, limits: &Limits) -> Result<()> {
    let job = MergeRequest::from_paths(inputs, limits)?.validate(limits)?;
    let first = inputs.first().map(|p| p.as_ref());
    let output = output.unwrap_or_else(|| default_output_path(first, &job.default_output_name()));

    let report = super::write_output(job.run()?, &output)?;

    println!(
        "Merged {} files ({} pages) into {}",
        report.sources(),
        report.total_pages,
        output.display()
    );

    Ok(())
}
