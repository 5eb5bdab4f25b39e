use crate::config::Limits;
use crate::request::{default_output_path, SplitRequest};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub fn run<P: AsRef<Path>>(
    input: P,
    pages: &str,
    output: Option<PathBuf>,
    limits: &Limits,
) -> Result<()> {
    let input = input.as_ref();
    let job = SplitRequest::from_path(input, Some(pages.to_string()), limits)?.validate(limits)?;
    let output =
        output.unwrap_or_else(|| default_output_path(Some(input), &job.default_output_name()));

    let report = super::write_output(job.run()?, &output)?;

    println!(
        "Extracted {} of {} page(s) to {}",
        report.total_pages,
        report.source_pages.unwrap_or_default(),
        output.display()
    );

    Ok(())
}
