pub mod images;
pub mod info;
pub mod merge;
pub mod split;

use anyhow::{Context, Result};
use std::path::Path;

use crate::pdf::{Composition, CompositionReport};

/// Serialise a composition to `output` and hand back its report.
pub(crate) fn write_output(composition: Composition, output: &Path) -> Result<CompositionReport> {
    let Composition { document, report } = composition;
    let bytes = document.finish()?;
    std::fs::write(output, &bytes)
        .with_context(|| format!("Failed to write PDF: {}", output.display()))?;
    tracing::info!(path = %output.display(), bytes = bytes.len(), "output written");
    Ok(report)
}

fn print_skipped(report: &CompositionReport) {
    for (name, reason) in report.skipped() {
        println!("  skipped {}: {}", name, reason);
    }
}
