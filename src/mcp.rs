use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_handler, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::commands::write_output;
use crate::config::Limits;
use crate::pdf::document::DocumentInfo;
use crate::pdf::{CompositionReport, SourceDocument};
use crate::request::{default_output_path, read_pdf, ImagesRequest, MergeRequest, SplitRequest};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the source PDF file")]
    pub path: String,
    #[schemars(description = "Page ranges (e.g., '1-3,5,7-9'); invalid parts are ignored")]
    pub pages: Option<String>,
    #[schemars(description = "Output file path (default: split-pages-<ranges>.pdf next to the source)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfMergeRequest {
    #[schemars(description = "PDF files or directories of PDF files, merged in order")]
    pub paths: Vec<String>,
    #[schemars(description = "Output file path (default: merged.pdf next to the first input)")]
    pub output: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ImagesToPdfRequest {
    #[schemars(description = "JPEG or PNG files, or directories of them, one page each in order")]
    pub paths: Vec<String>,
    #[schemars(description = "Output file path (default: images.pdf next to the first input)")]
    pub output: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    tool_router: ToolRouter<Self>,
    limits: Limits,
}

impl PdfServer {
    pub fn new(limits: Limits) -> Self {
        Self {
            tool_router: Self::tool_router(),
            limits,
        }
    }

    fn split(&self, req: PdfSplitRequest) -> Result<ComposeResult> {
        let input = PathBuf::from(&req.path);
        let job = SplitRequest::from_path(&input, req.pages, &self.limits)?.validate(&self.limits)?;
        let output = output_path(req.output, Some(&input), &job.default_output_name());
        let report = write_output(job.run()?, &output)?;
        Ok(ComposeResult::new(output, report))
    }

    fn merge(&self, req: PdfMergeRequest) -> Result<ComposeResult> {
        let job = MergeRequest::from_paths(&req.paths, &self.limits)?.validate(&self.limits)?;
        let first = req.paths.first().map(Path::new);
        let output = output_path(req.output, first, &job.default_output_name());
        let report = write_output(job.run()?, &output)?;
        Ok(ComposeResult::new(output, report))
    }

    fn images(&self, req: ImagesToPdfRequest) -> Result<ComposeResult> {
        let job = ImagesRequest::from_paths(&req.paths, &self.limits)?.validate(&self.limits)?;
        let first = req.paths.first().map(Path::new);
        let output = output_path(req.output, first, &job.default_output_name());
        let report = write_output(job.run()?, &output)?;
        Ok(ComposeResult::new(output, report))
    }
}

fn output_path(explicit: Option<String>, first_input: Option<&Path>, name: &str) -> PathBuf {
    explicit
        .map(PathBuf::from)
        .unwrap_or_else(|| default_output_path(first_input, name))
}

fn document_info(path: &str, limits: &Limits) -> Result<PdfInfoResult> {
    let doc = SourceDocument::load(&read_pdf(Path::new(path), limits)?)?;
    Ok(PdfInfoResult {
        path: path.to_string(),
        info: doc.info(),
    })
}

fn respond<T: Serialize>(tool: &str, result: Result<T>) -> String {
    match result {
        Ok(value) => {
            info!(tool, "tool call succeeded");
            serde_json::to_string_pretty(&value).unwrap_or_else(|e| format!("Error: {}", e))
        }
        Err(e) => {
            warn!(tool, error = %e, "tool call failed");
            format!("Error: {:#}", e)
        }
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "Get PDF metadata including title, author, page count, and the size of the first page")]
    fn pdf_info(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        respond("pdf_info", document_info(&path, &self.limits))
    }

    #[tool(description = "Copy the pages selected by a range expression like '1-3,5,7-9' into a new PDF. Pages are deduplicated and kept in ascending order.")]
    fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        respond("pdf_split", self.split(req))
    }

    #[tool(description = "Concatenate two or more PDFs, in the given order, into a new PDF")]
    fn pdf_merge(&self, Parameters(req): Parameters<PdfMergeRequest>) -> String {
        respond("pdf_merge", self.merge(req))
    }

    #[tool(description = "Render JPEG and PNG images as the pages of a new A4 PDF, one image per page. Unsupported images are skipped and listed in the report.")]
    fn images_to_pdf(&self, Parameters(req): Parameters<ImagesToPdfRequest>) -> String {
        respond("images_to_pdf", self.images(req))
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct PdfInfoResult {
    pub path: String,
    #[serde(flatten)]
    pub info: DocumentInfo,
}

#[derive(Debug, Serialize)]
pub struct ComposeResult {
    pub output_path: String,
    pub report: CompositionReport,
}

impl ComposeResult {
    fn new(output: PathBuf, report: CompositionReport) -> Self {
        ComposeResult {
            output_path: output.display().to_string(),
            report,
        }
    }
}

#[tool_handler]
impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "PDF composition tools. Use pdf_info to inspect a document, pdf_split to copy \
                 selected pages into a new PDF, pdf_merge to concatenate PDFs, and images_to_pdf \
                 to build a PDF from JPEG and PNG images."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server(limits: Limits) -> Result<()> {
    let server = PdfServer::new(limits);

    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
