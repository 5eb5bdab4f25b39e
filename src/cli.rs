use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Limits;

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(about = "Split, merge, and build PDFs from images, with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub limits: Limits,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server over stdio
    Mcp,

    /// Display PDF metadata and page size
    Info {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Copy selected pages into a new PDF
    #[command(alias = "extract", alias = "cat")]
    Split {
        /// PDF file to take pages from
        path: PathBuf,

        /// Page ranges (e.g., "1-3,5,7-9"); invalid parts are ignored
        pages: String,

        /// Output file [default: split-pages-<ranges>.pdf next to the input]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Combine multiple PDFs into one
    Merge {
        /// PDF files, or directories of PDF files, to merge in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file [default: merged.pdf next to the first input]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render JPEG and PNG images as the pages of a new PDF
    #[command(name = "images-to-pdf", alias = "img2pdf")]
    ImagesToPdf {
        /// Image files, or directories of images, in page order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output file [default: images.pdf next to the first input]
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
