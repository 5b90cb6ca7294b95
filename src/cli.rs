use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Compression format for uploaded CSV files
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Gzip compression (.gz)
    Gzip,
    /// Zstandard compression (.zst)
    Zstd,
    /// Bzip2 compression (.bz2)
    Bzip2,
    /// XZ compression (.xz)
    Xz,
}

/// Bundled sample datasets offered in the sidebar
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Hash, Default)]
pub enum SampleFile {
    /// Sample Sales Data (weekly units sold per store and SKU)
    #[default]
    Sales,
    /// Sample Submission Format (record id and units sold)
    Submission,
    /// Sample Test Data (sales features without units sold)
    Test,
}

/// Command-line arguments for supplychat
#[derive(Parser, Debug)]
#[command(version, about = "Ask questions about supply chain CSV data")]
pub struct Args {
    /// CSV file to upload when the application starts
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Sample file selected in the sidebar at startup
    #[arg(long = "sample", value_enum)]
    pub sample: Option<SampleFile>,

    /// Start with "Use selected sample file" checked
    #[arg(long = "use-sample", action)]
    pub use_sample: bool,

    /// Specify the compression format of the uploaded file explicitly.
    /// If not specified, compression is auto-detected from the file extension.
    #[arg(long = "compression", value_enum)]
    pub compression: Option<CompressionFormat>,

    /// Field delimiter used when parsing CSV files
    #[arg(long = "delimiter")]
    pub delimiter: Option<u8>,

    /// Language model used by the question answering agent
    #[arg(long = "model")]
    pub model: Option<String>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Write tracing output to this file (the terminal is owned by the UI)
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Write the default configuration file and exit
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Overwrite an existing configuration file with --generate-config
    #[arg(long = "force", action, requires = "generate_config")]
    pub force: bool,
}
