use clap::Parser;

use crate::generation::{GeneratorFormat, GeneratorSchema};

/// Generate SBOMs from static source analysis
#[derive(Parser, Debug)]
#[command(name = "srcbom")]
#[command(version)]
#[command(about = "Generate CycloneDX or SPDX SBOMs from source files and package-manager manifests", long_about = None)]
pub struct Args {
    /// Path to the project directory (defaults to current directory)
    pub path: Option<String>,

    /// Output schema: cyclonedx or spdx
    #[arg(short, long, default_value = "cyclonedx")]
    pub schema: GeneratorSchema,

    /// Output format: json, xml, yaml, or tag-value
    #[arg(short, long, default_value = "json")]
    pub format: GeneratorFormat,

    /// Output directory (if not specified, the document goes to stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Show per-file progress and a run summary
    #[arg(long)]
    pub summary: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
