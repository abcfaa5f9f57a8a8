mod cli;
mod generation;
mod model;
mod parsers;
mod registry;
mod shared;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

use cli::Args;
use generation::SbomGenerator;
use parsers::controller::ParserController;
use registry::HttpRegistry;
use shared::error::{ExitCode, SbomError};
use shared::Result;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("\n❌ An error occurred:\n");
        eprintln!("{}", e);

        // Display error chain
        let mut source = e.source();
        while let Some(err) = source {
            eprintln!("\nCaused by: {}", err);
            source = err.source();
        }

        eprintln!();
        process::exit(ExitCode::ApplicationError.as_i32());
    }
}

async fn run() -> Result<()> {
    let args = Args::parse_args();

    init_logging(&args);

    let project_dir = args.path.as_deref().unwrap_or(".");
    let project_path = PathBuf::from(project_dir);
    validate_project_path(&project_path)?;

    let registry = Arc::new(HttpRegistry::new()?);
    let mut controller = ParserController::new(&project_path, registry);

    let progress = if args.summary {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} parsing {msg}")
                .expect("progress template must be valid"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));
        Some(bar)
    } else {
        None
    };

    controller.parse_project(progress.as_ref()).await?;

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if args.summary {
        eprintln!(
            "{} Parsed {} files in {} directories, {} components found",
            "✔".green(),
            controller.file_count(),
            controller.dir_count(),
            controller.component_count()
        );
    }

    let generator = SbomGenerator::new(controller.into_sbom(), args.schema);

    match args.output {
        Some(output_dir) => {
            let path = generator.write_file(Path::new(&output_dir), args.format)?;
            eprintln!("{} SBOM saved to: {}", "✔".green(), path.display());
        }
        None => {
            let document = generator.write_string(args.format)?;
            println!("{}", document);
        }
    }

    Ok(())
}

fn init_logging(args: &Args) {
    let default_filter = if args.debug {
        "srcbom=debug"
    } else if args.summary {
        "srcbom=info"
    } else {
        "srcbom=warn"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn validate_project_path(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SbomError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Directory does not exist".to_string(),
        }
        .into());
    }

    shared::security::validate_not_symlink(path, "analyze").map_err(|e| {
        SbomError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    if !path.is_dir() {
        return Err(SbomError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Not a directory".to_string(),
        }
        .into());
    }

    let canonical_path = path
        .canonicalize()
        .map_err(|e| SbomError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: format!("Failed to canonicalize path: {}", e),
        })?;

    if !canonical_path.is_dir() {
        return Err(SbomError::InvalidProjectPath {
            path: path.to_path_buf(),
            reason: "Resolved path is not a directory".to_string(),
        }
        .into());
    }

    Ok(())
}
