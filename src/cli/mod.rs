//! CLI module for Codescribe

mod args;

pub use args::{Args, Command};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{DocumentationStore, GeneratedDocumentation};
use crate::pipeline::DocService;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Config file looked up in the project root when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "codescribe.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    setup_logging(args.verbose);

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if e.is_configuration() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn setup_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "warn" };

    // A second init (tests) is harmless
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Generate {
            path,
            output,
            exclude,
            config,
            name,
            no_diagrams,
        } => {
            let mut cfg = match &config {
                Some(config_path) => Config::load(config_path)?,
                None => Config::load_or_default(&path.join(DEFAULT_CONFIG_FILE)),
            };

            // CLI takes precedence
            cfg.merge_cli(output, exclude, name, no_diagrams);
            cfg.validate()?;

            generate(path, cfg)
        }

        Command::Show { path } => {
            let store = DocumentationStore::new(&path);
            let doc = store.load()?.ok_or_else(|| {
                Error::other(format!(
                    "No documentation found at {}",
                    store.artifact_path().display()
                ))
            })?;
            print_summary(&doc, &store.artifact_path());
            Ok(())
        }

        Command::Version => {
            println!("codescribe {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn generate(path: PathBuf, cfg: Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(async move {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message(format!("Analyzing {}", path.display()));

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
        let status = spinner.clone();
        let updates = tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                status.set_message(message);
            }
        });

        let service = DocService::new(path, cfg).with_progress(Arc::new(move |s: &str| {
            let _ = tx.send(s.to_string());
        }));
        let result = service.regenerate().await;
        let artifact = service.store().artifact_path();

        // Dropping the service closes the progress channel
        drop(service);
        let _ = updates.await;

        match result {
            Ok(doc) => {
                spinner.finish_and_clear();
                print_summary(&doc, &artifact);
                Ok(())
            }
            Err(e) => {
                spinner.abandon_with_message("Documentation generation failed");
                Err(e)
            }
        }
    })
}

fn print_summary(doc: &GeneratedDocumentation, artifact: &Path) {
    let endpoints: usize = doc.backend.groups.iter().map(|g| g.endpoints.len()).sum();

    println!("{}", doc.project_name);
    println!("  Generated:   {}", doc.generated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Components:  {}", doc.frontend.components.len());
    println!("  Routes:      {} in {} files", endpoints, doc.backend.groups.len());
    println!("  Tables:      {}", doc.database.tables.len());
    println!("  User flows:  {}", doc.user_flows.len());
    println!(
        "  Diagram:     {}",
        if doc.architecture_diagram.is_empty() { "disabled" } else { "included" }
    );
    println!("Documentation written to: {}", artifact.display());
}
