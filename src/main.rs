use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use manifest_relay::buildsys::HttpBuildSystem;
use manifest_relay::config;
use manifest_relay::error::RelayError;
use manifest_relay::logging;
use manifest_relay::manager::ReleaseManager;
use manifest_relay::orchestrator::{PushOrchestrator, PushRequest, PushSource};
use manifest_relay::registry::HttpRegistry;
use manifest_relay::ui;

#[derive(Parser)]
#[command(
    name = "manifest-relay",
    version,
    about = "Validate operator manifest archives and push them as versioned releases to an application registry"
)]
struct Cli {
    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, global = true, help = "Print results as JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push a manifest archive as a new release
    Push {
        #[arg(help = "Registry organization")]
        organization: String,

        #[arg(help = "Target repository")]
        repo: String,

        #[arg(help = "Path to the manifest archive (.zip)")]
        archive: Option<PathBuf>,

        #[arg(short, long, help = "Version to publish (default: auto-assigned)")]
        version: Option<String>,

        #[arg(long, help = "Fetch the archive from this build instead of uploading")]
        build_id: Option<String>,
    },

    /// Delete one release, or all releases of a repository
    Delete {
        #[arg(help = "Registry organization")]
        organization: String,

        #[arg(help = "Target repository")]
        repo: String,

        #[arg(help = "Version to delete (default: all releases)")]
        version: Option<String>,
    },

    /// List the releases of a repository
    List {
        #[arg(help = "Registry organization")]
        organization: String,

        #[arg(help = "Target repository")]
        repo: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            ui::display_error(&format!("Error loading config: {}", e));
            std::process::exit(1);
        }
    };
    logging::init_logging(&config)?;

    let registry = HttpRegistry::new(&config.registry)?;
    let build_system = HttpBuildSystem::new(&config.build_system)?;

    match cli.command {
        Commands::Push {
            organization,
            repo,
            archive,
            version,
            build_id,
        } => {
            let source = match push_source(archive, build_id) {
                Ok(source) => source,
                Err(e) => fail(e, cli.json),
            };
            let orchestrator =
                PushOrchestrator::new(&registry, &build_system, config.max_uncompressed_size());

            if !cli.json {
                ui::display_status(&format!("Pushing to {}/{}...", organization, repo));
            }
            match orchestrator.push(PushRequest {
                organization,
                repo,
                requested_version: version,
                source,
            }) {
                Ok(result) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    } else {
                        ui::display_push_result(&result);
                    }
                }
                Err(e) => fail(e, cli.json),
            }
        }

        Commands::Delete {
            organization,
            repo,
            version,
        } => {
            let manager = ReleaseManager::new(&registry);
            let outcome = match version {
                Some(v) => manager.delete_release(&organization, &repo, &v),
                None => manager.delete_all(&organization, &repo),
            };
            match outcome {
                Ok(outcome) => {
                    if cli.json {
                        println!("{}", serde_json::to_string_pretty(&outcome)?);
                    } else {
                        ui::display_delete_outcome(&outcome);
                    }
                    if !outcome.is_complete() {
                        std::process::exit(1);
                    }
                }
                Err(e) => fail(e, cli.json),
            }
        }

        Commands::List { organization, repo } => {
            let manager = ReleaseManager::new(&registry);
            match manager.list_releases(&organization, &repo) {
                Ok(releases) => {
                    if cli.json {
                        let listing = serde_json::json!({
                            "organization": organization,
                            "repo": repo,
                            "releases": releases.raw(),
                        });
                        println!("{}", serde_json::to_string_pretty(&listing)?);
                    } else {
                        ui::display_releases(&organization, &repo, &releases);
                    }
                }
                Err(e) => fail(e, cli.json),
            }
        }
    }

    Ok(())
}

/// Exactly one archive source must be given; a missing source mirrors the
/// upload contract where the archive arrives in a field named "file".
fn push_source(
    archive: Option<PathBuf>,
    build_id: Option<String>,
) -> Result<PushSource, RelayError> {
    match (archive, build_id) {
        (Some(path), None) => {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let bytes = fs::read(&path)?;
            Ok(PushSource::Upload { filename, bytes })
        }
        (None, Some(build_id)) => Ok(PushSource::Build { build_id }),
        (None, None) => Err(RelayError::expected_file(
            "No field \"file\" in uploaded data and no build reference given",
        )),
        (Some(_), Some(_)) => Err(RelayError::expected_file(
            "An archive file and a build reference are mutually exclusive",
        )),
    }
}

fn fail(e: RelayError, json: bool) -> ! {
    if json {
        let body = serde_json::json!({
            "error": e.kind(),
            "message": e.to_string(),
        });
        eprintln!("{}", body);
    } else {
        ui::display_error(&format!("{} ({})", e, e.kind()));
    }
    std::process::exit(1);
}
