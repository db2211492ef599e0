use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use codevault::archive::Archive;
use codevault::config::VaultConfig;
use codevault::models::Project;
use codevault::{api, db, templates};

#[derive(Parser)]
#[command(name = "cvault")]
#[command(about = "Version-controlled local storage for multi-file coding projects")]
struct Cli {
    /// Database file (overrides config and CODEVAULT_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the local HTTP API
    Serve {
        /// Port for HTTP API
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List projects, most recently updated first
    List,
    /// List built-in templates
    Templates,
    /// Create a project from a template
    New {
        /// Template id (see `cvault templates`)
        template: String,
        #[arg(short, long)]
        name: Option<String>,
    },
    /// List the files of a project
    Files { project: String },
    /// Print a file's content
    Cat { project: String, path: String },
    /// Write a file from --file or stdin and record a snapshot
    Write {
        project: String,
        path: String,
        /// Read content from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Delete a file
    Rm { project: String, path: String },
    /// Move a file to a new path
    Mv {
        project: String,
        from: String,
        to: String,
    },
    /// Step back one snapshot
    Undo { project: String },
    /// Step forward one snapshot
    Redo { project: String },
    /// Show a project's snapshot history
    Log { project: String },
    /// Copy a project's current files into a new project
    Duplicate { project: String },
    /// Rename a project
    RenameProject { project: String, name: String },
    /// Delete a project with its files and history
    Delete { project: String },
    /// Export a project as a zip archive
    Export {
        project: String,
        /// Output path (defaults to `<project name>.zip`)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a zip archive as a new project
    Import { archive: PathBuf },
}

/// Initialize tracing. CLI commands log to stderr so stdout stays clean.
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "codevault=info,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn open_database(config: &VaultConfig) -> Result<db::Database> {
    let db = match &config.database_path {
        Some(path) => db::Database::open(path.clone())?,
        None => db::Database::open_default()?,
    };
    db.migrate()?;
    Ok(db.with_max_projects(config.max_projects))
}

/// Resolve a project by id or by exact (case-insensitive) name.
fn resolve_project(db: &db::Database, reference: &str) -> Result<Project> {
    if let Ok(id) = Uuid::parse_str(reference) {
        return db
            .get_project(id)?
            .with_context(|| format!("Project not found: {reference}"));
    }

    let mut matches: Vec<Project> = db
        .list_projects()?
        .into_iter()
        .filter(|p| p.name.eq_ignore_ascii_case(reference))
        .collect();
    match matches.len() {
        0 => anyhow::bail!("Project not found: {reference}"),
        1 => Ok(matches.remove(0)),
        n => anyhow::bail!("{n} projects are named {reference}; use the id instead"),
    }
}

fn print_project(project: &Project) {
    println!(
        "{}  {:<24}  {:<7}  snapshot {}  {}",
        project.id,
        project.name,
        project.framework.as_str(),
        project.snapshot_index,
        project.updated_at.format("%Y-%m-%d %H:%M")
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let serving = matches!(cli.command, Commands::Serve { .. });
    init_tracing(!serving);

    let mut config = VaultConfig::load();
    if let Some(path) = cli.db {
        config.database_path = Some(path);
    }
    let db = open_database(&config)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            let app = api::create_router(db);

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!("CodeVault API listening on http://127.0.0.1:{}", port);

            axum::serve(listener, app).await?;
        }
        Commands::List => {
            for project in db.list_projects()? {
                print_project(&project);
            }
        }
        Commands::Templates => {
            for template in templates::builtin() {
                println!(
                    "{:<10} {:<18} {}",
                    template.id,
                    template.name,
                    template.framework.as_str()
                );
            }
        }
        Commands::New { template, name } => {
            let template = templates::find(&template)
                .with_context(|| format!("Unknown template: {template}"))?;
            match db.create_project(&template, name.as_deref())? {
                Some(project) => {
                    db.set_active_project(project.id)?;
                    print_project(&project);
                }
                None => anyhow::bail!("Project limit of {} reached", db.max_projects()),
            }
        }
        Commands::Files { project } => {
            let project = resolve_project(&db, &project)?;
            for file in db.list_files(project.id)? {
                let marker = if file.path == project.entry_file { "*" } else { " " };
                println!("{} {}  {}", marker, &file.fingerprint[..12], file.path);
            }
        }
        Commands::Cat { project, path } => {
            let project = resolve_project(&db, &project)?;
            let file = db
                .get_file(project.id, &path)?
                .with_context(|| format!("File not found: {path}"))?;
            print!("{}", file.content);
        }
        Commands::Write {
            project,
            path,
            file,
        } => {
            let project = resolve_project(&db, &project)?;
            let content = match file {
                Some(source) => std::fs::read_to_string(&source)
                    .with_context(|| format!("Failed to read {}", source.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .context("Failed to read stdin")?;
                    buf
                }
            };
            let written = db.update_file(project.id, &path, &content)?;
            db.set_active_project(project.id)?;
            println!("{}  {}", &written.fingerprint[..12], written.path);
        }
        Commands::Rm { project, path } => {
            let project = resolve_project(&db, &project)?;
            if !db.delete_file(project.id, &path)? {
                eprintln!("No such file: {path}");
            }
        }
        Commands::Mv { project, from, to } => {
            let project = resolve_project(&db, &project)?;
            let file = db.rename_file(project.id, &from, &to)?;
            println!("{}", file.path);
        }
        Commands::Undo { project } => {
            let project = resolve_project(&db, &project)?;
            if !db.undo(project.id)? {
                eprintln!("Nothing to undo");
            }
        }
        Commands::Redo { project } => {
            let project = resolve_project(&db, &project)?;
            if !db.redo(project.id)? {
                eprintln!("Nothing to redo");
            }
        }
        Commands::Log { project } => {
            let project = resolve_project(&db, &project)?;
            for snapshot in db.list_snapshots(project.id)? {
                let marker = if snapshot.order == project.snapshot_index {
                    "*"
                } else {
                    " "
                };
                println!(
                    "{} {:>4}  {}  {:>3} files  {}",
                    marker,
                    snapshot.order,
                    snapshot.created_at.format("%Y-%m-%d %H:%M:%S"),
                    snapshot.files.len(),
                    snapshot.label.as_deref().unwrap_or("")
                );
            }
        }
        Commands::Duplicate { project } => {
            let project = resolve_project(&db, &project)?;
            match db.duplicate_project(project.id)? {
                Some(copy) => print_project(&copy),
                None => anyhow::bail!("Project limit of {} reached", db.max_projects()),
            }
        }
        Commands::RenameProject { project, name } => {
            let project = resolve_project(&db, &project)?;
            db.rename_project(project.id, &name)?;
        }
        Commands::Delete { project } => {
            let project = resolve_project(&db, &project)?;
            db.delete_project(project.id)?;
            println!("Deleted {}", project.name);
        }
        Commands::Export { project, output } => {
            let project = resolve_project(&db, &project)?;
            let archive = db
                .export_archive(project.id)?
                .with_context(|| format!("Project not found: {}", project.id))?;
            let output = output.unwrap_or_else(|| PathBuf::from(&archive.file_name));
            std::fs::write(&output, &archive.bytes)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            println!("{}", output.display());
        }
        Commands::Import { archive } => {
            let bytes = std::fs::read(&archive)
                .with_context(|| format!("Failed to read {}", archive.display()))?;
            let input = Archive {
                file_name: archive.to_string_lossy().into_owned(),
                bytes,
            };
            match db.import_archive(&input)? {
                Some(project) => {
                    db.set_active_project(project.id)?;
                    print_project(&project);
                }
                None => anyhow::bail!(
                    "Nothing imported: the archive is empty or the project limit of {} is reached",
                    db.max_projects()
                ),
            }
        }
    }

    Ok(())
}
