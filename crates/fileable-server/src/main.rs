use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fileable_core::attachment::{AttachmentFilter, Trashed};
use fileable_ingest::{FileInput, IngestOptions};
use tokio::net::TcpListener;
use tracing::info;

use fileable_server::ServerConfig;

#[derive(Parser)]
#[command(name = "fileable-server", about = "Attach stored files to any record")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API (default)
    Serve,
    /// Store local files or URLs, optionally attaching them to an owner
    Ingest {
        /// Local paths or http(s) URLs
        #[arg(required = true)]
        sources: Vec<String>,
        /// Storage directory (defaults to the configured default path)
        #[arg(long)]
        path: Option<String>,
        #[arg(long, requires = "owner_id")]
        owner_type: Option<String>,
        #[arg(long, requires = "owner_type")]
        owner_id: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Record the attachments as inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Print an owner's attachments
    List {
        #[arg(long)]
        owner_type: String,
        #[arg(long)]
        owner_id: String,
        /// Include soft-deleted rows
        #[arg(long)]
        with_trashed: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let state = fileable_server::build_state(&cli.config).await?;

    match cli.command {
        None | Some(Commands::Serve) => {
            let addr = cli.config.addr();
            let listener = TcpListener::bind(addr)
                .await
                .with_context(|| format!("bind {addr}"))?;
            info!("fileable-server listening on http://{addr}");
            fileable_server::serve(listener, state).await?;
        }
        Some(Commands::Ingest {
            sources,
            path,
            owner_type,
            owner_id,
            description,
            inactive,
        }) => {
            let owner = match (owner_type, owner_id) {
                (Some(t), Some(id)) => Some(state.owners.resolve(&t, &id)?),
                _ => None,
            };
            let options = IngestOptions::configure(owner, description, !inactive);
            let path = path.unwrap_or_else(|| cli.config.default_path.clone());

            let stored = state
                .ingestor
                .ingest(FileInput::many(sources), &path, &options)
                .await?;
            for file in stored.files() {
                match &file.attachment {
                    Some(a) => println!("{}\t{}", file.path, a.id),
                    None => println!("{}", file.path),
                }
            }
        }
        Some(Commands::List {
            owner_type,
            owner_id,
            with_trashed,
        }) => {
            let owner = state.owners.resolve(&owner_type, &owner_id)?;
            let filter = AttachmentFilter {
                owner: Some(owner),
                trashed: if with_trashed {
                    Trashed::Include
                } else {
                    Trashed::Exclude
                },
                ..Default::default()
            };
            let attachments = state.db.list_attachments(&filter).await?;
            if attachments.is_empty() {
                eprintln!("No attachments found.");
            } else {
                println!("{:<38} {:<24} {:<10} {:<28} PATH", "ID", "NAME", "SIZE", "CREATED");
                for a in attachments {
                    let name = if a.is_trashed() {
                        format!("{} (trashed)", a.name)
                    } else {
                        a.name.clone()
                    };
                    println!(
                        "{:<38} {:<24} {:<10} {:<28} {}",
                        a.id,
                        name,
                        a.size,
                        a.created_at.to_rfc3339(),
                        a.path
                    );
                }
            }
        }
    }

    Ok(())
}
