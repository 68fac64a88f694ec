//! CLI entry point for penlog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use penlog::commands::new::Kind;
use penlog::service::ContentService;
use penlog::Site;

#[derive(Parser)]
#[command(name = "penlog")]
#[command(version)]
#[command(about = "Content engine for a personal blog: posts, notes, reading list and friends", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new content file
    New {
        /// Kind of content
        #[arg(value_enum)]
        kind: Kind,

        /// Title (or name, for a friend)
        title: String,
    },

    /// Generate the feed and data files
    #[command(alias = "g")]
    Generate,

    /// Start the JSON API server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Drop cached content when files change
        #[arg(short, long)]
        watch: bool,
    },

    /// Clean the public folder
    Clean,

    /// List site information
    List {
        /// posts, notes, tags, archive, books, stats or friends
        #[arg(default_value = "posts")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "penlog=debug,info"
    } else {
        "penlog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            penlog::commands::init::init_site(&target_dir)?;
            println!("Initialized empty site in {:?}", target_dir);
        }

        Commands::New { kind, title } => {
            let site = Site::new(&base_dir)?;
            let path = penlog::commands::new::create(&site, kind, &title)?;
            println!("Created: {:?}", path);
        }

        Commands::Generate => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Generating data files...");
            site.generate()?;
            println!("Generated successfully!");
        }

        Commands::Server { port, ip, watch } => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            penlog::server::start(ContentService::new(site), &ip, port, watch).await?;
        }

        Commands::Clean => {
            let site = Site::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let site = Site::new(&base_dir)?;
            penlog::commands::list::run(&site, &r#type)?;
        }

        Commands::Version => {
            println!("penlog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
