//! FlexFlow Vision Agent CLI
//!
//! Zero-storage real-time pose metrics for remote physical therapy.

use clap::{Parser, Subcommand};
use flexflow_vision_agent::{
    config::Config,
    exercise::{self, ExerciseDb},
    PRIVACY_DECLARATION, VERSION,
};

#[derive(Parser)]
#[command(name = "flexflow-vision")]
#[command(author = "FlexFlow")]
#[command(version = VERSION)]
#[command(about = "Zero-storage real-time pose metrics agent", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the health/metrics HTTP surface
    Serve {
        /// Port to bind (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Search the exercise database
    Find {
        /// Exercise or muscle to look for
        query: String,

        /// Maximum number of results
        #[arg(long, default_value = "3")]
        limit: usize,
    },

    /// List the curated stretch resources
    Stretches,

    /// Display privacy declaration
    Privacy,

    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            cmd_serve(port).await;
        }
        Commands::Find { query, limit } => {
            cmd_find(&query, limit).await;
        }
        Commands::Stretches => {
            cmd_stretches();
        }
        Commands::Privacy => {
            println!("{PRIVACY_DECLARATION}");
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

#[cfg(feature = "server")]
async fn cmd_serve(port: Option<u16>) {
    use flexflow_vision_agent::server::{run, ServerConfig};
    use flexflow_vision_agent::SharedBodyState;

    let config = Config::load().unwrap_or_default();
    let server_config = ServerConfig::new(
        port.unwrap_or(config.server_port),
        config.allowed_origin.clone(),
    );

    println!("FlexFlow Vision Agent v{VERSION}");
    println!();

    // The whiteboard is empty until a host attaches a pipeline; the server
    // still answers probes and serves default metrics.
    let body = SharedBodyState::new();
    let (addr, shutdown_tx) = match run(server_config, body).await {
        Ok(started) => started,
        Err(e) => {
            eprintln!("Error starting server: {e}");
            std::process::exit(1);
        }
    };

    println!("Listening on http://{addr}");
    println!("Press Ctrl+C to stop");

    if tokio::signal::ctrl_c().await.is_err() {
        eprintln!("Error waiting for Ctrl+C");
    }
    let _ = shutdown_tx.send(());
    println!();
    println!("Server stopped.");
}

#[cfg(not(feature = "server"))]
async fn cmd_serve(_port: Option<u16>) {
    eprintln!("Error: built without the `server` feature.");
    eprintln!("Rebuild with: cargo build --features server");
    std::process::exit(1);
}

async fn cmd_find(query: &str, limit: usize) {
    // Curated resources answer instantly and offline.
    if let Some(resource) = exercise::search_resources(query) {
        println!("Curated match: {}", resource.title);
        println!("  Body part: {}", resource.body_part);
        println!("  Video: {}", resource.youtube_embed_url);
        println!("  {}", resource.description);
        println!();
    }

    let db = match ExerciseDb::fetch().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error loading exercise database: {e}");
            std::process::exit(1);
        }
    };

    let results = db.search_many(query, limit);
    if results.is_empty() {
        println!("No database matches for \"{query}\".");
        return;
    }

    println!("Database matches:");
    for result in results {
        println!(
            "  {} [{}] - {}",
            result.name,
            result.category,
            result.primary_muscles.join(", ")
        );
    }
}

fn cmd_stretches() {
    println!("Curated stretch resources:");
    println!();
    for resource in exercise::all_resources() {
        println!("  {:24} {} ({})", resource.id, resource.title, resource.body_part);
    }
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
