//! Bookcycle real-time messaging server.
//!
//! Routes chat and location messages between logged-in users over WebSocket
//! and serves the message history / course lookup API behind per-route
//! admission control.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin bookcycle-server
//! cargo run --bin bookcycle-server -- --host 0.0.0.0 --port 3000 --courses courses.json
//! cargo run --bin bookcycle-server -- --users users.json
//! cargo run --bin bookcycle-server -- --load-test
//! ```

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use bookcycle_server::{
    config::{REQUESTS_PER_MINUTE, ServerConfig},
    domain::{Course, UserAccount},
    hub::Hub,
    infrastructure::{
        dto::http::{CourseDto, UserAccountDto},
        repository::{InMemoryCourseCatalog, InMemoryMessageRepository, InMemoryUserDirectory},
        session::InMemorySessionStore,
    },
    ui::Server,
};
use bookcycle_shared::{logger::setup_logger, time::SystemClock};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "bookcycle-server")]
#[command(about = "Bookcycle messaging hub and API server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Requests admitted per route per minute
    #[arg(long, default_value_t = REQUESTS_PER_MINUTE)]
    requests_per_minute: u32,

    /// Disable admission control for throughput testing
    #[arg(long)]
    load_test: bool,

    /// Directory served for unmatched paths
    #[arg(long, default_value = "./static")]
    static_dir: PathBuf,

    /// JSON file with the course catalog (array of {id, department, number, title})
    #[arg(long)]
    courses: Option<PathBuf>,

    /// JSON file with login accounts (array of {id, email, password_hash}, bcrypt hashes)
    #[arg(long)]
    users: Option<PathBuf>,
}

impl From<&Args> for ServerConfig {
    fn from(args: &Args) -> Self {
        ServerConfig {
            host: args.host.clone(),
            port: args.port,
            requests_per_window: args.requests_per_minute,
            load_test: args.load_test,
            static_dir: args.static_dir.clone(),
            ..ServerConfig::default()
        }
    }
}

fn load_courses(path: &Path) -> Result<Vec<Course>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let dtos: Vec<CourseDto> = serde_json::from_str(&raw)?;
    let courses = dtos
        .into_iter()
        .map(Course::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(courses)
}

fn load_accounts(path: &Path) -> Result<Vec<UserAccount>, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let dtos: Vec<UserAccountDto> = serde_json::from_str(&raw)?;
    let accounts = dtos
        .into_iter()
        .map(UserAccount::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(accounts)
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    let config = ServerConfig::from(&args);

    // 1. Storage
    let courses = match &args.courses {
        Some(path) => match load_courses(path) {
            Ok(courses) => {
                tracing::info!("Loaded {} courses from {}", courses.len(), path.display());
                courses
            }
            Err(e) => {
                tracing::error!("Failed to load courses from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Vec::new(),
    };
    let accounts = match &args.users {
        Some(path) => match load_accounts(path) {
            Ok(accounts) => accounts,
            Err(e) => {
                tracing::error!("Failed to load accounts from {}: {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Vec::new(),
    };
    let users = Arc::new(InMemoryUserDirectory::new(accounts));
    if users.is_empty() {
        tracing::warn!("No login accounts configured; pass --users to enable login");
    } else {
        tracing::info!("Loaded {} login accounts", users.len());
    }
    let messages = Arc::new(InMemoryMessageRepository::new());
    let catalog = Arc::new(InMemoryCourseCatalog::new(courses));
    let sessions = Arc::new(InMemorySessionStore::new());
    let clock = Arc::new(SystemClock);

    // 2. Hub
    let (hub, hub_task) = Hub::spawn(messages.clone(), clock.clone());

    // 3. Server
    let server = Server::new(config, hub, messages, catalog, sessions, users, clock);
    let result = server.run().await;

    hub_task.shutdown().await;

    if let Err(e) = result {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
