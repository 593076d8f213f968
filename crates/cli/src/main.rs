use anyhow::{Context, Result};
use bac_core::{ProjectStatus, User};
use clap::{Parser, Subcommand};
use server::config::{TrackerConfig, TRACKER_DIR};
use server::{create_router, state::AppState};
use sqlx::SqlitePool;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bac-tracker")]
#[command(about = "Procurement stage tracker for Bids and Awards Committees", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Overrides the configured port
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .bac-tracker/ with a config file and an empty database
    Init {
        /// Organization name shown on the dashboard
        #[arg(long)]
        organization: Option<String>,
    },
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    Status,
    #[command(subcommand)]
    User(UserCommands),
}

#[derive(Subcommand)]
enum UserCommands {
    /// Register a user in the directory
    Add {
        #[arg(long)]
        username: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        admin: bool,
    },
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { organization }) => init_tracker(organization).await,
        Some(Commands::Serve { port }) => serve(port.or(cli.port)).await,
        Some(Commands::Status) => status().await,
        Some(Commands::User(command)) => user(command).await,
        None => serve(cli.port).await,
    }
}

async fn open_database(config: &TrackerConfig, root: &Path) -> Result<SqlitePool> {
    let db_path = config.database_path(root);
    let pool = db::create_pool(&db::database_url(&db_path))
        .await
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    Ok(pool)
}

async fn init_tracker(organization: Option<String>) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let tracker_dir = TrackerConfig::tracker_dir(&cwd);

    if tracker_dir.exists() {
        println!("Tracker already initialized at {}", tracker_dir.display());
        return Ok(());
    }

    println!("Initializing BAC Tracker in {}", cwd.display());

    let mut config = TrackerConfig::default();
    if let Some(name) = organization {
        config.organization.name = name;
    }
    config
        .write(&cwd)
        .await
        .context("Failed to write config file")?;

    open_database(&config, &cwd).await?;

    println!();
    println!("Initialized BAC Tracker for '{}'", config.organization.name);
    println!();
    println!("Created:");
    println!("  {}/", TRACKER_DIR);
    println!("  ├── config.toml");
    println!("  └── {}", config.database.file.display());
    println!();
    println!("Next steps:");
    println!("  1. Add an administrator: bac-tracker user add --username <name> --full-name <full name> --admin");
    println!("  2. Run 'bac-tracker serve' to start the API");

    Ok(())
}

async fn serve(port: Option<u16>) -> Result<()> {
    init_tracing();

    let cwd = std::env::current_dir()?;
    if !TrackerConfig::tracker_dir(&cwd).exists() {
        tracing::warn!("No {} directory found, using default configuration", TRACKER_DIR);
    }

    let config = TrackerConfig::read(&cwd).await;
    let port = port.unwrap_or(config.server.port);

    tracing::info!("Database: {}", config.database_path(&cwd).display());
    let pool = open_database(&config, &cwd).await?;

    let state = AppState::new(pool, &config);
    let app = create_router(state);

    let address = format!("{}:{}", config.server.host, port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    println!();
    println!("BAC Tracker - {}", config.organization.name);
    println!("════════════════════════════════════════");
    println!();
    println!("  API Server:  http://{}", address);
    println!("  Swagger UI:  http://{}/swagger-ui", address);
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}

async fn status() -> Result<()> {
    let cwd = std::env::current_dir()?;

    if !TrackerConfig::tracker_dir(&cwd).exists() {
        println!("Not a BAC Tracker directory.");
        println!("Run 'bac-tracker init' to initialize.");
        return Ok(());
    }

    let config = TrackerConfig::read(&cwd).await;
    let db_path = config.database_path(&cwd);

    if !db_path.exists() {
        println!(
            "Organization: {} (database not initialized)",
            config.organization.name
        );
        return Ok(());
    }

    let pool = open_database(&config, &cwd).await?;
    let store = db::WorkflowStore::new(pool);
    let (projects, statistics) = store.dashboard(None).await?;

    println!();
    println!("Organization: {}", config.organization.name);
    println!("Database:     {}", db_path.display());
    println!();

    if projects.is_empty() {
        println!("No projects yet.");
    } else {
        println!(
            "Projects ({}): {} finished ({:.2}%), {} ongoing ({:.2}%)",
            statistics.total,
            statistics.finished,
            statistics.percent_finished,
            statistics.ongoing,
            statistics.percent_ongoing
        );
        for summary in &projects {
            let (icon, stage) = match (summary.status, summary.current_stage) {
                (ProjectStatus::Finished, _) => ("●", "Finished".to_string()),
                (ProjectStatus::InProgress, Some(stage)) => ("◐", stage.to_string()),
                (ProjectStatus::InProgress, None) => ("?", "Unknown".to_string()),
            };
            println!(
                "  {} [{}] {} - {}",
                icon, stage, summary.project.pr_number, summary.project.details
            );
        }
    }

    println!();

    Ok(())
}

async fn user(command: UserCommands) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = TrackerConfig::read(&cwd).await;
    let pool = open_database(&config, &cwd).await?;
    let users = db::UserRepository::new(pool);

    match command {
        UserCommands::Add {
            username,
            full_name,
            admin,
        } => {
            let username = username.trim();
            if let Some(existing) = users.find_by_username(username).await? {
                anyhow::bail!("User '{}' already exists ({})", username, existing.id);
            }
            let user = users
                .create(&User::new(username, full_name.trim(), admin))
                .await?;
            println!(
                "Added {} {} ({})",
                if user.is_admin { "administrator" } else { "user" },
                user.username,
                user.id
            );
            println!("Requests must send header x-user-id: {}", user.id);
        }
        UserCommands::List => {
            let all = users.find_all().await?;
            if all.is_empty() {
                println!("No users yet.");
            }
            for user in &all {
                let role = if user.is_admin { "admin" } else { "member" };
                println!("  {}  {:<16} {:<8} {}", user.id, user.username, role, user.full_name);
            }
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bac_tracker=info,server=info,db=info,tower_http=info".into()),
        )
        .init();
}
