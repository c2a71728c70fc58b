use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use edumeet::config::ServerConfig;
use edumeet::server::{AppState, create_router};
use edumeet::service::users::{self, NewUser};
use edumeet::store::{SqliteStore, Store};
use edumeet::types::Role;

#[derive(Parser)]
#[command(name = "edumeet")]
#[command(about = "A learning-management REST server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and optionally an admin account
    Init {
        /// Data directory for the database
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Email of an admin account to create
        #[arg(long, requires = "admin_password")]
        admin_email: Option<String>,

        /// Display name of the admin account
        #[arg(long, default_value = "Administrator")]
        admin_name: String,

        /// Password of the admin account
        #[arg(long, env = "EDUMEET_ADMIN_PASSWORD", hide_env_values = true)]
        admin_password: Option<String>,
    },

    /// Start the server
    Serve {
        /// TOML config file; flags below override its values
        #[arg(long, short)]
        config: Option<PathBuf>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, short, env = "PORT")]
        port: Option<u16>,

        /// Data directory for the database
        #[arg(long)]
        data_dir: Option<String>,
    },
}

fn run_init(
    data_dir: String,
    admin_email: Option<String>,
    admin_name: String,
    admin_password: Option<String>,
) -> anyhow::Result<()> {
    let config = ServerConfig {
        data_dir: data_dir.into(),
        ..ServerConfig::default()
    };
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    info!("Database ready at {}", config.db_path().display());

    if let (Some(email), Some(password)) = (admin_email, admin_password) {
        let admin = users::create(
            &store,
            NewUser {
                name: admin_name,
                email,
                password,
                phone_number: None,
                role: Role::Admin,
            },
        )?;
        println!("Created admin account '{}' ({})", admin.email, admin.id);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("edumeet=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            data_dir,
            admin_email,
            admin_name,
            admin_password,
        } => {
            run_init(data_dir, admin_email, admin_name, admin_password)?;
        }
        Commands::Serve {
            config,
            host,
            port,
            data_dir,
        } => {
            let mut config = match config {
                Some(path) => ServerConfig::load(path)?,
                None => ServerConfig::default(),
            };
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir.into();
            }

            if !config.db_path().exists() {
                bail!(
                    "Database not found at {}. Run 'edumeet init' first.",
                    config.db_path().display()
                );
            }

            let store = SqliteStore::new(config.db_path())?;
            store.initialize()?;

            let state = Arc::new(AppState::new(Arc::new(store)));
            let app = create_router(state);
            let addr = config.socket_addr()?;

            info!("Starting server on {}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}
