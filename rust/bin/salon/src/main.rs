//! `salon`: command-line client for the salon backend.
//!
//! Registers accounts, signs in and out, and shows the user mirror the
//! web client would see.

mod commands;
mod config;

use clap::{Parser, Subcommand};

use salon_auth::{ProfileUpdate, Role, SignUpDetails};

/// Salon CLI tool.
#[derive(Parser, Debug)]
#[command(name = "salon", about = "Salon account client")]
struct Cli {
    /// Path to client config file (default: ~/.salon/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format: text or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "text")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an account and its profile.
    Register {
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted).
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// client, master or admin (default: client).
        #[arg(long)]
        role: Option<Role>,
    },

    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        /// Password (prompted when omitted).
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and clear the local mirror.
    Logout,

    /// Show the signed-in user, role, and local mirror.
    Whoami,

    /// Edit the signed-in user's profile.
    Profile {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },

    /// Log every session change until Ctrl-C.
    Watch,

    /// Show version.
    Version,
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ")?,
    };
    if password.is_empty() {
        anyhow::bail!("Password cannot be empty.");
    }
    Ok(password)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::ClientConfig::default_path);

    match cli.command {
        Commands::Register {
            email,
            password,
            first_name,
            last_name,
            phone,
            role,
        } => {
            let password = password_or_prompt(password)?;
            let details = SignUpDetails {
                first_name,
                last_name,
                phone,
                role,
            };
            commands::account::register(&email, &password, &details, &config_path).await?;
        }

        Commands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            commands::account::login(&email, &password, &config_path).await?;
        }

        Commands::Logout => {
            commands::account::logout(&config_path).await?;
        }

        Commands::Whoami => {
            let json_output = cli.output == "json";
            commands::session::whoami(json_output, &config_path).await?;
        }

        Commands::Profile {
            first_name,
            last_name,
            phone,
        } => {
            let update = ProfileUpdate {
                first_name,
                last_name,
                phone,
            };
            commands::account::update_profile(&update, &config_path).await?;
        }

        Commands::Watch => {
            commands::session::watch(&config_path).await?;
        }

        Commands::Version => {
            println!("salon cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
