pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "text2sql")]
#[command(about = "Text2SQL admin CLI - operator tasks against the service database")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending schema migrations")]
    Migrate,

    #[command(about = "Role management")]
    Roles {
        #[command(subcommand)]
        cmd: commands::roles::RoleCommands,
    },

    #[command(about = "Subscription plan management")]
    Plans {
        #[command(subcommand)]
        cmd: commands::plans::PlanCommands,
    },

    #[command(about = "Mint an access token for a user")]
    Token {
        #[arg(long, help = "E-mail of the user to issue the token for")]
        email: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

async fn connect() -> anyhow::Result<PgPool> {
    Ok(DatabaseManager::connect_main().await?)
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let pool = connect().await?;

    let result = match cli.command {
        Commands::Migrate => commands::migrate::handle(&pool, output_format).await,
        Commands::Roles { cmd } => commands::roles::handle(&pool, cmd, output_format).await,
        Commands::Plans { cmd } => commands::plans::handle(&pool, cmd, output_format).await,
        Commands::Token { email } => commands::token::handle(&pool, &email, output_format).await,
    };

    pool.close().await;
    result
}
