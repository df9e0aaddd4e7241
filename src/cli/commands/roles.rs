use clap::Subcommand;
use sqlx::PgPool;

use crate::cli::utils::output_collection;
use crate::cli::OutputFormat;
use crate::database::dal::RoleDal;

#[derive(Subcommand)]
pub enum RoleCommands {
    #[command(about = "List all roles")]
    List,
}

pub async fn handle(pool: &PgPool, cmd: RoleCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RoleCommands::List => {
            let roles = RoleDal::new(pool.clone()).list().await?;
            output_collection(&output_format, "roles", &roles, "No roles found", |role| {
                format!(
                    "{}  {:<12} {}",
                    role.role_id,
                    role.name,
                    role.description.as_deref().unwrap_or("")
                )
            })
        }
    }
}
