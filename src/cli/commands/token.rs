use serde_json::json;
use sqlx::PgPool;

use crate::auth::generate_access_token;
use crate::cli::OutputFormat;
use crate::database::dal::UserDal;

pub async fn handle(pool: &PgPool, email: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let user = UserDal::new(pool.clone())
        .find_by_email(email)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No user found with email '{}'", email))?;

    let token = generate_access_token(&user)?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "user_id": user.user_id, "token": token }))?
        ),
        // Bare token so it can be captured by shell scripts
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
