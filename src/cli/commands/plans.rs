use clap::Subcommand;
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::cli::utils::{output_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::dal::PlanDal;
use crate::database::models::plan::PlanCreate;

#[derive(Subcommand)]
pub enum PlanCommands {
    #[command(about = "List all subscription plans")]
    List,

    #[command(about = "Create a subscription plan")]
    Create {
        #[arg(long, help = "Plan title")]
        title: String,
        #[arg(long, help = "Token allowance granted on subscribe")]
        tokens: i64,
        #[arg(long, default_value_t = 0.0, help = "Monthly price")]
        monthly_price: f64,
        #[arg(long, default_value_t = 0.0, help = "Yearly price")]
        yearly_price: f64,
        #[arg(long, default_value = "", help = "Billing provider price identifier")]
        price_id: String,
        #[arg(long, help = "Plan description")]
        description: Option<String>,
        #[arg(long = "feature", help = "Feature bullet, repeatable")]
        features: Vec<String>,
    },
}

pub async fn handle(pool: &PgPool, cmd: PlanCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let plans = PlanDal::new(pool.clone());

    match cmd {
        PlanCommands::List => {
            let all = plans.list().await?;
            output_collection(&output_format, "plans", &all, "No plans found", |plan| {
                format!("{}  {:<20} {:>10} tokens", plan.plan_id, plan.title, plan.tokens)
            })
        }
        PlanCommands::Create {
            title,
            tokens,
            monthly_price,
            yearly_price,
            price_id,
            description,
            features,
        } => {
            if tokens < 0 {
                anyhow::bail!("Plan tokens cannot be negative");
            }
            let plan = plans
                .create(PlanCreate {
                    title,
                    description,
                    monthly_price,
                    yearly_price,
                    price_id,
                    features: Value::from(features),
                    tokens,
                })
                .await?;
            output_success(
                &output_format,
                &format!("Plan '{}' created", plan.title),
                Some(json!({ "plan": plan })),
            )
        }
    }
}
