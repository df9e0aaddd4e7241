use sqlx::PgPool;
use uuid::Uuid;

use super::{affected, found};
use crate::database::models::plan::{Plan, PlanCreate, PlanUpdate};
use crate::database::DatabaseError;

const COLUMNS: &str = "plan_id, title, description, monthly_price, yearly_price, price_id, features, tokens";

pub struct PlanDal {
    pool: PgPool,
}

impl PlanDal {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Plan>, DatabaseError> {
        let plans = sqlx::query_as::<_, Plan>(&format!("SELECT {COLUMNS} FROM plan ORDER BY monthly_price, title"))
            .fetch_all(&self.pool)
            .await?;
        Ok(plans)
    }

    pub async fn get(&self, plan_id: Uuid) -> Result<Plan, DatabaseError> {
        found(self.find(plan_id).await?, "Plan not found")
    }

    pub async fn find(&self, plan_id: Uuid) -> Result<Option<Plan>, DatabaseError> {
        let plan = sqlx::query_as::<_, Plan>(&format!("SELECT {COLUMNS} FROM plan WHERE plan_id = $1"))
            .bind(plan_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(plan)
    }

    pub async fn create(&self, input: PlanCreate) -> Result<Plan, DatabaseError> {
        if input.tokens < 0 {
            return Err(DatabaseError::Constraint("Plan tokens cannot be negative".into()));
        }
        let plan = sqlx::query_as::<_, Plan>(&format!(
            "INSERT INTO plan (plan_id, title, description, monthly_price, yearly_price, price_id, features, tokens)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(input.title)
        .bind(input.description)
        .bind(input.monthly_price)
        .bind(input.yearly_price)
        .bind(input.price_id)
        .bind(input.features)
        .bind(input.tokens)
        .fetch_one(&self.pool)
        .await?;
        Ok(plan)
    }

    pub async fn update(&self, plan_id: Uuid, input: PlanUpdate) -> Result<Plan, DatabaseError> {
        let plan = sqlx::query_as::<_, Plan>(&format!(
            "UPDATE plan SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                monthly_price = COALESCE($4, monthly_price),
                yearly_price = COALESCE($5, yearly_price),
                price_id = COALESCE($6, price_id),
                features = COALESCE($7, features),
                tokens = COALESCE($8, tokens)
             WHERE plan_id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(plan_id)
        .bind(input.title)
        .bind(input.description)
        .bind(input.monthly_price)
        .bind(input.yearly_price)
        .bind(input.price_id)
        .bind(input.features)
        .bind(input.tokens)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DatabaseError::from(e).or_constraint("Plan tokens cannot be negative"))?;
        found(plan, "Plan not found")
    }

    pub async fn delete(&self, plan_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM plan WHERE plan_id = $1")
            .bind(plan_id)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::from(e).or_constraint("Plan is referenced by subscriptions or payments"))?;
        affected(result.rows_affected(), "Plan not found")
    }
}
