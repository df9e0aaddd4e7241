//! Data-access layer: one struct per table, each owning a pool handle.
//! Every call commits on its own; nothing here spans multiple statements
//! unless noted.

pub mod api_key;
pub mod api_usage;
pub mod payment;
pub mod plan;
pub mod purchase_quota;
pub mod role;
pub mod subscription;
pub mod token_blocklist;
pub mod tool;
pub mod user;
pub mod user_database;

pub use api_key::ApiKeyDal;
pub use api_usage::ApiUsageDal;
pub use payment::PaymentDal;
pub use plan::PlanDal;
pub use purchase_quota::PurchaseQuotaDal;
pub use role::RoleDal;
pub use subscription::SubscriptionDal;
pub use token_blocklist::TokenBlocklistDal;
pub use tool::ToolDal;
pub use user::UserDal;
pub use user_database::UserDatabaseDal;

use crate::database::DatabaseError;

/// Turn a missing row into a NotFound error carrying `message`
pub(crate) fn found<T>(row: Option<T>, message: &str) -> Result<T, DatabaseError> {
    row.ok_or_else(|| DatabaseError::NotFound(message.to_string()))
}

/// Fail with NotFound when a DELETE/UPDATE touched nothing
pub(crate) fn affected(rows: u64, message: &str) -> Result<(), DatabaseError> {
    if rows == 0 {
        return Err(DatabaseError::NotFound(message.to_string()));
    }
    Ok(())
}
