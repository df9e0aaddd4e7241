// handlers/protected/mod.rs - Protected handlers (bearer access token required)
//
// Every route here sits behind `require_jwt`, which injects `CurrentUser`.
// Admin-only operations check the caller's role inside the handler.

pub mod api_keys;
pub mod databases;
pub mod invoices;
pub mod payments;
pub mod plans;
pub mod purchase_quota;
pub mod roles;
pub mod speech;
pub mod subscriptions;
pub mod tools;
pub mod usage;
pub mod users;
