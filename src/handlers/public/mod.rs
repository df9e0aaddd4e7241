// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account bootstrap: sign-up, sign-in, token refresh, OTP and password
// reset. Everything else needs a bearer token or an API key.

pub mod users;
