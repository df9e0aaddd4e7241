// handlers/mod.rs - Handler tiers
//
// Public (no auth) -> Protected (bearer access token) -> Metered
// (API key or bearer token, with a minimum subscription balance)

pub mod metered;   // /api/v1/query/*
pub mod protected; // everything else under /api/v1
pub mod public;    // /api/v1/users sign-up, sign-in, OTP
