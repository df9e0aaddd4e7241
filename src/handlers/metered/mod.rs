// handlers/metered/mod.rs - Metered handlers (API key or bearer token, plus balance)
//
// `require_credentials` resolves the caller and refuses the request when the
// subscription balance is below the configured minimum. Successful calls are
// charged for the tokens the model consumed.

pub mod query;
