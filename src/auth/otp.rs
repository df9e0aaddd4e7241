use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::config;

/// Six-digit numeric one-time code, zero padded
pub fn generate_otp() -> String {
    format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
}

/// Expiry for a code issued now
pub fn otp_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(config::config().security.otp_expiry_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_six_digits() {
        for _ in 0..100 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn expiry_is_in_the_future() {
        assert!(otp_expiry() > Utc::now());
    }
}
